//! Indentation-tracking writer for Rust source.
//!
//! The `codegen` crate covers impl blocks and plain functions. Everything
//! that needs attributes, doc comments, or explicit formatting (type
//! definitions, traits, nested modules, function bodies) goes through
//! [`CodeWriter`].
//!
//! ```
//! use idlc_codegen::code_writer::CodeWriter;
//! use idlc_codegen::cw_writeln;
//!
//! let mut out = String::new();
//! let mut w = CodeWriter::new(&mut out);
//!
//! w.doc("A point.").unwrap();
//! w.attribute("derive(Clone)").unwrap();
//! w.block("pub struct Point", |w| {
//!     cw_writeln!(w, "x: {},", "i32")?;
//!     w.writeln("y: i32,")
//! })
//! .unwrap();
//!
//! assert_eq!(
//!     out,
//!     "/// A point.\n#[derive(Clone)]\npub struct Point {\n    x: i32,\n    y: i32,\n}\n"
//! );
//! ```

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

pub struct CodeWriter<W> {
    writer: W,
    indent_level: Rc<Cell<usize>>,
    indent_string: String,
    at_line_start: bool,
}

impl<W: fmt::Write> CodeWriter<W> {
    /// A writer indenting by four spaces, rustfmt style.
    pub fn new(writer: W) -> Self {
        Self::with_indent_spaces(writer, 4)
    }

    pub fn with_indent_spaces(writer: W, spaces: usize) -> Self {
        Self {
            writer,
            indent_level: Rc::new(Cell::new(0)),
            indent_string: " ".repeat(spaces),
            at_line_start: true,
        }
    }

    /// Write text without a newline. Adds indentation if at line start.
    pub fn write(&mut self, text: &str) -> fmt::Result {
        if text.is_empty() {
            return Ok(());
        }

        if self.at_line_start && !text.trim().is_empty() {
            for _ in 0..self.indent_level.get() {
                self.writer.write_str(&self.indent_string)?;
            }
            self.at_line_start = false;
        }

        self.writer.write_str(text)
    }

    pub fn writeln(&mut self, text: &str) -> fmt::Result {
        self.write(text)?;
        self.writer.write_char('\n')?;
        self.at_line_start = true;
        Ok(())
    }

    pub fn blank_line(&mut self) -> fmt::Result {
        self.writer.write_char('\n')?;
        self.at_line_start = true;
        Ok(())
    }

    /// Write pre-rendered multi-line text, re-indenting every line.
    pub fn lines(&mut self, text: &str) -> fmt::Result {
        for line in text.lines() {
            if line.trim().is_empty() {
                self.blank_line()?;
            } else {
                self.writeln(line)?;
            }
        }
        Ok(())
    }

    /// Indentation increases while the guard is alive.
    pub fn indent(&mut self) -> IndentGuard {
        self.indent_level.set(self.indent_level.get() + 1);
        IndentGuard {
            indent_level: Rc::clone(&self.indent_level),
        }
    }

    pub fn comment(&mut self, text: &str) -> fmt::Result {
        self.writeln(&format!("// {text}"))
    }

    /// `///` lines; blank documentation lines stay blank doc lines.
    pub fn doc(&mut self, text: &str) -> fmt::Result {
        for line in text.trim().lines() {
            let line = line.trim_end();
            if line.is_empty() {
                self.writeln("///")?;
            } else {
                self.writeln(&format!("/// {line}"))?;
            }
        }
        Ok(())
    }

    /// `#[...]`; pass the attribute body only.
    pub fn attribute(&mut self, body: &str) -> fmt::Result {
        self.writeln(&format!("#[{body}]"))
    }

    /// `header {`, the indented body, then `}`.
    pub fn block<F>(&mut self, header: &str, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.writeln(&format!("{header} {{"))?;
        {
            let _indent = self.indent();
            body(self)?;
        }
        self.writeln("}")
    }

    /// Like [`block`](Self::block) but the closing brace is followed by
    /// `suffix`, e.g. `;` or `,`.
    pub fn block_with<F>(&mut self, header: &str, suffix: &str, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.writeln(&format!("{header} {{"))?;
        {
            let _indent = self.indent();
            body(self)?;
        }
        self.writeln(&format!("}}{suffix}"))
    }

    pub fn indent_level(&self) -> usize {
        self.indent_level.get()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Use [`cw_write!`](crate::cw_write) instead of calling this directly.
    #[doc(hidden)]
    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        let formatted = format!("{args}");
        self.write(&formatted)
    }

    /// Use [`cw_writeln!`](crate::cw_writeln) instead of calling this directly.
    #[doc(hidden)]
    pub fn writeln_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        let formatted = format!("{args}");
        self.writeln(&formatted)
    }

    pub fn write_separated<I, F>(&mut self, items: I, separator: &str, mut write_item: F) -> fmt::Result
    where
        I: IntoIterator,
        F: FnMut(&mut Self, I::Item) -> fmt::Result,
    {
        let mut first = true;
        for item in items {
            if !first {
                self.write(separator)?;
            }
            write_item(self, item)?;
            first = false;
        }
        Ok(())
    }
}

/// Restores the previous indentation level on drop.
pub struct IndentGuard {
    indent_level: Rc<Cell<usize>>,
}

impl Drop for IndentGuard {
    fn drop(&mut self) {
        let current = self.indent_level.get();
        self.indent_level.set(current.saturating_sub(1));
    }
}

#[macro_export]
macro_rules! cw_write {
    ($writer:expr, $($arg:tt)*) => {
        $writer.write_fmt(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! cw_writeln {
    ($writer:expr, $($arg:tt)*) => {
        $writer.writeln_fmt(format_args!($($arg)*))
    };
}
