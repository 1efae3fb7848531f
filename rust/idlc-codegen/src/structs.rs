//! Struct, union, and exception emission.
//!
//! Each declaration becomes a value type with private fields and
//! accessors, a validating `{Name}Builder`, the identity `PartialEq`/`Hash`
//! pair, a redacting `Display`, and its `ThriftStruct` codec.

use codegen::{Block, Scope};
use idlc_schema::{Field, SchemaType, StructId, StructType};
use tracing::trace;

use crate::code_writer::CodeWriter;
use crate::codec::{Access, CodecGenerator, ReadField, Sink, WriteField};
use crate::constants::ConstantRenderer;
use crate::cw_writeln;
use crate::error::GenError;
use crate::naming;
use crate::types::TypeMapper;

/// Placeholder printed instead of a redacted field's value.
const REDACTED: &str = "<REDACTED>";

/// Everything the emitter needs to know about one field.
struct FieldPlan<'s> {
    field: &'s Field,
    ident: String,
    /// Rust type of the value, without `Box` or `Option`.
    value_type: String,
    boxed: bool,
    /// Stored as `Option<_>` in the value type.
    optional: bool,
    default: Option<String>,
}

impl FieldPlan<'_> {
    fn held_type(&self) -> String {
        if self.boxed {
            format!("::std::boxed::Box<{}>", self.value_type)
        } else {
            self.value_type.clone()
        }
    }

    fn stored_type(&self) -> String {
        if self.optional {
            format!("Option<{}>", self.held_type())
        } else {
            self.held_type()
        }
    }

    /// `Option<&T>` view of an optional field.
    fn as_option(&self, receiver: &str) -> String {
        if self.boxed {
            format!("{receiver}.{}.as_deref()", self.ident)
        } else {
            format!("{receiver}.{}.as_ref()", self.ident)
        }
    }

    /// `&T` view of a required field.
    fn as_ref(&self, receiver: &str) -> String {
        if self.boxed {
            format!("&*{receiver}.{}", self.ident)
        } else {
            format!("&{receiver}.{}", self.ident)
        }
    }
}

/// Renders the struct-like declaration `id`.
pub fn generate_struct(mapper: &TypeMapper<'_>, id: StructId) -> Result<String, GenError> {
    StructEmitter::new(mapper, id)?.emit()
}

struct StructEmitter<'a> {
    mapper: &'a TypeMapper<'a>,
    decl: &'a StructType,
    name: String,
    builder: String,
    fields: Vec<FieldPlan<'a>>,
}

impl<'a> StructEmitter<'a> {
    fn new(mapper: &'a TypeMapper<'a>, id: StructId) -> Result<Self, GenError> {
        let decl = mapper.schema().struct_type(id);
        let config = mapper.config();
        let constants = ConstantRenderer::new(mapper);
        let union = decl.is_union();

        let mut fields = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            let boxed = mapper.needs_box(id, &field.ty)?;
            if boxed {
                trace!(owner = %decl.name, field = %field.name, "boxing recursive field");
            }
            let default = field
                .default_value
                .as_ref()
                .map(|value| constants.render(&field.ty, value))
                .transpose()?;
            fields.push(FieldPlan {
                field,
                ident: naming::field_ident(config, &field.name),
                value_type: mapper.rust_type(&field.ty)?,
                boxed,
                optional: union || !field.is_required(),
                default,
            });
        }

        let name = naming::type_ident(&decl.name);
        let builder = format!("{}Builder", naming::bare(&name));
        Ok(Self {
            mapper,
            decl,
            name,
            builder,
            fields,
        })
    }

    fn rt(&self) -> &'a str {
        self.mapper.config().runtime_path()
    }

    fn emit(&self) -> Result<String, GenError> {
        let mut scope = Scope::new();
        scope.raw(self.definition()?.trim_end());
        scope.raw(self.accessors()?.trim_end());
        scope.raw(self.builder_definition()?.trim_end());
        self.builder_impls(&mut scope)?;
        self.identity_impls(&mut scope);
        self.display_impls(&mut scope)?;
        self.codec_impl(&mut scope)?;
        Ok(scope.to_string())
    }

    fn definition(&self) -> Result<String, GenError> {
        let mut out = String::new();
        {
            let mut w = CodeWriter::new(&mut out);
            if let Some(doc) = &self.decl.documentation {
                w.doc(doc)?;
            }
            w.attribute("derive(Clone)")?;
            if self.mapper.config().serde {
                w.attribute("derive(::serde::Serialize, ::serde::Deserialize)")?;
            }
            if self.decl.deprecated {
                w.attribute("deprecated")?;
            }
            w.block(&format!("pub struct {}", self.name), |w| {
                for plan in &self.fields {
                    cw_writeln!(w, "{}: {},", plan.ident, plan.stored_type())?;
                }
                Ok(())
            })?;
        }
        Ok(out)
    }

    fn accessors(&self) -> Result<String, GenError> {
        let mut out = String::new();
        {
            let mut w = CodeWriter::new(&mut out);
            w.block(&format!("impl {}", self.name), |w| {
                for plan in &self.fields {
                    if let Some(doc) = &plan.field.documentation {
                        w.doc(doc)?;
                    }
                    if plan.field.deprecated {
                        w.attribute("deprecated")?;
                    }
                    if plan.optional {
                        w.block(
                            &format!("pub fn {}(&self) -> Option<&{}>", plan.ident, plan.value_type),
                            |w| w.writeln(&plan.as_option("self")),
                        )?;
                    } else {
                        w.block(
                            &format!("pub fn {}(&self) -> &{}", plan.ident, plan.value_type),
                            |w| cw_writeln!(w, "&self.{}", plan.ident),
                        )?;
                    }
                    w.blank_line()?;
                }
                w.block(&format!("pub fn builder() -> {}", self.builder), |w| {
                    cw_writeln!(w, "{}::new()", self.builder)
                })?;
                w.blank_line()?;
                w.doc("A builder seeded with every field of this value.")?;
                w.block(&format!("pub fn to_builder(&self) -> {}", self.builder), |w| {
                    cw_writeln!(w, "{}::from(self.clone())", self.builder)
                })
            })?;
        }
        Ok(out)
    }

    fn builder_definition(&self) -> Result<String, GenError> {
        let mut out = String::new();
        {
            let mut w = CodeWriter::new(&mut out);
            w.doc(&format!("Collects the fields of a [`{}`].", naming::bare(&self.name)))?;
            w.attribute("derive(Clone)")?;
            w.block(&format!("pub struct {}", self.builder), |w| {
                for plan in &self.fields {
                    cw_writeln!(w, "{}: Option<{}>,", plan.ident, plan.held_type())?;
                }
                Ok(())
            })?;
        }
        Ok(out)
    }

    fn builder_impls(&self, scope: &mut Scope) -> Result<(), GenError> {
        let rt = self.rt();
        let imp = scope.new_impl(&self.builder);

        let new_fn = imp.new_fn("new").vis("pub").ret("Self");
        let mut init = Block::new("Self");
        for plan in &self.fields {
            match &plan.default {
                Some(expr) if plan.boxed => {
                    init.line(format!("{}: Some(::std::boxed::Box::new({expr})),", plan.ident))
                }
                Some(expr) => init.line(format!("{}: Some({expr}),", plan.ident)),
                None => init.line(format!("{}: None,", plan.ident)),
            };
        }
        new_fn.push_block(init);

        for plan in &self.fields {
            let setter = imp
                .new_fn(&plan.ident)
                .vis("pub")
                .arg_self()
                .arg("value", plan.value_type.as_str())
                .ret("Self");
            setter.line("let mut builder = self;");
            if plan.boxed {
                setter.line(format!("builder.{} = Some(::std::boxed::Box::new(value));", plan.ident));
            } else {
                setter.line(format!("builder.{} = Some(value);", plan.ident));
            }
            setter.line("builder");
        }

        let build = imp
            .new_fn("build")
            .vis("pub")
            .doc("Validates the collected fields and produces the value.")
            .arg_self()
            .ret(format!("Result<{}, {rt}::BuildError>", self.name));
        if self.decl.is_union() {
            let counted: Vec<String> = self
                .fields
                .iter()
                .map(|plan| format!("usize::from(self.{}.is_some())", plan.ident))
                .collect();
            if counted.is_empty() {
                build.line("let set_fields: usize = 0;");
            } else {
                build.line(format!("let set_fields = {};", counted.join(" + ")));
            }
            let mut check = Block::new("if set_fields != 1");
            check.line(format!(
                "return Err({rt}::BuildError::InvalidUnionState {{ set_fields }});"
            ));
            build.push_block(check);
        }
        let mut value = Block::new(&format!("Ok({}", self.name));
        for plan in &self.fields {
            if plan.optional {
                value.line(format!("{0}: self.{0},", plan.ident));
            } else {
                value.line(format!(
                    "{0}: self.{0}.ok_or({rt}::BuildError::MissingRequiredField {{ field: {1:?} }})?,",
                    plan.ident, plan.field.name
                ));
            }
        }
        value.after(")");
        build.push_block(value);

        scope
            .new_impl(&self.builder)
            .impl_trait("Default")
            .new_fn("default")
            .ret("Self")
            .line("Self::new()");

        let from = scope.new_impl(&self.builder);
        from.impl_trait(format!("From<{}>", self.name));
        let from_fn = from.new_fn("from").arg("value", self.name.as_str()).ret("Self");
        let mut fields = Block::new("Self");
        for plan in &self.fields {
            if plan.optional {
                fields.line(format!("{0}: value.{0},", plan.ident));
            } else {
                fields.line(format!("{0}: Some(value.{0}),", plan.ident));
            }
        }
        from_fn.push_block(fields);
        Ok(())
    }

    fn identity_impls(&self, scope: &mut Scope) {
        let rt = self.rt();

        let eq = scope.new_impl(&self.name);
        eq.impl_trait(format!("{rt}::ThriftEq"));
        let eq_fn = eq.new_fn("thrift_eq").arg_ref_self().arg("other", "&Self").ret("bool");
        let mut same = Block::new("if ::std::ptr::eq(self, other)");
        same.line("return true;");
        eq_fn.push_block(same);
        if self.fields.is_empty() {
            eq_fn.line("true");
        } else {
            let compared: Vec<String> = self
                .fields
                .iter()
                .map(|plan| format!("{rt}::ThriftEq::thrift_eq(&self.{0}, &other.{0})", plan.ident))
                .collect();
            eq_fn.line(compared.join("\n    && "));
        }

        scope
            .new_impl(&self.name)
            .impl_trait("PartialEq")
            .new_fn("eq")
            .arg_ref_self()
            .arg("other", "&Self")
            .ret("bool")
            .line(format!("{rt}::ThriftEq::thrift_eq(self, other)"));

        scope.new_impl(&self.name).impl_trait("Eq");

        let hash = scope.new_impl(&self.name);
        hash.impl_trait(format!("{rt}::ThriftHash"));
        let hash_fn = hash.new_fn("thrift_hash").arg_ref_self().ret("i32");
        if self.fields.is_empty() {
            hash_fn.line("16777619");
        } else {
            hash_fn.line("let mut code: i32 = 16777619;");
            for plan in &self.fields {
                hash_fn.line(format!("code ^= {rt}::ThriftHash::thrift_hash(&self.{});", plan.ident));
                hash_fn.line("code = code.wrapping_mul(0x811c9dc5_u32 as i32);");
            }
            hash_fn.line("code");
        }

        scope
            .new_impl(&self.name)
            .impl_trait("::std::hash::Hash")
            .new_fn("hash")
            .generic("H")
            .bound("H", "::std::hash::Hasher")
            .arg_ref_self()
            .arg("state", "&mut H")
            .line(format!("state.write_i32({rt}::ThriftHash::thrift_hash(self));"));
    }

    fn display_impls(&self, scope: &mut Scope) -> Result<(), GenError> {
        let (format, args) = self.display_format()?;
        let mut call = format!("write!(f, {format:?}");
        for arg in &args {
            call.push_str(", ");
            call.push_str(arg);
        }
        call.push(')');

        scope
            .new_impl(&self.name)
            .impl_trait("::std::fmt::Display")
            .new_fn("fmt")
            .arg_ref_self()
            .arg("f", "&mut ::std::fmt::Formatter<'_>")
            .ret("::std::fmt::Result")
            .line(call);

        scope
            .new_impl(&self.name)
            .impl_trait("::std::fmt::Debug")
            .new_fn("fmt")
            .arg_ref_self()
            .arg("f", "&mut ::std::fmt::Formatter<'_>")
            .ret("::std::fmt::Result")
            .line("::std::fmt::Display::fmt(self, f)");

        if self.decl.is_exception() {
            scope.new_impl(&self.name).impl_trait("::std::error::Error");
        }
        Ok(())
    }

    /// The `write!` format string with literal runs merged, and its arguments.
    fn display_format(&self) -> Result<(String, Vec<String>), GenError> {
        let rt = self.rt();
        let schema = self.mapper.schema();
        let mut format = escape_braces(&format!("{}{{", self.decl.name));
        let mut args = Vec::new();

        for (index, plan) in self.fields.iter().enumerate() {
            if index > 0 {
                format.push_str(", ");
            }
            let label = self.mapper.config().field_naming.apply(&plan.field.name);
            format.push_str(&escape_braces(&format!("{label}=")));

            if plan.field.redacted {
                format.push_str(REDACTED);
                continue;
            }

            let len = if plan.optional {
                format!("self.{}.as_ref().map(|v| v.len())", plan.ident)
            } else {
                format!("Some(self.{}.len())", plan.ident)
            };
            let option = if plan.optional {
                plan.as_option("self")
            } else {
                format!("Some({})", plan.as_ref("self"))
            };

            let resolved = schema.true_type(&plan.field.ty)?;
            if plan.field.obfuscated {
                format.push_str("{}");
                let arg = match resolved {
                    SchemaType::List(element) => format!(
                        "{rt}::display::summarize_collection({len}, \"list\", {:?})",
                        schema.type_name(element)
                    ),
                    SchemaType::Set(element) => format!(
                        "{rt}::display::summarize_collection({len}, \"set\", {:?})",
                        schema.type_name(element)
                    ),
                    SchemaType::Map(key, value) => format!(
                        "{rt}::display::summarize_map({len}, {:?}, {:?})",
                        schema.type_name(key),
                        schema.type_name(value)
                    ),
                    _ => format!("{rt}::display::hash({option})"),
                };
                args.push(arg);
            } else {
                format.push_str("{}");
                // containers and binary have no Display
                let wrapper = match resolved {
                    SchemaType::List(_)
                    | SchemaType::Set(_)
                    | SchemaType::Map(..)
                    | SchemaType::Binary => "DebugOrNull",
                    _ => "OrNull",
                };
                args.push(format!("{rt}::display::{wrapper}({option})"));
            }
        }
        format.push_str("}}");
        Ok((format, args))
    }

    fn codec_impl(&self, scope: &mut Scope) -> Result<(), GenError> {
        let rt = self.rt();
        let codec = CodecGenerator::new(self.mapper);

        let writes: Vec<WriteField<'_>> = self
            .fields
            .iter()
            .map(|plan| WriteField {
                field: plan.field,
                access: if plan.optional {
                    Access::Maybe(plan.as_option("self"))
                } else {
                    Access::Present(plan.as_ref("self"))
                },
            })
            .collect();
        let reads: Vec<ReadField<'_>> = self
            .fields
            .iter()
            .map(|plan| ReadField {
                id: plan.field.id,
                ty: &plan.field.ty,
                sink: Sink::Builder(plan.ident.clone()),
            })
            .collect();

        let write_body = codec.write_struct(&self.decl.name, &writes)?;
        let read_body = codec.read_loop(&reads)?;

        let imp = scope.new_impl(&self.name);
        imp.impl_trait(format!("{rt}::ThriftStruct"));
        imp.new_fn("write")
            .arg_ref_self()
            .arg("protocol", format!("&mut dyn {rt}::Protocol"))
            .ret(format!("Result<(), {rt}::ProtocolError>"))
            .line(write_body.trim_end());
        imp.new_fn("read")
            .arg("protocol", format!("&mut dyn {rt}::Protocol"))
            .ret(format!("Result<Self, {rt}::ProtocolError>"))
            .line(format!("let mut builder = {}::new();", self.builder))
            .line(read_body.trim_end())
            .line(format!("builder.build().map_err({rt}::ProtocolError::from)"));
        Ok(())
    }
}

fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}
