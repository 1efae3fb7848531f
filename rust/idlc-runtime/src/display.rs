//! Rendering helpers used by generated `Display` impls.
//!
//! Obfuscated fields never print their value. Scalars print an opaque
//! hash; collections print only their shape.

use std::fmt;

use crate::identity::ThriftHash;

/// Prints a present value as-is and `null` for an absent one.
pub struct OrNull<'a, T: ?Sized>(pub Option<&'a T>);

impl<T: fmt::Display + ?Sized> fmt::Display for OrNull<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => fmt::Display::fmt(value, f),
            None => f.write_str("null"),
        }
    }
}

/// [`OrNull`] for containers and binary, which only have `Debug`.
pub struct DebugOrNull<'a, T: ?Sized>(pub Option<&'a T>);

impl<T: fmt::Debug + ?Sized> fmt::Display for DebugOrNull<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => fmt::Debug::fmt(value, f),
            None => f.write_str("null"),
        }
    }
}

/// Eight upper-case hex digits of the value's identity hash.
pub fn hash<T: ThriftHash + ?Sized>(value: Option<&T>) -> String {
    match value {
        Some(value) => format!("{:08X}", value.thrift_hash() as u32),
        None => "null".to_string(),
    }
}

/// `list<i32>(size=3)`; `kind` is `list` or `set`.
pub fn summarize_collection(len: Option<usize>, kind: &str, element_type: &str) -> String {
    match len {
        Some(len) => format!("{kind}<{element_type}>(size={len})"),
        None => "null".to_string(),
    }
}

/// `map<string, i64>(size=2)`.
pub fn summarize_map(len: Option<usize>, key_type: &str, value_type: &str) -> String {
    match len {
        Some(len) => format!("map<{key_type}, {value_type}>(size={len})"),
        None => "null".to_string(),
    }
}
