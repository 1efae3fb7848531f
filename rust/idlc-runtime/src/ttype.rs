//! Wire-type tags.
//!
//! A tag is one byte on the wire; readers see raw bytes, so these stay plain
//! `u8` constants rather than an enum that could not represent a corrupt tag.

pub const STOP: u8 = 0;
pub const VOID: u8 = 1;
pub const BOOL: u8 = 2;
pub const BYTE: u8 = 3;
pub const DOUBLE: u8 = 4;
pub const I16: u8 = 6;
pub const I32: u8 = 8;
pub const I64: u8 = 10;
pub const STRING: u8 = 11;
pub const STRUCT: u8 = 12;
pub const MAP: u8 = 13;
pub const SET: u8 = 14;
pub const LIST: u8 = 15;
/// Only used inside code generators; enums travel as [`I32`].
pub const ENUM: u8 = 16;

/// Human-readable tag name for error messages.
pub fn name(tag: u8) -> &'static str {
    match tag {
        STOP => "stop",
        VOID => "void",
        BOOL => "bool",
        BYTE => "byte",
        DOUBLE => "double",
        I16 => "i16",
        I32 => "i32",
        I64 => "i64",
        STRING => "string",
        STRUCT => "struct",
        MAP => "map",
        SET => "set",
        LIST => "list",
        ENUM => "enum",
        _ => "unknown",
    }
}
