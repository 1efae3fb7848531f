//! Helpers called from generated read and write paths.

use crate::error::ProtocolError;
use crate::protocol::Protocol;
use crate::ttype;

/// Deepest nesting a reader follows before giving up, both in [`skip`] and
/// in struct frames read through [`BinaryProtocol`](crate::BinaryProtocol).
pub const MAX_NESTING_DEPTH: usize = 64;

/// Consume one value of wire type `type_id` without decoding it.
///
/// Used for field ids the reader does not know about.
pub fn skip(protocol: &mut dyn Protocol, type_id: u8) -> Result<(), ProtocolError> {
    skip_nested(protocol, type_id, MAX_NESTING_DEPTH)
}

fn skip_nested(protocol: &mut dyn Protocol, type_id: u8, depth: usize) -> Result<(), ProtocolError> {
    if depth == 0 {
        return Err(ProtocolError::DepthLimit(MAX_NESTING_DEPTH));
    }
    match type_id {
        ttype::BOOL => {
            protocol.read_bool()?;
        }
        ttype::BYTE => {
            protocol.read_byte()?;
        }
        ttype::I16 => {
            protocol.read_i16()?;
        }
        ttype::I32 | ttype::ENUM => {
            protocol.read_i32()?;
        }
        ttype::I64 => {
            protocol.read_i64()?;
        }
        ttype::DOUBLE => {
            protocol.read_double()?;
        }
        ttype::STRING => {
            protocol.read_binary()?;
        }
        ttype::STRUCT => {
            protocol.read_struct_begin()?;
            loop {
                let field = protocol.read_field_begin()?;
                if field.type_id == ttype::STOP {
                    break;
                }
                skip_nested(protocol, field.type_id, depth - 1)?;
                protocol.read_field_end()?;
            }
            protocol.read_struct_end()?;
        }
        ttype::LIST => {
            let list = protocol.read_list_begin()?;
            for _ in 0..list.size {
                skip_nested(protocol, list.element_type_id, depth - 1)?;
            }
            protocol.read_list_end()?;
        }
        ttype::SET => {
            let set = protocol.read_set_begin()?;
            for _ in 0..set.size {
                skip_nested(protocol, set.element_type_id, depth - 1)?;
            }
            protocol.read_set_end()?;
        }
        ttype::MAP => {
            let map = protocol.read_map_begin()?;
            for _ in 0..map.size {
                skip_nested(protocol, map.key_type_id, depth - 1)?;
                skip_nested(protocol, map.value_type_id, depth - 1)?;
            }
            protocol.read_map_end()?;
        }
        other => return Err(ProtocolError::UnknownType(other)),
    }
    Ok(())
}

/// Element count as written in a container header.
pub fn collection_size(len: usize) -> Result<i32, ProtocolError> {
    i32::try_from(len).map_err(|_| ProtocolError::SizeLimit(len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BinaryProtocol;

    #[test]
    fn skips_nested_struct_and_leaves_the_rest() {
        let mut w = BinaryProtocol::new();
        w.write_struct_begin("Outer").unwrap();
        w.write_field_begin("inner", 1, ttype::LIST).unwrap();
        w.write_list_begin(ttype::MAP, 1).unwrap();
        w.write_map_begin(ttype::STRING, ttype::I64, 1).unwrap();
        w.write_string("k").unwrap();
        w.write_i64(9).unwrap();
        w.write_field_end().unwrap();
        w.write_field_stop().unwrap();
        w.write_i32(42).unwrap();

        let mut r = BinaryProtocol::with_input(w.into_output());
        skip(&mut r, ttype::STRUCT).unwrap();
        assert_eq!(r.read_i32().unwrap(), 42);
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let mut r = BinaryProtocol::with_input(vec![0; 8]);
        assert_eq!(skip(&mut r, 99).unwrap_err(), ProtocolError::UnknownType(99));
    }

    #[test]
    fn deep_nesting_is_refused() {
        // 100 nested single-element lists of lists.
        let mut w = BinaryProtocol::new();
        for _ in 0..100 {
            w.write_list_begin(ttype::LIST, 1).unwrap();
        }
        let mut r = BinaryProtocol::with_input(w.into_output());
        assert_eq!(
            skip(&mut r, ttype::LIST).unwrap_err(),
            ProtocolError::DepthLimit(MAX_NESTING_DEPTH)
        );
    }

    #[test]
    fn collection_size_rejects_overflow() {
        assert_eq!(collection_size(3).unwrap(), 3);
        assert!(collection_size(usize::MAX).is_err());
    }
}
