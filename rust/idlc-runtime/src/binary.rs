//! The strict binary protocol over in-memory buffers.
//!
//! Layout, all integers big-endian:
//!
//! ```text
//! field header      [type: u8][id: i16]
//! field stop        [0u8]
//! list/set header   [element type: u8][size: i32]
//! map header        [key type: u8][value type: u8][size: i32]
//! string/binary     [len: i32][bytes]
//! message header    [0x8001_00 | type: i32][name: string][seq id: i32]
//! ```

use crate::error::ProtocolError;
use crate::protocol::{
    FieldMetadata, ListMetadata, MapMetadata, MessageMetadata, MessageType, Protocol, SetMetadata,
};
use crate::ttype;
use crate::util::MAX_NESTING_DEPTH;

const VERSION_1: u32 = 0x8001_0000;
const VERSION_MASK: u32 = 0xffff_0000;

/// Reads from one buffer and writes to another.
///
/// Keeping the two apart lets a client write its request while a canned
/// reply waits in the input buffer.
#[derive(Debug, Default, Clone)]
pub struct BinaryProtocol {
    input: Vec<u8>,
    pos: usize,
    output: Vec<u8>,
    /// Struct frames currently open on the read side.
    depth: usize,
}

impl BinaryProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    /// A protocol whose reads consume `input`.
    pub fn with_input(input: impl Into<Vec<u8>>) -> Self {
        Self {
            input: input.into(),
            pos: 0,
            output: Vec::new(),
            depth: 0,
        }
    }

    /// Append more bytes for subsequent reads.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.input.extend_from_slice(bytes);
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    pub fn into_output(self) -> Vec<u8> {
        self.output
    }

    /// Unread input bytes.
    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&[u8], ProtocolError> {
        if self.remaining() < n {
            return Err(ProtocolError::UnexpectedEof);
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.input[start..self.pos])
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_size(&mut self) -> Result<usize, ProtocolError> {
        let size = self.read_i32()?;
        usize::try_from(size).map_err(|_| ProtocolError::NegativeSize(size))
    }

    fn read_container_size(&mut self) -> Result<i32, ProtocolError> {
        let size = self.read_i32()?;
        if size < 0 {
            return Err(ProtocolError::NegativeSize(size));
        }
        Ok(size)
    }

    fn write_len(&mut self, len: usize) -> Result<(), ProtocolError> {
        let len = i32::try_from(len).map_err(|_| ProtocolError::SizeLimit(len))?;
        self.write_i32(len)
    }
}

impl Protocol for BinaryProtocol {
    fn write_message_begin(
        &mut self,
        name: &str,
        message_type: MessageType,
        seq_id: i32,
    ) -> Result<(), ProtocolError> {
        self.write_i32((VERSION_1 | u32::from(message_type.as_byte())) as i32)?;
        self.write_string(name)?;
        self.write_i32(seq_id)
    }

    fn write_message_end(&mut self) -> Result<(), ProtocolError> {
        Ok(())
    }

    fn write_struct_begin(&mut self, _name: &str) -> Result<(), ProtocolError> {
        Ok(())
    }

    fn write_struct_end(&mut self) -> Result<(), ProtocolError> {
        Ok(())
    }

    fn write_field_begin(
        &mut self,
        _name: &str,
        field_id: i16,
        type_id: u8,
    ) -> Result<(), ProtocolError> {
        self.output.push(type_id);
        self.write_i16(field_id)
    }

    fn write_field_end(&mut self) -> Result<(), ProtocolError> {
        Ok(())
    }

    fn write_field_stop(&mut self) -> Result<(), ProtocolError> {
        self.output.push(ttype::STOP);
        Ok(())
    }

    fn write_list_begin(&mut self, element_type_id: u8, size: i32) -> Result<(), ProtocolError> {
        self.output.push(element_type_id);
        self.write_i32(size)
    }

    fn write_list_end(&mut self) -> Result<(), ProtocolError> {
        Ok(())
    }

    fn write_set_begin(&mut self, element_type_id: u8, size: i32) -> Result<(), ProtocolError> {
        self.output.push(element_type_id);
        self.write_i32(size)
    }

    fn write_set_end(&mut self) -> Result<(), ProtocolError> {
        Ok(())
    }

    fn write_map_begin(
        &mut self,
        key_type_id: u8,
        value_type_id: u8,
        size: i32,
    ) -> Result<(), ProtocolError> {
        self.output.push(key_type_id);
        self.output.push(value_type_id);
        self.write_i32(size)
    }

    fn write_map_end(&mut self) -> Result<(), ProtocolError> {
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> Result<(), ProtocolError> {
        self.output.push(u8::from(value));
        Ok(())
    }

    fn write_byte(&mut self, value: i8) -> Result<(), ProtocolError> {
        self.output.extend_from_slice(&value.to_be_bytes());
        Ok(())
    }

    fn write_i16(&mut self, value: i16) -> Result<(), ProtocolError> {
        self.output.extend_from_slice(&value.to_be_bytes());
        Ok(())
    }

    fn write_i32(&mut self, value: i32) -> Result<(), ProtocolError> {
        self.output.extend_from_slice(&value.to_be_bytes());
        Ok(())
    }

    fn write_i64(&mut self, value: i64) -> Result<(), ProtocolError> {
        self.output.extend_from_slice(&value.to_be_bytes());
        Ok(())
    }

    fn write_double(&mut self, value: f64) -> Result<(), ProtocolError> {
        self.output.extend_from_slice(&value.to_bits().to_be_bytes());
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<(), ProtocolError> {
        self.write_binary(value.as_bytes())
    }

    fn write_binary(&mut self, value: &[u8]) -> Result<(), ProtocolError> {
        self.write_len(value.len())?;
        self.output.extend_from_slice(value);
        Ok(())
    }

    fn read_message_begin(&mut self) -> Result<MessageMetadata, ProtocolError> {
        // a failed read may have left frames open
        self.depth = 0;
        let header = self.read_i32()?;
        if header < 0 {
            let header = header as u32;
            if header & VERSION_MASK != VERSION_1 {
                return Err(ProtocolError::BadVersion(header));
            }
            let message_type = MessageType::from_byte((header & 0xff) as u8)?;
            let name = self.read_string()?;
            let seq_id = self.read_i32()?;
            Ok(MessageMetadata {
                name,
                message_type,
                seq_id,
            })
        } else {
            // Pre-versioned header: the first word is the name length.
            let len = header as usize;
            let name = String::from_utf8(self.take(len)?.to_vec())
                .map_err(|_| ProtocolError::InvalidUtf8)?;
            let message_type = MessageType::from_byte(self.read_byte()? as u8)?;
            let seq_id = self.read_i32()?;
            Ok(MessageMetadata {
                name,
                message_type,
                seq_id,
            })
        }
    }

    fn read_message_end(&mut self) -> Result<(), ProtocolError> {
        Ok(())
    }

    fn read_struct_begin(&mut self) -> Result<(), ProtocolError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ProtocolError::DepthLimit(MAX_NESTING_DEPTH));
        }
        self.depth += 1;
        Ok(())
    }

    fn read_struct_end(&mut self) -> Result<(), ProtocolError> {
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }

    fn read_field_begin(&mut self) -> Result<FieldMetadata, ProtocolError> {
        let type_id = self.read_byte()? as u8;
        let field_id = if type_id == ttype::STOP {
            0
        } else {
            self.read_i16()?
        };
        Ok(FieldMetadata {
            name: String::new(),
            type_id,
            field_id,
        })
    }

    fn read_field_end(&mut self) -> Result<(), ProtocolError> {
        Ok(())
    }

    fn read_list_begin(&mut self) -> Result<ListMetadata, ProtocolError> {
        let element_type_id = self.read_byte()? as u8;
        let size = self.read_container_size()?;
        Ok(ListMetadata {
            element_type_id,
            size,
        })
    }

    fn read_list_end(&mut self) -> Result<(), ProtocolError> {
        Ok(())
    }

    fn read_set_begin(&mut self) -> Result<SetMetadata, ProtocolError> {
        let element_type_id = self.read_byte()? as u8;
        let size = self.read_container_size()?;
        Ok(SetMetadata {
            element_type_id,
            size,
        })
    }

    fn read_set_end(&mut self) -> Result<(), ProtocolError> {
        Ok(())
    }

    fn read_map_begin(&mut self) -> Result<MapMetadata, ProtocolError> {
        let key_type_id = self.read_byte()? as u8;
        let value_type_id = self.read_byte()? as u8;
        let size = self.read_container_size()?;
        Ok(MapMetadata {
            key_type_id,
            value_type_id,
            size,
        })
    }

    fn read_map_end(&mut self) -> Result<(), ProtocolError> {
        Ok(())
    }

    fn read_bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.read_byte()? != 0)
    }

    fn read_byte(&mut self) -> Result<i8, ProtocolError> {
        Ok(i8::from_be_bytes(self.take_array()?))
    }

    fn read_i16(&mut self) -> Result<i16, ProtocolError> {
        Ok(i16::from_be_bytes(self.take_array()?))
    }

    fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    fn read_i64(&mut self) -> Result<i64, ProtocolError> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    fn read_double(&mut self) -> Result<f64, ProtocolError> {
        Ok(f64::from_bits(u64::from_be_bytes(self.take_array()?)))
    }

    fn read_string(&mut self) -> Result<String, ProtocolError> {
        String::from_utf8(self.read_binary()?).map_err(|_| ProtocolError::InvalidUtf8)
    }

    fn read_binary(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let len = self.read_size()?;
        Ok(self.take(len)?.to_vec())
    }
}
