//! The trait every generated struct, union, and exception implements.

use crate::error::ProtocolError;
use crate::protocol::Protocol;

pub trait ThriftStruct: Sized {
    /// Write the value as a struct frame terminated by a field stop.
    fn write(&self, protocol: &mut dyn Protocol) -> Result<(), ProtocolError>;

    /// Read one struct frame, skipping field ids this type does not declare.
    fn read(protocol: &mut dyn Protocol) -> Result<Self, ProtocolError>;
}
