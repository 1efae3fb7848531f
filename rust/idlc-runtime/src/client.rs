//! Synchronous request/response framing for generated clients.
//!
//! Each generated operation is a call unit implementing [`MethodCall`] (and
//! [`TwoWayCall`] unless one-way). [`ClientBase`] owns the protocol and the
//! sequence counter and drives a call unit through one exchange.

use tracing::{debug, trace};

use crate::codec::ThriftStruct;
use crate::error::{ApplicationException, ApplicationExceptionKind, CallError, ProtocolError};
use crate::protocol::{MessageMetadata, MessageType, Protocol};
use crate::ttype;
use crate::util::skip;

/// The send half of one operation.
pub trait MethodCall {
    type Output;
    /// The operation's declared exceptions.
    type Error;

    /// Operation name as it appears in the message header.
    fn name(&self) -> &'static str;

    /// `Call` for two-way operations, `Oneway` otherwise.
    fn message_type(&self) -> MessageType;

    /// Write the argument struct.
    fn send(&self, protocol: &mut dyn Protocol) -> Result<(), ProtocolError>;
}

/// The receive half of a two-way operation.
pub trait TwoWayCall: MethodCall {
    /// Decode the result struct of a REPLY frame whose header has already
    /// been read.
    fn receive(
        &self,
        protocol: &mut dyn Protocol,
        metadata: &MessageMetadata,
    ) -> Result<Self::Output, CallError<Self::Error>>;
}

/// Protocol plus sequence numbering shared by every generated client.
#[derive(Debug)]
pub struct ClientBase<P> {
    protocol: P,
    seq_id: i32,
}

impl<P: Protocol> ClientBase<P> {
    pub fn new(protocol: P) -> Self {
        Self {
            protocol,
            seq_id: 0,
        }
    }

    pub fn protocol_mut(&mut self) -> &mut P {
        &mut self.protocol
    }

    pub fn into_protocol(self) -> P {
        self.protocol
    }

    fn next_seq_id(&mut self) -> i32 {
        self.seq_id = self.seq_id.wrapping_add(1);
        self.seq_id
    }

    fn send<C: MethodCall>(&mut self, call: &C) -> Result<i32, ProtocolError> {
        let seq_id = self.next_seq_id();
        debug!(method = call.name(), seq_id, "sending call");
        self.protocol
            .write_message_begin(call.name(), call.message_type(), seq_id)?;
        call.send(&mut self.protocol)?;
        self.protocol.write_message_end()?;
        self.protocol.flush()?;
        Ok(seq_id)
    }

    /// Send a one-way call. No reply is read.
    pub fn send_oneway<C: MethodCall>(&mut self, call: &C) -> Result<(), ProtocolError> {
        self.send(call).map(|_| ())
    }

    /// Send a call and block on its reply.
    pub fn call<C: TwoWayCall>(&mut self, call: &C) -> Result<C::Output, CallError<C::Error>> {
        let seq_id = self.send(call)?;

        let metadata = self.protocol.read_message_begin()?;
        trace!(
            method = %metadata.name,
            seq_id = metadata.seq_id,
            message_type = ?metadata.message_type,
            "received reply"
        );
        if metadata.seq_id != seq_id {
            return Err(ProtocolError::BadSequenceId {
                expected: seq_id,
                received: metadata.seq_id,
            }
            .into());
        }

        match metadata.message_type {
            MessageType::Reply => {
                let result = call.receive(&mut self.protocol, &metadata);
                self.protocol.read_message_end()?;
                result
            }
            MessageType::Exception => {
                let exception = ApplicationException::read(&mut self.protocol)?;
                self.protocol.read_message_end()?;
                Err(CallError::Application(exception))
            }
            other => Err(CallError::Application(ApplicationException::new(
                ApplicationExceptionKind::InvalidMessageType,
                format!("expected a reply, got {other:?}"),
            ))),
        }
    }
}

impl ThriftStruct for ApplicationException {
    fn write(&self, protocol: &mut dyn Protocol) -> Result<(), ProtocolError> {
        protocol.write_struct_begin("TApplicationException")?;
        protocol.write_field_begin("message", 1, ttype::STRING)?;
        protocol.write_string(&self.message)?;
        protocol.write_field_end()?;
        protocol.write_field_begin("type", 2, ttype::I32)?;
        protocol.write_i32(self.kind.value())?;
        protocol.write_field_end()?;
        protocol.write_field_stop()?;
        protocol.write_struct_end()
    }

    fn read(protocol: &mut dyn Protocol) -> Result<Self, ProtocolError> {
        let mut message = String::new();
        let mut kind = ApplicationExceptionKind::Unknown;

        protocol.read_struct_begin()?;
        loop {
            let field = protocol.read_field_begin()?;
            if field.type_id == ttype::STOP {
                break;
            }
            match (field.field_id, field.type_id) {
                (1, ttype::STRING) => message = protocol.read_string()?,
                (2, ttype::I32) => kind = ApplicationExceptionKind::from_value(protocol.read_i32()?),
                (_, other) => skip(protocol, other)?,
            }
            protocol.read_field_end()?;
        }
        protocol.read_struct_end()?;

        Ok(ApplicationException { kind, message })
    }
}
