#![deny(unsafe_code)]

//! Support library for Rust code generated by `idlc`.
//!
//! Generated code refers to this crate by absolute path
//! (`::idlc_runtime::...`), so a crate that includes generated sources only
//! needs it as a dependency. Nothing here knows about any particular
//! schema: it frames bytes, hashes values, and drives call units.

mod binary;
mod client;
mod codec;
pub mod display;
mod error;
mod identity;
mod protocol;
pub mod ttype;
mod util;

pub use binary::BinaryProtocol;
pub use client::{ClientBase, MethodCall, TwoWayCall};
pub use codec::ThriftStruct;
pub use error::{
    ApplicationException, ApplicationExceptionKind, BuildError, CallError, Never, ProtocolError,
};
pub use identity::{ThriftEq, ThriftHash};
pub use protocol::{
    FieldMetadata, ListMetadata, MapMetadata, MessageMetadata, MessageType, Protocol, SetMetadata,
};
pub use util::{MAX_NESTING_DEPTH, collection_size, skip};
