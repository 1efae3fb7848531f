#![deny(unsafe_code)]

//! Rust code generation for IDL schemas.
//!
//! Takes a fully resolved [`idlc_schema::Schema`] (typedefs resolvable,
//! references bound to declarations, namespaces assigned) and emits Rust
//! source that models every declared type as a value type and implements the
//! binary wire protocol for it. The generated code compiles against
//! `idlc-runtime`.
//!
//! # Usage: In Your build.rs
//!
//! ```ignore
//! use idlc_codegen::{Generator, GeneratorConfig};
//!
//! fn main() {
//!     let schema = my_proto::schema();
//!     let source = Generator::new(&schema, GeneratorConfig::default())
//!         .generate_source()
//!         .unwrap();
//!
//!     let out = std::path::Path::new(&std::env::var("OUT_DIR").unwrap()).join("generated.rs");
//!     std::fs::write(out, source).unwrap();
//! }
//! ```
//!
//! and in the consuming crate:
//!
//! ```ignore
//! include!(concat!(env!("OUT_DIR"), "/generated.rs"));
//! ```
//!
//! # What Gets Emitted
//!
//! - **Enums**: field-less Rust enums with their wire values and
//!   `find_by_value`, which returns `None` for unknown values.
//! - **Structs, unions, exceptions**: private fields behind accessors, a
//!   `{Name}Builder` whose `build()` checks required fields (or, for unions,
//!   that exactly one field is set), identity `PartialEq`/`Hash`, a
//!   `Display` that honours redaction, and a `ThriftStruct` codec.
//! - **Constants**: one group per namespace.
//! - **Services**: a trait, a call unit per operation, and a blocking
//!   client.
//!
//! # Pruning
//!
//! [`Generator::generate_pruned`] emits only what the allow-listed
//! operations of one service need. The [`reachability`] walk decides which
//! structs and enums that is.
//!
//! # Errors
//!
//! Every operation returns [`GenError`] on the first schema-contract
//! violation. Nothing is emitted for a failed run.

pub mod code_writer;
mod codec;
pub mod config;
mod constants;
pub mod driver;
mod enums;
mod error;
pub mod naming;
pub mod reachability;
mod services;
mod structs;
pub mod types;

pub use config::{FieldNaming, GeneratorConfig, ListRepr, MapRepr, SetRepr, TypeProcessor};
pub use constants::ConstantRenderer;
pub use driver::{GeneratedUnit, Generator, UnitKind};
pub use enums::generate_enum;
pub use error::GenError;
pub use reachability::{Reachability, analyze};
pub use services::ServiceEmitter;
pub use structs::generate_struct;
pub use types::{TypeMapper, WireTag};
