use idlc_schema::SchemaError;

/// A schema-contract violation found while generating.
///
/// Every variant means the upstream resolver handed over something this
/// backend cannot express. Generation stops at the first one and nothing is
/// emitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("constant '{name}' has type {ty}, which has no literal form")]
    UnsupportedConstantType { name: String, ty: String },

    #[error("literal {literal} does not fit type {ty}")]
    LiteralMismatch { ty: String, literal: String },

    #[error("'{member}' is not a member of enum {enum_name}")]
    UnknownEnumMember { enum_name: String, member: String },

    #[error("constant references nest deeper than {0} levels")]
    ConstantDepth(usize),

    #[error("{ty} cannot be a set element or map key")]
    UnhashableType { ty: String },

    #[error("{ty} cannot be an element or key of an ordered container")]
    UnorderedType { ty: String },

    #[error("{ty} cannot appear as {context}")]
    UnexpectedType { ty: String, context: &'static str },

    #[error("failed to format generated code")]
    Format(#[from] std::fmt::Error),
}
