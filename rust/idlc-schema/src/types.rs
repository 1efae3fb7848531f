//! Declarations stored in the schema arena.
//!
//! Every declaration carries the namespace it targets (dotted, e.g.
//! `demo.search`; empty for the root) and, when the front end knows it,
//! the source location it was parsed from.

use std::collections::BTreeMap;
use std::fmt;

/// Index of a struct, union, or exception declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StructId(pub(crate) u32);

/// Index of an enum declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EnumId(pub(crate) u32);

/// Index of a typedef declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypedefId(pub(crate) u32);

/// Index of a service declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceId(pub(crate) u32);

macro_rules! impl_index {
    ($($id:ident),*) => {$(
        impl $id {
            /// Position of the declaration in its arena.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    )*};
}

impl_index!(StructId, EnumId, TypedefId, ServiceId);

/// The closed set of schema types.
///
/// Named declarations are referenced by id, never embedded, so a struct that
/// (transitively) contains itself is just a pair of ids pointing at each other.
/// Containers are trees and own their element types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaType {
    Void,
    Bool,
    Byte,
    I16,
    I32,
    I64,
    Double,
    String,
    Binary,
    Enum(EnumId),
    List(Box<SchemaType>),
    Set(Box<SchemaType>),
    Map(Box<SchemaType>, Box<SchemaType>),
    Struct(StructId),
    Union(StructId),
    Exception(StructId),
    Typedef(TypedefId),
    Service(ServiceId),
}

impl SchemaType {
    pub fn list(element: SchemaType) -> Self {
        SchemaType::List(Box::new(element))
    }

    pub fn set(element: SchemaType) -> Self {
        SchemaType::Set(Box::new(element))
    }

    pub fn map(key: SchemaType, value: SchemaType) -> Self {
        SchemaType::Map(Box::new(key), Box::new(value))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, SchemaType::Void)
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            SchemaType::List(_) | SchemaType::Set(_) | SchemaType::Map(..)
        )
    }

    /// The struct-like declaration this type names, if any.
    pub fn struct_id(&self) -> Option<StructId> {
        match self {
            SchemaType::Struct(id) | SchemaType::Union(id) | SchemaType::Exception(id) => Some(*id),
            _ => None,
        }
    }
}

/// Where a declaration came from, for traceability comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(path: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            path: path.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.line, self.column)
    }
}

/// How strongly a field must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Requiredness {
    Required,
    Optional,
    /// Neither keyword given in the IDL; behaves as optional.
    #[default]
    Default,
}

/// A literal as written in the IDL.
///
/// The resolver has already checked that the literal fits its declared type;
/// the renderer still rejects shapes it cannot express.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Int(i64),
    Double(f64),
    String(String),
    /// A bare identifier: `true`, `false`, an enum member (`Color.RED`), or a
    /// reference to another constant.
    Identifier(String),
    /// Lists and sets share a literal form.
    List(Vec<ConstValue>),
    Map(Vec<(ConstValue, ConstValue)>),
}

/// One member of a struct, union, exception, parameter list, or throws list.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Wire tag; unique within the owning declaration.
    pub id: i16,
    pub name: String,
    pub ty: SchemaType,
    pub requiredness: Requiredness,
    pub default_value: Option<ConstValue>,
    pub redacted: bool,
    pub obfuscated: bool,
    pub deprecated: bool,
    pub documentation: Option<String>,
}

impl Field {
    pub fn new(id: i16, name: impl Into<String>, ty: SchemaType) -> Self {
        Self {
            id,
            name: name.into(),
            ty,
            requiredness: Requiredness::Default,
            default_value: None,
            redacted: false,
            obfuscated: false,
            deprecated: false,
            documentation: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.requiredness = Requiredness::Required;
        self
    }

    pub fn optional(mut self) -> Self {
        self.requiredness = Requiredness::Optional;
        self
    }

    pub fn with_default(mut self, value: ConstValue) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn redacted(mut self) -> Self {
        self.redacted = true;
        self
    }

    pub fn obfuscated(mut self) -> Self {
        self.obfuscated = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.documentation = Some(doc.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.requiredness == Requiredness::Required
    }
}

/// Discriminates the three struct-like declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructKind {
    Struct,
    Union,
    Exception,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub name: String,
    pub namespace: String,
    pub kind: StructKind,
    pub fields: Vec<Field>,
    pub documentation: Option<String>,
    pub deprecated: bool,
    pub location: Option<Location>,
}

impl StructType {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, kind: StructKind) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            kind,
            fields: Vec::new(),
            documentation: None,
            deprecated: false,
            location: None,
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn is_union(&self) -> bool {
        self.kind == StructKind::Union
    }

    pub fn is_exception(&self) -> bool {
        self.kind == StructKind::Exception
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub value: i32,
    pub documentation: Option<String>,
    pub deprecated: bool,
}

impl EnumMember {
    pub fn new(name: impl Into<String>, value: i32) -> Self {
        Self {
            name: name.into(),
            value,
            documentation: None,
            deprecated: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub namespace: String,
    pub members: Vec<EnumMember>,
    pub documentation: Option<String>,
    pub deprecated: bool,
    pub location: Option<Location>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            members: Vec::new(),
            documentation: None,
            deprecated: false,
            location: None,
        }
    }

    pub fn with_member(mut self, name: impl Into<String>, value: i32) -> Self {
        self.members.push(EnumMember::new(name, value));
        self
    }

    /// Values need not be contiguous, so this is a search, not an index.
    pub fn member_by_value(&self, value: i32) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.value == value)
    }

    pub fn member_by_name(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedefType {
    pub name: String,
    pub namespace: String,
    pub target: SchemaType,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceMethod {
    pub name: String,
    pub parameters: Vec<Field>,
    /// `SchemaType::Void` for operations without a result.
    pub return_type: SchemaType,
    pub exceptions: Vec<Field>,
    pub one_way: bool,
    pub annotations: BTreeMap<String, String>,
    pub documentation: Option<String>,
    pub deprecated: bool,
}

impl ServiceMethod {
    pub fn new(name: impl Into<String>, return_type: SchemaType) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type,
            exceptions: Vec::new(),
            one_way: false,
            annotations: BTreeMap::new(),
            documentation: None,
            deprecated: false,
        }
    }

    pub fn with_parameter(mut self, field: Field) -> Self {
        self.parameters.push(field);
        self
    }

    pub fn with_exception(mut self, field: Field) -> Self {
        self.exceptions.push(field);
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn one_way(mut self) -> Self {
        self.one_way = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceType {
    pub name: String,
    pub namespace: String,
    /// Single inheritance only.
    pub extends: Option<ServiceId>,
    pub methods: Vec<ServiceMethod>,
    pub annotations: BTreeMap<String, String>,
    pub documentation: Option<String>,
    pub deprecated: bool,
    pub location: Option<Location>,
}

impl ServiceType {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            extends: None,
            methods: Vec::new(),
            annotations: BTreeMap::new(),
            documentation: None,
            deprecated: false,
            location: None,
        }
    }

    pub fn extending(mut self, parent: ServiceId) -> Self {
        self.extends = Some(parent);
        self
    }

    pub fn with_method(mut self, method: ServiceMethod) -> Self {
        self.methods.push(method);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: String,
    pub namespace: String,
    pub ty: SchemaType,
    pub value: ConstValue,
    pub documentation: Option<String>,
    pub deprecated: bool,
    pub location: Option<Location>,
}

impl Constant {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        ty: SchemaType,
        value: ConstValue,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ty,
            value,
            documentation: None,
            deprecated: false,
            location: None,
        }
    }
}
