#![deny(unsafe_code)]

//! Resolved schema graph consumed by `idlc-codegen`.
//!
//! The front end (lexer, parser, resolver) is not part of this workspace. It
//! hands the generator a [`Schema`]: an arena of declarations where every
//! cross-reference is a typed id. The generator only ever reads it.
//!
//! Cyclic struct graphs are the normal case, not an edge case:
//!
//! ```
//! use idlc_schema::{Field, Schema, SchemaType, StructKind, StructType};
//!
//! let mut schema = Schema::new();
//! let node = schema.add_struct(StructType::new("Node", "demo", StructKind::Struct));
//! schema
//!     .struct_mut(node)
//!     .fields
//!     .push(Field::new(1, "next", SchemaType::Struct(node)).optional());
//!
//! assert_eq!(schema.struct_type(node).fields.len(), 1);
//! ```

mod types;

pub use types::*;

/// Contract violations detected while reading the graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("typedef cycle through '{name}'")]
    TypedefCycle { name: String },
}

/// The declaration arena.
///
/// Ids are only minted by the `add_*` methods of the same schema; looking up
/// an id from a different schema panics like any out-of-bounds index.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    structs: Vec<StructType>,
    enums: Vec<EnumType>,
    typedefs: Vec<TypedefType>,
    services: Vec<ServiceType>,
    constants: Vec<Constant>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_struct(&mut self, ty: StructType) -> StructId {
        self.structs.push(ty);
        StructId((self.structs.len() - 1) as u32)
    }

    pub fn add_enum(&mut self, ty: EnumType) -> EnumId {
        self.enums.push(ty);
        EnumId((self.enums.len() - 1) as u32)
    }

    pub fn add_typedef(&mut self, ty: TypedefType) -> TypedefId {
        self.typedefs.push(ty);
        TypedefId((self.typedefs.len() - 1) as u32)
    }

    pub fn add_service(&mut self, ty: ServiceType) -> ServiceId {
        self.services.push(ty);
        ServiceId((self.services.len() - 1) as u32)
    }

    pub fn add_constant(&mut self, constant: Constant) {
        self.constants.push(constant);
    }

    pub fn struct_type(&self, id: StructId) -> &StructType {
        &self.structs[id.index()]
    }

    /// Needed while building cyclic graphs: declare first, fill fields later.
    pub fn struct_mut(&mut self, id: StructId) -> &mut StructType {
        &mut self.structs[id.index()]
    }

    pub fn enum_type(&self, id: EnumId) -> &EnumType {
        &self.enums[id.index()]
    }

    pub fn typedef(&self, id: TypedefId) -> &TypedefType {
        &self.typedefs[id.index()]
    }

    pub fn typedef_mut(&mut self, id: TypedefId) -> &mut TypedefType {
        &mut self.typedefs[id.index()]
    }

    pub fn service(&self, id: ServiceId) -> &ServiceType {
        &self.services[id.index()]
    }

    pub fn service_mut(&mut self, id: ServiceId) -> &mut ServiceType {
        &mut self.services[id.index()]
    }

    /// All struct-like declarations of one kind, in declaration order.
    pub fn structs_of_kind(
        &self,
        kind: StructKind,
    ) -> impl Iterator<Item = (StructId, &StructType)> + '_ {
        self.structs
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.kind == kind)
            .map(|(i, s)| (StructId(i as u32), s))
    }

    pub fn enums(&self) -> impl Iterator<Item = (EnumId, &EnumType)> + '_ {
        self.enums
            .iter()
            .enumerate()
            .map(|(i, e)| (EnumId(i as u32), e))
    }

    pub fn services(&self) -> impl Iterator<Item = (ServiceId, &ServiceType)> + '_ {
        self.services
            .iter()
            .enumerate()
            .map(|(i, s)| (ServiceId(i as u32), s))
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    /// Follow typedefs until a non-typedef type is reached.
    ///
    /// Only the outermost layer is resolved; a `list<MyTypedef>` keeps its
    /// element as-is and callers resolve it when they descend.
    pub fn true_type<'a>(&'a self, ty: &'a SchemaType) -> Result<&'a SchemaType, SchemaError> {
        let mut current = ty;
        let mut seen: Vec<TypedefId> = Vec::new();
        while let SchemaType::Typedef(id) = current {
            if seen.contains(id) {
                return Err(SchemaError::TypedefCycle {
                    name: self.typedef(*id).name.clone(),
                });
            }
            seen.push(*id);
            current = &self.typedef(*id).target;
        }
        Ok(current)
    }

    /// The IDL spelling of a type, e.g. `map<string, list<i32>>` or `Query`.
    ///
    /// Typedefs are shown by their own name, the way they were written.
    pub fn type_name(&self, ty: &SchemaType) -> String {
        match ty {
            SchemaType::Void => "void".into(),
            SchemaType::Bool => "bool".into(),
            SchemaType::Byte => "byte".into(),
            SchemaType::I16 => "i16".into(),
            SchemaType::I32 => "i32".into(),
            SchemaType::I64 => "i64".into(),
            SchemaType::Double => "double".into(),
            SchemaType::String => "string".into(),
            SchemaType::Binary => "binary".into(),
            SchemaType::Enum(id) => self.enum_type(*id).name.clone(),
            SchemaType::List(element) => format!("list<{}>", self.type_name(element)),
            SchemaType::Set(element) => format!("set<{}>", self.type_name(element)),
            SchemaType::Map(key, value) => {
                format!("map<{}, {}>", self.type_name(key), self.type_name(value))
            }
            SchemaType::Struct(id) | SchemaType::Union(id) | SchemaType::Exception(id) => {
                self.struct_type(*id).name.clone()
            }
            SchemaType::Typedef(id) => self.typedef(*id).name.clone(),
            SchemaType::Service(id) => self.service(*id).name.clone(),
        }
    }

    /// The service followed by its ancestors, nearest first.
    ///
    /// Stops early if the upstream resolver let an inheritance cycle through.
    pub fn service_chain(&self, id: ServiceId) -> Vec<ServiceId> {
        let mut chain = vec![id];
        let mut current = self.service(id).extends;
        while let Some(parent) = current {
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = self.service(parent).extends;
        }
        chain
    }
}
