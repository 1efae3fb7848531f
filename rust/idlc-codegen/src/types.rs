//! Type mapping: schema types to Rust types and wire tags.

use std::collections::BTreeSet;

use idlc_schema::{Schema, SchemaType, StructId};

use crate::config::GeneratorConfig;
use crate::error::GenError;
use crate::naming;

/// Wire tag of a resolved type, as the runtime constant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireTag {
    Bool,
    Byte,
    Double,
    I16,
    I32,
    I64,
    String,
    Struct,
    Map,
    Set,
    List,
    Enum,
}

impl WireTag {
    pub fn name(self) -> &'static str {
        match self {
            WireTag::Bool => "BOOL",
            WireTag::Byte => "BYTE",
            WireTag::Double => "DOUBLE",
            WireTag::I16 => "I16",
            WireTag::I32 => "I32",
            WireTag::I64 => "I64",
            WireTag::String => "STRING",
            WireTag::Struct => "STRUCT",
            WireTag::Map => "MAP",
            WireTag::Set => "SET",
            WireTag::List => "LIST",
            WireTag::Enum => "ENUM",
        }
    }

    /// The tag actually written; enums travel as 32-bit integers.
    pub fn on_wire(self) -> Self {
        match self {
            WireTag::Enum => WireTag::I32,
            other => other,
        }
    }
}

pub struct TypeMapper<'a> {
    schema: &'a Schema,
    config: &'a GeneratorConfig,
}

impl<'a> TypeMapper<'a> {
    pub fn new(schema: &'a Schema, config: &'a GeneratorConfig) -> Self {
        Self { schema, config }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn config(&self) -> &'a GeneratorConfig {
        self.config
    }

    /// `{runtime}::ttype::NAME` for the on-wire tag of `ty`.
    pub fn tag_path(&self, ty: &SchemaType) -> Result<String, GenError> {
        Ok(format!(
            "{}::ttype::{}",
            self.config.runtime_path,
            self.wire_tag(ty)?.on_wire().name()
        ))
    }

    pub fn wire_tag(&self, ty: &SchemaType) -> Result<WireTag, GenError> {
        let tag = match self.schema.true_type(ty)? {
            SchemaType::Bool => WireTag::Bool,
            SchemaType::Byte => WireTag::Byte,
            SchemaType::I16 => WireTag::I16,
            SchemaType::I32 => WireTag::I32,
            SchemaType::I64 => WireTag::I64,
            SchemaType::Double => WireTag::Double,
            SchemaType::String | SchemaType::Binary => WireTag::String,
            SchemaType::Enum(_) => WireTag::Enum,
            SchemaType::List(_) => WireTag::List,
            SchemaType::Set(_) => WireTag::Set,
            SchemaType::Map(..) => WireTag::Map,
            SchemaType::Struct(_) | SchemaType::Union(_) | SchemaType::Exception(_) => {
                WireTag::Struct
            }
            other @ (SchemaType::Void | SchemaType::Service(_) | SchemaType::Typedef(_)) => {
                return Err(self.unexpected(other, "a wire value"));
            }
        };
        Ok(tag)
    }

    /// The Rust type a value of `ty` is held in.
    pub fn rust_type(&self, ty: &SchemaType) -> Result<String, GenError> {
        let mapped = match self.schema.true_type(ty)? {
            SchemaType::Void => "()".to_string(),
            SchemaType::Bool => "bool".to_string(),
            SchemaType::Byte => "i8".to_string(),
            SchemaType::I16 => "i16".to_string(),
            SchemaType::I32 => "i32".to_string(),
            SchemaType::I64 => "i64".to_string(),
            SchemaType::Double => "f64".to_string(),
            SchemaType::String => "::std::string::String".to_string(),
            SchemaType::Binary => "::std::vec::Vec<u8>".to_string(),
            SchemaType::Enum(id) => {
                let e = self.schema.enum_type(*id);
                naming::qualified(self.config, &e.namespace, &e.name)
            }
            SchemaType::Struct(id) | SchemaType::Union(id) | SchemaType::Exception(id) => {
                let s = self.schema.struct_type(*id);
                naming::qualified(self.config, &s.namespace, &s.name)
            }
            SchemaType::List(element) => {
                format!("{}<{}>", self.config.list.path(), self.rust_type(element)?)
            }
            SchemaType::Set(element) => {
                self.check_key(element, self.config.set.is_ordered())?;
                format!("{}<{}>", self.config.set.path(), self.rust_type(element)?)
            }
            SchemaType::Map(key, value) => {
                self.check_key(key, self.config.map.is_ordered())?;
                format!(
                    "{}<{}, {}>",
                    self.config.map.path(),
                    self.rust_type(key)?,
                    self.rust_type(value)?
                )
            }
            other @ (SchemaType::Service(_) | SchemaType::Typedef(_)) => {
                return Err(self.unexpected(other, "a value type"));
            }
        };
        Ok(mapped)
    }

    /// Set elements and map keys need `Eq + Hash`, or `Ord` for the
    /// B-tree containers.
    fn check_key(&self, ty: &SchemaType, ordered: bool) -> Result<(), GenError> {
        if !self.is_hashable(ty)? {
            return Err(GenError::UnhashableType {
                ty: self.schema.type_name(ty),
            });
        }
        if ordered && !self.is_ordered(ty)? {
            return Err(GenError::UnorderedType {
                ty: self.schema.type_name(ty),
            });
        }
        Ok(())
    }

    fn is_hashable(&self, ty: &SchemaType) -> Result<bool, GenError> {
        Ok(match self.schema.true_type(ty)? {
            SchemaType::Double => false,
            SchemaType::List(element) => self.is_hashable(element)?,
            SchemaType::Set(element) => self.config.set.is_ordered() && self.is_hashable(element)?,
            SchemaType::Map(key, value) => {
                self.config.map.is_ordered() && self.is_hashable(key)? && self.is_hashable(value)?
            }
            _ => true,
        })
    }

    fn is_ordered(&self, ty: &SchemaType) -> Result<bool, GenError> {
        Ok(match self.schema.true_type(ty)? {
            SchemaType::Double
            | SchemaType::Struct(_)
            | SchemaType::Union(_)
            | SchemaType::Exception(_) => false,
            SchemaType::List(element) => self.is_ordered(element)?,
            SchemaType::Set(element) => self.config.set.is_ordered() && self.is_ordered(element)?,
            SchemaType::Map(key, value) => {
                self.config.map.is_ordered() && self.is_ordered(key)? && self.is_ordered(value)?
            }
            _ => true,
        })
    }

    /// Whether a field of type `ty` inside `owner` closes a cycle back to
    /// `owner` without passing through a heap-allocating container, and so
    /// must be boxed.
    pub fn needs_box(&self, owner: StructId, ty: &SchemaType) -> Result<bool, GenError> {
        let Some(start) = self.schema.true_type(ty)?.struct_id() else {
            return Ok(false);
        };
        let mut visited = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if id == owner {
                return Ok(true);
            }
            if !visited.insert(id) {
                continue;
            }
            for field in &self.schema.struct_type(id).fields {
                if let Some(next) = self.schema.true_type(&field.ty)?.struct_id() {
                    stack.push(next);
                }
            }
        }
        Ok(false)
    }

    fn unexpected(&self, ty: &SchemaType, context: &'static str) -> GenError {
        GenError::UnexpectedType {
            ty: self.schema.type_name(ty),
            context,
        }
    }
}

#[cfg(test)]
mod tests {
    use idlc_schema::{Field, StructKind, StructType, TypedefType};

    use super::*;
    use crate::config::{ListRepr, MapRepr, SetRepr};

    #[test]
    fn scalars_and_containers() {
        let schema = Schema::new();
        let config = GeneratorConfig::default();
        let mapper = TypeMapper::new(&schema, &config);

        assert_eq!(mapper.rust_type(&SchemaType::Byte).unwrap(), "i8");
        assert_eq!(mapper.rust_type(&SchemaType::Binary).unwrap(), "::std::vec::Vec<u8>");
        assert_eq!(
            mapper
                .rust_type(&SchemaType::map(SchemaType::String, SchemaType::list(SchemaType::I32)))
                .unwrap(),
            "::std::collections::HashMap<::std::string::String, ::std::vec::Vec<i32>>"
        );
    }

    #[test]
    fn configured_containers() {
        let schema = Schema::new();
        let config = GeneratorConfig::default()
            .with_list(ListRepr::VecDeque)
            .with_set(SetRepr::BTreeSet)
            .with_map(MapRepr::BTreeMap);
        let mapper = TypeMapper::new(&schema, &config);

        assert_eq!(
            mapper.rust_type(&SchemaType::list(SchemaType::I64)).unwrap(),
            "::std::collections::VecDeque<i64>"
        );
        assert_eq!(
            mapper.rust_type(&SchemaType::set(SchemaType::String)).unwrap(),
            "::std::collections::BTreeSet<::std::string::String>"
        );
    }

    #[test]
    fn typedefs_are_resolved_and_named_types_qualified() {
        let mut schema = Schema::new();
        let query = schema.add_struct(StructType::new("Query", "demo.search", StructKind::Struct));
        let alias = schema.add_typedef(TypedefType {
            name: "Q".into(),
            namespace: "demo".into(),
            target: SchemaType::Struct(query),
            location: None,
        });
        let config = GeneratorConfig::default();
        let mapper = TypeMapper::new(&schema, &config);

        assert_eq!(
            mapper.rust_type(&SchemaType::Typedef(alias)).unwrap(),
            "crate::demo::search::Query"
        );
        assert_eq!(mapper.wire_tag(&SchemaType::Typedef(alias)).unwrap(), WireTag::Struct);
    }

    #[test]
    fn enums_are_written_as_i32() {
        let mut schema = Schema::new();
        let color = schema.add_enum(idlc_schema::EnumType::new("Color", ""));
        let config = GeneratorConfig::default();
        let mapper = TypeMapper::new(&schema, &config);

        assert_eq!(mapper.wire_tag(&SchemaType::Enum(color)).unwrap(), WireTag::Enum);
        assert_eq!(
            mapper.tag_path(&SchemaType::Enum(color)).unwrap(),
            "::idlc_runtime::ttype::I32"
        );
    }

    #[test]
    fn doubles_cannot_be_keys() {
        let schema = Schema::new();
        let config = GeneratorConfig::default();
        let mapper = TypeMapper::new(&schema, &config);

        let err = mapper
            .rust_type(&SchemaType::set(SchemaType::Double))
            .unwrap_err();
        assert_eq!(err, GenError::UnhashableType { ty: "double".into() });

        let err = mapper
            .rust_type(&SchemaType::map(SchemaType::list(SchemaType::Double), SchemaType::I32))
            .unwrap_err();
        assert!(matches!(err, GenError::UnhashableType { .. }));

        assert!(mapper.rust_type(&SchemaType::map(SchemaType::I32, SchemaType::Double)).is_ok());
    }

    #[test]
    fn structs_cannot_key_ordered_containers() {
        let mut schema = Schema::new();
        let s = schema.add_struct(StructType::new("S", "", StructKind::Struct));
        let config = GeneratorConfig::default().with_set(SetRepr::BTreeSet);
        let mapper = TypeMapper::new(&schema, &config);

        let err = mapper.rust_type(&SchemaType::set(SchemaType::Struct(s))).unwrap_err();
        assert_eq!(err, GenError::UnorderedType { ty: "S".into() });
    }

    #[test]
    fn void_has_no_wire_tag() {
        let schema = Schema::new();
        let config = GeneratorConfig::default();
        let mapper = TypeMapper::new(&schema, &config);
        assert!(matches!(
            mapper.wire_tag(&SchemaType::Void),
            Err(GenError::UnexpectedType { .. })
        ));
    }

    #[test]
    fn only_cycle_closing_fields_are_boxed() {
        let mut schema = Schema::new();
        let leaf = schema.add_struct(
            StructType::new("Leaf", "", StructKind::Struct).with_field(Field::new(1, "v", SchemaType::I32)),
        );
        let node = schema.add_struct(StructType::new("Node", "", StructKind::Struct));
        schema.struct_mut(node).fields.extend([
            Field::new(1, "next", SchemaType::Struct(node)).optional(),
            Field::new(2, "children", SchemaType::list(SchemaType::Struct(node))).optional(),
            Field::new(3, "leaf", SchemaType::Struct(leaf)).optional(),
        ]);
        let config = GeneratorConfig::default();
        let mapper = TypeMapper::new(&schema, &config);

        assert!(mapper.needs_box(node, &SchemaType::Struct(node)).unwrap());
        assert!(!mapper.needs_box(node, &SchemaType::list(SchemaType::Struct(node))).unwrap());
        assert!(!mapper.needs_box(node, &SchemaType::Struct(leaf)).unwrap());
    }
}
