//! Generation driver.
//!
//! Runs every emitter over a schema, hands each unit to the optional
//! post-processing hook, and assembles the survivors into one source file
//! with a nested `pub mod` per namespace.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use idlc_schema::{Constant, Location, Schema, ServiceId, StructKind};
use tracing::{debug, info, warn};

use crate::code_writer::CodeWriter;
use crate::config::GeneratorConfig;
use crate::constants::ConstantRenderer;
use crate::enums::generate_enum;
use crate::error::GenError;
use crate::naming;
use crate::reachability::{self, Reachability};
use crate::services::ServiceEmitter;
use crate::structs::generate_struct;
use crate::types::TypeMapper;

/// Attribute placed on every generated namespace module.
const MODULE_ALLOW: &str = "allow(clippy::all, unused, deprecated, non_camel_case_types)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Enum,
    Struct,
    Union,
    Exception,
    /// Every constant of one namespace.
    Constants,
    Service,
}

/// One emitted declaration (or constant group), not yet placed in a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    pub name: String,
    pub namespace: String,
    pub kind: UnitKind,
    pub location: Option<Location>,
    pub code: String,
}

pub struct Generator<'s> {
    schema: &'s Schema,
    config: GeneratorConfig,
}

impl<'s> Generator<'s> {
    pub fn new(schema: &'s Schema, config: GeneratorConfig) -> Self {
        Self { schema, config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Every declaration of the schema: enums, structs, exceptions, unions,
    /// one constant group per namespace, then services.
    pub fn generate_units(&self) -> Result<Vec<GeneratedUnit>, GenError> {
        let schema = self.schema;
        let mapper = TypeMapper::new(schema, &self.config);
        let mut units = Vec::new();

        for (_, decl) in schema.enums() {
            self.push(
                &mut units,
                GeneratedUnit {
                    name: decl.name.clone(),
                    namespace: decl.namespace.clone(),
                    kind: UnitKind::Enum,
                    location: decl.location.clone(),
                    code: generate_enum(&self.config, decl)?,
                },
            );
        }

        for (kind, unit_kind) in STRUCT_KINDS {
            for (id, decl) in schema.structs_of_kind(kind) {
                self.push(
                    &mut units,
                    GeneratedUnit {
                        name: decl.name.clone(),
                        namespace: decl.namespace.clone(),
                        kind: unit_kind,
                        location: decl.location.clone(),
                        code: generate_struct(&mapper, id)?,
                    },
                );
            }
        }

        let mut groups: BTreeMap<&str, Vec<&Constant>> = BTreeMap::new();
        for constant in schema.constants() {
            groups.entry(&constant.namespace).or_default().push(constant);
        }
        let renderer = ConstantRenderer::new(&mapper);
        for (namespace, constants) in groups {
            self.push(
                &mut units,
                GeneratedUnit {
                    name: "constants".to_string(),
                    namespace: namespace.to_string(),
                    kind: UnitKind::Constants,
                    location: None,
                    code: renderer.generate_group(&constants)?,
                },
            );
        }

        let services = ServiceEmitter::new(&mapper);
        for (id, decl) in schema.services() {
            self.push(
                &mut units,
                GeneratedUnit {
                    name: decl.name.clone(),
                    namespace: decl.namespace.clone(),
                    kind: UnitKind::Service,
                    location: decl.location.clone(),
                    code: services.generate(id)?,
                },
            );
        }

        info!(units = units.len(), "generated schema");
        Ok(units)
    }

    /// The whole schema as one source file.
    pub fn generate_source(&self) -> Result<String, GenError> {
        let units = self.generate_units()?;
        self.assemble(&units)
    }

    /// Only what the allow-listed operations of `service` (and of its
    /// ancestors) need: the pruned service chain plus the structs and enums
    /// reachable from those operations. Constants are not included.
    pub fn generate_pruned_units(&self, service: ServiceId) -> Result<Vec<GeneratedUnit>, GenError> {
        let schema = self.schema;
        let key = self.config.allow_list_annotation();
        let mapper = TypeMapper::new(schema, &self.config);

        let chain = schema.service_chain(service);
        let mut reach = Reachability::default();
        for id in &chain {
            reach.merge(reachability::analyze(schema, *id, key)?);
        }
        let structs = reach.structs();

        let mut units = Vec::new();
        for (id, decl) in schema.enums() {
            if !reach.enums.contains(&id) {
                continue;
            }
            self.push(
                &mut units,
                GeneratedUnit {
                    name: decl.name.clone(),
                    namespace: decl.namespace.clone(),
                    kind: UnitKind::Enum,
                    location: decl.location.clone(),
                    code: generate_enum(&self.config, decl)?,
                },
            );
        }
        for (kind, unit_kind) in STRUCT_KINDS {
            for (id, decl) in schema.structs_of_kind(kind) {
                if !structs.contains(&id) {
                    continue;
                }
                self.push(
                    &mut units,
                    GeneratedUnit {
                        name: decl.name.clone(),
                        namespace: decl.namespace.clone(),
                        kind: unit_kind,
                        location: decl.location.clone(),
                        code: generate_struct(&mapper, id)?,
                    },
                );
            }
        }

        let services = ServiceEmitter::pruned(&mapper, key);
        for id in chain.into_iter().rev() {
            let decl = schema.service(id);
            self.push(
                &mut units,
                GeneratedUnit {
                    name: decl.name.clone(),
                    namespace: decl.namespace.clone(),
                    kind: UnitKind::Service,
                    location: decl.location.clone(),
                    code: services.generate(id)?,
                },
            );
        }

        info!(
            service = %schema.service(service).name,
            units = units.len(),
            "generated pruned surface"
        );
        Ok(units)
    }

    pub fn generate_pruned(&self, service: ServiceId) -> Result<String, GenError> {
        let units = self.generate_pruned_units(service)?;
        self.assemble(&units)
    }

    /// Runs the post-processing hook; a vetoed unit is dropped.
    fn push(&self, units: &mut Vec<GeneratedUnit>, unit: GeneratedUnit) {
        debug!(name = %unit.name, kind = ?unit.kind, namespace = %unit.namespace, "emitted");
        let Some(processor) = &self.config.processor else {
            units.push(unit);
            return;
        };
        let (name, kind) = (unit.name.clone(), unit.kind);
        match processor.process(unit) {
            Some(unit) => units.push(unit),
            None => warn!(%name, ?kind, "declaration vetoed by processor"),
        }
    }

    /// Places units into a nested module tree and renders it.
    pub fn assemble(&self, units: &[GeneratedUnit]) -> Result<String, GenError> {
        let mut root = ModuleNode::default();
        for unit in units {
            let mut node = &mut root;
            for segment in naming::module_segments(&unit.namespace) {
                node = node.children.entry(segment).or_default();
            }
            node.units.push(unit);
        }

        let mut out = String::new();
        {
            let mut w = CodeWriter::new(&mut out);
            if self.config.file_comment {
                w.comment("Automatically generated by idlc; do not edit!")?;
                w.comment(&format!(
                    "Generated on: {}",
                    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
                ))?;
                w.blank_line()?;
            }
            self.write_node(&mut w, &root)?;
        }
        Ok(out)
    }

    fn write_node(&self, w: &mut CodeWriter<&mut String>, node: &ModuleNode<'_>) -> Result<(), GenError> {
        let mut first = true;
        for unit in &node.units {
            if !first {
                w.blank_line()?;
            }
            first = false;
            if self.config.file_comment
                && let Some(location) = &unit.location
            {
                w.comment(&format!("Source: {location}"))?;
            }
            w.lines(&unit.code)?;
        }
        for (name, child) in &node.children {
            if !first {
                w.blank_line()?;
            }
            first = false;
            w.attribute(MODULE_ALLOW)?;
            w.writeln(&format!("pub mod {name} {{"))?;
            {
                let _indent = w.indent();
                self.write_node(w, child)?;
            }
            w.writeln("}")?;
        }
        Ok(())
    }
}

const STRUCT_KINDS: [(StructKind, UnitKind); 3] = [
    (StructKind::Struct, UnitKind::Struct),
    (StructKind::Exception, UnitKind::Exception),
    (StructKind::Union, UnitKind::Union),
];

#[derive(Default)]
struct ModuleNode<'u> {
    units: Vec<&'u GeneratedUnit>,
    children: BTreeMap<String, ModuleNode<'u>>,
}

#[cfg(test)]
mod tests {
    use idlc_schema::{
        ConstValue, EnumType, Field, SchemaType, ServiceMethod, ServiceType, StructType,
    };

    use super::*;
    use crate::config::TypeProcessor;

    fn schema() -> Schema {
        let mut schema = Schema::new();
        let color = schema.add_enum(EnumType::new("Color", "demo").with_member("RED", 1));
        let mut query = StructType::new("Query", "demo.search", StructKind::Struct)
            .with_field(Field::new(1, "color", SchemaType::Enum(color)));
        query.location = Some(Location::new("search.thrift", 3, 1));
        let query = schema.add_struct(query);
        let unused = schema.add_struct(StructType::new("Unused", "demo", StructKind::Struct));
        schema.add_struct(StructType::new("Choice", "demo", StructKind::Union));
        schema.add_struct(StructType::new("Oops", "demo", StructKind::Exception));
        schema.add_constant(idlc_schema::Constant::new(
            "LIMIT",
            "demo",
            SchemaType::I32,
            ConstValue::Int(5),
        ));
        schema.add_service(
            ServiceType::new("Search", "demo.search")
                .with_method(
                    ServiceMethod::new("find", SchemaType::Void)
                        .with_parameter(Field::new(1, "query", SchemaType::Struct(query)))
                        .with_annotation("allowlist", "true"),
                )
                .with_method(
                    ServiceMethod::new("other", SchemaType::Void)
                        .with_parameter(Field::new(1, "unused", SchemaType::Struct(unused))),
                ),
        );
        schema
    }

    #[test]
    fn units_come_out_in_kind_order() {
        let schema = schema();
        let generator = Generator::new(&schema, GeneratorConfig::default());

        let units = generator.generate_units().unwrap();
        let kinds: Vec<(UnitKind, &str)> = units.iter().map(|u| (u.kind, u.name.as_str())).collect();

        assert_eq!(
            kinds,
            vec![
                (UnitKind::Enum, "Color"),
                (UnitKind::Struct, "Query"),
                (UnitKind::Struct, "Unused"),
                (UnitKind::Exception, "Oops"),
                (UnitKind::Union, "Choice"),
                (UnitKind::Constants, "constants"),
                (UnitKind::Service, "Search"),
            ]
        );
    }

    #[test]
    fn source_nests_namespaces() {
        let schema = schema();
        let generator = Generator::new(&schema, GeneratorConfig::default());

        let source = generator.generate_source().unwrap();

        assert!(source.starts_with("// Automatically generated by idlc; do not edit!\n// Generated on: "));
        assert!(source.contains("pub mod demo {\n"));
        assert!(source.contains("    pub mod search {\n"));
        assert!(source.contains("        // Source: search.thrift:3:1\n        #[derive(Clone)]\n        pub struct Query {"));
        assert!(source.contains("#[allow(clippy::all, unused, deprecated, non_camel_case_types)]"));
    }

    #[test]
    fn file_comment_can_be_disabled() {
        let schema = schema();
        let generator = Generator::new(&schema, GeneratorConfig::default().with_file_comment(false));

        let source = generator.generate_source().unwrap();

        assert!(source.starts_with("#[allow("));
        assert!(!source.contains("// Source:"));
    }

    #[test]
    fn pruned_surface_drops_unreachable_structs() {
        let schema = schema();
        let generator = Generator::new(&schema, GeneratorConfig::default());
        let (search, _) = schema.services().next().unwrap();

        let units = generator.generate_pruned_units(search).unwrap();
        let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();

        assert_eq!(names, vec!["Color", "Query", "Search"]);
    }

    struct DropUnions;

    impl TypeProcessor for DropUnions {
        fn process(&self, unit: GeneratedUnit) -> Option<GeneratedUnit> {
            (unit.kind != UnitKind::Union).then_some(unit)
        }
    }

    #[test]
    fn processor_can_veto() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();

        let schema = schema();
        let generator = Generator::new(&schema, GeneratorConfig::default().with_processor(DropUnions));

        let units = generator.generate_units().unwrap();

        assert!(units.iter().all(|u| u.kind != UnitKind::Union));
        assert_eq!(units.len(), 6);
    }
}
