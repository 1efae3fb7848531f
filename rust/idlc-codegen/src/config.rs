//! Generator configuration.
//!
//! Built once, then passed by reference to every emitter. There is no
//! process-wide state: two generators with different configurations can run
//! side by side.

use std::fmt;
use std::sync::Arc;

use heck::ToSnakeCase;

use crate::driver::GeneratedUnit;

/// Representation of IDL `list<T>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListRepr {
    #[default]
    Vec,
    VecDeque,
}

/// Representation of IDL `set<T>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetRepr {
    #[default]
    HashSet,
    BTreeSet,
}

/// Representation of IDL `map<K, V>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapRepr {
    #[default]
    HashMap,
    BTreeMap,
}

impl ListRepr {
    pub(crate) fn path(self) -> &'static str {
        match self {
            ListRepr::Vec => "::std::vec::Vec",
            ListRepr::VecDeque => "::std::collections::VecDeque",
        }
    }

    pub(crate) fn push_method(self) -> &'static str {
        match self {
            ListRepr::Vec => "push",
            ListRepr::VecDeque => "push_back",
        }
    }
}

impl SetRepr {
    pub(crate) fn path(self) -> &'static str {
        match self {
            SetRepr::HashSet => "::std::collections::HashSet",
            SetRepr::BTreeSet => "::std::collections::BTreeSet",
        }
    }

    pub(crate) fn is_ordered(self) -> bool {
        self == SetRepr::BTreeSet
    }
}

impl MapRepr {
    pub(crate) fn path(self) -> &'static str {
        match self {
            MapRepr::HashMap => "::std::collections::HashMap",
            MapRepr::BTreeMap => "::std::collections::BTreeMap",
        }
    }

    pub(crate) fn is_ordered(self) -> bool {
        self == MapRepr::BTreeMap
    }
}

/// Maps a declared field name to the Rust identifier it is emitted as.
///
/// The result is keyword-escaped afterwards, so policies never need to
/// worry about `type` or `match`.
#[derive(Debug, Clone, Copy, Default)]
pub enum FieldNaming {
    #[default]
    SnakeCase,
    Preserve,
    Custom(fn(&str) -> String),
}

impl FieldNaming {
    pub fn apply(&self, name: &str) -> String {
        match self {
            FieldNaming::SnakeCase => name.to_snake_case(),
            FieldNaming::Preserve => name.to_string(),
            FieldNaming::Custom(f) => f(name),
        }
    }
}

/// Post-processing hook run on every unit before it is assembled.
///
/// Returning `None` vetoes the unit.
pub trait TypeProcessor: Send + Sync {
    fn process(&self, unit: GeneratedUnit) -> Option<GeneratedUnit>;
}

#[derive(Clone)]
pub struct GeneratorConfig {
    pub(crate) list: ListRepr,
    pub(crate) set: SetRepr,
    pub(crate) map: MapRepr,
    pub(crate) field_naming: FieldNaming,
    pub(crate) root_path: String,
    pub(crate) runtime_path: String,
    pub(crate) serde: bool,
    pub(crate) file_comment: bool,
    pub(crate) field_type_checks: bool,
    pub(crate) allow_list_annotation: String,
    pub(crate) processor: Option<Arc<dyn TypeProcessor>>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            list: ListRepr::default(),
            set: SetRepr::default(),
            map: MapRepr::default(),
            field_naming: FieldNaming::default(),
            root_path: "crate".to_string(),
            runtime_path: "::idlc_runtime".to_string(),
            serde: false,
            file_comment: true,
            field_type_checks: true,
            allow_list_annotation: "allowlist".to_string(),
            processor: None,
        }
    }
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("list", &self.list)
            .field("set", &self.set)
            .field("map", &self.map)
            .field("field_naming", &self.field_naming)
            .field("root_path", &self.root_path)
            .field("runtime_path", &self.runtime_path)
            .field("serde", &self.serde)
            .field("file_comment", &self.file_comment)
            .field("field_type_checks", &self.field_type_checks)
            .field("allow_list_annotation", &self.allow_list_annotation)
            .field("processor", &self.processor.is_some())
            .finish()
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(mut self, list: ListRepr) -> Self {
        self.list = list;
        self
    }

    pub fn with_set(mut self, set: SetRepr) -> Self {
        self.set = set;
        self
    }

    pub fn with_map(mut self, map: MapRepr) -> Self {
        self.map = map;
        self
    }

    pub fn with_field_naming(mut self, naming: FieldNaming) -> Self {
        self.field_naming = naming;
        self
    }

    /// Module path that namespaces hang off, `crate` by default.
    ///
    /// Set this when the generated source is included below the crate root,
    /// e.g. `crate::generated`.
    pub fn with_root_path(mut self, path: impl Into<String>) -> Self {
        self.root_path = path.into();
        self
    }

    /// Path generated code uses to reach the runtime crate.
    pub fn with_runtime_path(mut self, path: impl Into<String>) -> Self {
        self.runtime_path = path.into();
        self
    }

    /// Derive `serde::Serialize` and `serde::Deserialize` on every value
    /// type. The including crate must depend on `serde` with `derive`.
    pub fn with_serde(mut self, enabled: bool) -> Self {
        self.serde = enabled;
        self
    }

    /// Emit the "do not edit" header with a timestamp.
    pub fn with_file_comment(mut self, enabled: bool) -> Self {
        self.file_comment = enabled;
        self
    }

    /// Reject known fields whose wire tag disagrees with the declared type.
    ///
    /// When disabled, such fields are skipped as if unknown.
    pub fn with_field_type_checks(mut self, enabled: bool) -> Self {
        self.field_type_checks = enabled;
        self
    }

    /// Annotation key that marks an operation as allow-listed.
    pub fn with_allow_list_annotation(mut self, key: impl Into<String>) -> Self {
        self.allow_list_annotation = key.into();
        self
    }

    pub fn with_processor(mut self, processor: impl TypeProcessor + 'static) -> Self {
        self.processor = Some(Arc::new(processor));
        self
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    pub fn runtime_path(&self) -> &str {
        &self.runtime_path
    }

    pub fn allow_list_annotation(&self) -> &str {
        &self.allow_list_annotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.root_path(), "crate");
        assert_eq!(config.runtime_path(), "::idlc_runtime");
        assert!(config.field_type_checks);
        assert!(!config.serde);
        assert_eq!(config.list.path(), "::std::vec::Vec");
        assert_eq!(config.set.path(), "::std::collections::HashSet");
    }

    #[test]
    fn field_naming_policies() {
        assert_eq!(FieldNaming::SnakeCase.apply("resultsNewerThan"), "results_newer_than");
        assert_eq!(FieldNaming::Preserve.apply("resultsNewerThan"), "resultsNewerThan");

        fn shout(name: &str) -> String {
            name.to_uppercase()
        }
        assert_eq!(FieldNaming::Custom(shout).apply("text"), "TEXT");
    }

    #[test]
    fn builder_methods_override_defaults() {
        let config = GeneratorConfig::new()
            .with_list(ListRepr::VecDeque)
            .with_map(MapRepr::BTreeMap)
            .with_root_path("crate::generated")
            .with_field_type_checks(false);

        assert_eq!(config.list.push_method(), "push_back");
        assert!(config.map.is_ordered());
        assert_eq!(config.root_path(), "crate::generated");
        assert!(!config.field_type_checks);
    }
}
