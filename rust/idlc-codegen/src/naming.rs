//! Identifier policy for emitted Rust.

use heck::{ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};

use crate::config::GeneratorConfig;

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers.
const RESERVED: &[&str] = &["self", "Self", "super", "crate", "_"];

/// Make `name` usable as an identifier.
pub fn escape(name: &str) -> String {
    if RESERVED.contains(&name) {
        format!("{name}_")
    } else if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// Strip the `r#` prefix so the identifier can be embedded in another one.
pub fn bare(ident: &str) -> &str {
    ident.strip_prefix("r#").unwrap_or(ident)
}

pub fn field_ident(config: &GeneratorConfig, name: &str) -> String {
    escape(&config.field_naming.apply(name))
}

pub fn type_ident(name: &str) -> String {
    escape(name)
}

pub fn method_ident(name: &str) -> String {
    escape(&name.to_snake_case())
}

pub fn const_ident(name: &str) -> String {
    escape(&name.to_shouty_snake_case())
}

pub fn variant_ident(name: &str) -> String {
    escape(&name.to_upper_camel_case())
}

/// Module segments for a dotted namespace; empty for the root namespace.
pub fn module_segments(namespace: &str) -> Vec<String> {
    namespace
        .split('.')
        .filter(|s| !s.is_empty())
        .map(|s| escape(&s.to_snake_case()))
        .collect()
}

/// Absolute path of a declaration: `{root}::{namespace modules}::{name}`.
pub fn qualified(config: &GeneratorConfig, namespace: &str, name: &str) -> String {
    let mut path = config.root_path.clone();
    for segment in module_segments(namespace) {
        path.push_str("::");
        path.push_str(&segment);
    }
    path.push_str("::");
    path.push_str(&type_ident(name));
    path
}

/// `SearchService` + `findAll` becomes `SearchServiceFindAll`.
pub fn operation_type_name(service: &str, method: &str) -> String {
    format!("{}{}", service, method.to_upper_camel_case())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_escaped() {
        assert_eq!(escape("type"), "r#type");
        assert_eq!(escape("gen"), "r#gen");
        assert_eq!(escape("self"), "self_");
        assert_eq!(escape("crate"), "crate_");
        assert_eq!(escape("text"), "text");
        assert_eq!(bare("r#type"), "type");
    }

    #[test]
    fn field_idents_follow_policy() {
        let config = GeneratorConfig::default();
        assert_eq!(field_ident(&config, "resultsNewerThan"), "results_newer_than");
        assert_eq!(field_ident(&config, "type"), "r#type");
    }

    #[test]
    fn qualified_paths() {
        let config = GeneratorConfig::default();
        assert_eq!(qualified(&config, "demo.search", "Query"), "crate::demo::search::Query");
        assert_eq!(qualified(&config, "", "Query"), "crate::Query");

        let nested = GeneratorConfig::default().with_root_path("crate::gen_");
        assert_eq!(qualified(&nested, "demo", "Query"), "crate::gen_::demo::Query");
    }

    #[test]
    fn casing() {
        assert_eq!(const_ident("maxRetries"), "MAX_RETRIES");
        assert_eq!(variant_ident("NOT_FOUND"), "NotFound");
        assert_eq!(method_ident("findAll"), "find_all");
        assert_eq!(operation_type_name("Search", "findAll"), "SearchFindAll");
    }
}
