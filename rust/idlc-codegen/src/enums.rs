//! Enum emission.

use codegen::{Block, Scope};
use idlc_schema::EnumType;

use crate::code_writer::CodeWriter;
use crate::config::GeneratorConfig;
use crate::cw_writeln;
use crate::error::GenError;
use crate::naming;

/// Renders one IDL enum as a field-less Rust enum with explicit
/// discriminants, plus value lookup in both directions and a `Display`
/// that prints the declared member name.
pub fn generate_enum(config: &GeneratorConfig, enum_type: &EnumType) -> Result<String, GenError> {
    let rt = config.runtime_path();
    let name = naming::type_ident(&enum_type.name);

    let mut definition = String::new();
    {
        let mut w = CodeWriter::new(&mut definition);
        if let Some(doc) = &enum_type.documentation {
            w.doc(doc)?;
        }
        w.attribute("derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)")?;
        if config.serde {
            w.attribute("derive(::serde::Serialize, ::serde::Deserialize)")?;
        }
        if enum_type.deprecated {
            w.attribute("deprecated")?;
        }
        if !enum_type.members.is_empty() {
            w.attribute("repr(i32)")?;
        }
        w.block(&format!("pub enum {name}"), |w| {
            for member in &enum_type.members {
                if let Some(doc) = &member.documentation {
                    w.doc(doc)?;
                }
                if member.deprecated {
                    w.attribute("deprecated")?;
                }
                cw_writeln!(w, "{} = {},", naming::variant_ident(&member.name), member.value)?;
            }
            Ok(())
        })?;
    }

    let mut scope = Scope::new();
    scope.raw(definition.trim_end());

    let lookups = scope.new_impl(&name);

    let value_fn = lookups.new_fn("value");
    value_fn.vis("pub");
    value_fn.doc("The wire value of this member.");
    value_fn.arg_self();
    value_fn.ret("i32");
    let mut to_value = Block::new("match self");
    for member in &enum_type.members {
        to_value.line(format!(
            "{name}::{} => {},",
            naming::variant_ident(&member.name),
            member.value
        ));
    }
    value_fn.push_block(to_value);

    let find_fn = lookups.new_fn("find_by_value");
    find_fn.vis("pub");
    find_fn.doc("The member with the given wire value, if any.");
    find_fn.arg("value", "i32");
    find_fn.ret("Option<Self>");
    let mut from_value = Block::new("match value");
    for member in &enum_type.members {
        from_value.line(format!(
            "{} => Some({name}::{}),",
            member.value,
            naming::variant_ident(&member.name)
        ));
    }
    from_value.line("_ => None,");
    find_fn.push_block(from_value);

    let mut names = Block::new("match *self");
    for member in &enum_type.members {
        names.line(format!(
            "{name}::{} => f.write_str({:?}),",
            naming::variant_ident(&member.name),
            member.name
        ));
    }
    scope
        .new_impl(&name)
        .impl_trait("::std::fmt::Display")
        .new_fn("fmt")
        .arg_ref_self()
        .arg("f", "&mut ::std::fmt::Formatter<'_>")
        .ret("::std::fmt::Result")
        .push_block(names);

    let hash = scope.new_impl(&name);
    hash.impl_trait(format!("{rt}::ThriftHash"));
    hash.new_fn("thrift_hash")
        .arg_ref_self()
        .ret("i32")
        .line("self.value()");

    let eq = scope.new_impl(&name);
    eq.impl_trait(format!("{rt}::ThriftEq"));
    eq.new_fn("thrift_eq")
        .arg_ref_self()
        .arg("other", "&Self")
        .ret("bool")
        .line("self == other");

    Ok(scope.to_string())
}
