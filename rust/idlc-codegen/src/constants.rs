//! Constant rendering: IDL literals to Rust initializer expressions.
//!
//! Used for top-level constants and for field and parameter defaults.
//! Every rendered expression produces an owned value of the mapped type.

use idlc_schema::{ConstValue, Constant, SchemaType};

use crate::code_writer::CodeWriter;
use crate::cw_writeln;
use crate::error::GenError;
use crate::naming;
use crate::types::TypeMapper;

/// References between constants are followed at most this deep.
const MAX_REFERENCE_DEPTH: usize = 32;

pub struct ConstantRenderer<'a> {
    mapper: &'a TypeMapper<'a>,
}

impl<'a> ConstantRenderer<'a> {
    pub fn new(mapper: &'a TypeMapper<'a>) -> Self {
        Self { mapper }
    }

    /// An expression evaluating to `value` as the Rust type of `ty`.
    pub fn render(&self, ty: &SchemaType, value: &ConstValue) -> Result<String, GenError> {
        self.render_at(ty, value, 0)
    }

    fn render_at(&self, ty: &SchemaType, value: &ConstValue, depth: usize) -> Result<String, GenError> {
        let schema = self.mapper.schema();
        let resolved = schema.true_type(ty)?;

        if let ConstValue::Identifier(name) = value
            && !matches!(resolved, SchemaType::Bool | SchemaType::Enum(_))
        {
            let referenced = self.lookup(name).ok_or_else(|| self.mismatch(ty, value))?;
            if depth >= MAX_REFERENCE_DEPTH {
                return Err(GenError::ConstantDepth(MAX_REFERENCE_DEPTH));
            }
            return self.render_at(ty, &referenced.value, depth + 1);
        }

        match resolved {
            SchemaType::Bool => match value {
                ConstValue::Int(0) => Ok("false".into()),
                ConstValue::Int(1) => Ok("true".into()),
                ConstValue::Identifier(id) if id == "true" || id == "false" => Ok(id.clone()),
                ConstValue::Identifier(id) => match self.lookup(id) {
                    Some(c) if depth < MAX_REFERENCE_DEPTH => self.render_at(ty, &c.value, depth + 1),
                    Some(_) => Err(GenError::ConstantDepth(MAX_REFERENCE_DEPTH)),
                    None => Err(self.mismatch(ty, value)),
                },
                _ => Err(self.mismatch(ty, value)),
            },
            SchemaType::Byte => self.int(ty, value, i64::from(i8::MIN), i64::from(i8::MAX)),
            SchemaType::I16 => self.int(ty, value, i64::from(i16::MIN), i64::from(i16::MAX)),
            SchemaType::I32 => self.int(ty, value, i64::from(i32::MIN), i64::from(i32::MAX)),
            SchemaType::I64 => self.int(ty, value, i64::MIN, i64::MAX),
            SchemaType::Double => match value {
                ConstValue::Int(v) => Ok(float_literal(*v as f64)),
                ConstValue::Double(v) => Ok(float_literal(*v)),
                _ => Err(self.mismatch(ty, value)),
            },
            SchemaType::String => match value {
                ConstValue::String(s) => Ok(format!("::std::string::String::from({s:?})")),
                _ => Err(self.mismatch(ty, value)),
            },
            SchemaType::Binary => match value {
                ConstValue::String(s) => Ok(format!("{s:?}.as_bytes().to_vec()")),
                _ => Err(self.mismatch(ty, value)),
            },
            SchemaType::Enum(id) => {
                let e = schema.enum_type(*id);
                let member = match value {
                    ConstValue::Int(v) => i32::try_from(*v)
                        .ok()
                        .and_then(|v| e.member_by_value(v)),
                    ConstValue::Identifier(name) => {
                        // Accept `RED`, `Color.RED`, and `ns.Color.RED`.
                        let short = name.rsplit('.').next().unwrap_or(name);
                        e.member_by_name(short)
                    }
                    _ => return Err(self.mismatch(ty, value)),
                };
                let member = member.ok_or_else(|| GenError::UnknownEnumMember {
                    enum_name: e.name.clone(),
                    member: literal_text(value),
                })?;
                Ok(format!(
                    "{}::{}",
                    self.mapper.rust_type(ty)?,
                    naming::variant_ident(&member.name)
                ))
            }
            SchemaType::List(element) | SchemaType::Set(element) => {
                let ConstValue::List(items) = value else {
                    return Err(self.mismatch(ty, value));
                };
                let rust_type = self.mapper.rust_type(ty)?;
                let container = container_path(&rust_type);
                if items.is_empty() {
                    return Ok(format!("{container}::new()"));
                }
                let items = items
                    .iter()
                    .map(|item| self.render_at(element, item, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("{container}::from([{}])", items.join(", ")))
            }
            SchemaType::Map(key, val) => {
                let ConstValue::Map(entries) = value else {
                    return Err(self.mismatch(ty, value));
                };
                let rust_type = self.mapper.rust_type(ty)?;
                let container = container_path(&rust_type);
                if entries.is_empty() {
                    return Ok(format!("{container}::new()"));
                }
                let entries = entries
                    .iter()
                    .map(|(k, v)| {
                        Ok(format!(
                            "({}, {})",
                            self.render_at(key, k, depth)?,
                            self.render_at(val, v, depth)?
                        ))
                    })
                    .collect::<Result<Vec<_>, GenError>>()?;
                Ok(format!("{container}::from([{}])", entries.join(", ")))
            }
            SchemaType::Void
            | SchemaType::Struct(_)
            | SchemaType::Union(_)
            | SchemaType::Exception(_)
            | SchemaType::Service(_)
            | SchemaType::Typedef(_) => Err(GenError::UnsupportedConstantType {
                name: literal_text(value),
                ty: schema.type_name(ty),
            }),
        }
    }

    fn int(&self, ty: &SchemaType, value: &ConstValue, min: i64, max: i64) -> Result<String, GenError> {
        match value {
            ConstValue::Int(v) if (min..=max).contains(v) => Ok(v.to_string()),
            _ => Err(self.mismatch(ty, value)),
        }
    }

    /// Constants are referenced by bare name or `namespace.NAME`.
    fn lookup(&self, name: &str) -> Option<&'a Constant> {
        self.mapper.schema().constants().iter().find(|c| {
            c.name == name
                || name
                    .strip_suffix(c.name.as_str())
                    .and_then(|prefix| prefix.strip_suffix('.'))
                    .is_some_and(|ns| ns == c.namespace)
        })
    }

    fn mismatch(&self, ty: &SchemaType, value: &ConstValue) -> GenError {
        GenError::LiteralMismatch {
            ty: self.mapper.schema().type_name(ty),
            literal: literal_text(value),
        }
    }

    /// All constants of one namespace as a single declaration group.
    pub fn generate_group(&self, constants: &[&Constant]) -> Result<String, GenError> {
        let mut out = String::new();
        {
            let mut w = CodeWriter::new(&mut out);
            for (i, constant) in constants.iter().enumerate() {
                if i > 0 {
                    w.blank_line()?;
                }
                self.write_constant(&mut w, constant)?;
            }
        }
        Ok(out)
    }

    fn write_constant(&self, w: &mut CodeWriter<&mut String>, constant: &Constant) -> Result<(), GenError> {
        let schema = self.mapper.schema();
        let resolved = schema.true_type(&constant.ty)?;
        if matches!(
            resolved,
            SchemaType::Void
                | SchemaType::Struct(_)
                | SchemaType::Union(_)
                | SchemaType::Exception(_)
                | SchemaType::Service(_)
        ) {
            return Err(GenError::UnsupportedConstantType {
                name: constant.name.clone(),
                ty: schema.type_name(&constant.ty),
            });
        }

        if let Some(doc) = &constant.documentation {
            w.doc(doc)?;
        }
        if constant.deprecated {
            w.attribute("deprecated")?;
        }

        let name = naming::const_ident(&constant.name);
        let ty = self.mapper.rust_type(&constant.ty)?;
        match resolved {
            SchemaType::String => {
                let ConstValue::String(s) = self.follow(&constant.value)? else {
                    return Err(self.mismatch(&constant.ty, &constant.value));
                };
                cw_writeln!(w, "pub const {name}: &str = {s:?};")?;
            }
            SchemaType::Binary | SchemaType::List(_) | SchemaType::Set(_) | SchemaType::Map(..) => {
                let expr = self.render(&constant.ty, &constant.value)?;
                cw_writeln!(
                    w,
                    "pub static {name}: ::std::sync::LazyLock<{ty}> = ::std::sync::LazyLock::new(|| {expr});"
                )?;
            }
            _ => {
                let expr = self.render(&constant.ty, &constant.value)?;
                cw_writeln!(w, "pub const {name}: {ty} = {expr};")?;
            }
        }
        Ok(())
    }

    /// Resolve constant-to-constant references for literals emitted verbatim.
    fn follow<'v>(&self, value: &'v ConstValue) -> Result<&'v ConstValue, GenError>
    where
        'a: 'v,
    {
        let mut current = value;
        for _ in 0..MAX_REFERENCE_DEPTH {
            match current {
                ConstValue::Identifier(name) => match self.lookup(name) {
                    Some(c) => current = &c.value,
                    None => return Ok(current),
                },
                _ => return Ok(current),
            }
        }
        Err(GenError::ConstantDepth(MAX_REFERENCE_DEPTH))
    }
}

/// `::std::vec::Vec<i32>` becomes `::std::vec::Vec`.
fn container_path(rust_type: &str) -> &str {
    rust_type.split('<').next().unwrap_or(rust_type)
}

/// Debug formatting always yields a valid float literal for finite values.
fn float_literal(v: f64) -> String {
    if v.is_nan() {
        "f64::NAN".into()
    } else if v == f64::INFINITY {
        "f64::INFINITY".into()
    } else if v == f64::NEG_INFINITY {
        "f64::NEG_INFINITY".into()
    } else {
        format!("{v:?}")
    }
}

fn literal_text(value: &ConstValue) -> String {
    match value {
        ConstValue::Int(v) => v.to_string(),
        ConstValue::Double(v) => v.to_string(),
        ConstValue::String(s) => format!("{s:?}"),
        ConstValue::Identifier(id) => id.clone(),
        ConstValue::List(items) => {
            let items: Vec<_> = items.iter().map(literal_text).collect();
            format!("[{}]", items.join(", "))
        }
        ConstValue::Map(entries) => {
            let entries: Vec<_> = entries
                .iter()
                .map(|(k, v)| format!("{}: {}", literal_text(k), literal_text(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use idlc_schema::{EnumType, Schema, StructKind, StructType};

    use super::*;
    use crate::config::GeneratorConfig;

    fn render(schema: &Schema, ty: &SchemaType, value: ConstValue) -> Result<String, GenError> {
        let config = GeneratorConfig::default();
        let mapper = TypeMapper::new(schema, &config);
        ConstantRenderer::new(&mapper).render(ty, &value)
    }

    #[test]
    fn scalars() {
        let schema = Schema::new();
        assert_eq!(render(&schema, &SchemaType::I32, ConstValue::Int(-7)).unwrap(), "-7");
        assert_eq!(render(&schema, &SchemaType::Bool, ConstValue::Int(1)).unwrap(), "true");
        assert_eq!(
            render(&schema, &SchemaType::Bool, ConstValue::Identifier("false".into())).unwrap(),
            "false"
        );
        assert_eq!(render(&schema, &SchemaType::Double, ConstValue::Int(3)).unwrap(), "3.0");
        assert_eq!(
            render(&schema, &SchemaType::Double, ConstValue::Double(f64::NAN)).unwrap(),
            "f64::NAN"
        );
        assert_eq!(
            render(&schema, &SchemaType::String, ConstValue::String("a\"b".into())).unwrap(),
            "::std::string::String::from(\"a\\\"b\")"
        );
    }

    #[test]
    fn out_of_range_ints_are_rejected() {
        let schema = Schema::new();
        let err = render(&schema, &SchemaType::Byte, ConstValue::Int(300)).unwrap_err();
        assert_eq!(
            err,
            GenError::LiteralMismatch {
                ty: "byte".into(),
                literal: "300".into()
            }
        );
    }

    #[test]
    fn enum_members_by_name_or_value() {
        let mut schema = Schema::new();
        let color = schema.add_enum(
            EnumType::new("Color", "demo")
                .with_member("RED", 1)
                .with_member("DARK_BLUE", 5),
        );
        let ty = SchemaType::Enum(color);

        assert_eq!(
            render(&schema, &ty, ConstValue::Identifier("Color.DARK_BLUE".into())).unwrap(),
            "crate::demo::Color::DarkBlue"
        );
        assert_eq!(
            render(&schema, &ty, ConstValue::Int(1)).unwrap(),
            "crate::demo::Color::Red"
        );
        assert!(matches!(
            render(&schema, &ty, ConstValue::Int(2)),
            Err(GenError::UnknownEnumMember { .. })
        ));
    }

    #[test]
    fn nested_containers() {
        let schema = Schema::new();
        let ty = SchemaType::map(SchemaType::String, SchemaType::list(SchemaType::I32));
        let value = ConstValue::Map(vec![(
            ConstValue::String("a".into()),
            ConstValue::List(vec![ConstValue::Int(1), ConstValue::Int(2)]),
        )]);
        assert_eq!(
            render(&schema, &ty, value).unwrap(),
            "::std::collections::HashMap::from([(::std::string::String::from(\"a\"), ::std::vec::Vec::from([1, 2]))])"
        );
        assert_eq!(
            render(&schema, &SchemaType::set(SchemaType::I64), ConstValue::List(vec![])).unwrap(),
            "::std::collections::HashSet::new()"
        );
    }

    #[test]
    fn struct_constants_are_rejected() {
        let mut schema = Schema::new();
        let s = schema.add_struct(StructType::new("S", "", StructKind::Struct));
        assert!(matches!(
            render(&schema, &SchemaType::Struct(s), ConstValue::Map(vec![])),
            Err(GenError::UnsupportedConstantType { .. })
        ));
    }

    #[test]
    fn references_to_other_constants() {
        let mut schema = Schema::new();
        schema.add_constant(Constant::new("BASE", "demo", SchemaType::I32, ConstValue::Int(10)));
        assert_eq!(
            render(&schema, &SchemaType::I32, ConstValue::Identifier("demo.BASE".into())).unwrap(),
            "10"
        );
    }

    #[test]
    fn group_declarations() {
        let mut schema = Schema::new();
        schema.add_constant(Constant::new(
            "greeting",
            "demo",
            SchemaType::String,
            ConstValue::String("hi".into()),
        ));
        schema.add_constant(Constant::new("LIMIT", "demo", SchemaType::I64, ConstValue::Int(5)));
        schema.add_constant(Constant::new(
            "PRIMES",
            "demo",
            SchemaType::list(SchemaType::I32),
            ConstValue::List(vec![ConstValue::Int(2), ConstValue::Int(3)]),
        ));

        let config = GeneratorConfig::default();
        let mapper = TypeMapper::new(&schema, &config);
        let constants: Vec<_> = schema.constants().iter().collect();
        let code = ConstantRenderer::new(&mapper).generate_group(&constants).unwrap();

        assert!(code.contains("pub const GREETING: &str = \"hi\";"));
        assert!(code.contains("pub const LIMIT: i64 = 5;"));
        assert!(code.contains(
            "pub static PRIMES: ::std::sync::LazyLock<::std::vec::Vec<i32>> = ::std::sync::LazyLock::new(|| ::std::vec::Vec::from([2, 3]));"
        ));
    }
}
