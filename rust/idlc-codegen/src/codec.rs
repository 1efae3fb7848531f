//! Protocol codec generation.
//!
//! Emits the statements that write an ordered field list as a struct frame
//! and the tagged-dispatch loop that reads one back. Struct emission and
//! service call units both build on these. The emitted code assumes a
//! local `protocol: &mut dyn Protocol` and only ever uses `?` on
//! `ProtocolError`, so it works inside functions returning either
//! `ProtocolError` or `CallError<E>`.

use idlc_schema::{Field, SchemaType};

use crate::code_writer::CodeWriter;
use crate::cw_writeln;
use crate::error::GenError;
use crate::types::TypeMapper;

type Out<'o> = CodeWriter<&'o mut String>;

/// How the writer reaches a field's value.
#[derive(Debug, Clone)]
pub enum Access {
    /// An expression of type `&T`; the field is always written.
    Present(String),
    /// An expression of type `Option<&T>`; absent values are skipped.
    Maybe(String),
}

pub struct WriteField<'f> {
    pub field: &'f Field,
    pub access: Access,
}

/// Where a value read for one field id ends up.
#[derive(Debug, Clone)]
pub enum Sink {
    /// `builder = builder.setter(value);`
    Builder(String),
    /// `local = Some(value);`
    Local(String),
}

pub struct ReadField<'f> {
    pub id: i16,
    pub ty: &'f SchemaType,
    pub sink: Sink,
}

/// Allocates collision-free names for temporaries.
#[derive(Debug, Default)]
struct Locals {
    next: usize,
}

impl Locals {
    fn fresh(&mut self, prefix: &str) -> String {
        let name = format!("{prefix}{}", self.next);
        self.next += 1;
        name
    }
}

pub struct CodecGenerator<'a> {
    mapper: &'a TypeMapper<'a>,
}

impl<'a> CodecGenerator<'a> {
    pub fn new(mapper: &'a TypeMapper<'a>) -> Self {
        Self { mapper }
    }

    fn rt(&self) -> &str {
        self.mapper.config().runtime_path()
    }

    /// Statements writing `fields` as a struct named `struct_name`. The last
    /// statement is the tail expression `protocol.write_struct_end()`.
    pub fn write_struct(&self, struct_name: &str, fields: &[WriteField<'_>]) -> Result<String, GenError> {
        let mut out = String::new();
        {
            let mut w = CodeWriter::new(&mut out);
            let mut locals = Locals::default();

            cw_writeln!(w, "protocol.write_struct_begin({struct_name:?})?;")?;
            for WriteField { field, access } in fields {
                let value = locals.fresh("value");
                match access {
                    Access::Present(expr) => {
                        cw_writeln!(w, "let {value} = {expr};")?;
                        self.write_field(&mut w, field, &value, &mut locals)?;
                    }
                    Access::Maybe(expr) => {
                        cw_writeln!(w, "if let Some({value}) = {expr} {{")?;
                        {
                            let _indent = w.indent();
                            self.write_field(&mut w, field, &value, &mut locals)?;
                        }
                        w.writeln("}")?;
                    }
                }
            }
            w.writeln("protocol.write_field_stop()?;")?;
            w.writeln("protocol.write_struct_end()")?;
        }
        Ok(out)
    }

    fn write_field(&self, w: &mut Out<'_>, field: &Field, value: &str, locals: &mut Locals) -> Result<(), GenError> {
        cw_writeln!(
            w,
            "protocol.write_field_begin({:?}, {}, {})?;",
            field.name,
            field.id,
            self.mapper.tag_path(&field.ty)?
        )?;
        self.write_value(w, &field.ty, value, locals)?;
        w.writeln("protocol.write_field_end()?;")?;
        Ok(())
    }

    /// `expr` names a local of type `&T`.
    fn write_value(&self, w: &mut Out<'_>, ty: &SchemaType, expr: &str, locals: &mut Locals) -> Result<(), GenError> {
        let rt = self.rt();
        match self.mapper.schema().true_type(ty)? {
            SchemaType::Bool => cw_writeln!(w, "protocol.write_bool(*{expr})?;")?,
            SchemaType::Byte => cw_writeln!(w, "protocol.write_byte(*{expr})?;")?,
            SchemaType::I16 => cw_writeln!(w, "protocol.write_i16(*{expr})?;")?,
            SchemaType::I32 => cw_writeln!(w, "protocol.write_i32(*{expr})?;")?,
            SchemaType::I64 => cw_writeln!(w, "protocol.write_i64(*{expr})?;")?,
            SchemaType::Double => cw_writeln!(w, "protocol.write_double(*{expr})?;")?,
            SchemaType::String => cw_writeln!(w, "protocol.write_string({expr})?;")?,
            SchemaType::Binary => cw_writeln!(w, "protocol.write_binary({expr})?;")?,
            SchemaType::Enum(_) => cw_writeln!(w, "protocol.write_i32({expr}.value())?;")?,
            SchemaType::Struct(_) | SchemaType::Union(_) | SchemaType::Exception(_) => {
                cw_writeln!(w, "{rt}::ThriftStruct::write({expr}, protocol)?;")?
            }
            SchemaType::List(element) | SchemaType::Set(element) => {
                let kind = if matches!(self.mapper.schema().true_type(ty)?, SchemaType::List(_)) {
                    "list"
                } else {
                    "set"
                };
                cw_writeln!(
                    w,
                    "protocol.write_{kind}_begin({}, {rt}::collection_size({expr}.len())?)?;",
                    self.mapper.tag_path(element)?
                )?;
                let item = locals.fresh("item");
                w.writeln(&format!("for {item} in {expr} {{"))?;
                {
                    let _indent = w.indent();
                    self.write_value(w, element, &item, locals)?;
                }
                w.writeln("}")?;
                cw_writeln!(w, "protocol.write_{kind}_end()?;")?;
            }
            SchemaType::Map(key, value) => {
                cw_writeln!(
                    w,
                    "protocol.write_map_begin({}, {}, {rt}::collection_size({expr}.len())?)?;",
                    self.mapper.tag_path(key)?,
                    self.mapper.tag_path(value)?
                )?;
                let k = locals.fresh("key");
                let v = locals.fresh("value");
                w.writeln(&format!("for ({k}, {v}) in {expr} {{"))?;
                {
                    let _indent = w.indent();
                    self.write_value(w, key, &k, locals)?;
                    self.write_value(w, value, &v, locals)?;
                }
                w.writeln("}")?;
                w.writeln("protocol.write_map_end()?;")?;
            }
            other @ (SchemaType::Void | SchemaType::Service(_) | SchemaType::Typedef(_)) => {
                return Err(GenError::UnexpectedType {
                    ty: self.mapper.schema().type_name(other),
                    context: "a field",
                });
            }
        }
        Ok(())
    }

    /// The read loop from `read_struct_begin` through `read_struct_end`.
    ///
    /// Unknown ids are skipped. A known id carrying a different wire tag is
    /// a `TypeMismatch`, or skipped when field type checks are disabled.
    pub fn read_loop(&self, fields: &[ReadField<'_>]) -> Result<String, GenError> {
        let rt = self.rt();
        let mut out = String::new();
        {
            let mut w = CodeWriter::new(&mut out);
            let mut locals = Locals::default();

            w.writeln("protocol.read_struct_begin()?;")?;
            w.writeln("loop {")?;
            {
                let _loop = w.indent();
                w.writeln("let field = protocol.read_field_begin()?;")?;
                cw_writeln!(w, "if field.type_id == {rt}::ttype::STOP {{")?;
                {
                    let _if = w.indent();
                    w.writeln("break;")?;
                }
                w.writeln("}")?;
                w.writeln("match field.field_id {")?;
                {
                    let _match = w.indent();
                    for read in fields {
                        self.read_arm(&mut w, read, &mut locals)?;
                    }
                    cw_writeln!(w, "_ => {rt}::skip(protocol, field.type_id)?,")?;
                }
                w.writeln("}")?;
                w.writeln("protocol.read_field_end()?;")?;
            }
            w.writeln("}")?;
            w.writeln("protocol.read_struct_end()?;")?;
        }
        Ok(out)
    }

    fn read_arm(&self, w: &mut Out<'_>, read: &ReadField<'_>, locals: &mut Locals) -> Result<(), GenError> {
        let rt = self.rt();
        let tag = self.mapper.tag_path(read.ty)?;

        cw_writeln!(w, "{} => {{", read.id)?;
        {
            let _arm = w.indent();
            cw_writeln!(w, "if field.type_id == {tag} {{")?;
            {
                let _if = w.indent();
                let value = self.read_value(w, read.ty, locals)?;
                match &read.sink {
                    Sink::Builder(setter) => cw_writeln!(w, "builder = builder.{setter}({value});")?,
                    Sink::Local(local) => cw_writeln!(w, "{local} = Some({value});")?,
                }
            }
            w.writeln("} else {")?;
            {
                let _else = w.indent();
                if self.mapper.config().field_type_checks {
                    cw_writeln!(
                        w,
                        "return Err({rt}::ProtocolError::type_mismatch({}, {tag}, field.type_id).into());",
                        read.id
                    )?;
                } else {
                    cw_writeln!(w, "{rt}::skip(protocol, field.type_id)?;")?;
                }
            }
            w.writeln("}")?;
        }
        w.writeln("}")?;
        Ok(())
    }

    /// Emits statements reading one value; returns the local holding it.
    fn read_value(&self, w: &mut Out<'_>, ty: &SchemaType, locals: &mut Locals) -> Result<String, GenError> {
        let rt = self.rt();
        let schema = self.mapper.schema();
        let resolved = schema.true_type(ty)?;

        let simple = match resolved {
            SchemaType::Bool => Some("read_bool"),
            SchemaType::Byte => Some("read_byte"),
            SchemaType::I16 => Some("read_i16"),
            SchemaType::I32 => Some("read_i32"),
            SchemaType::I64 => Some("read_i64"),
            SchemaType::Double => Some("read_double"),
            SchemaType::String => Some("read_string"),
            SchemaType::Binary => Some("read_binary"),
            _ => None,
        };
        if let Some(method) = simple {
            let value = locals.fresh("value");
            cw_writeln!(w, "let {value} = protocol.{method}()?;")?;
            return Ok(value);
        }

        match resolved {
            SchemaType::Enum(id) => {
                let raw = locals.fresh("raw");
                let value = locals.fresh("value");
                cw_writeln!(w, "let {raw} = protocol.read_i32()?;")?;
                cw_writeln!(
                    w,
                    "let {value} = {}::find_by_value({raw}).ok_or({rt}::ProtocolError::UnknownEnumValue {{ enum_name: {:?}, value: {raw} }})?;",
                    self.mapper.rust_type(ty)?,
                    schema.enum_type(*id).name
                )?;
                Ok(value)
            }
            SchemaType::Struct(_) | SchemaType::Union(_) | SchemaType::Exception(_) => {
                let value = locals.fresh("value");
                cw_writeln!(
                    w,
                    "let {value} = <{} as {rt}::ThriftStruct>::read(protocol)?;",
                    self.mapper.rust_type(ty)?
                )?;
                Ok(value)
            }
            SchemaType::List(element) => {
                let config = self.mapper.config();
                self.read_sequence(w, "list", config.list.path(), config.list.push_method(), element, locals)
            }
            SchemaType::Set(element) => {
                let config = self.mapper.config();
                self.read_sequence(w, "set", config.set.path(), "insert", element, locals)
            }
            SchemaType::Map(key, val) => {
                let header = locals.fresh("map");
                let value = locals.fresh("value");
                cw_writeln!(w, "let {header} = protocol.read_map_begin()?;")?;
                cw_writeln!(w, "let mut {value} = {}::new();", self.mapper.config().map.path())?;
                cw_writeln!(w, "for _ in 0..{header}.size {{")?;
                {
                    let _indent = w.indent();
                    let k = self.read_value(w, key, locals)?;
                    let v = self.read_value(w, val, locals)?;
                    cw_writeln!(w, "{value}.insert({k}, {v});")?;
                }
                w.writeln("}")?;
                w.writeln("protocol.read_map_end()?;")?;
                Ok(value)
            }
            other => Err(GenError::UnexpectedType {
                ty: schema.type_name(other),
                context: "a field",
            }),
        }
    }

    fn read_sequence(
        &self,
        w: &mut Out<'_>,
        kind: &str,
        container: &str,
        add: &str,
        element: &SchemaType,
        locals: &mut Locals,
    ) -> Result<String, GenError> {
        let header = locals.fresh(kind);
        let value = locals.fresh("value");
        cw_writeln!(w, "let {header} = protocol.read_{kind}_begin()?;")?;
        cw_writeln!(w, "let mut {value} = {container}::new();")?;
        cw_writeln!(w, "for _ in 0..{header}.size {{")?;
        {
            let _indent = w.indent();
            let item = self.read_value(w, element, locals)?;
            cw_writeln!(w, "{value}.{add}({item});")?;
        }
        w.writeln("}")?;
        cw_writeln!(w, "protocol.read_{kind}_end()?;")?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use idlc_schema::{EnumType, Schema, StructKind, StructType};

    use super::*;
    use crate::config::GeneratorConfig;

    #[test]
    fn required_and_optional_writes() {
        let schema = Schema::new();
        let config = GeneratorConfig::default();
        let mapper = TypeMapper::new(&schema, &config);
        let codec = CodecGenerator::new(&mapper);

        let text = Field::new(1, "text", SchemaType::String).required();
        let limit = Field::new(2, "limit", SchemaType::I32).optional();
        let code = codec
            .write_struct(
                "Query",
                &[
                    WriteField {
                        field: &text,
                        access: Access::Present("&self.text".into()),
                    },
                    WriteField {
                        field: &limit,
                        access: Access::Maybe("self.limit.as_ref()".into()),
                    },
                ],
            )
            .unwrap();

        let expected = "\
protocol.write_struct_begin(\"Query\")?;
let value0 = &self.text;
protocol.write_field_begin(\"text\", 1, ::idlc_runtime::ttype::STRING)?;
protocol.write_string(value0)?;
protocol.write_field_end()?;
if let Some(value1) = self.limit.as_ref() {
    protocol.write_field_begin(\"limit\", 2, ::idlc_runtime::ttype::I32)?;
    protocol.write_i32(*value1)?;
    protocol.write_field_end()?;
}
protocol.write_field_stop()?;
protocol.write_struct_end()
";
        assert_eq!(code, expected);
    }

    #[test]
    fn enums_travel_as_i32() {
        let mut schema = Schema::new();
        let color = schema.add_enum(EnumType::new("Color", "demo").with_member("RED", 1));
        let config = GeneratorConfig::default();
        let mapper = TypeMapper::new(&schema, &config);
        let codec = CodecGenerator::new(&mapper);

        let field = Field::new(3, "color", SchemaType::Enum(color)).required();
        let write = codec
            .write_struct(
                "Paint",
                &[WriteField {
                    field: &field,
                    access: Access::Present("&self.color".into()),
                }],
            )
            .unwrap();
        assert!(write.contains("protocol.write_field_begin(\"color\", 3, ::idlc_runtime::ttype::I32)?;"));
        assert!(write.contains("protocol.write_i32(value0.value())?;"));

        let read = codec
            .read_loop(&[ReadField {
                id: 3,
                ty: &field.ty,
                sink: Sink::Builder("color".into()),
            }])
            .unwrap();
        assert!(read.contains("crate::demo::Color::find_by_value(raw0)"));
        assert!(read.contains("builder = builder.color(value1);"));
    }

    #[test]
    fn nested_containers_use_fresh_locals() {
        let schema = Schema::new();
        let config = GeneratorConfig::default();
        let mapper = TypeMapper::new(&schema, &config);
        let codec = CodecGenerator::new(&mapper);

        let ty = SchemaType::map(SchemaType::String, SchemaType::list(SchemaType::I64));
        let read = codec
            .read_loop(&[ReadField {
                id: 1,
                ty: &ty,
                sink: Sink::Local("result".into()),
            }])
            .unwrap();

        assert!(read.contains("let map0 = protocol.read_map_begin()?;"));
        assert!(read.contains("let mut value1 = ::std::collections::HashMap::new();"));
        assert!(read.contains("let list3 = protocol.read_list_begin()?;"));
        assert!(read.contains("value4.push(value5);"));
        assert!(read.contains("value1.insert(value2, value4);"));
        assert!(read.contains("result = Some(value1);"));
    }

    #[test]
    fn type_checks_can_be_disabled() {
        let mut schema = Schema::new();
        let input = schema.add_struct(StructType::new("Input", "demo", StructKind::Struct));
        let ty = SchemaType::Struct(input);
        let read_field = [ReadField {
            id: 4,
            ty: &ty,
            sink: Sink::Builder("input".into()),
        }];

        let strict = GeneratorConfig::default();
        let mapper = TypeMapper::new(&schema, &strict);
        let code = CodecGenerator::new(&mapper).read_loop(&read_field).unwrap();
        assert!(code.contains(
            "return Err(::idlc_runtime::ProtocolError::type_mismatch(4, ::idlc_runtime::ttype::STRUCT, field.type_id).into());"
        ));
        assert!(code.contains("let value0 = <crate::demo::Input as ::idlc_runtime::ThriftStruct>::read(protocol)?;"));

        let tolerant = GeneratorConfig::default().with_field_type_checks(false);
        let mapper = TypeMapper::new(&schema, &tolerant);
        let code = CodecGenerator::new(&mapper).read_loop(&read_field).unwrap();
        assert!(!code.contains("type_mismatch"));
        assert!(code.contains("::idlc_runtime::skip(protocol, field.type_id)?;"));
    }
}
