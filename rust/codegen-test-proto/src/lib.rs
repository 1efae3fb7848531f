//! Fixture schema for validating the build.rs codegen approach.
//!
//! Stands in for what the IDL front end would hand over after parsing and
//! resolving something like:
//!
//! ```text
//! namespace demo
//!
//! enum Color { RED = 1, GREEN = 2, DARK_BLUE = 7 }
//!
//! struct Input {
//!   1: required string name,
//!   2: optional Color color = Color.GREEN,
//!   3: optional list<string> tags,
//!   4: optional map<string, double> weights,
//! }
//!
//! namespace demo.search
//!
//! struct Query {
//!   1: required string text,
//!   2: required i64 resultsNewerThan,
//!   3: required demo.Input input,
//! }
//!
//! service Search extends demo.Base {
//!   list<Query> find(1: required Query query, 2: i32 limit = 10)
//!       throws (1: demo.NotFound notFound) (allowlist)
//!   string describe(1: demo.Value value)
//! }
//! ```
//!
//! plus a union, an exception, a self-referential struct, a struct with
//! redacted and obfuscated fields, constants, and the `Base` service.

use idlc_schema::{
    ConstValue, Constant, EnumType, Field, Location, Schema, SchemaType, ServiceId, ServiceMethod,
    ServiceType, StructKind, StructType,
};

pub const ALLOW_LIST: &str = "allowlist";

pub struct Fixture {
    pub schema: Schema,
    /// `demo.search.Search`, which extends `demo.Base`.
    pub search: ServiceId,
}

pub fn fixture() -> Fixture {
    let mut schema = Schema::new();

    let mut color = EnumType::new("Color", "demo")
        .with_member("RED", 1)
        .with_member("GREEN", 2)
        .with_member("DARK_BLUE", 7);
    color.documentation = Some("Colours a search can be narrowed to.".into());
    let color = schema.add_enum(color);

    let input = schema.add_struct(
        StructType::new("Input", "demo", StructKind::Struct)
            .with_field(Field::new(1, "name", SchemaType::String).required())
            .with_field(
                Field::new(2, "color", SchemaType::Enum(color))
                    .optional()
                    .with_default(ConstValue::Identifier("Color.GREEN".into())),
            )
            .with_field(Field::new(3, "tags", SchemaType::list(SchemaType::String)).optional())
            .with_field(
                Field::new(4, "weights", SchemaType::map(SchemaType::String, SchemaType::Double))
                    .optional(),
            ),
    );

    let mut query = StructType::new("Query", "demo.search", StructKind::Struct)
        .with_field(Field::new(1, "text", SchemaType::String).required())
        .with_field(Field::new(2, "resultsNewerThan", SchemaType::I64).required())
        .with_field(Field::new(3, "input", SchemaType::Struct(input)).required());
    query.documentation = Some("A full-text query.".into());
    query.location = Some(Location::new("search.thrift", 12, 1));
    let query = schema.add_struct(query);

    let value = schema.add_struct(
        StructType::new("Value", "demo", StructKind::Union)
            .with_field(Field::new(1, "text", SchemaType::String))
            .with_field(Field::new(2, "number", SchemaType::I64))
            .with_field(Field::new(3, "flag", SchemaType::Bool)),
    );

    let not_found = schema.add_struct(
        StructType::new("NotFound", "demo", StructKind::Exception)
            .with_field(Field::new(1, "message", SchemaType::String).required()),
    );

    schema.add_struct(
        StructType::new("Credentials", "demo", StructKind::Struct)
            .with_field(Field::new(1, "user", SchemaType::String).required())
            .with_field(Field::new(2, "password", SchemaType::String).redacted())
            .with_field(Field::new(3, "token", SchemaType::String).obfuscated())
            .with_field(Field::new(4, "scopes", SchemaType::set(SchemaType::String)).obfuscated())
            .with_field(
                Field::new(5, "legacyId", SchemaType::I32)
                    .deprecated()
                    .with_doc("Replaced by `user`."),
            ),
    );

    let node = schema.add_struct(StructType::new("Node", "demo", StructKind::Struct));
    schema.struct_mut(node).fields.extend([
        Field::new(1, "value", SchemaType::I32).required(),
        Field::new(2, "next", SchemaType::Struct(node)),
        Field::new(3, "children", SchemaType::list(SchemaType::Struct(node))),
    ]);

    schema.add_struct(
        StructType::new("Limits", "demo", StructKind::Struct)
            .with_field(
                Field::new(1, "maxResults", SchemaType::I32)
                    .required()
                    .with_default(ConstValue::Identifier("MAX_RESULTS".into())),
            )
            .with_field(
                Field::new(2, "label", SchemaType::String)
                    .with_default(ConstValue::String("all".into())),
            ),
    );

    schema.add_constant(Constant::new(
        "MAX_RESULTS",
        "demo",
        SchemaType::I32,
        ConstValue::Int(100),
    ));
    schema.add_constant(Constant::new(
        "GREETING",
        "demo",
        SchemaType::String,
        ConstValue::String("hello".into()),
    ));
    schema.add_constant(Constant::new(
        "DEFAULT_COLOR",
        "demo",
        SchemaType::Enum(color),
        ConstValue::Identifier("Color.DARK_BLUE".into()),
    ));
    schema.add_constant(Constant::new(
        "PRIMES",
        "demo",
        SchemaType::list(SchemaType::I32),
        ConstValue::List(vec![
            ConstValue::Int(2),
            ConstValue::Int(3),
            ConstValue::Int(5),
            ConstValue::Int(7),
        ]),
    ));
    schema.add_constant(Constant::new(
        "WEIGHTS",
        "demo",
        SchemaType::map(SchemaType::String, SchemaType::Double),
        ConstValue::Map(vec![(ConstValue::String("title".into()), ConstValue::Int(2))]),
    ));

    let base = schema.add_service(
        ServiceType::new("Base", "demo")
            .with_method(ServiceMethod::new("ping", SchemaType::Void).with_annotation(ALLOW_LIST, "true"))
            .with_method(
                ServiceMethod::new("log", SchemaType::Void)
                    .with_parameter(Field::new(1, "line", SchemaType::String).required())
                    .one_way(),
            ),
    );

    let search = schema.add_service(
        ServiceType::new("Search", "demo.search")
            .extending(base)
            .with_method(
                ServiceMethod::new("find", SchemaType::list(SchemaType::Struct(query)))
                    .with_parameter(Field::new(1, "query", SchemaType::Struct(query)).required())
                    .with_parameter(
                        Field::new(2, "limit", SchemaType::I32).with_default(ConstValue::Int(10)),
                    )
                    .with_exception(Field::new(1, "notFound", SchemaType::Exception(not_found)))
                    .with_annotation(ALLOW_LIST, "true"),
            )
            .with_method(
                ServiceMethod::new("describe", SchemaType::String)
                    .with_parameter(Field::new(1, "value", SchemaType::Union(value))),
            ),
    );

    Fixture { schema, search }
}
