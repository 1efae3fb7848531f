//! Test consumer crate that uses generated code from build.rs.

// Include the generated code
include!(concat!(env!("OUT_DIR"), "/generated.rs"));

/// The surface `Search` exposes through its allow-listed operations.
pub mod pruned {
    include!(concat!(env!("OUT_DIR"), "/pruned.rs"));
}

#[cfg(test)]
mod proptests;

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use idlc_runtime::{
        BinaryProtocol, BuildError, CallError, MAX_NESTING_DEPTH, MessageType, Protocol,
        ProtocolError, ThriftHash, ThriftStruct, ttype,
    };

    use super::demo::search::*;
    use super::demo::*;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    }

    fn input(name: &str) -> Input {
        Input::builder().name(name.to_string()).build().unwrap()
    }

    fn query(text: &str) -> Query {
        Query::builder()
            .text(text.to_string())
            .results_newer_than(1_700_000_000)
            .input(input("web"))
            .build()
            .unwrap()
    }

    fn encode<T: ThriftStruct>(value: &T) -> Vec<u8> {
        let mut protocol = BinaryProtocol::new();
        value.write(&mut protocol).unwrap();
        protocol.into_output()
    }

    fn decode<T: ThriftStruct>(bytes: Vec<u8>) -> Result<T, ProtocolError> {
        T::read(&mut BinaryProtocol::with_input(bytes))
    }

    #[test]
    fn enum_values_and_lookup() {
        assert_eq!(Color::DarkBlue.value(), 7);
        assert_eq!(Color::find_by_value(2), Some(Color::Green));
        assert_eq!(Color::find_by_value(3), None);
    }

    #[test]
    fn missing_required_field_is_reported() {
        let err = Query::builder()
            .text("rust".to_string())
            .input(input("web"))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            BuildError::MissingRequiredField {
                field: "resultsNewerThan"
            }
        );
    }

    #[test]
    fn unions_hold_exactly_one_field() {
        let value = Value::builder().number(42).build().unwrap();
        assert_eq!(value.number(), Some(&42));
        assert_eq!(value.text(), None);

        assert_eq!(
            Value::builder().build().unwrap_err(),
            BuildError::InvalidUnionState { set_fields: 0 }
        );
        assert_eq!(
            Value::builder()
                .number(1)
                .flag(true)
                .build()
                .unwrap_err(),
            BuildError::InvalidUnionState { set_fields: 2 }
        );
    }

    #[test]
    fn defaults_seed_the_builder() {
        let input = input("web");
        assert_eq!(input.color(), Some(&Color::Green));
        assert_eq!(input.tags(), None);

        let limits = Limits::builder().build().unwrap();
        assert_eq!(*limits.max_results(), 100);
        assert_eq!(limits.label().map(String::as_str), Some("all"));
    }

    #[test]
    fn to_builder_round_trips() {
        let original = query("rust");
        let changed = original
            .to_builder()
            .text("zig".to_string())
            .build()
            .unwrap();

        assert_eq!(changed.text(), "zig");
        assert_eq!(changed.results_newer_than(), original.results_newer_than());
        assert_eq!(original.to_builder().build().unwrap(), original);
    }

    #[test]
    fn codec_round_trip() {
        init_tracing();

        let tagged = Input::builder()
            .name("web".to_string())
            .color(Color::DarkBlue)
            .tags(vec!["a".to_string(), "b".to_string()])
            .weights([("title".to_string(), 2.5)].into_iter().collect())
            .build()
            .unwrap();
        let original = Query::builder()
            .text("rust".to_string())
            .results_newer_than(-5)
            .input(tagged)
            .build()
            .unwrap();

        let bytes = encode(&original);
        // string field 1 comes first
        assert_eq!(&bytes[..3], &[ttype::STRING, 0, 1]);

        let decoded: Query = decode(bytes).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.input().color(), Some(&Color::DarkBlue));
        assert_eq!(decoded.input().weights().unwrap()["title"], 2.5);
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let mut protocol = BinaryProtocol::new();
        protocol.write_struct_begin("NotFound").unwrap();
        protocol.write_field_begin("extra", 9, ttype::LIST).unwrap();
        protocol.write_list_begin(ttype::I64, 2).unwrap();
        protocol.write_i64(1).unwrap();
        protocol.write_i64(2).unwrap();
        protocol.write_list_end().unwrap();
        protocol.write_field_end().unwrap();
        protocol.write_field_begin("message", 1, ttype::STRING).unwrap();
        protocol.write_string("gone").unwrap();
        protocol.write_field_end().unwrap();
        protocol.write_field_stop().unwrap();
        protocol.write_struct_end().unwrap();

        let decoded: NotFound = decode(protocol.into_output()).unwrap();
        assert_eq!(decoded.message(), "gone");
    }

    #[test]
    fn wrong_wire_type_is_rejected() {
        let mut protocol = BinaryProtocol::new();
        protocol.write_field_begin("message", 1, ttype::I32).unwrap();
        protocol.write_i32(7).unwrap();
        protocol.write_field_end().unwrap();
        protocol.write_field_stop().unwrap();

        let err = decode::<NotFound>(protocol.into_output()).unwrap_err();
        assert_eq!(err, ProtocolError::type_mismatch(1, ttype::STRING, ttype::I32));
    }

    #[test]
    fn unknown_enum_values_fail_decoding() {
        let mut protocol = BinaryProtocol::new();
        protocol.write_field_begin("name", 1, ttype::STRING).unwrap();
        protocol.write_string("web").unwrap();
        protocol.write_field_end().unwrap();
        protocol.write_field_begin("color", 2, ttype::I32).unwrap();
        protocol.write_i32(99).unwrap();
        protocol.write_field_end().unwrap();
        protocol.write_field_stop().unwrap();

        let err = decode::<Input>(protocol.into_output()).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnknownEnumValue {
                enum_name: "Color",
                value: 99
            }
        );
    }

    #[test]
    fn missing_required_field_fails_decoding() {
        let mut protocol = BinaryProtocol::new();
        protocol.write_field_stop().unwrap();

        let err = decode::<NotFound>(protocol.into_output()).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::Build(BuildError::MissingRequiredField { field: "message" })
        );
    }

    #[test]
    fn equal_values_hash_alike() {
        let a = query("rust");
        let b = query("rust");
        let c = query("zig");

        assert_eq!(a, b);
        assert_eq!(a.thrift_hash(), b.thrift_hash());
        assert_ne!(a, c);

        let set: HashSet<Query> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display_hides_sensitive_fields() {
        let credentials = Credentials::builder()
            .user("ann".to_string())
            .password("hunter2".to_string())
            .token("s3cr3t".to_string())
            .scopes(["read".to_string(), "write".to_string()].into_iter().collect())
            .build()
            .unwrap();

        let shown = credentials.to_string();
        assert!(shown.starts_with("Credentials{user=ann, password=<REDACTED>, token="));
        assert!(shown.ends_with(", scopes=set<string>(size=2), legacy_id=null}"));
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("s3cr3t"));
        assert_eq!(format!("{credentials:?}"), shown);
    }

    #[test]
    fn display_prints_values_as_is() {
        let input = Input::builder()
            .name("web".to_string())
            .tags(vec!["a".to_string()])
            .build()
            .unwrap();

        assert_eq!(
            input.to_string(),
            "Input{name=web, color=GREEN, tags=[\"a\"], weights=null}"
        );
        assert_eq!(
            query("rust").to_string(),
            "Query{text=rust, results_newer_than=1700000000, input=Input{name=web, color=GREEN, tags=null, weights=null}}"
        );
    }

    #[test]
    fn recursive_structs_nest() {
        let leaf = Node::builder().value(2).build().unwrap();
        let root = Node::builder()
            .value(1)
            .next(leaf.clone())
            .children(vec![leaf.clone(), leaf])
            .build()
            .unwrap();

        assert_eq!(root.next().map(|n| *n.value()), Some(2));

        let decoded: Node = decode(encode(&root)).unwrap();
        assert_eq!(decoded, root);
        assert_eq!(decoded.children().map(Vec::len), Some(2));
    }

    #[test]
    fn deeply_nested_payloads_are_refused() {
        let mut bytes = Vec::new();
        for _ in 0..100_000 {
            // field 2 (`next`) opening another Node
            bytes.extend_from_slice(&[ttype::STRUCT, 0, 2]);
        }
        bytes.extend(std::iter::repeat_n(ttype::STOP, 100_000));

        assert_eq!(
            decode::<Node>(bytes).unwrap_err(),
            ProtocolError::DepthLimit(MAX_NESTING_DEPTH)
        );
    }

    #[test]
    fn nesting_below_the_limit_decodes() {
        let mut node = Node::builder().value(0).build().unwrap();
        for value in 1..(MAX_NESTING_DEPTH as i32) {
            node = Node::builder().value(value).next(node).build().unwrap();
        }

        let decoded: Node = decode(encode(&node)).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn constants_are_typed() {
        assert_eq!(MAX_RESULTS, 100);
        assert_eq!(GREETING, "hello");
        assert_eq!(DEFAULT_COLOR, Color::DarkBlue);
        assert_eq!(*PRIMES, vec![2, 3, 5, 7]);
        assert_eq!(WEIGHTS["title"], 2.0);
    }

    /// A REPLY frame for the first call a client makes.
    fn reply(method: &str, body: impl FnOnce(&mut BinaryProtocol)) -> BinaryProtocol {
        let mut protocol = BinaryProtocol::new();
        protocol
            .write_message_begin(method, MessageType::Reply, 1)
            .unwrap();
        protocol.write_struct_begin("result").unwrap();
        body(&mut protocol);
        protocol.write_field_stop().unwrap();
        protocol.write_struct_end().unwrap();
        protocol.write_message_end().unwrap();
        BinaryProtocol::with_input(protocol.into_output())
    }

    #[test]
    fn client_decodes_success() {
        init_tracing();

        let protocol = reply("find", |p| {
            p.write_field_begin("success", 0, ttype::LIST).unwrap();
            p.write_list_begin(ttype::STRUCT, 1).unwrap();
            query("rust").write(p).unwrap();
            p.write_list_end().unwrap();
            p.write_field_end().unwrap();
        });
        let mut client = SearchClient::new(protocol);

        let found = client.find(query("rust"), None).unwrap();
        assert_eq!(found, vec![query("rust")]);

        let mut sent = BinaryProtocol::with_input(client.into_protocol().into_output());
        let header = sent.read_message_begin().unwrap();
        assert_eq!(header.name, "find");
        assert_eq!(header.message_type, MessageType::Call);
        assert_eq!(header.seq_id, 1);

        // the args struct: query at 1, then the defaulted limit at 2
        let field = sent.read_field_begin().unwrap();
        assert_eq!((field.field_id, field.type_id), (1, ttype::STRUCT));
        let sent_query = Query::read(&mut sent).unwrap();
        assert_eq!(sent_query, query("rust"));
        let field = sent.read_field_begin().unwrap();
        assert_eq!((field.field_id, field.type_id), (2, ttype::I32));
        assert_eq!(sent.read_i32().unwrap(), 10);
    }

    #[test]
    fn client_surfaces_declared_exceptions() {
        let not_found = NotFound::builder()
            .message("no index".to_string())
            .build()
            .unwrap();
        let expected = not_found.clone();
        let protocol = reply("find", |p| {
            p.write_field_begin("notFound", 1, ttype::STRUCT).unwrap();
            not_found.write(p).unwrap();
            p.write_field_end().unwrap();
        });
        let mut client = SearchClient::new(protocol);

        match client.find(query("rust"), Some(3)) {
            Err(CallError::Exception(SearchFindError::NotFound(e))) => assert_eq!(e, expected),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn empty_reply_is_missing_result() {
        let mut client = SearchClient::new(reply("find", |_| {}));
        assert!(matches!(
            client.find(query("rust"), None),
            Err(CallError::MissingResult)
        ));
    }

    #[test]
    fn inherited_operations_use_the_same_connection() {
        let mut client = SearchClient::new(reply("ping", |_| {}));

        Base::ping(&mut client).unwrap();
        Base::log(&mut client, "hello".to_string()).unwrap();

        let mut sent = BinaryProtocol::with_input(client.into_protocol().into_output());
        let ping = sent.read_message_begin().unwrap();
        assert_eq!((ping.name.as_str(), ping.seq_id), ("ping", 1));
        assert_eq!(sent.read_field_begin().unwrap().type_id, ttype::STOP);
        sent.read_message_end().unwrap();

        let log = sent.read_message_begin().unwrap();
        assert_eq!(log.name, "log");
        assert_eq!(log.message_type, MessageType::Oneway);
        assert_eq!(log.seq_id, 2);
    }

    #[test]
    fn pruned_surface_is_usable() {
        use crate::pruned::demo::search::{Search, SearchClient, SearchFindError};
        use crate::pruned::demo::{Input, NotFound};

        let input = Input::builder().name("web".to_string()).build().unwrap();
        let query = crate::pruned::demo::search::Query::builder()
            .text("rust".to_string())
            .results_newer_than(0)
            .input(input)
            .build()
            .unwrap();

        let not_found = NotFound::builder()
            .message("none".to_string())
            .build()
            .unwrap();
        let protocol = reply("find", |p| {
            p.write_field_begin("notFound", 1, ttype::STRUCT).unwrap();
            not_found.write(p).unwrap();
            p.write_field_end().unwrap();
        });
        let mut client = SearchClient::new(protocol);

        assert!(matches!(
            Search::find(&mut client, query, None),
            Err(CallError::Exception(SearchFindError::NotFound(_)))
        ));
    }
}
