//! Laws every generated value type must satisfy, checked over generated
//! values rather than hand-picked ones.

use idlc_runtime::{BinaryProtocol, BuildError, ThriftHash, ThriftStruct};
use proptest::collection::{hash_map, vec};
use proptest::option;
use proptest::prelude::*;

use crate::demo::search::Query;
use crate::demo::{Color, Input, Node, Value};

fn round_trip<T: ThriftStruct>(value: &T) -> T {
    let mut out = BinaryProtocol::new();
    value.write(&mut out).unwrap();
    T::read(&mut BinaryProtocol::with_input(out.into_output())).unwrap()
}

fn arb_color() -> impl Strategy<Value = Color> {
    prop_oneof![Just(Color::Red), Just(Color::Green), Just(Color::DarkBlue)]
}

fn arb_input() -> impl Strategy<Value = Input> {
    (
        "\\PC{0,12}",
        option::of(arb_color()),
        option::of(vec("[a-z]{0,6}", 0..4)),
        option::of(hash_map("[a-z]{1,6}", -1.0e6..1.0e6f64, 0..4)),
    )
        .prop_map(|(name, color, tags, weights)| {
            let mut builder = Input::builder().name(name);
            if let Some(color) = color {
                builder = builder.color(color);
            }
            if let Some(tags) = tags {
                builder = builder.tags(tags);
            }
            if let Some(weights) = weights {
                builder = builder.weights(weights);
            }
            builder.build().unwrap()
        })
}

fn arb_query() -> impl Strategy<Value = Query> {
    ("\\PC{0,24}", any::<i64>(), arb_input()).prop_map(|(text, newer_than, input)| {
        Query::builder()
            .text(text)
            .results_newer_than(newer_than)
            .input(input)
            .build()
            .unwrap()
    })
}

/// Small value range so equal pairs actually come up.
fn arb_node() -> impl Strategy<Value = Node> {
    let leaf = (0..3i32).prop_map(|value| Node::builder().value(value).build().unwrap());
    leaf.prop_recursive(4, 24, 3, |inner| {
        (0..3i32, option::of(inner.clone()), option::of(vec(inner, 0..3))).prop_map(
            |(value, next, children)| {
                let mut builder = Node::builder().value(value);
                if let Some(next) = next {
                    builder = builder.next(next);
                }
                if let Some(children) = children {
                    builder = builder.children(children);
                }
                builder.build().unwrap()
            },
        )
    })
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-c]{0,2}".prop_map(|text| Value::builder().text(text).build().unwrap()),
        (0..4i64).prop_map(|number| Value::builder().number(number).build().unwrap()),
        any::<bool>().prop_map(|flag| Value::builder().flag(flag).build().unwrap()),
    ]
}

proptest! {
    #[test]
    fn prop_query_round_trips(query in arb_query()) {
        prop_assert_eq!(round_trip(&query), query);
    }

    #[test]
    fn prop_input_round_trips(input in arb_input()) {
        prop_assert_eq!(round_trip(&input), input);
    }

    #[test]
    fn prop_node_round_trips(node in arb_node()) {
        prop_assert_eq!(round_trip(&node), node);
    }

    #[test]
    fn prop_value_round_trips(value in arb_value()) {
        prop_assert_eq!(round_trip(&value), value);
    }

    #[test]
    fn prop_to_builder_preserves_value(query in arb_query()) {
        prop_assert_eq!(query.to_builder().build().unwrap(), query);
    }

    #[test]
    fn prop_equal_nodes_hash_alike(a in arb_node(), b in arb_node()) {
        prop_assert_eq!(a.thrift_hash(), a.clone().thrift_hash());
        if a == b {
            prop_assert_eq!(a.thrift_hash(), b.thrift_hash());
        }
    }

    #[test]
    fn prop_equal_unions_hash_alike(a in arb_value(), b in arb_value()) {
        if a == b {
            prop_assert_eq!(a.thrift_hash(), b.thrift_hash());
        }
    }

    #[test]
    fn prop_equal_queries_hash_alike(query in arb_query()) {
        let decoded = round_trip(&query);
        prop_assert_eq!(&decoded, &query);
        prop_assert_eq!(decoded.thrift_hash(), query.thrift_hash());
    }

    #[test]
    fn prop_unions_need_exactly_one_field(
        text in option::of("[a-z]{0,4}"),
        number in option::of(any::<i64>()),
        flag in option::of(any::<bool>()),
    ) {
        let set_fields = usize::from(text.is_some())
            + usize::from(number.is_some())
            + usize::from(flag.is_some());

        let mut builder = Value::builder();
        if let Some(text) = text {
            builder = builder.text(text);
        }
        if let Some(number) = number {
            builder = builder.number(number);
        }
        if let Some(flag) = flag {
            builder = builder.flag(flag);
        }

        match builder.build() {
            Ok(_) => prop_assert_eq!(set_fields, 1),
            Err(err) => {
                prop_assert_ne!(set_fields, 1);
                prop_assert_eq!(err, BuildError::InvalidUnionState { set_fields });
            }
        }
    }
}
