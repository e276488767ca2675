//! Property tests: a value sent over the wire comes back unchanged.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use proptest::prelude::*;

use mgbolt::bolt::packstream::{decode, encode};
use mgbolt::bolt::BoltVersion;
use mgbolt::value::{
    Duration, Node, OffsetTime, Path, Point, Relationship, UnboundRelationship, Value, ZoneBasis,
    ZonedDateTime,
};

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;
const MAX_OFFSET: i32 = 18 * 3600;

fn arb_scalar() -> BoxedStrategy<Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Boolean),
        any::<i64>().prop_map(Value::Integer),
        prop::num::f64::NORMAL.prop_map(Value::Float),
        ".{0,24}".prop_map(Value::String),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::Bytes),
    ]
    .boxed()
}

fn arb_props() -> impl Strategy<Value = HashMap<String, Value>> {
    prop::collection::hash_map("[a-z_]{1,8}", arb_scalar(), 0..4)
}

fn arb_temporal(version: BoltVersion) -> BoxedStrategy<Value> {
    let basis = if version.uses_utc_datetime() {
        ZoneBasis::Utc
    } else {
        ZoneBasis::Local
    };
    prop_oneof![
        (-200_000i32..200_000).prop_filter_map("date out of range", |days| {
            NaiveDate::from_num_days_from_ce_opt(UNIX_EPOCH_DAYS_FROM_CE + days).map(Value::Date)
        }),
        (0u32..86_400, 0u32..1_000_000_000, -MAX_OFFSET..=MAX_OFFSET).prop_filter_map(
            "time out of range",
            |(secs, nanos, offset)| {
                NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
                    .map(|t| Value::Time(OffsetTime::new(t, offset)))
            }
        ),
        (0u32..86_400, 0u32..1_000_000_000).prop_filter_map("time out of range", |(secs, nanos)| {
            NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).map(Value::LocalTime)
        }),
        (-10_000_000_000i64..10_000_000_000, 0u32..1_000_000_000, -MAX_OFFSET..=MAX_OFFSET).prop_filter_map(
            "datetime out of range",
            |(secs, nanos, offset)| {
                let offset = FixedOffset::east_opt(offset)?;
                DateTime::from_timestamp(secs, nanos).map(|dt| Value::DateTime(dt.with_timezone(&offset)))
            }
        ),
        (-10_000_000_000i64..10_000_000_000, 0u32..1_000_000_000).prop_filter_map(
            "datetime out of range",
            |(secs, nanos)| DateTime::from_timestamp(secs, nanos).map(|dt| Value::LocalDateTime(dt.naive_utc()))
        ),
        (any::<i64>(), 0i64..1_000_000_000, "[A-Z][a-z]{2,8}/[A-Z][a-z]{2,8}")
            .prop_map(move |(secs, nanos, zone)| Value::DateTimeZoneId(ZonedDateTime::new(secs, nanos, &zone, basis))),
        (any::<i64>(), any::<i64>(), any::<i64>(), any::<i32>())
            .prop_map(|(m, d, s, n)| Value::Duration(Duration::new(m, d, s, n))),
        (any::<i32>(), prop::num::f64::NORMAL, prop::num::f64::NORMAL, prop::option::of(prop::num::f64::NORMAL))
            .prop_map(|(srid, x, y, z)| Value::Point(Point { srid, x, y, z })),
    ]
    .boxed()
}

fn element_id(version: BoltVersion, id: i64) -> Option<String> {
    version.uses_element_ids().then(|| format!("4:mg:{}", id))
}

fn arb_node(version: BoltVersion) -> impl Strategy<Value = Node> {
    (any::<i64>(), prop::collection::vec("[A-Z][a-zA-Z]{0,8}", 0..3), arb_props()).prop_map(
        move |(id, labels, props)| {
            let mut node = Node::new(id, labels, props);
            node.element_id = element_id(version, id);
            node
        },
    )
}

fn arb_unbound(version: BoltVersion) -> impl Strategy<Value = UnboundRelationship> {
    (any::<i64>(), "[A-Z_]{1,10}", arb_props()).prop_map(move |(id, rel_type, props)| {
        let mut rel = UnboundRelationship::new(id, &rel_type, props);
        rel.element_id = element_id(version, id);
        rel
    })
}

fn arb_graph(version: BoltVersion) -> BoxedStrategy<Value> {
    let relationship = (any::<i64>(), any::<i64>(), any::<i64>(), "[A-Z_]{1,10}", arb_props()).prop_map(
        move |(id, start, end, rel_type, props)| {
            let mut rel = Relationship::new(id, start, end, &rel_type, props);
            rel.element_id = element_id(version, id);
            rel.start_node_element_id = element_id(version, start);
            rel.end_node_element_id = element_id(version, end);
            Value::Relationship(rel)
        },
    );
    let path = (
        prop::collection::vec(arb_node(version), 1..4),
        prop::collection::vec(arb_unbound(version), 3),
        prop::collection::vec(any::<bool>(), 3),
    )
        .prop_map(|(nodes, mut rels, reversed)| {
            rels.truncate(nodes.len() - 1);
            let sequence = (1..nodes.len() as i64)
                .flat_map(|i| {
                    let rel = if reversed[i as usize - 1] { -i } else { i };
                    [rel, i]
                })
                .collect();
            Value::Path(Path::new(nodes, rels, sequence).expect("valid path"))
        });

    prop_oneof![
        arb_node(version).prop_map(Value::Node),
        relationship,
        arb_unbound(version).prop_map(Value::UnboundRelationship),
        path,
    ]
    .boxed()
}

fn arb_value(version: BoltVersion) -> BoxedStrategy<Value> {
    let leaf = prop_oneof![
        3 => arb_scalar(),
        2 => arb_temporal(version),
        1 => arb_graph(version),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::hash_map("[a-z]{1,6}", inner, 0..4).prop_map(Value::Map),
        ]
    })
    .boxed()
}

fn round_trip(value: &Value, version: BoltVersion) -> Value {
    let wire = value.to_packstream(version).expect("to packstream");
    let bytes = encode(&wire).expect("encode");
    Value::from_packstream(decode(&bytes).expect("decode")).expect("from packstream")
}

proptest! {
    #[test]
    fn prop_value_round_trip_bolt_4_4(value in arb_value(BoltVersion::V4_4)) {
        prop_assert_eq!(round_trip(&value, BoltVersion::V4_4), value);
    }

    #[test]
    fn prop_value_round_trip_bolt_5_2(value in arb_value(BoltVersion::V5_2)) {
        prop_assert_eq!(round_trip(&value, BoltVersion::V5_2), value);
    }

    #[test]
    fn prop_bool_accessor_on_integer_always_panics(i in any::<i64>()) {
        let value = Value::Integer(i);
        prop_assert_eq!(value.as_bool(), None);
        let result = std::panic::catch_unwind(|| value.expect_bool());
        prop_assert!(result.is_err());
    }
}
