//! Conversion between [`Value`] and [`PackStreamValue`].
//!
//! Decoding accepts every structure layout of the supported protocol
//! versions (with or without element ids, legacy or UTC datetimes).
//! Encoding picks the layout for the negotiated version.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use super::{
    Duration, Node, OffsetTime, Path, Point, Relationship, UnboundRelationship, Value, ZoneBasis,
    ZonedDateTime,
};
use crate::bolt::handshake::BoltVersion;
use crate::bolt::packstream::{tag, Fields, PackStreamError, PackStreamStructure, PackStreamValue};

/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

fn invalid(msg: String) -> PackStreamError {
    PackStreamError::InvalidStructure(msg)
}

impl Value {
    /// Convert a decoded PackStream value.
    ///
    /// Unknown structure tags and out-of-range temporal fields are errors.
    pub fn from_packstream(value: PackStreamValue) -> Result<Value, PackStreamError> {
        Ok(match value {
            PackStreamValue::Null => Value::Null,
            PackStreamValue::Boolean(b) => Value::Boolean(b),
            PackStreamValue::Integer(i) => Value::Integer(i),
            PackStreamValue::Float(f) => Value::Float(f),
            PackStreamValue::Bytes(b) => Value::Bytes(b),
            PackStreamValue::String(s) => Value::String(s),
            PackStreamValue::List(items) => Value::List(
                items
                    .into_iter()
                    .map(Value::from_packstream)
                    .collect::<Result<_, _>>()?,
            ),
            PackStreamValue::Map(map) => Value::Map(properties(map)?),
            PackStreamValue::Structure(s) => from_structure(s)?,
        })
    }

    /// Encode for `version`.
    ///
    /// Fails only for a [`ZonedDateTime`] whose seconds are counted on a
    /// different basis than `version` uses.
    pub fn to_packstream(&self, version: BoltVersion) -> Result<PackStreamValue, PackStreamError> {
        let structure = |tag: u8, fields: Vec<PackStreamValue>| {
            PackStreamValue::Structure(PackStreamStructure::new(tag, fields))
        };

        Ok(match self {
            Value::Null => PackStreamValue::Null,
            Value::Boolean(b) => PackStreamValue::Boolean(*b),
            Value::Integer(i) => PackStreamValue::Integer(*i),
            Value::Float(f) => PackStreamValue::Float(*f),
            Value::String(s) => PackStreamValue::String(s.clone()),
            Value::Bytes(b) => PackStreamValue::Bytes(b.clone()),
            Value::List(items) => PackStreamValue::List(
                items
                    .iter()
                    .map(|v| v.to_packstream(version))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Map(map) => PackStreamValue::Map(to_packstream_map(map, version)?),
            Value::Node(n) => node_to_packstream(n, version)?,
            Value::Relationship(r) => {
                let mut fields = vec![
                    PackStreamValue::Integer(r.id),
                    PackStreamValue::Integer(r.start_node_id),
                    PackStreamValue::Integer(r.end_node_id),
                    PackStreamValue::from(r.rel_type.as_str()),
                    PackStreamValue::Map(to_packstream_map(&r.properties, version)?),
                ];
                if version.uses_element_ids() {
                    fields.push(element_id(&r.element_id, r.id));
                    fields.push(element_id(&r.start_node_element_id, r.start_node_id));
                    fields.push(element_id(&r.end_node_element_id, r.end_node_id));
                }
                structure(tag::RELATIONSHIP, fields)
            }
            Value::UnboundRelationship(r) => unbound_to_packstream(r, version)?,
            Value::Path(p) => structure(
                tag::PATH,
                vec![
                    PackStreamValue::List(
                        p.nodes()
                            .iter()
                            .map(|n| node_to_packstream(n, version))
                            .collect::<Result<_, _>>()?,
                    ),
                    PackStreamValue::List(
                        p.relationships()
                            .iter()
                            .map(|r| unbound_to_packstream(r, version))
                            .collect::<Result<_, _>>()?,
                    ),
                    PackStreamValue::List(p.sequence().iter().map(|i| PackStreamValue::Integer(*i)).collect()),
                ],
            ),
            Value::Date(d) => structure(
                tag::DATE,
                vec![PackStreamValue::Integer(
                    d.num_days_from_ce() as i64 - UNIX_EPOCH_DAYS_FROM_CE,
                )],
            ),
            Value::Time(t) => structure(
                tag::TIME,
                vec![
                    PackStreamValue::Integer(nanos_of_day(&t.time)),
                    PackStreamValue::Integer(t.offset_seconds as i64),
                ],
            ),
            Value::LocalTime(t) => structure(tag::LOCAL_TIME, vec![PackStreamValue::Integer(nanos_of_day(t))]),
            Value::DateTime(dt) => {
                let offset = dt.offset().local_minus_utc() as i64;
                let (tag, seconds) = if version.uses_utc_datetime() {
                    (tag::DATE_TIME_UTC, dt.timestamp())
                } else {
                    (tag::DATE_TIME, dt.timestamp() + offset)
                };
                structure(
                    tag,
                    vec![
                        PackStreamValue::Integer(seconds),
                        PackStreamValue::Integer(dt.timestamp_subsec_nanos() as i64),
                        PackStreamValue::Integer(offset),
                    ],
                )
            }
            Value::DateTimeZoneId(z) => {
                let tag = match (z.basis, version.uses_utc_datetime()) {
                    (ZoneBasis::Utc, true) => tag::DATE_TIME_ZONE_ID_UTC,
                    (ZoneBasis::Local, false) => tag::DATE_TIME_ZONE_ID,
                    (basis, _) => {
                        return Err(invalid(format!(
                            "{:?}-based zoned datetime cannot be sent over Bolt {}",
                            basis, version
                        )))
                    }
                };
                structure(
                    tag,
                    vec![
                        PackStreamValue::Integer(z.seconds),
                        PackStreamValue::Integer(z.nanoseconds),
                        PackStreamValue::from(z.zone_id.as_str()),
                    ],
                )
            }
            Value::LocalDateTime(dt) => {
                let utc = dt.and_utc();
                structure(
                    tag::LOCAL_DATE_TIME,
                    vec![
                        PackStreamValue::Integer(utc.timestamp()),
                        PackStreamValue::Integer(utc.timestamp_subsec_nanos() as i64),
                    ],
                )
            }
            Value::Duration(d) => structure(
                tag::DURATION,
                vec![
                    PackStreamValue::Integer(d.months),
                    PackStreamValue::Integer(d.days),
                    PackStreamValue::Integer(d.seconds),
                    PackStreamValue::Integer(d.nanoseconds as i64),
                ],
            ),
            Value::Point(p) => {
                let mut fields = vec![
                    PackStreamValue::Integer(p.srid as i64),
                    PackStreamValue::Float(p.x),
                    PackStreamValue::Float(p.y),
                ];
                match p.z {
                    Some(z) => {
                        fields.push(PackStreamValue::Float(z));
                        structure(tag::POINT_3D, fields)
                    }
                    None => structure(tag::POINT_2D, fields),
                }
            }
        })
    }
}

/// Encode a parameter or property map for `version`.
pub fn to_packstream_map(
    map: &HashMap<String, Value>,
    version: BoltVersion,
) -> Result<HashMap<String, PackStreamValue>, PackStreamError> {
    map.iter()
        .map(|(k, v)| Ok((k.clone(), v.to_packstream(version)?)))
        .collect()
}

fn properties(map: HashMap<String, PackStreamValue>) -> Result<HashMap<String, Value>, PackStreamError> {
    map.into_iter()
        .map(|(k, v)| Ok((k, Value::from_packstream(v)?)))
        .collect()
}

fn element_id(id: &Option<String>, fallback: i64) -> PackStreamValue {
    PackStreamValue::String(id.clone().unwrap_or_else(|| fallback.to_string()))
}

fn node_to_packstream(n: &Node, version: BoltVersion) -> Result<PackStreamValue, PackStreamError> {
    let mut fields = vec![
        PackStreamValue::Integer(n.id),
        PackStreamValue::List(n.labels.iter().map(|l| PackStreamValue::from(l.as_str())).collect()),
        PackStreamValue::Map(to_packstream_map(&n.properties, version)?),
    ];
    if version.uses_element_ids() {
        fields.push(element_id(&n.element_id, n.id));
    }
    Ok(PackStreamValue::Structure(PackStreamStructure::new(tag::NODE, fields)))
}

fn unbound_to_packstream(
    r: &UnboundRelationship,
    version: BoltVersion,
) -> Result<PackStreamValue, PackStreamError> {
    let mut fields = vec![
        PackStreamValue::Integer(r.id),
        PackStreamValue::from(r.rel_type.as_str()),
        PackStreamValue::Map(to_packstream_map(&r.properties, version)?),
    ];
    if version.uses_element_ids() {
        fields.push(element_id(&r.element_id, r.id));
    }
    Ok(PackStreamValue::Structure(PackStreamStructure::new(
        tag::UNBOUND_RELATIONSHIP,
        fields,
    )))
}

fn nanos_of_day(t: &NaiveTime) -> i64 {
    t.num_seconds_from_midnight() as i64 * NANOS_PER_SECOND + t.nanosecond() as i64
}

fn from_structure(s: PackStreamStructure) -> Result<Value, PackStreamError> {
    match s.tag {
        tag::NODE => node_from(s).map(Value::Node),
        tag::RELATIONSHIP => {
            let mut f = Fields::new("Relationship", s, 5..=8)?;
            let mut rel = Relationship::new(
                f.int("id")?,
                f.int("start_node_id")?,
                f.int("end_node_id")?,
                "",
                HashMap::new(),
            );
            rel.rel_type = f.string("type")?;
            rel.properties = properties(f.map("properties")?)?;
            rel.element_id = f.optional_string("element_id")?;
            rel.start_node_element_id = f.optional_string("start_node_element_id")?;
            rel.end_node_element_id = f.optional_string("end_node_element_id")?;
            Ok(Value::Relationship(rel))
        }
        tag::UNBOUND_RELATIONSHIP => unbound_from(s).map(Value::UnboundRelationship),
        tag::PATH => {
            let mut f = Fields::new("Path", s, 3..=3)?;
            let nodes = f
                .list("nodes")?
                .into_iter()
                .map(|v| match v {
                    PackStreamValue::Structure(s) if s.tag == tag::NODE => node_from(s),
                    other => Err(invalid(format!("Path nodes must be Node, got {}", other.type_name()))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            let relationships = f
                .list("relationships")?
                .into_iter()
                .map(|v| match v {
                    PackStreamValue::Structure(s) if s.tag == tag::UNBOUND_RELATIONSHIP => unbound_from(s),
                    other => Err(invalid(format!(
                        "Path relationships must be UnboundRelationship, got {}",
                        other.type_name()
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            let sequence = f
                .list("sequence")?
                .into_iter()
                .map(|v| {
                    v.as_int()
                        .ok_or_else(|| invalid("Path sequence must hold integers".to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Path::new(nodes, relationships, sequence)
                .map(Value::Path)
                .ok_or_else(|| invalid("Path sequence points outside its nodes or relationships".to_string()))
        }
        tag::DATE => {
            let mut f = Fields::new("Date", s, 1..=1)?;
            let days = f.int("days")?;
            days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
                .and_then(|d| i32::try_from(d).ok())
                .and_then(NaiveDate::from_num_days_from_ce_opt)
                .map(Value::Date)
                .ok_or_else(|| invalid(format!("Date out of range: {} days", days)))
        }
        tag::TIME => {
            let mut f = Fields::new("Time", s, 2..=2)?;
            let time = time_from_nanos(f.int("nanoseconds")?)?;
            let offset = f.int("tz_offset_seconds")?;
            let offset_seconds =
                i32::try_from(offset).map_err(|_| invalid(format!("Time offset out of range: {}", offset)))?;
            Ok(Value::Time(OffsetTime::new(time, offset_seconds)))
        }
        tag::LOCAL_TIME => {
            let mut f = Fields::new("LocalTime", s, 1..=1)?;
            time_from_nanos(f.int("nanoseconds")?).map(Value::LocalTime)
        }
        tag::DATE_TIME | tag::DATE_TIME_UTC => {
            let utc_based = s.tag == tag::DATE_TIME_UTC;
            let mut f = Fields::new("DateTime", s, 3..=3)?;
            let seconds = f.int("seconds")?;
            let nanos = f.int("nanoseconds")?;
            let offset = f.int("tz_offset_seconds")?;
            datetime_from(seconds, nanos, offset, utc_based)
                .map(Value::DateTime)
                .ok_or_else(|| invalid(format!("DateTime out of range: {}s {}ns {:+}s", seconds, nanos, offset)))
        }
        tag::DATE_TIME_ZONE_ID | tag::DATE_TIME_ZONE_ID_UTC => {
            let basis = if s.tag == tag::DATE_TIME_ZONE_ID_UTC {
                ZoneBasis::Utc
            } else {
                ZoneBasis::Local
            };
            let mut f = Fields::new("DateTimeZoneId", s, 3..=3)?;
            Ok(Value::DateTimeZoneId(ZonedDateTime {
                seconds: f.int("seconds")?,
                nanoseconds: f.int("nanoseconds")?,
                zone_id: f.string("tz_id")?,
                basis,
            }))
        }
        tag::LOCAL_DATE_TIME => {
            let mut f = Fields::new("LocalDateTime", s, 2..=2)?;
            let seconds = f.int("seconds")?;
            let nanos = f.int("nanoseconds")?;
            local_datetime_from(seconds, nanos)
                .map(Value::LocalDateTime)
                .ok_or_else(|| invalid(format!("LocalDateTime out of range: {}s {}ns", seconds, nanos)))
        }
        tag::DURATION => {
            let mut f = Fields::new("Duration", s, 4..=4)?;
            let months = f.int("months")?;
            let days = f.int("days")?;
            let seconds = f.int("seconds")?;
            let nanos = f.int("nanoseconds")?;
            let nanoseconds =
                i32::try_from(nanos).map_err(|_| invalid(format!("Duration nanoseconds out of range: {}", nanos)))?;
            Ok(Value::Duration(Duration::new(months, days, seconds, nanoseconds)))
        }
        tag::POINT_2D | tag::POINT_3D => {
            let (name, arity) = if s.tag == tag::POINT_3D {
                ("Point3D", 4..=4)
            } else {
                ("Point2D", 3..=3)
            };
            let mut f = Fields::new(name, s, arity)?;
            let srid = f.int("srid")?;
            let srid = i32::try_from(srid).map_err(|_| invalid(format!("{} srid out of range: {}", name, srid)))?;
            let x = f.float("x")?;
            let y = f.float("y")?;
            let z = if f.remaining() > 0 { Some(f.float("z")?) } else { None };
            Ok(Value::Point(Point { srid, x, y, z }))
        }
        other => Err(invalid(format!("Unknown structure tag: 0x{:02X}", other))),
    }
}

fn node_from(s: PackStreamStructure) -> Result<Node, PackStreamError> {
    let mut f = Fields::new("Node", s, 3..=4)?;
    let mut node = Node::new(f.int("id")?, f.strings("labels")?, properties(f.map("properties")?)?);
    node.element_id = f.optional_string("element_id")?;
    Ok(node)
}

fn unbound_from(s: PackStreamStructure) -> Result<UnboundRelationship, PackStreamError> {
    let mut f = Fields::new("UnboundRelationship", s, 3..=4)?;
    let id = f.int("id")?;
    let rel_type = f.string("type")?;
    let mut rel = UnboundRelationship::new(id, &rel_type, properties(f.map("properties")?)?);
    rel.element_id = f.optional_string("element_id")?;
    Ok(rel)
}

fn time_from_nanos(nanos: i64) -> Result<NaiveTime, PackStreamError> {
    let seconds = u32::try_from(nanos.div_euclid(NANOS_PER_SECOND)).ok();
    let sub = nanos.rem_euclid(NANOS_PER_SECOND) as u32;
    seconds
        .and_then(|s| NaiveTime::from_num_seconds_from_midnight_opt(s, sub))
        .ok_or_else(|| invalid(format!("Time of day out of range: {}ns", nanos)))
}

fn datetime_from(seconds: i64, nanos: i64, offset: i64, utc_based: bool) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(i32::try_from(offset).ok()?)?;
    let utc_seconds = if utc_based {
        seconds
    } else {
        seconds.checked_sub(offset.local_minus_utc() as i64)?
    };
    let utc = DateTime::from_timestamp(utc_seconds, u32::try_from(nanos).ok()?)?;
    Some(utc.with_timezone(&offset))
}

fn local_datetime_from(seconds: i64, nanos: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(seconds, u32::try_from(nanos).ok()?).map(|dt| dt.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::packstream::{decode, encode};
    use chrono::TimeZone;

    fn round_trip(value: &Value, version: BoltVersion) -> Value {
        let bytes = encode(&value.to_packstream(version).unwrap()).unwrap();
        Value::from_packstream(decode(&bytes).unwrap()).unwrap()
    }

    fn props(entries: Vec<(&str, Value)>) -> HashMap<String, Value> {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_node_from_legacy_and_element_id_layouts() {
        let legacy = PackStreamStructure::new(
            tag::NODE,
            vec![
                PackStreamValue::Integer(1),
                PackStreamValue::List(vec![PackStreamValue::from("TestLabel")]),
                PackStreamValue::Map(HashMap::new()),
            ],
        );
        let node = Value::from_packstream(PackStreamValue::Structure(legacy.clone())).unwrap();
        assert_eq!(node.expect_node().element_id, None);

        let mut modern = legacy;
        modern.fields.push(PackStreamValue::from("4:abc:1"));
        let node = Value::from_packstream(PackStreamValue::Structure(modern)).unwrap();
        assert_eq!(node.expect_node().element_id.as_deref(), Some("4:abc:1"));
    }

    #[test]
    fn test_node_layout_per_version() {
        let node = Value::Node(Node::new(1, vec!["A".to_string()], HashMap::new()));
        let v4 = node.to_packstream(BoltVersion::V4_4).unwrap();
        assert_eq!(v4.as_structure().unwrap().len(), 3);
        let v5 = node.to_packstream(BoltVersion::V5_0).unwrap();
        let s = v5.as_structure().unwrap();
        assert_eq!(s.len(), 4);
        assert_eq!(s.fields[3].as_str(), Some("1"));
    }

    #[test]
    fn test_graph_round_trip() {
        let n = Node::new(
            1,
            vec!["TestLabel".to_string()],
            props(vec![
                ("id", Value::Integer(1)),
                ("name", Value::from("test1")),
                ("is_deleted", Value::Boolean(true)),
            ]),
        );
        let r = Relationship::new(3, 1, 12, "TestRel", props(vec![("attr", Value::from("attr1"))]));
        let row = Value::List(vec![Value::Node(n), Value::Relationship(r)]);
        assert_eq!(round_trip(&row, BoltVersion::V4_4), row);
    }

    #[test]
    fn test_path_round_trip_and_validation() {
        let a = Node::new(1, vec![], HashMap::new());
        let b = Node::new(2, vec![], HashMap::new());
        let r = UnboundRelationship::new(9, "KNOWS", HashMap::new());
        let path = Value::Path(Path::new(vec![a, b], vec![r], vec![-1, 1]).unwrap());
        assert_eq!(round_trip(&path, BoltVersion::V1), path);

        let PackStreamValue::Structure(mut s) = path.to_packstream(BoltVersion::V1).unwrap() else {
            panic!("expected structure");
        };
        s.fields[2] = PackStreamValue::List(vec![PackStreamValue::Integer(2), PackStreamValue::Integer(1)]);
        assert!(Value::from_packstream(PackStreamValue::Structure(s)).is_err());
    }

    #[test]
    fn test_temporal_round_trip() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let values = vec![
            Value::Date(NaiveDate::from_ymd_opt(1969, 7, 20).unwrap()),
            Value::Time(OffsetTime::new(NaiveTime::from_hms_nano_opt(23, 59, 1, 5).unwrap(), -3600)),
            Value::LocalTime(NaiveTime::from_hms_opt(0, 0, 0).unwrap()),
            Value::DateTime(offset.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()),
            Value::LocalDateTime(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap().and_hms_opt(1, 2, 3).unwrap()),
            Value::Duration(Duration::new(14, 3, 7200, 500)),
            Value::Point(Point::new_3d(Point::WGS84_3D, 15.9, 45.8, 120.0)),
        ];
        for version in [BoltVersion::V4_4, BoltVersion::V5_0] {
            for v in &values {
                assert_eq!(&round_trip(v, version), v, "{} over Bolt {}", v, version);
            }
        }
    }

    #[test]
    fn test_datetime_wire_seconds() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let dt = Value::DateTime(offset.with_ymd_and_hms(1970, 1, 1, 1, 0, 0).unwrap());

        let legacy = dt.to_packstream(BoltVersion::V4_4).unwrap();
        let s = legacy.as_structure().unwrap();
        assert_eq!(s.tag, tag::DATE_TIME);
        assert_eq!(s.fields[0], PackStreamValue::Integer(3600));

        let utc = dt.to_packstream(BoltVersion::V5_0).unwrap();
        let s = utc.as_structure().unwrap();
        assert_eq!(s.tag, tag::DATE_TIME_UTC);
        assert_eq!(s.fields[0], PackStreamValue::Integer(0));
    }

    #[test]
    fn test_date_epoch() {
        let date = Value::Date(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap());
        let s = date.to_packstream(BoltVersion::V4_0).unwrap();
        assert_eq!(s.as_structure().unwrap().fields[0], PackStreamValue::Integer(1));
    }

    #[test]
    fn test_zoned_datetime_basis_must_match_version() {
        let local = Value::DateTimeZoneId(ZonedDateTime::new(0, 0, "Europe/Zagreb", ZoneBasis::Local));
        assert_eq!(round_trip(&local, BoltVersion::V4_4), local);
        assert!(local.to_packstream(BoltVersion::V5_0).is_err());

        let utc = Value::DateTimeZoneId(ZonedDateTime::new(0, 0, "Europe/Zagreb", ZoneBasis::Utc));
        assert_eq!(round_trip(&utc, BoltVersion::V5_2), utc);
    }

    #[test]
    fn test_out_of_range_temporal_fields() {
        let bad_time = PackStreamStructure::new(tag::LOCAL_TIME, vec![PackStreamValue::Integer(-1)]);
        assert!(Value::from_packstream(PackStreamValue::Structure(bad_time)).is_err());

        let bad_date = PackStreamStructure::new(tag::DATE, vec![PackStreamValue::Integer(i64::MAX)]);
        assert!(Value::from_packstream(PackStreamValue::Structure(bad_date)).is_err());

        let bad_offset = PackStreamStructure::new(
            tag::DATE_TIME_UTC,
            vec![
                PackStreamValue::Integer(0),
                PackStreamValue::Integer(0),
                PackStreamValue::Integer(100_000),
            ],
        );
        assert!(Value::from_packstream(PackStreamValue::Structure(bad_offset)).is_err());
    }

    #[test]
    fn test_unknown_structure() {
        let err = Value::from_packstream(PackStreamValue::Structure(PackStreamStructure::empty(0x01))).unwrap_err();
        assert_eq!(err.to_string(), "Invalid structure: Unknown structure tag: 0x01");
    }
}
