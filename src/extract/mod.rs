//! Field extraction: turns event records into per-series rows.
//!
//! Every record resolves to exactly one [`EventPolicy`]:
//! - `Flat` passes the whole payload through as one row
//! - `Decompose` emits one row per configured field, keyed `name:field`,
//!   or `name:field:partial` for first-element projections

pub mod policy;

pub use policy::{EventPolicy, FieldRule, PolicyTable, SeriesKey};

use crate::parser::{EventRecord, Mapping, Timestamp, Value};

/// One row destined for one series
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRow {
    pub key: SeriesKey,
    pub time: Timestamp,
    pub row: Mapping,
}

/// Extract the rows a record contributes, per its resolved policy
///
/// Absent fields never fail extraction: they produce an empty row, which
/// the pivot stage fills with missing markers.
pub fn extract(record: &EventRecord, policies: &PolicyTable) -> Vec<ExtractedRow> {
    match policies.resolve(&record.name) {
        EventPolicy::Flat => vec![ExtractedRow {
            key: SeriesKey::flat(&record.name),
            time: record.time,
            row: record.data.clone(),
        }],
        EventPolicy::Decompose(rules) => rules
            .iter()
            .map(|rule| ExtractedRow {
                key: rule.series_key(&record.name),
                time: record.time,
                row: project(rule, record.data.get(rule.field())),
            })
            .collect(),
    }
}

fn project(rule: &FieldRule, value: Option<&Value>) -> Mapping {
    match (rule, value) {
        (_, None) => Mapping::new(),
        (FieldRule::First(field), Some(Value::Sequence(items))) => items
            .first()
            .map(|head| to_row(field, head))
            .unwrap_or_default(),
        (rule, Some(value)) => to_row(rule.field(), value),
    }
}

/// Shape one value as a row.
///
/// Mappings are used as-is, sequences are keyed by position, and a bare
/// scalar becomes a single column named after its field.
fn to_row(field: &str, value: &Value) -> Mapping {
    match value {
        Value::Mapping(map) => map.clone(),
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| (i.to_string(), item.clone()))
            .collect(),
        Value::Missing => Mapping::new(),
        scalar @ Value::Scalar(_) => Mapping::from([(field.to_string(), scalar.clone())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::value::mapping_from_json;
    use serde_json::json;

    fn record(name: &str, time: f64, data: serde_json::Value) -> EventRecord {
        let serde_json::Value::Object(obj) = data else {
            panic!("fixture data must be an object");
        };
        EventRecord {
            time: Timestamp::new(time).unwrap(),
            name: name.to_string(),
            data: mapping_from_json(obj),
            line: 2,
        }
    }

    fn row(value: serde_json::Value) -> Mapping {
        match Value::from(value) {
            Value::Mapping(map) => map,
            other => panic!("not a mapping: {:?}", other),
        }
    }

    #[test]
    fn test_flat_passes_payload_through() {
        let rec = record("recovery:metrics_updated", 1.0, json!({"cwnd": 12000, "rtt": 3.2}));
        let rows = extract(&rec, &PolicyTable::new());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key.as_str(), "recovery:metrics_updated");
        assert_eq!(rows[0].row, rec.data);
    }

    #[test]
    fn test_decompose_and_first() {
        let table = PolicyTable::new().with(
            "X",
            EventPolicy::decompose(["header", "frames"]).with_first(["frames"]),
        );
        let rec = record(
            "X",
            3.0,
            json!({"header": {"id": 7}, "frames": [{"type": "ack"}, {"type": "stream"}]}),
        );
        let rows = extract(&rec, &table);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key.as_str(), "X:header");
        assert_eq!(rows[0].row, row(json!({"id": 7})));
        assert_eq!(rows[1].key.as_str(), "X:frames:partial");
        assert_eq!(rows[1].row, row(json!({"type": "ack"})));
    }

    #[test]
    fn test_absent_field_yields_empty_row() {
        let table = PolicyTable::new().with("X", EventPolicy::decompose(["header"]).with_first(["frames"]));
        let rows = extract(&record("X", 1.0, json!({})), &table);

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.row.is_empty()));
    }

    #[test]
    fn test_first_of_empty_sequence() {
        let table = PolicyTable::new().with("X", EventPolicy::decompose_first(["frames"]));
        let rows = extract(&record("X", 1.0, json!({"frames": []})), &table);
        assert!(rows[0].row.is_empty());
    }

    #[test]
    fn test_scalar_and_sequence_fields() {
        let table = PolicyTable::new().with("X", EventPolicy::decompose(["size", "list"]));
        let rows = extract(&record("X", 1.0, json!({"size": 1200, "list": [4, 5]})), &table);

        assert_eq!(rows[0].row, row(json!({"size": 1200})));
        assert_eq!(rows[1].row, row(json!({"0": 4, "1": 5})));
    }

    #[test]
    fn test_first_on_scalar_sequence() {
        let table = PolicyTable::new().with("X", EventPolicy::decompose_first(["acked"]));
        let rows = extract(&record("X", 1.0, json!({"acked": [9, 10]})), &table);
        assert_eq!(rows[0].row, row(json!({"acked": 9})));
    }
}
