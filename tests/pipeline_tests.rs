use pretty_assertions::assert_eq;
use qlog_series::extract::{extract, EventPolicy, PolicyTable};
use qlog_series::parser::{decode, Mapping, RawLine, TraceReader, Value};
use qlog_series::utils::error::IngestError;
use qlog_series::{ingest_reader, DecodeErrorPolicy, IngestConfig};
use serde_json::json;
use std::io::Cursor;

fn mapping(value: serde_json::Value) -> Mapping {
    match Value::from(value) {
        Value::Mapping(map) => map,
        other => panic!("not a mapping: {:?}", other),
    }
}

fn event(time: f64, name: &str, data: serde_json::Value) -> String {
    json!({"time": time, "name": name, "data": data}).to_string()
}

fn trace_text(header: serde_json::Value, events: &[String]) -> String {
    let mut text = header.to_string();
    text.push('\n');
    for line in events {
        text.push_str(line);
        text.push('\n');
    }
    text
}

#[test]
fn test_header_isolation() {
    let header = json!({"qlog_version": "draft-02", "title": "isolation"});
    let events: Vec<String> = (0..25)
        .map(|i| event(i as f64, "recovery:metrics_updated", json!({"i": i})))
        .collect();
    let text = trace_text(header.clone(), &events);

    let mut reader = TraceReader::new(Cursor::new(text.into_bytes()));
    let metadata = reader.read_header().unwrap();
    let body: Vec<RawLine> = reader.stream_body().unwrap().map(|l| l.unwrap()).collect();

    assert_eq!(metadata.title(), Some("isolation"));
    assert_eq!(body.len(), 25);
    assert!(body.iter().all(|line| line.text != header.to_string()));
    assert_eq!(body[0].number, 2);
}

#[test]
fn test_dedup_keeps_first_record() {
    let text = trace_text(
        json!({}),
        &[
            event(5.0, "m", json!({"cwnd": 1})),
            event(5.0, "m", json!({"cwnd": 2, "rtt": 9})),
            event(6.0, "m", json!({"cwnd": 3})),
        ],
    );
    let trace = ingest_reader(Cursor::new(text), &IngestConfig::default()).unwrap();
    let table = trace.series("m").unwrap();

    let rows_at_5: Vec<_> = table.rows().filter(|r| r.time.as_f64() == 5.0).collect();
    assert_eq!(rows_at_5.len(), 1);
    assert_eq!(table.duplicates_dropped(), 1);

    // Same table as pivoting only the first record at t=5
    let only_first = trace_text(
        json!({}),
        &[event(5.0, "m", json!({"cwnd": 1})), event(6.0, "m", json!({"cwnd": 3}))],
    );
    let expected = ingest_reader(Cursor::new(only_first), &IngestConfig::default()).unwrap();
    let expected_table = expected.series("m").unwrap();
    assert_eq!(table.columns(), expected_table.columns());
    assert_eq!(
        table.rows().collect::<Vec<_>>(),
        expected_table.rows().collect::<Vec<_>>()
    );
}

#[test]
fn test_missing_field_is_explicit() {
    let text = trace_text(
        json!({}),
        &[event(1.0, "m", json!({"x": 1, "y": 2})), event(2.0, "m", json!({"x": 0}))],
    );
    let trace = ingest_reader(Cursor::new(text), &IngestConfig::default()).unwrap();
    let table = trace.series("m").unwrap();
    let t2 = table.times()[1];

    assert_eq!(table.len(), 2);
    assert_eq!(table.get(t2, "y"), Some(&Value::Missing));
    assert_ne!(table.get(t2, "y"), Some(&Value::from(json!(0))));
    assert_ne!(table.get(t2, "y"), Some(&Value::from(json!(""))));
    assert_eq!(table.get(t2, "x"), Some(&Value::from(json!(0))));
}

#[test]
fn test_extraction_mode_coverage() {
    let policies = PolicyTable::new().with(
        "X",
        EventPolicy::decompose(["header", "frames"]).with_first(["frames"]),
    );
    let line = RawLine {
        number: 2,
        text: event(
            1.0,
            "X",
            json!({"header": {"id": 7}, "frames": [{"type": "ack"}, {"type": "stream"}]}),
        ),
    };
    let rows = extract(&decode(&line).unwrap(), &policies);

    let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["X:header", "X:frames:partial"]);
    assert_eq!(rows[0].row, mapping(json!({"id": 7})));
    assert_eq!(rows[1].row, mapping(json!({"type": "ack"})));
}

#[test]
fn test_flat_round_trip_for_unregistered_name() {
    let payloads = [
        json!({"b": 2, "a": 1}),
        json!({"nested": {"k": [1, 2, 3]}, "flag": true}),
        json!({}),
    ];
    for (i, payload) in payloads.iter().enumerate() {
        let line = RawLine {
            number: i + 2,
            text: event(i as f64, "unregistered:event", payload.clone()),
        };
        let rows = extract(&decode(&line).unwrap(), &PolicyTable::qlog_defaults());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key.as_str(), "unregistered:event");
        assert_eq!(rows[0].row, mapping(payload.clone()));
    }
}

fn ten_valid_one_malformed() -> String {
    let mut events: Vec<String> = (0..10)
        .map(|i| event(i as f64, "m", json!({"v": i})))
        .collect();
    events.insert(4, "{\"time\": 3.5, \"name\": ".to_string());
    // Drop one valid line so there are 9 valid + 1 malformed = 10 body lines
    events.pop();
    trace_text(json!({"title": "policy"}), &events)
}

#[test]
fn test_decode_error_skip() {
    let config = IngestConfig::default().with_decode_policy(DecodeErrorPolicy::Skip);
    let trace = ingest_reader(Cursor::new(ten_valid_one_malformed()), &config).unwrap();

    assert_eq!(trace.stats.records, 9);
    assert_eq!(trace.stats.malformed, 1);
    assert_eq!(trace.series("m").unwrap().len(), 9);
}

#[test]
fn test_decode_error_abort() {
    let err = ingest_reader(
        Cursor::new(ten_valid_one_malformed()),
        &IngestConfig::default(),
    )
    .unwrap_err();

    match err {
        IngestError::MalformedRecord { line, .. } => assert_eq!(line, 6),
        other => panic!("expected MalformedRecord, got {:?}", other),
    }
}

#[test]
fn test_partial_tail_tolerated_with_skip() {
    let mut text = trace_text(json!({}), &[event(1.0, "m", json!({"v": 1}))]);
    text.push_str("{\"time\": 2, \"na");
    let config = IngestConfig::default().with_decode_policy(DecodeErrorPolicy::Skip);
    let trace = ingest_reader(Cursor::new(text), &config).unwrap();

    assert_eq!(trace.stats.records, 1);
    assert_eq!(trace.stats.malformed, 1);
}

#[test]
fn test_malformed_header_fails_regardless_of_policy() {
    let config = IngestConfig::default().with_decode_policy(DecodeErrorPolicy::Skip);
    let err = ingest_reader(Cursor::new("not a header\n{}\n"), &config).unwrap_err();
    assert!(matches!(err, IngestError::MalformedHeader { .. }));
}

#[test]
fn test_reordered_records_are_sorted() {
    let text = trace_text(
        json!({}),
        &[
            event(3.0, "m", json!({"v": 3})),
            event(1.0, "m", json!({"v": 1})),
            event(2.0, "m", json!({"v": 2})),
        ],
    );
    let trace = ingest_reader(Cursor::new(text), &IngestConfig::default()).unwrap();
    let times: Vec<f64> = trace
        .series("m")
        .unwrap()
        .times()
        .iter()
        .map(|t| t.as_f64())
        .collect();
    assert_eq!(times, vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_negative_zero_time_is_a_duplicate() {
    let text = trace_text(
        json!({}),
        &[
            event(0.0, "m", json!({"v": 1})),
            event(-0.0, "m", json!({"v": 2})),
        ],
    );
    let trace = ingest_reader(Cursor::new(text), &IngestConfig::default()).unwrap();
    let table = trace.series("m").unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(table.duplicates_dropped(), 1);
    assert_eq!(table.get(table.times()[0], "v"), Some(&Value::from(json!(1))));
}
