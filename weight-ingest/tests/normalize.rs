use serde_json::{json, Value};
use weight_core::{distinct_subjects, TrackerConfig, TrackerError};
use weight_ingest::{
    coerce_subject_id, coerce_timestamp, coerce_weight, dynamic_value, load_rows, normalize,
    rows_from_csv_str, rows_from_json_str, to_raw_row, RawRow,
};

fn row(value: Value) -> RawRow {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn weighing(date: &str, subject: Value, weight: Value) -> RawRow {
    row(json!({ "Timestamp": date, "mango_no": subject, "Weight (g)": weight }))
}

#[test]
fn accepted_rows_keep_source_order_and_unique_ids() {
    let rows = vec![
        weighing("10-01-2024", json!(5), json!(450)),
        weighing("01-01-2024", json!(5), json!(500)),
        weighing("01-01-2024", json!(5), json!(500)),
        weighing("03-01-2024", json!(7), json!(320.5)),
    ];
    let observations = normalize(&rows, &TrackerConfig::default());

    let dates: Vec<&str> = observations.iter().map(|o| o.date.as_str()).collect();
    assert_eq!(dates, ["10-01-2024", "01-01-2024", "01-01-2024", "03-01-2024"]);

    let mut ids: Vec<&str> = observations.iter().map(|o| o.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
    assert_eq!(observations[3].weight, 320.5);
    assert_eq!(observations[3].subject_id, 7);
}

#[test]
fn malformed_rows_are_dropped_silently() {
    let rows = vec![
        weighing("", json!(5), json!(450)),
        row(json!({ "mango_no": 5, "Weight (g)": 450 })),
        weighing("01-01-2024", json!(5), Value::Null),
        weighing("01-01-2024", json!(5), json!("")),
        weighing("01-01-2024", json!(5), json!("heavy")),
        row(json!({ "Timestamp": "01-01-2024", "mango_no": 5 })),
        weighing("01-01-2024", Value::Null, json!(450)),
        weighing("01-01-2024", json!("five"), json!(450)),
        weighing("01-01-2024", json!(-5), json!(450)),
        weighing("01-01-2024", json!(5.5), json!(450)),
        weighing("2024-01-01", json!(5), json!(450)),
        weighing("32-01-2024", json!(5), json!(450)),
        row(json!({ "Timestamp": 20240101, "mango_no": 5, "Weight (g)": 450 })),
        row(json!({})),
        weighing("02-01-2024", json!(5), json!(440)),
    ];
    let observations = normalize(&rows, &TrackerConfig::default());

    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].date, "02-01-2024");
    assert_eq!(observations[0].id, "02-01-2024-5-14");
}

#[test]
fn excluded_subjects_never_reach_subject_list() {
    let mut rows: Vec<RawRow> = (1..=20)
        .map(|day| weighing(&format!("{day:02}-01-2024"), json!(33), json!(400)))
        .collect();
    rows.push(weighing("01-01-2024", json!(0), json!(400)));
    rows.push(weighing("01-01-2024", json!("34"), json!(400)));
    rows.push(weighing("01-01-2024", json!(3), json!(400)));

    let dataset = load_rows(&rows, &TrackerConfig::default());
    assert_eq!(dataset.subjects, vec![3]);
    assert_eq!(dataset.len(), 1);
}

#[test]
fn custom_config_changes_fields_and_exclusions() {
    let config = TrackerConfig {
        excluded_subjects: vec![1],
        timestamp_field: "day".to_string(),
        subject_field: "tag".to_string(),
        weight_field: "grams".to_string(),
        ..TrackerConfig::default()
    };
    let rows = vec![
        row(json!({ "day": "01-01-2024", "tag": 1, "grams": 10 })),
        row(json!({ "day": "01-01-2024", "tag": 33, "grams": 10 })),
        row(json!({ "Timestamp": "01-01-2024", "mango_no": 4, "Weight (g)": 10 })),
    ];
    let observations = normalize(&rows, &config);
    assert_eq!(distinct_subjects(&observations), vec![33]);
}

#[test]
fn normalize_is_idempotent_after_reserializing() {
    let config = TrackerConfig::default();
    let rows = vec![
        weighing("01-01-2024", json!(5), json!(500)),
        weighing("", json!(5), json!(500)),
        weighing("05-01-2024", json!("12"), json!("481.25")),
        weighing("05-01-2024", json!(33), json!(481)),
    ];
    let first = normalize(&rows, &config);
    let reserialized: Vec<RawRow> = first.iter().map(|o| to_raw_row(o, &config)).collect();
    let second = normalize(&reserialized, &config);

    let key = |o: &weight_core::Observation| (o.subject_id, o.date.clone(), o.weight);
    assert_eq!(
        first.iter().map(key).collect::<Vec<_>>(),
        second.iter().map(key).collect::<Vec<_>>()
    );
}

#[test]
fn coercions_accept_loose_values() {
    assert_eq!(coerce_subject_id(&json!(12)), Some(12));
    assert_eq!(coerce_subject_id(&json!(12.0)), Some(12));
    assert_eq!(coerce_subject_id(&json!(" 12 ")), Some(12));
    assert_eq!(coerce_subject_id(&json!(12.5)), None);
    assert_eq!(coerce_subject_id(&json!(-1)), None);
    assert_eq!(coerce_subject_id(&json!(true)), None);

    assert_eq!(coerce_weight(&json!(450)), Some(450.0));
    assert_eq!(coerce_weight(&json!(" 450.5 ")), Some(450.5));
    assert_eq!(coerce_weight(&json!("NaN")), None);
    assert_eq!(coerce_weight(&json!("inf")), None);
    assert_eq!(coerce_weight(&json!([450])), None);

    assert_eq!(coerce_timestamp(&json!(" 01-01-2024 ")), Some("01-01-2024".to_string()));
    assert_eq!(coerce_timestamp(&json!("  ")), None);
    assert_eq!(coerce_timestamp(&json!(1)), None);
}

#[test]
fn csv_cells_are_dynamically_typed() {
    assert_eq!(dynamic_value(""), Value::Null);
    assert_eq!(dynamic_value("  "), Value::Null);
    assert_eq!(dynamic_value("true"), json!(true));
    assert_eq!(dynamic_value("12"), json!(12));
    assert_eq!(dynamic_value("-3.5"), json!(-3.5));
    assert_eq!(dynamic_value("01-02-2024"), json!("01-02-2024"));
    assert_eq!(dynamic_value("NaN"), json!("NaN"));
}

#[test]
fn csv_reader_maps_headers_and_skips_blank_lines() {
    let text = "Timestamp, mango_no ,Weight (g)\n01-01-2024,5,500\n\n,,\n02-01-2024,6\n";
    let rows = rows_from_csv_str(text).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["mango_no"], json!(5));
    assert_eq!(rows[0]["Weight (g)"], json!(500));
    assert!(!rows[1].contains_key("Weight (g)"));
}

#[test]
fn json_rows_require_an_array() {
    let rows = rows_from_json_str(r#"[{"Timestamp":"01-01-2024"}, 3, {"mango_no": 2}]"#).unwrap();
    assert_eq!(rows.len(), 2);

    assert!(matches!(
        rows_from_json_str(r#"{"Timestamp":"01-01-2024"}"#),
        Err(TrackerError::Parse(_))
    ));
    assert!(matches!(rows_from_json_str("not json"), Err(TrackerError::Parse(_))));
}
