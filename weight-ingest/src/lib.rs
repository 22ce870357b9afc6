//! Tabular weight export to normalized `Observation`s.

use serde_json::{Map, Number, Value};
use tracing::{debug, info};
use weight_core::{parse_date, Dataset, Observation, SubjectId, TrackerConfig, TrackerError};

/// One loosely typed row of the export, keyed by column header.
pub type RawRow = Map<String, Value>;

/// Normalize a tabular export from CSV text into a `Dataset`.
pub fn load_csv_str(csv_text: &str, config: &TrackerConfig) -> Result<Dataset, TrackerError> {
    let rows = rows_from_csv_str(csv_text)?;
    Ok(load_rows(&rows, config))
}

/// Normalize already parsed rows into a `Dataset`.
pub fn load_rows(rows: &[RawRow], config: &TrackerConfig) -> Dataset {
    Dataset::new(normalize(rows, config))
}

/// Turn raw rows into observations, dropping every row that is malformed or
/// belongs to an excluded subject. Source order is preserved.
pub fn normalize(rows: &[RawRow], config: &TrackerConfig) -> Vec<Observation> {
    let mut observations = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        match normalize_row(row, index, config) {
            Ok(observation) => observations.push(observation),
            Err(err) => debug!(row = index, reason = %err, "dropping row"),
        }
    }

    info!(
        accepted = observations.len(),
        dropped = rows.len() - observations.len(),
        "rows normalized"
    );
    observations
}

fn normalize_row(
    row: &RawRow,
    index: usize,
    config: &TrackerConfig,
) -> Result<Observation, TrackerError> {
    let timestamp = row
        .get(&config.timestamp_field)
        .and_then(coerce_timestamp)
        .ok_or_else(|| invalid(&config.timestamp_field, "missing"))?;

    let weight = match row.get(&config.weight_field) {
        None | Some(Value::Null) => return Err(invalid(&config.weight_field, "missing")),
        Some(value) => coerce_weight(value)
            .ok_or_else(|| invalid(&config.weight_field, "not a number"))?,
    };

    let subject_id = row
        .get(&config.subject_field)
        .and_then(coerce_subject_id)
        .ok_or_else(|| invalid(&config.subject_field, "not a subject number"))?;

    if config.is_excluded(subject_id) {
        return Err(TrackerError::InvalidRow(format!(
            "subject {subject_id} is excluded"
        )));
    }

    parse_date(&timestamp)?;

    Ok(Observation {
        id: format!("{timestamp}-{subject_id}-{index}"),
        subject_id,
        date: timestamp,
        weight,
    })
}

fn invalid(field: &str, problem: &str) -> TrackerError {
    TrackerError::InvalidRow(format!("{field}: {problem}"))
}

/// Timestamp cell as text. Blank text and non string cells are rejected.
pub fn coerce_timestamp(value: &Value) -> Option<String> {
    let text = value.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Subject number from an integer, an integral float or integer text.
pub fn coerce_subject_id(value: &Value) -> Option<SubjectId> {
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_u64() {
                return SubjectId::try_from(int).ok();
            }
            let float = number.as_f64()?;
            if float.fract() == 0.0 && float >= 0.0 && float <= f64::from(SubjectId::MAX) {
                Some(float as SubjectId)
            } else {
                None
            }
        }
        Value::String(text) => text.trim().parse::<SubjectId>().ok(),
        _ => None,
    }
}

/// Finite weight from a number or numeric text.
pub fn coerce_weight(value: &Value) -> Option<f64> {
    let weight = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => parse_float_literal(text)?,
        _ => return None,
    };
    weight.is_finite().then_some(weight)
}

/// Rows from CSV text whose first record is the header.
///
/// Blank lines are skipped and short records are tolerated; missing cells
/// are simply absent from the row. Cells are typed with [`dynamic_value`].
pub fn rows_from_csv_str(csv_text: &str) -> Result<Vec<RawRow>, TrackerError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(csv_text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| TrackerError::Parse(err.to_string()))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| TrackerError::Parse(err.to_string()))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.to_string(), dynamic_value(cell)))
            .collect();
        rows.push(row);
    }

    debug!(rows = rows.len(), "csv rows read");
    Ok(rows)
}

/// Rows from a JSON array of objects. Non object entries are skipped.
pub fn rows_from_json_str(json_text: &str) -> Result<Vec<RawRow>, TrackerError> {
    let value: Value =
        serde_json::from_str(json_text).map_err(|err| TrackerError::Parse(err.to_string()))?;
    rows_from_json_value(value)
}

pub fn rows_from_json_value(value: Value) -> Result<Vec<RawRow>, TrackerError> {
    let Value::Array(entries) = value else {
        return Err(TrackerError::Parse("Expected an array of rows".to_string()));
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::Object(row) => Some(row),
            _ => None,
        })
        .collect())
}

/// Best effort typing of a CSV cell.
///
/// Empty cells become `null`, `true`/`false` become booleans, numeric
/// literals become numbers and everything else stays text.
pub fn dynamic_value(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }

    match trimmed {
        "true" | "TRUE" | "True" => return Value::Bool(true),
        "false" | "FALSE" | "False" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::Number(Number::from(int));
    }

    parse_float_literal(trimmed)
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(cell.to_string()))
}

/// Plain decimal literal such as `12`, `-3.5`, `.5` or `1e3`.
/// Words that Rust would also parse (`inf`, `NaN`) are not numbers here.
fn parse_float_literal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let is_literal = !trimmed.is_empty()
        && trimmed.bytes().any(|b| b.is_ascii_digit())
        && trimmed
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'));
    if !is_literal {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Write an observation back out as a row under the configured headers.
pub fn to_raw_row(observation: &Observation, config: &TrackerConfig) -> RawRow {
    let mut row = RawRow::new();
    row.insert(
        config.timestamp_field.clone(),
        Value::String(observation.date.clone()),
    );
    row.insert(
        config.subject_field.clone(),
        Value::Number(Number::from(observation.subject_id)),
    );
    row.insert(
        config.weight_field.clone(),
        Number::from_f64(observation.weight)
            .map(Value::Number)
            .unwrap_or(Value::Null),
    );
    row
}
