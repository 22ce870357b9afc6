//! Core types and derivation pipeline for per-subject weight tracking.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

mod date;
mod series;
mod tracker;

pub use date::parse_date;
pub use series::{build_chart_series, distinct_subjects, percent_change, select_series};
pub use tracker::{parse_selection, WeightTracker};

/// Integer number identifying one tracked subject.
pub type SubjectId = u32;

/// Tunables for ingestion and presentation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Subjects dropped from every derived view.
    pub excluded_subjects: Vec<SubjectId>,
    /// Number of most recent points shown in the compact chart.
    pub chart_window: usize,
    /// Column holding the `DD-MM-YYYY` date.
    pub timestamp_field: String,
    /// Column holding the subject number.
    pub subject_field: String,
    /// Column holding the weight in grams.
    pub weight_field: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            excluded_subjects: vec![0, 33, 34],
            chart_window: 6,
            timestamp_field: "Timestamp".to_string(),
            subject_field: "mango_no".to_string(),
            weight_field: "Weight (g)".to_string(),
        }
    }
}

impl TrackerConfig {
    pub fn is_excluded(&self, subject: SubjectId) -> bool {
        self.excluded_subjects.contains(&subject)
    }
}

/// One accepted weighing of one subject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    /// Unique within a single load.
    pub id: String,
    pub subject_id: SubjectId,
    /// Date text as it appeared in the source, `DD-MM-YYYY`.
    pub date: String,
    /// Weight in grams.
    pub weight: f64,
}

impl Observation {
    /// Calendar day of the weighing.
    pub fn recorded_on(&self) -> Result<NaiveDate, TrackerError> {
        parse_date(&self.date)
    }
}

/// Normalized observations of one load together with the subjects present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub loaded_at: DateTime<Utc>,
    /// Source row order, not chronological.
    pub observations: Vec<Observation>,
    /// Ascending, duplicate free.
    pub subjects: Vec<SubjectId>,
}

impl Dataset {
    /// Build a dataset from already normalized observations.
    pub fn new(observations: Vec<Observation>) -> Self {
        let subjects = distinct_subjects(&observations);
        Self {
            loaded_at: Utc::now(),
            observations,
            subjects,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Label/value pairs ready for a line chart.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ChartSeries {
    pub title: Option<String>,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(label, value)` pairs in chart order.
    pub fn points(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Derived state for the current subject selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionSnapshot {
    pub subject: Option<SubjectId>,
    /// Chronological series of the selected subject.
    pub series: Vec<Observation>,
    /// `None` when the change is undefined (zero first weight or overflow).
    pub weight_change_percent: Option<f64>,
    pub chart: ChartSeries,
    /// `chart` limited to the configured window of recent points.
    pub compact_chart: ChartSeries,
}

impl Default for SelectionSnapshot {
    fn default() -> Self {
        Self {
            subject: None,
            series: Vec::new(),
            weight_change_percent: Some(0.0),
            chart: ChartSeries::default(),
            compact_chart: ChartSeries::default(),
        }
    }
}

impl SelectionSnapshot {
    pub fn has_data(&self) -> bool {
        !self.series.is_empty()
    }
}

/// Errors raised by the weight pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackerError {
    #[error("Malformed date {0:?}, expected DD-MM-YYYY")]
    MalformedDate(String),
    #[error("Invalid row: {0}")]
    InvalidRow(String),
    #[error("First weight is zero, percentage change is undefined")]
    DivisionByZero,
    #[error("Percentage change does not fit in a finite number")]
    Overflow,
    #[error("Could not read tabular data: {0}")]
    Parse(String),
}
