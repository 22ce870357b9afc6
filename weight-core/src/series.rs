use std::collections::BTreeSet;

use crate::{parse_date, ChartSeries, Observation, SubjectId, TrackerError};

/// Distinct subjects present in `observations`, ascending.
pub fn distinct_subjects(observations: &[Observation]) -> Vec<SubjectId> {
    observations
        .iter()
        .map(|observation| observation.subject_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Chronological series of one subject.
///
/// Returns `None` when nothing is selected. Weighings on the same day keep
/// their source order. Observations whose date does not parse sort first.
pub fn select_series(
    observations: &[Observation],
    subject: Option<SubjectId>,
) -> Option<Vec<Observation>> {
    let subject = subject?;
    let mut series: Vec<Observation> = observations
        .iter()
        .filter(|observation| observation.subject_id == subject)
        .cloned()
        .collect();
    // `sort_by_cached_key` is stable.
    series.sort_by_cached_key(|observation| parse_date(&observation.date).ok());
    Some(series)
}

/// Percentage of weight lost between the first and last observation.
///
/// `sorted_series` must already be chronological. Fewer than two
/// observations yield `0.0`.
pub fn percent_change(sorted_series: &[Observation]) -> Result<f64, TrackerError> {
    let (Some(first), Some(last)) = (sorted_series.first(), sorted_series.last()) else {
        return Ok(0.0);
    };
    if sorted_series.len() < 2 {
        return Ok(0.0);
    }
    if first.weight == 0.0 {
        return Err(TrackerError::DivisionByZero);
    }

    let percent = (first.weight - last.weight) / first.weight * 100.0;
    if percent.is_finite() {
        Ok(percent)
    } else {
        Err(TrackerError::Overflow)
    }
}

/// Map a chronological series to chart labels and values.
///
/// With a window only the most recent `window` points are kept, still
/// oldest to newest.
pub fn build_chart_series(series: &[Observation], window: Option<usize>) -> ChartSeries {
    let start = window
        .map(|size| series.len().saturating_sub(size))
        .unwrap_or(0);
    let visible = &series[start..];

    ChartSeries {
        title: series
            .first()
            .map(|observation| format!("Weight Loss for Subject #{}", observation.subject_id)),
        labels: visible.iter().map(|observation| observation.date.clone()).collect(),
        values: visible.iter().map(|observation| observation.weight).collect(),
    }
}
