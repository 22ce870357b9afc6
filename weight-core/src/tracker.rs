use tracing::debug;

use crate::{
    build_chart_series, percent_change, select_series, Dataset, SelectionSnapshot, SubjectId,
    TrackerConfig,
};

/// Read a subject selection coming from a picker.
///
/// Blank or non numeric input means nothing is selected.
pub fn parse_selection(input: &str) -> Option<SubjectId> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<SubjectId>().ok()
}

/// Holds the current dataset and selection and rebuilds derived state
/// whenever either one is replaced.
#[derive(Debug, Clone, Default)]
pub struct WeightTracker {
    config: TrackerConfig,
    dataset: Dataset,
    selection: Option<SubjectId>,
    snapshot: SelectionSnapshot,
}

impl WeightTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Subjects available for selection, ascending.
    pub fn subjects(&self) -> &[SubjectId] {
        &self.dataset.subjects
    }

    pub fn selection(&self) -> Option<SubjectId> {
        self.selection
    }

    pub fn snapshot(&self) -> &SelectionSnapshot {
        &self.snapshot
    }

    /// Replace the dataset. Observations of excluded subjects are dropped.
    /// The current selection is kept and recomputed against the new
    /// observations.
    pub fn dataset_loaded(&mut self, dataset: Dataset) -> &SelectionSnapshot {
        let dataset = self.without_excluded(dataset);
        debug!(
            observations = dataset.len(),
            subjects = dataset.subjects.len(),
            "dataset loaded"
        );
        self.dataset = dataset;
        self.snapshot = self.derive(self.selection);
        &self.snapshot
    }

    /// Replace the selection.
    pub fn selection_changed(&mut self, subject: Option<SubjectId>) -> &SelectionSnapshot {
        debug!(?subject, "selection changed");
        self.selection = subject;
        self.snapshot = self.derive(subject);
        &self.snapshot
    }

    /// Replace the selection from picker text, see [`parse_selection`].
    pub fn select_str(&mut self, input: &str) -> &SelectionSnapshot {
        self.selection_changed(parse_selection(input))
    }

    fn without_excluded(&self, dataset: Dataset) -> Dataset {
        if !dataset
            .subjects
            .iter()
            .any(|subject| self.config.is_excluded(*subject))
        {
            return dataset;
        }

        let loaded_at = dataset.loaded_at;
        let observations: Vec<_> = dataset
            .observations
            .into_iter()
            .filter(|observation| !self.config.is_excluded(observation.subject_id))
            .collect();
        Dataset {
            loaded_at,
            ..Dataset::new(observations)
        }
    }

    fn derive(&self, subject: Option<SubjectId>) -> SelectionSnapshot {
        let Some(series) = select_series(&self.dataset.observations, subject) else {
            return SelectionSnapshot::default();
        };

        let weight_change_percent = match percent_change(&series) {
            Ok(percent) => Some(percent),
            Err(err) => {
                debug!(?subject, %err, "weight change undefined");
                None
            }
        };

        SelectionSnapshot {
            subject,
            chart: build_chart_series(&series, None),
            compact_chart: build_chart_series(&series, Some(self.config.chart_window)),
            weight_change_percent,
            series,
        }
    }
}
