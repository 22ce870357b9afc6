//! Framework neutral WASM <-> JavaScript bridge for the weight pipeline.

use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use weight_core::{TrackerConfig, TrackerError, WeightTracker};
use weight_ingest::{load_csv_str, load_rows, rows_from_json_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize, Default)]
struct JsTrackerConfig {
    #[serde(default)]
    excluded_subjects: Option<Vec<u32>>,
    #[serde(default)]
    chart_window: Option<usize>,
    #[serde(default)]
    timestamp_field: Option<String>,
    #[serde(default)]
    subject_field: Option<String>,
    #[serde(default)]
    weight_field: Option<String>,
}

impl From<JsTrackerConfig> for TrackerConfig {
    fn from(cfg: JsTrackerConfig) -> Self {
        let mut base = TrackerConfig::default();
        if let Some(excluded) = cfg.excluded_subjects {
            base.excluded_subjects = excluded;
        }
        if let Some(window) = cfg.chart_window {
            base.chart_window = window;
        }
        if let Some(field) = cfg.timestamp_field {
            base.timestamp_field = field;
        }
        if let Some(field) = cfg.subject_field {
            base.subject_field = field;
        }
        if let Some(field) = cfg.weight_field {
            base.weight_field = field;
        }
        base
    }
}

fn read_config(config: Option<JsValue>) -> Result<TrackerConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsTrackerConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Could not read config: {err}")))?;
            Ok(TrackerConfig::from(cfg))
        }
        _ => Ok(TrackerConfig::default()),
    }
}

/// Stateful tracker for a page: load once, then select subjects.
#[wasm_bindgen]
pub struct Tracker {
    inner: WeightTracker,
}

#[wasm_bindgen]
impl Tracker {
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<JsValue>) -> Result<Tracker, JsValue> {
        #[cfg(target_arch = "wasm32")]
        console_error_panic_hook::set_once();

        Ok(Tracker {
            inner: WeightTracker::new(read_config(config)?),
        })
    }

    /// Load rows already parsed by the page (array of objects).
    /// Returns the available subjects.
    #[wasm_bindgen(js_name = loadRows)]
    pub fn load_rows(&mut self, rows: JsValue) -> Result<JsValue, JsValue> {
        let value = from_value::<serde_json::Value>(rows)
            .map_err(|err| JsValue::from_str(&format!("Could not read rows: {err}")))?;
        let rows = rows_from_json_value(value).map_err(to_js_error)?;
        let dataset = load_rows(&rows, self.inner.config());
        self.inner.dataset_loaded(dataset);
        self.subjects()
    }

    /// Load a CSV export. Returns the available subjects.
    #[wasm_bindgen(js_name = loadCsv)]
    pub fn load_csv(&mut self, csv_text: &str) -> Result<JsValue, JsValue> {
        let dataset = load_csv_str(csv_text, self.inner.config()).map_err(to_js_error)?;
        self.inner.dataset_loaded(dataset);
        self.subjects()
    }

    pub fn subjects(&self) -> Result<JsValue, JsValue> {
        to_value(self.inner.subjects())
            .map_err(|err| JsValue::from_str(&format!("Could not serialize subjects: {err}")))
    }

    /// Change the selection from picker text; blank clears it.
    pub fn select(&mut self, selection: &str) -> Result<JsValue, JsValue> {
        let snapshot = self.inner.select_str(selection);
        to_value(snapshot)
            .map_err(|err| JsValue::from_str(&format!("Could not serialize selection: {err}")))
    }
}

/// One-shot summary of a CSV export for a single subject.
#[wasm_bindgen(js_name = summarizeCsv)]
pub fn summarize_csv(
    csv_text: &str,
    selection: &str,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let mut tracker = WeightTracker::new(read_config(config)?);
    let dataset = load_csv_str(csv_text, tracker.config()).map_err(to_js_error)?;
    tracker.dataset_loaded(dataset);

    to_value(tracker.select_str(selection))
        .map_err(|err| JsValue::from_str(&format!("Could not serialize selection: {err}")))
}

fn to_js_error(err: TrackerError) -> JsValue {
    JsValue::from_str(&format_tracker_error(err))
}

fn format_tracker_error(err: TrackerError) -> String {
    format!("Weight tracker error: {err}")
}
