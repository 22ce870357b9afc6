use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use weight_core::{parse_selection, TrackerConfig, WeightTracker};
use weight_ingest::load_csv_str;

#[derive(Parser, Debug)]
#[command(
    name = "weight-cli",
    about = "Summarize per-subject weight series from a CSV export."
)]
struct Args {
    /// Path to the CSV export.
    #[arg(short, long)]
    input: PathBuf,

    /// Subject number to show. Without it only the subject list is printed.
    #[arg(short, long)]
    subject: Option<String>,

    /// JSON file with tracker configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subjects to exclude, comma separated. Replaces the configured list.
    #[arg(long, value_delimiter = ',')]
    exclude: Option<Vec<u32>>,

    /// Number of recent points in the compact chart.
    #[arg(long)]
    window: Option<usize>,

    /// Print the selection snapshot as JSON.
    #[arg(long)]
    json: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(&args)?;
    tracing::debug!(?config, "configuration loaded");
    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Could not read file {:?}", args.input))?;

    let mut tracker = WeightTracker::new(config);
    let dataset = load_csv_str(&data, tracker.config())
        .with_context(|| format!("Could not parse {:?}", args.input))?;
    tracker.dataset_loaded(dataset);

    let subjects: Vec<String> = tracker.subjects().iter().map(u32::to_string).collect();
    println!(
        "Loaded at: {}\nObservations: {}\nSubjects: {}",
        tracker.dataset().loaded_at,
        tracker.dataset().len(),
        subjects.join(", ")
    );

    let Some(selection) = args.subject.as_deref() else {
        return Ok(());
    };
    if parse_selection(selection).is_none() {
        anyhow::bail!("{selection:?} is not a subject number");
    }

    let snapshot = tracker.select_str(selection);
    tracing::debug!(
        subject = selection,
        observations = snapshot.series.len(),
        "subject selected"
    );
    if args.json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    if !snapshot.has_data() {
        println!("No observations for subject {selection}");
        return Ok(());
    }

    for observation in &snapshot.series {
        println!("  {}  {:>8.1} g", observation.date, observation.weight);
    }
    match snapshot.weight_change_percent {
        Some(percent) => println!("Total weight loss: {percent:.2}%"),
        None => println!("Total weight loss: undefined (first weight is zero)"),
    }

    let recent: Vec<String> = snapshot
        .compact_chart
        .points()
        .map(|(label, value)| format!("{label}={value}"))
        .collect();
    println!("Recent: {}", recent.join(" "));

    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<TrackerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Could not read config {path:?}"))?;
            serde_json::from_str(&text).with_context(|| format!("Invalid config {path:?}"))?
        }
        None => TrackerConfig::default(),
    };

    if let Some(excluded) = &args.exclude {
        config.excluded_subjects = excluded.clone();
    }
    if let Some(window) = args.window {
        config.chart_window = window;
    }
    Ok(config)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
