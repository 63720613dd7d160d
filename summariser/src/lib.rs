use anyhow::Context;
use chrono::Utc;
use edr_summary_model::{RunMetadata, RunMetrics};
use log::{debug, info};
use std::io::Write;
use std::path::PathBuf;

pub mod count;
pub mod layout;
pub mod report;

pub use count::{CountError, Decoding, LineCounter};
pub use layout::RunLayout;
pub use report::ReportWriter;

/// Default root of the `raw/` and `processed/` directories
pub const DEFAULT_DATA_DIR: &str = "data";
/// Workload label used when none is given
pub const DEFAULT_WORKLOAD: &str = "baseline";
/// Run duration used when none is given, in seconds
pub const DEFAULT_DURATION_SEC: u64 = 60;

/// Everything needed to summarise one run.
#[derive(Debug, Clone)]
pub struct SummariseOptions {
    pub data_dir: PathBuf,
    pub run_id: String,
    pub workload: String,
    pub duration_sec: u64,
    pub decoding: Decoding,
}

impl SummariseOptions {
    /// Options for the given run with every other setting at its default.
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            run_id: run_id.into(),
            workload: DEFAULT_WORKLOAD.to_string(),
            duration_sec: DEFAULT_DURATION_SEC,
            decoding: Decoding::default(),
        }
    }

    /// Set `data_dir` option
    pub fn data_dir(mut self, dir: PathBuf) -> Self {
        self.data_dir = dir;
        self
    }

    /// Set `workload` option
    pub fn workload(mut self, workload: &str) -> Self {
        self.workload = workload.to_string();
        self
    }

    /// Set `duration_sec` option
    pub fn duration_sec(mut self, duration_sec: u64) -> Self {
        self.duration_sec = duration_sec;
        self
    }

    /// Set `decoding` option
    pub fn decoding(mut self, decoding: Decoding) -> Self {
        self.decoding = decoding;
        self
    }
}

/// Paths of the files written by [summarise_run]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryPaths {
    pub metrics: PathBuf,
    pub metadata: PathBuf,
}

/// Count the audit and alert exports of a run and write its metrics row and metadata document.
///
/// A `[ok] wrote <path>` line is written to `out` after each file. Missing exports count as zero.
/// If writing the metadata fails, the metrics file that was already written is left in place.
pub fn summarise_run<W>(options: &SummariseOptions, out: W) -> anyhow::Result<SummaryPaths>
where
    W: Write,
{
    let layout = RunLayout::new(&options.data_dir, &options.run_id);
    let processed_dir = layout.ensure_processed_dir().with_context(|| {
        format!(
            "Failed to create output directory {}",
            layout.processed_dir().display()
        )
    })?;
    debug!("Writing summary of run {} to {}", layout.run_id(), processed_dir.display());

    let counter = LineCounter::new(options.decoding);
    let audit_source = layout.audit_source();
    let audit_events = counter
        .count_file(&audit_source)
        .with_context(|| format!("Failed to count audit events in {}", audit_source.display()))?;
    debug!("Counted {audit_events} audit events in {}", audit_source.display());

    let wazuh_source = layout.wazuh_source();
    let wazuh_alerts = counter
        .count_file(&wazuh_source)
        .with_context(|| format!("Failed to count alerts in {}", wazuh_source.display()))?;
    debug!("Counted {wazuh_alerts} alerts in {}", wazuh_source.display());

    let mut writer = ReportWriter::new(out);

    let metrics = RunMetrics::new(
        options.run_id.clone(),
        options.workload.clone(),
        audit_events,
        wazuh_alerts,
        options.duration_sec,
    );
    let metrics_path = layout.metrics_path();
    writer.write_metrics(&metrics, &metrics_path)?;

    let metadata = RunMetadata::new(
        options.run_id.clone(),
        options.workload.clone(),
        options.duration_sec,
        Utc::now(),
        audit_source,
        wazuh_source,
    );
    let metadata_path = layout.metadata_path();
    writer.write_metadata(&metadata, &metadata_path)?;

    info!(
        "Summarised run {}: {audit_events} audit events, {wazuh_alerts} alerts",
        options.run_id
    );

    Ok(SummaryPaths {
        metrics: metrics_path,
        metadata: metadata_path,
    })
}
