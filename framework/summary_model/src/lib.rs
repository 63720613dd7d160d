use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;

use crate::json::AsciiPrettyFormatter;

mod json;

/// Format of [RunMetadata::collected_utc], ISO-8601 with second precision.
pub const COLLECTED_UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Per-run counts, persisted as a single CSV row.
///
/// The field order here is the column order of the CSV file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunMetrics {
    /// The run id supplied by the caller
    pub run_id: String,
    /// Free text label of the workload that was run
    pub workload: String,
    /// Number of lines in the audit export
    pub audit_events: u64,
    /// Number of lines in the alert export
    pub wazuh_alerts: u64,
    /// Reserved.
    ///
    /// There is no definition yet for how this is derived from the alert export, so it is always
    /// written as an empty field.
    pub time_to_first_alert_sec: Option<u64>,
    /// The duration the run was configured with, in seconds
    pub duration_sec: u64,
}

impl RunMetrics {
    pub fn new(
        run_id: String,
        workload: String,
        audit_events: u64,
        wazuh_alerts: u64,
        duration_sec: u64,
    ) -> Self {
        Self {
            run_id,
            workload,
            audit_events,
            wazuh_alerts,
            time_to_first_alert_sec: None,
            duration_sec,
        }
    }
}

/// Describes where the counts of a run came from and when they were collected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunMetadata {
    pub run_id: String,
    pub workload: String,
    pub duration_sec: u64,
    /// When this summary was generated, not when the run happened.
    ///
    /// Formatted with [COLLECTED_UTC_FORMAT].
    pub collected_utc: String,
    pub audit_source_file: PathBuf,
    pub wazuh_source_file: PathBuf,
}

impl RunMetadata {
    pub fn new(
        run_id: String,
        workload: String,
        duration_sec: u64,
        collected_at: DateTime<Utc>,
        audit_source_file: PathBuf,
        wazuh_source_file: PathBuf,
    ) -> Self {
        Self {
            run_id,
            workload,
            duration_sec,
            collected_utc: collected_at.format(COLLECTED_UTC_FORMAT).to_string(),
            audit_source_file,
            wazuh_source_file,
        }
    }
}

/// Serialize the metrics to a writer as a header row followed by one data row.
///
/// Records are terminated with `\r\n` and fields are only quoted when they need to be.
pub fn store_run_metrics<W: Write>(metrics: &RunMetrics, writer: W) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);
    writer.serialize(metrics)?;
    writer.flush()?;
    Ok(())
}

/// Load the metrics from a reader
///
/// The input must contain a header row and exactly one data row. This is the format produced by
/// [store_run_metrics].
pub fn load_run_metrics<R: Read>(reader: R) -> anyhow::Result<RunMetrics> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = reader.deserialize::<RunMetrics>();
    let metrics = rows
        .next()
        .ok_or_else(|| anyhow::anyhow!("No data row in run metrics"))??;
    if rows.next().is_some() {
        anyhow::bail!("Expected a single data row in run metrics");
    }
    Ok(metrics)
}

/// Serialize the metadata to a writer as indented JSON
///
/// Non-ASCII characters in strings are written as `\uXXXX` escapes so the output is plain ASCII.
pub fn store_run_metadata<W: Write>(metadata: &RunMetadata, writer: W) -> anyhow::Result<()> {
    let mut serializer =
        serde_json::Serializer::with_formatter(writer, AsciiPrettyFormatter::new());
    metadata.serialize(&mut serializer)?;
    Ok(())
}

/// Load the metadata from a reader
pub fn load_run_metadata<R: Read>(reader: R) -> anyhow::Result<RunMetadata> {
    let reader = std::io::BufReader::new(reader);
    let metadata: RunMetadata = serde_json::from_reader(reader)?;
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn sample_metrics() -> RunMetrics {
        RunMetrics::new("r1".to_string(), "stress".to_string(), 5, 0, 120)
    }

    #[test]
    fn metrics_are_written_as_header_and_one_row() {
        let mut out = Vec::new();
        store_run_metrics(&sample_metrics(), &mut out).unwrap();

        assert_eq!(
            "run_id,workload,audit_events,wazuh_alerts,time_to_first_alert_sec,duration_sec\r\n\
             r1,stress,5,0,,120\r\n",
            String::from_utf8(out).unwrap()
        );
    }

    #[test]
    fn workload_with_comma_is_quoted() {
        let metrics = RunMetrics::new("r2".to_string(), "io_uring, net".to_string(), 1, 2, 60);
        let mut out = Vec::new();
        store_run_metrics(&metrics, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("r2,\"io_uring, net\",1,2,,60\r\n"));
        assert_eq!(metrics, load_run_metrics(text.as_bytes()).unwrap());
    }

    #[test]
    fn load_metrics_reads_empty_placeholder_as_unset() {
        let input = "run_id,workload,audit_events,wazuh_alerts,time_to_first_alert_sec,duration_sec\n\
                     r1,stress,5,0,,120\n";
        let metrics = load_run_metrics(input.as_bytes()).unwrap();
        assert_eq!(sample_metrics(), metrics);
        assert_eq!(None, metrics.time_to_first_alert_sec);
    }

    #[test]
    fn load_metrics_rejects_missing_or_extra_rows() {
        let header = "run_id,workload,audit_events,wazuh_alerts,time_to_first_alert_sec,duration_sec\n";
        assert!(load_run_metrics(header.as_bytes()).is_err());

        let two_rows = format!("{header}a,b,1,1,,1\nc,d,2,2,,2\n");
        assert!(load_run_metrics(two_rows.as_bytes()).is_err());
    }

    #[test]
    fn metadata_is_indented_json_with_fixed_keys() {
        let collected_at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let metadata = RunMetadata::new(
            "r1".to_string(),
            "stress".to_string(),
            120,
            collected_at,
            PathBuf::from("data/raw/r1/auditd_export.log"),
            PathBuf::from("data/raw/r1/wazuh_alerts.json"),
        );

        let mut out = Vec::new();
        store_run_metadata(&metadata, &mut out).unwrap();

        let expected = r#"{
  "run_id": "r1",
  "workload": "stress",
  "duration_sec": 120,
  "collected_utc": "2024-03-09T07:05:01Z",
  "audit_source_file": "data/raw/r1/auditd_export.log",
  "wazuh_source_file": "data/raw/r1/wazuh_alerts.json"
}"#;
        assert_eq!(expected, String::from_utf8(out).unwrap());
        assert_eq!(metadata, load_run_metadata(expected.as_bytes()).unwrap());
    }

    #[test]
    fn metadata_escapes_non_ascii_text() {
        let metadata = RunMetadata::new(
            "lauf-ü".to_string(),
            "stréss".to_string(),
            60,
            Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap(),
            PathBuf::from("data/raw/lauf-ü/auditd_export.log"),
            PathBuf::from("data/raw/lauf-ü/wazuh_alerts.json"),
        );

        let mut out = Vec::new();
        store_run_metadata(&metadata, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.is_ascii());
        assert!(text.contains(r#""run_id": "lauf-\u00fc""#), "{text}");
        assert!(text.contains(r#""workload": "str\u00e9ss""#), "{text}");
        assert_eq!(metadata, load_run_metadata(text.as_bytes()).unwrap());
    }
}
