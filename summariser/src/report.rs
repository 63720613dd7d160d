use anyhow::Context;
use edr_summary_model::{store_run_metadata, store_run_metrics, RunMetadata, RunMetrics};
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the summary files of a run and confirms each one on `out` once it is on disk.
///
/// Existing files are truncated. No confirmation is written for a file that failed.
pub struct ReportWriter<W>
where
    W: Write,
{
    out: W,
}

impl<W> ReportWriter<W>
where
    W: Write,
{
    /// Creates a new [`ReportWriter`] confirming written files on `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_metrics(&mut self, metrics: &RunMetrics, path: &Path) -> anyhow::Result<()> {
        debug!("Writing run metrics to {}: {metrics:?}", path.display());
        let mut writer = create(path)?;
        store_run_metrics(metrics, &mut writer)
            .and_then(|_| writer.flush().map_err(Into::into))
            .with_context(|| format!("Failed to write run metrics to {}", path.display()))?;
        self.confirm(path)
    }

    pub fn write_metadata(&mut self, metadata: &RunMetadata, path: &Path) -> anyhow::Result<()> {
        debug!("Writing run metadata to {}: {metadata:?}", path.display());
        let mut writer = create(path)?;
        store_run_metadata(metadata, &mut writer)
            .and_then(|_| writer.flush().map_err(Into::into))
            .with_context(|| format!("Failed to write run metadata to {}", path.display()))?;
        self.confirm(path)
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn confirm(&mut self, path: &Path) -> anyhow::Result<()> {
        writeln!(self.out, "[ok] wrote {}", path.display())?;
        Ok(())
    }
}

fn create(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn metrics() -> RunMetrics {
        RunMetrics::new("r1".to_string(), "baseline".to_string(), 3, 1, 60)
    }

    fn metadata() -> RunMetadata {
        RunMetadata::new(
            "r1".to_string(),
            "baseline".to_string(),
            60,
            Utc::now(),
            PathBuf::from("data/raw/r1/auditd_export.log"),
            PathBuf::from("data/raw/r1/wazuh_alerts.json"),
        )
    }

    #[test]
    fn confirms_each_written_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let metrics_path = tempdir.path().join("run_r1_metrics.csv");
        let metadata_path = tempdir.path().join("run_r1_metadata.json");

        let mut writer = ReportWriter::new(Vec::new());
        writer.write_metrics(&metrics(), &metrics_path).unwrap();
        writer.write_metadata(&metadata(), &metadata_path).unwrap();

        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            format!(
                "[ok] wrote {}\n[ok] wrote {}\n",
                metrics_path.display(),
                metadata_path.display()
            ),
            out
        );
        assert!(std::fs::read_to_string(&metrics_path)
            .unwrap()
            .ends_with("r1,baseline,3,1,,60\r\n"));
        assert!(metadata_path.is_file());
    }

    #[test]
    fn overwrites_existing_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("run_r1_metrics.csv");
        std::fs::write(&path, "stale content that is longer than the new report\n".repeat(10))
            .unwrap();

        ReportWriter::new(std::io::sink())
            .write_metrics(&metrics(), &path)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(2, content.lines().count());
        assert!(!content.contains("stale"));
    }

    #[test]
    fn failed_write_is_not_confirmed() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("missing").join("run_r1_metadata.json");

        let mut writer = ReportWriter::new(Vec::new());
        let err = writer.write_metadata(&metadata(), &path).unwrap_err();

        assert!(err.to_string().contains("Failed to create"), "{err:#}");
        assert!(writer.into_inner().is_empty());
    }
}
