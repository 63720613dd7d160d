use std::path::PathBuf;

/// File name of the audit subsystem export inside a run's raw directory
pub const AUDIT_EXPORT_FILE_NAME: &str = "auditd_export.log";
/// File name of the alerting system export inside a run's raw directory
pub const ALERT_EXPORT_FILE_NAME: &str = "wazuh_alerts.json";

const RAW_DIR: &str = "raw";
const PROCESSED_DIR: &str = "processed";

/// Resolves where the inputs of a run are read from and where its summary is written.
///
/// Nothing is checked for existence here. The run id is used verbatim.
#[derive(Debug, Clone)]
pub struct RunLayout {
    data_dir: PathBuf,
    run_id: String,
}

impl RunLayout {
    pub fn new(data_dir: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            run_id: run_id.into(),
        }
    }

    /// `<data_dir>/raw/<run_id>`
    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join(RAW_DIR).join(&self.run_id)
    }

    pub fn audit_source(&self) -> PathBuf {
        self.raw_dir().join(AUDIT_EXPORT_FILE_NAME)
    }

    pub fn wazuh_source(&self) -> PathBuf {
        self.raw_dir().join(ALERT_EXPORT_FILE_NAME)
    }

    /// `<data_dir>/processed`, shared by all runs
    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join(PROCESSED_DIR)
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.processed_dir()
            .join(format!("run_{}_metrics.csv", self.run_id))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.processed_dir()
            .join(format!("run_{}_metadata.json", self.run_id))
    }

    /// Create the processed directory, and any missing parents, if it does not exist yet.
    pub fn ensure_processed_dir(&self) -> std::io::Result<PathBuf> {
        let dir = self.processed_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}
