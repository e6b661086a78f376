//! File exporter.

use crate::error::{ExportError, Result};
use crate::format::{render_credentials, render_results};
use dehasher_core::{BreachRecord, Credential, OutputFormat};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Writes result sets to `<file>.<ext>` in a fixed format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exporter {
    file: PathBuf,
    format: OutputFormat,
}

impl Exporter {
    /// Create an exporter for the base file name `file` (extension is added).
    pub fn new(file: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            file: file.into(),
            format,
        }
    }

    /// Export format.
    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Path the export is written to.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        let ext = self.format.extension();
        let already_suffixed = self
            .file
            .extension()
            .is_some_and(|current| current.eq_ignore_ascii_case(ext));
        if already_suffixed {
            return self.file.clone();
        }

        let mut name = OsString::from(self.file.as_os_str());
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    }

    /// Write breach records. Returns the written path.
    ///
    /// # Errors
    /// Returns `ExportError` if rendering or writing fails.
    pub fn write_results(&self, records: &[BreachRecord]) -> Result<PathBuf> {
        let rendered = render_results(records, self.format)?;
        self.write(&rendered, records.len())
    }

    /// Write credential pairs. Returns the written path.
    ///
    /// # Errors
    /// Returns `ExportError` if rendering or writing fails.
    pub fn write_credentials(&self, credentials: &[Credential]) -> Result<PathBuf> {
        let rendered = render_credentials(credentials, self.format)?;
        self.write(&rendered, credentials.len())
    }

    fn write(&self, contents: &str, count: usize) -> Result<PathBuf> {
        let path = self.output_path();
        write_file(&path, contents)?;
        tracing::debug!(path = %path.display(), count, format = %self.format, "Wrote export");
        Ok(path)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ExportError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record() -> BreachRecord {
        BreachRecord {
            id: "1".to_string(),
            email: vec!["jdoe@example.com".to_string()],
            password: vec!["hunter2".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_output_path_appends_extension() {
        assert_eq!(
            Exporter::new("query", OutputFormat::Json).output_path(),
            PathBuf::from("query.json")
        );
        assert_eq!(
            Exporter::new("acme.corp", OutputFormat::Csv).output_path(),
            PathBuf::from("acme.corp.csv")
        );
        assert_eq!(
            Exporter::new("dump.yaml", OutputFormat::Yaml).output_path(),
            PathBuf::from("dump.yaml")
        );
    }

    #[test]
    fn test_write_results_json() {
        let tmp = TempDir::new().expect("create temp dir");
        let exporter = Exporter::new(tmp.path().join("query"), OutputFormat::Json);

        let path = exporter.write_results(&[record()]).expect("write results");
        assert_eq!(path, tmp.path().join("query.json"));

        let written = std::fs::read_to_string(&path).expect("read export");
        let parsed: Vec<BreachRecord> = serde_json::from_str(&written).expect("parse export");
        assert_eq!(parsed, vec![record()]);
    }

    #[test]
    fn test_write_credentials_txt() {
        let tmp = TempDir::new().expect("create temp dir");
        let exporter = Exporter::new(tmp.path().join("out").join("creds"), OutputFormat::Txt);
        let credential = Credential {
            email: "jdoe@example.com".to_string(),
            username: String::new(),
            password: "hunter2".to_string(),
        };

        let path = exporter
            .write_credentials(&[credential])
            .expect("write credentials");
        let written = std::fs::read_to_string(path).expect("read export");
        assert_eq!(written, "jdoe@example.com%hunter2\n");
    }

    #[test]
    fn test_write_into_unwritable_path_fails() {
        let tmp = TempDir::new().expect("create temp dir");
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").expect("write blocker");

        let exporter = Exporter::new(blocker.join("query"), OutputFormat::Csv);
        let result = exporter.write_results(&[record()]);
        assert!(matches!(result, Err(ExportError::Write { .. })));
    }
}
