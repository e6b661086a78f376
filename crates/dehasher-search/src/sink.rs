//! Collaborator seams used by the orchestrator.
//!
//! - [`ResultStore`]: batch persistence with skip-on-conflict semantics
//! - [`ExportSink`]: file export in a fixed format
//! - [`Console`]: user-facing notices, raw output and yes/no confirmation

use async_trait::async_trait;
use dehasher_core::{BreachRecord, Credential, DehasherError, OutputFormat};
use dehasher_db::Database;
use dehasher_export::Exporter;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Persistence sink for fetched records and extracted credentials.
///
/// Both operations must tolerate rows that were already stored.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Store breach records. Returns the number of newly inserted rows.
    async fn store_results(&self, records: &[BreachRecord]) -> Result<u64, DehasherError>;

    /// Store credential pairs. Returns the number of newly inserted rows.
    async fn store_credentials(&self, credentials: &[Credential]) -> Result<u64, DehasherError>;
}

#[async_trait]
impl ResultStore for Database {
    async fn store_results(&self, records: &[BreachRecord]) -> Result<u64, DehasherError> {
        Ok(Database::store_results(self, records).await?)
    }

    async fn store_credentials(&self, credentials: &[Credential]) -> Result<u64, DehasherError> {
        Ok(Database::store_credentials(self, credentials).await?)
    }
}

/// Export sink for the final result set.
pub trait ExportSink: Send + Sync {
    /// Export format.
    fn format(&self) -> OutputFormat;

    /// Path the export will be written to.
    fn target(&self) -> PathBuf;

    /// Write breach records. Returns the written path.
    fn export_results(&self, records: &[BreachRecord]) -> Result<PathBuf, DehasherError>;

    /// Write credential pairs. Returns the written path.
    fn export_credentials(&self, credentials: &[Credential]) -> Result<PathBuf, DehasherError>;
}

impl ExportSink for Exporter {
    fn format(&self) -> OutputFormat {
        Exporter::format(self)
    }

    fn target(&self) -> PathBuf {
        self.output_path()
    }

    fn export_results(&self, records: &[BreachRecord]) -> Result<PathBuf, DehasherError> {
        Ok(self.write_results(records)?)
    }

    fn export_credentials(&self, credentials: &[Credential]) -> Result<PathBuf, DehasherError> {
        Ok(self.write_credentials(credentials)?)
    }
}

/// User-facing terminal surface.
pub trait Console: Send + Sync {
    /// Print a progress or status line.
    fn notice(&self, message: &str);

    /// Print raw output (tables, fallback exports).
    fn print(&self, text: &str);

    /// Ask a yes/no question. Only an affirmative answer returns `true`.
    ///
    /// # Errors
    /// Returns an I/O error if the answer cannot be read.
    fn confirm(&self, prompt: &str) -> io::Result<bool>;

    /// Column budget for rendered tables, `None` for unbounded.
    fn width(&self) -> Option<usize> {
        None
    }
}

/// [`Console`] backed by stdout and a blocking stdin read.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConsole;

impl Console for TerminalConsole {
    fn notice(&self, message: &str) {
        println!("{message}");
    }

    fn width(&self) -> Option<usize> {
        dehasher_export::terminal_width()
    }

    fn print(&self, text: &str) {
        println!("{text}");
    }

    fn confirm(&self, prompt: &str) -> io::Result<bool> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{prompt} [y/N]: ")?;
        stdout.flush()?;
        drop(stdout);

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(is_affirmative(&answer))
    }
}

/// True for `y` or `yes`, ignoring case and surrounding whitespace.
#[must_use]
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_affirmative() {
        for answer in ["y", "Y", "yes", "YES", " Yes\n"] {
            assert!(is_affirmative(answer), "{answer:?}");
        }
        for answer in ["", "n", "no", "yeah", "\n", "ye s"] {
            assert!(!is_affirmative(answer), "{answer:?}");
        }
    }

    #[tokio::test]
    async fn test_database_store_skips_duplicates() {
        let db = Database::open(":memory:").await.expect("open database");
        let store: &dyn ResultStore = &db;

        let credential = Credential {
            email: "jdoe@example.com".to_string(),
            username: "jdoe".to_string(),
            password: "hunter2".to_string(),
        };
        let first = store
            .store_credentials(&[credential.clone()])
            .await
            .expect("store credentials");
        let second = store
            .store_credentials(&[credential])
            .await
            .expect("store credentials again");
        assert_eq!((first, second), (1, 0));

        let record = BreachRecord {
            id: "abc".to_string(),
            email: vec!["jdoe@example.com".to_string()],
            ..Default::default()
        };
        assert_eq!(store.store_results(&[record.clone()]).await.expect("store"), 1);
        assert_eq!(store.store_results(&[record]).await.expect("store again"), 0);
    }

    #[test]
    fn test_exporter_sink_target() {
        let exporter = Exporter::new("query", OutputFormat::Yaml);
        let sink: &dyn ExportSink = &exporter;
        assert_eq!(sink.format(), OutputFormat::Yaml);
        assert_eq!(sink.target(), PathBuf::from("query.yaml"));
    }
}
