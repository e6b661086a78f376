//! `dehasher logs` - read back the persistent log files.

use crate::args::LogsArgs;
use crate::logging::{ERROR_LOG, INFO_LOG};
use anyhow::Context;
use chrono::{DateTime, Utc};
use dehasher_export::{render_table, terminal_width};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

const LOG_HEADERS: [&str; 4] = ["Date", "Severity", "Message", "Details"];

/// Severity classes kept in the log files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational events (`info.log`)
    Info,
    /// Warnings (`error.log`)
    Warn,
    /// Errors (`error.log`)
    Error,
}

impl Severity {
    /// Every severity, in increasing order.
    pub const ALL: [Self; 3] = [Self::Info, Self::Warn, Self::Error];

    fn from_level(level: &str) -> Option<Self> {
        match level {
            "INFO" => Some(Self::Info),
            "WARN" => Some(Self::Warn),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    fn file(self) -> &'static str {
        match self {
            Self::Info => INFO_LOG,
            Self::Warn | Self::Error => ERROR_LOG,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        })
    }
}

impl FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" | "fatal" => Ok(Self::Error),
            other => anyhow::bail!("unknown severity '{other}' (expected info, warn or error)"),
        }
    }
}

/// One parsed log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Event time
    pub timestamp: DateTime<Utc>,
    /// Event severity
    pub severity: Severity,
    /// Event message
    pub message: String,
    /// Remaining event fields as `key: value, ...`
    pub details: String,
}

/// Selection applied by [`read_entries`].
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    /// Severities to keep; empty keeps all
    pub severities: Vec<Severity>,
    /// Inclusive lower time bound
    pub start: Option<DateTime<Utc>>,
    /// Exclusive upper time bound
    pub end: Option<DateTime<Utc>>,
    /// Keep only the newest `n` entries
    pub last: Option<usize>,
}

impl LogQuery {
    fn severities(&self) -> &[Severity] {
        if self.severities.is_empty() {
            &Severity::ALL
        } else {
            &self.severities
        }
    }

    fn matches(&self, entry: &LogEntry) -> bool {
        self.severities().contains(&entry.severity)
            && self.start.map_or(true, |start| entry.timestamp >= start)
            && self.end.map_or(true, |end| entry.timestamp < end)
    }
}

/// Wire shape of a line written by the JSON file layer.
#[derive(Deserialize)]
struct RawEntry {
    timestamp: String,
    level: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Show log entries matching `args`.
pub fn handle(args: &LogsArgs, log_dir: Option<&Path>) -> anyhow::Result<()> {
    let dir = log_dir.context("file logging is disabled (logging.enabled = false)")?;

    let query = LogQuery {
        severities: args
            .severity
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse())
            .collect::<anyhow::Result<Vec<_>>>()?,
        start: args.start,
        end: args.end,
        last: args.last,
    };

    let entries = read_entries(dir, &query)?;
    if entries.is_empty() {
        println!("No logs found matching the specified criteria.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = entries.iter().map(entry_row).collect();
    println!("{}", render_table(&LOG_HEADERS, &rows, terminal_width()));
    Ok(())
}

/// Read entries from the log files in `dir`, newest first.
///
/// Only the files holding the requested severities are opened. Missing
/// files are treated as empty and unreadable lines are skipped.
pub fn read_entries(dir: &Path, query: &LogQuery) -> anyhow::Result<Vec<LogEntry>> {
    let mut files: Vec<&str> = query.severities().iter().map(|s| s.file()).collect();
    files.sort_unstable();
    files.dedup();

    let mut entries = Vec::new();
    for file in files {
        let path = dir.join(file);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()))
            }
        };

        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(line) {
                Some(entry) if query.matches(&entry) => entries.push(entry),
                Some(_) => {}
                None => tracing::debug!(file, line = index + 1, "Skipping unreadable log line"),
            }
        }
    }

    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    if let Some(last) = query.last {
        entries.truncate(last);
    }
    Ok(entries)
}

fn parse_line(line: &str) -> Option<LogEntry> {
    let raw: RawEntry = serde_json::from_str(line).ok()?;
    let timestamp = DateTime::parse_from_rfc3339(&raw.timestamp)
        .ok()?
        .with_timezone(&Utc);
    let severity = Severity::from_level(&raw.level)?;

    let mut fields = raw.fields;
    let message = fields.remove("message").map(value_text).unwrap_or_default();
    let details = fields
        .into_iter()
        .map(|(key, value)| format!("{key}: {}", value_text(value)))
        .collect::<Vec<_>>()
        .join(", ");

    Some(LogEntry {
        timestamp,
        severity,
        message,
        details,
    })
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn entry_row(entry: &LogEntry) -> Vec<String> {
    vec![
        entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        entry.severity.to_string(),
        entry.message.clone(),
        entry.details.clone(),
    ]
}
