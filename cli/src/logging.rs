//! Tracing setup.
//!
//! Human-readable lines go to stderr so they never mix with exported data
//! on stdout. When a log directory is configured, every run also appends
//! JSON lines to two files there: `info.log` for informational events and
//! `error.log` for warnings and errors. `dehasher logs` reads them back.

use std::path::Path;
use tracing::Level;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

/// Informational log file name.
pub const INFO_LOG: &str = "info.log";

/// Warning and error log file name.
pub const ERROR_LOG: &str = "error.log";

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "DEHASHER_LOG";

/// Filter used with `--debug` when `DEHASHER_LOG` is unset.
const DEBUG_FILTER: &str = "warn,dehasher_search=debug,dehasher_db=debug,dehasher_vault=debug";

/// Filter for the log files, independent of the stderr verbosity.
const FILE_FILTER: &str = "info,sqlx=warn,hyper=warn,reqwest=warn";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the tracing subscriber.
///
/// File logging is skipped with a notice when `log_dir` cannot be used.
/// An already installed global subscriber is kept.
pub fn init_tracing(debug: bool, log_dir: Option<&Path>) {
    let level = if debug { DEBUG_FILTER } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    let files = log_dir.and_then(|dir| match file_layer(dir) {
        Ok(layer) => Some(layer),
        Err(e) => {
            eprintln!("[!] Logging to {} disabled: {e}", dir.display());
            None
        }
    });

    let _ = tracing_subscriber::registry()
        .with(files)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .try_init();
}

/// JSON layer writing INFO events to [`INFO_LOG`] and WARN/ERROR events to
/// [`ERROR_LOG`] inside `dir`, creating the directory if needed.
fn file_layer(dir: &Path) -> Result<BoxedLayer, InitError> {
    let info = log_file(dir, INFO_LOG)?.with_min_level(Level::INFO);
    let errors = log_file(dir, ERROR_LOG)?.with_max_level(Level::WARN);

    Ok(fmt::layer::<Registry>()
        .json()
        .with_ansi(false)
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(info.and(errors))
        .with_filter(EnvFilter::new(FILE_FILTER))
        .boxed())
}

fn log_file(dir: &Path, name: &str) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
}
