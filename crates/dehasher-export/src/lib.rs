//! Dehasher Export - file export and terminal tables
//!
//! Serializes breach records and credential pairs into the closed set of
//! export formats (`json`, `yaml`, `csv`, `txt`, `xml`) and renders aligned tables
//! for terminal display.
//!
//! # Example
//!
//! ```rust
//! use dehasher_core::{Credential, OutputFormat};
//! use dehasher_export::render_credentials;
//!
//! let creds = vec![Credential {
//!     email: "jdoe@example.com".to_string(),
//!     username: "jdoe".to_string(),
//!     password: "hunter2".to_string(),
//! }];
//! let text = render_credentials(&creds, OutputFormat::Txt).unwrap();
//! assert_eq!(text, "jdoe%hunter2\n");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod format;
pub mod table;
pub mod writer;

pub use error::{ExportError, Result};
pub use format::{credentials_text, render_credentials, render_results, results_text};
pub use table::{
    credentials_table, credentials_table_with, render_table, results_table, results_table_with,
    terminal_width, Table,
};
pub use writer::Exporter;
