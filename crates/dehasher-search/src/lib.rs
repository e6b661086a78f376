//! Dehasher Search - breach-data query and fetch engine.
//!
//! Turns typed search predicates into the provider's composite query,
//! plans paginated fetches under the provider's `page * size` ceiling,
//! issues the requests and hands the accumulated records to persistence,
//! export and display sinks.
//!
//! # Features
//!
//! - Predicate builder with whitespace quoting and SHA-256 password hashing
//! - Greedy pagination planner (fewest requests for a record cap)
//! - Typed provider errors from a single HTTP status table
//! - Confirmation gate before large fetches
//! - Partial results are stored even when a request fails
//!
//! # Example
//!
//! ```rust,ignore
//! use dehasher_search::{Dehasher, DehashedClient, Predicates, RunConfig, TerminalConsole};
//! use std::sync::Arc;
//!
//! let predicates = Predicates {
//!     domain: Some("example.com".to_string()),
//!     ..Default::default()
//! };
//! let run = RunConfig::new(predicates, &config.search);
//! let client = DehashedClient::new(api_key, &config.api)?;
//!
//! let mut dehasher = Dehasher::new(&run, client, Arc::new(database), Arc::new(TerminalConsole))?;
//! let report = dehasher.run().await?;
//! println!("fetched {} of {}", report.fetched, report.total);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod client;
pub mod error;
pub mod orchestrator;
pub mod planner;
pub mod query;
pub mod run_config;
pub mod sink;

pub use client::{DehashedClient, SearchOutcome};
pub use error::{ProviderError, ProviderErrorKind, Result, SearchError};
pub use orchestrator::{extract_credentials, Dehasher, RunReport, RunState};
pub use planner::{FetchPlan, FetchUnit, DEFAULT_RECORD_CAP, PAGE_CEILING};
pub use query::{sha256_hex, Field, MatchMode, Predicates, SearchRequest, REDACTED};
pub use run_config::{OutputTarget, RunConfig};
pub use sink::{is_affirmative, Console, ExportSink, ResultStore, TerminalConsole};
