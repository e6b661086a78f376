//! Immutable per-run configuration.

use crate::error::{Result, SearchError};
use crate::query::{MatchMode, Predicates};
use dehasher_core::{OutputFormat, SearchConfig};
use serde::Serialize;
use std::path::PathBuf;

/// Export target of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputTarget {
    /// Base file name; the format extension is appended
    pub file: PathBuf,
    /// Export format
    pub format: OutputFormat,
}

/// Everything a search run needs, fixed before the run starts.
///
/// Built once at the CLI boundary and handed to the orchestrator by
/// reference. Serializes without the plaintext password so it can be
/// recorded alongside the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunConfig {
    /// Search predicates
    pub predicates: Predicates,
    /// Requested record cap; non-positive values fall back to the planner default
    pub max_records: i64,
    /// Legacy cap on the number of requests
    pub max_requests: Option<u32>,
    /// First page to request
    pub starting_page: u32,
    /// Value matching mode
    pub match_mode: MatchMode,
    /// Submit passwords in plaintext instead of hashing them
    pub force_plaintext: bool,
    /// Export and display only extracted credentials
    pub creds_only: bool,
    /// Report the credit balance after each call
    pub print_balance: bool,
    /// Remaining-record count above which the run asks for confirmation
    pub large_fetch_threshold: u64,
    /// Maximum rows shown in the terminal table
    pub display_limit: usize,
    /// Optional export target
    pub output: Option<OutputTarget>,
}

impl RunConfig {
    /// Configuration with the given predicates and defaults from `search`.
    #[must_use]
    pub fn new(predicates: Predicates, search: &SearchConfig) -> Self {
        Self {
            predicates,
            max_records: search.default_max_records,
            max_requests: None,
            starting_page: 1,
            match_mode: MatchMode::Exact,
            force_plaintext: false,
            creds_only: false,
            print_balance: false,
            large_fetch_threshold: search.large_fetch_threshold,
            display_limit: search.display_limit,
            output: None,
        }
    }

    /// Check the configuration before a run.
    ///
    /// # Errors
    /// - `SearchError::EmptyQuery` when no predicate is set
    /// - `SearchError::InvalidConfig` for a zero request cap, page or display limit
    pub fn validate(&self) -> Result<()> {
        if self.predicates.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if self.max_requests == Some(0) {
            return Err(SearchError::InvalidConfig(
                "max requests must be greater than zero".to_string(),
            ));
        }
        if self.starting_page == 0 {
            return Err(SearchError::InvalidConfig(
                "starting page must be at least 1".to_string(),
            ));
        }
        if self.display_limit == 0 {
            return Err(SearchError::InvalidConfig(
                "display limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
