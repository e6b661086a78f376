//! Run orchestrator.
//!
//! [`Dehasher`] drives one search run through
//! `Idle -> Probing -> (Confirming) -> Fetching -> Finalizing -> Done`,
//! or `Failed` when a call errors. Whatever was fetched before a failure is
//! still finalized (stored, exported and displayed) before the error is
//! returned.

use crate::client::DehashedClient;
use crate::error::{Result, SearchError};
use crate::planner::{FetchPlan, FetchUnit};
use crate::query::SearchRequest;
use crate::run_config::RunConfig;
use crate::sink::{Console, ExportSink, ResultStore};
use dehasher_core::{BreachRecord, Credential};
use dehasher_export::{credentials_table, credentials_text, results_table, results_text, Table};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Records covered by one provider token.
const RECORDS_PER_TOKEN: u64 = 10_000;

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// Not started
    Idle,
    /// First scheduled unit in flight
    Probing,
    /// Waiting for the user to approve a large fetch
    Confirming,
    /// Remaining scheduled units in flight
    Fetching,
    /// Storing, exporting and displaying results
    Finalizing,
    /// Finished successfully
    Done,
    /// Aborted by an error
    Failed,
}

impl RunState {
    /// Lower-case state name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Probing => "probing",
            Self::Confirming => "confirming",
            Self::Fetching => "fetching",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// True for `Done` and `Failed`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of a run, available after success or failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Final state
    pub state: RunState,
    /// Composite query with plaintext passwords redacted
    pub query: String,
    /// Entries accumulated over the run
    pub fetched: usize,
    /// Records the provider reported as available
    pub total: u64,
    /// Last reported credit balance
    pub balance: i64,
    /// Calls issued
    pub requests: usize,
    /// Credentials extracted from the entries
    pub credentials: usize,
    /// Newly stored result rows
    pub stored_results: u64,
    /// Newly stored credential rows
    pub stored_credentials: u64,
    /// Export file, when one was written
    pub export_path: Option<PathBuf>,
}

/// Extract credential pairs from breach records.
///
/// Records without a password are skipped. Each pair takes the first email,
/// the first username and the first password of its record; missing
/// identifiers become empty strings.
#[must_use]
pub fn extract_credentials(records: &[BreachRecord]) -> Vec<Credential> {
    records
        .iter()
        .filter_map(|record| {
            let password = record.password.first()?;
            Some(Credential {
                email: record.email.first().cloned().unwrap_or_default(),
                username: record.username.first().cloned().unwrap_or_default(),
                password: password.clone(),
            })
        })
        .collect()
}

#[derive(Debug, Default)]
struct Finalized {
    credentials: usize,
    stored_results: u64,
    stored_credentials: u64,
    export_path: Option<PathBuf>,
}

/// Orchestrates one search run.
pub struct Dehasher<'a> {
    config: &'a RunConfig,
    client: DehashedClient,
    request: SearchRequest,
    plan: FetchPlan,
    store: Arc<dyn ResultStore>,
    console: Arc<dyn Console>,
    exporter: Option<Arc<dyn ExportSink>>,
    state: RunState,
    total: u64,
    balance: i64,
    requests: usize,
    last_received: usize,
    finalized: Finalized,
}

impl fmt::Debug for Dehasher<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dehasher")
            .field("client", &self.client)
            .field("plan", &self.plan)
            .field("state", &self.state)
            .field("total", &self.total)
            .field("balance", &self.balance)
            .finish_non_exhaustive()
    }
}

impl<'a> Dehasher<'a> {
    /// Build the request and fetch schedule for `config`.
    ///
    /// # Errors
    /// Returns `SearchError::EmptyQuery` or `SearchError::InvalidConfig` if
    /// the configuration does not validate.
    pub fn new(
        config: &'a RunConfig,
        client: DehashedClient,
        store: Arc<dyn ResultStore>,
        console: Arc<dyn Console>,
    ) -> Result<Self> {
        config.validate()?;

        let plan = FetchPlan::new(config.max_records, config.starting_page, config.max_requests);
        let first = plan.units().first().copied().unwrap_or(FetchUnit {
            page: config.starting_page,
            size: 0,
        });

        let mut request = SearchRequest::new(
            first.page,
            first.size,
            config.match_mode,
            config.force_plaintext,
        );
        config.predicates.apply_to(&mut request);
        if request.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        tracing::info!(
            units = plan.len(),
            planned_records = plan.total_records(),
            "Prepared search run"
        );

        Ok(Self {
            config,
            client,
            request,
            plan,
            store,
            console,
            exporter: None,
            state: RunState::Idle,
            total: 0,
            balance: 0,
            requests: 0,
            last_received: 0,
            finalized: Finalized::default(),
        })
    }

    /// Export the final result set through `exporter`.
    #[must_use]
    pub fn with_exporter(mut self, exporter: Arc<dyn ExportSink>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Fetch schedule for this run.
    #[must_use]
    pub fn plan(&self) -> &FetchPlan {
        &self.plan
    }

    /// Request sent to the provider.
    #[must_use]
    pub fn request(&self) -> &SearchRequest {
        &self.request
    }

    /// Entries accumulated so far.
    #[must_use]
    pub fn results(&self) -> &[BreachRecord] {
        self.client.results()
    }

    /// Summary of the run in its current state.
    #[must_use]
    pub fn report(&self) -> RunReport {
        RunReport {
            state: self.state,
            query: self.request.redacted_query().to_string(),
            fetched: self.client.fetched(),
            total: self.total,
            balance: self.balance,
            requests: self.requests,
            credentials: self.finalized.credentials,
            stored_results: self.finalized.stored_results,
            stored_credentials: self.finalized.stored_credentials,
            export_path: self.finalized.export_path.clone(),
        }
    }

    /// Execute the run.
    ///
    /// On failure the partial results are finalized once and the error is
    /// returned; [`Dehasher::report`] still describes the failed run.
    ///
    /// # Errors
    /// Returns the first transport, provider or decode error, or an I/O
    /// error from the confirmation prompt.
    pub async fn run(&mut self) -> Result<RunReport> {
        if self.state != RunState::Idle {
            return Err(SearchError::InvalidConfig(format!(
                "run already executed (state: {})",
                self.state
            )));
        }

        match self.fetch().await {
            Ok(()) => {
                self.transition(RunState::Finalizing);
                self.finalize().await;
                self.transition(RunState::Done);
                Ok(self.report())
            }
            Err(err) => {
                self.transition(RunState::Failed);
                self.report_failure(&err);
                self.finalize().await;
                Err(err)
            }
        }
    }

    async fn fetch(&mut self) -> Result<()> {
        self.console.notice("[*] Querying Dehashed API...");

        let units = self.plan.units().to_vec();
        let Some((probe, rest)) = units.split_first() else {
            return Ok(());
        };

        self.transition(RunState::Probing);
        self.call(*probe).await?;
        if self.is_satisfied() {
            return Ok(());
        }

        let remaining = self.total.saturating_sub(self.fetched());
        if !rest.is_empty() && remaining > self.config.large_fetch_threshold {
            self.transition(RunState::Confirming);
            if !self.confirm_large_fetch(remaining)? {
                tracing::info!(remaining, "Large fetch declined");
                self.console
                    .notice("   [-] Fetch declined, keeping the records retrieved so far");
                return Ok(());
            }
        }

        self.transition(RunState::Fetching);
        for unit in rest {
            self.call(*unit).await?;
            if self.is_satisfied() {
                break;
            }
        }

        Ok(())
    }

    async fn call(&mut self, unit: FetchUnit) -> Result<()> {
        self.request.page = unit.page;
        self.request.size = unit.size;
        self.requests += 1;

        self.console.notice("   [*] Performing Request...");
        let outcome = self.client.search(&self.request).await?;

        self.total = outcome.total;
        self.balance = outcome.balance;
        self.last_received = outcome.received;

        self.console
            .notice(&format!("      [+] Retrieved {} records", outcome.received));
        if self.config.print_balance {
            self.console
                .notice(&format!("      [*] Balance: {}", outcome.balance));
        }

        tracing::info!(
            page = unit.page,
            size = unit.size,
            received = outcome.received,
            fetched = self.client.fetched(),
            total = outcome.total,
            "Fetch unit complete"
        );
        Ok(())
    }

    fn is_satisfied(&self) -> bool {
        let fetched = self.fetched();
        fetched >= self.total || fetched >= self.plan.requested() || self.last_received == 0
    }

    fn fetched(&self) -> u64 {
        u64::try_from(self.client.fetched()).unwrap_or(u64::MAX)
    }

    fn confirm_large_fetch(&self, remaining: u64) -> Result<bool> {
        let tokens = remaining.div_ceil(RECORDS_PER_TOKEN);
        self.console.notice(&format!(
            "   [!] {remaining} more records are available. Fetching them requires \
             {tokens} additional tokens (current balance: {}).",
            self.balance
        ));
        self.console
            .confirm("   [?] Do you want to continue?")
            .map_err(SearchError::from)
    }

    fn report_failure(&self, err: &SearchError) {
        match err {
            SearchError::Provider(provider) => {
                tracing::error!(status = provider.status, message = %provider.message, "Dehashed API error");
                self.console.notice(&format!(
                    "      [!] Dehashed API Error: {} (Code: {})",
                    provider.message, provider.status
                ));
            }
            other => {
                tracing::error!(error = %other, "Search request failed");
                self.console
                    .notice(&format!("   [!] Error performing request: {other}"));
            }
        }

        if self.client.fetched() > 0 {
            self.console
                .notice("   [!] Partial results retrieved. Storing Results...");
        }
    }

    async fn finalize(&mut self) {
        let records = self.client.results();
        let credentials = extract_credentials(records);
        let mut finalized = Finalized {
            credentials: credentials.len(),
            ..Finalized::default()
        };

        self.console.notice(&format!(
            "   [+] Discovered {} Credentials",
            credentials.len()
        ));

        if !records.is_empty() {
            match self.store.store_results(records).await {
                Ok(stored) => finalized.stored_results = stored,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to store results");
                    self.console
                        .notice(&format!("   [!] Error storing results: {e}"));
                }
            }
        }

        if !credentials.is_empty() {
            match self.store.store_credentials(&credentials).await {
                Ok(stored) => finalized.stored_credentials = stored,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to store credentials");
                    self.console
                        .notice(&format!("   [!] Error storing credentials: {e}"));
                }
            }
        }

        if records.is_empty() {
            self.console.notice("   [-] No results found");
            self.finalized = finalized;
            return;
        }

        if let Some(exporter) = &self.exporter {
            finalized.export_path = self.export(exporter.as_ref(), records, &credentials);
        }

        let table = if self.config.creds_only {
            credentials_table(&credentials, self.config.display_limit)
        } else {
            results_table(records, self.config.display_limit)
        };
        self.display(&table);

        self.finalized = finalized;
    }

    fn export(
        &self,
        exporter: &dyn ExportSink,
        records: &[BreachRecord],
        credentials: &[Credential],
    ) -> Option<PathBuf> {
        self.console.notice(&format!(
            "   [*] Writing entries to file: {}",
            exporter.target().display()
        ));

        let written = if self.config.creds_only {
            exporter.export_credentials(credentials)
        } else {
            exporter.export_results(records)
        };

        match written {
            Ok(path) => {
                self.console.notice("      [*] Success");
                Some(path)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to write export");
                self.console
                    .notice(&format!("   [!] Error Writing to file: {e}. Outputting to terminal."));
                let fallback = if self.config.creds_only {
                    credentials_text(credentials)
                } else {
                    results_text(records)
                };
                self.console.print(&fallback);
                None
            }
        }
    }

    fn display(&self, table: &Table) {
        if table.is_truncated() {
            self.console.notice(&format!(
                "   [-] Large number of results recovered, displaying first {}...",
                table.rows.len()
            ));
        }
        self.console.print(&table.render(self.console.width()));
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!(from = %self.state, to = %next, "Run state transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(email: &[&str], username: &[&str], password: &[&str]) -> BreachRecord {
        let owned = |values: &[&str]| values.iter().map(ToString::to_string).collect();
        BreachRecord {
            email: owned(email),
            username: owned(username),
            password: owned(password),
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_credentials_takes_first_values() {
        let records = vec![
            record(
                &["jdoe@example.com", "john@example.org"],
                &["jdoe"],
                &["hunter2", "letmein"],
            ),
            record(&["nopass@example.com"], &[], &[]),
            record(&[], &["admin"], &["admin123"]),
        ];

        let credentials = extract_credentials(&records);
        assert_eq!(
            credentials,
            vec![
                Credential {
                    email: "jdoe@example.com".to_string(),
                    username: "jdoe".to_string(),
                    password: "hunter2".to_string(),
                },
                Credential {
                    email: String::new(),
                    username: "admin".to_string(),
                    password: "admin123".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_extract_credentials_empty() {
        assert!(extract_credentials(&[]).is_empty());
    }

    #[test]
    fn test_run_state_names() {
        assert_eq!(RunState::Confirming.to_string(), "confirming");
        assert!(RunState::Failed.is_terminal());
        assert!(RunState::Done.is_terminal());
        assert!(!RunState::Finalizing.is_terminal());
        assert_eq!(
            serde_json::to_value(RunState::Done).expect("serialize state"),
            "done"
        );
    }
}
