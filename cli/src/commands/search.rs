//! `dehasher search`

use crate::args::SearchArgs;
use crate::state::AppState;
use anyhow::Context;
use chrono::Utc;
use dehasher_db::RunRecord;
use dehasher_export::Exporter;
use dehasher_search::{
    DehashedClient, Dehasher, RunConfig, RunReport, SearchError, TerminalConsole,
};
use dehasher_vault::DEHASHED_PROVIDER;
use std::sync::Arc;

/// Run a search and record it in the run history.
pub async fn handle(args: &SearchArgs, state: &AppState) -> anyhow::Result<()> {
    let run = args.run_config(&state.config);
    run.validate()?;

    let keys = state.key_store().await?;
    let api_key = keys
        .api_key(DEHASHED_PROVIDER)
        .await
        .context("failed to read the stored API key")?
        .ok_or(SearchError::MissingApiKey)?;

    let client = DehashedClient::new(api_key.as_str(), &state.config.api)?;
    drop(api_key);

    let started_at = Utc::now();
    let mut dehasher = Dehasher::new(
        &run,
        client,
        Arc::new(state.database.clone()),
        Arc::new(TerminalConsole),
    )?;
    if let Some(target) = &run.output {
        let exporter = Exporter::new(target.file.clone(), target.format);
        dehasher = dehasher.with_exporter(Arc::new(exporter));
    }

    let outcome = dehasher.run().await;
    let report = dehasher.report();
    let error = outcome.as_ref().err().map(ToString::to_string);

    let record = run_record(&run, &report, error, started_at);
    if let Err(e) = state.database.record_run(&record).await {
        tracing::warn!(error = %e, "Failed to record search run");
    }

    outcome.context("search run failed")?;
    Ok(())
}

fn run_record(
    run: &RunConfig,
    report: &RunReport,
    error: Option<String>,
    started_at: chrono::DateTime<Utc>,
) -> RunRecord {
    let config = serde_json::to_value(run).unwrap_or(serde_json::Value::Null);

    let mut record = RunRecord::new(report.query.clone(), config, started_at);
    record.state = report.state.as_str().to_string();
    record.fetched = i64::try_from(report.fetched).unwrap_or(i64::MAX);
    record.total = i64::try_from(report.total).unwrap_or(i64::MAX);
    record.balance = report.balance;
    record.error = error;
    record.finished_at = Utc::now();
    record
}
