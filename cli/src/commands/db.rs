//! `dehasher db` - query the local database.

use crate::args::{CredsArgs, DbCommand, ResultsArgs, RunsArgs};
use crate::state::AppState;
use dehasher_core::OutputFormat;
use dehasher_db::credentials::query_credentials;
use dehasher_db::results::query_results;
use dehasher_db::runs::list_runs;
use dehasher_db::{CredentialFilter, ResultColumn, ResultFilter, RunRecord};
use dehasher_export::{
    credentials_table_with, render_table, results_table_with, terminal_width, Exporter,
};
use std::path::Path;

const RUN_HEADERS: [&str; 7] = ["Started", "State", "Fetched", "Total", "Balance", "Query", "Error"];

/// Dispatch a `db` subcommand.
pub async fn handle(action: &DbCommand, state: &AppState) -> anyhow::Result<()> {
    match action {
        DbCommand::Results(args) => results(args, state).await,
        DbCommand::Creds(args) => creds(args, state).await,
        DbCommand::Runs(args) => runs(args, state).await,
    }
}

async fn results(args: &ResultsArgs, state: &AppState) -> anyhow::Result<()> {
    let filter = result_filter(args)?;
    let records = query_results(state.database.pool(), &filter).await?;
    if records.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    if let Some(file) = &args.output {
        let exporter = exporter(file, args.format, state);
        let path = exporter.write_results(&records)?;
        println!("[*] Wrote {} records to {}", records.len(), path.display());
        return Ok(());
    }

    let table = results_table_with(&records, &args.display, records.len())?;
    println!("{}", table.render(terminal_width()));
    Ok(())
}

async fn creds(args: &CredsArgs, state: &AppState) -> anyhow::Result<()> {
    let filter = CredentialFilter {
        email: args.email.clone(),
        username: args.username.clone(),
        password: args.password.clone(),
        exact: args.exact,
        limit: args.limit,
    };
    let credentials = query_credentials(state.database.pool(), &filter).await?;
    if credentials.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    if let Some(file) = &args.output {
        let exporter = exporter(file, args.format, state);
        let path = exporter.write_credentials(&credentials)?;
        println!(
            "[*] Wrote {} credentials to {}",
            credentials.len(),
            path.display()
        );
        return Ok(());
    }

    let table = credentials_table_with(&credentials, &args.display, credentials.len())?;
    println!("{}", table.render(terminal_width()));
    Ok(())
}

async fn runs(args: &RunsArgs, state: &AppState) -> anyhow::Result<()> {
    let runs = list_runs(state.database.pool(), &args.filter()).await?;
    if runs.is_empty() {
        println!("No runs recorded.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = runs.iter().map(run_row).collect();
    println!("{}", render_table(&RUN_HEADERS, &rows, terminal_width()));
    Ok(())
}

fn result_filter(args: &ResultsArgs) -> anyhow::Result<ResultFilter> {
    let mut matches = Vec::new();
    for (field, value) in args.field_filters() {
        matches.push((field.parse::<ResultColumn>()?, value.to_string()));
    }

    let non_empty = args
        .non_empty
        .iter()
        .filter(|field| !field.trim().is_empty())
        .map(|field| field.parse::<ResultColumn>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ResultFilter {
        matches,
        exact: args.exact,
        non_empty,
        limit: args.limit,
    })
}

fn exporter(file: &Path, format: Option<OutputFormat>, state: &AppState) -> Exporter {
    Exporter::new(
        file.to_path_buf(),
        format.unwrap_or(state.config.export.default_format),
    )
}

fn run_row(run: &RunRecord) -> Vec<String> {
    vec![
        run.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        run.state.clone(),
        run.fetched.to_string(),
        run.total.to_string(),
        run.balance.to_string(),
        run.query.clone(),
        run.error.clone().unwrap_or_default(),
    ]
}
