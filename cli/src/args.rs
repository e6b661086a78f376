//! Command-line arguments.

use crate::dates::{parse_end, parse_start};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use dehasher_core::{AppConfig, OutputFormat};
use dehasher_db::RunFilter;
use dehasher_search::{MatchMode, OutputTarget, Predicates, RunConfig};
use std::path::PathBuf;

/// Top-level CLI parser for the `dehasher` binary.
#[derive(Debug, Parser)]
#[command(
    name = "dehasher",
    version,
    about = "Breach-data reconnaissance against the Dehashed API"
)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Configuration file
    #[arg(long, global = true, value_name = "PATH", env = "DEHASHER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Query the breach-data API
    Search(SearchArgs),
    /// Store the Dehashed API key (encrypted)
    SetKey {
        /// API key
        key: String,
    },
    /// Remove the stored API key
    ClearKey,
    /// Query the local database
    Db {
        /// Table to list
        #[command(subcommand)]
        action: DbCommand,
    },
    /// Show entries from the persistent log files
    Logs(LogsArgs),
}

/// Arguments for `dehasher logs`.
#[derive(Debug, Clone, Args)]
pub struct LogsArgs {
    /// Show only the newest N entries
    #[arg(short = 'l', long)]
    pub last: Option<usize>,

    /// Entries at or after this date (YYYY-MM-DD, RFC 3339, now, or a span like 24h)
    #[arg(short = 's', long, value_parser = parse_start)]
    pub start: Option<DateTime<Utc>>,

    /// Entries before this date (defaults to now)
    #[arg(short = 'e', long, value_parser = parse_end)]
    pub end: Option<DateTime<Utc>>,

    /// Severities to show: info, warn, error (comma separated, default all)
    #[arg(short = 'v', long, value_delimiter = ',')]
    pub severity: Vec<String>,
}

/// Arguments for `dehasher search`.
#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Maximum number of records to retrieve
    #[arg(short = 'm', long)]
    pub max_records: Option<i64>,

    /// Maximum number of requests to make
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_requests: Option<u32>,

    /// Page to start from
    #[arg(short = 's', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub starting_page: u32,

    /// Print the remaining balance after each request
    #[arg(short = 'b', long)]
    pub print_balance: bool,

    /// Treat values as regular expressions
    #[arg(short = 'R', long, conflicts_with = "wildcard_match")]
    pub regex_match: bool,

    /// Allow `*` and `?` wildcards in values
    #[arg(short = 'W', long)]
    pub wildcard_match: bool,

    /// Search passwords in plaintext instead of by SHA-256 hash
    #[arg(long)]
    pub plaintext_password: bool,

    /// Only export and display extracted credentials
    #[arg(short = 'C', long)]
    pub creds_only: bool,

    /// Export format: json, yaml, csv, txt, xml
    #[arg(short = 'f', long, value_parser = parse_format)]
    pub format: Option<OutputFormat>,

    /// Export file name (the format extension is appended)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Username
    #[arg(short = 'U', long)]
    pub username: Option<String>,

    /// Email address
    #[arg(short = 'E', long)]
    pub email: Option<String>,

    /// IP address
    #[arg(short = 'I', long)]
    pub ip: Option<String>,

    /// Domain
    #[arg(short = 'D', long)]
    pub domain: Option<String>,

    /// Password (hashed before sending unless --plaintext-password)
    #[arg(short = 'P', long)]
    pub password: Option<String>,

    /// Password hash
    #[arg(short = 'Q', long)]
    pub hash: Option<String>,

    /// Person name
    #[arg(short = 'N', long)]
    pub name: Option<String>,

    /// Vehicle identification number
    #[arg(short = 'V', long)]
    pub vin: Option<String>,

    /// License plate
    #[arg(short = 'L', long)]
    pub license: Option<String>,

    /// Postal address
    #[arg(short = 'A', long)]
    pub address: Option<String>,

    /// Phone number
    #[arg(short = 'M', long)]
    pub phone: Option<String>,

    /// Social media handle
    #[arg(short = 'S', long)]
    pub social: Option<String>,

    /// Cryptocurrency address
    #[arg(short = 'B', long)]
    pub crypto: Option<String>,
}

impl SearchArgs {
    /// Search predicates given on the command line.
    #[must_use]
    pub fn predicates(&self) -> Predicates {
        Predicates {
            username: self.username.clone(),
            email: self.email.clone(),
            ip_address: self.ip.clone(),
            hashed_password: self.hash.clone(),
            password: self.password.clone(),
            name: self.name.clone(),
            domain: self.domain.clone(),
            vin: self.vin.clone(),
            license_plate: self.license.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
            social: self.social.clone(),
            crypto_address: self.crypto.clone(),
        }
    }

    /// Build the run configuration, filling gaps from `config`.
    #[must_use]
    pub fn run_config(&self, config: &AppConfig) -> RunConfig {
        let mut run = RunConfig::new(self.predicates(), &config.search);

        if let Some(max_records) = self.max_records {
            run.max_records = max_records;
        }
        run.max_requests = self.max_requests;
        run.starting_page = self.starting_page;
        run.match_mode = if self.regex_match {
            MatchMode::Regex
        } else if self.wildcard_match {
            MatchMode::Wildcard
        } else {
            MatchMode::Exact
        };
        run.force_plaintext = self.plaintext_password;
        run.creds_only = self.creds_only;
        run.print_balance = self.print_balance;
        run.output = Some(OutputTarget {
            file: self
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.export.default_file)),
            format: self.format.unwrap_or(config.export.default_format),
        });
        run
    }
}

/// `dehasher db` subcommands.
#[derive(Debug, Subcommand)]
pub enum DbCommand {
    /// List stored breach records
    Results(ResultsArgs),
    /// List stored credentials
    Creds(CredsArgs),
    /// List past search runs
    Runs(RunsArgs),
}

/// Arguments for `dehasher db runs`.
#[derive(Debug, Clone, Args)]
pub struct RunsArgs {
    /// Runs started on or after this date
    #[arg(short = 's', long, value_parser = parse_start)]
    pub start_date: Option<DateTime<Utc>>,

    /// Runs started on or before this date
    #[arg(short = 'e', long, value_parser = parse_end)]
    pub end_date: Option<DateTime<Utc>>,

    /// Runs whose query contains this text
    #[arg(short = 'c', long)]
    pub contains: Option<String>,

    /// Show the newest N runs, oldest first
    #[arg(short = 'x', long, value_parser = clap::value_parser!(i64).range(1..))]
    pub last: Option<i64>,

    /// Maximum rows to show
    #[arg(short = 'l', long, default_value_t = dehasher_db::runs::DEFAULT_RUN_LIMIT)]
    pub limit: i64,
}

impl RunsArgs {
    /// Run-history filter for these arguments.
    #[must_use]
    pub fn filter(&self) -> RunFilter {
        RunFilter {
            start: self.start_date,
            end: self.end_date,
            contains: self.contains.clone(),
            last: self.last,
            limit: self.limit,
        }
    }
}

/// Arguments for `dehasher db results`.
#[derive(Debug, Clone, Args)]
pub struct ResultsArgs {
    /// Username
    #[arg(short = 'U', long)]
    pub username: Option<String>,

    /// Email address
    #[arg(short = 'E', long)]
    pub email: Option<String>,

    /// IP address
    #[arg(short = 'I', long)]
    pub ip: Option<String>,

    /// Password
    #[arg(short = 'P', long)]
    pub password: Option<String>,

    /// Password hash
    #[arg(short = 'Q', long)]
    pub hash: Option<String>,

    /// Person name
    #[arg(short = 'N', long)]
    pub name: Option<String>,

    /// Domain or URL
    #[arg(short = 'D', long)]
    pub domain: Option<String>,

    /// Vehicle identification number
    #[arg(short = 'V', long)]
    pub vin: Option<String>,

    /// License plate
    #[arg(short = 'L', long)]
    pub license: Option<String>,

    /// Postal address
    #[arg(short = 'A', long)]
    pub address: Option<String>,

    /// Phone number
    #[arg(short = 'M', long)]
    pub phone: Option<String>,

    /// Social media handle
    #[arg(short = 'S', long)]
    pub social: Option<String>,

    /// Cryptocurrency address
    #[arg(short = 'B', long)]
    pub crypto: Option<String>,

    /// Company
    #[arg(long)]
    pub company: Option<String>,

    /// Breached database name
    #[arg(long)]
    pub database: Option<String>,

    /// Match list elements exactly instead of by substring
    #[arg(short = 'x', long)]
    pub exact: bool,

    /// Only rows where these fields hold a value (comma separated)
    #[arg(short = 'n', long, value_delimiter = ',')]
    pub non_empty: Vec<String>,

    /// Maximum rows to return
    #[arg(short = 'l', long, default_value_t = 100)]
    pub limit: i64,

    /// Fields shown in the table (comma separated)
    #[arg(short = 'd', long, value_delimiter = ',')]
    pub display: Vec<String>,

    /// Export file name instead of printing a table
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Export format: json, yaml, csv, txt, xml
    #[arg(short = 'f', long, value_parser = parse_format)]
    pub format: Option<OutputFormat>,
}

impl ResultsArgs {
    /// Per-field filters as `(field, value)` pairs.
    #[must_use]
    pub fn field_filters(&self) -> Vec<(&'static str, &str)> {
        [
            ("username", &self.username),
            ("email", &self.email),
            ("ip_address", &self.ip),
            ("password", &self.password),
            ("hashed_password", &self.hash),
            ("name", &self.name),
            ("url", &self.domain),
            ("vin", &self.vin),
            ("license_plate", &self.license),
            ("address", &self.address),
            ("phone", &self.phone),
            ("social", &self.social),
            ("cryptocurrency_address", &self.crypto),
            ("company", &self.company),
            ("database_name", &self.database),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }
}

/// Arguments for `dehasher db creds`.
#[derive(Debug, Clone, Args)]
pub struct CredsArgs {
    /// Email address
    #[arg(short = 'E', long)]
    pub email: Option<String>,

    /// Username
    #[arg(short = 'U', long)]
    pub username: Option<String>,

    /// Password
    #[arg(short = 'P', long)]
    pub password: Option<String>,

    /// Exact match instead of substring
    #[arg(short = 'x', long)]
    pub exact: bool,

    /// Maximum rows to return
    #[arg(short = 'l', long, default_value_t = 100)]
    pub limit: i64,

    /// Fields shown in the table (comma separated)
    #[arg(short = 'd', long, value_delimiter = ',')]
    pub display: Vec<String>,

    /// Export file name instead of printing a table
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Export format: json, yaml, csv, txt, xml
    #[arg(short = 'f', long, value_parser = parse_format)]
    pub format: Option<OutputFormat>,
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    value.parse().map_err(|e: dehasher_core::DehasherError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("cli should parse")
    }

    fn search_args(cli: Cli) -> SearchArgs {
        match cli.command {
            Commands::Search(args) => args,
            other => panic!("expected search command, got {other:?}"),
        }
    }

    #[test]
    fn test_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_defaults() {
        let args = search_args(parse(&["dehasher", "search", "-D", "example.com"]));
        let run = args.run_config(&AppConfig::default());

        assert_eq!(run.max_records, 30_000);
        assert_eq!(run.max_requests, None);
        assert_eq!(run.starting_page, 1);
        assert_eq!(run.match_mode, MatchMode::Exact);
        assert_eq!(
            run.output,
            Some(OutputTarget {
                file: PathBuf::from("query"),
                format: OutputFormat::Json,
            })
        );
        assert_eq!(run.predicates.domain.as_deref(), Some("example.com"));
        assert!(run.validate().is_ok());
    }

    #[test]
    fn test_search_flags_map_to_run_config() {
        let cli = parse(&[
            "dehasher",
            "--debug",
            "search",
            "-m",
            "25000",
            "-r",
            "3",
            "-s",
            "2",
            "-W",
            "-b",
            "-C",
            "-f",
            "csv",
            "-o",
            "acme",
            "-U",
            "john doe",
            "-P",
            "hunter2",
            "-B",
            "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh",
        ]);
        assert!(cli.debug);
        let run = search_args(cli).run_config(&AppConfig::default());

        assert_eq!(run.max_records, 25_000);
        assert_eq!(run.max_requests, Some(3));
        assert_eq!(run.starting_page, 2);
        assert_eq!(run.match_mode, MatchMode::Wildcard);
        assert!(run.print_balance);
        assert!(run.creds_only);
        assert!(!run.force_plaintext);
        assert_eq!(
            run.output,
            Some(OutputTarget {
                file: PathBuf::from("acme"),
                format: OutputFormat::Csv,
            })
        );
        assert_eq!(run.predicates.username.as_deref(), Some("john doe"));
        assert_eq!(run.predicates.password.as_deref(), Some("hunter2"));
        assert_eq!(
            run.predicates.crypto_address.as_deref(),
            Some("bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh")
        );
    }

    #[test]
    fn test_regex_and_wildcard_conflict() {
        let result = Cli::try_parse_from(["dehasher", "search", "-R", "-W", "-E", "a@b.io"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_max_requests_rejected() {
        let result = Cli::try_parse_from(["dehasher", "search", "-r", "0", "-E", "a@b.io"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = Cli::try_parse_from(["dehasher", "search", "-f", "html", "-E", "a@b.io"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_db_results_filters() {
        let cli = parse(&[
            "dehasher",
            "db",
            "results",
            "-E",
            "example.com",
            "--company",
            "Acme",
            "-n",
            "password,phone",
            "-x",
        ]);
        let Commands::Db {
            action: DbCommand::Results(args),
        } = cli.command
        else {
            panic!("expected db results");
        };

        assert_eq!(
            args.field_filters(),
            vec![("email", "example.com"), ("company", "Acme")]
        );
        assert_eq!(args.non_empty, vec!["password", "phone"]);
        assert!(args.exact);
        assert_eq!(args.limit, 100);
    }

    #[test]
    fn test_db_runs_filters() {
        let cli = parse(&[
            "dehasher", "db", "runs", "-s", "2026-03-01", "-e", "2026-03-02", "-c", "example", "-x",
            "5",
        ]);
        let Commands::Db {
            action: DbCommand::Runs(args),
        } = cli.command
        else {
            panic!("expected db runs");
        };

        let filter = args.filter();
        assert_eq!(
            filter.start.map(|d| d.to_rfc3339()),
            Some("2026-03-01T00:00:00+00:00".to_string())
        );
        assert_eq!(
            filter.end.map(|d| d.to_rfc3339()),
            Some("2026-03-03T00:00:00+00:00".to_string())
        );
        assert_eq!(filter.contains.as_deref(), Some("example"));
        assert_eq!(filter.last, Some(5));
        assert_eq!(filter.limit, 100);

        assert!(Cli::try_parse_from(["dehasher", "db", "runs", "-s", "last tuesday"]).is_err());
        assert!(Cli::try_parse_from(["dehasher", "db", "runs", "-x", "0"]).is_err());
    }

    #[test]
    fn test_db_creds_display_fields() {
        let cli = parse(&["dehasher", "db", "creds", "-d", "email,password"]);
        let Commands::Db {
            action: DbCommand::Creds(args),
        } = cli.command
        else {
            panic!("expected db creds");
        };
        assert_eq!(args.display, vec!["email", "password"]);
    }

    #[test]
    fn test_logs_args() {
        let cli = parse(&["dehasher", "logs", "-l", "20", "-v", "warn,error", "-s", "7d"]);
        let Commands::Logs(args) = cli.command else {
            panic!("expected logs");
        };
        assert_eq!(args.last, Some(20));
        assert_eq!(args.severity, vec!["warn", "error"]);
        assert!(args.start.is_some());
        assert!(args.end.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["dehasher", "clear-key", "--db", "/tmp/x.db"]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(cli.command, Commands::ClearKey));
    }
}
