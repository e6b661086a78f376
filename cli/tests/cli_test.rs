use clap::Parser;
use dehasher_cli::Cli;
use dehasher_db::results::count_results;
use dehasher_db::runs::list_runs;
use dehasher_db::{Database, RunFilter};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Write a config pointing at `endpoint` with fast key derivation and
/// log files under `dir/logs`.
fn write_config(dir: &Path, endpoint: &str) -> PathBuf {
    let config_path = dir.join("config.toml");
    let log_dir = dir.join("logs");
    let contents = format!(
        "[api]\nendpoint = \"{endpoint}\"\ntimeout_secs = 5\n\n\
         [vault]\nargon2_memory_kb = 1024\nargon2_iterations = 1\n\n\
         [logging]\ndirectory = \"{}\"\n",
        log_dir.display()
    );
    std::fs::write(&config_path, contents).expect("write config");
    config_path
}

async fn run(config: &Path, db: &Path, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec![
        "dehasher".to_string(),
        "--config".to_string(),
        config.display().to_string(),
        "--db".to_string(),
        db.display().to_string(),
    ];
    argv.extend(args.iter().map(ToString::to_string));
    dehasher_cli::run(Cli::try_parse_from(argv)?).await
}

#[tokio::test]
async fn test_search_requires_api_key() {
    let tmp = TempDir::new().expect("create temp dir");
    let config = write_config(tmp.path(), "http://127.0.0.1:9/v2/search");
    let db = tmp.path().join("dehasher.db");

    let err = run(&config, &db, &["search", "-E", "jdoe@example.com"])
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("API key is required"));
}

#[tokio::test]
async fn test_search_stores_exports_and_records_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/search"))
        .and(header("Dehashed-Api-Key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "balance": 77,
            "entries": [
                {"id": "a1", "email": ["jdoe@example.com"], "password": ["hunter2"]},
                {"id": "a2", "email": ["jdoe@example.com"], "username": ["jdoe"]},
                {"id": "a3", "username": ["jdoe"], "password": ["letmein"]}
            ],
            "success": true,
            "total": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().expect("create temp dir");
    let config = write_config(tmp.path(), &format!("{}/v2/search", server.uri()));
    let db = tmp.path().join("dehasher.db");
    let output = tmp.path().join("jdoe");

    run(&config, &db, &["set-key", "test-key"])
        .await
        .expect("store key");
    run(
        &config,
        &db,
        &[
            "search",
            "-E",
            "jdoe@example.com",
            "-o",
            &output.display().to_string(),
            "-f",
            "yaml",
        ],
    )
    .await
    .expect("search succeeds");

    let exported = std::fs::read_to_string(tmp.path().join("jdoe.yaml")).expect("read export");
    assert!(exported.contains("a1"));

    let database = Database::open(&db).await.expect("open database");
    assert_eq!(count_results(database.pool()).await.expect("count"), 3);

    let runs = list_runs(database.pool(), &RunFilter::default()).await.expect("list runs");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].state, "done");
    assert_eq!(runs[0].fetched, 3);
    assert_eq!(runs[0].balance, 77);
    assert_eq!(runs[0].query, "email:jdoe@example.com");
}

#[tokio::test]
async fn test_clear_key_then_search_fails() {
    let tmp = TempDir::new().expect("create temp dir");
    let config = write_config(tmp.path(), "http://127.0.0.1:9/v2/search");
    let db = tmp.path().join("dehasher.db");

    run(&config, &db, &["set-key", "test-key"])
        .await
        .expect("store key");
    run(&config, &db, &["clear-key"]).await.expect("clear key");

    let err = run(&config, &db, &["search", "-U", "jdoe"]).await.unwrap_err();
    assert!(format!("{err:#}").contains("API key is required"));
}

#[tokio::test]
async fn test_history_and_log_commands() {
    let tmp = TempDir::new().expect("create temp dir");
    let config = write_config(tmp.path(), "http://127.0.0.1:9/v2/search");
    let db = tmp.path().join("dehasher.db");

    let logs = tmp.path().join("logs");
    std::fs::create_dir_all(&logs).expect("create log dir");
    std::fs::write(
        logs.join("error.log"),
        r#"{"timestamp":"2026-03-03T08:00:00Z","level":"ERROR","fields":{"message":"Search run failed"}}"#,
    )
    .expect("write error log");

    run(&config, &db, &["logs", "-v", "error", "-l", "5"])
        .await
        .expect("show logs");
    run(&config, &db, &["logs", "-s", "2026-03-01", "-e", "2026-03-02"])
        .await
        .expect("show empty log range");
    assert!(run(&config, &db, &["logs", "-v", "verbose"]).await.is_err());

    run(&config, &db, &["db", "runs", "-c", "example", "-x", "3"])
        .await
        .expect("list runs");
    run(&config, &db, &["db", "creds", "-d", "email,password"])
        .await
        .expect("list creds");
}
