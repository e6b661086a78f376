//! Transport client for the breach-data search API.

use crate::error::{ProviderError, Result, SearchError};
use crate::query::SearchRequest;
use dehasher_core::{ApiConfig, BreachRecord};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use zeroize::Zeroizing;

/// Header carrying the provider API key.
const API_KEY_HEADER: &str = "Dehashed-Api-Key";

/// Success envelope returned by the provider.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    balance: i64,
    #[serde(default)]
    entries: Option<Vec<BreachRecord>>,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    total: u64,
}

/// Outcome of one successful search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Records the provider reports as matching the query overall
    pub total: u64,
    /// Remaining provider credits after this call
    pub balance: i64,
    /// Entries returned by this call
    pub received: usize,
}

/// HTTP client that issues search calls and accumulates returned entries.
pub struct DehashedClient {
    http: Client,
    endpoint: String,
    api_key: Zeroizing<String>,
    results: Vec<BreachRecord>,
}

impl fmt::Debug for DehashedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DehashedClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("results", &self.results.len())
            .finish_non_exhaustive()
    }
}

impl DehashedClient {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    /// Returns `SearchError::MissingApiKey` for a blank key, or a transport
    /// error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, config: &ApiConfig) -> Result<Self> {
        let api_key = Zeroizing::new(api_key.into());
        if api_key.trim().is_empty() {
            return Err(SearchError::MissingApiKey);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key,
            results: Vec::new(),
        })
    }

    /// Endpoint the client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issue one search call and append its entries to the accumulator.
    ///
    /// Nothing is appended when the call fails.
    ///
    /// # Errors
    /// - `SearchError::Transport` if the request cannot be sent or read
    /// - `SearchError::Provider` for any non-200 status
    /// - `SearchError::Decode` if the success envelope is malformed
    pub async fn search(&mut self, request: &SearchRequest) -> Result<SearchOutcome> {
        tracing::debug!(
            page = request.page,
            size = request.size,
            query = %request.redacted_query(),
            "Issuing search request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(status = status.as_u16(), "Search request rejected");
            return Err(ProviderError::from_status(status.as_u16()).into());
        }

        let body = response.bytes().await?;
        let envelope: SearchResponse =
            serde_json::from_slice(&body).map_err(|source| SearchError::Decode { source })?;

        let entries = envelope.entries.unwrap_or_default();
        let received = entries.len();
        self.results.extend(entries);

        tracing::debug!(
            received,
            total = envelope.total,
            balance = envelope.balance,
            success = envelope.success,
            fetched = self.results.len(),
            "Search request succeeded"
        );

        Ok(SearchOutcome {
            total: envelope.total,
            balance: envelope.balance,
            received,
        })
    }

    /// Entries accumulated so far.
    #[must_use]
    pub fn results(&self) -> &[BreachRecord] {
        &self.results
    }

    /// Number of entries accumulated so far.
    #[must_use]
    pub fn fetched(&self) -> usize {
        self.results.len()
    }

    /// Take the accumulated entries, leaving the accumulator empty.
    pub fn take_results(&mut self) -> Vec<BreachRecord> {
        std::mem::take(&mut self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::MatchMode;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> ApiConfig {
        ApiConfig {
            endpoint: format!("{}/v2/search", server.uri()),
            timeout_secs: 5,
            ..ApiConfig::default()
        }
    }

    fn request() -> SearchRequest {
        let mut request = SearchRequest::new(1, 100, MatchMode::Exact, false);
        request.add_email_query("jdoe@example.com");
        request
    }

    #[test]
    fn test_blank_key_rejected() {
        let result = DehashedClient::new("  ", &ApiConfig::default());
        assert!(matches!(result, Err(SearchError::MissingApiKey)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let client =
            DehashedClient::new("secret-key-123", &ApiConfig::default()).expect("build client");
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-key-123"));
        assert!(debug.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_search_success_appends_entries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/search"))
            .and(header("Dehashed-Api-Key", "test-key"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(serde_json::json!({
                "page": 1,
                "query": "email:jdoe@example.com",
                "size": 100,
                "wildcard": false,
                "regex": false,
                "de_dupe": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "balance": 41,
                "entries": [
                    {"id": "1", "email": ["jdoe@example.com"], "password": ["hunter2"]},
                    {"id": "2", "email": ["jdoe@example.com"]}
                ],
                "success": true,
                "took": "12ms",
                "total": 2
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = DehashedClient::new("test-key", &config(&server)).expect("build client");
        let outcome = client.search(&request()).await.expect("search");

        assert_eq!(
            outcome,
            SearchOutcome {
                total: 2,
                balance: 41,
                received: 2
            }
        );
        assert_eq!(client.fetched(), 2);
        assert_eq!(client.results()[0].password, vec!["hunter2".to_string()]);

        let taken = client.take_results();
        assert_eq!(taken.len(), 2);
        assert_eq!(client.fetched(), 0);
    }

    #[tokio::test]
    async fn test_null_entries_treated_as_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "balance": 10,
                "entries": null,
                "success": true,
                "total": 0
            })))
            .mount(&server)
            .await;

        let mut client = DehashedClient::new("test-key", &config(&server)).expect("build client");
        let outcome = client.search(&request()).await.expect("search");
        assert_eq!(outcome.received, 0);
        assert_eq!(outcome.total, 0);
        assert_eq!(client.fetched(), 0);
    }

    #[tokio::test]
    async fn test_non_ok_status_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "balance": 0,
                "entries": [{"id": "x"}],
                "success": false,
                "total": 1
            })))
            .mount(&server)
            .await;

        let mut client = DehashedClient::new("test-key", &config(&server)).expect("build client");
        let err = client.search(&request()).await.unwrap_err();

        match err {
            SearchError::Provider(provider) => {
                assert_eq!(provider.status, 403);
                assert_eq!(provider.kind, crate::error::ProviderErrorKind::Forbidden);
            }
            other => panic!("expected provider error, got {other:?}"),
        }
        assert_eq!(client.fetched(), 0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let mut client = DehashedClient::new("test-key", &config(&server)).expect("build client");
        let err = client.search(&request()).await.unwrap_err();
        assert!(matches!(err, SearchError::Decode { .. }));
        assert_eq!(client.fetched(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let config = ApiConfig {
            endpoint: "http://127.0.0.1:9/v2/search".to_string(),
            timeout_secs: 2,
            ..ApiConfig::default()
        };
        let mut client = DehashedClient::new("test-key", &config).expect("build client");
        let err = client.search(&request()).await.unwrap_err();
        assert!(matches!(err, SearchError::Transport(_)));
    }
}
