// REST-over-HTTP implementation of the dashboard backend

use crate::backend::{DashboardBackend, HealthStatus, SearchParams, TokenResponse};
use crate::config::ClientConfig;
use crate::credential::BearerToken;
use crate::error::{ClientError, Result};
use async_trait::async_trait;
use pharmaclear_types::{Alert, AlertContext, HistoryEntry, Notification, SearchResultSet, WatchlistItem};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// HTTP client for the PharmaClear API
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http_client: Client,
    api_base: String,
    report_base: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Alert>,
    #[serde(default)]
    total: Option<usize>,
}

#[derive(Deserialize)]
struct ChatResponse {
    answer: String,
}

#[derive(Serialize)]
struct QueryBody<'a> {
    query_text: &'a str,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    question: &'a str,
    context_alerts: &'a [AlertContext],
}

#[derive(Serialize)]
struct ReportBody<'a> {
    query: &'a str,
    alerts: &'a [AlertContext],
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_base: config.api_base(),
            report_base: config.report_base(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn authed(&self, builder: RequestBuilder, token: &BearerToken) -> RequestBuilder {
        builder.bearer_auth(token.as_str())
    }

    /// Send a request and map any non-success status into a `ClientError`
    async fn execute(&self, builder: RequestBuilder, what: &str) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            tracing::debug!("{} succeeded: {}", what, status);
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read response body".to_string());
        let message = error_message(status, &body);

        tracing::debug!("{} failed: status={}, body={}", what, status, body);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(ClientError::AuthRejected(message))
        } else {
            Err(ClientError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn execute_json<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> Result<T> {
        let response = self.execute(builder, what).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("{}: {}", what, e)))
    }
}

/// Pull the `detail` message out of an error body, when it is a plain string
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("detail")?.as_str().map(str::to_string)
}

/// User-facing text for a failed response.
///
/// A string `detail` wins. Structured bodies (validation lists and the like)
/// and empty bodies fall back to the status reason; only plain text is kept.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Some(detail) = extract_detail(body) {
        return detail;
    }

    let body = body.trim();
    if body.is_empty() || serde_json::from_str::<serde_json::Value>(body).is_ok() {
        status.canonical_reason().unwrap_or("Request failed").to_string()
    } else {
        body.to_string()
    }
}

fn require_text(value: &str, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::Validation(format!("{} must not be empty", what)));
    }
    Ok(trimmed.to_string())
}

#[async_trait]
impl DashboardBackend for HttpBackend {
    async fn issue_token(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let username = require_text(username, "username")?;
        if password.is_empty() {
            return Err(ClientError::Validation("password must not be empty".to_string()));
        }

        let request = self
            .http_client
            .post(self.url("/api/token"))
            .form(&[("username", username.as_str()), ("password", password)]);

        self.execute_json(request, "issue-token").await
    }

    async fn search_alerts(
        &self,
        token: &BearerToken,
        query: &str,
        params: SearchParams,
    ) -> Result<SearchResultSet> {
        let query = require_text(query, "query")?;

        let mut pairs: Vec<(&str, String)> = vec![("q", query.clone())];
        if let Some(page) = params.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = params.limit {
            pairs.push(("limit", limit.to_string()));
        }

        let request = self.authed(self.http_client.get(self.url("/api/search")), token).query(&pairs);
        let response: SearchResponse = self.execute_json(request, "search-alerts").await?;

        let total = response.total.unwrap_or(response.results.len());
        Ok(SearchResultSet::new(query, response.results, total))
    }

    async fn list_search_history(&self, token: &BearerToken) -> Result<Vec<HistoryEntry>> {
        let request = self.authed(self.http_client.get(self.url("/api/searches/")), token);
        self.execute_json(request, "list-search-history").await
    }

    async fn record_search(&self, token: &BearerToken, query: &str) -> Result<HistoryEntry> {
        let query = require_text(query, "query")?;
        let request = self
            .authed(self.http_client.post(self.url("/api/searches/")), token)
            .json(&QueryBody { query_text: &query });
        self.execute_json(request, "record-search").await
    }

    async fn list_watchlist(&self, token: &BearerToken) -> Result<Vec<WatchlistItem>> {
        let request = self.authed(self.http_client.get(self.url("/api/watchlist/")), token);
        self.execute_json(request, "list-watchlist").await
    }

    async fn add_watchlist(&self, token: &BearerToken, query: &str) -> Result<WatchlistItem> {
        let query = require_text(query, "query")?;
        let request = self
            .authed(self.http_client.post(self.url("/api/watchlist/")), token)
            .json(&QueryBody { query_text: &query });
        self.execute_json(request, "add-watchlist").await
    }

    async fn remove_watchlist(&self, token: &BearerToken, id: i64) -> Result<()> {
        let request = self.authed(
            self.http_client.delete(self.url(&format!("/api/watchlist/{}", id))),
            token,
        );
        self.execute(request, "remove-watchlist").await?;
        Ok(())
    }

    async fn send_chat(
        &self,
        token: &BearerToken,
        question: &str,
        context_alerts: &[AlertContext],
    ) -> Result<String> {
        let question = require_text(question, "question")?;
        let request = self
            .authed(self.http_client.post(self.url("/api/chat")), token)
            .json(&ChatBody {
                question: &question,
                context_alerts,
            });
        let response: ChatResponse = self.execute_json(request, "send-chat").await?;
        Ok(response.answer)
    }

    async fn list_notifications(&self, token: &BearerToken) -> Result<Vec<Notification>> {
        let request = self.authed(self.http_client.get(self.url("/api/notifications/")), token);
        self.execute_json(request, "list-notifications").await
    }

    async fn mark_notifications_read(&self, token: &BearerToken) -> Result<()> {
        let request = self.authed(self.http_client.post(self.url("/api/notifications/read")), token);
        self.execute(request, "mark-notifications-read").await?;
        Ok(())
    }

    async fn generate_report(
        &self,
        token: &BearerToken,
        query: &str,
        alerts: &[AlertContext],
    ) -> Result<Vec<u8>> {
        let query = require_text(query, "query")?;
        let request = self
            .authed(
                self.http_client
                    .post(format!("{}/api/generate-report", self.report_base)),
                token,
            )
            .json(&ReportBody {
                query: &query,
                alerts,
            });
        let response = self.execute(request, "generate-report").await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn health(&self) -> Result<HealthStatus> {
        let request = self.http_client.get(self.url("/api/health"));
        self.execute_json(request, "health").await
    }
}
