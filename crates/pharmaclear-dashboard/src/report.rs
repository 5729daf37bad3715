use async_trait::async_trait;
use pharmaclear_client::{ClientError, DashboardBackend, Result, SessionCredential};
use pharmaclear_types::{ReportView, SearchResultSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A rendered report ready to be handed to the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Platform file-save mechanism
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Persist the document; returns where it ended up
    async fn save(&self, document: &ReportDocument) -> std::io::Result<String>;
}

/// Suggested file name: lower-cased query, whitespace runs as `-`
pub fn report_file_name(query: &str) -> String {
    let stem = query
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");

    if stem.is_empty() {
        "report.pdf".to_string()
    } else {
        format!("{}-report.pdf", stem)
    }
}

/// Forwards the current results to the report collaborator
pub struct ReportTrigger {
    backend: Arc<dyn DashboardBackend>,
    credential: SessionCredential,
    generating: AtomicBool,
}

/// Clears the generating flag however generation ends
struct GeneratingGuard<'a>(&'a AtomicBool);

impl Drop for GeneratingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ReportTrigger {
    pub fn new(backend: Arc<dyn DashboardBackend>, credential: SessionCredential) -> Self {
        Self {
            backend,
            credential,
            generating: AtomicBool::new(false),
        }
    }

    pub fn is_enabled(&self, results: Option<&SearchResultSet>) -> bool {
        self.credential.is_present() && results.map(|r| !r.is_empty()).unwrap_or(false)
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    pub async fn generate(&self, results: Option<&SearchResultSet>) -> Result<ReportDocument> {
        let results = match results {
            Some(results) if self.is_enabled(Some(results)) => results,
            _ => {
                return Err(ClientError::Validation(
                    "a non-empty result set and an active session are required".to_string(),
                ))
            }
        };

        if self
            .generating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ClientError::Busy(
                "a report is already being generated".to_string(),
            ));
        }
        let _guard = GeneratingGuard(&self.generating);

        let token = self.credential.bearer()?;
        let bytes = self
            .backend
            .generate_report(&token, &results.query, &results.contexts())
            .await?;

        tracing::info!(
            "Generated report for {:?} ({} alerts, {} bytes)",
            results.query,
            results.len(),
            bytes.len()
        );

        Ok(ReportDocument {
            file_name: report_file_name(&results.query),
            bytes,
        })
    }

    pub fn view(&self, results: Option<&SearchResultSet>) -> ReportView {
        ReportView {
            enabled: self.is_enabled(results),
            generating: self.is_generating(),
        }
    }
}
