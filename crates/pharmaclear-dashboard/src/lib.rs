pub mod chat;
pub mod config;
pub mod history;
pub mod notifications;
pub mod orchestrator;
pub mod report;
pub mod search;
pub mod watchlist;

pub use chat::{ChatOutcome, ChatRejection, ChatSession, ResultSnapshot};
pub use config::DashboardConfig;
pub use history::HistoryStore;
pub use notifications::NotificationPoller;
pub use orchestrator::Dashboard;
pub use report::{report_file_name, ReportDocument, ReportSink, ReportTrigger};
pub use search::{PendingSearch, SearchOutcome, SearchSession};
pub use watchlist::WatchlistStore;

// Re-export the boundary types callers need alongside the orchestrator
pub use pharmaclear_client::{ClientError, DashboardBackend, SessionCredential};
pub use pharmaclear_types::DashboardView;
