pub mod alert;
pub mod chat;
pub mod history;
pub mod notification;
pub mod timestamp;
pub mod view;
pub mod watchlist;

pub use alert::{Alert, AlertContext, AlertId, SearchResultSet, Severity};
pub use chat::{ChatMessage, Sender};
pub use history::HistoryEntry;
pub use notification::Notification;
pub use view::{
    ChatView, DashboardView, HistoryView, LoadStatus, NotificationView, ReportView, SearchView,
    WatchlistView,
};
pub use watchlist::{normalize_query, WatchlistItem};
