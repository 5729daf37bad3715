pub mod backend;
pub mod config;
pub mod credential;
pub mod error;
pub mod http;

pub use backend::{DashboardBackend, HealthStatus, SearchParams, TokenResponse};
pub use config::ClientConfig;
pub use credential::{BearerToken, SessionCredential};
pub use error::{ClientError, Result};
pub use http::HttpBackend;
