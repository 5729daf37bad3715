use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Network failure: {0}")]
    Network(String),

    #[error("Authentication rejected: {0}")]
    AuthRejected(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Server rejected request ({status}): {message}")]
    Server { status: u16, message: String },

    /// The operation is already running and cannot be started again yet
    #[error("Busy: {0}")]
    Busy(String),

    /// A result could not be handed to local storage
    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => "Could not reach the server. Please try again.".to_string(),
            ClientError::AuthRejected(_) => "Your session has expired. Please log in again.".to_string(),
            ClientError::Server { message, .. } => message.clone(),
            ClientError::Validation(msg) | ClientError::Busy(msg) => msg.clone(),
            ClientError::Storage(_) => "Could not save the file. Please try again.".to_string(),
            ClientError::InvalidResponse(_) | ClientError::Config(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::AuthRejected(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else if err.is_builder() {
            ClientError::Config(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
