use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

/// Failure of a single call against the gallery REST API.
#[derive(Debug, Error)]
pub enum ApiRequestError {
    #[error("{operation} failed: {error}")]
    Status {
        operation: &'static str,
        status: u16,
        error: ApiError,
    },
    #[error("{operation} failed: no response from server: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{operation} failed: invalid response body: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiRequestError {
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ApiRequestError::Status { error, .. } => Some(error.code),
            ApiRequestError::Transport { .. } | ApiRequestError::Decode { .. } => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.code() == Some(ErrorCode::Unauthorized)
    }

    /// Message suitable for showing next to the action that failed.
    pub fn user_message(&self) -> String {
        match self {
            ApiRequestError::Status { error, .. } => error.message.clone(),
            ApiRequestError::Transport { .. } => {
                "No response from server. Please check your connection.".to_string()
            }
            ApiRequestError::Decode { .. } => "Unexpected response from server".to_string(),
        }
    }
}
