use thiserror::Error;

/// Every way an API call can fail, normalized to one human readable message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server could not be reached at all
    #[error("Network error: cannot reach server")]
    Network,

    /// Non-2xx status, message extracted from the body when there is one
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The body was JSON but not the shape this endpoint returns
    #[error("Unexpected response from server")]
    UnexpectedPayload(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
