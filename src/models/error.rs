use serde::{Deserialize, Serialize};

/// Error body returned by the API on non-2xx responses.
///
/// Services disagree on the field name, some use `message`, Spring's
/// default error handler uses `error`.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct ErrorResponse {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorResponse {
    /// First non-empty human readable message, `message` wins over `error`
    pub fn best_message(&self) -> Option<&str> {
        [self.message.as_deref(), self.error.as_deref()]
            .into_iter()
            .flatten()
            .find(|m| !m.is_empty())
    }
}
