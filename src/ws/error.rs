use thiserror::Error;

use crate::ws::stomp::FrameError;

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("invalid realtime URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    #[error("broker rejected the connection: {0}")]
    Rejected(String),

    #[error("unexpected {0} frame during handshake")]
    UnexpectedFrame(String),

    #[error("handshake timed out")]
    Timeout,

    #[error("malformed frame: {0}")]
    Frame(#[from] FrameError),

    #[error("message encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connection closed")]
    Closed,
}

impl From<tokio_tungstenite::tungstenite::Error> for RealtimeError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        RealtimeError::WebSocket(Box::new(e))
    }
}
