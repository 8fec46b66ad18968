use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// Short-lived notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub message: String,
    pub expires_at: Instant,
}

impl fmt::Display for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ToastKind::Success => write!(f, "[ok] {}", self.message),
            ToastKind::Error => write!(f, "[error] {}", self.message),
        }
    }
}

/// Ordered list of visible toasts, oldest first.
///
/// Each toast expires on its own after the queue's time-to-live and can be
/// dismissed earlier by id.
#[derive(Debug)]
pub struct ToastQueue {
    ttl: Duration,
    toasts: Vec<Toast>,
}

impl ToastQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            toasts: Vec::new(),
        }
    }

    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>, now: Instant) -> Uuid {
        let id = Uuid::new_v4();
        self.toasts.push(Toast {
            id,
            kind,
            message: message.into(),
            expires_at: now + self.ttl,
        });
        id
    }

    pub fn success(&mut self, message: impl Into<String>) -> Uuid {
        self.push(ToastKind::Success, message, Instant::now())
    }

    pub fn error(&mut self, message: impl Into<String>) -> Uuid {
        self.push(ToastKind::Error, message, Instant::now())
    }

    /// Returns false when the toast was already gone
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    /// Drop every toast whose time is up
    pub fn expire(&mut self, now: Instant) {
        self.toasts.retain(|t| t.expires_at > now);
    }

    pub fn visible(&self) -> &[Toast] {
        &self.toasts
    }

    /// Hand over everything currently queued, used by the terminal front-end
    /// which prints each toast once.
    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}
