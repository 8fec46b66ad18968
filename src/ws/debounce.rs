use std::time::Duration;

use tokio::time::Instant;

/// Single-slot trailing-edge debounce.
///
/// Arming always replaces the pending content and pushes the deadline out,
/// so a burst of edits produces one send once the burst goes quiet.
#[derive(Debug)]
pub struct Debounce {
    delay: Duration,
    pending: Option<Pending>,
}

#[derive(Debug)]
struct Pending {
    deadline: Instant,
    content: String,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn arm(&mut self, now: Instant, content: String) {
        self.pending = Some(Pending {
            deadline: now + self.delay,
            content,
        });
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending content if its quiet period is over
    pub fn take_due(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some(p) if p.deadline <= now => self.pending.take().map(|p| p.content),
            _ => None,
        }
    }
}
