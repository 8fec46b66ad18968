//! Realtime sync state machine for one open document.
//!
//! Pure and synchronous: inputs go in, actions for the driver come out.
//! Sockets, timers and channels live in `session.rs`.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::models::{EditMessage, MessageKind};
use crate::ws::debounce::Debounce;
use crate::ws::presence::Presence;

pub const OFFLINE_NOTICE: &str = "Realtime connection lost (Offline Mode)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Connecting,
    Live,
    Offline,
    Closed,
}

impl SyncStatus {
    pub fn label(self) -> &'static str {
        match self {
            SyncStatus::Connecting => "Connecting...",
            SyncStatus::Live => "Live",
            SyncStatus::Offline => "Offline Mode",
            SyncStatus::Closed => "Closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncInput {
    /// Handshake completed
    Connected,
    /// Handshake failed
    ConnectFailed(String),
    /// The user typed, carries the whole new buffer
    LocalEdit(String),
    /// A historical snapshot replaces the buffer
    Restore(String),
    /// The debounce deadline passed
    DebounceElapsed,
    /// A message arrived on the document topic
    Inbound(EditMessage),
    /// The reader saw the socket close or a broker ERROR frame
    TransportLost(String),
    /// A SEND could not be written, the message is dropped
    SendFailed(String),
    /// Explicit user request to try again from Offline
    Reconnect,
    /// The editor is going away
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    Connect,
    Subscribe,
    Send(EditMessage),
    Disconnect,
    Notify(String),
}

pub struct SyncMachine {
    username: String,
    status: SyncStatus,
    content: String,
    presence: Presence,
    debounce: Debounce,
}

impl SyncMachine {
    pub fn new(username: impl Into<String>, content: impl Into<String>, delay: Duration) -> Self {
        Self {
            username: username.into(),
            status: SyncStatus::Connecting,
            content: content.into(),
            presence: Presence::default(),
            debounce: Debounce::new(delay),
        }
    }

    /// Actions to run when the editor opens
    pub fn start(&self) -> Vec<SyncAction> {
        vec![SyncAction::Connect]
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// When the driver should feed `DebounceElapsed`
    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    pub fn handle(&mut self, input: SyncInput, now: Instant) -> Vec<SyncAction> {
        match self.status {
            SyncStatus::Connecting => self.on_connecting(input, now),
            SyncStatus::Live => self.on_live(input, now),
            SyncStatus::Offline => self.on_offline(input),
            SyncStatus::Closed => {
                debug!("Ignoring {:?} after close", input);
                Vec::new()
            }
        }
    }

    fn on_connecting(&mut self, input: SyncInput, now: Instant) -> Vec<SyncAction> {
        match input {
            SyncInput::Connected => {
                self.transition(SyncStatus::Live);
                vec![
                    SyncAction::Subscribe,
                    SyncAction::Send(EditMessage::join(&self.username)),
                ]
            }
            SyncInput::ConnectFailed(reason) => {
                warn!("Realtime handshake failed: {}", reason);
                self.go_offline()
            }
            SyncInput::LocalEdit(content) => {
                self.content = content.clone();
                self.debounce.arm(now, content);
                Vec::new()
            }
            SyncInput::Restore(content) => {
                // Nothing to broadcast to yet
                self.debounce.cancel();
                self.content = content;
                Vec::new()
            }
            SyncInput::DebounceElapsed => {
                if self.debounce.take_due(now).is_some() {
                    debug!("Edit not broadcast, still connecting");
                }
                Vec::new()
            }
            SyncInput::Close => {
                self.close();
                Vec::new()
            }
            SyncInput::Inbound(_)
            | SyncInput::TransportLost(_)
            | SyncInput::SendFailed(_)
            | SyncInput::Reconnect => Vec::new(),
        }
    }

    fn on_live(&mut self, input: SyncInput, now: Instant) -> Vec<SyncAction> {
        match input {
            SyncInput::LocalEdit(content) => {
                self.content = content.clone();
                self.debounce.arm(now, content);
                Vec::new()
            }
            SyncInput::DebounceElapsed => match self.debounce.take_due(now) {
                Some(content) => vec![SyncAction::Send(EditMessage::edit(&self.username, &content))],
                None => Vec::new(),
            },
            SyncInput::Restore(content) => {
                // The restore supersedes whatever was typed before it
                self.debounce.cancel();
                self.content = content;
                vec![SyncAction::Send(EditMessage::edit(&self.username, &self.content))]
            }
            SyncInput::Inbound(msg) => {
                self.apply_inbound(msg);
                Vec::new()
            }
            SyncInput::TransportLost(reason) => {
                warn!("Realtime transport lost: {}", reason);
                self.go_offline()
            }
            // No retry and no notice, the reader reports a dead socket
            SyncInput::SendFailed(reason) => {
                warn!("Dropping realtime message, send failed: {}", reason);
                Vec::new()
            }
            SyncInput::Close => {
                self.close();
                vec![
                    SyncAction::Send(EditMessage::leave(&self.username)),
                    SyncAction::Disconnect,
                ]
            }
            SyncInput::Connected | SyncInput::ConnectFailed(_) | SyncInput::Reconnect => Vec::new(),
        }
    }

    fn on_offline(&mut self, input: SyncInput) -> Vec<SyncAction> {
        match input {
            // Local only, nothing is scheduled for broadcast
            SyncInput::LocalEdit(content) | SyncInput::Restore(content) => {
                self.content = content;
                Vec::new()
            }
            SyncInput::Reconnect => {
                info!("Reconnecting realtime session on request");
                self.transition(SyncStatus::Connecting);
                vec![SyncAction::Connect]
            }
            SyncInput::Close => {
                self.close();
                Vec::new()
            }
            SyncInput::Connected
            | SyncInput::ConnectFailed(_)
            | SyncInput::DebounceElapsed
            | SyncInput::Inbound(_)
            | SyncInput::TransportLost(_)
            | SyncInput::SendFailed(_) => Vec::new(),
        }
    }

    fn apply_inbound(&mut self, msg: EditMessage) {
        match msg.kind {
            MessageKind::Edit => {
                // Our own edit coming back from the broker
                if msg.sender == self.username {
                    return;
                }
                debug!("Remote edit from {}", msg.sender);
                self.content = msg.content.unwrap_or_default();
            }
            MessageKind::Join | MessageKind::Leave => {
                self.presence.replace_from(msg.content_or_empty());
                debug!("Presence is now {:?}", self.presence.members());
            }
            MessageKind::Cursor | MessageKind::Unknown(_) => {}
        }
    }

    fn go_offline(&mut self) -> Vec<SyncAction> {
        self.debounce.cancel();
        self.transition(SyncStatus::Offline);
        vec![SyncAction::Notify(OFFLINE_NOTICE.to_string())]
    }

    fn close(&mut self) {
        self.debounce.cancel();
        self.transition(SyncStatus::Closed);
    }

    fn transition(&mut self, next: SyncStatus) {
        info!("Realtime status {} -> {}", self.status.label(), next.label());
        self.status = next;
    }
}
