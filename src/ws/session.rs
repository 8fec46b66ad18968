use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::Config;
use crate::models::EditMessage;
use crate::ws::connection::{connect, StompReader, StompWriter};
use crate::ws::error::RealtimeError;
use crate::ws::machine::{SyncAction, SyncInput, SyncMachine, SyncStatus};
use crate::ws::stomp::Command;

/// Where and how to reach the broker for one document
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub url: Url,
    pub topic: String,
    pub destination: String,
    pub debounce: Duration,
    pub handshake_timeout: Duration,
}

impl SyncOptions {
    pub fn from_config(config: &Config, token: &str, doc_id: Uuid) -> Result<Self, RealtimeError> {
        let mut url = Url::parse(&format!(
            "{}{}",
            config.realtime_base_url(),
            config.realtime_path
        ))?;
        url.query_pairs_mut().append_pair("token", token);

        let doc_id = doc_id.to_string();
        Ok(Self {
            url,
            topic: config.doc_topic(&doc_id),
            destination: config.edit_destination(&doc_id),
            debounce: config.edit_debounce(),
            handshake_timeout: config.request_timeout(),
        })
    }
}

/// What the editor renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSnapshot {
    pub status: SyncStatus,
    pub content: String,
    pub presence: Vec<String>,
    /// Local edits and restores the session has applied so far
    pub local_seq: u64,
}

impl SyncSnapshot {
    fn of(machine: &SyncMachine, local_seq: u64) -> Self {
        Self {
            status: machine.status(),
            content: machine.content().to_string(),
            presence: machine.presence().members().to_vec(),
            local_seq,
        }
    }
}

#[derive(Debug)]
enum SyncCommand {
    Edit(String),
    Restore(String),
    Reconnect,
    Close,
}

/// Events coming from the connection task
enum Transport {
    Connected(StompWriter),
    ConnectFailed(String),
    Message(EditMessage),
    Lost(String),
}

/// Open a realtime session for a document.
///
/// The session runs on its own task. Dropping the handle closes it.
pub fn open(
    options: SyncOptions,
    username: impl Into<String>,
    initial_content: impl Into<String>,
) -> SyncHandle {
    let machine = SyncMachine::new(username, initial_content, options.debounce);
    let (commands, command_rx) = mpsc::unbounded_channel();
    let (state_tx, state) = watch::channel(SyncSnapshot::of(&machine, 0));
    let (notice_tx, notices) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let driver = Driver {
        options,
        machine,
        local_seq: 0,
        writer: None,
        generation: 0,
        connection: None,
        events_tx,
        state_tx,
        notice_tx,
    };
    let task = tokio::spawn(driver.run(command_rx, events_rx));

    SyncHandle {
        commands,
        state,
        notices,
        task,
        issued: 0,
    }
}

/// Handle held by the editor view
pub struct SyncHandle {
    commands: mpsc::UnboundedSender<SyncCommand>,
    state: watch::Receiver<SyncSnapshot>,
    notices: mpsc::UnboundedReceiver<String>,
    task: JoinHandle<()>,
    issued: u64,
}

impl SyncHandle {
    /// The user typed, `content` is the whole buffer
    pub fn edit(&mut self, content: impl Into<String>) {
        self.issued += 1;
        self.send(SyncCommand::Edit(content.into()));
    }

    /// Replace the buffer with a historical snapshot
    pub fn restore(&mut self, content: impl Into<String>) {
        self.issued += 1;
        self.send(SyncCommand::Restore(content.into()));
    }

    /// True once the session has applied every edit and restore sent through this handle
    pub fn is_caught_up(&self, snapshot: &SyncSnapshot) -> bool {
        snapshot.local_seq == self.issued
    }

    /// Try again after going offline
    pub fn reconnect(&self) {
        self.send(SyncCommand::Reconnect);
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SyncSnapshot> {
        self.state.clone()
    }

    /// Wait for the next snapshot change. `None` once the session is over.
    pub async fn changed(&mut self) -> Option<SyncSnapshot> {
        self.state.changed().await.ok()?;
        Some(self.state.borrow_and_update().clone())
    }

    pub fn try_notice(&mut self) -> Option<String> {
        self.notices.try_recv().ok()
    }

    pub async fn next_notice(&mut self) -> Option<String> {
        self.notices.recv().await
    }

    /// Leave the document and wait for the session task to finish
    pub async fn close(self) {
        self.send(SyncCommand::Close);
        if let Err(e) = self.task.await {
            warn!("Realtime session task failed: {}", e);
        }
    }

    fn send(&self, command: SyncCommand) {
        if self.commands.send(command).is_err() {
            debug!("Realtime session already finished");
        }
    }
}

struct Driver {
    options: SyncOptions,
    machine: SyncMachine,
    local_seq: u64,
    writer: Option<StompWriter>,
    // Bumped on every connect so events of an abandoned connection are dropped
    generation: u64,
    connection: Option<JoinHandle<()>>,
    events_tx: mpsc::UnboundedSender<(u64, Transport)>,
    state_tx: watch::Sender<SyncSnapshot>,
    notice_tx: mpsc::UnboundedSender<String>,
}

impl Driver {
    async fn run(
        mut self,
        mut command_rx: mpsc::UnboundedReceiver<SyncCommand>,
        mut events_rx: mpsc::UnboundedReceiver<(u64, Transport)>,
    ) {
        info!("Opening realtime session at {}", self.options.topic);
        for action in self.machine.start() {
            self.perform(action).await;
        }

        loop {
            let deadline = self.machine.debounce_deadline();
            let input = tokio::select! {
                command = command_rx.recv() => match command {
                    Some(SyncCommand::Edit(content)) => {
                        self.local_seq += 1;
                        SyncInput::LocalEdit(content)
                    }
                    Some(SyncCommand::Restore(content)) => {
                        self.local_seq += 1;
                        SyncInput::Restore(content)
                    }
                    Some(SyncCommand::Reconnect) => SyncInput::Reconnect,
                    // A dropped handle closes the session
                    Some(SyncCommand::Close) | None => SyncInput::Close,
                },
                Some((generation, event)) = events_rx.recv() => {
                    if generation != self.generation {
                        continue;
                    }
                    match event {
                        Transport::Connected(writer) => {
                            self.writer = Some(writer);
                            SyncInput::Connected
                        }
                        Transport::ConnectFailed(reason) => SyncInput::ConnectFailed(reason),
                        Transport::Message(msg) => SyncInput::Inbound(msg),
                        Transport::Lost(reason) => {
                            self.writer = None;
                            SyncInput::TransportLost(reason)
                        }
                    }
                },
                _ = sleep_until(deadline) => SyncInput::DebounceElapsed,
            };

            self.step(input).await;
            if self.machine.status() == SyncStatus::Closed {
                break;
            }
        }

        if let Some(connection) = self.connection.take() {
            connection.abort();
        }
        info!("Realtime session at {} closed", self.options.topic);
    }

    /// Feed one input, plus whatever follow-up inputs performing its actions produces
    async fn step(&mut self, input: SyncInput) {
        let mut queue = VecDeque::from([input]);
        while let Some(input) = queue.pop_front() {
            let actions = self.machine.handle(input, Instant::now());
            for action in actions {
                if let Some(followup) = self.perform(action).await {
                    queue.push_back(followup);
                }
            }
        }
        self.publish();
    }

    async fn perform(&mut self, action: SyncAction) -> Option<SyncInput> {
        match action {
            SyncAction::Connect => {
                self.spawn_connection();
                None
            }
            SyncAction::Subscribe => {
                let writer = self.writer.as_mut()?;
                match writer.subscribe(&self.options.topic).await {
                    Ok(_) => None,
                    Err(e) => Some(self.send_failed(e)),
                }
            }
            SyncAction::Send(msg) => {
                let body = match serde_json::to_string(&msg) {
                    Ok(body) => body,
                    Err(e) => {
                        warn!("Could not encode realtime message: {}", e);
                        return None;
                    }
                };
                let writer = match self.writer.as_mut() {
                    Some(writer) => writer,
                    None => {
                        debug!("No connection, dropping {:?} message", msg.kind);
                        return None;
                    }
                };
                match writer.send_json(&self.options.destination, &body).await {
                    Ok(()) => None,
                    Err(e) => Some(self.send_failed(e)),
                }
            }
            SyncAction::Disconnect => {
                if let Some(writer) = self.writer.take() {
                    writer.disconnect().await;
                }
                None
            }
            SyncAction::Notify(text) => {
                if self.notice_tx.send(text).is_err() {
                    debug!("Nobody listening for realtime notices");
                }
                None
            }
        }
    }

    // Later sends are dropped until the reader notices the dead socket
    fn send_failed(&mut self, e: RealtimeError) -> SyncInput {
        self.writer = None;
        SyncInput::SendFailed(e.to_string())
    }

    fn spawn_connection(&mut self) {
        if let Some(previous) = self.connection.take() {
            previous.abort();
        }
        self.writer = None;
        self.generation += 1;

        let generation = self.generation;
        let url = self.options.url.clone();
        let timeout = self.options.handshake_timeout;
        let events = self.events_tx.clone();
        self.connection = Some(tokio::spawn(async move {
            match connect(&url, timeout).await {
                Ok((writer, reader)) => {
                    if events.send((generation, Transport::Connected(writer))).is_ok() {
                        read_loop(generation, reader, events).await;
                    }
                }
                Err(e) => {
                    let _ = events.send((generation, Transport::ConnectFailed(e.to_string())));
                }
            }
        }));
    }

    fn publish(&self) {
        let next = SyncSnapshot::of(&self.machine, self.local_seq);
        self.state_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

async fn read_loop(
    generation: u64,
    mut reader: StompReader,
    events: mpsc::UnboundedSender<(u64, Transport)>,
) {
    loop {
        let event = match reader.next_frame().await {
            Some(Ok(frame)) => match frame.command {
                Command::Message => match serde_json::from_str::<EditMessage>(&frame.body) {
                    Ok(msg) => Transport::Message(msg),
                    Err(e) => {
                        warn!("Dropping malformed realtime message: {}", e);
                        continue;
                    }
                },
                Command::Error => {
                    let reason = frame.get("message").unwrap_or(frame.body.as_str());
                    Transport::Lost(format!("broker error: {}", reason))
                }
                other => {
                    debug!("Ignoring {} frame", other);
                    continue;
                }
            },
            Some(Err(RealtimeError::Frame(e))) => {
                warn!("Skipping malformed frame: {}", e);
                continue;
            }
            Some(Err(e)) => Transport::Lost(e.to_string()),
            None => Transport::Lost(RealtimeError::Closed.to_string()),
        };

        let fatal = matches!(event, Transport::Lost(_));
        if events.send((generation, event)).is_err() || fatal {
            return;
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
