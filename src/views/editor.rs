use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::context::AppContext;
use crate::models::VersionSnapshot;
use crate::routes::Route;
use crate::ui::{ConfirmAction, ConfirmDialog, ConfirmRequest};
use crate::ws::{self, SyncHandle, SyncOptions, SyncSnapshot, SyncStatus};

/// One open document: its live buffer, who else is here and its history
pub struct EditorView {
    pub doc_id: Uuid,
    pub title: String,
    pub owner_username: String,
    pub history: Vec<VersionSnapshot>,
    pub show_history: bool,
    pub confirm: ConfirmDialog,
    // The buffer the user sees, ahead of the session until it catches up
    content: String,
    sync: SyncHandle,
}

impl EditorView {
    /// Load the document and join its realtime session.
    ///
    /// A document that cannot be loaded sends the user back to the dashboard.
    pub async fn open(ctx: &mut AppContext, doc_id: Uuid) -> Option<Self> {
        let Some((token, username)) = ctx
            .session()
            .map(|s| (s.token.clone(), s.username.clone()))
        else {
            ctx.navigate(Route::Login);
            return None;
        };

        // 1. Load the document
        let doc = match ctx.api.get_document(&token, doc_id).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Could not open document {}: {}", doc_id, e);
                ctx.navigate(Route::Dashboard);
                return None;
            }
        };

        // 2. Join the realtime session
        let options = match SyncOptions::from_config(&ctx.config, &token, doc_id) {
            Ok(options) => options,
            Err(e) => {
                error!("Invalid realtime endpoint: {}", e);
                ctx.toasts.error(e.to_string());
                ctx.navigate(Route::Dashboard);
                return None;
            }
        };
        let sync = ws::open(options, username, doc.content.clone());

        let mut view = Self {
            doc_id,
            title: doc.title,
            owner_username: doc.owner_username,
            history: Vec::new(),
            show_history: false,
            confirm: ConfirmDialog::default(),
            content: doc.content,
            sync,
        };

        // 3. History is loaded up front, failures only toast
        view.load_history(ctx).await;
        ctx.navigate(Route::Editor(doc_id));
        info!("Opened document {} ({})", view.title, doc_id);
        Some(view)
    }

    /// Session state with the local buffer in place of the session's content
    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            content: self.content.clone(),
            ..self.sync.snapshot()
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn status(&self) -> SyncStatus {
        self.sync.snapshot().status
    }

    pub fn status_label(&self) -> &'static str {
        self.status().label()
    }

    pub fn presence(&self) -> Vec<String> {
        self.sync.snapshot().presence
    }

    /// The user changed the buffer, `content` is the whole new text
    pub fn edit(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.sync.edit(self.content.clone());
    }

    /// Add a line at the end of the buffer
    pub fn append_line(&mut self, text: &str) {
        let mut content = self.content.clone();
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(text);
        self.edit(content);
    }

    /// Wait until the session publishes something new.
    ///
    /// Remote content is adopted only once the session has applied every
    /// local edit, otherwise the buffer would jump back to an older text.
    pub async fn changed(&mut self) -> Option<SyncSnapshot> {
        let mut snapshot = self.sync.changed().await?;
        if self.sync.is_caught_up(&snapshot) {
            if snapshot.content != self.content {
                debug!("Adopting session content for {}", self.doc_id);
                self.content = snapshot.content.clone();
            }
        } else {
            snapshot.content = self.content.clone();
        }
        Some(snapshot)
    }

    /// Move realtime notices into the toast list
    pub fn pump_notices(&mut self, ctx: &mut AppContext) {
        while let Some(notice) = self.sync.try_notice() {
            ctx.toasts.error(notice);
        }
    }

    pub fn reconnect(&self) {
        self.sync.reconnect();
    }

    pub async fn load_history(&mut self, ctx: &mut AppContext) {
        let Some(token) = ctx.token().map(str::to_string) else {
            return;
        };
        match ctx.api.document_versions(&token, self.doc_id).await {
            Ok(history) => {
                debug!("Loaded {} versions of {}", history.len(), self.doc_id);
                self.history = history;
            }
            Err(e) => {
                ctx.toasts.error(e.to_string());
            }
        }
    }

    pub fn toggle_history(&mut self) {
        self.show_history = !self.show_history;
    }

    /// Ask before replacing the buffer. Returns false for an unknown version.
    pub fn request_restore(&mut self, version_id: i64) -> bool {
        let Some(version) = self.history.iter().find(|v| v.id == version_id) else {
            return false;
        };
        let request = ConfirmRequest::restore_version(version);
        self.confirm.open(request);
        true
    }

    pub fn cancel(&mut self) {
        self.confirm.cancel();
    }

    pub fn confirm(&mut self, ctx: &mut AppContext) {
        let Some(action) = self.confirm.confirm() else {
            return;
        };
        match action {
            ConfirmAction::RestoreVersion { version_id } => {
                let Some(version) = self.history.iter().find(|v| v.id == version_id) else {
                    ctx.toasts.error("Version not found");
                    return;
                };
                info!("Restoring version {} of {}", version_id, self.doc_id);
                self.content = version.content.clone();
                self.sync.restore(self.content.clone());
                self.show_history = false;
                ctx.toasts.success("Version restored");
            }
            other => debug!("Ignoring {:?} in the editor", other),
        }
    }

    /// Ask the server to keep the current content as a version
    pub async fn save_snapshot(&mut self, ctx: &mut AppContext) {
        let Some(token) = ctx.token().map(str::to_string) else {
            return;
        };
        match ctx.api.save_snapshot(&token, self.doc_id).await {
            Ok(_) => {
                ctx.toasts.success("Snapshot saved");
                self.load_history(ctx).await;
            }
            Err(e) => {
                ctx.toasts.error(e.to_string());
            }
        }
    }

    /// Leave the document. Sends LEAVE when still connected.
    pub async fn close(self, ctx: &mut AppContext) {
        self.sync.close().await;
        ctx.navigate(Route::Dashboard);
    }
}
