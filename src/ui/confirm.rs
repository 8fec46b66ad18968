use uuid::Uuid;

use crate::models::VersionSnapshot;

/// What happens when the user confirms
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteDocument { doc_id: Uuid },
    RevokeAccess { doc_id: Uuid, username: String },
    DeleteAccount,
    RestoreVersion { version_id: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub title: String,
    pub message: String,
    pub danger: bool,
    pub action: ConfirmAction,
}

impl ConfirmRequest {
    pub fn delete_document(doc_id: Uuid, title: Option<&str>) -> Self {
        let title = title.filter(|t| !t.is_empty()).unwrap_or("this document");
        Self {
            title: "Delete document?".to_string(),
            message: format!(
                "Delete \"{}\" and all its history? This cannot be undone.",
                title
            ),
            danger: true,
            action: ConfirmAction::DeleteDocument { doc_id },
        }
    }

    pub fn revoke_access(doc_id: Uuid, username: &str) -> Self {
        Self {
            title: "Revoke access?".to_string(),
            message: format!(
                "Remove access for \"{}\"? They will no longer see or edit this document.",
                username
            ),
            danger: true,
            action: ConfirmAction::RevokeAccess {
                doc_id,
                username: username.to_string(),
            },
        }
    }

    pub fn delete_account() -> Self {
        Self {
            title: "Delete account?".to_string(),
            message: "This will permanently delete your account and all documents you own \
                      (including their version history). This cannot be undone."
                .to_string(),
            danger: true,
            action: ConfirmAction::DeleteAccount,
        }
    }

    pub fn restore_version(version: &VersionSnapshot) -> Self {
        Self {
            title: "Restore version?".to_string(),
            message: format!("Restore version from {}?", version.display_time()),
            danger: false,
            action: ConfirmAction::RestoreVersion {
                version_id: version.id,
            },
        }
    }
}

/// At most one pending confirmation
#[derive(Debug, Default)]
pub struct ConfirmDialog {
    pending: Option<ConfirmRequest>,
}

impl ConfirmDialog {
    /// Replaces whatever was pending
    pub fn open(&mut self, request: ConfirmRequest) {
        self.pending = Some(request);
    }

    pub fn pending(&self) -> Option<&ConfirmRequest> {
        self.pending.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    pub fn confirm_text(&self) -> &'static str {
        match &self.pending {
            Some(req) if req.danger => "Yes, remove",
            _ => "Confirm",
        }
    }

    pub fn cancel_text(&self) -> &'static str {
        "Cancel"
    }

    /// Close the dialog and hand back the action to run
    pub fn confirm(&mut self) -> Option<ConfirmAction> {
        self.pending.take().map(|req| req.action)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Escape behaves like cancel
    pub fn escape(&mut self) {
        self.cancel();
    }
}
