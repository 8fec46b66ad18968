use tracing::{debug, info};
use uuid::Uuid;

use crate::context::AppContext;
use crate::models::DocumentSummary;
use crate::routes::Route;
use crate::ui::{ConfirmAction, ConfirmDialog, ConfirmRequest};

/// Document list, sharing panel and account settings
#[derive(Debug, Default)]
pub struct DashboardView {
    pub docs: Vec<DocumentSummary>,
    pub loading: bool,
    pub error: Option<String>,
    pub new_title: String,
    pub sharing: Option<Uuid>,
    pub collaborator_name: String,
    pub current_password: String,
    pub new_password: String,
    pub profile_message: Option<String>,
    pub confirm: ConfirmDialog,
}

impl DashboardView {
    /// Re-fetch the whole list. Every mutation ends here, the list is never patched locally.
    pub async fn load(&mut self, ctx: &mut AppContext) {
        let Some(token) = ctx.token().map(str::to_string) else {
            ctx.navigate(Route::Login);
            return;
        };

        self.loading = true;
        match ctx.api.list_documents(&token).await {
            Ok(docs) => {
                debug!("Loaded {} documents", docs.len());
                self.docs = docs;
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
        self.loading = false;
    }

    pub fn document(&self, doc_id: Uuid) -> Option<&DocumentSummary> {
        self.docs.iter().find(|d| d.id == doc_id)
    }

    /// Only owners get share and delete controls. Display only, the API enforces access.
    pub fn can_manage(&self, ctx: &AppContext, doc: &DocumentSummary) -> bool {
        ctx.username().is_some_and(|u| doc.is_owned_by(u))
    }

    pub async fn create(&mut self, ctx: &mut AppContext) {
        let Some(token) = ctx.token().map(str::to_string) else {
            return;
        };
        if self.new_title.trim().is_empty() {
            ctx.toasts.error("Please enter a title");
            return;
        }

        match ctx.api.create_document(&token, &self.new_title, "").await {
            Ok(_) => {
                info!("Created document {:?}", self.new_title);
                self.new_title.clear();
                self.load(ctx).await;
                ctx.toasts.success("Document created");
            }
            Err(e) => {
                ctx.toasts.error(e.to_string());
            }
        }
    }

    pub fn open(&self, ctx: &mut AppContext, doc_id: Uuid) -> Route {
        ctx.navigate(Route::Editor(doc_id))
    }

    /* -----------------------------
       Sharing
    ------------------------------ */

    pub fn open_sharing(&mut self, doc_id: Uuid) {
        self.sharing = Some(doc_id);
    }

    pub fn close_sharing(&mut self) {
        self.sharing = None;
        self.collaborator_name.clear();
    }

    /// Collaborators of the document whose sharing panel is open
    pub fn sharing_collaborators(&self) -> Vec<&str> {
        self.sharing
            .and_then(|id| self.document(id))
            .map(|d| d.collaborators.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub async fn invite(&mut self, ctx: &mut AppContext) {
        let Some(doc_id) = self.sharing else {
            return;
        };
        let Some(token) = ctx.token().map(str::to_string) else {
            return;
        };
        let name = self.collaborator_name.trim().to_string();
        if name.is_empty() {
            ctx.toasts.error("Enter a username to invite");
            return;
        }

        match ctx.api.share_document(&token, doc_id, &name).await {
            Ok(_) => {
                self.collaborator_name.clear();
                self.load(ctx).await;
                ctx.toasts.success(format!("Invited {}", name));
            }
            Err(e) => {
                ctx.toasts.error(e.to_string());
            }
        }
    }

    /* -----------------------------
       Confirmed actions
    ------------------------------ */

    pub fn request_delete(&mut self, doc_id: Uuid) {
        let title = self.document(doc_id).map(|d| d.title.as_str());
        let request = ConfirmRequest::delete_document(doc_id, title);
        self.confirm.open(request);
    }

    pub fn request_revoke(&mut self, doc_id: Uuid, username: &str) {
        self.confirm.open(ConfirmRequest::revoke_access(doc_id, username));
    }

    pub fn request_delete_account(&mut self) {
        self.confirm.open(ConfirmRequest::delete_account());
    }

    pub fn cancel(&mut self) {
        self.confirm.cancel();
    }

    /// Run whatever the pending dialog was asking about
    pub async fn confirm(&mut self, ctx: &mut AppContext) {
        let Some(action) = self.confirm.confirm() else {
            return;
        };
        let Some(token) = ctx.token().map(str::to_string) else {
            return;
        };

        match action {
            ConfirmAction::DeleteDocument { doc_id } => {
                match ctx.api.delete_document(&token, doc_id).await {
                    Ok(_) => {
                        self.load(ctx).await;
                        ctx.toasts.success("Document deleted");
                    }
                    Err(e) => {
                        ctx.toasts.error(e.to_string());
                    }
                }
            }
            ConfirmAction::RevokeAccess { doc_id, username } => {
                match ctx.api.revoke_access(&token, doc_id, &username).await {
                    Ok(_) => {
                        self.load(ctx).await;
                        ctx.toasts.success(format!("Access revoked for {}", username));
                    }
                    Err(e) => {
                        ctx.toasts.error(e.to_string());
                    }
                }
            }
            ConfirmAction::DeleteAccount => match ctx.api.delete_account(&token).await {
                Ok(_) => {
                    ctx.toasts.success("Account deleted");
                    ctx.sign_out();
                }
                Err(e) => {
                    ctx.toasts.error(e.to_string());
                }
            },
            ConfirmAction::RestoreVersion { .. } => {
                debug!("Version restore is handled by the editor");
            }
        }
    }

    /* -----------------------------
       Account settings
    ------------------------------ */

    pub async fn change_password(&mut self, ctx: &mut AppContext) {
        let Some(token) = ctx.token().map(str::to_string) else {
            return;
        };
        self.profile_message = None;

        match ctx
            .api
            .change_password(&token, &self.current_password, &self.new_password)
            .await
        {
            Ok(_) => {
                self.profile_message = Some("Password updated!".to_string());
                self.current_password.clear();
                self.new_password.clear();
                ctx.toasts.success("Password updated");
            }
            Err(e) => {
                self.profile_message = Some(format!("Error: {}", e));
                ctx.toasts.error(e.to_string());
            }
        }
    }

    pub async fn update_email(&mut self, ctx: &mut AppContext, email: &str) {
        let Some(token) = ctx.token().map(str::to_string) else {
            return;
        };

        match ctx.api.update_profile(&token, email).await {
            Ok(profile) => {
                ctx.set_email(profile.email.as_deref().unwrap_or(email));
                ctx.toasts.success("Profile updated");
            }
            Err(e) => {
                ctx.toasts.error(e.to_string());
            }
        }
    }
}
