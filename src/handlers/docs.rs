use uuid::Uuid;

use collab_docs::views::DashboardView;
use collab_docs::AppContext;

use super::account::confirm_pending;
use super::{flush_toasts, require_session, CommandError, CommandResult, Input};

/// Fetch the list, failing when the dashboard could not load it
async fn load(ctx: &mut AppContext) -> Result<DashboardView, CommandError> {
    require_session(ctx)?;
    let mut view = DashboardView::default();
    view.load(ctx).await;
    match view.error.take() {
        Some(message) => Err(CommandError::Failed(message)),
        None => Ok(view),
    }
}

pub async fn list(ctx: &mut AppContext) -> CommandResult {
    let view = load(ctx).await?;
    if view.docs.is_empty() {
        println!("No documents yet");
        return Ok(());
    }

    for doc in &view.docs {
        let marker = if view.can_manage(ctx, doc) { "*" } else { " " };
        println!("{} {}  {}  (owner: {})", marker, doc.id, doc.title, doc.owner_username);
        if !doc.collaborators.is_empty() {
            let names: Vec<&str> = doc.collaborators.iter().map(String::as_str).collect();
            println!("      shared with {}", names.join(", "));
        }
    }
    Ok(())
}

pub async fn create(ctx: &mut AppContext, title: String) -> CommandResult {
    require_session(ctx)?;
    let mut view = DashboardView {
        new_title: title,
        ..DashboardView::default()
    };
    view.create(ctx).await;
    flush_toasts(ctx)
}

pub async fn delete(ctx: &mut AppContext, input: &mut Input, id: Uuid, yes: bool) -> CommandResult {
    let mut view = load(ctx).await?;
    view.request_delete(id);
    if !yes && !confirm_pending(&view, input).await? {
        view.cancel();
        return Ok(());
    }
    view.confirm(ctx).await;
    flush_toasts(ctx)
}

pub async fn share(ctx: &mut AppContext, id: Uuid, username: String) -> CommandResult {
    let mut view = load(ctx).await?;
    view.open_sharing(id);
    view.collaborator_name = username;
    view.invite(ctx).await;
    flush_toasts(ctx)?;

    let collaborators = view.sharing_collaborators();
    if !collaborators.is_empty() {
        println!("Collaborators: {}", collaborators.join(", "));
    }
    Ok(())
}

pub async fn revoke(
    ctx: &mut AppContext,
    input: &mut Input,
    id: Uuid,
    username: &str,
    yes: bool,
) -> CommandResult {
    let mut view = load(ctx).await?;
    view.request_revoke(id, username);
    if !yes && !confirm_pending(&view, input).await? {
        view.cancel();
        return Ok(());
    }
    view.confirm(ctx).await;
    flush_toasts(ctx)
}

pub async fn history(ctx: &mut AppContext, id: Uuid) -> CommandResult {
    require_session(ctx)?;
    let token = ctx.token().map(str::to_string).ok_or(CommandError::NotSignedIn)?;
    let versions = ctx.api.document_versions(&token, id).await?;
    if versions.is_empty() {
        println!("No saved versions");
    }
    for version in versions {
        println!(
            "#{}  {}  by {}  ({} chars)",
            version.id,
            version.display_time(),
            version.author_username,
            version.content.chars().count()
        );
    }
    Ok(())
}
