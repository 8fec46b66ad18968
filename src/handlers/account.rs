use tracing::info;

use collab_docs::views::{DashboardView, LoginView, RegisterView};
use collab_docs::AppContext;

use super::{ask, flush_toasts, require_session, CommandError, CommandResult, Input};

pub async fn register(
    ctx: &mut AppContext,
    username: String,
    email: String,
    password: String,
) -> CommandResult {
    let mut view = RegisterView::new(username, email, password);
    if !view.submit(ctx).await {
        let message = view.error.unwrap_or_else(|| "Registration failed".to_string());
        return Err(CommandError::Failed(message));
    }
    if let Some(message) = &view.message {
        println!("{}", message);
    }
    Ok(())
}

pub async fn login(ctx: &mut AppContext, username: String, password: String) -> CommandResult {
    let mut view = LoginView::new(username, password);
    if !view.submit(ctx).await {
        let message = view.error.unwrap_or_else(|| "Login failed".to_string());
        return Err(CommandError::Failed(message));
    }
    if let Some(session) = ctx.session() {
        println!("Signed in as {}", session.username);
    }
    Ok(())
}

pub fn logout(ctx: &mut AppContext) -> CommandResult {
    ctx.sign_out();
    println!("Signed out");
    Ok(())
}

/// Stored identity, refreshed from the server when it answers
pub async fn whoami(ctx: &mut AppContext) -> CommandResult {
    let Some(session) = ctx.session().cloned() else {
        println!("Not signed in");
        return Ok(());
    };

    match ctx.api.me(&session.token).await {
        Ok(profile) => {
            let email = profile.email.unwrap_or(session.email);
            println!("{} <{}>", profile.username, email);
        }
        Err(e) => {
            info!("Could not refresh profile: {}", e);
            println!("{} <{}> (offline)", session.username, session.email);
        }
    }
    Ok(())
}

pub async fn change_password(ctx: &mut AppContext, current: String, new: String) -> CommandResult {
    require_session(ctx)?;
    let mut view = DashboardView {
        current_password: current,
        new_password: new,
        ..DashboardView::default()
    };
    view.change_password(ctx).await;
    flush_toasts(ctx)
}

pub async fn update_email(ctx: &mut AppContext, email: &str) -> CommandResult {
    require_session(ctx)?;
    let mut view = DashboardView::default();
    view.update_email(ctx, email).await;
    flush_toasts(ctx)
}

pub async fn delete_account(ctx: &mut AppContext, input: &mut Input, yes: bool) -> CommandResult {
    require_session(ctx)?;
    let mut view = DashboardView::default();
    view.request_delete_account();
    if !yes && !confirm_pending(&view, input).await? {
        view.cancel();
        return Ok(());
    }
    view.confirm(ctx).await;
    flush_toasts(ctx)
}

pub fn theme(ctx: &mut AppContext, toggle: bool) -> CommandResult {
    let theme = if toggle { ctx.toggle_theme() } else { ctx.theme() };
    println!("Theme: {}", theme);
    Ok(())
}

/// Ask about whatever the dashboard dialog has pending
pub(super) async fn confirm_pending(
    view: &DashboardView,
    input: &mut Input,
) -> Result<bool, CommandError> {
    let Some(pending) = view.confirm.pending() else {
        return Ok(false);
    };
    Ok(ask(input, &pending.title, &pending.message, view.confirm.confirm_text()).await?)
}
