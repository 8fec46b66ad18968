pub mod account;
pub mod docs;
pub mod editor;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use collab_docs::clients::ApiError;
use collab_docs::ui::ToastKind;
use collab_docs::AppContext;

use crate::cli::{Commands, DocsCommand};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Not signed in, run `collab-docs login` first")]
    NotSignedIn,
    #[error("{0}")]
    Failed(String),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CommandResult = Result<(), CommandError>;

/// Terminal input, shared by every prompt of one command so nothing buffered is lost
pub type Input = Lines<BufReader<Stdin>>;

pub fn stdin_lines() -> Input {
    BufReader::new(tokio::io::stdin()).lines()
}

/// Run one CLI command against the shared context
pub async fn dispatch(command: Commands, ctx: &mut AppContext) -> CommandResult {
    let mut input = stdin_lines();
    match command {
        Commands::Register {
            username,
            email,
            password,
        } => account::register(ctx, username, email, password).await,
        Commands::Login { username, password } => account::login(ctx, username, password).await,
        Commands::Logout => account::logout(ctx),
        Commands::Whoami => account::whoami(ctx).await,
        Commands::Password {
            current,
            new_password,
        } => account::change_password(ctx, current, new_password).await,
        Commands::Profile { email } => account::update_email(ctx, &email).await,
        Commands::DeleteAccount { yes } => account::delete_account(ctx, &mut input, yes).await,
        Commands::Theme { toggle } => account::theme(ctx, toggle),
        Commands::Docs { command } => match command {
            DocsCommand::List => docs::list(ctx).await,
            DocsCommand::Create { title } => docs::create(ctx, title).await,
            DocsCommand::Delete { id, yes } => docs::delete(ctx, &mut input, id, yes).await,
            DocsCommand::Share { id, username } => docs::share(ctx, id, username).await,
            DocsCommand::Revoke { id, username, yes } => {
                docs::revoke(ctx, &mut input, id, &username, yes).await
            }
        },
        Commands::History { id } => docs::history(ctx, id).await,
        Commands::Edit { id } => editor::run(ctx, &mut input, id).await,
    }
}

/// Print queued toasts once. Fails when any of them was an error.
pub fn flush_toasts(ctx: &mut AppContext) -> CommandResult {
    let mut failure = None;
    for toast in ctx.toasts.drain() {
        println!("{}", toast);
        if toast.kind == ToastKind::Error {
            failure = Some(toast.message);
        }
    }
    match failure {
        Some(message) => Err(CommandError::Failed(message)),
        None => Ok(()),
    }
}

pub fn require_session(ctx: &AppContext) -> CommandResult {
    match ctx.session() {
        Some(_) => Ok(()),
        None => Err(CommandError::NotSignedIn),
    }
}

/// Yes/no question on the terminal, anything but "y" or "yes" is a no
pub async fn ask<R: AsyncBufRead + Unpin>(
    input: &mut Lines<R>,
    title: &str,
    message: &str,
    confirm_text: &str,
) -> std::io::Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("{}\n{}\n{} [y/N] ", title, message, confirm_text).as_bytes())
        .await?;
    stdout.flush().await?;

    let answer = input.next_line().await?.unwrap_or_default();
    Ok(is_yes(&answer))
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
