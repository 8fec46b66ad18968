use uuid::Uuid;

use collab_docs::views::EditorView;
use collab_docs::ws::SyncSnapshot;
use collab_docs::AppContext;

use super::{flush_toasts, is_yes, require_session, CommandError, CommandResult, Input};

const HELP: &str = "\
Type a line to append it to the document.
  :set <text>     replace the whole document
  :show           print the document
  :history        list saved versions
  :restore <id>   restore a saved version
  :snapshot       save the current content as a version
  :reconnect      retry the realtime connection
  :quit           leave the editor";

/// One line typed into the editor
#[derive(Debug, PartialEq, Eq)]
enum EditorLine {
    Append(String),
    Set(String),
    Show,
    History,
    Restore(i64),
    Snapshot,
    Reconnect,
    Help,
    Quit,
    Invalid(String),
}

impl EditorLine {
    fn parse(line: &str) -> Self {
        let Some(command) = line.strip_prefix(':') else {
            return EditorLine::Append(line.to_string());
        };
        let (name, arg) = match command.split_once(' ') {
            Some((name, arg)) => (name, arg),
            None => (command, ""),
        };
        match name {
            "set" => EditorLine::Set(arg.to_string()),
            "show" => EditorLine::Show,
            "history" => EditorLine::History,
            "restore" => match arg.trim().parse() {
                Ok(id) => EditorLine::Restore(id),
                Err(_) => EditorLine::Invalid(format!("Not a version id: {}", arg.trim())),
            },
            "snapshot" => EditorLine::Snapshot,
            "reconnect" => EditorLine::Reconnect,
            "help" => EditorLine::Help,
            "q" | "quit" => EditorLine::Quit,
            other => EditorLine::Invalid(format!("Unknown command :{}", other)),
        }
    }
}

/// Interactive editing session on stdin/stdout
pub async fn run(ctx: &mut AppContext, lines: &mut Input, doc_id: Uuid) -> CommandResult {
    require_session(ctx)?;
    let Some(mut view) = EditorView::open(ctx, doc_id).await else {
        flush_toasts(ctx)?;
        return Err(CommandError::Failed("Document not found".to_string()));
    };

    println!("{} (owner: {})", view.title, view.owner_username);
    println!("{}", HELP);
    let mut last = view.snapshot();
    render_status(&last);
    println!("{}", last.content);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if !handle_line(ctx, &mut view, lines, &line).await? {
                    break;
                }
            }
            snapshot = view.changed() => {
                let Some(snapshot) = snapshot else {
                    break;
                };
                render_changes(&last, &snapshot);
                last = snapshot;
            }
        }

        view.pump_notices(ctx);
        // Toasts here are informational, errors do not end the session
        for toast in ctx.toasts.drain() {
            println!("{}", toast);
        }
    }

    view.close(ctx).await;
    Ok(())
}

/// Returns false when the user asked to leave
async fn handle_line(
    ctx: &mut AppContext,
    view: &mut EditorView,
    lines: &mut Input,
    line: &str,
) -> Result<bool, CommandError> {
    match EditorLine::parse(line) {
        EditorLine::Append(text) => view.append_line(&text),
        EditorLine::Set(text) => view.edit(text),
        EditorLine::Show => println!("{}", view.content()),
        EditorLine::History => {
            view.load_history(ctx).await;
            if view.history.is_empty() {
                println!("No saved versions");
            }
            for version in &view.history {
                println!(
                    "#{}  {}  by {}",
                    version.id,
                    version.display_time(),
                    version.author_username
                );
            }
        }
        EditorLine::Restore(id) => {
            if !view.request_restore(id) {
                println!("Unknown version #{}, try :history", id);
                return Ok(true);
            }
            if let Some(pending) = view.confirm.pending() {
                println!("{}\n{} [y/N]", pending.message, view.confirm.confirm_text());
            }
            let answer = lines.next_line().await?.unwrap_or_default();
            if is_yes(&answer) {
                view.confirm(ctx);
            } else {
                view.cancel();
            }
        }
        EditorLine::Snapshot => view.save_snapshot(ctx).await,
        EditorLine::Reconnect => view.reconnect(),
        EditorLine::Help => println!("{}", HELP),
        EditorLine::Quit => return Ok(false),
        EditorLine::Invalid(message) => println!("{}", message),
    }
    Ok(true)
}

fn render_status(snapshot: &SyncSnapshot) {
    if snapshot.presence.is_empty() {
        println!("[{}]", snapshot.status.label());
    } else {
        println!(
            "[{}] editing: {}",
            snapshot.status.label(),
            snapshot.presence.join(", ")
        );
    }
}

fn render_changes(before: &SyncSnapshot, after: &SyncSnapshot) {
    if before.status != after.status || before.presence != after.presence {
        render_status(after);
    }
    if before.content != after.content {
        println!("---");
        println!("{}", after.content);
        println!("---");
    }
}
