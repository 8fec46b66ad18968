//! Command-line interface definitions and parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Terminal client for collaborative documents", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the HTTP API, overrides API_BASE_URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directory of the local storage file, overrides STORAGE_DIR
    #[arg(long, global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "COLLAB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in and remember the session
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "COLLAB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Manage documents
    Docs {
        #[command(subcommand)]
        command: DocsCommand,
    },
    /// Show the version history of a document
    History { id: Uuid },
    /// Open a document in the live editor
    Edit { id: Uuid },
    /// Change the account password
    Password {
        #[arg(long)]
        current: String,
        #[arg(long = "new")]
        new_password: String,
    },
    /// Update the account email
    Profile {
        #[arg(long)]
        email: String,
    },
    /// Delete the account and every document it owns
    DeleteAccount {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show or toggle the light/dark preference
    Theme {
        #[arg(long)]
        toggle: bool,
    },
}

#[derive(Subcommand)]
pub enum DocsCommand {
    /// List documents you own or collaborate on
    List,
    /// Create an empty document
    Create { title: String },
    /// Delete a document you own
    Delete {
        id: Uuid,
        #[arg(short, long)]
        yes: bool,
    },
    /// Invite a collaborator
    Share { id: Uuid, username: String },
    /// Revoke a collaborator's access
    Revoke {
        id: Uuid,
        username: String,
        #[arg(short, long)]
        yes: bool,
    },
}
