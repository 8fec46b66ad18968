mod cli;
mod handlers;

use clap::Parser;
use std::panic;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;
use collab_docs::{AppContext, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    let cli = Cli::parse();

    // Load configuration, flags win over the environment
    let config_result = Config::load();
    let mut config = config_result.as_ref().cloned().unwrap_or_default();
    if let Some(api_url) = &cli.api_url {
        config.api_base_url = api_url.clone();
    }
    if let Some(dir) = &cli.storage_dir {
        config.storage_dir = Some(dir.clone());
    }

    // Initialize tracing on stderr, stdout belongs to the views
    let level = if cli.verbose { "debug" } else { config.log_level.as_str() };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("collab_docs={},warn", level).into()),
        )
        .init();

    if let Err(e) = &config_result {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
    }
    info!("Using API at {}", config.api_base_url);

    let mut ctx = match AppContext::load(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Failed to start: {}", e);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = handlers::dispatch(cli.command, &mut ctx).await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
