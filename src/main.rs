//! Multichat - multi-provider LLM chat backend
//!
#![doc = "Main entry point for the Multichat server and CLI."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use multichat::cli::{Cli, Commands};
use multichat::commands;
use multichat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Serve { bind, ephemeral } => {
            tracing::info!("Starting HTTP server");
            commands::serve::run_serve(config, bind, ephemeral).await
        }
        Commands::Session { command } => commands::session::handle_session(&config, command).await,
        Commands::History => commands::history::handle_history(&config).await,
        Commands::Send {
            session,
            provider,
            files,
            message,
        } => {
            tracing::debug!(session = %session, provider = %provider, "Sending message");
            commands::session::run_send(&config, session, provider, files, message).await
        }
        Commands::Files { command } => commands::files::handle_files(&config, command).await,
        Commands::Providers => commands::list_providers(&config),
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "multichat=debug"
    } else {
        "multichat=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Logs go to stderr so command output stays pipeable
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
