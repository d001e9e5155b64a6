//! Tutor serve command
//!
//! Runs the HTTP and WebSocket server in the foreground. Flags override the
//! merged configuration file values.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::info;
use tutor_server::{AppState, ServerConfig, TutorServer};

use crate::config::{ConfigLoader, TutorConfig};

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Skip background evaluation after writes
    #[arg(long)]
    pub no_evaluation: bool,
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = apply_args(ConfigLoader::load()?, &args);
    let server_config = ServerConfig::new(config.server.host.clone(), config.server.port);

    info!(
        "Starting tutor server on {} (evaluation {})",
        server_config.addr(),
        if config.engine.evaluation_enabled { "on" } else { "off" }
    );

    let state = Arc::new(AppState::with_config(&config.engine));
    TutorServer::with_state(server_config, state).run().await?;
    Ok(())
}

/// Command-line flags win over file configuration
fn apply_args(mut config: TutorConfig, args: &ServeArgs) -> TutorConfig {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if args.no_evaluation {
        config.engine.evaluation_enabled = false;
    }
    config
}
