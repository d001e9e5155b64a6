//! tutor-server - HTTP and WebSocket surface for the session pedagogy engine
//!
//! The server owns one `PedagogyEngine`. REST routes expose the inbound
//! operations; the `/ws` endpoint joins clients to session and user rooms.

mod error;
pub mod http;
mod state;
pub mod ws;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

pub use error::{ErrorResponse, ServerError};
pub use http::{HealthResponse, create_router};
pub use state::AppState;

/// Default port for the tutor server
pub const DEFAULT_PORT: u16 = 7431;

/// The tutor server
pub struct TutorServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl TutorServer {
    /// Create a new server with default state
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            state: Arc::new(AppState::new()),
        }
    }

    /// Create a server with custom state
    pub fn with_state(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("tutor server listening on {}", addr);
        self.run_with_listener(listener).await
    }

    /// Run the server on an already bound listener
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        let router = create_router(Arc::clone(&self.state));
        let result = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Internal(e.to_string()));

        self.state.engine.orchestrator().shutdown();
        result
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with the specified host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket address string (e.g., "0.0.0.0:7431")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
