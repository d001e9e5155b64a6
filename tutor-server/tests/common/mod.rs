//! Shared test utilities for tutor-server integration tests

pub mod client;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tutor_server::{AppState, ServerConfig, TutorServer};

/// Creates a test server with a fresh engine, returns state and address
#[allow(dead_code)]
pub async fn create_test_server() -> (Arc<AppState>, SocketAddr) {
    let state = Arc::new(AppState::new());
    let server = TutorServer::with_state(ServerConfig::default(), Arc::clone(&state));
    let addr = spawn_server(server).await;

    (state, addr)
}

/// Spawns server in background task, returns bound address
async fn spawn_server(server: TutorServer) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = server.run_with_listener(listener).await;
    });

    // Brief delay to ensure server is accepting connections
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    addr
}
