//! WebSocket test client for protocol testing
//!
//! Provides both low-level WsConnection and high-level TestClient.
//!
//! Note: Some methods may appear unused because they're only used in specific
//! test files and clippy checks each test independently.

use std::net::SocketAddr;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Low-level WebSocket connection
pub struct WsConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl WsConnection {
    /// Connect to WebSocket endpoint
    pub async fn connect(addr: SocketAddr) -> Self {
        let url = format!("ws://{}/ws", addr);
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("Failed to connect");
        let (sink, stream) = ws.split();
        Self { sink, stream }
    }

    /// Send raw text message
    pub async fn send_raw(&mut self, msg: &str) {
        self.sink
            .send(Message::Text(msg.to_string().into()))
            .await
            .unwrap();
    }

    /// Send JSON message
    pub async fn send_json<T: Serialize>(&mut self, msg: &T) {
        let json = serde_json::to_string(msg).unwrap();
        self.send_raw(&json).await;
    }

    /// Receive the next text message, None once the server closed
    pub async fn next_text(&mut self) -> Option<String> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(text.to_string()),
                Some(Ok(Message::Close(_))) | None => return None,
                Some(Ok(_)) => continue,
                Some(Err(_)) => return None,
            }
        }
    }

    /// Receive raw text message
    pub async fn recv_raw(&mut self) -> String {
        tokio::time::timeout(RECV_TIMEOUT, self.next_text())
            .await
            .expect("Timed out waiting for message")
            .expect("WebSocket closed")
    }

    /// Receive and deserialize JSON message
    pub async fn recv_json<T: DeserializeOwned>(&mut self) -> T {
        let text = self.recv_raw().await;
        serde_json::from_str(&text).expect("Failed to parse JSON")
    }

    /// Receive with timeout, returns None if timeout
    pub async fn recv_timeout(&mut self, duration: Duration) -> Option<String> {
        tokio::time::timeout(duration, self.next_text())
            .await
            .ok()
            .flatten()
    }
}

/// High-level test client with helper methods
pub struct TestClient {
    pub conn: WsConnection,
}

impl TestClient {
    #[allow(dead_code)]
    pub async fn connect(addr: SocketAddr) -> Self {
        Self {
            conn: WsConnection::connect(addr).await,
        }
    }

    /// Join a session room, returns the joined room name
    #[allow(dead_code)]
    pub async fn join_session(&mut self, session_id: &str, user_id: &str) -> String {
        self.conn
            .send_json(&json!({
                "type": "join_session",
                "session_id": session_id,
                "user_id": user_id,
            }))
            .await;

        let response: Value = self.conn.recv_json().await;
        assert_eq!(response["type"], "joined", "Expected joined but got: {}", response);
        response["room"].as_str().unwrap().to_string()
    }

    /// Join the user's personal room
    #[allow(dead_code)]
    pub async fn join_personal_room(&mut self, user_id: &str) -> String {
        self.conn
            .send_json(&json!({ "type": "join_personal_room", "user_id": user_id }))
            .await;

        let response: Value = self.conn.recv_json().await;
        assert_eq!(response["type"], "joined", "Expected joined but got: {}", response);
        response["room"].as_str().unwrap().to_string()
    }

    #[allow(dead_code)]
    pub async fn send_message(&mut self, session_id: &str, sender_id: &str, text: &str) {
        self.conn
            .send_json(&json!({
                "type": "send_message",
                "session_id": session_id,
                "sender_id": sender_id,
                "sender_name": sender_id,
                "text": text,
            }))
            .await;
    }

    #[allow(dead_code)]
    pub async fn update_phase(&mut self, session_id: &str, phase: &str) {
        self.conn
            .send_json(&json!({
                "type": "update_phase",
                "session_id": session_id,
                "phase": phase,
            }))
            .await;
    }

    #[allow(dead_code)]
    pub async fn create_attention_event(&mut self, session_id: &str, event_type: &str) {
        self.conn
            .send_json(&json!({
                "type": "create_attention_event",
                "session_id": session_id,
                "student_id": "stu",
                "tutor_id": "tut",
                "event_type": event_type,
            }))
            .await;
    }

    /// Skip messages until one satisfies `pred`
    #[allow(dead_code)]
    pub async fn recv_until(&mut self, pred: impl Fn(&Value) -> bool) -> Value {
        loop {
            let msg: Value = self.conn.recv_json().await;
            if pred(&msg) {
                return msg;
            }
        }
    }

    /// Skip messages until a room event with the given wire name
    #[allow(dead_code)]
    pub async fn recv_event(&mut self, name: &str) -> Value {
        self.recv_until(|msg| msg["type"] == "event" && msg["event"]["event"] == name)
            .await
    }
}
