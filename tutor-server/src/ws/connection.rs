//! WebSocket connection handling
//!
//! Each connection owns an outbound queue drained by a writer task. Joining a
//! room spawns a forwarder that relays the room's deliveries into that queue,
//! skipping deliveries this connection originated.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, error, info, warn};
use tutor_core::{
    AttentionEvent, AttentionEventType, Delivery, EngineError, NewAttentionEvent, PhaseAdvance,
    Room, SessionPhase,
};
use uuid::Uuid;

use crate::AppState;

use super::protocol::{ClientMessage, ServerMessage};

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// What the read loop does after a message
enum Flow {
    Continue,
    Close,
}

/// Per-connection room membership
struct Connection {
    id: String,
    state: Arc<AppState>,
    outbound: mpsc::UnboundedSender<ServerMessage>,
    rooms: HashMap<Room, JoinHandle<()>>,
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize server message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let mut conn = Connection {
        id: Uuid::new_v4().to_string(),
        state: Arc::clone(&state),
        outbound: tx,
        rooms: HashMap::new(),
    };
    info!(connection_id = %conn.id, "WebSocket client connected");

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Flow::Close = conn.handle_text(&text).await {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                debug!("WebSocket client sent close frame");
                break;
            }
            Ok(_) => {
                // Binary and control frames carry nothing for us
            }
            Err(e) => {
                warn!("WebSocket error: {}", e);
                break;
            }
        }
    }

    let connection_id = conn.id.clone();
    conn.leave_all();
    drop(conn);
    // Flushes anything queued, e.g. the error preceding a forced close
    let _ = writer.await;

    let pruned = state.engine.hub().prune().await;
    if pruned > 0 {
        debug!(rooms = pruned, "Pruned empty rooms");
    }

    info!(connection_id = %connection_id, "WebSocket client disconnected");
}

impl Connection {
    fn send(&self, msg: ServerMessage) {
        if self.outbound.send(msg).is_err() {
            debug!(connection_id = %self.id, "Outbound queue closed");
        }
    }

    fn send_error(&self, err: &EngineError) {
        self.send(ServerMessage::Error {
            message: err.to_string(),
            code: err.code().to_string(),
        });
    }

    async fn handle_text(&mut self, text: &str) -> Flow {
        let client_msg: ClientMessage = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(connection_id = %self.id, "Invalid client message: {}", e);
                self.send(ServerMessage::Error {
                    message: e.to_string(),
                    code: "INVALID_MESSAGE".to_string(),
                });
                return Flow::Continue;
            }
        };

        match client_msg {
            ClientMessage::JoinSession {
                session_id,
                user_id,
            } => {
                let engine = &self.state.engine;
                if let Err(e) = engine.verify_session_access(&session_id, &user_id).await {
                    warn!(
                        connection_id = %self.id,
                        session_id = %session_id,
                        user_id = %user_id,
                        "Session access denied: {}", e
                    );
                    self.send_error(&e);
                    return Flow::Close;
                }
                self.join(Room::session(session_id)).await;
            }

            ClientMessage::LeaveSession { session_id } => {
                let room = Room::session(session_id);
                self.leave(&room);
                self.send(ServerMessage::Left {
                    room: room.to_string(),
                });
            }

            ClientMessage::JoinPersonalRoom { user_id } => {
                self.join(Room::user(user_id)).await;
            }

            ClientMessage::SendMessage {
                session_id,
                sender_id,
                sender_name,
                text,
            } => {
                let result = self
                    .state
                    .engine
                    .post_message(&session_id, &sender_id, &sender_name, &text, Some(&self.id))
                    .await;
                match result {
                    Ok(message) => self.send(ServerMessage::MessageSent { message }),
                    Err(e) => self.send_error(&e),
                }
            }

            ClientMessage::CreateAttentionEvent {
                session_id,
                student_id,
                tutor_id,
                event_type,
                metadata,
            } => {
                let result = self
                    .record_event(session_id, student_id, tutor_id, &event_type, metadata)
                    .await;
                match result {
                    Ok(event) => self.send(ServerMessage::EventRecorded { event }),
                    Err(e) => self.send_error(&e),
                }
            }

            ClientMessage::UpdatePhase { session_id, phase } => {
                let result = self.update_phase(&session_id, &phase).await;
                match result {
                    Ok(advance) => self.send(ServerMessage::PhaseAdvanced {
                        session_id: advance.session.id,
                        phase: advance.transition.to,
                        previous_phase: advance.transition.from,
                        direction: advance.transition.direction,
                    }),
                    Err(e) => self.send_error(&e),
                }
            }
        }

        Flow::Continue
    }

    async fn record_event(
        &self,
        session_id: String,
        student_id: String,
        tutor_id: String,
        event_type: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<AttentionEvent, EngineError> {
        let event_type: AttentionEventType = event_type.parse()?;
        let mut new = NewAttentionEvent::new(session_id, student_id, tutor_id, event_type);
        new.metadata = metadata;
        self.state.engine.create_event(new).await
    }

    async fn update_phase(&self, session_id: &str, phase: &str) -> Result<PhaseAdvance, EngineError> {
        let phase: SessionPhase = phase.parse()?;
        self.state.engine.advance_phase(session_id, phase).await
    }

    /// Subscribe to a room; joining twice is a no-op
    async fn join(&mut self, room: Room) {
        if !self.rooms.contains_key(&room) {
            let rx = self.state.engine.hub().subscribe(&room).await;
            let forwarder = tokio::spawn(forward(
                BroadcastStream::new(rx),
                self.id.clone(),
                self.outbound.clone(),
            ));
            debug!(connection_id = %self.id, room = %room, "Joined room");
            self.rooms.insert(room.clone(), forwarder);
        }
        self.send(ServerMessage::Joined {
            room: room.to_string(),
        });
    }

    fn leave(&mut self, room: &Room) {
        if let Some(forwarder) = self.rooms.remove(room) {
            forwarder.abort();
            debug!(connection_id = %self.id, room = %room, "Left room");
        }
    }

    fn leave_all(&mut self) {
        for (_, forwarder) in self.rooms.drain() {
            forwarder.abort();
        }
    }
}

/// Relay one room's deliveries to a connection's outbound queue
async fn forward(
    mut deliveries: BroadcastStream<Delivery>,
    connection_id: String,
    outbound: mpsc::UnboundedSender<ServerMessage>,
) {
    while let Some(item) = deliveries.next().await {
        match item {
            Ok(delivery) => {
                if !delivery.is_for(&connection_id) {
                    continue;
                }
                if outbound.send(delivery.into()).is_err() {
                    break;
                }
            }
            Err(BroadcastStreamRecvError::Lagged(count)) => {
                warn!(connection_id = %connection_id, "Room forwarding lagged by {} events", count);
            }
        }
    }
}
