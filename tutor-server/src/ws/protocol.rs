//! WebSocket protocol message types
//!
//! Tutor and student clients share one protocol. Room events arrive wrapped
//! in `ServerMessage::Event` together with the room they were published to.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tutor_core::{
    AttentionEvent, ChatMessage, Delivery, RealtimeEvent, SessionPhase, TransitionDirection,
};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a session room; the user must be its student or tutor
    JoinSession { session_id: String, user_id: String },

    /// Leave a session room
    LeaveSession { session_id: String },

    /// Join the user's personal notification room
    JoinPersonalRoom { user_id: String },

    /// Post a chat line to a session room
    SendMessage {
        session_id: String,
        sender_id: String,
        #[serde(default)]
        sender_name: String,
        text: String,
    },

    /// Record an attention event
    CreateAttentionEvent {
        session_id: String,
        student_id: String,
        tutor_id: String,
        event_type: String,
        #[serde(default)]
        metadata: Option<Value>,
    },

    /// Move the session to a phase
    UpdatePhase { session_id: String, phase: String },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Room joined (response to JoinSession / JoinPersonalRoom)
    Joined { room: String },

    /// Room left (response to LeaveSession)
    Left { room: String },

    /// Chat line stored (response to SendMessage)
    MessageSent { message: ChatMessage },

    /// Attention event stored (response to CreateAttentionEvent)
    EventRecorded { event: AttentionEvent },

    /// Phase moved (response to UpdatePhase)
    PhaseAdvanced {
        session_id: String,
        phase: SessionPhase,
        previous_phase: SessionPhase,
        direction: TransitionDirection,
    },

    /// An event published to a joined room
    Event { room: String, event: RealtimeEvent },

    /// Request failed
    Error { message: String, code: String },
}

impl From<Delivery> for ServerMessage {
    fn from(delivery: Delivery) -> Self {
        Self::Event {
            room: delivery.room.to_string(),
            event: delivery.event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::Room;

    // ==================== ClientMessage Tests ====================

    #[test]
    fn join_session_parses() {
        let json = r#"{"type":"join_session","session_id":"s1","user_id":"u1"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinSession {
                session_id: "s1".to_string(),
                user_id: "u1".to_string(),
            }
        );
    }

    #[test]
    fn send_message_sender_name_is_optional() {
        let json = r#"{"type":"send_message","session_id":"s1","sender_id":"u1","text":"hi"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::SendMessage { sender_name, .. } if sender_name.is_empty()));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let json = r#"{"type":"subscribe","session_ids":[]}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    // ==================== ServerMessage Tests ====================

    #[test]
    fn delivery_becomes_event_message() {
        let delivery = Delivery {
            room: Room::user("tut"),
            origin: None,
            event: RealtimeEvent::PedagogyAlert {
                session_id: "s1".to_string(),
                alerts: vec!["gap".to_string()],
            },
        };

        let json = serde_json::to_value(ServerMessage::from(delivery)).unwrap();
        assert_eq!(json["type"], "event");
        assert_eq!(json["room"], "user-tut");
        assert_eq!(json["event"]["event"], "pedagogy.alert");
        assert_eq!(json["event"]["payload"]["alerts"][0], "gap");
    }

    #[test]
    fn error_message_serializes() {
        let msg = ServerMessage::Error {
            message: "nope".to_string(),
            code: "FORBIDDEN".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains(r#""code":"FORBIDDEN""#));
    }
}
