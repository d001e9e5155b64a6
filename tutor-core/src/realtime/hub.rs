//! In-memory room hub
//!
//! Each room is a broadcast channel created on first subscribe. Delivery is
//! at-least-once to receivers subscribed at publish time; nothing is kept
//! for late joiners.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use tracing::trace;

use super::types::{Delivery, RealtimeEvent, Room};

/// Default per-room buffer size
pub const DEFAULT_ROOM_CAPACITY: usize = 256;

/// Publishes real-time events to rooms
#[async_trait]
pub trait RealtimePublisher: Send + Sync {
    /// Publish to every current subscriber of `room`, returns how many
    async fn publish(&self, room: &Room, event: RealtimeEvent) -> usize {
        self.publish_from(room, None, event).await
    }

    /// Publish on behalf of a connection, which will not see its own event
    async fn publish_from(&self, room: &Room, origin: Option<&str>, event: RealtimeEvent)
    -> usize;
}

/// Broadcast-channel rooms keyed by `Room`
pub struct RoomHub {
    capacity: usize,
    rooms: RwLock<HashMap<Room, broadcast::Sender<Delivery>>>,
}

impl RoomHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Join a room, creating it if needed
    pub async fn subscribe(&self, room: &Room) -> broadcast::Receiver<Delivery> {
        if let Some(tx) = self.rooms.read().await.get(room) {
            return tx.subscribe();
        }

        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Number of open rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Drop rooms nobody listens to anymore
    pub async fn prune(&self) -> usize {
        let mut rooms = self.rooms.write().await;
        let before = rooms.len();
        rooms.retain(|_, tx| tx.receiver_count() > 0);
        before - rooms.len()
    }
}

impl Default for RoomHub {
    fn default() -> Self {
        Self::new(DEFAULT_ROOM_CAPACITY)
    }
}

#[async_trait]
impl RealtimePublisher for RoomHub {
    async fn publish_from(
        &self,
        room: &Room,
        origin: Option<&str>,
        event: RealtimeEvent,
    ) -> usize {
        let rooms = self.rooms.read().await;
        let Some(tx) = rooms.get(room) else {
            trace!(room = %room, event = event.name(), "No subscribers for room");
            return 0;
        };

        let name = event.name();
        let session_id = event.session_id().to_string();
        let delivery = Delivery {
            room: room.clone(),
            origin: origin.map(str::to_string),
            event,
        };

        // Err only means no live receivers
        let count = tx.send(delivery).unwrap_or(0);
        trace!(
            room = %room,
            session_id = %session_id,
            event = name,
            receivers = count,
            "Published realtime event"
        );
        count
    }
}
