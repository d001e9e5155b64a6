//! Real-time fan-out to session and user rooms

mod hub;
pub mod types;

pub use hub::{DEFAULT_ROOM_CAPACITY, RealtimePublisher, RoomHub};
pub use types::{Delivery, RealtimeEvent, Room};
