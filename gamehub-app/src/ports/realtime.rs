use crate::domain::event::{DomainEvent, Room};

/// Fire-and-forget fan-out to the live connections currently joined to a room.
pub trait RealtimePort {
    fn publish(&self, room: &Room, event: &DomainEvent);
}
