use crate::model::*;

use super::Engine;
use super::conflict::check_no_conflict;

impl Engine {
    /// All bookings for `room`, ascending by start. Empty if the room is unknown.
    pub async fn list_by_room(&self, room: &str) -> Vec<Booking> {
        match self.get_room(room) {
            Some(rs) => rs.read().await.bookings.clone(),
            None => Vec::new(),
        }
    }

    /// Whether any booking in `room` intersects `span`.
    pub async fn has_overlap(&self, room: &str, span: Span) -> bool {
        match self.get_room(room) {
            Some(rs) => check_no_conflict(&*rs.read().await, &span).is_err(),
            None => false,
        }
    }
}
