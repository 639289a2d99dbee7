use async_trait::async_trait;

use crate::model::*;

use super::{Engine, StoreError};

/// The storage seam the HTTP handlers are written against.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Append a booking, returning its new id. No overlap check.
    async fn insert(&self, room: &str, span: Span) -> Result<BookingId, StoreError>;

    /// Atomically check for overlap and insert. Fails with `StoreError::Conflict`.
    async fn reserve(&self, room: &str, span: Span) -> Result<BookingId, StoreError>;

    /// Returns 0 if no booking has that id, 1 if it was removed.
    async fn delete_by_id(&self, id: BookingId) -> Result<u64, StoreError>;

    /// Bookings for the room sorted ascending by start.
    async fn list_by_room(&self, room: &str) -> Result<Vec<Booking>, StoreError>;

    async fn has_overlap(&self, room: &str, span: Span) -> Result<bool, StoreError>;
}

#[async_trait]
impl BookingStore for Engine {
    async fn insert(&self, room: &str, span: Span) -> Result<BookingId, StoreError> {
        Engine::insert(self, room, span).await
    }

    async fn reserve(&self, room: &str, span: Span) -> Result<BookingId, StoreError> {
        Engine::reserve(self, room, span).await
    }

    async fn delete_by_id(&self, id: BookingId) -> Result<u64, StoreError> {
        Engine::delete_by_id(self, id).await
    }

    async fn list_by_room(&self, room: &str) -> Result<Vec<Booking>, StoreError> {
        Ok(Engine::list_by_room(self, room).await)
    }

    async fn has_overlap(&self, room: &str, span: Span) -> Result<bool, StoreError> {
        Ok(Engine::has_overlap(self, room, span).await)
    }
}
