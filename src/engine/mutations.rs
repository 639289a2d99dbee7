use std::sync::atomic::Ordering;

use tokio::sync::oneshot;

use crate::model::*;

use super::conflict::check_no_conflict;
use super::{Engine, SharedRoomState, StoreError, WalCommand};

impl Engine {
    /// Append a booking without checking for overlap.
    pub async fn insert(&self, room: &str, span: Span) -> Result<BookingId, StoreError> {
        let _gate = self.gate.read().await;
        let rs = self.room_entry(room);
        let mut guard = rs.write().await;
        self.append_booking(&mut guard, span).await
    }

    /// Check for overlap and insert while holding the room's write lock, so
    /// two overlapping requests for the same room can never both succeed.
    pub async fn reserve(&self, room: &str, span: Span) -> Result<BookingId, StoreError> {
        let _gate = self.gate.read().await;
        let rs = self.room_entry(room);
        let mut guard = rs.write().await;
        check_no_conflict(&guard, &span)?;
        let id = self.append_booking(&mut guard, span).await?;
        metrics::counter!(crate::observability::BOOKINGS_CREATED_TOTAL).increment(1);
        Ok(id)
    }

    /// Remove a booking. Returns the number of bookings removed (0 or 1).
    pub async fn delete_by_id(&self, id: BookingId) -> Result<u64, StoreError> {
        let _gate = self.gate.read().await;
        let Some(room) = self.get_room_for_booking(id) else {
            return Ok(0);
        };
        let Some(rs) = self.get_room(&room) else {
            return Ok(0);
        };
        let mut guard = rs.write().await;
        // A concurrent delete may have won the lock first.
        if !guard.bookings.iter().any(|b| b.id == id) {
            return Ok(0);
        }

        let event = Event::BookingDeleted { id, room };
        self.wal_append(&event).await?;
        guard.remove_booking(id);
        self.booking_to_room.remove(&id);
        metrics::counter!(crate::observability::BOOKINGS_DELETED_TOTAL).increment(1);
        Ok(1)
    }

    /// WAL-append + apply. Caller holds the room's write lock.
    async fn append_booking(&self, rs: &mut RoomState, span: Span) -> Result<BookingId, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = Event::BookingCreated {
            id,
            room: rs.room.clone(),
            span,
        };
        self.wal_append(&event).await?;
        self.booking_to_room.insert(id, rs.room.clone());
        rs.insert_booking(Booking {
            id,
            room: rs.room.clone(),
            span,
        });
        Ok(id)
    }

    /// Rewrite the WAL with only the events needed to recreate the current state.
    /// No-op for an in-memory store.
    pub async fn compact_wal(&self) -> Result<(), StoreError> {
        let Some(wal_tx) = &self.wal_tx else {
            return Ok(());
        };
        let _gate = self.gate.write().await;

        let mut events = vec![Event::SequenceAdvanced {
            next_id: self.next_id.load(Ordering::SeqCst),
        }];
        let rooms: Vec<SharedRoomState> = self.rooms.iter().map(|e| e.value().clone()).collect();
        for rs in rooms {
            let guard = rs.read().await;
            events.extend(guard.bookings.iter().map(|b| Event::BookingCreated {
                id: b.id,
                room: b.room.clone(),
                span: b.span,
            }));
        }

        let (tx, rx) = oneshot::channel();
        wal_tx
            .send(WalCommand::Compact { events, response: tx })
            .await
            .map_err(|_| StoreError::Wal("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| StoreError::Wal("WAL writer dropped response".into()))?
            .map_err(|e| StoreError::Wal(e.to_string()))
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let Some(wal_tx) = &self.wal_tx else {
            return 0;
        };
        let (tx, rx) = oneshot::channel();
        if wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
