use serde::{Deserialize, Serialize};

/// Unix milliseconds. The only time type.
pub type Ms = i64;

/// Store-assigned booking identifier. Strictly increasing, never reused.
pub type BookingId = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    /// `self.start < other.end && self.end > other.start`. Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// A persisted booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub room: String,
    pub span: Span,
}

/// All bookings of one room, sorted by `span.start` (ties by id).
#[derive(Debug, Clone)]
pub struct RoomState {
    pub room: String,
    pub bookings: Vec<Booking>,
}

impl RoomState {
    pub fn new(room: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            bookings: Vec::new(),
        }
    }

    /// Insert booking maintaining sort order by (span.start, id).
    pub fn insert_booking(&mut self, booking: Booking) {
        let key = (booking.span.start, booking.id);
        let pos = self
            .bookings
            .binary_search_by_key(&key, |b| (b.span.start, b.id))
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
    }

    /// Remove booking by id.
    pub fn remove_booking(&mut self, id: BookingId) -> Option<Booking> {
        let pos = self.bookings.iter().position(|b| b.id == id)?;
        Some(self.bookings.remove(pos))
    }

    /// Return only bookings whose span overlaps the query window.
    /// Uses binary search to skip bookings starting at or after `query.end`.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &Booking> {
        let right_bound = self
            .bookings
            .partition_point(|b| b.span.start < query.end);
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.span.overlaps(query))
    }
}

/// The WAL record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    BookingCreated {
        id: BookingId,
        room: String,
        span: Span,
    },
    BookingDeleted {
        id: BookingId,
        room: String,
    },
    /// Head of a compacted log: the next id to hand out.
    SequenceAdvanced {
        next_id: BookingId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(id: BookingId, start: Ms, end: Ms) -> Booking {
        Booking {
            id,
            room: "A".into(),
            span: Span::new(start, end),
        }
    }

    #[test]
    fn span_overlap() {
        let a = Span::new(100, 200);
        let b = Span::new(150, 250);
        let c = Span::new(200, 300);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c)); // adjacent, not overlapping
        assert!(!c.overlaps(&a));
        assert_eq!(a.duration_ms(), 100);
    }

    #[test]
    fn span_containment_overlaps() {
        let outer = Span::new(100, 400);
        let inner = Span::new(150, 300);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
        assert!(outer.overlaps(&outer));
    }

    #[test]
    fn booking_ordering() {
        let mut rs = RoomState::new("A");
        rs.insert_booking(booking(1, 300, 400));
        rs.insert_booking(booking(2, 100, 200));
        rs.insert_booking(booking(3, 200, 300));
        let starts: Vec<Ms> = rs.bookings.iter().map(|b| b.span.start).collect();
        assert_eq!(starts, vec![100, 200, 300]);
    }

    #[test]
    fn equal_starts_ordered_by_id() {
        let mut rs = RoomState::new("A");
        rs.insert_booking(booking(7, 100, 200));
        rs.insert_booking(booking(3, 100, 150));
        assert_eq!(rs.bookings[0].id, 3);
        assert_eq!(rs.bookings[1].id, 7);
    }

    #[test]
    fn remove_middle_preserves_order() {
        let mut rs = RoomState::new("A");
        for i in 0..3 {
            rs.insert_booking(booking(i + 1, i * 100, i * 100 + 50));
        }
        assert_eq!(rs.remove_booking(2).map(|b| b.id), Some(2));
        assert_eq!(rs.bookings.len(), 2);
        assert_eq!(rs.bookings[0].id, 1);
        assert_eq!(rs.bookings[1].id, 3);
    }

    #[test]
    fn remove_nonexistent_returns_none() {
        let mut rs = RoomState::new("A");
        rs.insert_booking(booking(1, 100, 200));
        assert!(rs.remove_booking(42).is_none());
        assert_eq!(rs.bookings.len(), 1);
    }

    #[test]
    fn overlapping_skips_past_and_future() {
        let mut rs = RoomState::new("A");
        rs.insert_booking(booking(1, 100, 200));
        rs.insert_booking(booking(2, 450, 600));
        rs.insert_booking(booking(3, 1000, 1100));

        let hits: Vec<_> = rs.overlapping(&Span::new(500, 800)).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 2);
    }

    #[test]
    fn overlapping_adjacent_not_included() {
        let mut rs = RoomState::new("A");
        rs.insert_booking(booking(1, 100, 200));
        assert_eq!(rs.overlapping(&Span::new(200, 300)).count(), 0);
        assert_eq!(rs.overlapping(&Span::new(0, 100)).count(), 0);
    }

    #[test]
    fn overlapping_single_ms_overlap() {
        let mut rs = RoomState::new("A");
        rs.insert_booking(booking(1, 100, 201));
        assert_eq!(rs.overlapping(&Span::new(200, 300)).count(), 1);
    }

    #[test]
    fn overlapping_large_booking_spanning_query() {
        let mut rs = RoomState::new("A");
        rs.insert_booking(booking(1, 0, 10_000));
        assert_eq!(rs.overlapping(&Span::new(500, 600)).count(), 1);
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = Event::BookingCreated {
            id: 1,
            room: "Board Room".into(),
            span: Span::new(1000, 2000),
        };
        let bytes = bincode::serialize(&event).unwrap();
        let decoded: Event = bincode::deserialize(&bytes).unwrap();
        assert_eq!(event, decoded);
    }
}
