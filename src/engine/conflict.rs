use crate::model::*;

use super::StoreError;

/// Reject `span` if any booking in the room satisfies
/// `existing.start < span.end && existing.end > span.start`.
pub fn check_no_conflict(rs: &RoomState, span: &Span) -> Result<(), StoreError> {
    match rs.overlapping(span).next() {
        Some(existing) => Err(StoreError::Conflict(existing.id)),
        None => Ok(()),
    }
}
