use thiserror::Error;

use crate::model::BookingId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conflict with booking: {0}")]
    Conflict(BookingId),
    #[error("WAL error: {0}")]
    Wal(String),
}
