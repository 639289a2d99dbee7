mod conflict;
mod error;
mod mutations;
mod queries;
mod store;

pub use conflict::check_no_conflict;
pub use error::StoreError;
pub use store::BookingStore;

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicI64;

use dashmap::DashMap;
use tokio::sync::{RwLock, mpsc, oneshot};

use crate::model::*;
use crate::wal::Wal;

pub type SharedRoomState = Arc<RwLock<RoomState>>;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first Append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available Appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Respond to all senders with the batch result.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        let (event, response) = match cmd {
            WalCommand::Append { event, response } => (event, response),
            other => {
                handle_non_append(&mut wal, other);
                continue;
            }
        };
        let mut batch = vec![(event, response)];
        let mut deferred = None;

        loop {
            match rx.try_recv() {
                Ok(WalCommand::Append { event, response }) => batch.push((event, response)),
                Ok(other) => {
                    // Flush the batch before handling the non-append command.
                    deferred = Some(other);
                    break;
                }
                Err(_) => break,
            }
        }

        metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
        let flush_start = std::time::Instant::now();
        let result = flush_batch(&mut wal, &batch);
        metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
            .record(flush_start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            tracing::error!("WAL flush failed for batch of {}: {e}", batch.len());
        }
        respond_batch(batch, &result);

        if let Some(cmd) = deferred {
            handle_non_append(&mut wal, cmd);
        }
    }
}

/// Append and fsync the whole batch. On any failure the batch is cut back out
/// of the log: every caller gets an error, so none of it may replay later.
fn flush_batch(wal: &mut Wal, batch: &[(Event, oneshot::Sender<io::Result<()>>)]) -> io::Result<()> {
    let result = batch
        .iter()
        .try_for_each(|(event, _)| wal.append_buffered(event))
        .and_then(|()| wal.flush_sync());
    if result.is_err() {
        if let Err(e) = wal.discard_uncommitted() {
            tracing::error!("WAL rollback failed, refusing appends until it succeeds: {e}");
        }
    }
    result
}

fn respond_batch(batch: Vec<(Event, oneshot::Sender<io::Result<()>>)>, result: &io::Result<()>) {
    for (_, tx) in batch {
        let r = match result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { .. } => unreachable!("appends are batched by the writer loop"),
    }
}

/// The booking store: per-room state in memory, every mutation logged to the WAL first.
pub struct Engine {
    pub(super) rooms: DashMap<String, SharedRoomState>,
    /// Reverse lookup: booking id → room.
    pub(super) booking_to_room: DashMap<BookingId, String>,
    pub(super) next_id: AtomicI64,
    /// `None` for an in-memory store.
    pub(super) wal_tx: Option<mpsc::Sender<WalCommand>>,
    /// Mutations hold this shared, compaction holds it exclusively.
    pub(super) gate: RwLock<()>,
}

/// State rebuilt from a replayed log.
struct Replayed {
    rooms: HashMap<String, RoomState>,
    booking_to_room: HashMap<BookingId, String>,
    next_id: BookingId,
}

fn replay_events(events: &[Event]) -> Replayed {
    let mut replayed = Replayed {
        rooms: HashMap::new(),
        booking_to_room: HashMap::new(),
        next_id: 1,
    };
    for event in events {
        match event {
            Event::BookingCreated { id, room, span } => {
                replayed
                    .rooms
                    .entry(room.clone())
                    .or_insert_with(|| RoomState::new(room.clone()))
                    .insert_booking(Booking {
                        id: *id,
                        room: room.clone(),
                        span: *span,
                    });
                replayed.booking_to_room.insert(*id, room.clone());
                replayed.next_id = replayed.next_id.max(id + 1);
            }
            Event::BookingDeleted { id, room } => {
                if let Some(rs) = replayed.rooms.get_mut(room) {
                    rs.remove_booking(*id);
                }
                replayed.booking_to_room.remove(id);
            }
            Event::SequenceAdvanced { next_id } => {
                replayed.next_id = replayed.next_id.max(*next_id);
            }
        }
    }
    replayed
}

impl Engine {
    /// Replay the log at `wal_path` and start the background writer.
    /// Must be called from within a tokio runtime.
    pub fn open(wal_path: PathBuf) -> io::Result<Self> {
        let (wal, events) = Wal::recover(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let replayed = replay_events(&events);
        tracing::info!(
            "replayed {} events from {}: {} bookings, next id {}",
            events.len(),
            wal_path.display(),
            replayed.booking_to_room.len(),
            replayed.next_id
        );
        Ok(Self::from_replayed(replayed, Some(wal_tx)))
    }

    /// A store with no log. Contents are lost when the process exits.
    pub fn in_memory() -> Self {
        Self::from_replayed(replay_events(&[]), None)
    }

    fn from_replayed(replayed: Replayed, wal_tx: Option<mpsc::Sender<WalCommand>>) -> Self {
        let rooms = DashMap::new();
        for (name, rs) in replayed.rooms {
            rooms.insert(name, Arc::new(RwLock::new(rs)));
        }
        Self {
            rooms,
            booking_to_room: replayed.booking_to_room.into_iter().collect(),
            next_id: AtomicI64::new(replayed.next_id),
            wal_tx,
            gate: RwLock::new(()),
        }
    }

    /// Write event to WAL via the background group-commit writer.
    pub(super) async fn wal_append(&self, event: &Event) -> Result<(), StoreError> {
        let Some(wal_tx) = &self.wal_tx else {
            return Ok(());
        };
        let (tx, rx) = oneshot::channel();
        wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| StoreError::Wal("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| StoreError::Wal("WAL writer dropped response".into()))?
            .map_err(|e| StoreError::Wal(e.to_string()))
    }

    pub fn get_room(&self, room: &str) -> Option<SharedRoomState> {
        self.rooms.get(room).map(|e| e.value().clone())
    }

    /// Get the room's state, creating an empty one on first use.
    pub(super) fn room_entry(&self, room: &str) -> SharedRoomState {
        if let Some(rs) = self.get_room(room) {
            return rs;
        }
        self.rooms
            .entry(room.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(RoomState::new(room))))
            .value()
            .clone()
    }

    pub fn get_room_for_booking(&self, id: BookingId) -> Option<String> {
        self.booking_to_room.get(&id).map(|e| e.value().clone())
    }

    pub fn booking_count(&self) -> usize {
        self.booking_to_room.len()
    }
}
