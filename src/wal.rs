use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::model::Event;

/// Encode a single event to [len][bincode][crc32] format. Returns the bytes written.
fn encode_event(writer: &mut impl Write, event: &Event) -> io::Result<u64> {
    let payload =
        bincode::serialize(event).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let len = payload.len() as u32;
    let crc = crc32fast::hash(&payload);
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&payload)?;
    writer.write_all(&crc.to_le_bytes())?;
    Ok(8 + payload.len() as u64)
}

/// Read exactly `buf.len()` bytes. `Ok(false)` means the log ended (cleanly or mid-entry).
fn read_or_eof(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Decode the next entry and its encoded size. `Ok(None)` ends replay: EOF,
/// truncated tail, bad CRC or bad payload.
fn decode_event(reader: &mut impl Read) -> io::Result<Option<(Event, u64)>> {
    let mut len_buf = [0u8; 4];
    if !read_or_eof(reader, &mut len_buf)? {
        return Ok(None);
    }
    let len = u32::from_le_bytes(len_buf) as usize;

    let mut payload = vec![0u8; len];
    if !read_or_eof(reader, &mut payload)? {
        return Ok(None);
    }

    let mut crc_buf = [0u8; 4];
    if !read_or_eof(reader, &mut crc_buf)? {
        return Ok(None);
    }
    if u32::from_le_bytes(crc_buf) != crc32fast::hash(&payload) {
        return Ok(None);
    }

    Ok(bincode::deserialize::<Event>(&payload)
        .ok()
        .map(|event| (event, 8 + len as u64)))
}

/// Append-only booking log.
///
/// Format per entry: `[u32: len][bincode: Event][u32: crc32]`
/// - `len` is the byte length of the bincode payload (not including the CRC).
/// - A torn last entry (crash mid-write) is discarded on replay.
/// - Bytes past `committed_len` belong to a batch whose fsync has not
///   succeeded yet. A failed batch is cut off with `discard_uncommitted`.
pub struct Wal {
    writer: BufWriter<File>,
    path: PathBuf,
    committed_len: u64,
    pending_len: u64,
    pending_appends: u64,
    appends_since_compact: u64,
    /// Set while a rollback is incomplete. Appends are refused until it clears.
    poisoned: bool,
    #[cfg(test)]
    fail_next_flush: bool,
}

impl Wal {
    /// Open (or create) the log at `path`.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let committed_len = file.metadata()?.len();
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            committed_len,
            pending_len: 0,
            pending_appends: 0,
            appends_since_compact: 0,
            poisoned: false,
            #[cfg(test)]
            fail_next_flush: false,
        })
    }

    /// Replay the log, cut off any torn or corrupt tail, and open it for
    /// appends. New entries then land right after the last valid one.
    pub fn recover(path: &Path) -> io::Result<(Self, Vec<Event>)> {
        let (events, valid_len) = Self::replay_with_len(path)?;
        let mut wal = Self::open(path)?;
        if wal.committed_len > valid_len {
            tracing::warn!(
                "truncating {} bytes of unreadable tail from {}",
                wal.committed_len - valid_len,
                path.display()
            );
            wal.writer.get_ref().set_len(valid_len)?;
            wal.writer.get_ref().sync_all()?;
            wal.committed_len = valid_len;
        }
        Ok((wal, events))
    }

    /// Append and fsync one event. Production code batches through
    /// `append_buffered` + `flush_sync` instead.
    #[cfg(test)]
    pub fn append(&mut self, event: &Event) -> io::Result<()> {
        self.append_buffered(event)?;
        self.flush_sync()
    }

    /// Buffer one event without flushing. Durable only after `flush_sync()`.
    pub fn append_buffered(&mut self, event: &Event) -> io::Result<()> {
        if self.poisoned {
            return Err(io::Error::other("log rollback failed earlier, refusing appends"));
        }
        self.pending_len += encode_event(&mut self.writer, event)?;
        self.pending_appends += 1;
        self.appends_since_compact += 1;
        Ok(())
    }

    /// Flush and fsync everything buffered. On success it becomes committed.
    pub fn flush_sync(&mut self) -> io::Result<()> {
        #[cfg(test)]
        if std::mem::take(&mut self.fail_next_flush) {
            return Err(io::Error::other("simulated flush failure"));
        }
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        self.committed_len += self.pending_len;
        self.pending_len = 0;
        self.pending_appends = 0;
        Ok(())
    }

    /// Throw away everything appended since the last successful `flush_sync`,
    /// both the unwritten buffer and any bytes that already reached the file.
    pub fn discard_uncommitted(&mut self) -> io::Result<()> {
        self.poisoned = true;
        let file = self.writer.get_ref().try_clone()?;
        // `into_parts` hands back the buffer instead of flushing it on drop.
        let stale = std::mem::replace(&mut self.writer, BufWriter::new(file));
        let (_file, _unwritten) = stale.into_parts();
        self.writer.get_ref().set_len(self.committed_len)?;
        self.writer.get_ref().sync_all()?;
        self.appends_since_compact -= self.pending_appends;
        self.pending_len = 0;
        self.pending_appends = 0;
        self.poisoned = false;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn fail_next_flush(&mut self) {
        self.fail_next_flush = true;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn appends_since_compact(&self) -> u64 {
        self.appends_since_compact
    }

    /// Write the compacted event set to `<path>.wal.tmp` and fsync it.
    pub fn write_compact_file(path: &Path, events: &[Event]) -> io::Result<()> {
        let tmp_path = path.with_extension("wal.tmp");
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        for event in events {
            encode_event(&mut writer, event)?;
        }
        writer.flush()?;
        writer.get_ref().sync_all()
    }

    /// Rename the temp file over the log and reopen for appends.
    pub fn swap_compact_file(&mut self) -> io::Result<()> {
        let tmp_path = self.path.with_extension("wal.tmp");
        fs::rename(&tmp_path, &self.path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.committed_len = file.metadata()?.len();
        self.writer = BufWriter::new(file);
        self.pending_len = 0;
        self.pending_appends = 0;
        self.appends_since_compact = 0;
        self.poisoned = false;
        Ok(())
    }

    /// Replay the log from disk, returning every valid event in order.
    /// A missing file is an empty log.
    pub fn replay(path: &Path) -> io::Result<Vec<Event>> {
        Ok(Self::replay_with_len(path)?.0)
    }

    /// Like `replay`, plus the byte length of the valid prefix.
    fn replay_with_len(path: &Path) -> io::Result<(Vec<Event>, u64)> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok((Vec::new(), 0)),
            Err(e) => return Err(e),
        };
        let mut reader = BufReader::new(file);
        let mut events = Vec::new();
        let mut valid_len = 0;
        while let Some((event, size)) = decode_event(&mut reader)? {
            events.push(event);
            valid_len += size;
        }
        Ok((events, valid_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Span;

    fn tmp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("roombook_test_wal");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = fs::remove_file(&path);
        path
    }

    fn created(id: i64, room: &str, start: i64, end: i64) -> Event {
        Event::BookingCreated {
            id,
            room: room.into(),
            span: Span::new(start, end),
        }
    }

    #[test]
    fn append_and_replay() {
        let path = tmp_path("append_and_replay.wal");
        let events = vec![
            created(1, "A", 1000, 2000),
            created(2, "B", 1000, 2000),
            Event::BookingDeleted { id: 1, room: "A".into() },
        ];

        {
            let mut wal = Wal::open(&path).unwrap();
            for e in &events {
                wal.append(e).unwrap();
            }
        }

        assert_eq!(Wal::replay(&path).unwrap(), events);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn replay_handles_truncation() {
        let path = tmp_path("truncation.wal");
        let event = created(1, "A", 1000, 2000);
        {
            let mut wal = Wal::open(&path).unwrap();
            wal.append(&event).unwrap();
        }
        // Torn second entry: a length prefix promising more than is there.
        {
            let mut f = OpenOptions::new().append(true).open(&path).unwrap();
            f.write_all(&64u32.to_le_bytes()).unwrap();
            f.write_all(&[1, 2]).unwrap();
        }

        let replayed = Wal::replay(&path).unwrap();
        assert_eq!(replayed, vec![event]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn replay_nonexistent_file() {
        let path = tmp_path("nonexistent.wal");
        assert!(Wal::replay(&path).unwrap().is_empty());
    }

    #[test]
    fn replay_stops_at_corrupt_crc() {
        let path = tmp_path("corrupt_crc.wal");
        let good = created(1, "A", 0, 10);
        {
            let mut wal = Wal::open(&path).unwrap();
            wal.append(&good).unwrap();
        }
        {
            let payload = bincode::serialize(&created(2, "A", 10, 20)).unwrap();
            let mut f = OpenOptions::new().append(true).open(&path).unwrap();
            f.write_all(&(payload.len() as u32).to_le_bytes()).unwrap();
            f.write_all(&payload).unwrap();
            f.write_all(&0xDEADBEEFu32.to_le_bytes()).unwrap();
        }

        assert_eq!(Wal::replay(&path).unwrap(), vec![good]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn compact_then_append() {
        let path = tmp_path("compact_append.wal");
        let mut wal = Wal::open(&path).unwrap();
        for i in 0..20 {
            wal.append(&created(i + 1, "A", i * 10, i * 10 + 5)).unwrap();
            wal.append(&Event::BookingDeleted { id: i + 1, room: "A".into() }).unwrap();
        }
        assert_eq!(wal.appends_since_compact(), 40);
        let before = fs::metadata(&path).unwrap().len();

        let compacted = vec![Event::SequenceAdvanced { next_id: 21 }];
        Wal::write_compact_file(wal.path(), &compacted).unwrap();
        wal.swap_compact_file().unwrap();
        assert_eq!(wal.appends_since_compact(), 0);

        let after = fs::metadata(&path).unwrap().len();
        assert!(after < before, "compacted log should be smaller: {after} < {before}");

        let next = created(21, "A", 500, 600);
        wal.append(&next).unwrap();
        drop(wal);

        let replayed = Wal::replay(&path).unwrap();
        assert_eq!(replayed, vec![compacted[0].clone(), next]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn discarded_batch_never_reaches_the_log() {
        let path = tmp_path("discard_uncommitted.wal");
        let kept = created(1, "A", 0, 10);
        let lost = created(2, "A", 20, 30);
        let later = created(3, "A", 20, 30);

        let mut wal = Wal::open(&path).unwrap();
        wal.append(&kept).unwrap();
        wal.append_buffered(&lost).unwrap();
        wal.fail_next_flush();
        assert!(wal.flush_sync().is_err());
        wal.discard_uncommitted().unwrap();
        assert_eq!(wal.appends_since_compact(), 1);

        wal.append(&later).unwrap();
        drop(wal);
        assert_eq!(Wal::replay(&path).unwrap(), vec![kept, later]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn discard_truncates_bytes_already_on_disk() {
        let path = tmp_path("discard_on_disk.wal");
        let kept = created(1, "A", 0, 10);
        let mut wal = Wal::open(&path).unwrap();
        wal.append(&kept).unwrap();
        let committed = fs::metadata(&path).unwrap().len();

        // Written through to the file but never acknowledged.
        wal.append_buffered(&created(2, "A", 20, 30)).unwrap();
        wal.writer.flush().unwrap();
        assert!(fs::metadata(&path).unwrap().len() > committed);

        wal.discard_uncommitted().unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), committed);
        drop(wal);
        assert_eq!(Wal::replay(&path).unwrap(), vec![kept]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn recover_cuts_torn_tail_before_new_appends() {
        let path = tmp_path("recover_torn.wal");
        let first = created(1, "A", 0, 10);
        {
            let mut wal = Wal::open(&path).unwrap();
            wal.append(&first).unwrap();
        }
        {
            let mut f = OpenOptions::new().append(true).open(&path).unwrap();
            f.write_all(&64u32.to_le_bytes()).unwrap();
            f.write_all(&[1, 2, 3]).unwrap();
        }

        let (mut wal, events) = Wal::recover(&path).unwrap();
        assert_eq!(events, vec![first.clone()]);
        let second = created(2, "A", 10, 20);
        wal.append(&second).unwrap();
        drop(wal);
        assert_eq!(Wal::replay(&path).unwrap(), vec![first, second]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn append_buffered_is_durable_after_flush() {
        let path = tmp_path("buffered_flush.wal");
        let events: Vec<Event> = (1..=5).map(|i| created(i, "A", i * 100, i * 100 + 50)).collect();
        {
            let mut wal = Wal::open(&path).unwrap();
            for e in &events {
                wal.append_buffered(e).unwrap();
            }
            wal.flush_sync().unwrap();
        }
        assert_eq!(Wal::replay(&path).unwrap(), events);
        let _ = fs::remove_file(&path);
    }
}
