use crate::event::Event;
use crate::log::EventLog;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// A pure function that folds an event into state.
///
/// Reducers receive owned state and return owned state. They do no I/O and
/// ignore event types they don't know.
///
/// # Examples
///
/// ```
/// use friendtracker::{Event, ReduceFn};
///
/// fn counter(state: u64, _event: &Event) -> u64 {
///     state + 1
/// }
///
/// let reducer: ReduceFn<u64> = counter;
/// ```
pub type ReduceFn<S> = fn(S, &Event) -> S;

/// State derived from an [`EventLog`] by folding a reducer over it.
///
/// Keeps a snapshot on disk so each refresh only reads the events appended
/// since the last one. The snapshot is plain JSON holding the folded state,
/// the log offset just past the last folded line and that line's hash:
///
/// ```text
/// $ jq . ~/.friendtracker/views/ledger.snapshot.json
/// {
///   "state": { "friends": [...], "hangouts": [...], "next_id": 4 },
///   "offset": 612,
///   "hash": "9c1d0e56b2a7f3e4"
/// }
/// ```
pub struct View<S> {
    name: String,
    reducer: ReduceFn<S>,
    snapshot_path: PathBuf,
    state: S,
    offset: u64,
    hash: String,
    loaded: bool,
}

impl<S: std::fmt::Debug> std::fmt::Debug for View<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("name", &self.name)
            .field("snapshot_path", &self.snapshot_path)
            .field("state", &self.state)
            .field("offset", &self.offset)
            .finish()
    }
}

impl<S> View<S>
where
    S: Serialize + DeserializeOwned + Default,
{
    /// Create a view whose snapshot lives at `<views_dir>/<name>.snapshot.json`.
    pub fn new(name: &str, reducer: ReduceFn<S>, views_dir: &Path) -> Self {
        let snapshot_path = views_dir.join(format!("{name}.snapshot.json"));
        View {
            name: name.to_string(),
            reducer,
            snapshot_path,
            state: S::default(),
            offset: 0,
            hash: String::new(),
            loaded: false,
        }
    }

    /// Bring the view up to date with the log.
    ///
    /// On first call, loads the snapshot from disk and checks it against the
    /// log; a snapshot pointing past EOF or at a line with a different hash
    /// is discarded and the whole log replayed. Afterwards only events past
    /// the stored offset are folded.
    ///
    /// # Errors
    ///
    /// Returns an error if reading events or saving the snapshot fails.
    pub fn refresh(&mut self, log: &EventLog) -> io::Result<&S> {
        if !self.loaded {
            self.load_snapshot()?;
            self.loaded = true;

            match self.verify_snapshot(log)? {
                SnapshotValidity::Valid => {}
                SnapshotValidity::OffsetBeyondEof => {
                    log::warn!(
                        "view '{}': snapshot offset {} is beyond log EOF, rebuilding",
                        self.name,
                        self.offset
                    );
                    self.reset();
                }
                SnapshotValidity::HashMismatch => {
                    log::warn!("view '{}': snapshot hash mismatch, rebuilding", self.name);
                    self.reset();
                }
            }
        }

        let mut state = std::mem::take(&mut self.state);
        let mut new_offset = self.offset;
        let mut new_hash = self.hash.clone();
        let mut processed = 0usize;

        for result in log.read_from(self.offset)? {
            let (event, next_offset, line_hash) = result?;
            state = (self.reducer)(state, &event);
            new_offset = next_offset;
            new_hash = line_hash;
            processed += 1;
        }

        self.state = state;

        if processed > 0 {
            log::debug!("view '{}': folded {processed} new events", self.name);
            self.offset = new_offset;
            self.hash = new_hash;
            self.save_snapshot()?;
        }

        Ok(&self.state)
    }

    /// The state as of the last refresh, or `S::default()` before the first.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Delete the snapshot and replay the whole log.
    ///
    /// # Errors
    ///
    /// Returns an error if deleting the snapshot, reading events, or saving
    /// the new snapshot fails.
    pub fn rebuild(&mut self, log: &EventLog) -> io::Result<&S> {
        for path in [&self.snapshot_path, &self.partial_snapshot_path()] {
            match fs::remove_file(path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
                _ => {}
            }
        }
        self.reset();
        self.loaded = true;
        log::info!("view '{}': rebuilding from the full log", self.name);
        self.refresh(log)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte offset into the log up to which events have been folded.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Where a snapshot is written before it replaces the current one.
    fn partial_snapshot_path(&self) -> PathBuf {
        self.snapshot_path.with_extension("json.tmp")
    }

    /// Adopt the snapshot on disk, if there is a readable one.
    fn load_snapshot(&mut self) -> io::Result<()> {
        let file = match File::open(&self.snapshot_path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        match serde_json::from_reader::<_, SnapshotFile<S>>(BufReader::new(file)) {
            Ok(snap) => {
                self.state = snap.state;
                self.offset = snap.offset;
                self.hash = snap.hash;
            }
            Err(e) => log::warn!(
                "view '{}': ignoring unreadable snapshot {}: {e}",
                self.name,
                self.snapshot_path.display()
            ),
        }
        Ok(())
    }

    /// Write the current state next to the snapshot, then rename it into
    /// place. A crash part way leaves the previous snapshot untouched.
    fn save_snapshot(&self) -> io::Result<()> {
        let partial = self.partial_snapshot_path();
        let mut out = BufWriter::new(File::create(&partial)?);
        let snap = SnapshotRef {
            state: &self.state,
            offset: self.offset,
            hash: &self.hash,
        };
        serde_json::to_writer(&mut out, &snap)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        out.flush()?;
        out.get_ref().sync_data()?;
        drop(out);
        fs::rename(&partial, &self.snapshot_path)
    }

    fn reset(&mut self) {
        self.state = S::default();
        self.offset = 0;
        self.hash = String::new();
    }

    fn verify_snapshot(&self, log: &EventLog) -> io::Result<SnapshotValidity> {
        if self.offset == 0 {
            return Ok(SnapshotValidity::Valid);
        }

        if self.offset > log.size()? {
            return Ok(SnapshotValidity::OffsetBeyondEof);
        }

        match log.read_line_hash_before(self.offset)? {
            Some(hash) if hash == self.hash => Ok(SnapshotValidity::Valid),
            Some(_) => Ok(SnapshotValidity::HashMismatch),
            None => Ok(SnapshotValidity::Valid),
        }
    }
}

#[derive(Deserialize)]
struct SnapshotFile<S> {
    state: S,
    offset: u64,
    hash: String,
}

#[derive(Serialize)]
struct SnapshotRef<'a, S> {
    state: &'a S,
    offset: u64,
    hash: &'a str,
}

enum SnapshotValidity {
    Valid,
    OffsetBeyondEof,
    HashMismatch,
}
