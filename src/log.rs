use crate::event::Event;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// An append-only JSONL log of [`Event`]s inside a data directory.
///
/// ```text
/// <dir>/
///   events.jsonl           one event per line
///   friendtracker.lock     advisory lock shared by all processes
///   views/                 snapshots of derived state
/// ```
#[derive(Debug)]
pub struct EventLog {
    dir: PathBuf,
    log_path: PathBuf,
    lock_path: PathBuf,
    views_dir: PathBuf,
    file: File,
}

/// Whether a [`LogLock`] excludes other readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// An advisory lock on the data directory, released on drop.
#[derive(Debug)]
pub struct LogLock {
    file: File,
    mode: LockMode,
}

impl LogLock {
    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for LogLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Compute xxh64 hash of raw line bytes (without trailing newline), hex-encoded.
pub fn line_hash(line: &[u8]) -> String {
    let hash = xxhash_rust::xxh64::xxh64(line, 0);
    format!("{:016x}", hash)
}

impl EventLog {
    /// Open or create an event log in the given directory.
    ///
    /// Creates the directory and `views/` subdirectory if they don't exist.
    /// Opens or creates `events.jsonl` in append mode.
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let views_dir = dir.join("views");
        let log_path = dir.join("events.jsonl");
        let lock_path = dir.join("friendtracker.lock");

        fs::create_dir_all(&views_dir)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        log::debug!("opened event log at {}", log_path.display());

        Ok(EventLog {
            dir,
            log_path,
            lock_path,
            views_dir,
            file,
        })
    }

    /// Block until the directory lock is held in the given mode.
    ///
    /// Locks are per open file, so a process must not ask for a second lock
    /// while it still holds one.
    pub fn lock(&self, mode: LockMode) -> io::Result<LogLock> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        match mode {
            LockMode::Shared => FileExt::lock_shared(&file)?,
            LockMode::Exclusive => FileExt::lock_exclusive(&file)?,
        }
        Ok(LogLock { file, mode })
    }

    /// Append an event to the log.
    ///
    /// Serializes the event as a single JSON line, appends it to
    /// `events.jsonl`, and flushes to disk. Returns the byte offset where the
    /// event starts.
    ///
    /// Leftover bytes of an earlier write that never got its newline are cut
    /// off first, so the new line starts on a line boundary. Callers must
    /// hold the exclusive lock.
    pub fn append(&mut self, event: &Event) -> io::Result<u64> {
        self.truncate_torn_tail()?;
        let offset = self.file.seek(SeekFrom::End(0))?;
        let mut json = serde_json::to_string(event)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        json.push('\n');
        self.file.write_all(json.as_bytes())?;
        self.file.sync_data()?;
        log::debug!("appended {} event at offset {offset}", event.event_type);
        Ok(offset)
    }

    /// Read events starting at the given byte offset.
    ///
    /// Returns an iterator yielding `(event, next_byte_offset, line_hash)` for
    /// each complete line. Empty lines are skipped. A trailing partial line
    /// (missing its newline) is skipped silently.
    pub fn read_from(
        &self,
        offset: u64,
    ) -> io::Result<impl Iterator<Item = io::Result<(Event, u64, String)>> + use<>> {
        let mut file = File::open(&self.log_path)?;
        let file_len = file.metadata()?.len();
        file.seek(SeekFrom::Start(offset))?;

        Ok(LogIterator {
            lines: BufReader::new(file).lines(),
            pos: offset,
            file_len,
        })
    }

    /// Returns the path to the data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path to the log file.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Returns the path to the views directory.
    pub fn views_dir(&self) -> &Path {
        &self.views_dir
    }

    /// Returns the current size in bytes of the log file.
    pub fn size(&self) -> io::Result<u64> {
        Ok(fs::metadata(&self.log_path)?.len())
    }

    /// Read the line immediately before the given byte offset and return its hash.
    ///
    /// The offset should point to the byte after the newline of the last
    /// consumed line. Returns `None` if offset is 0 or past the end of the file.
    pub fn read_line_hash_before(&self, offset: u64) -> io::Result<Option<String>> {
        if offset == 0 {
            return Ok(None);
        }

        let mut file = File::open(&self.log_path)?;
        let file_len = file.metadata()?.len();

        if offset > file_len {
            return Ok(None);
        }

        // offset - 1 is the '\n' ending the previous line
        let newline_pos = offset - 1;
        let mut start = 0u64;

        if newline_pos > 0 {
            let scan_start = newline_pos.saturating_sub(8192);
            file.seek(SeekFrom::Start(scan_start))?;
            let mut buf = vec![0u8; (newline_pos - scan_start) as usize];
            file.read_exact(&mut buf)?;

            start = match buf.iter().rposition(|&b| b == b'\n') {
                Some(pos) => scan_start + pos as u64 + 1,
                None => scan_start,
            };
        }

        file.seek(SeekFrom::Start(start))?;
        let mut line_buf = vec![0u8; (newline_pos - start) as usize];
        file.read_exact(&mut line_buf)?;

        Ok(Some(line_hash(&line_buf)))
    }

    /// Shrink the log back to the end of its last complete line.
    fn truncate_torn_tail(&mut self) -> io::Result<()> {
        let mut file = File::open(&self.log_path)?;
        let len = file.metadata()?.len();

        let mut buf = [0u8; 4096];
        let mut end = len;
        let keep = loop {
            if end == 0 {
                break 0;
            }
            let start = end.saturating_sub(buf.len() as u64);
            let chunk = &mut buf[..(end - start) as usize];
            file.seek(SeekFrom::Start(start))?;
            file.read_exact(chunk)?;
            if let Some(pos) = chunk.iter().rposition(|&b| b == b'\n') {
                break start + pos as u64 + 1;
            }
            end = start;
        };

        if keep < len {
            log::warn!(
                "dropping {} bytes of an unfinished write at the end of {}",
                len - keep,
                self.log_path.display()
            );
            self.file.set_len(keep)?;
        }
        Ok(())
    }
}

struct LogIterator<I> {
    lines: I,
    pos: u64,
    file_len: u64,
}

impl<I: Iterator<Item = io::Result<String>>> Iterator for LogIterator<I> {
    type Item = io::Result<(Event, u64, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };

            let line_bytes = line.len() as u64;

            // Content running exactly to EOF has no newline: a write that
            // was cut short.
            if self.pos + line_bytes >= self.file_len {
                return None;
            }

            let next_pos = self.pos + line_bytes + 1;

            if line.is_empty() {
                self.pos = next_pos;
                continue;
            }

            let hash = line_hash(line.as_bytes());

            let event: Event = match serde_json::from_str(&line) {
                Ok(e) => e,
                Err(e) => {
                    return Some(Err(io::Error::new(io::ErrorKind::InvalidData, e)));
                }
            };

            self.pos = next_pos;
            return Some(Ok((event, next_pos, hash)));
        }
    }
}
