//! File-backed implementation of `ChainStore`.
//!
//! `FileChainStore` appends finalized events to a JSON Lines file.  The file
//! is owned by a `LogFile` that lives behind a `Mutex`; every read of the
//! chain tip and every write goes through that lock, so "read previous
//! hash → compute → write" is one critical section no matter how many
//! request handlers share the store.
//!
//! Only the last line is read on append.  If that line cannot be trusted as
//! a chain link the store refuses to write: appending after an unreadable
//! or inconsistent tail would silently fork the chain.  Full-file replay is
//! the job of `LogVerifier`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, error};

use guardian_contracts::{
    error::{GuardianError, GuardianResult},
    event::{CandidateEvent, CryptographicIntegrity, FinalizedEvent, GENESIS_HASH, HASH_ALGORITHM},
};
use guardian_core::traits::{ChainStore, EventValidator};

use crate::chain::{event_digest, is_hex_digest, DeclaredIntegrity};

/// Backwards read size when searching for the start of the last line.
const TAIL_CHUNK: u64 = 4096;

// ── Owned log handle ──────────────────────────────────────────────────────────

/// The open log.  Only reachable through `FileChainStore::log`.
///
/// The handle is opened read + append on first use and kept for the life of
/// the store; every tail read and every write goes through it.
struct LogFile {
    handle: Option<File>,
}

impl LogFile {
    /// The handle, if the log exists.  Never creates the file.
    fn existing(&mut self, path: &Path) -> GuardianResult<Option<&mut File>> {
        let file = match self.handle.take() {
            Some(file) => file,
            None => match OpenOptions::new().read(true).append(true).open(path) {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(storage(path, "open", e)),
            },
        };
        Ok(Some(self.handle.insert(file)))
    }

    /// The handle, creating the log (and its parent directories) if needed.
    /// A newly created file's directory entry is synced before returning.
    fn create(&mut self, path: &Path) -> GuardianResult<&mut File> {
        if self.existing(path)?.is_none() {
            let parent = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            fs::create_dir_all(parent).map_err(|e| storage(parent, "create directory", e))?;
            let file = OpenOptions::new()
                .read(true)
                .append(true)
                .create(true)
                .open(path)
                .map_err(|e| storage(path, "create", e))?;
            sync_dir(parent).map_err(|e| storage(parent, "sync directory", e))?;
            self.handle = Some(file);
        }
        self.existing(path)?.ok_or_else(|| GuardianError::Storage {
            reason: format!("audit log '{}' vanished after creation", path.display()),
        })
    }

    /// The hash the next event must link to.
    fn tip(&mut self, path: &Path) -> GuardianResult<String> {
        let file = match self.existing(path)? {
            Some(file) => file,
            None => return Ok(GENESIS_HASH.to_string()),
        };
        let len = file.metadata().map_err(|e| storage(path, "stat", e))?.len();
        if len == 0 {
            return Ok(GENESIS_HASH.to_string());
        }

        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1))
            .and_then(|_| file.read_exact(&mut last))
            .map_err(|e| storage(path, "read", e))?;
        if last[0] != b'\n' {
            return Err(corrupt("log does not end with a newline; the last append may be torn"));
        }

        let line = read_last_line(file, len).map_err(|e| storage(path, "read", e))?;
        tail_hash(&line)
    }

    /// Append one line, newline included, in a single write, then flush it
    /// to stable storage.
    fn append_line(&mut self, path: &Path, line: &str) -> GuardianResult<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        let file = self.create(path)?;
        file.write_all(&buf).map_err(|e| storage(path, "write", e))?;
        file.sync_data().map_err(|e| storage(path, "sync", e))?;
        Ok(())
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// Return the bytes of the last line of `file`, excluding its terminating
/// newline.  `len` is the file length and the final byte must be `\n`.
fn read_last_line(file: &mut File, len: u64) -> io::Result<Vec<u8>> {
    let mut start = len - 1;
    let mut line: Vec<u8> = Vec::new();

    while start > 0 {
        let chunk = TAIL_CHUNK.min(start);
        start -= chunk;

        let mut block = vec![0u8; chunk as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(&mut block)?;

        if let Some(pos) = block.iter().rposition(|&b| b == b'\n') {
            block.drain(..=pos);
            block.extend_from_slice(&line);
            return Ok(block);
        }
        block.extend_from_slice(&line);
        line = block;
    }
    Ok(line)
}

/// Check that the tail line is a self-consistent chain link and return its
/// `event_hash`.
///
/// Beyond parsing, the tail's own hash is recomputed from its payload and
/// declared previous hash.  This catches a tail whose `event_hash` was
/// replaced, without scanning the rest of the file.
fn tail_hash(line: &[u8]) -> GuardianResult<String> {
    if line.is_empty() {
        return Err(corrupt("last line is empty"));
    }
    let record: Value = serde_json::from_slice(line)
        .map_err(|e| corrupt(format!("last line is not valid JSON: {e}")))?;
    let declared = DeclaredIntegrity::from_record(&record)
        .map_err(|field| corrupt(format!("last line is missing {field}")))?;

    if declared.hash_algorithm != HASH_ALGORITHM {
        return Err(corrupt(format!(
            "last line uses hash algorithm {:?}",
            declared.hash_algorithm
        )));
    }
    if !is_hex_digest(&declared.event_hash) || !is_hex_digest(&declared.previous_event_hash) {
        return Err(corrupt("last line does not carry well-formed hex digests"));
    }

    let recomputed = event_digest(&record, &declared.previous_event_hash);
    if recomputed != declared.event_hash {
        return Err(corrupt(format!(
            "last line declares event_hash {} but its content hashes to {}",
            declared.event_hash, recomputed
        )));
    }
    Ok(declared.event_hash)
}

fn corrupt(reason: impl Into<String>) -> GuardianError {
    GuardianError::ChainCorruption {
        reason: reason.into(),
    }
}

fn storage(path: &Path, op: &str, e: io::Error) -> GuardianError {
    GuardianError::Storage {
        reason: format!("failed to {op} '{}': {e}", path.display()),
    }
}

// ── Public store ──────────────────────────────────────────────────────────────

/// An append-only, SHA-256 hash-chained JSON Lines log on local disk.
///
/// # Thread safety
///
/// `append()` holds an internal `Mutex` for its whole duration.  Share one
/// store (e.g. behind an `Arc`) between all writers of a given file; two
/// stores on the same path in one process are not coordinated.
pub struct FileChainStore {
    path: PathBuf,
    log: Mutex<LogFile>,
    validator: Arc<dyn EventValidator>,
}

impl FileChainStore {
    /// Open (lazily) the log at `path`.
    ///
    /// Nothing is created until the first append.  `validator` re-checks
    /// each finalized event before it is written.
    pub fn new(path: impl Into<PathBuf>, validator: Arc<dyn EventValidator>) -> Self {
        Self {
            path: path.into(),
            log: Mutex::new(LogFile { handle: None }),
            validator,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `event_hash` of the last event, or `GENESIS_HASH` for an empty
    /// log.  Fails the same way `append` would on an untrusted tail.
    pub fn tip(&self) -> GuardianResult<String> {
        let mut log = self.log.lock().map_err(|e| GuardianError::Storage {
            reason: format!("audit log lock poisoned: {}", e),
        })?;
        log.tip(&self.path)
    }
}

impl ChainStore for FileChainStore {
    /// Chain `candidate` onto the current tip and append it.
    ///
    /// Computes the event hash over the candidate's canonical payload and
    /// the tip hash, attaches the integrity block, re-validates the result,
    /// and writes it as one line.  Nothing is written on any failure.
    fn append(&self, candidate: CandidateEvent) -> GuardianResult<FinalizedEvent> {
        let mut log = self.log.lock().map_err(|e| GuardianError::Storage {
            reason: format!("audit log lock poisoned: {}", e),
        })?;

        let previous_hash = log.tip(&self.path).inspect_err(|e| {
            error!(path = %self.path.display(), error = %e, "chain tail rejected");
        })?;

        let event_hash = event_digest(candidate.payload(), &previous_hash);
        let finalized = candidate.finalize(CryptographicIntegrity::sha256(previous_hash, event_hash));

        let report = self.validator.validate(finalized.record());
        if !report.passed {
            return Err(GuardianError::Validation {
                violations: report.violations,
            });
        }

        let line = finalized.to_json_line()?;
        log.append_line(&self.path, &line)?;

        debug!(
            event_id = %finalized.event_id(),
            previous_event_hash = %finalized.integrity().previous_event_hash,
            event_hash = %finalized.event_hash(),
            bytes = line.len() + 1,
            "event appended"
        );
        Ok(finalized)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
