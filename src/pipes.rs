//! FIFO lifecycle: creation, partial-failure rollback, teardown.
//!
//! Creation is strictly sequential and path-deterministic, so at any moment
//! the set is a fully-initialized prefix of the configured count. Teardown
//! is structural rather than staged: dropping the set closes each read end
//! and unlinks each path, last index first, on every exit path.

use std::fs::{self, File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

use nix::libc;
use nix::unistd::mkfifo;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::CollectorError;

/// One FIFO owned by this run: its path and its non-blocking read end.
///
/// The index is stable for the entry's lifetime; it is the tag registered
/// with the multiplexer and recovered from each readiness event.
#[derive(Debug)]
pub struct PipeEntry {
    pub index: usize,
    pub path: PathBuf,
    pub file: File,
}

impl Drop for PipeEntry {
    fn drop(&mut self) {
        // Best effort; the process already has a determined status.
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to unlink FIFO");
        }
    }
}

/// The ordered set of FIFOs created at startup.
#[derive(Debug, Default)]
pub struct PipeSet {
    entries: Vec<PipeEntry>,
}

impl PipeSet {
    /// Create `config.count` FIFOs in index order and open their read ends
    /// with `O_RDONLY | O_NONBLOCK`.
    ///
    /// The first failure stops creation and tears down the prefix created
    /// so far before the error is returned. A FIFO whose read end failed to
    /// open never became a full entry, so it is removed in the same failure
    /// path.
    pub fn create(config: &Config) -> Result<Self, CollectorError> {
        let mut set = PipeSet::default();
        for index in 0..config.count {
            let path = config.pipe_path(index);
            mkfifo(&path, config.mode).map_err(|errno| CollectorError::Creation {
                index,
                source: errno.into(),
            })?;
            let file = match OpenOptions::new()
                .read(true)
                .custom_flags(libc::O_NONBLOCK)
                .open(&path)
            {
                Ok(file) => file,
                Err(e) => {
                    let _ = fs::remove_file(&path);
                    return Err(CollectorError::Creation { index, source: e });
                }
            };
            debug!(index, path = %path.display(), "Created FIFO");
            set.entries.push(PipeEntry { index, path, file });
        }
        Ok(set)
    }

    /// Number of fully-initialized entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry for a multiplexer tag.
    pub fn get(&self, index: usize) -> Option<&PipeEntry> {
        self.entries.get(index)
    }

    /// Entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = &PipeEntry> {
        self.entries.iter()
    }
}

impl Drop for PipeSet {
    fn drop(&mut self) {
        // Reverse-order teardown of however much of the set exists.
        while self.entries.pop().is_some() {}
    }
}
