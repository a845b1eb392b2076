//! The steady-state event loop.
//!
//! Waits for readiness, reads whatever is available from each ready pipe,
//! and emits one tagged line per chunk. The loop owns no pipe resources:
//! the set is borrowed, and the caller's teardown runs on every exit path.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::CollectorError;
use crate::mux::Multiplexer;
use crate::pipes::PipeSet;

/// Most bytes read from one pipe per readiness event. Larger writes arrive
/// across multiple wake-ups; FIFOs are byte streams, not message-framed.
pub const MAX_CHUNK: usize = 256;

/// Drives the wait/read/emit cycle over a created pipe set.
pub struct Collector<'a> {
    pipes: &'a PipeSet,
    mux: Multiplexer,
    wait_timeout: Option<Duration>,
}

impl<'a> Collector<'a> {
    /// Open the multiplexer and register every pipe under its index.
    pub fn new(pipes: &'a PipeSet) -> Result<Self, CollectorError> {
        let mux = Multiplexer::open().map_err(CollectorError::MultiplexSetup)?;
        for entry in pipes.iter() {
            mux.register(&entry.file, entry.index)
                .map_err(CollectorError::MultiplexSetup)?;
        }
        Ok(Self {
            pipes,
            mux,
            wait_timeout: None,
        })
    }

    /// Bound each wait so the shutdown flag is observed without signal
    /// delivery. The binary leaves waits unbounded; signal interruption
    /// already forces the boundary check there.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    /// Run until `shutdown` is observed or the first fatal error.
    ///
    /// An interrupted wait is retried transparently; any other wait error
    /// is fatal. Remaining buffered data is not drained on shutdown.
    pub fn run<W: Write>(
        &mut self,
        shutdown: &AtomicBool,
        out: &mut W,
    ) -> Result<(), CollectorError> {
        while !shutdown.load(Ordering::Relaxed) {
            let ready = match self.mux.wait(self.wait_timeout) {
                Ok(tags) => tags,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    trace!("Wait interrupted, retrying");
                    continue;
                }
                Err(e) => return Err(CollectorError::MultiplexWait(e)),
            };
            for tag in ready {
                self.emit(tag, out)?;
            }
        }
        debug!("Shutdown requested, leaving the loop");
        Ok(())
    }

    /// Read one chunk from the pipe behind `tag` and emit it as
    /// `<path>: [<text>]`. A zero-byte read still emits a line.
    fn emit<W: Write>(&self, tag: usize, out: &mut W) -> Result<(), CollectorError> {
        // Tags come from our own registrations, one per entry.
        let Some(entry) = self.pipes.get(tag) else {
            return Ok(());
        };
        let mut buf = [0u8; MAX_CHUNK];
        let read = (&entry.file)
            .read(&mut buf)
            .map_err(|e| CollectorError::Read {
                index: tag,
                source: e,
            })?;
        let text = String::from_utf8_lossy(&buf[..read]);
        writeln!(out, "{}: [{}]", entry.path.display(), text).map_err(CollectorError::Emit)
    }
}

#[cfg(test)]
mod tests {
    use std::fs::OpenOptions;

    use nix::sys::stat::Mode;
    use tempfile::TempDir;

    use crate::config::Config;

    use super::*;

    fn config_in(dir: &TempDir, count: usize) -> Config {
        Config {
            format: dir.path().join("pipe%d").to_string_lossy().into_owned(),
            count,
            mode: Mode::from_bits_truncate(0o644),
        }
    }

    #[test]
    fn test_zero_byte_read_still_emits_a_line() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, 1);
        let pipes = PipeSet::create(&config).unwrap();
        let collector = Collector::new(&pipes).unwrap();

        // No writer has the FIFO open, so the read end is at EOF and the
        // read returns zero bytes.
        let mut out = Vec::new();
        collector.emit(0, &mut out).unwrap();

        let expected = format!("{}: []\n", config.pipe_path(0).display());
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_drained_pipe_emits_the_chunk_then_an_empty_line() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, 1);
        let pipes = PipeSet::create(&config).unwrap();
        let collector = Collector::new(&pipes).unwrap();
        let path = config.pipe_path(0);

        {
            let mut writer = OpenOptions::new().write(true).open(&path).unwrap();
            writer.write_all(b"last").unwrap();
        }

        let mut out = Vec::new();
        collector.emit(0, &mut out).unwrap();
        collector.emit(0, &mut out).unwrap();

        let expected = format!("{p}: [last]\n{p}: []\n", p = path.display());
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_unregistered_tag_is_skipped() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, 1);
        let pipes = PipeSet::create(&config).unwrap();
        let collector = Collector::new(&pipes).unwrap();

        let mut out = Vec::new();
        collector.emit(5, &mut out).unwrap();
        assert!(out.is_empty());
    }
}
