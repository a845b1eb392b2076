//! Readiness multiplexing over the pipes' read ends.
//!
//! Thin wrapper around epoll. Each handle is registered level-triggered for
//! read interest under a tag equal to its pipe index; `wait` reports the
//! tags that woke it. An interrupted wait surfaces as
//! `ErrorKind::Interrupted` and nothing else is retried here; classifying
//! and retrying is the event loop's job.

use std::io;
use std::os::fd::AsFd;
use std::time::Duration;

use nix::sys::epoll::{Epoll, EpollCreateFlags, EpollEvent, EpollFlags, EpollTimeout};

/// Upper bound on readiness events consumed per wait. More simultaneously
/// ready pipes simply take additional wait cycles.
const EVENT_BATCH: usize = 16;

/// Wraps the OS readiness facility for the lifetime of the run.
pub struct Multiplexer {
    epoll: Epoll,
    events: [EpollEvent; EVENT_BATCH],
}

impl Multiplexer {
    /// Acquire the readiness context.
    pub fn open() -> io::Result<Self> {
        let epoll = Epoll::new(EpollCreateFlags::empty())?;
        Ok(Self {
            epoll,
            events: [EpollEvent::empty(); EVENT_BATCH],
        })
    }

    /// Register a handle for read readiness under `tag`.
    pub fn register<F: AsFd>(&self, handle: F, tag: usize) -> io::Result<()> {
        self.epoll
            .add(handle, EpollEvent::new(EpollFlags::EPOLLIN, tag as u64))?;
        Ok(())
    }

    /// Block until at least one registered handle is readable, or the
    /// timeout elapses. Returns the ready tags; an empty result means the
    /// wait timed out or only non-read events fired.
    pub fn wait(&mut self, timeout: Option<Duration>) -> io::Result<Vec<usize>> {
        let timeout = match timeout {
            Some(duration) => {
                let millis = u16::try_from(duration.as_millis()).unwrap_or(u16::MAX);
                EpollTimeout::from(millis)
            }
            None => EpollTimeout::NONE,
        };
        let ready = self.epoll.wait(&mut self.events, timeout)?;
        Ok(self.events[..ready]
            .iter()
            .filter(|event| event.events().contains(EpollFlags::EPOLLIN))
            .map(|event| event.data() as usize)
            .collect())
    }
}
