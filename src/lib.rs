//! pipemux - many-to-one FIFO stream collector.
//!
//! Creates a set of named pipes from an index template, registers their
//! non-blocking read ends with an epoll-backed readiness multiplexer, and
//! prints each arriving chunk tagged by its source path until a
//! termination signal arrives. Whatever subset of pipes was created is
//! unlinked on every exit path, clean or not.

pub mod collector;
pub mod config;
pub mod error;
pub mod mux;
pub mod pipes;
pub mod shutdown;

pub use collector::Collector;
pub use config::{Config, ConfigError};
pub use error::CollectorError;
pub use mux::Multiplexer;
pub use pipes::{PipeEntry, PipeSet};
