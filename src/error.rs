//! Runtime error taxonomy and the process exit codes it maps to.

use std::io;

/// Errors that end the collector. Each carries the underlying I/O cause
/// and maps to a distinct process exit status.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("failed to create pipe {index}: {source}")]
    Creation { index: usize, source: io::Error },

    #[error("failed to set up readiness multiplexer: {0}")]
    MultiplexSetup(io::Error),

    #[error("readiness wait failed: {0}")]
    MultiplexWait(io::Error),

    #[error("failed to read pipe {index}: {source}")]
    Read { index: usize, source: io::Error },

    #[error("failed to write output: {0}")]
    Emit(io::Error),
}

impl CollectorError {
    /// Process exit status for this failure. Invalid configuration is 1
    /// and clean shutdown 0; both are handled before the collector runs.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Creation { .. } => 2,
            Self::MultiplexSetup(_) | Self::MultiplexWait(_) => 3,
            Self::Read { .. } | Self::Emit(_) => 4,
        }
    }
}
