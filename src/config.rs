//! Resolved configuration for the collector.
//!
//! The CLI surface mirrors the classic getopt table: `--format/-f` for the
//! path template, `--count/-c` for the number of pipes, `--mode/-m` for the
//! FIFO permission bits in octal. Validation happens before any resource is
//! touched.

use std::path::PathBuf;

use clap::Parser;
use nix::sys::stat::Mode;

/// Default path template.
pub const DEFAULT_FORMAT: &str = "pipe%d";
/// Default number of pipes.
pub const DEFAULT_COUNT: i64 = 10;
/// Default FIFO permission mode (octal text).
pub const DEFAULT_MODE: &str = "644";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "PIPEMUX_LOG";

/// Errors in the resolved configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid count: {0}")]
    InvalidCount(i64),
}

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "pipemux", version, about = "Collect chunks from a set of named pipes")]
pub struct Cli {
    /// Path template; the first `%d` is replaced by the pipe index
    #[arg(short, long, default_value = DEFAULT_FORMAT)]
    pub format: String,

    /// Number of FIFOs to create
    #[arg(short, long, default_value_t = DEFAULT_COUNT, allow_negative_numbers = true)]
    pub count: i64,

    /// FIFO permission bits, in octal
    #[arg(short, long, default_value = DEFAULT_MODE, value_parser = parse_octal_mode)]
    pub mode: u32,
}

/// Resolved configuration consumed by the core.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path template with a single `%d` placeholder.
    pub format: String,
    /// Number of FIFOs, at least 1.
    pub count: usize,
    /// Permission bits applied to each FIFO, under an effective umask of 0.
    pub mode: Mode,
}

impl Config {
    /// Validate raw arguments into a resolved configuration.
    pub fn resolve(cli: Cli) -> Result<Self, ConfigError> {
        if cli.count < 1 {
            return Err(ConfigError::InvalidCount(cli.count));
        }
        Ok(Self {
            format: cli.format,
            count: cli.count as usize,
            mode: Mode::from_bits_truncate(cli.mode as nix::libc::mode_t),
        })
    }

    /// The FIFO path for a pipe index.
    pub fn pipe_path(&self, index: usize) -> PathBuf {
        format_path(&self.format, index)
    }
}

/// Parse permission bits from octal text.
pub fn parse_octal_mode(text: &str) -> Result<u32, String> {
    u32::from_str_radix(text, 8).map_err(|_| format!("invalid octal mode: {text}"))
}

/// Substitute the first `%d` in `template` with `index`.
///
/// A template without a placeholder comes back unchanged; the resulting
/// path collision surfaces naturally as a creation failure on the second
/// pipe.
pub fn format_path(template: &str, index: usize) -> PathBuf {
    match template.find("%d") {
        Some(pos) => PathBuf::from(format!(
            "{}{}{}",
            &template[..pos],
            index,
            &template[pos + 2..]
        )),
        None => PathBuf::from(template),
    }
}
