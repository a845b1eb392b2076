//! pipemux binary: resolve arguments, create the pipe set, run the
//! collector, map the outcome to a process exit code.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;

use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use nix::sys::stat::{umask, Mode};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pipemux::config::{Cli, Config, LOG_ENV_VAR};
use pipemux::{shutdown, Collector, CollectorError, PipeSet};

/// Initialize tracing with the PIPEMUX_LOG environment variable.
///
/// Defaults to "info". Diagnostics go to stderr; stdout carries only the
/// collected data stream.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e)
            if matches!(
                e.kind(),
                ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion
            ) =>
        {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(1);
        }
    };
    let config = match Config::resolve(cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(1);
        }
    };

    let shutdown = match shutdown::install() {
        Ok(flag) => flag,
        Err(e) => {
            error!(error = %e, "Failed to install signal handlers");
            return ExitCode::from(3);
        }
    };

    // The configured FIFO mode must apply exactly.
    umask(Mode::empty());

    match run(&config, &shutdown) {
        Ok(()) => {
            info!("Shut down cleanly");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Create the pipes, collect until shutdown or the first fatal error.
/// Dropping the set at the end of this scope is the teardown for every
/// exit path.
fn run(config: &Config, shutdown: &AtomicBool) -> Result<(), CollectorError> {
    let pipes = PipeSet::create(config)?;
    info!(count = pipes.len(), format = %config.format, "Created FIFOs");

    let mut collector = Collector::new(&pipes)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = collector.run(shutdown, &mut out);
    let _ = out.flush();
    result
}
