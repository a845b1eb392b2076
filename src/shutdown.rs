//! Signal-driven shutdown flag.
//!
//! The handler context does exactly one thing: set the flag. The event
//! loop observes it at iteration boundaries; nothing non-trivial runs
//! inside signal delivery.

use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;

/// Register a flag set by SIGINT/SIGTERM. Repeated deliveries are
/// idempotent; the flag is never cleared.
pub fn install() -> io::Result<Arc<AtomicBool>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    for sig in TERM_SIGNALS {
        flag::register(*sig, Arc::clone(&shutdown))?;
    }
    Ok(shutdown)
}
