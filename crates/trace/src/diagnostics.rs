//! Tracer diagnostics for production debugging
//!
//! Installs a SIGQUIT (kill -3) handler that dumps tracer counters to stderr
//! without stopping the process, so a wedged or chatty traced engine can be
//! inspected in place.
//!
//! Signal handlers can only call async-signal-safe functions, and
//! `dump_diagnostics()` does locking I/O. A dedicated thread waiting on
//! signal-hook's iterator API keeps the I/O out of signal context.

use crate::emitter::{TOTAL_RECORDS, TOTAL_WRITE_FAILURES, tracer};
use std::sync::Once;
use std::sync::atomic::Ordering;

static SIGNAL_HANDLER_INIT: Once = Once::new();

/// Install the SIGQUIT signal handler for diagnostics.
///
/// Safe to call multiple times (idempotent). No-op on non-Unix platforms;
/// `dump_diagnostics()` can still be called directly there.
pub fn install_signal_handler() {
    SIGNAL_HANDLER_INIT.call_once(|| {
        #[cfg(unix)]
        {
            use signal_hook::consts::SIGQUIT;
            use signal_hook::iterator::Signals;

            let mut signals = match Signals::new([SIGQUIT]) {
                Ok(s) => s,
                Err(_) => return, // Silently fail if we can't register
            };

            std::thread::Builder::new()
                .name("optrace-diagnostics".to_string())
                .spawn(move || {
                    for sig in signals.forever() {
                        if sig == SIGQUIT {
                            dump_diagnostics();
                        }
                    }
                })
                .ok(); // Silently fail if thread spawn fails
        }
    });
}

/// Dump tracer counters to stderr.
///
/// Output goes to stderr so it never mixes with trace lines on stdout.
pub fn dump_diagnostics() {
    use std::io::Write;

    let mut out = std::io::stderr().lock();

    let _ = writeln!(out, "\n=== optrace Diagnostics ===");
    let _ = writeln!(out, "Timestamp: {:?}", std::time::SystemTime::now());

    let records = TOTAL_RECORDS.load(Ordering::Relaxed);
    let failures = TOTAL_WRITE_FAILURES.load(Ordering::Relaxed);

    let _ = writeln!(out, "\n[Records]");
    let _ = writeln!(out, "  Emitted:        {} (all tracers)", records);
    let _ = writeln!(out, "  Write failures: {}", failures);
    let _ = writeln!(out, "  Global tick:    {}", tracer().current_tick());

    if failures > 0 {
        let _ = writeln!(
            out,
            "  WARNING: {} records were ticked but never written (gaps in output)",
            failures
        );
    }

    let _ = writeln!(out, "\n=== End Diagnostics ===\n");
}
