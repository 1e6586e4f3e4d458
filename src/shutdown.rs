//! Ctrl+C handling for the serve loop.

use std::sync::atomic::{AtomicBool, Ordering};

/// Global flag set by the Ctrl+C handler.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Check if Ctrl+C has been received.
pub fn requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}

/// Request a shutdown without a signal (used by tests and embedding code).
pub fn request() {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Set up the Ctrl+C handler.
///
/// This should be called once at program startup.
pub fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        request();
        log::info!("Received Ctrl+C, shutting down...");
    })
}
