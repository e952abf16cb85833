//! User notifications routed through the log.

use checksync_engine::Notifier;
use tracing::{info, warn};

/// Prefix the engine and sync adapter use for failure messages.
const FAILURE_PREFIX: &str = "❌";

/// [`Notifier`] that writes every message to the log.
///
/// Failure messages are logged at `warn`, everything else at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        if is_failure(message) {
            warn!(target: "checksync::notify", "{message}");
        } else {
            info!(target: "checksync::notify", "{message}");
        }
    }
}

fn is_failure(message: &str) -> bool {
    message.starts_with(FAILURE_PREFIX)
}
