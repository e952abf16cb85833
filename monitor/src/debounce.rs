//! Debounce utility for coalescing bursts of change signals.
//!
//! Editors often save a file in several steps (truncate, write, rename), and
//! each step produces its own filesystem notification. The [`ChangeDebouncer`]
//! waits until no signal has arrived for the configured interval and then
//! emits a single tick, so the document is read and diffed once per save.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tokio::sync::mpsc;
//! use checksync_monitor::debounce::ChangeDebouncer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (output_tx, mut output_rx) = mpsc::channel(8);
//!     let debouncer = ChangeDebouncer::new(Duration::from_millis(100), output_tx);
//!
//!     debouncer.signal();
//!     debouncer.signal();
//!     debouncer.signal();
//!
//!     // One tick after the burst settles.
//!     assert!(output_rx.recv().await.is_some());
//! }
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Capacity of the input channel. Signals carry no data, so a full channel
/// already guarantees a pending tick.
const INPUT_CAPACITY: usize = 64;

/// Coalesces change signals into one tick per quiet period.
#[derive(Debug)]
pub struct ChangeDebouncer {
    input_tx: mpsc::Sender<()>,
    #[allow(dead_code)]
    task_handle: JoinHandle<()>,
}

impl ChangeDebouncer {
    /// Creates a debouncer emitting on `output_tx` once `interval` has passed
    /// without a new signal.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(interval: Duration, output_tx: mpsc::Sender<()>) -> Self {
        let (input_tx, input_rx) = mpsc::channel(INPUT_CAPACITY);

        let task_handle = tokio::spawn(async move {
            run_debounce_loop(interval, input_rx, output_tx).await;
        });

        Self {
            input_tx,
            task_handle,
        }
    }

    /// Returns a sender usable from synchronous callbacks.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<()> {
        self.input_tx.clone()
    }

    /// Records a change signal without waiting.
    ///
    /// Returns `false` only if the background task has stopped.
    pub fn signal(&self) -> bool {
        match self.input_tx.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => true,
            Err(mpsc::error::TrySendError::Closed(())) => false,
        }
    }
}

/// Runs the debounce loop until the input side closes.
///
/// A pending tick is flushed when the input closes.
async fn run_debounce_loop(
    interval: Duration,
    mut input_rx: mpsc::Receiver<()>,
    output_tx: mpsc::Sender<()>,
) {
    let mut deadline: Option<Instant> = None;

    debug!(interval_ms = interval.as_millis(), "Starting debounce loop");

    loop {
        tokio::select! {
            signal = input_rx.recv() => {
                match signal {
                    Some(()) => {
                        trace!("Change signal received, resetting deadline");
                        deadline = Some(Instant::now() + interval);
                    }
                    None => {
                        if deadline.take().is_some() {
                            debug!("Input closed, flushing pending tick");
                            let _ = output_tx.send(()).await;
                        }
                        break;
                    }
                }
            }

            () = async {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            } => {
                deadline = None;
                trace!("Quiet period elapsed, emitting tick");
                if let Err(e) = output_tx.send(()).await {
                    warn!(error = %e, "Debounce output closed");
                    break;
                }
            }
        }
    }

    debug!("Debounce loop terminated");
}
