// Unix signal handling for graceful cancellation
// A monitoring session stops cleanly on SIGTERM or SIGINT

use anyhow::Result;
use futures::StreamExt;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Fans a stop signal out to every subscribed polling loop
///
/// The poller never observes the signal mid-query; it checks its
/// receiver at the top of each tick and during the end-of-tick sleep.
pub struct ShutdownCoordinator {
    tx: broadcast::Sender<()>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Subscribe a polling loop to cancellation notifications
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Request cancellation of every subscribed loop
    pub fn trigger(&self) {
        let _ = self.tx.send(());
        info!("Cancellation broadcast to all monitoring sessions");
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a future that resolves when SIGTERM or SIGINT arrives
pub fn create_shutdown_listener() -> Result<impl std::future::Future<Output = ()>> {
    let signals = Signals::new([SIGTERM, SIGINT])?;

    Ok(async move {
        let mut signals = signals;

        while let Some(signal) = signals.next().await {
            match signal {
                SIGTERM => {
                    info!("Received SIGTERM - stopping monitoring");
                    break;
                }
                SIGINT => {
                    info!("Received SIGINT (Ctrl+C) - stopping monitoring");
                    break;
                }
                _ => {
                    debug!("Received unexpected signal: {}", signal);
                }
            }
        }
    })
}
