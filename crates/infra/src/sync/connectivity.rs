//! Network reachability tracking
//!
//! A platform collaborator reports raw path updates via [`ConnectivityMonitor::report`].
//! The monitor keeps the previous value and notifies subscribers exactly
//! once per disconnected-to-connected transition; repeated "still connected"
//! updates and disconnects emit nothing.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// Edge-triggered connectivity monitor.
///
/// Starts offline; the first `report(true)` counts as a restoration edge.
pub struct ConnectivityMonitor {
    online: AtomicBool,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<()>>>,
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityMonitor {
    pub fn new() -> Self {
        Self { online: AtomicBool::new(false), subscribers: Mutex::new(Vec::new()) }
    }

    /// Current reachability.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Subscribe to "connectivity restored" events.
    ///
    /// Each receiver gets one `()` per false-to-true edge observed after
    /// subscription. Dropped receivers are pruned on the next edge.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Feed one raw path update from the platform.
    pub fn report(&self, connected: bool) {
        let was_online = self.online.swap(connected, Ordering::SeqCst);

        if connected && !was_online {
            debug!("connectivity restored");
            self.subscribers.lock().retain(|tx| tx.send(()).is_ok());
        } else if !connected && was_online {
            debug!("connectivity lost");
        }
    }
}
