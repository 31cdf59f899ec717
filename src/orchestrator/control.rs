//! Cross-task run control: pause, resume, stop and manual confirmation.
//!
//! The presentation layer only ever flips these signals; it never touches
//! job or session state. The worker parks on the watch channel instead of
//! polling.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

/// Snapshot of the control signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    /// Next link start is gated until cleared.
    pub paused: bool,
    /// Run stops at the next link boundary.
    pub stop_requested: bool,
    /// Number of manual confirmations issued so far.
    pub confirmations: u64,
}

/// Clonable handle shared by the worker and the presentation layer.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    signals: Arc<watch::Sender<Signals>>,
}

impl Default for ControlHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlHandle {
    /// Creates a handle with all signals cleared.
    #[must_use]
    pub fn new() -> Self {
        let (signals, _) = watch::channel(Signals::default());
        Self {
            signals: Arc::new(signals),
        }
    }

    /// Gates the next link start.
    pub fn pause(&self) {
        debug!("pause requested");
        self.signals.send_modify(|s| s.paused = true);
    }

    /// Lifts a pause.
    pub fn resume(&self) {
        debug!("resume requested");
        self.signals.send_modify(|s| s.paused = false);
    }

    /// Requests a stop at the next link boundary. Also ends a pause or a
    /// pending manual-confirmation wait.
    pub fn stop(&self) {
        debug!("stop requested");
        self.signals.send_modify(|s| s.stop_requested = true);
    }

    /// Confirms that the current manual step is done.
    pub fn confirm_manual_step(&self) {
        debug!("manual step confirmed");
        self.signals
            .send_modify(|s| s.confirmations = s.confirmations.wrapping_add(1));
    }

    /// Current signal values.
    #[must_use]
    pub fn signals(&self) -> Signals {
        *self.signals.borrow()
    }

    /// True once a stop has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.signals().stop_requested
    }

    /// True while paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.signals().paused
    }

    /// Parks until the pause is lifted. Returns false when a stop arrives instead.
    pub(crate) async fn wait_while_paused(&self) -> bool {
        self.wait_until(|s| !s.paused).await
    }

    /// Parks until a confirmation newer than `seen` arrives. Returns false
    /// when a stop arrives instead. Confirmations issued before the wait
    /// began (count `<= seen`) do not satisfy it.
    pub(crate) async fn wait_for_confirmation(&self, seen: u64) -> bool {
        self.wait_until(|s| s.confirmations != seen).await
    }

    async fn wait_until(&self, ready: impl Fn(&Signals) -> bool) -> bool {
        let mut rx = self.signals.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let signals = match rx.wait_for(|s| s.stop_requested || ready(s)).await {
            Ok(signals) => *signals,
            Err(_) => return false,
        };
        !signals.stop_requested
    }
}
