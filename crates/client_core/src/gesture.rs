//! Tap/click disambiguation for gallery tiles.
//!
//! A tap schedules an "open" after the double-tap window. A second tap on the
//! same tile inside the window cancels that open and becomes a like toggle
//! instead. One gesture stream (one mounted view) has at most one open
//! scheduled at any time.

use std::{collections::HashMap, sync::Arc, time::Duration};

use shared::domain::ImageId;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::signal::TransientSignal;

/// Runs when a single tap survives the double-tap window.
pub type OpenAction = Arc<dyn Fn(&ImageId) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// First tap of a possible pair; the open fires unless preempted.
    PendingOpen,
    /// Second tap inside the window. The caller toggles the like.
    DoubleTrigger,
}

pub struct GestureDisambiguator {
    window: Duration,
    last_taps: HashMap<ImageId, u64>,
    pending_open: Option<JoinHandle<()>>,
    burst: Arc<TransientSignal>,
    on_open: OpenAction,
}

impl GestureDisambiguator {
    pub fn new(window: Duration, burst: Arc<TransientSignal>, on_open: OpenAction) -> Self {
        Self {
            window,
            last_taps: HashMap::new(),
            pending_open: None,
            burst,
            on_open,
        }
    }

    /// Classifies a tap on `item_id` at `timestamp_ms`.
    ///
    /// On [`Gesture::DoubleTrigger`] the like burst is already raised and the
    /// tile's tap history is reset, so a third rapid tap starts a new pair.
    /// Must be called from within a tokio runtime.
    pub fn on_interaction(&mut self, item_id: &ImageId, timestamp_ms: u64) -> Gesture {
        self.cancel_pending();

        let window_ms = u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX);
        let is_double = self
            .last_taps
            .get(item_id)
            .is_some_and(|last| timestamp_ms.saturating_sub(*last) < window_ms);

        if is_double {
            self.last_taps.remove(item_id);
            self.burst.raise(item_id);
            debug!(item = %item_id, "gesture: double trigger");
            return Gesture::DoubleTrigger;
        }

        let on_open = Arc::clone(&self.on_open);
        let window = self.window;
        let target = item_id.clone();
        self.pending_open = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            on_open(&target);
        }));
        self.last_taps.insert(item_id.clone(), timestamp_ms);
        Gesture::PendingOpen
    }

    pub fn has_pending_open(&self) -> bool {
        self.pending_open
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    pub fn cancel_pending(&mut self) {
        if let Some(timer) = self.pending_open.take() {
            timer.abort();
        }
    }

    /// Forgets all tap history, e.g. when the listing is replaced.
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.last_taps.clear();
    }
}

impl Drop for GestureDisambiguator {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
#[path = "tests/gesture_tests.rs"]
mod tests;
