//! Short-lived per-image visual signals (like bursts, like pulses) that clear
//! themselves after a fixed window.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use shared::domain::ImageId;
use tokio::{sync::broadcast, task::JoinHandle};

use crate::GalleryEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// Heart shown when a double tap toggles a like.
    LikeBurst,
    /// Pulse shown once a like has been confirmed by the server.
    LikePulse,
}

struct ActiveSignal {
    generation: u64,
    timer: JoinHandle<()>,
}

type ActiveMap = Arc<Mutex<HashMap<ImageId, ActiveSignal>>>;

fn lock(active: &ActiveMap) -> MutexGuard<'_, HashMap<ImageId, ActiveSignal>> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct TransientSignal {
    kind: SignalKind,
    duration: Duration,
    events: broadcast::Sender<GalleryEvent>,
    active: ActiveMap,
    next_generation: AtomicU64,
}

impl TransientSignal {
    pub fn new(
        kind: SignalKind,
        duration: Duration,
        events: broadcast::Sender<GalleryEvent>,
    ) -> Self {
        Self {
            kind,
            duration,
            events,
            active: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Shows the signal for `item_id`, restarting its window if it is
    /// already showing. Must be called from within a tokio runtime.
    pub fn raise(&self, item_id: &ImageId) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let kind = self.kind;
        let duration = self.duration;

        // Held across the spawn so the timer cannot observe the map before
        // its own entry is in place.
        let mut guard = lock(&self.active);
        let timer = {
            let active = Arc::clone(&self.active);
            let events = self.events.clone();
            let item_id = item_id.clone();
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                let ended = {
                    let mut guard = lock(&active);
                    let is_current = guard
                        .get(&item_id)
                        .is_some_and(|current| current.generation == generation);
                    if is_current {
                        guard.remove(&item_id);
                    }
                    is_current
                };
                if ended {
                    let _ = events.send(GalleryEvent::SignalEnded { kind, item_id });
                }
            })
        };

        if let Some(previous) = guard.insert(item_id.clone(), ActiveSignal { generation, timer }) {
            previous.timer.abort();
        }
        drop(guard);

        let _ = self.events.send(GalleryEvent::SignalStarted {
            kind,
            item_id: item_id.clone(),
        });
    }

    pub fn is_active(&self, item_id: &ImageId) -> bool {
        lock(&self.active).contains_key(item_id)
    }

    pub fn active_items(&self) -> Vec<ImageId> {
        let mut items: Vec<_> = lock(&self.active).keys().cloned().collect();
        items.sort();
        items
    }

    /// Drops every showing signal without emitting end events.
    pub fn clear(&self) {
        for (_, signal) in lock(&self.active).drain() {
            signal.timer.abort();
        }
    }
}

impl Drop for TransientSignal {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn clears_itself_after_the_window() {
        let (events, mut rx) = broadcast::channel(16);
        let signal = TransientSignal::new(SignalKind::LikePulse, Duration::from_millis(1000), events);
        let id = ImageId::new("a");

        signal.raise(&id);
        assert!(signal.is_active(&id));
        assert!(matches!(
            rx.recv().await,
            Ok(GalleryEvent::SignalStarted { kind: SignalKind::LikePulse, .. })
        ));

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert!(signal.is_active(&id));

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!signal.is_active(&id));
        assert!(matches!(
            rx.recv().await,
            Ok(GalleryEvent::SignalEnded { kind: SignalKind::LikePulse, item_id }) if item_id == id
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn raising_again_restarts_the_window() {
        let (events, _rx) = broadcast::channel(16);
        let signal = TransientSignal::new(SignalKind::LikeBurst, Duration::from_millis(1000), events);
        let id = ImageId::new("a");

        signal.raise(&id);
        tokio::time::sleep(Duration::from_millis(600)).await;
        signal.raise(&id);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(signal.is_active(&id));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!signal.is_active(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn signals_are_keyed_per_item() {
        let (events, _rx) = broadcast::channel(16);
        let signal = TransientSignal::new(SignalKind::LikeBurst, Duration::from_millis(1000), events);

        signal.raise(&ImageId::new("b"));
        signal.raise(&ImageId::new("a"));
        assert_eq!(
            signal.active_items(),
            vec![ImageId::new("a"), ImageId::new("b")]
        );

        signal.clear();
        assert!(signal.active_items().is_empty());
    }
}
