//! One mounted gallery view: the tile grid, its lightbox, and the gesture and
//! like state that belong to it. Dropping the view cancels its timers.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use shared::domain::ImageId;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{
    api::GalleryApi,
    config::ClientSettings,
    error::ApiRequestError,
    gesture::{Gesture, GestureDisambiguator, OpenAction},
    likes::{GalleryItem, LikeError, LikeOutcome, LikeReconciler},
    session::SessionHandle,
    signal::{SignalKind, TransientSignal},
    GalleryEvent,
};

/// Lightbox selection over the current listing order.
#[derive(Debug, Default, Clone)]
pub struct Lightbox {
    order: Vec<ImageId>,
    selected: Option<usize>,
}

impl Lightbox {
    pub fn reset(&mut self, order: Vec<ImageId>) {
        self.order = order;
        self.selected = None;
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_id(&self) -> Option<&ImageId> {
        self.selected.and_then(|index| self.order.get(index))
    }

    pub fn open_at(&mut self, index: usize) -> Option<&ImageId> {
        if index >= self.order.len() {
            return None;
        }
        self.selected = Some(index);
        self.order.get(index)
    }

    pub fn open_item(&mut self, item_id: &ImageId) -> Option<usize> {
        let index = self.order.iter().position(|id| id == item_id)?;
        self.selected = Some(index);
        Some(index)
    }

    pub fn close(&mut self) -> bool {
        self.selected.take().is_some()
    }

    pub fn next(&mut self) -> Option<usize> {
        let current = self.selected?;
        let next = if current + 1 < self.order.len() {
            current + 1
        } else {
            0
        };
        self.selected = Some(next);
        Some(next)
    }

    pub fn previous(&mut self) -> Option<usize> {
        let current = self.selected?;
        let previous = if current > 0 {
            current - 1
        } else {
            self.order.len().saturating_sub(1)
        };
        self.selected = Some(previous);
        Some(previous)
    }

    /// `"3 / 12"` style position of the open image.
    pub fn counter(&self) -> Option<String> {
        self.selected
            .map(|index| format!("{} / {}", index + 1, self.order.len()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightboxKey {
    Escape,
    ArrowLeft,
    ArrowRight,
    Char(char),
}

#[derive(Debug)]
pub enum KeyOutcome {
    Ignored,
    Closed,
    Moved { index: usize },
    Like(Result<LikeOutcome, LikeError>),
}

#[derive(Debug)]
pub enum Interaction {
    PendingOpen,
    Liked(Result<LikeOutcome, LikeError>),
}

fn lock(lightbox: &StdMutex<Lightbox>) -> MutexGuard<'_, Lightbox> {
    lightbox.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct GalleryView {
    api: Arc<dyn GalleryApi>,
    likes: Arc<LikeReconciler>,
    gestures: Mutex<GestureDisambiguator>,
    lightbox: Arc<StdMutex<Lightbox>>,
    burst: Arc<TransientSignal>,
    events: broadcast::Sender<GalleryEvent>,
}

impl GalleryView {
    pub fn new(
        api: Arc<dyn GalleryApi>,
        session: Arc<SessionHandle>,
        settings: &ClientSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        let lightbox = Arc::new(StdMutex::new(Lightbox::default()));
        let burst = Arc::new(TransientSignal::new(
            SignalKind::LikeBurst,
            settings.burst_duration,
            events.clone(),
        ));

        let on_open: OpenAction = {
            let lightbox = Arc::clone(&lightbox);
            let events = events.clone();
            Arc::new(move |item_id: &ImageId| {
                let opened = lock(&lightbox).open_item(item_id);
                if let Some(index) = opened {
                    let _ = events.send(GalleryEvent::LightboxOpened {
                        index,
                        item_id: item_id.clone(),
                    });
                }
            })
        };

        let likes = LikeReconciler::new(
            Arc::clone(&api),
            session,
            settings.burst_duration,
            events.clone(),
        );

        Self {
            api,
            likes,
            gestures: Mutex::new(GestureDisambiguator::new(
                settings.double_tap_window,
                Arc::clone(&burst),
                on_open,
            )),
            lightbox,
            burst,
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<GalleryEvent> {
        self.events.subscribe()
    }

    pub fn likes(&self) -> &Arc<LikeReconciler> {
        &self.likes
    }

    /// Loads the featured (random) listing.
    pub async fn load_featured(&self) -> Result<usize, ApiRequestError> {
        let result = self.api.featured_images().await;
        self.install_listing(result).await
    }

    /// Loads every image published by `username`.
    pub async fn load_artist(&self, username: &str) -> Result<usize, ApiRequestError> {
        let result = self.api.artist_images(username).await;
        self.install_listing(result).await
    }

    async fn install_listing(
        &self,
        result: Result<Vec<shared::protocol::ImageSummary>, ApiRequestError>,
    ) -> Result<usize, ApiRequestError> {
        let images = match result {
            Ok(images) => images,
            Err(err) => {
                warn!("gallery: listing failed: {err}");
                let _ = self.events.send(GalleryEvent::Error(err.user_message()));
                return Err(err);
            }
        };

        let count = images.len();
        let order = images.iter().map(|image| image.id.clone()).collect();
        self.gestures.lock().await.reset();
        self.burst.clear();
        self.likes.replace_items(images).await;
        lock(&self.lightbox).reset(order);

        info!(count, "gallery: listing loaded");
        let _ = self.events.send(GalleryEvent::ItemsReplaced { count });
        Ok(count)
    }

    pub async fn items(&self) -> Vec<GalleryItem> {
        self.likes.items().await
    }

    /// A tap or click on a tile.
    pub async fn interact(&self, item_id: &ImageId, timestamp_ms: u64) -> Interaction {
        let gesture = self
            .gestures
            .lock()
            .await
            .on_interaction(item_id, timestamp_ms);
        match gesture {
            Gesture::PendingOpen => Interaction::PendingOpen,
            Gesture::DoubleTrigger => Interaction::Liked(self.likes.toggle_like(item_id).await),
        }
    }

    /// The heart button on a tile or in the lightbox; bypasses gestures.
    pub async fn toggle_like(&self, item_id: &ImageId) -> Result<LikeOutcome, LikeError> {
        self.likes.toggle_like(item_id).await
    }

    pub fn burst_active(&self, item_id: &ImageId) -> bool {
        self.burst.is_active(item_id)
    }

    pub fn lightbox(&self) -> Lightbox {
        lock(&self.lightbox).clone()
    }

    pub async fn open_at(&self, index: usize) -> bool {
        let opened = lock(&self.lightbox).open_at(index).cloned();
        match opened {
            Some(item_id) => {
                self.gestures.lock().await.cancel_pending();
                let _ = self
                    .events
                    .send(GalleryEvent::LightboxOpened { index, item_id });
                true
            }
            None => false,
        }
    }

    pub fn close(&self) -> bool {
        let closed = lock(&self.lightbox).close();
        if closed {
            let _ = self.events.send(GalleryEvent::LightboxClosed);
        }
        closed
    }

    pub fn next(&self) -> Option<usize> {
        let moved = {
            let mut lightbox = lock(&self.lightbox);
            lightbox
                .next()
                .and_then(|index| lightbox.selected_id().cloned().map(|id| (index, id)))
        };
        self.announce_move(moved)
    }

    pub fn previous(&self) -> Option<usize> {
        let moved = {
            let mut lightbox = lock(&self.lightbox);
            lightbox
                .previous()
                .and_then(|index| lightbox.selected_id().cloned().map(|id| (index, id)))
        };
        self.announce_move(moved)
    }

    fn announce_move(&self, moved: Option<(usize, ImageId)>) -> Option<usize> {
        let (index, item_id) = moved?;
        let _ = self
            .events
            .send(GalleryEvent::LightboxOpened { index, item_id });
        Some(index)
    }

    /// Keyboard shortcuts while the lightbox is open.
    pub async fn handle_key(&self, key: LightboxKey) -> KeyOutcome {
        if !lock(&self.lightbox).is_open() {
            return KeyOutcome::Ignored;
        }

        match key {
            LightboxKey::Escape => {
                self.close();
                KeyOutcome::Closed
            }
            LightboxKey::ArrowRight => self
                .next()
                .map_or(KeyOutcome::Ignored, |index| KeyOutcome::Moved { index }),
            LightboxKey::ArrowLeft => self
                .previous()
                .map_or(KeyOutcome::Ignored, |index| KeyOutcome::Moved { index }),
            LightboxKey::Char('l' | 'L') => {
                let selected = lock(&self.lightbox).selected_id().cloned();
                match selected {
                    Some(item_id) => KeyOutcome::Like(self.likes.toggle_like(&item_id).await),
                    None => KeyOutcome::Ignored,
                }
            }
            LightboxKey::Char(_) => KeyOutcome::Ignored,
        }
    }

    /// Double click on the lightbox image: toggles the like with a burst.
    pub async fn double_click_selected(&self) -> Option<Result<LikeOutcome, LikeError>> {
        let item_id = lock(&self.lightbox).selected_id().cloned()?;
        self.burst.raise(&item_id);
        Some(self.likes.toggle_like(&item_id).await)
    }
}

#[cfg(test)]
#[path = "tests/gallery_tests.rs"]
mod tests;
