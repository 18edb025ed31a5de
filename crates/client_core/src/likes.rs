//! Optimistic like toggling.
//!
//! A toggle flips the local like flag and count at once, then asks the server
//! to confirm. Failure restores the exact state seen before the toggle. Each
//! image has at most one confirmation in flight; toggles while it is pending
//! are dropped.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use shared::{domain::ImageId, protocol::ImageSummary};
use thiserror::Error;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    api::GalleryApi,
    error::ApiRequestError,
    session::SessionHandle,
    signal::{SignalKind, TransientSignal},
    GalleryEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Like,
    Unlike,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeIntent {
    pub image_id: ImageId,
    pub target: LikeTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    IdleUnliked,
    IdleLiked,
    PendingToLiked,
    PendingToUnliked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeSnapshot {
    pub likes_count: u64,
    pub liked_by_current_user: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryItem {
    pub image: ImageSummary,
    pub liked_by_current_user: bool,
}

impl GalleryItem {
    pub fn new(image: ImageSummary) -> Self {
        Self {
            image,
            liked_by_current_user: false,
        }
    }

    pub fn id(&self) -> &ImageId {
        &self.image.id
    }

    pub fn likes_count(&self) -> u64 {
        self.image.likes_count
    }

    pub fn snapshot(&self) -> LikeSnapshot {
        LikeSnapshot {
            likes_count: self.image.likes_count,
            liked_by_current_user: self.liked_by_current_user,
        }
    }

    fn apply(&mut self, target: LikeTarget) {
        match target {
            LikeTarget::Like => {
                self.liked_by_current_user = true;
                self.image.likes_count = self.image.likes_count.saturating_add(1);
            }
            LikeTarget::Unlike => {
                self.liked_by_current_user = false;
                self.image.likes_count = self.image.likes_count.saturating_sub(1);
            }
        }
    }

    fn restore(&mut self, snapshot: LikeSnapshot) {
        self.image.likes_count = snapshot.likes_count;
        self.liked_by_current_user = snapshot.liked_by_current_user;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    Liked { likes_count: u64 },
    Unliked { likes_count: u64 },
    /// A confirmation for this image is still outstanding; nothing changed.
    InFlight,
}

#[derive(Debug, Error)]
pub enum LikeError {
    #[error("login required to like images")]
    Unauthenticated,
    #[error("image {0} is not part of this gallery")]
    UnknownItem(ImageId),
    #[error("like confirmation for image {0} was interrupted")]
    Interrupted(ImageId),
    #[error("could not update like for image {image_id}: {source}")]
    RemoteFailure {
        image_id: ImageId,
        #[source]
        source: ApiRequestError,
    },
}

impl LikeError {
    pub fn user_message(&self) -> String {
        match self {
            LikeError::Unauthenticated => "Please login to like artwork".to_string(),
            LikeError::UnknownItem(_) => "That image is no longer available".to_string(),
            LikeError::Interrupted(_) => "Could not update like, please try again".to_string(),
            LikeError::RemoteFailure { source, .. } => {
                format!("Could not update like: {}", source.user_message())
            }
        }
    }
}

struct PendingLike {
    previous: LikeSnapshot,
    target: LikeTarget,
    generation: u64,
}

#[derive(Default)]
struct ReconcilerState {
    items: Vec<GalleryItem>,
    pending: HashMap<ImageId, PendingLike>,
    /// Bumped whenever the listing is replaced; resolutions from an older
    /// listing leave the new items alone.
    generation: u64,
}

impl ReconcilerState {
    fn item_mut(&mut self, image_id: &ImageId) -> Option<&mut GalleryItem> {
        self.items.iter_mut().find(|item| item.id() == image_id)
    }
}

pub struct LikeReconciler {
    api: Arc<dyn GalleryApi>,
    session: Arc<SessionHandle>,
    state: Mutex<ReconcilerState>,
    pulse: TransientSignal,
    events: broadcast::Sender<GalleryEvent>,
}

impl LikeReconciler {
    pub fn new(
        api: Arc<dyn GalleryApi>,
        session: Arc<SessionHandle>,
        pulse_duration: Duration,
        events: broadcast::Sender<GalleryEvent>,
    ) -> Arc<Self> {
        Arc::new(Self {
            api,
            session,
            state: Mutex::new(ReconcilerState::default()),
            pulse: TransientSignal::new(SignalKind::LikePulse, pulse_duration, events.clone()),
            events,
        })
    }

    /// Replaces the listing. Local like flags survive for images that are
    /// still listed; pending confirmations stay pending.
    pub async fn replace_items(&self, images: Vec<ImageSummary>) {
        let mut guard = self.state.lock().await;
        let liked: HashSet<ImageId> = guard
            .items
            .iter()
            .filter(|item| item.liked_by_current_user)
            .map(|item| item.id().clone())
            .collect();

        guard.items = images
            .into_iter()
            .map(|image| {
                let liked_by_current_user = liked.contains(&image.id);
                GalleryItem {
                    image,
                    liked_by_current_user,
                }
            })
            .collect();
        guard.generation += 1;
        drop(guard);

        self.pulse.clear();
    }

    pub async fn items(&self) -> Vec<GalleryItem> {
        self.state.lock().await.items.clone()
    }

    pub async fn item(&self, image_id: &ImageId) -> Option<GalleryItem> {
        self.state
            .lock()
            .await
            .items
            .iter()
            .find(|item| item.id() == image_id)
            .cloned()
    }

    pub async fn like_state(&self, image_id: &ImageId) -> Option<LikeState> {
        let guard = self.state.lock().await;
        if let Some(pending) = guard.pending.get(image_id) {
            return Some(match pending.target {
                LikeTarget::Like => LikeState::PendingToLiked,
                LikeTarget::Unlike => LikeState::PendingToUnliked,
            });
        }
        guard
            .items
            .iter()
            .find(|item| item.id() == image_id)
            .map(|item| {
                if item.liked_by_current_user {
                    LikeState::IdleLiked
                } else {
                    LikeState::IdleUnliked
                }
            })
    }

    pub async fn is_pending(&self, image_id: &ImageId) -> bool {
        self.state.lock().await.pending.contains_key(image_id)
    }

    pub fn pulse_active(&self, image_id: &ImageId) -> bool {
        self.pulse.is_active(image_id)
    }

    /// Flips the like on `image_id` optimistically and confirms it with the
    /// server.
    ///
    /// The confirmation runs on a task of its own, so a caller that stops
    /// waiting still leaves the item confirmed or rolled back.
    pub async fn toggle_like(
        self: &Arc<Self>,
        image_id: &ImageId,
    ) -> Result<LikeOutcome, LikeError> {
        let Some(token) = self.session.bearer().await else {
            let _ = self.events.send(GalleryEvent::LoginRequired);
            return Err(LikeError::Unauthenticated);
        };

        let (intent, optimistic) = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            if state.pending.contains_key(image_id) {
                debug!(image = %image_id, "likes: toggle dropped, confirmation in flight");
                return Ok(LikeOutcome::InFlight);
            }

            let generation = state.generation;
            let item = state
                .item_mut(image_id)
                .ok_or_else(|| LikeError::UnknownItem(image_id.clone()))?;
            let previous = item.snapshot();
            let target = if previous.liked_by_current_user {
                LikeTarget::Unlike
            } else {
                LikeTarget::Like
            };
            item.apply(target);
            let optimistic = item.snapshot();

            state.pending.insert(
                image_id.clone(),
                PendingLike {
                    previous,
                    target,
                    generation,
                },
            );
            (
                LikeIntent {
                    image_id: image_id.clone(),
                    target,
                },
                optimistic,
            )
        };

        let confirmation: JoinHandle<Result<LikeOutcome, LikeError>> = tokio::spawn({
            let reconciler = Arc::clone(self);
            let intent = intent.clone();
            async move { reconciler.confirm(token, intent, optimistic).await }
        });

        match confirmation.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                warn!(image = %intent.image_id, "likes: confirmation task failed: {join_err}");
                self.roll_back(&intent.image_id).await;
                Err(LikeError::Interrupted(intent.image_id))
            }
        }
    }

    async fn confirm(
        &self,
        token: String,
        intent: LikeIntent,
        optimistic: LikeSnapshot,
    ) -> Result<LikeOutcome, LikeError> {
        let result = match intent.target {
            LikeTarget::Like => self.api.like_image(&token, &intent.image_id).await,
            LikeTarget::Unlike => self.api.unlike_image(&token, &intent.image_id).await,
        };

        match result {
            Ok(()) => {
                self.state.lock().await.pending.remove(&intent.image_id);
                if intent.target == LikeTarget::Like {
                    self.pulse.raise(&intent.image_id);
                }
                info!(
                    image = %intent.image_id,
                    liked = optimistic.liked_by_current_user,
                    likes = optimistic.likes_count,
                    "likes: confirmed"
                );
                let _ = self.events.send(GalleryEvent::LikeReconciled {
                    item_id: intent.image_id.clone(),
                    liked: optimistic.liked_by_current_user,
                    likes_count: optimistic.likes_count,
                });
                Ok(match intent.target {
                    LikeTarget::Like => LikeOutcome::Liked {
                        likes_count: optimistic.likes_count,
                    },
                    LikeTarget::Unlike => LikeOutcome::Unliked {
                        likes_count: optimistic.likes_count,
                    },
                })
            }
            Err(source) => {
                self.roll_back(&intent.image_id).await;
                let err = LikeError::RemoteFailure {
                    image_id: intent.image_id.clone(),
                    source,
                };
                warn!("likes: reverted optimistic toggle: {err}");
                let _ = self.events.send(GalleryEvent::LikeReverted {
                    item_id: intent.image_id,
                    message: err.user_message(),
                });
                Err(err)
            }
        }
    }

    /// Clears the pending entry and restores the pre-toggle state. A no-op
    /// when the entry is already gone.
    async fn roll_back(&self, image_id: &ImageId) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let Some(pending) = state.pending.remove(image_id) else {
            return;
        };
        let current_listing = pending.generation == state.generation;
        if let Some(item) = state.item_mut(image_id) {
            if current_listing {
                item.restore(pending.previous);
            } else {
                // The refreshed count came from the server; only the
                // carried-over flag is ours to undo.
                item.liked_by_current_user = pending.previous.liked_by_current_user;
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/likes_tests.rs"]
mod tests;
