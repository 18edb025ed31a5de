use shared::domain::ImageId;

pub mod api;
pub mod config;
pub mod error;
pub mod gallery;
pub mod gesture;
pub mod likes;
pub mod menu;
pub mod profile;
pub mod session;
pub mod signal;
pub mod upload;

pub use api::{GalleryApi, HttpGalleryApi};
pub use config::{load_settings, ClientSettings};
pub use gallery::{GalleryView, Interaction, KeyOutcome, Lightbox, LightboxKey};
pub use likes::{GalleryItem, LikeError, LikeOutcome, LikeReconciler, LikeState};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionHandle, SessionStore};
pub use signal::SignalKind;

/// Everything a gallery view tells its UI about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryEvent {
    ItemsReplaced {
        count: usize,
    },
    LightboxOpened {
        index: usize,
        item_id: ImageId,
    },
    LightboxClosed,
    SignalStarted {
        kind: SignalKind,
        item_id: ImageId,
    },
    SignalEnded {
        kind: SignalKind,
        item_id: ImageId,
    },
    LikeReconciled {
        item_id: ImageId,
        liked: bool,
        likes_count: u64,
    },
    LikeReverted {
        item_id: ImageId,
        message: String,
    },
    /// A like was attempted without a session; route to the login page.
    LoginRequired,
    Error(String),
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
