//! Artist pages: the public profile of any user, and the logged-in user's own
//! artwork with upload and delete.

use std::{collections::HashSet, sync::Arc, time::Duration};

use shared::{
    domain::ImageId,
    error::ErrorCode,
    protocol::{ImageSummary, UserProfile},
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    api::GalleryApi,
    error::ApiRequestError,
    session::{SessionError, SessionHandle},
    upload::{UploadDraft, UploadError},
};

/// Pause between a successful upload and re-listing, giving the backend time
/// to index the new image.
pub const REFRESH_AFTER_UPLOAD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct PublicProfile {
    pub profile: UserProfile,
    pub images: Vec<ImageSummary>,
}

impl PublicProfile {
    pub async fn load(api: &dyn GalleryApi, username: &str) -> Result<Self, ApiRequestError> {
        let (profile, images) =
            tokio::try_join!(api.user_profile(username), api.artist_images(username))?;
        Ok(Self { profile, images })
    }

    pub fn total_likes(&self) -> u64 {
        self.images.iter().map(|image| image.likes_count).sum()
    }
}

#[derive(Debug, Error)]
pub enum ManageError {
    #[error("Please login first")]
    NotLoggedIn,
    #[error(transparent)]
    Invalid(#[from] UploadError),
    #[error("Unauthorized: Please login again")]
    SessionExpired,
    #[error("You do not have permission to delete this image")]
    Forbidden,
    #[error("Image not found")]
    NotFound,
    #[error("image {0} is already being deleted")]
    AlreadyDeleting(ImageId),
    #[error("{}", .0.user_message())]
    Remote(ApiRequestError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// The logged-in user's own artwork.
pub struct MyArtwork {
    api: Arc<dyn GalleryApi>,
    session: Arc<SessionHandle>,
    images: Mutex<Vec<ImageSummary>>,
    deleting: Mutex<HashSet<ImageId>>,
}

impl MyArtwork {
    pub fn new(api: Arc<dyn GalleryApi>, session: Arc<SessionHandle>) -> Self {
        Self {
            api,
            session,
            images: Mutex::new(Vec::new()),
            deleting: Mutex::new(HashSet::new()),
        }
    }

    pub async fn images(&self) -> Vec<ImageSummary> {
        self.images.lock().await.clone()
    }

    pub async fn refresh(&self) -> Result<usize, ManageError> {
        let user = self
            .session
            .current_user()
            .await
            .ok_or(ManageError::NotLoggedIn)?;
        let images = self
            .api
            .artist_images(&user.username)
            .await
            .map_err(ManageError::Remote)?;
        let count = images.len();
        *self.images.lock().await = images;
        Ok(count)
    }

    pub async fn upload(&self, draft: UploadDraft) -> Result<(), ManageError> {
        let upload = draft.validate()?;
        let token = self.session.bearer().await.ok_or(ManageError::NotLoggedIn)?;
        let title = upload.title.clone();

        if let Err(err) = self.api.upload_image(&token, upload).await {
            warn!("profile: upload failed: {err}");
            if err.is_unauthorized() {
                return Err(self.expire_session().await);
            }
            return Err(ManageError::Remote(err));
        }

        info!(%title, "profile: image uploaded");
        tokio::time::sleep(REFRESH_AFTER_UPLOAD).await;
        // The image is stored; a failed re-list only leaves the view stale.
        if let Err(err) = self.refresh().await {
            warn!("profile: refresh after upload failed: {err}");
        }
        Ok(())
    }

    /// Deletes one of the user's images. Only one delete per image runs at a
    /// time.
    pub async fn delete(&self, image_id: &ImageId) -> Result<(), ManageError> {
        let token = self.session.bearer().await.ok_or(ManageError::NotLoggedIn)?;
        if !self.deleting.lock().await.insert(image_id.clone()) {
            return Err(ManageError::AlreadyDeleting(image_id.clone()));
        }

        let result = self.api.delete_image(&token, image_id).await;
        self.deleting.lock().await.remove(image_id);

        match result {
            Ok(()) => {
                self.images
                    .lock()
                    .await
                    .retain(|image| &image.id != image_id);
                info!(image = %image_id, "profile: image deleted");
                Ok(())
            }
            Err(err) => {
                warn!(image = %image_id, "profile: delete failed: {err}");
                Err(self.classify_delete_failure(err).await)
            }
        }
    }

    pub async fn is_deleting(&self, image_id: &ImageId) -> bool {
        self.deleting.lock().await.contains(image_id)
    }

    async fn expire_session(&self) -> ManageError {
        if let Err(logout_err) = self.session.logout().await {
            warn!("profile: failed to clear expired session: {logout_err}");
        }
        ManageError::SessionExpired
    }

    async fn classify_delete_failure(&self, err: ApiRequestError) -> ManageError {
        match err.code() {
            Some(ErrorCode::Unauthorized) => self.expire_session().await,
            Some(ErrorCode::Forbidden) => ManageError::Forbidden,
            Some(ErrorCode::NotFound) => ManageError::NotFound,
            _ => ManageError::Remote(err),
        }
    }
}

#[cfg(test)]
#[path = "tests/profile_tests.rs"]
mod tests;
