//! In-memory `GalleryApi` used by the unit tests.

use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use shared::{
    domain::{Category, ImageId, UserId},
    error::{ApiError, ErrorCode},
    protocol::{AuthResponse, ImageSummary, LoginRequest, SignupRequest, UserProfile, UserSummary},
};
use tokio::sync::{oneshot, watch, Mutex};

use crate::{
    api::{ApiResult, GalleryApi},
    error::ApiRequestError,
    session::{MemorySessionStore, Session, SessionHandle},
    upload::ValidatedUpload,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Like(ImageId),
    Unlike(ImageId),
    Upload(String),
    Delete(ImageId),
}

pub(crate) fn image(id: &str, likes_count: u64) -> ImageSummary {
    ImageSummary {
        id: ImageId::new(id),
        title: format!("title {id}"),
        description: None,
        image_url: format!("https://cdn.example/{id}.png"),
        artist_username: "mira".to_string(),
        likes_count,
        tags: Vec::new(),
        category: Category::Other,
        created_at: None,
    }
}

pub(crate) fn status_error(operation: &'static str, status: u16, message: &str) -> ApiRequestError {
    ApiRequestError::Status {
        operation,
        status,
        error: ApiError::new(ErrorCode::from_status(status), message),
    }
}

pub(crate) struct FakeApi {
    pub listing: Mutex<Vec<ImageSummary>>,
    pub profile: Mutex<Option<UserProfile>>,
    calls: Mutex<Vec<Call>>,
    call_count: watch::Sender<usize>,
    /// Each like/unlike/delete call takes the next gate, if any, and waits
    /// for it: `Ok` resolves the call successfully, `Err(status)` fails it.
    gates: Mutex<VecDeque<oneshot::Receiver<Result<(), u16>>>>,
    /// Failure status applied to ungated like/unlike/delete/upload calls.
    pub fail_status: Mutex<Option<u16>>,
    /// Failure status applied to the image listings.
    pub listing_fail_status: Mutex<Option<u16>>,
}

impl FakeApi {
    pub(crate) fn new(listing: Vec<ImageSummary>) -> Arc<Self> {
        let (call_count, _) = watch::channel(0);
        Arc::new(Self {
            listing: Mutex::new(listing),
            profile: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            call_count,
            gates: Mutex::new(VecDeque::new()),
            fail_status: Mutex::new(None),
            listing_fail_status: Mutex::new(None),
        })
    }

    /// Holds the next mutating call until the returned sender resolves it.
    pub(crate) async fn gate_next_call(&self) -> oneshot::Sender<Result<(), u16>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().await.push_back(rx);
        tx
    }

    pub(crate) async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub(crate) async fn wait_for_calls(&self, count: usize) {
        let mut rx = self.call_count.subscribe();
        rx.wait_for(|seen| *seen >= count)
            .await
            .expect("fake api dropped");
    }

    async fn check_listing(&self, operation: &'static str) -> ApiResult<()> {
        match *self.listing_fail_status.lock().await {
            Some(status) => Err(status_error(operation, status, "listing unavailable")),
            None => Ok(()),
        }
    }

    async fn record(&self, operation: &'static str, call: Call) -> ApiResult<()> {
        self.calls.lock().await.push(call);
        self.call_count.send_modify(|count| *count += 1);

        let gate = self.gates.lock().await.pop_front();
        let outcome = match gate {
            Some(gate) => gate.await.unwrap_or(Err(500)),
            None => match *self.fail_status.lock().await {
                Some(status) => Err(status),
                None => Ok(()),
            },
        };
        outcome.map_err(|status| status_error(operation, status, "server rejected request"))
    }
}

#[async_trait]
impl GalleryApi for FakeApi {
    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        if request.password != "hunter2" {
            return Err(status_error("login", 401, "Invalid credentials"));
        }
        Ok(AuthResponse {
            token: "token-mira".to_string(),
            user: UserSummary {
                id: UserId::new("u1"),
                username: "mira".to_string(),
                email: Some(request.email.clone()),
            },
        })
    }

    async fn signup(&self, request: &SignupRequest) -> ApiResult<AuthResponse> {
        Ok(AuthResponse {
            token: format!("token-{}", request.username),
            user: UserSummary {
                id: UserId::new("u2"),
                username: request.username.clone(),
                email: Some(request.email.clone()),
            },
        })
    }

    async fn featured_images(&self) -> ApiResult<Vec<ImageSummary>> {
        self.check_listing("fetch featured images").await?;
        Ok(self.listing.lock().await.clone())
    }

    async fn artist_images(&self, username: &str) -> ApiResult<Vec<ImageSummary>> {
        self.check_listing("fetch artist images").await?;
        Ok(self
            .listing
            .lock()
            .await
            .iter()
            .filter(|image| image.artist_username == username)
            .cloned()
            .collect())
    }

    async fn user_profile(&self, username: &str) -> ApiResult<UserProfile> {
        self.profile
            .lock()
            .await
            .clone()
            .filter(|profile| profile.username == username)
            .ok_or_else(|| status_error("fetch user profile", 404, "User not found"))
    }

    async fn like_image(&self, _token: &str, image_id: &ImageId) -> ApiResult<()> {
        self.record("like image", Call::Like(image_id.clone())).await
    }

    async fn unlike_image(&self, _token: &str, image_id: &ImageId) -> ApiResult<()> {
        self.record("unlike image", Call::Unlike(image_id.clone()))
            .await
    }

    async fn upload_image(&self, _token: &str, upload: ValidatedUpload) -> ApiResult<()> {
        self.record("upload image", Call::Upload(upload.title.clone()))
            .await?;
        let mut uploaded = image(&format!("new-{}", upload.title), 0);
        uploaded.title = upload.title;
        self.listing.lock().await.push(uploaded);
        Ok(())
    }

    async fn delete_image(&self, _token: &str, image_id: &ImageId) -> ApiResult<()> {
        self.record("delete image", Call::Delete(image_id.clone()))
            .await?;
        self.listing.lock().await.retain(|image| &image.id != image_id);
        Ok(())
    }
}

pub(crate) fn session() -> Session {
    Session {
        token: "token-mira".to_string(),
        user: UserSummary {
            id: UserId::new("u1"),
            username: "mira".to_string(),
            email: None,
        },
    }
}

pub(crate) async fn logged_in(api: Arc<FakeApi>) -> Arc<SessionHandle> {
    let handle = SessionHandle::new(api, Arc::new(MemorySessionStore::default()));
    handle.adopt(session()).await.expect("adopt session");
    handle
}

pub(crate) fn logged_out(api: Arc<FakeApi>) -> Arc<SessionHandle> {
    SessionHandle::new(api, Arc::new(MemorySessionStore::default()))
}
