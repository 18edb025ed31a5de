use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::ImageId,
    error::ApiError,
    protocol::{AuthResponse, ImageSummary, LoginRequest, SignupRequest, UserProfile},
};
use tracing::debug;

use crate::{config::ClientSettings, error::ApiRequestError, upload::ValidatedUpload};

pub type ApiResult<T> = std::result::Result<T, ApiRequestError>;

/// The gallery backend as seen by the client.
#[async_trait]
pub trait GalleryApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse>;
    async fn signup(&self, request: &SignupRequest) -> ApiResult<AuthResponse>;
    async fn featured_images(&self) -> ApiResult<Vec<ImageSummary>>;
    async fn artist_images(&self, username: &str) -> ApiResult<Vec<ImageSummary>>;
    async fn user_profile(&self, username: &str) -> ApiResult<UserProfile>;
    async fn like_image(&self, token: &str, image_id: &ImageId) -> ApiResult<()>;
    async fn unlike_image(&self, token: &str, image_id: &ImageId) -> ApiResult<()>;
    async fn upload_image(&self, token: &str, upload: ValidatedUpload) -> ApiResult<()>;
    async fn delete_image(&self, token: &str, image_id: &ImageId) -> ApiResult<()>;
}

pub struct HttpGalleryApi {
    http: Client,
    base_url: String,
}

impl HttpGalleryApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> anyhow::Result<Self> {
        let base_url = crate::config::normalize_api_url(&settings.api_base_url)?;
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> ApiResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|source| ApiRequestError::Transport { operation, source })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(operation, status = status.as_u16(), "api request rejected");
        Err(ApiRequestError::Status {
            operation,
            status: status.as_u16(),
            error: ApiError::from_response(status.as_u16(), &body, &format!("{operation} failed")),
        })
    }

    async fn json<T: DeserializeOwned>(
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> ApiResult<T> {
        Self::send(operation, request)
            .await?
            .json()
            .await
            .map_err(|source| ApiRequestError::Decode { operation, source })
    }
}

#[async_trait]
impl GalleryApi for HttpGalleryApi {
    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        Self::json(
            "login",
            self.http.post(self.url("/api/auth/login")).json(request),
        )
        .await
    }

    async fn signup(&self, request: &SignupRequest) -> ApiResult<AuthResponse> {
        Self::json(
            "sign up",
            self.http.post(self.url("/api/auth/register")).json(request),
        )
        .await
    }

    async fn featured_images(&self) -> ApiResult<Vec<ImageSummary>> {
        Self::json(
            "fetch featured images",
            self.http.get(self.url("/api/images/random")),
        )
        .await
    }

    async fn artist_images(&self, username: &str) -> ApiResult<Vec<ImageSummary>> {
        Self::json(
            "fetch artist images",
            self.http
                .get(self.url(&format!("/api/images/user/{username}"))),
        )
        .await
    }

    async fn user_profile(&self, username: &str) -> ApiResult<UserProfile> {
        Self::json(
            "fetch user profile",
            self.http.get(self.url(&format!("/api/users/{username}"))),
        )
        .await
    }

    async fn like_image(&self, token: &str, image_id: &ImageId) -> ApiResult<()> {
        Self::send(
            "like image",
            self.http
                .post(self.url(&format!("/api/images/{image_id}/like")))
                .bearer_auth(token)
                .json(&serde_json::json!({})),
        )
        .await
        .map(|_| ())
    }

    async fn unlike_image(&self, token: &str, image_id: &ImageId) -> ApiResult<()> {
        Self::send(
            "unlike image",
            self.http
                .delete(self.url(&format!("/api/images/{image_id}/like")))
                .bearer_auth(token),
        )
        .await
        .map(|_| ())
    }

    async fn upload_image(&self, token: &str, upload: ValidatedUpload) -> ApiResult<()> {
        let tags = upload.tags_field();
        let image = Part::bytes(upload.bytes)
            .file_name(upload.filename)
            .mime_str(&upload.mime_type)
            .map_err(|source| ApiRequestError::Transport {
                operation: "upload image",
                source,
            })?;
        let form = Form::new()
            .part("image", image)
            .text("title", upload.title)
            .text("description", upload.description)
            .text("tags", tags)
            .text("category", upload.category.as_str());

        Self::send(
            "upload image",
            self.http
                .post(self.url("/api/images/upload"))
                .bearer_auth(token)
                .multipart(form),
        )
        .await
        .map(|_| ())
    }

    async fn delete_image(&self, token: &str, image_id: &ImageId) -> ApiResult<()> {
        Self::send(
            "delete image",
            self.http
                .delete(self.url(&format!("/api/images/{image_id}")))
                .bearer_auth(token),
        )
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
