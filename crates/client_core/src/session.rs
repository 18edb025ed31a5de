//! Bearer-token session, persisted between runs.

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::protocol::{LoginRequest, SignupRequest, UserSummary};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::{api::GalleryApi, error::ApiRequestError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to access session file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("session file '{path}' is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Api(#[from] ApiRequestError),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<Session>, SessionError>;
    async fn save(&self, session: &Session) -> Result<(), SessionError>;
    async fn clear(&self) -> Result<(), SessionError>;
}

/// JSON file holding the token and the logged-in user.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Session>, SessionError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| SessionError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    async fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| self.io_error(err))?;
        }
        let raw = serde_json::to_vec_pretty(session).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|err| self.io_error(err))
    }

    async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<Session>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.inner.lock().await.clone())
    }

    async fn save(&self, session: &Session) -> Result<(), SessionError> {
        *self.inner.lock().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        *self.inner.lock().await = None;
        Ok(())
    }
}

/// The logged-in principal shared by every view of one client.
pub struct SessionHandle {
    api: Arc<dyn GalleryApi>,
    store: Arc<dyn SessionStore>,
    current: RwLock<Option<Session>>,
}

impl SessionHandle {
    pub fn new(api: Arc<dyn GalleryApi>, store: Arc<dyn SessionStore>) -> Arc<Self> {
        Arc::new(Self {
            api,
            store,
            current: RwLock::new(None),
        })
    }

    /// Loads a previously saved session. A corrupt file is discarded rather
    /// than treated as fatal.
    pub async fn restore(&self) -> Result<Option<UserSummary>, SessionError> {
        let loaded = match self.store.load().await {
            Ok(loaded) => loaded,
            Err(err @ SessionError::Corrupt { .. }) => {
                warn!("session: discarding unreadable session: {err}");
                self.store.clear().await?;
                None
            }
            Err(err) => return Err(err),
        };

        let user = loaded.as_ref().map(|session| session.user.clone());
        *self.current.write().await = loaded;
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserSummary, SessionError> {
        let response = self
            .api
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.adopt(Session {
            token: response.token,
            user: response.user,
        })
        .await
    }

    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserSummary, SessionError> {
        let response = self
            .api
            .signup(&SignupRequest {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.adopt(Session {
            token: response.token,
            user: response.user,
        })
        .await
    }

    /// Installs `session` as current and persists it.
    pub async fn adopt(&self, session: Session) -> Result<UserSummary, SessionError> {
        self.store.save(&session).await?;
        let user = session.user.clone();
        *self.current.write().await = Some(session);
        info!(username = %user.username, "session: logged in");
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), SessionError> {
        let previous = self.current.write().await.take();
        self.store.clear().await?;
        if let Some(previous) = previous {
            info!(username = %previous.user.username, "session: logged out");
        }
        Ok(())
    }

    pub async fn bearer(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|session| session.token.clone())
            .filter(|token| !token.is_empty())
    }

    pub async fn current_user(&self) -> Option<UserSummary> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|session| session.user.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.bearer().await.is_some()
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
