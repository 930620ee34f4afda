//! Session credential holder.
//!
//! Bearer tokens are opaque: they are obtained outside this crate and only
//! attached to requests. A session is either authenticated (a token is held)
//! or not; every remote cart and wishlist operation checks this first.

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::storage::{ACCESS_TOKEN_KEY, LocalStorage};

/// Source of the credential attached to backend requests.
pub trait CredentialProvider: Send + Sync {
    /// The bearer token, if a session is active.
    fn bearer(&self) -> Option<SecretString>;

    /// Whether a session credential is currently held.
    fn is_authenticated(&self) -> bool {
        self.bearer().is_some()
    }

    /// Drop the credential after the backend rejected it.
    fn revoke(&self);
}

/// The client's login session.
///
/// When created with storage, the token is persisted under
/// [`ACCESS_TOKEN_KEY`] and restored on the next start.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    token: RwLock<Option<SecretString>>,
    storage: Option<Arc<dyn LocalStorage>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("persistent", &self.inner.storage.is_some())
            .finish()
    }
}

impl Session {
    /// An unauthenticated, memory-only session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                token: RwLock::new(None),
                storage: None,
            }),
        }
    }

    /// A persistent session, restoring any token saved in `storage`.
    #[must_use]
    pub fn restore(storage: Arc<dyn LocalStorage>) -> Self {
        let token = match storage.get(ACCESS_TOKEN_KEY) {
            Ok(Some(token)) if !token.trim().is_empty() => Some(SecretString::from(token)),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored access token");
                None
            }
        };

        Self {
            inner: Arc::new(SessionInner {
                token: RwLock::new(token),
                storage: Some(storage),
            }),
        }
    }

    /// Start a session with `token`, replacing any current one.
    pub fn sign_in(&self, token: SecretString) {
        if let Some(storage) = &self.inner.storage
            && let Err(e) = storage.set(ACCESS_TOKEN_KEY, token.expose_secret())
        {
            warn!(error = %e, "Failed to persist access token");
        }
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
        info!("Session started");
    }

    /// End the session and forget the stored token.
    pub fn sign_out(&self) {
        self.forget();
        info!("Session ended");
    }

    fn forget(&self) {
        self.inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(storage) = &self.inner.storage
            && let Err(e) = storage.remove(ACCESS_TOKEN_KEY)
        {
            warn!(error = %e, "Failed to remove stored access token");
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for Session {
    fn bearer(&self) -> Option<SecretString> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn revoke(&self) {
        if self.is_authenticated() {
            warn!("Session credential rejected by backend; signing out");
            self.forget();
        }
    }
}
