//! Application context owning the client's stores.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::info;

use crate::api::{ApiClient, ApiError};
use crate::cart::{CartStore, SyncOutcome};
use crate::checkout::Checkout;
use crate::config::ClientConfig;
use crate::notify::{Notifier, TracingNotifier};
use crate::session::{CredentialProvider, Session};
use crate::storage::{FileStorage, LocalStorage};
use crate::wishlist::WishlistStore;

/// Everything one client session needs, wired together.
///
/// This struct is cheaply cloneable via `Arc`. Every store shares the same
/// [`Session`], so signing in or out is seen by all of them.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ClientConfig,
    api: ApiClient,
    session: Session,
    cart: CartStore,
    wishlist: WishlistStore,
    checkout: Checkout,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create the application state, storing data under `config.data_dir`
    /// and reporting notifications through `tracing`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let storage = Arc::new(FileStorage::new(&config.data_dir));
        Self::with_parts(config, storage, Arc::new(TracingNotifier))
    }

    /// Create the application state over explicit storage and notifier.
    ///
    /// A token in `config.access_token` replaces any restored one.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_parts(
        config: ClientConfig,
        storage: Arc<dyn LocalStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ApiError> {
        let session = Session::restore(storage.clone());
        if let Some(token) = config.access_token.clone() {
            session.sign_in(token);
        }
        let credentials: Arc<dyn CredentialProvider> = Arc::new(session.clone());

        let api = ApiClient::new(&config, credentials.clone())?;
        let remote = Arc::new(api.clone());

        let cart = CartStore::new(
            storage,
            remote.clone(),
            credentials.clone(),
            notifier.clone(),
            config.sync_debounce,
        );
        let wishlist = WishlistStore::new(remote.clone(), credentials.clone(), notifier);
        let checkout = Checkout::new(cart.clone(), remote, credentials);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                session,
                cart,
                wishlist,
                checkout,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &WishlistStore {
        &self.inner.wishlist
    }

    #[must_use]
    pub fn checkout(&self) -> &Checkout {
        &self.inner.checkout
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.session.is_authenticated()
    }

    /// Start a session, then merge the server cart and load the wishlist.
    ///
    /// Returns the outcome of the cart fetch.
    pub async fn sign_in(&self, token: SecretString) -> SyncOutcome {
        self.inner.session.sign_in(token);
        let outcome = self.inner.cart.fetch_remote().await;
        self.inner.wishlist.fetch().await;
        info!(cart_items = self.inner.cart.items().len(), "Signed in");
        outcome
    }

    /// End the session, then clear the cart and the wishlist.
    pub fn sign_out(&self) {
        self.inner.session.sign_out();
        self.inner.cart.clear();
        self.inner.wishlist.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use url::Url;

    use super::*;
    use crate::notify::NullNotifier;
    use crate::storage::{ACCESS_TOKEN_KEY, CART_KEY, MemoryStorage};

    fn config() -> ClientConfig {
        ClientConfig::new(Url::parse("http://127.0.0.1:9").unwrap())
    }

    fn state(config: ClientConfig, storage: Arc<MemoryStorage>) -> AppState {
        AppState::with_parts(config, storage, Arc::new(NullNotifier)).unwrap()
    }

    #[test]
    fn test_starts_signed_out() {
        let state = state(config(), Arc::new(MemoryStorage::new()));
        assert!(!state.is_authenticated());
        assert!(state.cart().is_empty());
    }

    #[test]
    fn test_config_token_starts_session() {
        let storage = Arc::new(MemoryStorage::new());
        let mut config = config();
        config.access_token = Some(SecretString::from("from-env"));

        let state = state(config, storage.clone());
        assert!(state.is_authenticated());
        assert!(storage.contains(ACCESS_TOKEN_KEY));
    }

    #[test]
    fn test_restores_persisted_session() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(ACCESS_TOKEN_KEY, "saved").unwrap();
        let state = state(config(), storage);
        assert!(state.is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_out_clears_cart_and_session() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(ACCESS_TOKEN_KEY, "saved").unwrap();
        let state = state(config(), storage.clone());
        state
            .cart()
            .add_item(&crate::cart::tests::product("p1", 1000));
        assert!(storage.contains(CART_KEY));

        state.sign_out();
        assert!(!state.is_authenticated());
        assert!(state.cart().is_empty());
        assert!(state.wishlist().is_empty());
        assert!(!state.cart().has_pending_sync());
        assert!(!storage.contains(CART_KEY));
        assert!(!storage.contains(ACCESS_TOKEN_KEY));
    }
}
