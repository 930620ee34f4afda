//! Server-backed wishlist.
//!
//! Unlike the cart, the wishlist has no local copy of record: [`fetch`]
//! replaces the list with the server's, and [`toggle`] only changes the
//! list after the server confirms.
//!
//! [`fetch`]: WishlistStore::fetch
//! [`toggle`]: WishlistStore::toggle

use std::sync::{Arc, PoisonError, RwLock};

use flash_fiesta_core::{ProductId, ProductSummary};
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, ApiError};
use crate::notify::{Notifier, Severity};
use crate::session::CredentialProvider;

pub const LOGIN_REQUIRED_MESSAGE: &str = "Please login to manage your wishlist";
pub const ADDED_MESSAGE: &str = "Added to wishlist";
pub const REMOVED_MESSAGE: &str = "Removed from wishlist";
pub const FAILED_MESSAGE: &str = "Failed to update wishlist";

/// The wishlist operations the store needs from the backend.
#[async_trait::async_trait]
pub trait RemoteWishlist: Send + Sync {
    async fn list(&self) -> Result<Vec<ProductSummary>, ApiError>;

    /// Toggle membership; returns whether the product is now wishlisted.
    async fn toggle(&self, id: &ProductId) -> Result<bool, ApiError>;
}

#[async_trait::async_trait]
impl RemoteWishlist for ApiClient {
    async fn list(&self) -> Result<Vec<ProductSummary>, ApiError> {
        Ok(self
            .list_wishlist()
            .await?
            .iter()
            .map(ProductSummary::from)
            .collect())
    }

    async fn toggle(&self, id: &ProductId) -> Result<bool, ApiError> {
        self.toggle_wishlist(id).await
    }
}

/// The signed-in user's wishlist.
#[derive(Clone)]
pub struct WishlistStore {
    inner: Arc<WishlistInner>,
}

struct WishlistInner {
    items: RwLock<Vec<ProductSummary>>,
    remote: Arc<dyn RemoteWishlist>,
    credentials: Arc<dyn CredentialProvider>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for WishlistStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WishlistStore")
            .field("items", &self.len())
            .finish_non_exhaustive()
    }
}

impl WishlistStore {
    #[must_use]
    pub fn new(
        remote: Arc<dyn RemoteWishlist>,
        credentials: Arc<dyn CredentialProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inner: Arc::new(WishlistInner {
                items: RwLock::new(Vec::new()),
                remote,
                credentials,
                notifier,
            }),
        }
    }

    /// Replace the list with the server's. Returns whether it was refreshed.
    ///
    /// Failures are logged and leave the list unchanged.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> bool {
        if !self.inner.credentials.is_authenticated() {
            debug!("No session; wishlist fetch skipped");
            return false;
        }
        match self.inner.remote.list().await {
            Ok(items) => {
                info!(items = items.len(), "Wishlist fetched");
                *self.write() = items;
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch wishlist");
                false
            }
        }
    }

    /// Add or remove `product`, as decided by the server.
    ///
    /// Returns the new membership, or `None` if nothing changed.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn toggle(&self, product: &ProductSummary) -> Option<bool> {
        if !self.inner.credentials.is_authenticated() {
            self.inner
                .notifier
                .notify(LOGIN_REQUIRED_MESSAGE, Severity::Error);
            return None;
        }

        match self.inner.remote.toggle(&product.id).await {
            Ok(true) => {
                {
                    let mut items = self.write();
                    if !items.iter().any(|item| item.id == product.id) {
                        items.push(product.clone());
                    }
                }
                self.inner.notifier.notify(ADDED_MESSAGE, Severity::Success);
                Some(true)
            }
            Ok(false) => {
                self.write().retain(|item| item.id != product.id);
                self.inner.notifier.notify(REMOVED_MESSAGE, Severity::Info);
                Some(false)
            }
            Err(e) => {
                warn!(error = %e, "Failed to toggle wishlist entry");
                self.inner.notifier.notify(FAILED_MESSAGE, Severity::Error);
                None
            }
        }
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.read().iter().any(|item| &item.id == id)
    }

    #[must_use]
    pub fn items(&self) -> Vec<ProductSummary> {
        self.read().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Forget every entry locally.
    pub fn clear(&self) {
        self.write().clear();
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<ProductSummary>> {
        self.inner
            .items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<ProductSummary>> {
        self.inner
            .items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
