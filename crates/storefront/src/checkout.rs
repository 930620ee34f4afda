//! Order placement from the current cart.

use std::sync::Arc;

use async_trait::async_trait;
use flash_fiesta_core::{CartLineItem, Order, OrderId, Price};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{ApiClient, ApiError, ShippingDetails};
use crate::cart::CartStore;
use crate::session::CredentialProvider;

/// Errors that can occur when placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Please login to place an order")]
    NotSignedIn,

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Missing shipping detail: {0}")]
    MissingDetails(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Order endpoints used by [`Checkout`].
#[async_trait]
pub trait RemoteOrders: Send + Sync {
    async fn place_order(
        &self,
        details: &ShippingDetails,
        items: &[CartLineItem],
        total: Price,
    ) -> Result<OrderId, ApiError>;

    async fn my_orders(&self) -> Result<Vec<Order>, ApiError>;
}

#[async_trait]
impl RemoteOrders for ApiClient {
    async fn place_order(
        &self,
        details: &ShippingDetails,
        items: &[CartLineItem],
        total: Price,
    ) -> Result<OrderId, ApiError> {
        Self::place_order(self, details, items, total).await
    }

    async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
        Self::my_orders(self).await
    }
}

/// Turns the cart into an order.
#[derive(Clone)]
pub struct Checkout {
    cart: CartStore,
    remote: Arc<dyn RemoteOrders>,
    credentials: Arc<dyn CredentialProvider>,
}

impl std::fmt::Debug for Checkout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkout").finish_non_exhaustive()
    }
}

impl Checkout {
    #[must_use]
    pub fn new(
        cart: CartStore,
        remote: Arc<dyn RemoteOrders>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            cart,
            remote,
            credentials,
        }
    }

    /// Place an order for everything in the cart, then take the ordered
    /// lines out of it.
    ///
    /// Items added while the request is in flight are not part of the order
    /// and stay in the cart. The cart is left untouched if the order is not
    /// placed.
    ///
    /// # Errors
    ///
    /// Returns an error without contacting the backend if no session is
    /// active, the cart is empty or a shipping field is blank. Otherwise
    /// returns the backend's error.
    #[instrument(skip(self, details))]
    pub async fn place_order(&self, details: &ShippingDetails) -> Result<OrderId, CheckoutError> {
        if !self.credentials.is_authenticated() {
            return Err(CheckoutError::NotSignedIn);
        }
        if let Some(field) = details.missing_field() {
            return Err(CheckoutError::MissingDetails(field));
        }

        let cart = self.cart.snapshot();
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let total = cart.total();
        let order_id = self
            .remote
            .place_order(details, cart.items(), total)
            .await
            .inspect_err(|e| warn!(error = %e, "Order placement failed"))?;

        info!(order_id = %order_id, items = cart.len(), total = %total, "Order placed");
        self.cart.remove_ordered(cart.items());
        Ok(order_id)
    }

    /// The signed-in user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if no session is active or the request fails.
    #[instrument(skip(self))]
    pub async fn my_orders(&self) -> Result<Vec<Order>, CheckoutError> {
        if !self.credentials.is_authenticated() {
            return Err(CheckoutError::NotSignedIn);
        }
        Ok(self.remote.my_orders().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use secrecy::SecretString;
    use uuid::Uuid;

    use super::*;
    use crate::cart::tests::{FakeRemote, RecordingNotifier, product};
    use crate::session::Session;
    use crate::storage::{CART_KEY, MemoryStorage};

    #[derive(Default)]
    struct FakeOrders {
        placed: Mutex<Vec<(ShippingDetails, Vec<CartLineItem>, Price)>>,
        reject: bool,
        /// Cart to add `late` to while the request is being handled.
        meanwhile: Mutex<Option<CartStore>>,
    }

    #[async_trait]
    impl RemoteOrders for FakeOrders {
        async fn place_order(
            &self,
            details: &ShippingDetails,
            items: &[CartLineItem],
            total: Price,
        ) -> Result<OrderId, ApiError> {
            if self.reject {
                return Err(ApiError::Status {
                    status: 404,
                    message: "Product not found".to_string(),
                });
            }
            if let Some(cart) = self.meanwhile.lock().unwrap().take() {
                cart.add_item(&product("late", 100));
            }
            self.placed
                .lock()
                .unwrap()
                .push((details.clone(), items.to_vec(), total));
            Ok(OrderId::new(Uuid::new_v4()))
        }

        async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn details() -> ShippingDetails {
        ShippingDetails {
            full_name: "Ada Lovelace".to_string(),
            address: "12 Analytical St".to_string(),
            city: "London".to_string(),
            zip_code: "N1 9GU".to_string(),
        }
    }

    struct Fixture {
        checkout: Checkout,
        cart: CartStore,
        orders: Arc<FakeOrders>,
        storage: Arc<MemoryStorage>,
    }

    fn fixture(signed_in: bool, reject: bool) -> Fixture {
        let session = Session::new();
        if signed_in {
            session.sign_in(SecretString::from("token"));
        }
        let credentials: Arc<dyn CredentialProvider> = Arc::new(session);
        let storage = Arc::new(MemoryStorage::new());
        let cart = CartStore::new(
            storage.clone(),
            Arc::new(FakeRemote::default()),
            credentials.clone(),
            Arc::new(RecordingNotifier::default()),
            Duration::from_secs(1),
        );
        let orders = Arc::new(FakeOrders {
            reject,
            ..FakeOrders::default()
        });
        let checkout = Checkout::new(cart.clone(), orders.clone(), credentials);
        Fixture {
            checkout,
            cart,
            orders,
            storage,
        }
    }

    #[tokio::test]
    async fn test_successful_order_clears_cart() {
        let f = fixture(true, false);
        f.cart.add_item(&product("p1", 1000));
        f.cart.add_item(&product("p1", 1000));
        f.cart.add_item(&product("p2", 250));

        f.checkout.place_order(&details()).await.unwrap();

        let placed = f.orders.placed.lock().unwrap();
        assert_eq!(placed.len(), 1);
        let (_, items, total) = &placed[0];
        assert_eq!(items.len(), 2);
        assert_eq!(*total, Price::from_cents(2250));
        assert!(f.cart.is_empty());
        assert!(!f.storage.contains(CART_KEY));
    }

    #[tokio::test]
    async fn test_failed_order_keeps_cart() {
        let f = fixture(true, true);
        f.cart.add_item(&product("p1", 1000));

        let err = f.checkout.place_order(&details()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Api(ApiError::Status { status: 404, .. })));
        assert_eq!(f.cart.count(), 1);
    }

    #[tokio::test]
    async fn test_requires_session() {
        let f = fixture(false, false);
        f.cart.add_item(&product("p1", 1000));
        let err = f.checkout.place_order(&details()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::NotSignedIn));
        assert!(matches!(
            f.checkout.my_orders().await.unwrap_err(),
            CheckoutError::NotSignedIn
        ));
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let f = fixture(true, false);
        let err = f.checkout.place_order(&details()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
        assert!(f.orders.placed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_shipping_field_is_rejected() {
        let f = fixture(true, false);
        f.cart.add_item(&product("p1", 1000));
        let mut incomplete = details();
        incomplete.zip_code = String::new();

        let err = f.checkout.place_order(&incomplete).await.unwrap_err();
        assert!(matches!(err, CheckoutError::MissingDetails("zip_code")));
        assert_eq!(f.cart.count(), 1);
    }

    #[tokio::test]
    async fn test_items_added_during_checkout_stay_in_cart() {
        let f = fixture(true, false);
        f.cart.add_item(&product("p1", 1000));
        f.cart.add_item(&product("p1", 1000));
        *f.orders.meanwhile.lock().unwrap() = Some(f.cart.clone());

        f.checkout.place_order(&details()).await.unwrap();

        let placed = f.orders.placed.lock().unwrap();
        assert_eq!(placed[0].1.len(), 1);
        assert_eq!(placed[0].1[0].quantity, 2);
        let left = f.cart.items();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id.as_str(), "late");
        assert!(f.storage.contains(CART_KEY));
    }
}
