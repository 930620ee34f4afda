//! REST client for the Flash Fiesta backend.
//!
//! Every response is wrapped in a `{"Status": 6000, "data": ...}` envelope;
//! any other `Status` is a rejection. Uses `reqwest` 0.13 for HTTP and
//! caches catalogue lookups in `moka` (5-minute TTL).
//!
//! # Authentication
//!
//! Requests carry `Authorization: Bearer <token>` whenever the
//! [`CredentialProvider`] holds one. An HTTP 401 revokes the credential so
//! the client falls back to the unauthenticated state.

mod cache;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flash_fiesta_core::{
    Cart, CartLineItem, Category, Order, OrderId, Price, Product, ProductId, Profile,
};
use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::session::CredentialProvider;

use cache::{CacheKey, CacheValue};
pub use types::{ProductQuery, ProfileUpdate, ShippingDetails};
use types::{
    Envelope, OrderLine, PlaceOrderRequest, ReviewRequest, SyncCartRequest, ToggleWishlistRequest,
};

/// Search suggestions need at least this many characters.
const MIN_SUGGESTION_QUERY: usize = 2;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The backend rejected the session credential.
    #[error("Unauthorized: session expired or invalid")]
    Unauthorized,

    /// Non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Envelope carried a non-success `Status`.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// The two server cart operations the cart store depends on.
#[async_trait]
pub trait RemoteCart: Send + Sync {
    /// Retrieve the server's cart snapshot.
    async fn fetch_cart(&self) -> Result<Vec<CartLineItem>, ApiError>;

    /// Replace the server's cart with `items`.
    async fn replace_cart(&self, items: &[CartLineItem]) -> Result<(), ApiError>;
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialProvider>,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
                credentials,
                cache,
            }),
        })
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Send a request and unwrap the response envelope.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Envelope, ApiError> {
        let request = match self.inner.credentials.bearer() {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.inner.credentials.revoke();
            return Err(ApiError::Unauthorized);
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope>(&body)
                .ok()
                .and_then(|envelope| envelope.reason())
                .unwrap_or_else(|| body.chars().take(200).collect());
            warn!(status = %status, message = %message, "Backend returned non-success status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope = serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e.to_string())
        })?;

        if !envelope.is_success() {
            let reason = envelope
                .reason()
                .unwrap_or_else(|| format!("Status {}", envelope.status));
            debug!(reason = %reason, "Backend rejected request");
            return Err(ApiError::Rejected(reason));
        }

        Ok(envelope)
    }

    /// Decode a server cart snapshot.
    ///
    /// A reply without `data` is an empty cart. Unreadable lines are
    /// dropped the same way as when loading the stored cart.
    fn decode_cart(envelope: Envelope) -> Result<Vec<CartLineItem>, ApiError> {
        match envelope.data {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(data) => serde_json::from_value::<Cart>(data)
                .map(Vec::from)
                .map_err(|e| ApiError::Parse(e.to_string())),
        }
    }

    /// Deserialize the envelope's `data` field.
    fn decode<T: DeserializeOwned>(envelope: Envelope) -> Result<T, ApiError> {
        let data = envelope
            .data
            .ok_or_else(|| ApiError::Parse("response has no data".to_string()))?;
        serde_json::from_value(data).map_err(|e| ApiError::Parse(e.to_string()))
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the backend does not know the product,
    /// or another error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&format!("api/product/Products/{id}/"))?;
        let envelope = match self.execute(self.inner.client.get(url)).await {
            Ok(envelope) => envelope,
            Err(ApiError::Status { status: 404, .. }) => {
                return Err(ApiError::NotFound(format!("Product not found: {id}")));
            }
            Err(ApiError::Rejected(reason)) if reason.to_lowercase().contains("not found") => {
                return Err(ApiError::NotFound(format!("Product not found: {id}")));
            }
            Err(e) => return Err(e),
        };
        let product: Product = Self::decode(envelope)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List catalogue products matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let query = query.clone().normalized();
        let cache_key = CacheKey::Products(query.clone());

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let mut url = self.endpoint("api/product/Products/")?;
        let pairs = query.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        let products: Vec<Product> = Self::decode(self.execute(self.inner.client.get(url)).await?)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// List catalogue categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.endpoint("api/product/Categories/")?;
        let categories: Vec<Category> =
            Self::decode(self.execute(self.inner.client.get(url)).await?)?;

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    /// Product names matching `query`, for type-ahead.
    ///
    /// Queries shorter than two characters return nothing without a request.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_suggestions(&self, query: &str) -> Result<Vec<String>, ApiError> {
        let query = query.trim();
        if query.chars().count() < MIN_SUGGESTION_QUERY {
            return Ok(Vec::new());
        }

        let mut url = self.endpoint("api/product/SearchSuggestions/")?;
        url.query_pairs_mut().append_pair("q", query);
        Self::decode(self.execute(self.inner.client.get(url)).await?)
    }

    /// Review a product the signed-in user has received.
    ///
    /// Drops the cached product so its next lookup shows the review.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails. The backend answers 403
    /// unless the user has a delivered order containing the product.
    #[instrument(skip(self, comment), fields(product_id = %id))]
    pub async fn create_review(
        &self,
        id: &ProductId,
        rating: u8,
        comment: &str,
    ) -> Result<(), ApiError> {
        let url = self.endpoint("api/product/CreateReview/")?;
        let body = ReviewRequest {
            product_id: id,
            rating,
            comment,
        };
        self.execute(self.inner.client.post(url).json(&body)).await?;
        self.inner
            .cache
            .invalidate(&CacheKey::Product(id.clone()))
            .await;
        Ok(())
    }

    /// Drop every cached catalogue response.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Wishlist Methods
    // =========================================================================

    /// List the signed-in user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_wishlist(&self) -> Result<Vec<Product>, ApiError> {
        let url = self.endpoint("api/product/Wishlist/")?;
        Self::decode(self.execute(self.inner.client.get(url)).await?)
    }

    /// Toggle a product on the wishlist. Returns whether it is now wishlisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the response lacks the
    /// new membership state.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn toggle_wishlist(&self, id: &ProductId) -> Result<bool, ApiError> {
        let url = self.endpoint("api/product/Wishlist/Toggle/")?;
        let request = self
            .inner
            .client
            .post(url)
            .json(&ToggleWishlistRequest { product_id: id });
        self.execute(request)
            .await?
            .wishlisted
            .ok_or_else(|| ApiError::Parse("response has no wishlisted flag".to_string()))
    }

    // =========================================================================
    // Profile Methods
    // =========================================================================

    /// The signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_profile(&self) -> Result<Profile, ApiError> {
        let url = self.endpoint("api/auth/profile/")?;
        Self::decode(self.execute(self.inner.client.get(url)).await?)
    }

    /// Change the fields set in `update`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        let url = self.endpoint("api/auth/profile/update/")?;
        self.execute(self.inner.client.post(url).json(update))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Place an order for `items`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the response carries no
    /// order ID.
    #[instrument(skip(self, details, items), fields(items = items.len(), total = %total))]
    pub async fn place_order(
        &self,
        details: &ShippingDetails,
        items: &[CartLineItem],
        total: Price,
    ) -> Result<OrderId, ApiError> {
        let url = self.endpoint("api/order/place/")?;
        let body = PlaceOrderRequest {
            full_name: &details.full_name,
            address: &details.address,
            city: &details.city,
            zip_code: &details.zip_code,
            total_amount: total,
            items: items.iter().map(OrderLine::from).collect(),
        };
        let order_id = self
            .execute(self.inner.client.post(url).json(&body))
            .await?
            .order_id
            .ok_or_else(|| ApiError::Parse("response has no order_id".to_string()))?;
        order_id
            .parse()
            .map_err(|e: uuid::Error| ApiError::Parse(format!("invalid order_id: {e}")))
    }

    /// List the signed-in user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
        let url = self.endpoint("api/order/my-orders/")?;
        Self::decode(self.execute(self.inner.client.get(url)).await?)
    }
}

#[async_trait]
impl RemoteCart for ApiClient {
    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<Vec<CartLineItem>, ApiError> {
        let url = self.endpoint("api/product/Cart/")?;
        Self::decode_cart(self.execute(self.inner.client.get(url)).await?)
    }

    #[instrument(skip(self, items), fields(items = items.len()))]
    async fn replace_cart(&self, items: &[CartLineItem]) -> Result<(), ApiError> {
        let url = self.endpoint("api/product/Cart/Sync/")?;
        self.execute(self.inner.client.post(url).json(&SyncCartRequest { items }))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::session::Session;

    fn client(base: &str) -> ApiClient {
        let config = ClientConfig::new(Url::parse(base).unwrap());
        ApiClient::new(&config, Arc::new(Session::new())).unwrap()
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("Product not found: p1".to_string());
        assert_eq!(err.to_string(), "Not found: Product not found: p1");

        let err = ApiError::Status {
            status: 400,
            message: "Product not found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 400: Product not found");
    }

    #[test]
    fn test_endpoints_join_onto_base_path() {
        let api = client("https://shop.example.com/backend");
        assert_eq!(
            api.endpoint("api/product/Cart/Sync/").unwrap().as_str(),
            "https://shop.example.com/backend/api/product/Cart/Sync/"
        );
    }

    fn envelope(data: Option<Value>) -> Envelope {
        Envelope {
            status: 6000,
            data,
            message: None,
            wishlisted: None,
            order_id: None,
        }
    }

    #[test]
    fn test_decode_requires_data() {
        let mut reply = envelope(None);
        reply.message = Some(serde_json::json!("Order placed"));
        let err = ApiClient::decode::<Vec<Order>>(reply).unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[test]
    fn test_absent_server_cart_is_empty() {
        assert!(ApiClient::decode_cart(envelope(None)).unwrap().is_empty());
        assert!(
            ApiClient::decode_cart(envelope(Some(Value::Null)))
                .unwrap()
                .is_empty()
        );
        let reply: Envelope = serde_json::from_str(r#"{"Status": 6000, "data": null}"#).unwrap();
        assert!(ApiClient::decode_cart(reply).unwrap().is_empty());
    }

    #[test]
    fn test_server_cart_skips_bad_lines() {
        let reply = envelope(Some(serde_json::json!([
            {"id": "p1", "quantity": 2},
            {"id": "p2", "quantity": -1},
            {"id": "", "quantity": 1}
        ])));
        let items = ApiClient::decode_cart(reply).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id.as_str(), "p1");
    }

    #[test]
    fn test_server_cart_must_be_a_list() {
        let reply = envelope(Some(serde_json::json!({"items": []})));
        assert!(matches!(
            ApiClient::decode_cart(reply).unwrap_err(),
            ApiError::Parse(_)
        ));
    }

    #[tokio::test]
    async fn test_short_suggestion_query_skips_request() {
        // Nothing listens on this port, so a request would fail
        let api = client("http://127.0.0.1:9");
        assert!(api.search_suggestions(" k ").await.unwrap().is_empty());
    }

    #[test]
    fn test_decode_cart_items() {
        let envelope = Envelope {
            status: 6000,
            data: Some(serde_json::json!([
                {"id": "p1", "ProductName": "Kettle", "ProductImage": null, "Rate": "12.50", "quantity": 2}
            ])),
            message: None,
            wishlisted: None,
            order_id: None,
        };
        let items: Vec<CartLineItem> = ApiClient::decode(envelope).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].unit_price(), Price::from_cents(1250));
    }
}
