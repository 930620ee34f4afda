//! Integration test support for the Flash Fiesta storefront client.
//!
//! [`FakeBackend`] serves the subset of the REST API the client uses from an
//! in-process `axum` server on an ephemeral port. It speaks the same
//! `{"Status": 6000, ...}` envelope as the real backend, requires
//! `Authorization: Bearer <TOKEN>` on user endpoints and records every call
//! so tests can assert on what reached the wire.
//!
//! # Test Categories
//!
//! - `cart_sync` - Fetch-and-merge, debounced push, session transitions
//! - `checkout` - Order placement and history
//! - `wishlist` - Toggle and fetch
//! - `catalogue` - Product lookup, filters, caching and error mapping
//! - `reviews` - Review eligibility and profile read/update

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::routing::{get, post};
use axum::{Json, Router};
use flash_fiesta_storefront::config::ClientConfig;
use flash_fiesta_storefront::notify::{Notifier, Severity};
use flash_fiesta_storefront::state::AppState;
use flash_fiesta_storefront::storage::FileStorage;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

/// The only bearer token the fake backend accepts.
pub const TOKEN: &str = "valid-test-token";

/// Debounce window used by [`FakeBackend::config`].
pub const SYNC_DEBOUNCE: Duration = Duration::from_millis(150);

type Reply = (StatusCode, Json<Value>);

/// Mutable state behind the fake backend.
#[derive(Default)]
struct BackendState {
    products: Mutex<Vec<Value>>,
    categories: Mutex<Vec<Value>>,
    delivered: Mutex<Vec<String>>,
    profile: Mutex<Value>,
    cart: Mutex<Vec<Value>>,
    wishlist: Mutex<Vec<String>>,
    orders: Mutex<Vec<Value>>,
    sync_bodies: Mutex<Vec<Value>>,
    hits: Mutex<HashMap<&'static str, usize>>,
    fail_sync: AtomicBool,
    omit_cart_data: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BackendState {
    fn hit(&self, route: &'static str) {
        *lock(&self.hits).entry(route).or_default() += 1;
    }

    fn product(&self, id: &str) -> Option<Value> {
        lock(&self.products)
            .iter()
            .find(|p| p["id"].as_str() == Some(id))
            .cloned()
    }

    fn category(&self, id: &str) -> Option<Value> {
        lock(&self.categories)
            .iter()
            .find(|c| c["id"].as_str() == Some(id))
            .cloned()
    }
}

/// An in-process stand-in for the storefront REST backend.
pub struct FakeBackend {
    url: Url,
    state: Arc<BackendState>,
    server: JoinHandle<()>,
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl FakeBackend {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(BackendState::default());
        *lock(&state.profile) = json!({
            "username": "ada",
            "email": "ada@example.com",
            "role": "CUSTOMER",
            "phone_number": null,
            "address": null,
            "city": null,
            "zip_code": null,
        });

        let app = Router::new()
            .route("/api/product/Products/", get(list_products))
            .route("/api/product/Products/{id}/", get(product_detail))
            .route("/api/product/Categories/", get(list_categories))
            .route("/api/product/SearchSuggestions/", get(search_suggestions))
            .route("/api/product/CreateReview/", post(create_review))
            .route("/api/product/Cart/", get(get_cart))
            .route("/api/product/Cart/Sync/", post(sync_cart))
            .route("/api/product/Wishlist/", get(list_wishlist))
            .route("/api/product/Wishlist/Toggle/", post(toggle_wishlist))
            .route("/api/order/place/", post(place_order))
            .route("/api/order/my-orders/", get(my_orders))
            .route("/api/auth/profile/", get(get_profile))
            .route("/api/auth/profile/update/", post(update_profile))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let url = Url::parse(&format!("http://{addr}/")).map_err(std::io::Error::other)?;
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            url,
            state,
            server,
        })
    }

    /// Base URL of the running server.
    #[must_use]
    pub fn url(&self) -> Url {
        self.url.clone()
    }

    /// Client configuration pointing at this server with a short debounce.
    #[must_use]
    pub fn config(&self, data_dir: &Path) -> ClientConfig {
        let mut config = ClientConfig::new(self.url());
        config.data_dir = data_dir.to_path_buf();
        config.sync_debounce = SYNC_DEBOUNCE;
        config.request_timeout = Duration::from_secs(5);
        config
    }

    /// Application state over file storage in `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn app_state(
        &self,
        data_dir: &Path,
        notifier: Arc<dyn Notifier>,
    ) -> Result<AppState, flash_fiesta_storefront::api::ApiError> {
        AppState::with_parts(
            self.config(data_dir),
            Arc::new(FileStorage::new(data_dir)),
            notifier,
        )
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Add a catalogue product with no category.
    pub fn add_product(&self, id: &str, name: &str, rate: &str) {
        self.add_product_with(id, name, rate, None, false);
    }

    /// Add a catalogue product in `category`, optionally trending.
    ///
    /// The category should already exist (see [`add_category`](Self::add_category))
    /// for its details to be embedded.
    pub fn add_product_with(
        &self,
        id: &str,
        name: &str,
        rate: &str,
        category: Option<&str>,
        trending: bool,
    ) {
        let details = category
            .and_then(|c| self.state.category(c))
            .unwrap_or(Value::Null);
        let mut products = lock(&self.state.products);
        let number = products.len() + 1;
        products.push(json!({
            "id": id,
            "ProductID": number,
            "ProductName": name,
            "ProductDescription": format!("{name} description"),
            "ProductPrice": rate,
            "ProductQuantity": 10,
            "ProductImage": format!("/media/{id}.png"),
            "Rate": rate,
            "Qty": 10,
            "is_trending": trending,
            "category": category,
            "category_details": details,
            "reviews": [],
            "can_review": false,
        }));
    }

    /// Add a product category.
    pub fn add_category(&self, id: &str, name: &str) {
        lock(&self.state.categories).push(json!({
            "id": id,
            "name": name,
            "image": format!("/media/categories/{id}.png"),
        }));
    }

    /// Record a delivered order containing `product_id`, making it reviewable.
    pub fn mark_delivered(&self, product_id: &str) {
        lock(&self.state.delivered).push(product_id.to_string());
    }

    /// Answer cart fetches with `{"Status": 6000}` and no `data`.
    pub fn omit_cart_data(&self, omit: bool) {
        self.state.omit_cart_data.store(omit, Ordering::SeqCst);
    }

    /// Replace the server-side cart with `(product id, quantity)` pairs.
    pub fn set_cart(&self, lines: &[(&str, u32)]) {
        let items = lines
            .iter()
            .map(|(id, quantity)| {
                let product = self.state.product(id).unwrap_or_else(|| json!({}));
                json!({
                    "id": id,
                    "ProductName": product["ProductName"],
                    "ProductImage": product["ProductImage"],
                    "Rate": product["Rate"],
                    "quantity": quantity,
                })
            })
            .collect();
        *lock(&self.state.cart) = items;
    }

    /// Make cart sync requests fail with HTTP 500.
    pub fn fail_sync(&self, fail: bool) {
        self.state.fail_sync.store(fail, Ordering::SeqCst);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Server cart as `(product id, quantity)` pairs.
    #[must_use]
    pub fn cart(&self) -> Vec<(String, u64)> {
        lock(&self.state.cart)
            .iter()
            .map(|item| {
                (
                    item["id"].as_str().unwrap_or_default().to_string(),
                    item["quantity"].as_u64().unwrap_or_default(),
                )
            })
            .collect()
    }

    /// Every body received by the cart sync endpoint, in order.
    #[must_use]
    pub fn sync_bodies(&self) -> Vec<Value> {
        lock(&self.state.sync_bodies).clone()
    }

    /// Orders placed so far, as the backend would list them.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        lock(&self.state.orders).clone()
    }

    /// The stored profile.
    #[must_use]
    pub fn profile(&self) -> Value {
        lock(&self.state.profile).clone()
    }

    /// Product IDs on the wishlist.
    #[must_use]
    pub fn wishlist(&self) -> Vec<String> {
        lock(&self.state.wishlist).clone()
    }

    /// Number of requests that reached `route` (e.g. `"cart.sync"`).
    ///
    /// Routes: `products.list`, `products.detail`, `products.suggest`,
    /// `categories.list`, `review.create`, `cart.get`, `cart.sync`,
    /// `wishlist.list`, `wishlist.toggle`, `order.place`, `order.list`,
    /// `profile.get`, `profile.update`.
    #[must_use]
    pub fn hits(&self, route: &str) -> usize {
        lock(&self.state.hits).get(route).copied().unwrap_or_default()
    }

    /// Total number of requests served.
    #[must_use]
    pub fn total_hits(&self) -> usize {
        lock(&self.state.hits).values().sum()
    }
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

// =============================================================================
// RecordingNotifier
// =============================================================================

/// Notifier that keeps every message for later assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn messages(&self) -> Vec<(String, Severity)> {
        lock(&self.messages).clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<(String, Severity)> {
        lock(&self.messages).last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        lock(&self.messages).push((message.to_string(), severity));
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn ok(data: Value) -> Reply {
    (StatusCode::OK, Json(json!({"Status": 6000, "data": data})))
}

fn rejected(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({"Status": 6001, "message": message})))
}

fn authorize(headers: &HeaderMap) -> Result<(), Reply> {
    let expected = format!("Bearer {TOKEN}");
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Given token not valid for any token type"})),
        )),
    }
}

async fn list_products(
    State(state): State<Arc<BackendState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    state.hit("products.list");
    let search = params.get("search").map(|s| s.to_lowercase());
    let category = params.get("category");
    let trending = params.get("trending").is_some_and(|t| t == "true");
    let products: Vec<Value> = lock(&state.products)
        .iter()
        .filter(|p| {
            search.as_ref().is_none_or(|needle| {
                p["ProductName"]
                    .as_str()
                    .is_some_and(|name| name.to_lowercase().contains(needle))
            })
        })
        .filter(|p| category.is_none_or(|c| p["category"].as_str() == Some(c.as_str())))
        .filter(|p| !trending || p["is_trending"].as_bool() == Some(true))
        .cloned()
        .collect();
    ok(Value::Array(products))
}

async fn product_detail(
    State(state): State<Arc<BackendState>>,
    UrlPath(id): UrlPath<String>,
) -> Reply {
    state.hit("products.detail");
    // The real backend answers unknown products with 200 and a 6001 envelope
    state
        .product(&id)
        .map_or_else(|| rejected(StatusCode::OK, "Product not found"), ok)
}

async fn list_categories(State(state): State<Arc<BackendState>>) -> Reply {
    state.hit("categories.list");
    ok(Value::Array(lock(&state.categories).clone()))
}

async fn search_suggestions(
    State(state): State<Arc<BackendState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    state.hit("products.suggest");
    let query = params.get("q").map(|q| q.trim().to_lowercase()).unwrap_or_default();
    if query.chars().count() < 2 {
        return ok(json!([]));
    }
    let mut names: Vec<String> = Vec::new();
    for product in lock(&state.products).iter() {
        let Some(name) = product["ProductName"].as_str() else {
            continue;
        };
        if name.to_lowercase().contains(&query) && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        if names.len() == 5 {
            break;
        }
    }
    ok(json!(names))
}

async fn create_review(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    state.hit("review.create");
    if let Err(reply) = authorize(&headers) {
        return reply;
    }
    let Some(id) = body["product_id"].as_str() else {
        return rejected(StatusCode::BAD_REQUEST, "Product ID required");
    };
    if !lock(&state.delivered).iter().any(|d| d == id) {
        return rejected(
            StatusCode::FORBIDDEN,
            "Verified Purchase Required: You can only review products from delivered orders.",
        );
    }

    let mut products = lock(&state.products);
    let Some(product) = products.iter_mut().find(|p| p["id"].as_str() == Some(id)) else {
        return rejected(StatusCode::NOT_FOUND, "Product not found");
    };
    if let Some(reviews) = product["reviews"].as_array_mut() {
        reviews.push(json!({
            "user": {
                "username": lock(&state.profile)["username"],
                "first_name": null,
                "last_name": null,
            },
            "rating": body["rating"],
            "comment": body["comment"],
            "created_at": "2026-03-15T10:00:00Z",
        }));
    }
    (
        StatusCode::CREATED,
        Json(json!({"Status": 6000, "message": "Review submitted successfully"})),
    )
}

async fn get_cart(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Reply {
    state.hit("cart.get");
    if let Err(reply) = authorize(&headers) {
        return reply;
    }
    if state.omit_cart_data.load(Ordering::SeqCst) {
        return (StatusCode::OK, Json(json!({"Status": 6000})));
    }
    ok(Value::Array(lock(&state.cart).clone()))
}

async fn sync_cart(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    state.hit("cart.sync");
    if let Err(reply) = authorize(&headers) {
        return reply;
    }
    lock(&state.sync_bodies).push(body.clone());
    if state.fail_sync.load(Ordering::SeqCst) {
        return rejected(StatusCode::INTERNAL_SERVER_ERROR, "database is locked");
    }
    let items = body["items"].as_array().cloned().unwrap_or_default();
    *lock(&state.cart) = items;
    (
        StatusCode::OK,
        Json(json!({"Status": 6000, "message": "Cart synced"})),
    )
}

async fn list_wishlist(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Reply {
    state.hit("wishlist.list");
    if let Err(reply) = authorize(&headers) {
        return reply;
    }
    let products: Vec<Value> = lock(&state.wishlist)
        .iter()
        .filter_map(|id| state.product(id))
        .collect();
    ok(Value::Array(products))
}

async fn toggle_wishlist(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    state.hit("wishlist.toggle");
    if let Err(reply) = authorize(&headers) {
        return reply;
    }
    let Some(id) = body["product_id"].as_str() else {
        return rejected(StatusCode::BAD_REQUEST, "Product ID required");
    };
    if state.product(id).is_none() {
        return rejected(StatusCode::NOT_FOUND, "Product not found");
    }

    let mut wishlist = lock(&state.wishlist);
    let (message, wishlisted) = if let Some(pos) = wishlist.iter().position(|w| w == id) {
        wishlist.remove(pos);
        ("Removed from wishlist", false)
    } else {
        wishlist.push(id.to_string());
        ("Added to wishlist", true)
    };
    (
        StatusCode::OK,
        Json(json!({"Status": 6000, "message": message, "wishlisted": wishlisted})),
    )
}

async fn place_order(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    state.hit("order.place");
    if let Err(reply) = authorize(&headers) {
        return reply;
    }

    let mut items = Vec::new();
    for line in body["items"].as_array().cloned().unwrap_or_default() {
        let Some(product) = line["product_id"].as_str().and_then(|id| state.product(id)) else {
            return rejected(StatusCode::NOT_FOUND, "Product not found");
        };
        items.push(json!({
            "id": uuid::Uuid::new_v4(),
            "product": product["id"],
            "product_name": product["ProductName"],
            "quantity": line["quantity"],
            "price": product["Rate"],
        }));
    }

    let order_id = uuid::Uuid::new_v4();
    lock(&state.orders).insert(
        0,
        json!({
            "id": order_id,
            "user": 1,
            "full_name": body["full_name"],
            "address": body["address"],
            "city": body["city"],
            "zip_code": body["zip_code"],
            "total_amount": body["total_amount"],
            "created_at": "2026-03-14T09:26:53Z",
            "status": "Pending",
            "items": items,
        }),
    );

    (
        StatusCode::CREATED,
        Json(json!({
            "Status": 6000,
            "message": "Order placed successfully",
            "order_id": order_id.to_string(),
        })),
    )
}

async fn my_orders(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Reply {
    state.hit("order.list");
    if let Err(reply) = authorize(&headers) {
        return reply;
    }
    ok(Value::Array(lock(&state.orders).clone()))
}

async fn get_profile(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Reply {
    state.hit("profile.get");
    if let Err(reply) = authorize(&headers) {
        return reply;
    }
    ok(lock(&state.profile).clone())
}

async fn update_profile(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    state.hit("profile.update");
    if let Err(reply) = authorize(&headers) {
        return reply;
    }
    let Some(fields) = body.as_object() else {
        return rejected(StatusCode::BAD_REQUEST, "Invalid profile data");
    };
    let mut profile = lock(&state.profile);
    for (key, value) in fields {
        profile[key.as_str()] = value.clone();
    }
    (
        StatusCode::OK,
        Json(json!({"Status": 6000, "message": "Profile updated successfully"})),
    )
}
