//! Local-first cart store with debounced server sync.
//!
//! The in-memory [`Cart`] is authoritative. Every mutation is written to
//! local storage before returning and, while a session is active, schedules
//! a full-replacement push to the server once mutations go quiet for the
//! debounce window. [`CartStore::fetch_remote`] pulls the server snapshot and
//! merges it in (see [`Cart::merge`]).
//!
//! Remote failures never reach callers as errors: they are returned as a
//! [`SyncOutcome`], published as [`SyncStatus`] on a watch channel and
//! forwarded to the [`Notifier`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use flash_fiesta_core::{Cart, CartLineItem, MergeReport, Price, ProductId, ProductSummary};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, RemoteCart};
use crate::debounce::Debouncer;
use crate::notify::{Notifier, Severity};
use crate::session::CredentialProvider;
use crate::storage::{CART_KEY, LocalStorage};

/// Result of a remote cart operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No session was active; no request was made.
    Skipped,
    /// The request succeeded.
    Completed,
    /// The request failed; local state is unchanged.
    Failed(String),
}

impl SyncOutcome {
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Which remote operation a status refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    Fetch,
    Push,
}

impl std::fmt::Display for SyncOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch => write!(f, "fetch"),
            Self::Push => write!(f, "sync"),
        }
    }
}

/// Latest remote activity, observable through [`CartStore::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Idle,
    Fetching,
    Syncing,
    Fetched {
        at: DateTime<Utc>,
        report: MergeReport,
    },
    Synced {
        at: DateTime<Utc>,
        items: usize,
    },
    Failed {
        op: SyncOp,
        error: String,
        at: DateTime<Utc>,
    },
}

/// The shopping cart of one client session.
///
/// Cheap to clone; clones share the same cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    cart: Mutex<Cart>,
    storage: Arc<dyn LocalStorage>,
    remote: Arc<dyn RemoteCart>,
    credentials: Arc<dyn CredentialProvider>,
    notifier: Arc<dyn Notifier>,
    debouncer: Debouncer,
    status: watch::Sender<SyncStatus>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &*self.inner.lock())
            .field("sync_debounce", &self.inner.debouncer.window())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create a store, rehydrating the cart from `storage`.
    ///
    /// An unreadable or corrupt stored cart is logged and replaced by an
    /// empty one.
    #[must_use]
    pub fn new(
        storage: Arc<dyn LocalStorage>,
        remote: Arc<dyn RemoteCart>,
        credentials: Arc<dyn CredentialProvider>,
        notifier: Arc<dyn Notifier>,
        sync_debounce: Duration,
    ) -> Self {
        let cart = load_cart(storage.as_ref());
        debug!(items = cart.len(), "Cart rehydrated");

        Self {
            inner: Arc::new(CartStoreInner {
                cart: Mutex::new(cart),
                storage,
                remote,
                credentials,
                notifier,
                debouncer: Debouncer::new(sync_debounce),
                status: watch::Sender::new(SyncStatus::Idle),
            }),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of `product`. Returns its new quantity.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_item(&self, product: &ProductSummary) -> u32 {
        self.mutate(|cart| (cart.add(product), true))
    }

    /// Remove the line for `id`. Returns whether it was present.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn remove_item(&self, id: &ProductId) -> bool {
        self.mutate(|cart| {
            let removed = cart.remove(id);
            (removed, removed)
        })
    }

    /// Set the quantity for `id`; below 1 removes the line.
    ///
    /// Unknown IDs are ignored. Returns whether the cart changed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn update_quantity(&self, id: &ProductId, quantity: i64) -> bool {
        self.mutate(|cart| {
            let changed = cart.update_quantity(id, quantity);
            (changed, changed)
        })
    }

    /// Empty the cart and delete the stored copy.
    ///
    /// Any sync still waiting for its window is dropped. While a session is
    /// active the empty cart is then pushed like any other change.
    #[instrument(skip(self))]
    pub fn clear(&self) {
        {
            let mut cart = self.inner.lock();
            cart.clear();
            if let Err(e) = self.inner.storage.remove(CART_KEY) {
                warn!(error = %e, "Failed to remove stored cart");
            }
        }
        if self.inner.debouncer.cancel() {
            debug!("Pending cart sync cancelled");
        }
        self.schedule_sync();
    }

    /// Take the lines of a placed order out of the cart.
    ///
    /// Units added while the order was in flight stay. If nothing is left
    /// this behaves like [`clear`](Self::clear).
    #[instrument(skip(self, ordered), fields(lines = ordered.len()))]
    pub fn remove_ordered(&self, ordered: &[CartLineItem]) {
        let remaining = self.mutate(|cart| {
            let changed = cart.remove_ordered(ordered);
            (cart.len(), changed)
        });
        if remaining == 0 {
            self.clear();
        } else {
            debug!(remaining, "Cart kept lines added during checkout");
        }
    }

    fn mutate<R>(&self, apply: impl FnOnce(&mut Cart) -> (R, bool)) -> R {
        let (result, changed) = {
            let mut cart = self.inner.lock();
            let (result, changed) = apply(&mut cart);
            if changed {
                self.inner.persist(&cart);
            }
            (result, changed)
        };
        if changed {
            self.schedule_sync();
        }
        result
    }

    fn schedule_sync(&self) {
        if !self.inner.credentials.is_authenticated() {
            return;
        }
        let inner = Arc::downgrade(&self.inner);
        self.inner.debouncer.schedule(run_sync(inner));
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Sum of unit price times quantity.
    #[must_use]
    pub fn total(&self) -> Price {
        self.inner.lock().total()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.inner.lock().count()
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.inner.lock().items().to_vec()
    }

    /// Copy of the whole cart.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.inner.lock().clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.inner.lock().contains(id)
    }

    // =========================================================================
    // Remote
    // =========================================================================

    /// Pull the server cart and merge it into the local one.
    ///
    /// Does not schedule a push.
    pub async fn fetch_remote(&self) -> SyncOutcome {
        self.inner.fetch_remote().await
    }

    /// Push the whole local cart to the server now.
    pub async fn sync_remote(&self) -> SyncOutcome {
        self.inner.sync_remote().await
    }

    /// Run a sync that is still waiting for its window immediately.
    ///
    /// Returns `None` when nothing was pending.
    pub async fn flush(&self) -> Option<SyncOutcome> {
        if self.inner.debouncer.cancel() {
            Some(self.inner.sync_remote().await)
        } else {
            None
        }
    }

    /// Whether a debounced sync is waiting to fire.
    #[must_use]
    pub fn has_pending_sync(&self) -> bool {
        self.inner.debouncer.is_pending()
    }

    /// Observe remote activity.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status.subscribe()
    }

    /// The most recent remote activity.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.inner.status.borrow().clone()
    }
}

async fn run_sync(inner: Weak<CartStoreInner>) {
    if let Some(inner) = inner.upgrade() {
        inner.sync_remote().await;
    }
}

fn load_cart(storage: &dyn LocalStorage) -> Cart {
    match storage.get(CART_KEY) {
        Ok(Some(raw)) => serde_json::from_str::<Cart>(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Stored cart is corrupt; starting empty");
            Cart::new()
        }),
        Ok(None) => Cart::new(),
        Err(e) => {
            warn!(error = %e, "Failed to read stored cart; starting empty");
            Cart::new()
        }
    }
}

impl CartStoreInner {
    fn lock(&self) -> MutexGuard<'_, Cart> {
        self.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, cart: &Cart) {
        let result = serde_json::to_string(cart)
            .map_err(Into::into)
            .and_then(|raw| self.storage.set(CART_KEY, &raw));
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist cart");
        }
    }

    async fn fetch_remote(&self) -> SyncOutcome {
        if !self.credentials.is_authenticated() {
            debug!("No session; cart fetch skipped");
            return SyncOutcome::Skipped;
        }

        self.status.send_replace(SyncStatus::Fetching);
        match self.remote.fetch_cart().await {
            Ok(server) => {
                let report = {
                    let mut cart = self.lock();
                    let report = cart.merge(server);
                    self.persist(&cart);
                    report
                };
                info!(
                    raised = report.raised,
                    appended = report.appended,
                    "Server cart merged"
                );
                self.status.send_replace(SyncStatus::Fetched {
                    at: Utc::now(),
                    report,
                });
                SyncOutcome::Completed
            }
            Err(e) => self.fail(SyncOp::Fetch, &e),
        }
    }

    async fn sync_remote(&self) -> SyncOutcome {
        if !self.credentials.is_authenticated() {
            debug!("No session; cart sync skipped");
            return SyncOutcome::Skipped;
        }

        let items = self.lock().items().to_vec();
        self.status.send_replace(SyncStatus::Syncing);
        match self.remote.replace_cart(&items).await {
            Ok(()) => {
                info!(items = items.len(), "Cart synced");
                self.status.send_replace(SyncStatus::Synced {
                    at: Utc::now(),
                    items: items.len(),
                });
                SyncOutcome::Completed
            }
            Err(e) => self.fail(SyncOp::Push, &e),
        }
    }

    fn fail(&self, op: SyncOp, error: &ApiError) -> SyncOutcome {
        warn!(op = %op, error = %error, "Cart {op} failed");
        let message = match error {
            ApiError::Unauthorized => "Your session has expired. Please login again".to_string(),
            _ => format!("Could not {op} your cart with the server"),
        };
        self.notifier.notify(&message, Severity::Warning);
        self.status.send_replace(SyncStatus::Failed {
            op,
            error: error.to_string(),
            at: Utc::now(),
        });
        SyncOutcome::Failed(error.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use secrecy::SecretString;

    use super::*;
    use crate::session::Session;
    use crate::storage::MemoryStorage;

    const WINDOW: Duration = Duration::from_millis(1000);

    /// In-memory server cart recording every call.
    #[derive(Default)]
    pub(crate) struct FakeRemote {
        pub server: Mutex<Vec<CartLineItem>>,
        pub pushes: Mutex<Vec<Vec<CartLineItem>>>,
        pub fetches: AtomicUsize,
        pub fail: AtomicBool,
    }

    impl FakeRemote {
        pub fn with_server(items: Vec<CartLineItem>) -> Self {
            Self {
                server: Mutex::new(items),
                ..Self::default()
            }
        }

        pub fn push_count(&self) -> usize {
            self.pushes.lock().unwrap().len()
        }

        pub fn last_push(&self) -> Option<Vec<CartLineItem>> {
            self.pushes.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl RemoteCart for FakeRemote {
        async fn fetch_cart(&self) -> Result<Vec<CartLineItem>, ApiError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(ApiError::Rejected("server down".to_string()));
            }
            Ok(self.server.lock().unwrap().clone())
        }

        async fn replace_cart(&self, items: &[CartLineItem]) -> Result<(), ApiError> {
            self.pushes.lock().unwrap().push(items.to_vec());
            if self.fail.load(Ordering::SeqCst) {
                return Err(ApiError::Status {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            *self.server.lock().unwrap() = items.to_vec();
            Ok(())
        }
    }

    /// Notifier that records what it was told.
    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub messages: Mutex<Vec<(String, Severity)>>,
    }

    impl RecordingNotifier {
        pub fn last(&self) -> Option<(String, Severity)> {
            self.messages.lock().unwrap().last().cloned()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str, severity: Severity) {
            self.messages
                .lock()
                .unwrap()
                .push((message.to_string(), severity));
        }
    }

    pub(crate) fn product(id: &str, cents: i64) -> ProductSummary {
        ProductSummary::new(ProductId::parse(id).unwrap(), Price::from_cents(cents))
    }

    pub(crate) fn line(id: &str, quantity: u32) -> CartLineItem {
        CartLineItem::new(&product(id, 1000), quantity)
    }

    fn pid(id: &str) -> ProductId {
        ProductId::parse(id).unwrap()
    }

    struct Fixture {
        store: CartStore,
        storage: Arc<MemoryStorage>,
        remote: Arc<FakeRemote>,
        session: Session,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture(remote: FakeRemote, signed_in: bool) -> Fixture {
        fixture_with_storage(Arc::new(MemoryStorage::new()), remote, signed_in)
    }

    fn fixture_with_storage(
        storage: Arc<MemoryStorage>,
        remote: FakeRemote,
        signed_in: bool,
    ) -> Fixture {
        let remote = Arc::new(remote);
        let session = Session::new();
        if signed_in {
            session.sign_in(SecretString::from("token"));
        }
        let notifier = Arc::new(RecordingNotifier::default());
        let store = CartStore::new(
            storage.clone(),
            remote.clone(),
            Arc::new(session.clone()),
            notifier.clone(),
            WINDOW,
        );
        Fixture {
            store,
            storage,
            remote,
            session,
            notifier,
        }
    }

    fn quantities(store: &CartStore) -> Vec<(String, u32)> {
        store
            .items()
            .into_iter()
            .map(|item| (item.id.to_string(), item.quantity))
            .collect()
    }

    #[tokio::test]
    async fn test_add_to_empty_cart() {
        let f = fixture(FakeRemote::default(), false);
        assert_eq!(f.store.add_item(&product("p1", 1000)), 1);
        assert_eq!(f.store.count(), 1);
        assert_eq!(f.store.total(), Price::from_cents(1000));
    }

    #[tokio::test]
    async fn test_add_existing_increments() {
        let f = fixture(FakeRemote::default(), false);
        let p1 = product("p1", 1000);
        f.store.add_item(&p1);
        f.store.add_item(&p1);
        assert_eq!(f.store.add_item(&p1), 3);
        assert_eq!(f.store.count(), 3);
        assert_eq!(f.store.items().len(), 1);
    }

    #[tokio::test]
    async fn test_update_to_zero_removes() {
        let f = fixture(FakeRemote::default(), false);
        f.store.add_item(&product("p1", 1000));
        assert!(f.store.update_quantity(&pid("p1"), 0));
        assert_eq!(f.store.count(), 0);
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_ignored() {
        let f = fixture(FakeRemote::default(), true);
        assert!(!f.store.update_quantity(&pid("ghost"), 4));
        assert!(!f.storage.contains(CART_KEY));
        assert!(!f.store.has_pending_sync());
    }

    #[tokio::test]
    async fn test_remove_twice_equals_once() {
        let f = fixture(FakeRemote::default(), false);
        f.store.add_item(&product("p1", 1000));
        f.store.add_item(&product("p2", 500));
        assert!(f.store.remove_item(&pid("p1")));
        let after_once = f.store.snapshot();
        assert!(!f.store.remove_item(&pid("p1")));
        assert_eq!(f.store.snapshot(), after_once);
    }

    #[tokio::test]
    async fn test_mutations_persist_and_rehydrate() {
        let storage = Arc::new(MemoryStorage::new());
        let f = fixture_with_storage(storage.clone(), FakeRemote::default(), false);
        f.store.add_item(&product("p1", 1000));
        f.store.add_item(&product("p2", 250));
        f.store.update_quantity(&pid("p1"), 5);

        let reloaded = fixture_with_storage(storage, FakeRemote::default(), false);
        assert_eq!(
            quantities(&reloaded.store),
            vec![("p1".to_string(), 5), ("p2".to_string(), 1)]
        );
        assert_eq!(reloaded.store.total(), Price::from_cents(5250));
    }

    #[tokio::test]
    async fn test_clear_removes_stored_cart() {
        let storage = Arc::new(MemoryStorage::new());
        let f = fixture_with_storage(storage.clone(), FakeRemote::default(), false);
        f.store.add_item(&product("p1", 1000));
        assert!(storage.contains(CART_KEY));

        f.store.clear();
        assert!(f.store.is_empty());
        assert!(!storage.contains(CART_KEY));

        let reloaded = fixture_with_storage(storage, FakeRemote::default(), false);
        assert!(reloaded.store.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_storage_starts_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(CART_KEY, "{not json").unwrap();
        let f = fixture_with_storage(storage, FakeRemote::default(), false);
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn test_stored_cart_is_normalized() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(
                CART_KEY,
                r#"[{"id":"p1","quantity":2},{"id":"p2","quantity":0},{"id":"p1","quantity":1}]"#,
            )
            .unwrap();
        let f = fixture_with_storage(storage, FakeRemote::default(), false);
        assert_eq!(quantities(&f.store), vec![("p1".to_string(), 3)]);
    }

    #[tokio::test]
    async fn test_one_bad_stored_line_keeps_the_rest() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(
                CART_KEY,
                r#"[{"id":"p1","quantity":2},{"id":"p2","quantity":-1},{"id":"p3","quantity":null},{"id":" ","quantity":1},{"id":"p4","quantity":1}]"#,
            )
            .unwrap();
        let f = fixture_with_storage(storage, FakeRemote::default(), false);
        assert_eq!(
            quantities(&f.store),
            vec![("p1".to_string(), 2), ("p4".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_fetch_merges_with_max_quantity() {
        let f = fixture(
            FakeRemote::with_server(vec![line("p1", 3), line("p2", 1)]),
            true,
        );
        f.store.add_item(&product("p1", 1000));

        assert_eq!(f.store.fetch_remote().await, SyncOutcome::Completed);
        assert_eq!(
            quantities(&f.store),
            vec![("p1".to_string(), 3), ("p2".to_string(), 1)]
        );
        assert!(matches!(
            f.store.status(),
            SyncStatus::Fetched {
                report: MergeReport {
                    raised: 1,
                    appended: 1
                },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_fetch_keeps_larger_local_quantity() {
        let f = fixture(FakeRemote::with_server(vec![line("p1", 1)]), true);
        f.store.update_quantity(&pid("p1"), 2);
        f.store.add_item(&product("p1", 1000));
        f.store.add_item(&product("p1", 1000));

        f.store.fetch_remote().await;
        assert_eq!(quantities(&f.store), vec![("p1".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_fetch_persists_merge_without_pushing() {
        let storage = Arc::new(MemoryStorage::new());
        let f = fixture_with_storage(
            storage.clone(),
            FakeRemote::with_server(vec![line("p9", 4)]),
            true,
        );
        f.store.fetch_remote().await;

        assert!(!f.store.has_pending_sync());
        let reloaded = fixture_with_storage(storage, FakeRemote::default(), false);
        assert_eq!(quantities(&reloaded.store), vec![("p9".to_string(), 4)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthenticated_remote_ops_are_noops() {
        let f = fixture(FakeRemote::with_server(vec![line("p2", 1)]), false);
        f.store.add_item(&product("p1", 1000));
        f.store.remove_item(&pid("p1"));
        f.store.add_item(&product("p1", 1000));

        assert_eq!(f.store.fetch_remote().await, SyncOutcome::Skipped);
        assert_eq!(f.store.sync_remote().await, SyncOutcome::Skipped);
        tokio::time::sleep(WINDOW * 3).await;

        assert_eq!(f.remote.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(f.remote.push_count(), 0);
        assert_eq!(quantities(&f.store), vec![("p1".to_string(), 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_mutations_syncs_once_with_final_state() {
        let f = fixture(FakeRemote::default(), true);
        let p1 = product("p1", 1000);
        for _ in 0..5 {
            f.store.add_item(&p1);
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        f.store.update_quantity(&pid("p1"), 7);
        assert_eq!(f.remote.push_count(), 0);

        tokio::time::sleep(WINDOW + Duration::from_millis(100)).await;
        assert_eq!(f.remote.push_count(), 1);
        let pushed = f.remote.last_push().unwrap();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].quantity, 7);
        assert!(matches!(f.store.status(), SyncStatus::Synced { items: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_failure_keeps_local_state() {
        let f = fixture(FakeRemote::default(), true);
        f.remote.fail.store(true, Ordering::SeqCst);
        f.store.add_item(&product("p1", 1000));
        f.store.add_item(&product("p1", 1000));

        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(f.remote.push_count(), 1);
        assert_eq!(quantities(&f.store), vec![("p1".to_string(), 2)]);
        assert!(matches!(
            f.store.status(),
            SyncStatus::Failed {
                op: SyncOp::Push,
                ..
            }
        ));
        let (_, severity) = f.notifier.last().unwrap();
        assert_eq!(severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_cart_unchanged() {
        let f = fixture(FakeRemote::with_server(vec![line("p2", 5)]), true);
        f.remote.fail.store(true, Ordering::SeqCst);
        f.store.add_item(&product("p1", 1000));
        let before = f.store.snapshot();

        let outcome = f.store.fetch_remote().await;
        assert!(matches!(outcome, SyncOutcome::Failed(_)));
        assert_eq!(f.store.snapshot(), before);
        assert!(f.notifier.last().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_pending_sync_when_signed_out() {
        let f = fixture(FakeRemote::default(), true);
        f.store.add_item(&product("p1", 1000));
        assert!(f.store.has_pending_sync());

        f.session.sign_out();
        f.store.clear();
        assert!(!f.store.has_pending_sync());

        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(f.remote.push_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_while_signed_in_pushes_empty_cart() {
        let f = fixture(FakeRemote::default(), true);
        f.store.add_item(&product("p1", 1000));
        f.store.clear();

        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(f.remote.push_count(), 1);
        assert_eq!(f.remote.last_push().unwrap(), Vec::<CartLineItem>::new());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_rechecks_session_when_firing() {
        let f = fixture(FakeRemote::default(), true);
        f.store.add_item(&product("p1", 1000));
        f.session.sign_out();

        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(f.remote.push_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_runs_pending_sync_now() {
        let f = fixture(FakeRemote::default(), true);
        assert_eq!(f.store.flush().await, None);

        f.store.add_item(&product("p1", 1000));
        assert_eq!(f.store.flush().await, Some(SyncOutcome::Completed));
        assert_eq!(f.remote.push_count(), 1);
        assert!(!f.store.has_pending_sync());

        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(f.remote.push_count(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_sees_status_changes() {
        let f = fixture(FakeRemote::with_server(vec![line("p1", 1)]), true);
        let mut rx = f.store.subscribe();
        assert_eq!(*rx.borrow(), SyncStatus::Idle);

        f.store.fetch_remote().await;
        assert!(rx.has_changed().unwrap());
        assert!(matches!(*rx.borrow_and_update(), SyncStatus::Fetched { .. }));
    }
}
