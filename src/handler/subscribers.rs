//! Observer registry shared between the controlling thread and the reader.

use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        Self(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }
}

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Thread-safe list of callbacks, invoked in subscription order.
///
/// `emit` works on a snapshot, so callbacks may subscribe or unsubscribe
/// (themselves included) without deadlocking; such changes take effect from
/// the next emission. A panicking callback is logged and skipped.
pub struct Subscribers<T: ?Sized> {
    entries: RwLock<Vec<(SubscriptionId, Callback<T>)>>,
}

impl<T: ?Sized> Subscribers<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId::next();
        self.entries.write().push((id, Arc::new(callback)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Invoke every callback with `value`. Returns how many were invoked.
    pub fn emit(&self, value: &T) -> usize {
        self.emit_while(value, || true)
    }

    /// Like [`emit`](Self::emit), but checks `proceed` before each callback
    /// and stops at the first `false`.
    pub fn emit_while(&self, value: &T, proceed: impl Fn() -> bool) -> usize {
        let snapshot: Vec<_> = self.entries.read().clone();
        let mut invoked = 0;
        for (id, callback) in snapshot {
            if !proceed() {
                break;
            }
            if panic::catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
                warn!(subscription = ?id, "subscriber panicked; continuing");
            }
            invoked += 1;
        }
        invoked
    }
}

impl<T: ?Sized> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.len())
            .finish()
    }
}
