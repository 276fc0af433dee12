// Time-boxed entity cache
//
// The slowly-changing lists (conversations, contacts, circle contacts,
// milestones) all gate their refetches the same way: a fetch within the
// freshness window after a completed fetch is skipped entirely - a no-op
// success, not a deduplicated request. This module holds that gate once,
// plus the normalized id-map + ordering-list shape the lists share.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a completed fetch stays fresh. Repeat fetches inside this
/// window are suppressed unless forced.
pub const FRESHNESS_WINDOW: Duration = Duration::from_millis(300_000);

/// Fetch lifecycle of a cached list, rendered as spinner/error in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Freshness gate: decides whether a fetch should hit the network.
///
/// `last_completed` is only set by `complete()`, so a failed fetch never
/// extends the window.
#[derive(Debug, Clone)]
pub struct Freshness {
    window: Duration,
    last_completed: Option<Instant>,
    in_flight: bool,
}

impl Freshness {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_completed: None,
            in_flight: false,
        }
    }

    /// Whether a fetch issued at `now` should perform a network call.
    ///
    /// Skipped (returns false) when unforced and a previous fetch completed
    /// within the window, or when a fetch is already in flight.
    pub fn should_fetch_at(&self, force: bool, now: Instant) -> bool {
        if self.in_flight {
            return false;
        }
        if force {
            return true;
        }
        match self.last_completed {
            Some(at) => now.duration_since(at) >= self.window,
            None => true,
        }
    }

    /// Mark a fetch as issued.
    pub fn begin(&mut self) {
        self.in_flight = true;
    }

    /// Mark the in-flight fetch as completed at `now`, opening the window.
    pub fn complete_at(&mut self, now: Instant) {
        self.in_flight = false;
        self.last_completed = Some(now);
    }

    /// Mark the in-flight fetch as failed. The window is not refreshed, so
    /// the next fetch goes to the network again.
    pub fn fail(&mut self) {
        self.in_flight = false;
    }

    /// Forget the window entirely (logout-equivalent clear).
    pub fn reset(&mut self) {
        self.in_flight = false;
        self.last_completed = None;
    }
}

impl Default for Freshness {
    fn default() -> Self {
        Self::new(FRESHNESS_WINDOW)
    }
}

/// Types stored in an `EntityCache` expose their id for normalization.
pub trait Keyed {
    fn key(&self) -> u64;
}

impl Keyed for crate::api::models::Conversation {
    fn key(&self) -> u64 {
        self.id
    }
}

impl Keyed for crate::api::models::Contact {
    fn key(&self) -> u64 {
        self.id
    }
}

impl Keyed for crate::api::models::Blog {
    fn key(&self) -> u64 {
        self.id
    }
}

impl Keyed for crate::api::models::Milestone {
    fn key(&self) -> u64 {
        self.id
    }
}

/// Normalized entity list: a flat id-keyed map plus an explicit ordering.
///
/// `apply` merges by upsert - entries the server stopped returning are kept
/// (never removed implicitly), trailing the fresh server order.
#[derive(Debug, Clone)]
pub struct EntityCache<T> {
    by_id: HashMap<u64, T>,
    order: Vec<u64>,
    pub freshness: Freshness,
    pub status: FetchStatus,
    pub error: Option<String>,
}

impl<T: Keyed> EntityCache<T> {
    pub fn new() -> Self {
        Self {
            by_id: HashMap::new(),
            order: Vec::new(),
            freshness: Freshness::default(),
            status: FetchStatus::Idle,
            error: None,
        }
    }

    /// Decide whether a fetch should be issued, and if so mark it in
    /// flight. Returns true when the caller should dispatch a network call.
    pub fn request(&mut self, force: bool) -> bool {
        self.request_at(force, Instant::now())
    }

    pub fn request_at(&mut self, force: bool, now: Instant) -> bool {
        if !self.freshness.should_fetch_at(force, now) {
            return false;
        }
        self.freshness.begin();
        self.status = FetchStatus::Loading;
        self.error = None;
        true
    }

    /// Merge a successful response: upsert each item and refresh the
    /// ordering to the server's, keeping known-but-absent entries at the end.
    pub fn apply(&mut self, items: Vec<T>) {
        self.apply_at(items, Instant::now());
    }

    pub fn apply_at(&mut self, items: Vec<T>, now: Instant) {
        let mut fresh_order: Vec<u64> = Vec::with_capacity(items.len());
        for item in items {
            let key = item.key();
            self.by_id.insert(key, item);
            fresh_order.push(key);
        }
        let retained: Vec<u64> = self
            .order
            .iter()
            .copied()
            .filter(|id| !fresh_order.contains(id))
            .collect();
        self.order = fresh_order;
        self.order.extend(retained);

        self.freshness.complete_at(now);
        self.status = FetchStatus::Ready;
        self.error = None;
    }

    /// Record a failed fetch. Cached entries are untouched; only the
    /// status and error change.
    pub fn fail(&mut self, error: String) {
        self.freshness.fail();
        self.status = FetchStatus::Failed;
        self.error = Some(error);
    }

    pub fn get(&self, id: u64) -> Option<&T> {
        self.by_id.get(&id)
    }

    pub fn insert(&mut self, item: T) {
        let key = item.key();
        if !self.by_id.contains_key(&key) {
            self.order.push(key);
        }
        self.by_id.insert(key, item);
    }

    /// Items in display order.
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.order.clear();
        self.freshness.reset();
        self.status = FetchStatus::Idle;
        self.error = None;
    }
}

impl<T: Keyed> Default for EntityCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u64,
        label: &'static str,
    }

    impl Keyed for Item {
        fn key(&self) -> u64 {
            self.id
        }
    }

    fn item(id: u64, label: &'static str) -> Item {
        Item { id, label }
    }

    #[test]
    fn second_fetch_within_window_is_skipped() {
        let mut cache = EntityCache::<Item>::new();
        let t0 = Instant::now();

        assert!(cache.request_at(false, t0));
        cache.apply_at(vec![item(1, "a")], t0);

        // One minute later, still inside the five-minute window.
        let t1 = t0 + Duration::from_secs(60);
        assert!(!cache.request_at(false, t1));
        assert_eq!(cache.status, FetchStatus::Ready);
    }

    #[test]
    fn fetch_after_window_expires_goes_out() {
        let mut cache = EntityCache::<Item>::new();
        let t0 = Instant::now();

        assert!(cache.request_at(false, t0));
        cache.apply_at(vec![item(1, "a")], t0);

        let t1 = t0 + FRESHNESS_WINDOW;
        assert!(cache.request_at(false, t1));
    }

    #[test]
    fn forced_fetch_ignores_freshness() {
        let mut cache = EntityCache::<Item>::new();
        let t0 = Instant::now();

        assert!(cache.request_at(false, t0));
        cache.apply_at(vec![item(1, "a")], t0);

        assert!(cache.request_at(true, t0 + Duration::from_secs(1)));
    }

    #[test]
    fn in_flight_fetch_suppresses_even_forced() {
        let mut cache = EntityCache::<Item>::new();
        assert!(cache.request(false));
        assert!(!cache.request(true));
    }

    #[test]
    fn failure_leaves_entries_and_reopens_gate() {
        let mut cache = EntityCache::<Item>::new();
        let t0 = Instant::now();

        assert!(cache.request_at(false, t0));
        cache.apply_at(vec![item(1, "a"), item(2, "b")], t0);

        assert!(cache.request_at(true, t0));
        cache.fail("boom".into());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(1).unwrap().label, "a");
        assert_eq!(cache.status, FetchStatus::Failed);
        assert_eq!(cache.error.as_deref(), Some("boom"));

        // A failed fetch does not refresh the window.
        assert!(cache.request_at(false, t0 + Duration::from_secs(1)));
    }

    #[test]
    fn apply_upserts_and_keeps_absent_entries() {
        let mut cache = EntityCache::<Item>::new();
        let t0 = Instant::now();

        assert!(cache.request_at(false, t0));
        cache.apply_at(vec![item(1, "a"), item(2, "b")], t0);

        assert!(cache.request_at(true, t0));
        // Server now returns 2 (renamed) and 3; entry 1 must survive.
        cache.apply_at(vec![item(2, "b2"), item(3, "c")], t0);

        let order: Vec<u64> = cache.items().map(|i| i.id).collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert_eq!(cache.get(2).unwrap().label, "b2");
    }
}
