// Timeline paging and path state machine
//
// One entry per timeline slot number. Each entry tracks a paginated "head"
// (the ancestor chain, append-only within a session) and a mutable "tail"
// (the descendant path, truncated and re-extended by shift operations),
// plus the paging cursor, the stored scroll offset, and the last fetch
// error.
//
// Cursor discipline: Unfetched -> Page(1) -> Page(k+1) -> Exhausted. The
// cursor never moves backward, never reopens after exhaustion, and never
// advances on a failed fetch.
//
// Requests are not fenced. The `loading` flag is a best-effort overlap
// guard, and every command carries the slot generation so a response that
// arrives after the slot was cleared or replaced is dropped instead of
// resurrecting stale state.

use crate::api::models::{ProfileId, ProfileSnapshot, TimelinePage};
use crate::events::Command;
use std::collections::BTreeMap;

/// Paging cursor for a timeline head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCursor {
    /// Nothing fetched yet; the first fetch requests page 1.
    Unfetched,
    /// Next page to request (always >= 1).
    Page(u32),
    /// The server signalled the last page; no further requests.
    Exhausted,
}

impl PageCursor {
    /// Page number the next fetch should request, if any.
    fn next_request(&self) -> Option<u32> {
        match self {
            PageCursor::Unfetched => Some(1),
            PageCursor::Page(n) => Some(*n),
            PageCursor::Exhausted => None,
        }
    }
}

/// State of one timeline slot.
#[derive(Debug, Clone)]
pub struct TimelineState {
    pub owner: ProfileId,
    /// Ancestor chain, appended page by page. Never replaced in-session.
    pub head: Vec<ProfileSnapshot>,
    /// Descendant path. Seeded with the subject on the first page, then
    /// grown and truncated by shift operations.
    pub tail: Vec<ProfileSnapshot>,
    pub cursor: PageCursor,
    /// Server-reported total head length, known after the first page.
    pub head_total: Option<usize>,
    /// Stored viewport offset, restored when the slot is re-entered.
    pub scroll_position: Option<u16>,
    pub error: Option<String>,
    /// Best-effort guard against overlapping head fetches for this slot.
    pub loading: bool,
    generation: u64,
}

impl TimelineState {
    fn new(owner: ProfileId, generation: u64) -> Self {
        Self {
            owner,
            head: Vec::new(),
            tail: Vec::new(),
            cursor: PageCursor::Unfetched,
            head_total: None,
            scroll_position: None,
            error: None,
            loading: false,
            generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether every head page has been fetched.
    pub fn exhausted(&self) -> bool {
        self.cursor == PageCursor::Exhausted
    }
}

/// All timeline slots, keyed by slot number.
#[derive(Debug, Default)]
pub struct TimelineStore {
    slots: BTreeMap<u32, TimelineState>,
    next_generation: u64,
}

impl TimelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, number: u32) -> Option<&TimelineState> {
        self.slots.get(&number)
    }

    /// Create the slot on first navigation.
    ///
    /// A slot that already exists for the same owner is left untouched so
    /// in-progress paging survives re-entry. A slot holding a *different*
    /// owner is replaced with a fresh entry - the old owner's pages must
    /// not leak into the new subject's timeline.
    pub fn add_timeline(&mut self, number: u32, owner: ProfileId) {
        match self.slots.get(&number) {
            Some(existing) if existing.owner == owner => {}
            _ => {
                self.next_generation += 1;
                self.slots
                    .insert(number, TimelineState::new(owner, self.next_generation));
            }
        }
    }

    /// Begin a head fetch for the slot.
    ///
    /// Fails fast with no command (and therefore zero network calls) when
    /// the slot is missing, a fetch is already in flight, or the cursor is
    /// exhausted. An unfetched cursor requests page 1.
    pub fn fetch_head(&mut self, number: u32) -> Option<Command> {
        let slot = self.slots.get_mut(&number)?;
        if slot.loading {
            return None;
        }
        let page = slot.cursor.next_request()?;
        slot.loading = true;
        slot.error = None;
        Some(Command::FetchTimelinePage {
            number,
            owner: slot.owner,
            page,
            generation: slot.generation,
        })
    }

    /// Apply a fetched head page.
    ///
    /// Results are appended, never replacing what is already loaded. The
    /// cursor advances to the following page, or closes when the server
    /// reports no next link. Only the very first page seeds the tail with
    /// the subject's own profile. Returns the number of appended entries
    /// (0 for a stale event), which the view uses to preserve its anchor.
    pub fn apply_head_page(
        &mut self,
        number: u32,
        generation: u64,
        page: u32,
        response: TimelinePage,
    ) -> usize {
        let Some(slot) = self.slots.get_mut(&number) else {
            tracing::debug!("dropping head page for missing timeline slot {number}");
            return 0;
        };
        if slot.generation != generation {
            tracing::debug!("dropping stale head page for timeline slot {number}");
            return 0;
        }

        slot.loading = false;
        slot.error = None;
        slot.head_total = Some(response.count);

        let appended = response.results.len();
        slot.head.extend(response.results);
        debug_assert!(
            slot.head.len() <= response.count,
            "timeline head grew past the server-reported total"
        );

        slot.cursor = match response.next {
            Some(_) => PageCursor::Page(page + 1),
            None => PageCursor::Exhausted,
        };

        if page == 1 && slot.tail.is_empty() {
            if let Some(own) = response.user_profile {
                slot.tail.push(own);
            }
        }

        appended
    }

    /// Record a failed head fetch. The cursor is untouched so the same
    /// fetch can be retried.
    pub fn fetch_head_failed(&mut self, number: u32, generation: u64, error: String) {
        let Some(slot) = self.slots.get_mut(&number) else {
            return;
        };
        if slot.generation != generation {
            return;
        }
        slot.loading = false;
        slot.error = Some(error);
    }

    /// Begin a path shift: repoint the displayed descendant chain at the
    /// subtree rooted at `profile_id`, replacing the tail from `index` on.
    ///
    /// The truncation happens when the subtree arrives, so re-issuing the
    /// same shift cannot duplicate entries.
    pub fn shift_path(&mut self, number: u32, profile_id: ProfileId, index: usize) -> Option<Command> {
        let slot = self.slots.get(&number)?;
        Some(Command::FetchTail {
            number,
            profile_id,
            index: index.min(slot.tail.len()),
            generation: slot.generation,
        })
    }

    /// Apply a fetched subtree: truncate the tail at `index`, then append.
    /// Applying the same event twice yields the same tail.
    pub fn apply_shift(
        &mut self,
        number: u32,
        generation: u64,
        index: usize,
        subtree: Vec<ProfileSnapshot>,
    ) {
        let Some(slot) = self.slots.get_mut(&number) else {
            return;
        };
        if slot.generation != generation {
            tracing::debug!("dropping stale path shift for timeline slot {number}");
            return;
        }
        slot.tail.truncate(index);
        slot.tail.extend(subtree);
        slot.error = None;
    }

    pub fn shift_failed(&mut self, number: u32, generation: u64, error: String) {
        let Some(slot) = self.slots.get_mut(&number) else {
            return;
        };
        if slot.generation != generation {
            return;
        }
        slot.error = Some(error);
    }

    /// Store the viewport offset for the slot. Pure state write: no
    /// network, no cursor movement, safe at scroll-event frequency.
    pub fn update_scroll_position(&mut self, number: u32, position: Option<u16>) {
        if let Some(slot) = self.slots.get_mut(&number) {
            slot.scroll_position = position;
        }
    }

    /// Logout-equivalent: drop every slot. Later responses carry dead
    /// generations and are ignored.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: ProfileId) -> ProfileSnapshot {
        ProfileSnapshot {
            id,
            name: format!("profile-{id}"),
            picture: None,
            children: 1,
            influence: 10,
            height: 2,
            weight: 3,
            depth: 1,
        }
    }

    fn page(ids: &[ProfileId], count: usize, has_next: bool, own: Option<ProfileId>) -> TimelinePage {
        TimelinePage {
            results: ids.iter().copied().map(snapshot).collect(),
            count,
            next: has_next.then(|| "/api/users/timeline/1/?page=next".to_string()),
            load: false,
            user_profile: own.map(snapshot),
        }
    }

    fn fetch_spec(store: &mut TimelineStore, number: u32) -> (u32, u64) {
        match store.fetch_head(number) {
            Some(Command::FetchTimelinePage {
                page, generation, ..
            }) => (page, generation),
            other => panic!("expected a timeline page command, got {other:?}"),
        }
    }

    #[test]
    fn first_fetch_requests_page_one() {
        let mut store = TimelineStore::new();
        store.add_timeline(1, 100);

        let (page, _) = fetch_spec(&mut store, 1);
        assert_eq!(page, 1);
        assert!(store.get(1).unwrap().loading);
    }

    #[test]
    fn two_page_scenario_reaches_exhaustion() {
        // head_total = 12: first page has 5 items and a next link, second
        // has the remaining 7 and none.
        let mut store = TimelineStore::new();
        store.add_timeline(1, 100);

        let (p1, generation) = fetch_spec(&mut store, 1);
        store.apply_head_page(1, generation, p1, page(&[1, 2, 3, 4, 5], 12, true, Some(100)));

        let slot = store.get(1).unwrap();
        assert_eq!(slot.head.len(), 5);
        assert_eq!(slot.cursor, PageCursor::Page(2));

        let (p2, generation) = fetch_spec(&mut store, 1);
        assert_eq!(p2, 2);
        store.apply_head_page(1, generation, p2, page(&[6, 7, 8, 9, 10, 11, 12], 12, false, None));

        let slot = store.get(1).unwrap();
        assert_eq!(slot.head.len(), 12);
        assert_eq!(slot.cursor, PageCursor::Exhausted);
        assert_eq!(slot.head_total, Some(12));

        // A third fetch issues no command at all.
        assert!(store.fetch_head(1).is_none());
    }

    #[test]
    fn pages_append_and_never_replace() {
        let mut store = TimelineStore::new();
        store.add_timeline(1, 100);

        let (p1, generation) = fetch_spec(&mut store, 1);
        store.apply_head_page(1, generation, p1, page(&[1, 2], 4, true, None));
        let (p2, generation) = fetch_spec(&mut store, 1);
        store.apply_head_page(1, generation, p2, page(&[3, 4], 4, false, None));

        let ids: Vec<ProfileId> = store.get(1).unwrap().head.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn only_first_page_seeds_tail() {
        let mut store = TimelineStore::new();
        store.add_timeline(1, 100);

        let (p1, generation) = fetch_spec(&mut store, 1);
        store.apply_head_page(1, generation, p1, page(&[1], 3, true, Some(100)));
        assert_eq!(store.get(1).unwrap().tail.len(), 1);
        assert_eq!(store.get(1).unwrap().tail[0].id, 100);

        // A later page carrying a user_profile (server quirk) must not
        // reseed the tail.
        let (p2, generation) = fetch_spec(&mut store, 1);
        store.apply_head_page(1, generation, p2, page(&[2], 3, false, Some(999)));
        assert_eq!(store.get(1).unwrap().tail.len(), 1);
        assert_eq!(store.get(1).unwrap().tail[0].id, 100);
    }

    #[test]
    fn failure_keeps_cursor_and_allows_retry() {
        let mut store = TimelineStore::new();
        store.add_timeline(1, 100);

        let (p1, generation) = fetch_spec(&mut store, 1);
        store.apply_head_page(1, generation, p1, page(&[1, 2], 6, true, None));

        let (p2, generation) = fetch_spec(&mut store, 1);
        assert_eq!(p2, 2);
        store.fetch_head_failed(1, generation, "502 bad gateway".into());

        let slot = store.get(1).unwrap();
        assert_eq!(slot.cursor, PageCursor::Page(2));
        assert_eq!(slot.error.as_deref(), Some("502 bad gateway"));
        assert!(!slot.loading);

        // Retry requests the same page.
        let (retry, _) = fetch_spec(&mut store, 1);
        assert_eq!(retry, 2);
    }

    #[test]
    fn overlapping_fetch_is_suppressed_while_loading() {
        let mut store = TimelineStore::new();
        store.add_timeline(1, 100);

        assert!(store.fetch_head(1).is_some());
        assert!(store.fetch_head(1).is_none());
    }

    #[test]
    fn same_owner_add_is_a_noop() {
        let mut store = TimelineStore::new();
        store.add_timeline(1, 100);

        let (p1, generation) = fetch_spec(&mut store, 1);
        store.apply_head_page(1, generation, p1, page(&[1, 2], 2, false, None));

        store.add_timeline(1, 100);
        assert_eq!(store.get(1).unwrap().head.len(), 2);
    }

    #[test]
    fn different_owner_replaces_slot() {
        let mut store = TimelineStore::new();
        store.add_timeline(1, 100);

        let (p1, generation) = fetch_spec(&mut store, 1);
        store.apply_head_page(1, generation, p1, page(&[1, 2], 2, false, None));

        store.add_timeline(1, 200);
        let slot = store.get(1).unwrap();
        assert_eq!(slot.owner, 200);
        assert!(slot.head.is_empty());
        assert_eq!(slot.cursor, PageCursor::Unfetched);
    }

    #[test]
    fn stale_generation_response_is_dropped() {
        let mut store = TimelineStore::new();
        store.add_timeline(1, 100);
        let (p1, old_generation) = fetch_spec(&mut store, 1);

        // Slot replaced while the request was in flight.
        store.add_timeline(1, 200);

        let appended =
            store.apply_head_page(1, old_generation, p1, page(&[1, 2, 3], 3, false, None));
        assert_eq!(appended, 0);
        assert!(store.get(1).unwrap().head.is_empty());
    }

    #[test]
    fn shift_truncates_then_appends() {
        let mut store = TimelineStore::new();
        store.add_timeline(1, 100);
        let (p1, generation) = fetch_spec(&mut store, 1);
        store.apply_head_page(1, generation, p1, page(&[1], 4, false, Some(100)));

        // Extend the tail first: 100 -> 7 -> 8
        store.apply_shift(1, generation, 1, vec![snapshot(7), snapshot(8)]);
        let ids: Vec<ProfileId> = store.get(1).unwrap().tail.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![100, 7, 8]);

        // Pivot at index 1 to a different branch.
        store.apply_shift(1, generation, 1, vec![snapshot(9)]);
        let ids: Vec<ProfileId> = store.get(1).unwrap().tail.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![100, 9]);
    }

    #[test]
    fn shift_is_idempotent_under_retry() {
        let mut store = TimelineStore::new();
        store.add_timeline(1, 100);
        let generation = store.get(1).unwrap().generation();

        store.apply_shift(1, generation, 0, vec![snapshot(5), snapshot(6)]);
        let once: Vec<ProfileId> = store.get(1).unwrap().tail.iter().map(|s| s.id).collect();

        store.apply_shift(1, generation, 0, vec![snapshot(5), snapshot(6)]);
        let twice: Vec<ProfileId> = store.get(1).unwrap().tail.iter().map(|s| s.id).collect();

        assert_eq!(once, twice);
        assert_eq!(twice, vec![5, 6]);
    }

    #[test]
    fn shift_command_clamps_index_to_tail_length() {
        let mut store = TimelineStore::new();
        store.add_timeline(1, 100);

        match store.shift_path(1, 42, 10) {
            Some(Command::FetchTail { index, .. }) => assert_eq!(index, 0),
            other => panic!("expected a tail command, got {other:?}"),
        }
    }

    #[test]
    fn scroll_position_burst_is_pure() {
        let mut store = TimelineStore::new();
        store.add_timeline(1, 100);

        for i in 0..100u16 {
            store.update_scroll_position(1, Some(i));
        }

        let slot = store.get(1).unwrap();
        assert_eq!(slot.scroll_position, Some(99));
        // No fetch state was disturbed.
        assert_eq!(slot.cursor, PageCursor::Unfetched);
        assert!(!slot.loading);
    }

    #[test]
    fn clear_drops_all_slots() {
        let mut store = TimelineStore::new();
        store.add_timeline(1, 100);
        store.add_timeline(2, 200);
        store.clear();
        assert!(store.get(1).is_none());
        assert!(store.get(2).is_none());
    }
}
