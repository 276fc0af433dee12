// TUI application state
//
// App owns the stores and is the only place state transitions happen:
// input and view changes ask the stores for commands to dispatch, and
// completed background work comes back through apply_sync. Panels hold
// presentation state (scroll, selection) and nothing authoritative.

use crate::config::Config;
use crate::events::{CircleList, Command, CounterKind, FeedStatus, SyncEvent, VerificationUpdate};
use crate::feed::FeedHandle;
use crate::logging::LogBuffer;
use crate::store::timeline::PageCursor;
use crate::store::{BlogStore, CircleStore, MilestoneStore, SessionStore, TimelineStore};
use crate::tui::components::{
    BlogAction, BlogsPanel, CirclePanel, LogsPanel, TimelineAction, TimelinePanel, Toast,
};
use crossterm::event::KeyCode;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Debounce duration for action keys (Enter, Esc, q)
/// Prevents rapid-fire triggers on terminals that don't send release events
const ACTION_DEBOUNCE: Duration = Duration::from_millis(150);

/// Different views the TUI can display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Dashboard,
    Timeline,
    Circle,
    Blogs,
    Help,
}

impl View {
    /// Display name for the title bar
    pub fn name(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Timeline => "Timeline",
            View::Circle => "Circle",
            View::Blogs => "Blogs",
            View::Help => "Help",
        }
    }

    /// Key hints for the status bar
    pub fn key_hints(&self) -> &'static str {
        match self {
            View::Dashboard => "d/t/c/b:views  r:refresh  ?:help  q:quit",
            View::Timeline => "↑↓:walk  Enter:pivot  r:retry  q:quit",
            View::Circle => "Tab:list  ↑↓:scroll  r:refresh  q:quit",
            View::Blogs => "Tab:category  l:like  s:share  q:quit",
            View::Help => "Esc:back  q:quit",
        }
    }
}

/// Counters for the status bar
#[derive(Debug, Default)]
pub struct SessionStats {
    pub commands_sent: usize,
    pub fetch_failures: usize,
}

/// Main application state for the TUI
pub struct App {
    pub should_quit: bool,
    pub view: View,

    // Stores
    pub timelines: TimelineStore,
    pub circle: CircleStore,
    pub blogs: BlogStore,
    pub milestones: MilestoneStore,
    pub session: SessionStore,

    // Live feed state
    pub active_users: Option<u64>,
    pub petitioners: Option<u64>,
    pub feed_status: FeedStatus,

    // Panels
    pub timeline_panel: TimelinePanel,
    pub circle_panel: CirclePanel,
    pub blogs_panel: BlogsPanel,
    pub logs_panel: LogsPanel,
    /// Dashboard-only: Tab moves focus onto the logs panel
    pub logs_focused: bool,

    pub log_buffer: LogBuffer,
    pub toast: Option<Toast>,
    pub stats: SessionStats,

    /// The timeline slot currently displayed
    pub current_timeline: u32,

    config: Config,
    commands: mpsc::Sender<Command>,
    feed: Option<FeedHandle>,
    start_time: Instant,
    last_action_time: Option<Instant>,
    animation_frame: usize,
}

impl App {
    pub fn new(
        config: Config,
        log_buffer: LogBuffer,
        commands: mpsc::Sender<Command>,
        feed: Option<FeedHandle>,
        session: SessionStore,
    ) -> Self {
        Self {
            should_quit: false,
            view: View::default(),
            timelines: TimelineStore::new(),
            circle: CircleStore::new(),
            blogs: BlogStore::new(),
            milestones: MilestoneStore::new(),
            session,
            active_users: None,
            petitioners: None,
            feed_status: FeedStatus::Disconnected,
            timeline_panel: TimelinePanel::new(),
            circle_panel: CirclePanel::new(),
            blogs_panel: BlogsPanel::new(),
            logs_panel: LogsPanel::new(),
            logs_focused: false,
            log_buffer,
            toast: None,
            stats: SessionStats::default(),
            current_timeline: 1,
            config,
            commands,
            feed,
            start_time: Instant::now(),
            last_action_time: None,
            animation_frame: 0,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Command dispatch
    // ─────────────────────────────────────────────────────────────

    /// Push a command to the sync dispatcher. Stores return None when a
    /// fetch should not go out (fresh cache, exhausted cursor, in-flight
    /// guard); that is a silent no-op here too.
    pub fn dispatch(&mut self, command: Option<Command>) {
        let Some(command) = command else {
            return;
        };
        self.stats.commands_sent += 1;
        if let Err(err) = self.commands.try_send(command) {
            tracing::warn!("dropping fetch command: {err}");
        }
    }

    /// Forward a user input event to the feed's inactivity clock.
    pub fn touch_feed(&self) {
        if let Some(feed) = &self.feed {
            feed.touch();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // View lifecycle
    // ─────────────────────────────────────────────────────────────

    pub fn set_view(&mut self, view: View) {
        if self.view == view {
            return;
        }
        self.leave_view();
        self.view = view;
        self.enter_view();
    }

    fn leave_view(&mut self) {
        match self.view {
            View::Timeline => self.persist_timeline_scroll(),
            View::Dashboard => {
                // The live socket belongs to the dashboard; leaving it is
                // an intentional disconnect.
                if let Some(feed) = &self.feed {
                    feed.close();
                }
                self.logs_focused = false;
            }
            _ => {}
        }
    }

    /// Run the on-mount effects of the current view. Also called once at
    /// startup for the initial view.
    pub fn enter_view(&mut self) {
        match self.view {
            View::Dashboard => {
                if let Some(feed) = &self.feed {
                    feed.open();
                }
                if let Some(user_id) = self.session.identity.user_id {
                    if self.config.features.milestones {
                        let cmd = self.milestones.fetch(user_id, false);
                        self.dispatch(cmd);
                    }
                }
            }
            View::Timeline => {
                let Some(user_id) = self.session.identity.user_id else {
                    return;
                };
                let number = self.current_timeline;
                self.timelines.add_timeline(number, user_id);

                let stored = self.timelines.get(number).and_then(|s| s.scroll_position);
                self.timeline_panel.enter_slot(stored);
                if let Some(slot) = self.timelines.get(number) {
                    if !slot.head.is_empty() {
                        // Data already present: apply the stored offset now.
                        self.timeline_panel.on_page_applied(slot, 0);
                    }
                    if slot.cursor == PageCursor::Unfetched {
                        let cmd = self.timelines.fetch_head(number);
                        self.dispatch(cmd);
                    }
                }
            }
            View::Circle => {
                for list in [
                    CircleList::Conversations,
                    CircleList::Contacts,
                    CircleList::CircleContacts,
                ] {
                    let cmd = self.circle.fetch(list, false);
                    self.dispatch(cmd);
                }
            }
            View::Blogs => {
                if self.config.features.blogs {
                    let kind = self.blogs_panel.kind;
                    let cmd = self.blogs.fetch(kind, false);
                    self.dispatch(cmd);
                }
            }
            View::Help => {}
        }
    }

    /// Store the timeline viewport offset so re-entering the slot lands
    /// where the user left off.
    fn persist_timeline_scroll(&mut self) {
        let offset = self.timeline_panel.scroll.offset().min(u16::MAX as usize) as u16;
        self.timelines
            .update_scroll_position(self.current_timeline, Some(offset));
    }

    /// Force-refresh whatever the current view shows.
    pub fn refresh_current_view(&mut self) {
        match self.view {
            View::Dashboard => {
                if let Some(feed) = &self.feed {
                    feed.open();
                }
                if let Some(user_id) = self.session.identity.user_id {
                    let cmd = self.milestones.fetch(user_id, true);
                    self.dispatch(cmd);
                }
            }
            View::Timeline => {
                let cmd = self.timelines.fetch_head(self.current_timeline);
                self.dispatch(cmd);
            }
            View::Circle => {
                for list in [
                    CircleList::Conversations,
                    CircleList::Contacts,
                    CircleList::CircleContacts,
                ] {
                    let cmd = self.circle.fetch(list, true);
                    self.dispatch(cmd);
                }
            }
            View::Blogs => {
                let kind = self.blogs_panel.kind;
                let cmd = self.blogs.fetch(kind, true);
                self.dispatch(cmd);
            }
            View::Help => {}
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Panel input routing
    // ─────────────────────────────────────────────────────────────

    /// Route a key to the focused panel of the current view.
    pub fn handle_panel_key(&mut self, key: KeyCode) {
        match self.view {
            View::Dashboard => {
                if key == KeyCode::Tab {
                    self.logs_focused = !self.logs_focused;
                } else if self.logs_focused {
                    self.logs_panel.handle_key(key);
                }
            }
            View::Timeline => {
                let slot = self.timelines.get(self.current_timeline);
                match self.timeline_panel.handle_key(key, slot) {
                    TimelineAction::None => {}
                    TimelineAction::ScrollChanged => self.persist_timeline_scroll(),
                    TimelineAction::FetchOlder => {
                        let cmd = self.timelines.fetch_head(self.current_timeline);
                        self.dispatch(cmd);
                    }
                    TimelineAction::Shift { profile_id, index } => {
                        let cmd = self
                            .timelines
                            .shift_path(self.current_timeline, profile_id, index);
                        self.dispatch(cmd);
                    }
                }
            }
            View::Circle => {
                self.circle_panel.handle_key(key);
            }
            View::Blogs => match self.blogs_panel.handle_key(key, &self.blogs) {
                BlogAction::None => {}
                BlogAction::KindChanged(kind) => {
                    let cmd = self.blogs.fetch(kind, false);
                    self.dispatch(cmd);
                }
                BlogAction::Like(kind, id) => {
                    let cmd = self.blogs.react(kind, id, crate::events::ReactionKind::Like);
                    self.dispatch(cmd);
                }
                BlogAction::Share(kind, id) => {
                    let cmd = self
                        .blogs
                        .react(kind, id, crate::events::ReactionKind::Share);
                    self.dispatch(cmd);
                }
            },
            View::Help => {}
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Sync event reducer
    // ─────────────────────────────────────────────────────────────

    /// Fold one completed piece of background work into the stores.
    pub fn apply_sync(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::TimelinePage {
                number,
                generation,
                page,
                response,
            } => {
                let appended = self.timelines.apply_head_page(number, generation, page, response);
                if number == self.current_timeline {
                    if let Some(slot) = self.timelines.get(number) {
                        self.timeline_panel.on_page_applied(slot, appended);
                    }
                }
            }
            SyncEvent::TimelineFailed {
                number,
                generation,
                error,
            } => {
                self.stats.fetch_failures += 1;
                self.timelines.fetch_head_failed(number, generation, error);
            }
            SyncEvent::PathShifted {
                number,
                generation,
                index,
                subtree,
            } => {
                self.timelines.apply_shift(number, generation, index, subtree);
            }
            SyncEvent::ShiftFailed {
                number,
                generation,
                error,
            } => {
                self.stats.fetch_failures += 1;
                self.timelines.shift_failed(number, generation, error);
            }
            SyncEvent::ConversationsLoaded { items } => {
                self.circle.apply_conversations(items);
            }
            SyncEvent::ContactsLoaded { list, items } => {
                self.circle.apply_contacts(list, items);
            }
            SyncEvent::CircleFailed { list, error } => {
                self.stats.fetch_failures += 1;
                self.circle.fetch_failed(list, error);
            }
            SyncEvent::BlogsLoaded { kind, items } => {
                self.blogs.apply_fetch(kind, items);
            }
            SyncEvent::BlogsFailed { kind, error } => {
                self.stats.fetch_failures += 1;
                self.blogs.fetch_failed(kind, error);
            }
            SyncEvent::ReactionResolved { correlation, blog } => {
                self.blogs.resolve_reaction(correlation, blog);
            }
            SyncEvent::ReactionFailed { correlation, error } => {
                self.stats.fetch_failures += 1;
                self.blogs.roll_back_reaction(correlation, &error);
                self.show_toast("✗ Reaction failed");
            }
            SyncEvent::MilestonesLoaded { items } => {
                self.milestones.apply(items);
            }
            SyncEvent::MilestonesFailed { error } => {
                self.stats.fetch_failures += 1;
                self.milestones.fetch_failed(error);
            }
            SyncEvent::Counter { kind, value } => match kind {
                CounterKind::ActiveUsers => self.active_users = Some(value),
                CounterKind::Petitioners => self.petitioners = Some(value),
            },
            SyncEvent::Feed(status) => {
                self.feed_status = status;
            }
            SyncEvent::Verification(update) => {
                self.session.apply_verification(&update);
                if let Err(err) = self.session.save() {
                    tracing::error!("failed to persist session: {err:#}");
                }
                if update == VerificationUpdate::VerificationSuccess {
                    self.show_toast("✓ Account verified");
                }
            }
        }
    }

    /// Explicit clear (logout-equivalent): drop every store, forget the
    /// persisted identity, and disconnect the feed. Responses still in
    /// flight carry dead generations and fall on the floor.
    pub fn logout(&mut self) {
        if let Err(err) = self.session.clear() {
            tracing::error!("failed to clear session: {err:#}");
        }
        self.timelines.clear();
        self.circle.clear();
        self.blogs.clear();
        self.milestones.clear();
        self.active_users = None;
        self.petitioners = None;
        if let Some(feed) = &self.feed {
            feed.close();
        }
        self.show_toast("Signed out");
    }

    // ─────────────────────────────────────────────────────────────
    // Misc UI state
    // ─────────────────────────────────────────────────────────────

    /// Check if an action should be debounced
    /// Returns true if action should be blocked (too soon since last action)
    pub fn should_debounce_action(&mut self) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_action_time {
            if now.duration_since(last) < ACTION_DEBOUNCE {
                return true;
            }
        }
        self.last_action_time = Some(now);
        false
    }

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::new(message));
    }

    /// Advance spinner animation; drop expired toasts.
    pub fn tick_animation(&mut self) {
        self.animation_frame = self.animation_frame.wrapping_add(1);
        if self.toast.as_ref().is_some_and(|t| t.expired()) {
            self.toast = None;
        }
    }

    pub fn spinner(&self) -> char {
        const SPINNER: [char; 4] = ['◐', '◓', '◑', '◒'];
        SPINNER[self.animation_frame % SPINNER.len()]
    }

    pub fn uptime(&self) -> String {
        crate::tui::components::formatters::format_uptime(self.start_time.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{ProfileSnapshot, TimelinePage};
    use crate::store::SessionStore;

    fn snapshot(id: u64) -> ProfileSnapshot {
        ProfileSnapshot {
            id,
            name: format!("p{id}"),
            picture: None,
            children: 0,
            influence: 0,
            height: 0,
            weight: 0,
            depth: 0,
        }
    }

    fn test_app() -> (App, mpsc::Receiver<Command>) {
        let (commands_tx, commands_rx) = mpsc::channel(64);
        let mut session = SessionStore::load(std::env::temp_dir().join(format!(
            "agora-app-test-{}.json",
            crate::events::next_correlation()
        )));
        session.identity.user_id = Some(100);
        session.identity.name = Some("Sam".into());
        let app = App::new(
            Config::default(),
            LogBuffer::new(),
            commands_tx,
            None,
            session,
        );
        (app, commands_rx)
    }

    #[test]
    fn entering_timeline_view_fetches_the_first_page() {
        let (mut app, mut commands) = test_app();
        app.set_view(View::Timeline);

        match commands.try_recv().unwrap() {
            Command::FetchTimelinePage { number, page, .. } => {
                assert_eq!(number, 1);
                assert_eq!(page, 1);
            }
            other => panic!("expected a timeline fetch, got {other:?}"),
        }
    }

    #[test]
    fn counter_events_only_touch_their_own_counter() {
        let (mut app, _commands) = test_app();

        app.apply_sync(SyncEvent::Counter {
            kind: CounterKind::ActiveUsers,
            value: 12,
        });
        assert_eq!(app.active_users, Some(12));
        assert_eq!(app.petitioners, None);

        app.apply_sync(SyncEvent::Counter {
            kind: CounterKind::Petitioners,
            value: 9,
        });
        assert_eq!(app.active_users, Some(12));
        assert_eq!(app.petitioners, Some(9));
    }

    #[test]
    fn timeline_failure_counts_and_is_retryable() {
        let (mut app, mut commands) = test_app();
        app.set_view(View::Timeline);
        let generation = match commands.try_recv().unwrap() {
            Command::FetchTimelinePage { generation, .. } => generation,
            _ => unreachable!(),
        };

        app.apply_sync(SyncEvent::TimelineFailed {
            number: 1,
            generation,
            error: "boom".into(),
        });
        assert_eq!(app.stats.fetch_failures, 1);
        assert_eq!(
            app.timelines.get(1).unwrap().error.as_deref(),
            Some("boom")
        );

        // r retries the same page.
        app.refresh_current_view();
        assert!(matches!(
            commands.try_recv().unwrap(),
            Command::FetchTimelinePage { page: 1, .. }
        ));
    }

    #[test]
    fn logout_clears_stores_and_drops_late_responses() {
        let (mut app, mut commands) = test_app();
        app.set_view(View::Timeline);
        let generation = match commands.try_recv().unwrap() {
            Command::FetchTimelinePage { generation, .. } => generation,
            _ => unreachable!(),
        };

        app.logout();
        assert!(!app.session.identity.is_logged_in());
        assert!(app.timelines.get(1).is_none());

        // The response for the pre-logout fetch lands afterwards; the
        // cleared slot must not be resurrected.
        app.apply_sync(SyncEvent::TimelinePage {
            number: 1,
            generation,
            page: 1,
            response: TimelinePage {
                results: vec![snapshot(1)],
                count: 1,
                next: None,
                load: false,
                user_profile: None,
            },
        });
        assert!(app.timelines.get(1).is_none());
    }

    #[test]
    fn leaving_timeline_persists_the_scroll_offset() {
        let (mut app, mut commands) = test_app();
        app.set_view(View::Timeline);
        let generation = match commands.try_recv().unwrap() {
            Command::FetchTimelinePage { generation, .. } => generation,
            _ => unreachable!(),
        };
        app.apply_sync(SyncEvent::TimelinePage {
            number: 1,
            generation,
            page: 1,
            response: TimelinePage {
                results: (1..=5).map(snapshot).collect(),
                count: 5,
                next: None,
                load: false,
                user_profile: Some(snapshot(100)),
            },
        });

        app.set_view(View::Dashboard);
        assert!(app.timelines.get(1).unwrap().scroll_position.is_some());
    }
}
