// Events that flow between the sync layer and the TUI
//
// The stores live on the TUI side; background tasks never touch them
// directly. A fetch is issued as a Command on one channel and its result
// comes back as a SyncEvent on another, so all state transitions happen in
// one place. Using enums keeps the task boundary type-safe and lets the
// reducers pattern-match.

use crate::api::models::{
    Blog, BlogId, BlogKind, Contact, Conversation, Milestone, ProfileId, ProfileSnapshot,
    TimelinePage,
};
use serde::{Deserialize, Serialize};

/// The two live counters the activity feed drives.
///
/// A counter is only ever set from a frame tagged with the matching
/// update type; a mismatched frame never crosses over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterKind {
    ActiveUsers,
    Petitioners,
}

impl CounterKind {
    pub fn label(&self) -> &'static str {
        match self {
            CounterKind::ActiveUsers => "Active users",
            CounterKind::Petitioners => "Petitioners",
        }
    }
}

/// The freshness-gated entity lists in the circle view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircleList {
    Conversations,
    Contacts,
    CircleContacts,
}

impl CircleList {
    pub fn label(&self) -> &'static str {
        match self {
            CircleList::Conversations => "Conversations",
            CircleList::Contacts => "Contacts",
            CircleList::CircleContacts => "Circle contacts",
        }
    }
}

/// Optimistic blog reactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Like,
    Share,
}

/// Connection status of a live feed, rendered in the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    /// Dial in progress.
    Connecting,
    /// Socket open, frames flowing.
    Connected,
    /// Involuntary close; next attempt scheduled after the given delay.
    Reconnecting { attempt: u32, delay_ms: u64 },
    /// Intentional close (explicit, superseded, or inactivity). No retry.
    Disconnected,
    /// Connection-level error text for the status line.
    Error(String),
}

/// Status/verification frames from the waiting-page feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationUpdate {
    NoInitiatorStatus(bool),
    AdminVerification(bool),
    VerificationSuccess,
    CleanupAck,
}

/// A fetch the stores decided to issue. Consumed by the sync dispatcher.
///
/// Timeline commands carry the slot generation so a late response for a
/// cleared or replaced slot is recognizably stale and dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchTimelinePage {
        number: u32,
        owner: ProfileId,
        page: u32,
        generation: u64,
    },
    FetchTail {
        number: u32,
        profile_id: ProfileId,
        index: usize,
        generation: u64,
    },
    FetchCircle {
        list: CircleList,
    },
    FetchBlogs {
        kind: BlogKind,
    },
    React {
        blog_id: BlogId,
        kind: ReactionKind,
        correlation: u64,
    },
    FetchMilestones {
        user_id: ProfileId,
    },
}

/// A completed piece of background work, applied to the stores by the TUI.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A timeline head page arrived.
    TimelinePage {
        number: u32,
        generation: u64,
        page: u32,
        response: TimelinePage,
    },
    /// A head fetch failed; the cursor must not move.
    TimelineFailed {
        number: u32,
        generation: u64,
        error: String,
    },
    /// A path-shift subtree arrived.
    PathShifted {
        number: u32,
        generation: u64,
        index: usize,
        subtree: Vec<ProfileSnapshot>,
    },
    ShiftFailed {
        number: u32,
        generation: u64,
        error: String,
    },
    ConversationsLoaded {
        items: Vec<Conversation>,
    },
    ContactsLoaded {
        list: CircleList,
        items: Vec<Contact>,
    },
    CircleFailed {
        list: CircleList,
        error: String,
    },
    BlogsLoaded {
        kind: BlogKind,
        items: Vec<Blog>,
    },
    BlogsFailed {
        kind: BlogKind,
        error: String,
    },
    /// Authoritative entity for an optimistic reaction.
    ReactionResolved {
        correlation: u64,
        blog: Blog,
    },
    /// The reaction POST failed; the tentative patch rolls back.
    ReactionFailed {
        correlation: u64,
        error: String,
    },
    MilestonesLoaded {
        items: Vec<Milestone>,
    },
    MilestonesFailed {
        error: String,
    },
    /// A tagged counter frame from the activity feed.
    Counter {
        kind: CounterKind,
        value: u64,
    },
    /// Feed connection status changed.
    Feed(FeedStatus),
    /// A verification frame from the waiting-page feed.
    Verification(VerificationUpdate),
}

/// Helper to generate correlation ids for optimistic updates.
pub fn next_correlation() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}
