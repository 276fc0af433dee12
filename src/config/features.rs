//! Feature flags configuration
//!
//! Feature flags for optional modules (opt-out: default enabled).

use serde::Deserialize;

/// Feature flags for optional modules (opt-out: default enabled)
#[derive(Debug, Clone)]
pub struct Features {
    /// Live activity feed: socket connection driving the dashboard counters
    pub activity_feed: bool,

    /// Blog panels: per-category lists with like/share
    pub blogs: bool,

    /// Milestones panel on the dashboard
    pub milestones: bool,

    /// Waiting-page verification watcher (only relevant pre-verification)
    pub verification: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            activity_feed: true,
            blogs: true,
            milestones: true,
            verification: true,
        }
    }
}

/// Feature flags as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileFeatures {
    pub activity_feed: Option<bool>,
    pub blogs: Option<bool>,
    pub milestones: Option<bool>,
    pub verification: Option<bool>,
}

impl Features {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileFeatures>) -> Self {
        let file = file.unwrap_or_default();

        Self {
            activity_feed: file.activity_feed.unwrap_or(true),
            blogs: file.blogs.unwrap_or(true),
            milestones: file.milestones.unwrap_or(true),
            verification: file.verification.unwrap_or(true),
        }
    }
}
