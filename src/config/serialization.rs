//! Config serialization to TOML
//!
//! Single source of truth for config file format. The template written on
//! first run is Config::default().to_toml(), so the file the user edits
//! always matches what the loader understands.

use super::Config;

impl Config {
    /// Serialize the effective configuration to a commented TOML document
    pub fn to_toml(&self) -> String {
        format!(
            r#"# agora configuration
# Values here are overridden by environment variables:
#   AGORA_API_URL, AGORA_WS_URL, AGORA_SESSION_FILE, AGORA_NO_TUI, AGORA_DEMO

# Base URL of the platform REST API
api_url = "{api_url}"

# Base URL of the platform WebSocket feeds
ws_url = "{ws_url}"

# Path of the persisted session identity file
session_file = "{session_file}"

[features]
# Live activity feed (dashboard counters over WebSocket)
activity_feed = {activity_feed}
# Blog panels with like/share
blogs = {blogs}
# Milestones panel
milestones = {milestones}
# Waiting-page verification watcher
verification = {verification}

[logging]
# Log level: trace, debug, info, warn, error
level = "{level}"
# Write log files in addition to the in-app logs panel
file_enabled = {file_enabled}
# Directory for log files
file_dir = "{file_dir}"
# Rotation: hourly, daily, never
file_rotation = "{file_rotation}"
# Prefix for log file names
file_prefix = "{file_prefix}"
"#,
            api_url = self.api_url,
            ws_url = self.ws_url,
            session_file = self.session_file.display(),
            activity_feed = self.features.activity_feed,
            blogs = self.features.blogs,
            milestones = self.features.milestones,
            verification = self.features.verification,
            level = self.logging.level,
            file_enabled = self.logging.file_enabled,
            file_dir = self.logging.file_dir.display(),
            file_rotation = self.logging.file_rotation.as_str(),
            file_prefix = self.logging.file_prefix,
        )
    }
}
