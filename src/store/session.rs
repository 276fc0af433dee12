// Session store - persisted client identity
//
// The identity keys the platform hands out at login (user id, email,
// display name, picture, user type, verification flags) persist across
// runs in a small JSON file next to the config. There is no schema
// versioning; unknown or missing keys simply read as None. A missing or
// unreadable file degrades to the logged-out state, never an error the
// caller has to handle.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::api::models::ProfileId;
use crate::events::VerificationUpdate;

/// The identity keys persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: Option<ProfileId>,
    pub user_email: Option<String>,
    pub name: Option<String>,
    pub profile_pic: Option<String>,
    pub user_type: Option<String>,
    pub no_initiator_status: Option<bool>,
    pub notification_id: Option<u64>,
}

impl SessionIdentity {
    /// Logged in means we at least know who the user is.
    pub fn is_logged_in(&self) -> bool {
        self.user_id.is_some()
    }
}

/// Loads, mutates, and persists the session identity file.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    pub identity: SessionIdentity,
}

impl SessionStore {
    /// Load the session from `path`. An absent or malformed file yields a
    /// logged-out session; the malformed case is logged and kept on disk
    /// untouched until the next save.
    pub fn load(path: PathBuf) -> Self {
        let identity = match fs::read_to_string(&path) {
            Ok(body) => match serde_json::from_str(&body) {
                Ok(identity) => identity,
                Err(err) => {
                    tracing::warn!("session file {path:?} is malformed ({err}); starting logged out");
                    SessionIdentity::default()
                }
            },
            Err(_) => SessionIdentity::default(),
        };
        Self { path, identity }
    }

    /// Persist the current identity.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).context("failed to create session directory")?;
        }
        let body =
            serde_json::to_string_pretty(&self.identity).context("failed to serialize session")?;
        fs::write(&self.path, body).context("failed to write session file")?;
        Ok(())
    }

    /// Fold a verification frame into the stored flags.
    pub fn apply_verification(&mut self, update: &VerificationUpdate) {
        match update {
            VerificationUpdate::NoInitiatorStatus(status) => {
                self.identity.no_initiator_status = Some(*status);
            }
            VerificationUpdate::AdminVerification(verified) => {
                if *verified {
                    self.identity.user_type = Some("verified".to_string());
                }
            }
            VerificationUpdate::VerificationSuccess => {
                self.identity.no_initiator_status = Some(false);
                self.identity.user_type = Some("verified".to_string());
            }
            VerificationUpdate::CleanupAck => {}
        }
    }

    /// Logout: drop the identity and remove the file.
    pub fn clear(&mut self) -> Result<()> {
        self.identity = SessionIdentity::default();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).context("failed to remove session file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_session_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "agora-session-test-{tag}-{}.json",
            std::process::id()
        ))
    }

    #[test]
    fn missing_file_reads_as_logged_out() {
        let store = SessionStore::load(temp_session_path("missing"));
        assert!(!store.identity.is_logged_in());
    }

    #[test]
    fn identity_round_trips_through_disk() {
        let path = temp_session_path("roundtrip");
        let mut store = SessionStore::load(path.clone());
        store.identity = SessionIdentity {
            user_id: Some(42),
            user_email: Some("sam@example.org".into()),
            name: Some("Sam".into()),
            profile_pic: Some("sam.png".into()),
            user_type: Some("member".into()),
            no_initiator_status: Some(true),
            notification_id: Some(7),
        };
        store.save().unwrap();

        let reloaded = SessionStore::load(path.clone());
        assert_eq!(reloaded.identity, store.identity);

        fs::remove_file(path).ok();
    }

    #[test]
    fn malformed_file_degrades_to_logged_out() {
        let path = temp_session_path("malformed");
        fs::write(&path, "{not json").unwrap();

        let store = SessionStore::load(path.clone());
        assert!(!store.identity.is_logged_in());

        fs::remove_file(path).ok();
    }

    #[test]
    fn verification_success_updates_flags() {
        let mut store = SessionStore::load(temp_session_path("verify"));
        store.identity.no_initiator_status = Some(true);

        store.apply_verification(&VerificationUpdate::VerificationSuccess);
        assert_eq!(store.identity.no_initiator_status, Some(false));
        assert_eq!(store.identity.user_type.as_deref(), Some("verified"));
    }

    #[test]
    fn clear_removes_identity_and_file() {
        let path = temp_session_path("clear");
        let mut store = SessionStore::load(path.clone());
        store.identity.user_id = Some(1);
        store.save().unwrap();

        store.clear().unwrap();
        assert!(!store.identity.is_logged_in());
        assert!(!path.exists());
    }
}
