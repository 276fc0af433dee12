// Milestone store
//
// One freshness-gated list per signed-in user. Switching users resets the
// cache so another subject's milestones never bleed through.

use crate::api::models::{Milestone, ProfileId};
use crate::events::Command;
use crate::store::cache::EntityCache;

#[derive(Debug, Default)]
pub struct MilestoneStore {
    user_id: Option<ProfileId>,
    pub cache: EntityCache<Milestone>,
}

impl MilestoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fetch for `user_id`'s milestones. A user change bypasses
    /// the freshness window by resetting the cache first.
    pub fn fetch(&mut self, user_id: ProfileId, force: bool) -> Option<Command> {
        if self.user_id != Some(user_id) {
            self.cache.clear();
            self.user_id = Some(user_id);
        }
        self.cache
            .request(force)
            .then_some(Command::FetchMilestones { user_id })
    }

    pub fn apply(&mut self, items: Vec<Milestone>) {
        self.cache.apply(items);
    }

    pub fn fetch_failed(&mut self, error: String) {
        self.cache.fail(error);
    }

    pub fn clear(&mut self) {
        self.user_id = None;
        self.cache.clear();
    }
}
