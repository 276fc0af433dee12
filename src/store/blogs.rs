// Blog store with optimistic reactions
//
// Each category keeps its own entity cache. A like or share is reflected
// immediately: the entity gets a local tentative patch tagged with a
// correlation id, the POST goes out, and the authoritative response
// replaces the entity wholesale. A failed POST rolls the patch back to the
// snapshot taken when it was applied. Reactions for the same blog are
// coalesced while one is in flight.

use crate::api::models::{Blog, BlogId, BlogKind};
use crate::events::{next_correlation, Command, ReactionKind};
use crate::store::cache::EntityCache;
use std::collections::HashMap;

/// A reaction that has been applied locally but not yet confirmed.
#[derive(Debug, Clone)]
struct PendingReaction {
    blog_id: BlogId,
    kind: BlogKind,
    /// Entity as it was before the tentative patch, for rollback.
    prior: Blog,
}

#[derive(Debug, Default)]
pub struct BlogStore {
    news: EntityCache<Blog>,
    circle: EntityCache<Blog>,
    petition: EntityCache<Blog>,
    pending: HashMap<u64, PendingReaction>,
}

impl BlogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self, kind: BlogKind) -> &EntityCache<Blog> {
        match kind {
            BlogKind::News => &self.news,
            BlogKind::Circle => &self.circle,
            BlogKind::Petition => &self.petition,
        }
    }

    fn cache_mut(&mut self, kind: BlogKind) -> &mut EntityCache<Blog> {
        match kind {
            BlogKind::News => &mut self.news,
            BlogKind::Circle => &mut self.circle,
            BlogKind::Petition => &mut self.petition,
        }
    }

    /// Issue a fetch for one category unless it is fresh or in flight.
    pub fn fetch(&mut self, kind: BlogKind, force: bool) -> Option<Command> {
        self.cache_mut(kind)
            .request(force)
            .then_some(Command::FetchBlogs { kind })
    }

    pub fn apply_fetch(&mut self, kind: BlogKind, items: Vec<Blog>) {
        self.cache_mut(kind).apply(items);
    }

    pub fn fetch_failed(&mut self, kind: BlogKind, error: String) {
        self.cache_mut(kind).fail(error);
    }

    /// React to a blog: apply the tentative patch and return the POST to
    /// issue. Returns None when the blog is unknown or a reaction for it
    /// is already in flight (coalesced).
    pub fn react(&mut self, kind: BlogKind, blog_id: BlogId, reaction: ReactionKind) -> Option<Command> {
        if self.pending.values().any(|p| p.blog_id == blog_id) {
            return None;
        }
        let cache = self.cache_mut(kind);
        let prior = cache.get(blog_id)?.clone();

        let mut patched = prior.clone();
        match reaction {
            ReactionKind::Like => patched.likes += 1,
            ReactionKind::Share => patched.shares += 1,
        }
        cache.insert(patched);

        let correlation = next_correlation();
        self.pending.insert(
            correlation,
            PendingReaction {
                blog_id,
                kind,
                prior,
            },
        );
        Some(Command::React {
            blog_id,
            kind: reaction,
            correlation,
        })
    }

    /// The POST succeeded: replace the entity with the server's truth.
    pub fn resolve_reaction(&mut self, correlation: u64, blog: Blog) {
        let Some(pending) = self.pending.remove(&correlation) else {
            tracing::debug!("reaction {correlation} resolved with no pending patch");
            return;
        };
        self.cache_mut(pending.kind).insert(blog);
    }

    /// The POST failed: restore the pre-patch entity.
    pub fn roll_back_reaction(&mut self, correlation: u64, error: &str) {
        let Some(pending) = self.pending.remove(&correlation) else {
            return;
        };
        tracing::warn!("reaction on blog {} failed: {error}", pending.blog_id);
        let prior = pending.prior.clone();
        let cache = self.cache_mut(pending.kind);
        cache.insert(prior);
        cache.error = Some(error.to_string());
    }

    pub fn clear(&mut self) {
        self.news.clear();
        self.circle.clear();
        self.petition.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Command;

    fn blog(id: BlogId, likes: u32, shares: u32) -> Blog {
        Blog {
            id,
            title: format!("blog-{id}"),
            body: None,
            author: None,
            likes,
            shares,
            created_at: None,
        }
    }

    fn seeded() -> BlogStore {
        let mut store = BlogStore::new();
        assert!(store.fetch(BlogKind::News, false).is_some());
        store.apply_fetch(BlogKind::News, vec![blog(1, 10, 2), blog(2, 0, 0)]);
        store
    }

    #[test]
    fn like_applies_tentative_patch_and_issues_post() {
        let mut store = seeded();

        let cmd = store.react(BlogKind::News, 1, ReactionKind::Like).unwrap();
        assert!(matches!(cmd, Command::React { blog_id: 1, .. }));
        assert_eq!(store.cache(BlogKind::News).get(1).unwrap().likes, 11);
    }

    #[test]
    fn resolve_replaces_with_authoritative_entity() {
        let mut store = seeded();
        let cmd = store.react(BlogKind::News, 1, ReactionKind::Like).unwrap();
        let Command::React { correlation, .. } = cmd else {
            unreachable!()
        };

        // Server says someone else liked it in the meantime too.
        store.resolve_reaction(correlation, blog(1, 12, 2));
        assert_eq!(store.cache(BlogKind::News).get(1).unwrap().likes, 12);
    }

    #[test]
    fn failure_rolls_back_to_prior_entity() {
        let mut store = seeded();
        let cmd = store.react(BlogKind::News, 1, ReactionKind::Share).unwrap();
        let Command::React { correlation, .. } = cmd else {
            unreachable!()
        };
        assert_eq!(store.cache(BlogKind::News).get(1).unwrap().shares, 3);

        store.roll_back_reaction(correlation, "403 forbidden");
        let restored = store.cache(BlogKind::News).get(1).unwrap();
        assert_eq!(restored.shares, 2);
        assert_eq!(restored.likes, 10);
    }

    #[test]
    fn in_flight_reactions_are_coalesced_per_blog() {
        let mut store = seeded();
        assert!(store.react(BlogKind::News, 1, ReactionKind::Like).is_some());
        assert!(store.react(BlogKind::News, 1, ReactionKind::Like).is_none());
        // A different blog is unaffected.
        assert!(store.react(BlogKind::News, 2, ReactionKind::Like).is_some());
    }

    #[test]
    fn unknown_blog_is_ignored() {
        let mut store = seeded();
        assert!(store.react(BlogKind::News, 99, ReactionKind::Like).is_none());
    }
}
