// Wire models for the platform REST API
//
// One documented schema per endpoint. Every struct derives a strict
// deserializer (`deny_unknown_fields`), so a server-side shape change
// surfaces as a parse error naming the offending field instead of being
// silently absorbed. See `api::parse_strict` for how mismatches are handled
// in debug vs release builds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for a profile (timeline node, contact, author).
pub type ProfileId = u64;

/// Identifier for a blog post.
pub type BlogId = u64;

/// A single node in a lineage timeline: one person, with the small fixed
/// set of numeric attributes the timeline view renders.
///
/// Snapshots are immutable once fetched; an updated profile arrives as a
/// full replacement, never a partial patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileSnapshot {
    pub id: ProfileId,
    pub name: String,
    pub picture: Option<String>,
    pub children: u32,
    pub influence: u32,
    pub height: u32,
    pub weight: u32,
    pub depth: u32,
}

/// One page of a timeline head (ancestor chain).
///
/// `GET /api/users/timeline/{owner_id}/?page=N`
///
/// `next` is the server's cursor signal: present means more pages exist,
/// absent means this was the last page. `user_profile` is only populated on
/// the first page and seeds the timeline tail with the subject's own node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimelinePage {
    pub results: Vec<ProfileSnapshot>,
    /// Total number of head entries on the server.
    pub count: usize,
    /// Opaque link to the next page; `None` means exhausted.
    pub next: Option<String>,
    /// Server hint that more content is immediately loadable.
    #[serde(default)]
    pub load: bool,
    /// The subject's own profile, present on the first page only.
    #[serde(default)]
    pub user_profile: Option<ProfileSnapshot>,
}

/// Subtree response for a path shift.
///
/// `GET /api/users/timeline/tail/{profile_id}/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TailResponse {
    pub results: Vec<ProfileSnapshot>,
}

/// Blog categories the platform serves, each from its own endpoint
/// (`GET /api/blog/{type}-blogs/`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlogKind {
    News,
    Circle,
    Petition,
}

impl BlogKind {
    /// The `{type}` path segment for this category's endpoint.
    pub fn path_segment(&self) -> &'static str {
        match self {
            BlogKind::News => "news",
            BlogKind::Circle => "circle",
            BlogKind::Petition => "petition",
        }
    }

    /// Display name for panel titles.
    pub fn label(&self) -> &'static str {
        match self {
            BlogKind::News => "News",
            BlogKind::Circle => "Circle",
            BlogKind::Petition => "Petitions",
        }
    }
}

/// A blog post with its reaction counts.
///
/// Like/share POSTs return the authoritative entity, which replaces any
/// optimistic local patch wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Blog {
    pub id: BlogId,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    pub likes: u32,
    pub shares: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A conversation summary from the chat list.
///
/// `GET /api/chat/chatlist/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Conversation {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub unread: u32,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A contact entry (plain contacts and circle contacts share this shape).
///
/// `GET /api/chat/contacts/` and `GET /api/blog/circle-contacts/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Contact {
    pub id: ProfileId,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
}

/// A milestone achieved by a user.
///
/// `GET /api/users/milestones/?user_id=N`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Milestone {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub achieved_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_page_parses_documented_shape() {
        let body = r#"{
            "results": [
                {"id": 7, "name": "Ada", "picture": null,
                 "children": 2, "influence": 40, "height": 3, "weight": 9, "depth": 1}
            ],
            "count": 12,
            "next": "/api/users/timeline/3/?page=2",
            "load": true,
            "user_profile": {"id": 3, "name": "Sam", "picture": "sam.png",
                             "children": 0, "influence": 5, "height": 1, "weight": 2, "depth": 0}
        }"#;
        let page: TimelinePage = serde_json::from_str(body).unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.count, 12);
        assert!(page.next.is_some());
        assert_eq!(page.user_profile.unwrap().name, "Sam");
    }

    #[test]
    fn timeline_page_rejects_unknown_fields() {
        let body = r#"{"results": [], "count": 0, "next": null, "surprise": 1}"#;
        let err = serde_json::from_str::<TimelinePage>(body).unwrap_err();
        assert!(err.to_string().contains("surprise"));
    }

    #[test]
    fn profile_snapshot_rejects_missing_attributes() {
        // A snapshot without its numeric attributes is a schema violation,
        // not a partially-filled node.
        let body = r#"{"id": 1, "name": "Ada"}"#;
        assert!(serde_json::from_str::<ProfileSnapshot>(body).is_err());
    }

    #[test]
    fn blog_kind_path_segments() {
        assert_eq!(BlogKind::News.path_segment(), "news");
        assert_eq!(BlogKind::Circle.path_segment(), "circle");
        assert_eq!(BlogKind::Petition.path_segment(), "petition");
    }

    #[test]
    fn optional_fields_default() {
        let body = r#"{"id": 4, "title": "March update", "likes": 3, "shares": 1}"#;
        let blog: Blog = serde_json::from_str(body).unwrap();
        assert!(blog.body.is_none());
        assert!(blog.created_at.is_none());
    }
}
