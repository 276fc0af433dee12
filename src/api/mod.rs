// Remote data client - thin authenticated wrapper over the platform REST API
//
// Every fetch thunk in the sync layer goes through this client. It owns a
// single reqwest::Client (connection pooling, gzip) plus the base URL and
// auth context, and parses responses with the strict schema in `models`.
//
// Error policy: callers receive anyhow::Result; they catch rejections and
// store the message in the relevant state slice. Nothing here panics.

pub mod models;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use models::{Blog, BlogId, BlogKind, Contact, Conversation, Milestone, ProfileId, TailResponse, TimelinePage};

/// Parse a response body against its documented schema.
///
/// A shape mismatch is always an error carrying the serde path. In debug
/// builds (outside tests) it additionally panics, so schema drift is caught
/// loudly during development instead of degrading into a guessed parse.
pub fn parse_strict<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T> {
    match serde_json::from_str::<T>(body) {
        Ok(value) => Ok(value),
        Err(err) => {
            tracing::error!("{endpoint} returned an unexpected shape: {err}");
            if cfg!(all(debug_assertions, not(test))) {
                panic!("{endpoint} returned an unexpected shape: {err}");
            }
            Err(err).with_context(|| format!("unexpected response shape from {endpoint}"))
        }
    }
}

/// Authenticated HTTP client for the platform REST API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client against `base_url` (no trailing slash), optionally
    /// carrying a bearer token from the stored session.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// GET `path` and strictly parse the JSON body as `T`.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .request(reqwest::Method::GET, path)
            .send()
            .await
            .with_context(|| format!("GET {path} failed"))?
            .error_for_status()
            .with_context(|| format!("GET {path} returned an error status"))?;

        let body = response
            .text()
            .await
            .with_context(|| format!("GET {path}: failed to read body"))?;
        parse_strict(path, &body)
    }

    /// POST to `path` with an empty body and strictly parse the JSON response.
    async fn post_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .request(reqwest::Method::POST, path)
            .send()
            .await
            .with_context(|| format!("POST {path} failed"))?
            .error_for_status()
            .with_context(|| format!("POST {path} returned an error status"))?;

        let body = response
            .text()
            .await
            .with_context(|| format!("POST {path}: failed to read body"))?;
        parse_strict(path, &body)
    }

    /// Fetch one page of a timeline head (ancestor chain).
    pub async fn timeline_page(&self, owner: ProfileId, page: u32) -> Result<TimelinePage> {
        self.get_json(&format!("/api/users/timeline/{owner}/?page={page}"))
            .await
    }

    /// Fetch the descendant subtree rooted at `profile_id` for a path shift.
    pub async fn timeline_tail(&self, profile_id: ProfileId) -> Result<Vec<models::ProfileSnapshot>> {
        let response: TailResponse = self
            .get_json(&format!("/api/users/timeline/tail/{profile_id}/"))
            .await?;
        Ok(response.results)
    }

    /// Fetch all blogs of one category.
    pub async fn blogs(&self, kind: BlogKind) -> Result<Vec<Blog>> {
        self.get_json(&format!("/api/blog/{}-blogs/", kind.path_segment()))
            .await
    }

    /// Like a blog. Returns the authoritative entity.
    pub async fn like_blog(&self, id: BlogId) -> Result<Blog> {
        self.post_json(&format!("/api/blog/blogs/{id}/like/")).await
    }

    /// Share a blog. Returns the authoritative entity.
    pub async fn share_blog(&self, id: BlogId) -> Result<Blog> {
        self.post_json(&format!("/api/blog/blogs/{id}/share/")).await
    }

    /// Fetch the conversation list.
    pub async fn chat_list(&self) -> Result<Vec<Conversation>> {
        self.get_json("/api/chat/chatlist/").await
    }

    /// Fetch the contact list.
    pub async fn contacts(&self) -> Result<Vec<Contact>> {
        self.get_json("/api/chat/contacts/").await
    }

    /// Fetch the circle contact list.
    pub async fn circle_contacts(&self) -> Result<Vec<Contact>> {
        self.get_json("/api/blog/circle-contacts/").await
    }

    /// Fetch a user's milestones.
    pub async fn milestones(&self, user_id: ProfileId) -> Result<Vec<Milestone>> {
        self.get_json(&format!("/api/users/milestones/?user_id={user_id}"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strict_accepts_matching_shape() {
        let parsed: Vec<u32> = parse_strict("/test", "[1, 2, 3]").unwrap();
        assert_eq!(parsed, vec![1, 2, 3]);
    }

    #[test]
    fn parse_strict_reports_endpoint_on_mismatch() {
        let err = parse_strict::<Vec<u32>>("/api/blog/news-blogs/", "{}").unwrap_err();
        assert!(format!("{err:#}").contains("/api/blog/news-blogs/"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("https://example.org/", None).unwrap();
        assert_eq!(client.base_url, "https://example.org");
    }
}
