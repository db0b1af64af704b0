//! The watch page: one video, its likes and subscribers, related videos and comments.

use crate::api::{ApiClient, ApiError, Comment, LikeTarget, Video};
use crate::reconcile::{ListView, Reconciliation, ToggleState, mutate_then_reconcile};
use tracing::instrument;

/// How many videos the related column shows.
const RELATED_VIDEOS: usize = 6;

/// How many comments are shown before the list is expanded.
const COLLAPSED_COMMENTS: usize = 3;

/// State of the watch page.
#[derive(Debug)]
pub struct WatchController {
    api: ApiClient,
    video: Option<Video>,
    /// Set when the video itself could not be loaded.
    error: Option<String>,
    loading: bool,
    like: ToggleState,
    subscription: ToggleState,
    /// Set when a like or subscribe request failed.
    action_error: Option<String>,
    related: ListView<Video>,
    comments: ListView<Comment>,
    show_all_comments: bool,
}

impl WatchController {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            video: None,
            error: None,
            loading: false,
            like: ToggleState::default(),
            subscription: ToggleState::default(),
            action_error: None,
            related: ListView::new(),
            comments: ListView::new(),
            show_all_comments: false,
        }
    }

    /// Loads everything the page shows for `video_id`.
    ///
    /// Only a failure to load the video itself is a page error; related videos and comments
    /// that fail to load are simply left empty. Nothing shown for a previous video survives
    /// loading a different one.
    #[instrument(skip(self))]
    pub async fn load(&mut self, video_id: &str) {
        if self.video.as_ref().is_none_or(|v| v.id != video_id) {
            *self = Self::new(self.api.clone());
        }
        self.loading = true;
        match self.api.watch_page(video_id).await {
            Ok(page) => {
                self.like = ToggleState::new(page.is_liked, page.total_likes);
                self.subscription = ToggleState::new(page.is_subscribed, page.total_subscribers);
                self.video = Some(page.video);
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load video");
                self.video = None;
                self.error = Some(format!("Failed to load video: {e}"));
            }
        }
        self.loading = false;

        let api = &self.api;
        self.related
            .load(async {
                let mut videos = api.list_videos().await?;
                videos.truncate(RELATED_VIDEOS);
                Ok::<_, ApiError>(videos)
            })
            .await;
        self.comments.load(api.list_comments(video_id)).await;
    }

    pub fn video(&self) -> Option<&Video> {
        self.video.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the viewer likes the video, and its like count.
    pub fn like(&self) -> ToggleState {
        self.like
    }

    /// Whether the viewer follows the uploader, and the uploader's subscriber count.
    pub fn subscription(&self) -> ToggleState {
        self.subscription
    }

    pub fn action_error(&self) -> Option<&str> {
        self.action_error.as_deref()
    }

    pub fn related(&self) -> &ListView<Video> {
        &self.related
    }

    pub fn comments(&self) -> &ListView<Comment> {
        &self.comments
    }

    /// The comments currently on screen: the first few unless expanded.
    pub fn displayed_comments(&self) -> &[Comment] {
        let comments = self.comments.items();
        if self.show_all_comments {
            comments
        } else {
            &comments[..comments.len().min(COLLAPSED_COMMENTS)]
        }
    }

    pub fn show_all_comments(&mut self, show: bool) {
        self.show_all_comments = show;
    }

    fn video_id(&self) -> Result<String, ApiError> {
        self.video
            .as_ref()
            .map(|v| v.id.clone())
            .ok_or_else(|| ApiError::local("no video loaded"))
    }

    fn record(&mut self, result: Result<(), ApiError>) {
        match result {
            Ok(()) => self.action_error = None,
            Err(e) => {
                tracing::warn!(error = %e, "watch page action failed");
                self.action_error = Some(e.message);
            }
        }
    }

    /// Likes or unlikes the video once the server confirms.
    #[instrument(skip(self))]
    pub async fn toggle_like(&mut self) {
        let result = match self.video_id() {
            Ok(id) => {
                self.like
                    .toggle(self.api.toggle_like(LikeTarget::Video, &id))
                    .await
            }
            Err(e) => Err(e),
        };
        self.record(result);
    }

    /// Subscribes to or unsubscribes from the uploader once the server confirms.
    #[instrument(skip(self))]
    pub async fn toggle_subscribe(&mut self) {
        let owner = self
            .video
            .as_ref()
            .and_then(Video::owner_id)
            .map(str::to_string)
            .ok_or_else(|| ApiError::local("video has no known uploader"));
        let result = match owner {
            Ok(owner) => {
                self.subscription
                    .toggle(self.api.toggle_subscription(&owner))
                    .await
            }
            Err(e) => Err(e),
        };
        self.record(result);
    }

    /// Posts a comment and shows it first. Blank comments are ignored.
    #[instrument(skip(self, content))]
    pub async fn add_comment(&mut self, content: &str) -> bool {
        if content.trim().is_empty() {
            return false;
        }
        let Ok(video_id) = self.video_id() else {
            return false;
        };
        let api = &self.api;
        mutate_then_reconcile(
            &mut self.comments,
            api.add_comment(&video_id, content),
            |comment, _| Reconciliation::Prepend(comment),
            async || api.list_comments(&video_id).await,
        )
        .await
    }

    /// Replaces a comment's text. Blank edits are ignored.
    #[instrument(skip(self, content))]
    pub async fn edit_comment(&mut self, comment_id: &str, content: &str) -> bool {
        if content.trim().is_empty() {
            return false;
        }
        let Ok(video_id) = self.video_id() else {
            return false;
        };
        let api = &self.api;
        mutate_then_reconcile(
            &mut self.comments,
            api.edit_comment(comment_id, content),
            |comment, _| Reconciliation::Replace(comment),
            async || api.list_comments(&video_id).await,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_comment(&mut self, comment_id: &str) -> bool {
        let Ok(video_id) = self.video_id() else {
            return false;
        };
        let api = &self.api;
        mutate_then_reconcile(
            &mut self.comments,
            api.delete_comment(comment_id),
            |(), _| Reconciliation::Remove(comment_id.to_string()),
            async || api.list_comments(&video_id).await,
        )
        .await
    }

    /// Likes or unlikes a comment, then replaces it with its confirmed like state.
    #[instrument(skip(self))]
    pub async fn toggle_comment_like(&mut self, comment_id: &str) -> bool {
        let Ok(video_id) = self.video_id() else {
            return false;
        };
        let api = &self.api;
        mutate_then_reconcile(
            &mut self.comments,
            api.toggle_like(LikeTarget::Comment, comment_id),
            |reported, comments| {
                let Some(comment) = comments.iter().find(|c| c.id == comment_id) else {
                    return Reconciliation::Keep;
                };
                let mut like = ToggleState::new(comment.is_liked, comment.like_count);
                like.confirm(reported);
                Reconciliation::Replace(Comment {
                    is_liked: like.active,
                    like_count: like.count,
                    ..comment.clone()
                })
            },
            async || api.list_comments(&video_id).await,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockApi;
    use http::Method;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn watching(api: &MockApi, liked: bool, likes: u64) -> WatchController {
        api.respond(
            Method::GET,
            "/video/v1",
            200,
            json!({
                "data": { "_id": "v1", "title": "Intro", "owner": { "_id": "u9", "userName": "owner" } },
                "isLiked": liked,
                "totalLikes": likes,
                "isSubscribed": false,
                "totalSubscribers": 41,
            }),
        )
        .await;
        api.respond(
            Method::GET,
            "/video/all",
            200,
            json!({ "data": (0..8).map(|i| json!({ "_id": format!("r{i}") })).collect::<Vec<_>>() }),
        )
        .await;
        api.respond(
            Method::GET,
            "/comment/v1",
            200,
            json!({ "data": [
                { "_id": "c1", "content": "first", "likeCount": 2, "isLiked": false },
                { "_id": "c2", "content": "second", "likeCount": 0 },
                { "_id": "c3", "content": "third" },
                { "_id": "c4", "content": "fourth" },
            ] }),
        )
        .await;
        let mut page = WatchController::new(api.client());
        page.load("v1").await;
        page
    }

    fn comment_ids(page: &WatchController) -> Vec<&str> {
        page.comments()
            .items()
            .iter()
            .map(|c| c.id.as_str())
            .collect()
    }

    #[tokio::test]
    async fn loads_video_related_and_comments() {
        let api = MockApi::start().await.unwrap();
        let mut page = watching(&api, false, 7).await;
        assert_eq!(page.video().unwrap().title, "Intro");
        assert_eq!(page.like(), ToggleState::new(false, 7));
        assert_eq!(page.subscription(), ToggleState::new(false, 41));
        assert_eq!(page.related().len(), 6);
        assert_eq!(page.displayed_comments().len(), 3);
        page.show_all_comments(true);
        assert_eq!(page.displayed_comments().len(), 4);
    }

    #[tokio::test]
    async fn confirmed_like_increments_once() {
        let api = MockApi::start().await.unwrap();
        let mut page = watching(&api, false, 7).await;
        api.respond(Method::POST, "/like/video/v1", 200, json!({ "data": {} }))
            .await;

        page.toggle_like().await;
        assert_eq!(page.like(), ToggleState::new(true, 8));
        assert_eq!(page.action_error(), None);
    }

    #[tokio::test]
    async fn failed_like_changes_nothing() {
        let api = MockApi::start().await.unwrap();
        let mut page = watching(&api, false, 7).await;
        api.respond(Method::POST, "/like/video/v1", 500, json!({ "message": "nope" }))
            .await;

        page.toggle_like().await;
        assert_eq!(page.like(), ToggleState::new(false, 7));
        assert_eq!(page.action_error(), Some("nope"));
    }

    #[tokio::test]
    async fn subscribe_targets_the_uploader() {
        let api = MockApi::start().await.unwrap();
        let mut page = watching(&api, false, 7).await;
        api.respond(
            Method::POST,
            "/subscription/u9",
            200,
            json!({ "data": { "subscribed": true } }),
        )
        .await;

        page.toggle_subscribe().await;
        assert_eq!(page.subscription(), ToggleState::new(true, 42));
    }

    #[tokio::test]
    async fn comment_lifecycle() {
        let api = MockApi::start().await.unwrap();
        let mut page = watching(&api, false, 7).await;
        api.respond(
            Method::POST,
            "/comment/v1",
            201,
            json!({ "data": { "_id": "c0", "content": "new one" } }),
        )
        .await;
        api.respond(
            Method::PATCH,
            "/comment/c2",
            200,
            json!({ "data": { "_id": "c2", "content": "edited", "likeCount": 0 } }),
        )
        .await;
        api.respond(Method::DELETE, "/comment/c3", 200, json!({ "data": {} }))
            .await;

        assert!(!page.add_comment("   ").await);
        assert_eq!(api.request_count(Method::POST, "/comment/v1").await, 0);

        assert!(page.add_comment("new one").await);
        assert!(page.edit_comment("c2", "edited").await);
        assert!(page.delete_comment("c3").await);
        assert_eq!(comment_ids(&page), ["c0", "c1", "c2", "c4"]);
        assert_eq!(page.comments().get("c2").unwrap().content, "edited");
    }

    #[tokio::test]
    async fn failed_delete_keeps_comment() {
        let api = MockApi::start().await.unwrap();
        let mut page = watching(&api, false, 7).await;
        api.respond(
            Method::DELETE,
            "/comment/c1",
            403,
            json!({ "message": "not your comment" }),
        )
        .await;

        assert!(!page.delete_comment("c1").await);
        assert_eq!(comment_ids(&page), ["c1", "c2", "c3", "c4"]);
        assert_eq!(page.comments().error(), Some("not your comment"));
    }

    #[tokio::test]
    async fn comment_like_uses_server_state() {
        let api = MockApi::start().await.unwrap();
        let mut page = watching(&api, false, 7).await;
        api.respond(
            Method::POST,
            "/like/comment/c1",
            200,
            json!({ "data": { "isLiked": true } }),
        )
        .await;

        assert!(page.toggle_comment_like("c1").await);
        let c1 = page.comments().get("c1").unwrap();
        assert!(c1.is_liked);
        assert_eq!(c1.like_count, 3);
        assert_eq!(page.comments().get("c2").unwrap().like_count, 0);
    }

    #[tokio::test]
    async fn missing_video_is_a_page_error() {
        let api = MockApi::start().await.unwrap();
        let mut page = WatchController::new(api.client());
        page.load("gone").await;
        assert!(page.video().is_none());
        insta::assert_snapshot!(page.error().unwrap(), @"Failed to load video: no such route");

        page.toggle_like().await;
        assert_eq!(page.action_error(), Some("no video loaded"));
    }

    #[tokio::test]
    async fn switching_video_drops_previous_state() {
        let api = MockApi::start().await.unwrap();
        let mut page = watching(&api, true, 7).await;
        page.show_all_comments(true);
        assert_eq!(page.comments().len(), 4);

        api.respond(Method::GET, "/video/v2", 404, json!({ "message": "Video not found" }))
            .await;
        api.respond(Method::GET, "/video/all", 500, json!({ "message": "db down" }))
            .await;
        api.respond(Method::GET, "/comment/v2", 500, json!({ "message": "db down" }))
            .await;
        page.load("v2").await;

        assert!(page.video().is_none());
        assert!(page.error().is_some());
        assert_eq!(page.like(), ToggleState::default());
        assert_eq!(page.subscription(), ToggleState::default());
        assert!(page.related().is_empty());
        assert!(page.comments().is_empty());
        assert_eq!(page.displayed_comments().len(), 0);
    }
}
