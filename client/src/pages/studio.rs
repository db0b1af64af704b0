//! Editing the signed-in user's own channel: profile, images and uploaded videos.

use super::Feedback;
use crate::api::{ApiClient, ApiError, MediaFile, ProfileUpdate, User, Video, VideoEdit};
use crate::reconcile::{ListView, Reconciliation, mutate_then_reconcile};
use crate::session::SessionStore;
use crate::validation::{self, Field};
use tracing::instrument;

/// State of the channel editor.
#[derive(Debug)]
pub struct StudioController {
    api: ApiClient,
    session: SessionStore,
    profile: Option<User>,
    videos: ListView<Video>,
    loading: bool,
    saving: bool,
    error: Option<String>,
    feedback: Option<Feedback>,
}

impl StudioController {
    /// Creates an editor for whoever is signed in to `session`.
    pub fn new(session: SessionStore) -> Self {
        Self {
            api: session.api().clone(),
            session,
            profile: None,
            videos: ListView::new(),
            loading: false,
            saving: false,
            error: None,
            feedback: None,
        }
    }

    /// Loads the signed-in user's channel.
    #[instrument(skip(self))]
    pub async fn load(&mut self) {
        let Some(user) = self.session.current_user().await else {
            self.error = Some("You need to be signed in to edit your channel".to_string());
            return;
        };

        self.loading = true;
        match self.api.channel(&user.id).await {
            Ok(channel) => {
                self.profile = Some(channel.owner);
                self.videos.replace_all(channel.videos);
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load own channel");
                self.error = Some("Failed to load channel data".to_string());
            }
        }
        self.loading = false;
    }

    /// The profile as last confirmed by the server.
    pub fn profile(&self) -> Option<&User> {
        self.profile.as_ref()
    }

    pub fn videos(&self) -> &ListView<Video> {
        &self.videos
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Stores a user the server returned after an edit, here and in the session.
    async fn accept_user(&mut self, user: User, message: &str) {
        if !self.session.replace_user(user.clone()).await {
            tracing::debug!("session no longer belongs to edited user");
        }
        self.profile = Some(user);
        self.feedback = Some(Feedback::success(message));
    }

    /// Saves a new full name and username.
    #[instrument(skip(self))]
    pub async fn update_profile(&mut self, full_name: &str, username: &str) -> bool {
        self.saving = true;
        let update = ProfileUpdate {
            full_name: full_name.to_string(),
            username: username.to_string(),
        };
        let result = self.api.edit_profile(&update).await;
        self.saving = false;
        match result {
            Ok(user) => {
                self.accept_user(user, "Profile updated successfully!").await;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "profile update failed");
                self.feedback = Some(Feedback::error(e.message));
                false
            }
        }
    }

    /// Replaces the profile picture.
    #[instrument(skip(self, avatar), fields(file = %avatar.file_name))]
    pub async fn update_avatar(&mut self, avatar: &MediaFile) -> bool {
        if let Err(errors) = validation::validate_image(Field::Avatar, avatar) {
            self.feedback = errors.first().map(Feedback::error);
            return false;
        }
        self.saving = true;
        let result = self.api.edit_avatar(avatar).await;
        self.saving = false;
        self.image_updated(result, "Profile picture", "profile picture")
            .await
    }

    /// Replaces the channel banner.
    #[instrument(skip(self, cover), fields(file = %cover.file_name))]
    pub async fn update_cover_image(&mut self, cover: &MediaFile) -> bool {
        if let Err(errors) = validation::validate_image(Field::CoverImage, cover) {
            self.feedback = errors.first().map(Feedback::error);
            return false;
        }
        self.saving = true;
        let result = self.api.edit_cover_image(cover).await;
        self.saving = false;
        self.image_updated(result, "Cover image", "cover image").await
    }

    async fn image_updated(
        &mut self,
        result: Result<User, ApiError>,
        label: &str,
        lowercase: &str,
    ) -> bool {
        match result {
            Ok(user) => {
                self.accept_user(user, &format!("{label} updated successfully!"))
                    .await;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "{lowercase} update failed");
                self.feedback = Some(Feedback::error(format!("Failed to update {lowercase}")));
                false
            }
        }
    }

    fn owner_id(&self) -> Result<String, ApiError> {
        self.profile
            .as_ref()
            .map(|u| u.id.clone())
            .ok_or_else(|| ApiError::local("channel not loaded"))
    }

    /// Runs a video mutation, then reports the outcome as feedback.
    async fn mutate_videos<R, M>(
        &mut self,
        mutation: M,
        reconcile: impl FnOnce(R, &[Video]) -> Reconciliation<Video>,
        success: &str,
    ) -> bool
    where
        M: Future<Output = Result<R, ApiError>>,
    {
        let owner_id = match self.owner_id() {
            Ok(id) => id,
            Err(e) => {
                self.feedback = Some(Feedback::error(e.message));
                return false;
            }
        };
        self.saving = true;
        let api = &self.api;
        let ok = mutate_then_reconcile(&mut self.videos, mutation, reconcile, async || {
            api.channel(&owner_id).await.map(|c| c.videos)
        })
        .await;
        self.saving = false;
        self.feedback = Some(match (ok, self.videos.error()) {
            (true, _) => Feedback::success(success),
            (false, Some(message)) => Feedback::error(message),
            (false, None) => Feedback::error("Something went wrong"),
        });
        ok
    }

    /// Changes a video's title, description and optionally its thumbnail.
    #[instrument(skip(self, edit))]
    pub async fn edit_video(&mut self, video_id: &str, edit: &VideoEdit) -> bool {
        if let Some(thumbnail) = &edit.thumbnail {
            if let Err(errors) = validation::validate_image(Field::Thumbnail, thumbnail) {
                self.feedback = errors.first().map(Feedback::error);
                return false;
            }
        }
        let api = self.api.clone();
        self.mutate_videos(
            api.edit_video(video_id, edit),
            |video, _| Reconciliation::Replace(video),
            "Video updated successfully!",
        )
        .await
    }

    /// Publishes or unpublishes a video.
    #[instrument(skip(self))]
    pub async fn toggle_publish(&mut self, video_id: &str) -> bool {
        let api = self.api.clone();
        self.mutate_videos(
            api.toggle_publish(video_id),
            |video, _| Reconciliation::Replace(video),
            "Video status updated successfully!",
        )
        .await
    }

    /// Deletes a video for good.
    #[instrument(skip(self))]
    pub async fn delete_video(&mut self, video_id: &str) -> bool {
        let api = self.api.clone();
        self.mutate_videos(
            api.delete_video(video_id),
            |(), _| Reconciliation::Remove(video_id.to_string()),
            "Video deleted successfully!",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Credentials;
    use crate::mock::MockApi;
    use http::Method;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn signed_in_studio(api: &MockApi) -> StudioController {
        api.respond(
            Method::POST,
            "/user/login",
            200,
            json!({ "data": { "user": { "_id": "u1", "fullName": "Ada", "userName": "ada" } } }),
        )
        .await;
        api.respond(
            Method::GET,
            "/user/getChannel/u1",
            200,
            json!({ "data": {
                "_id": "u1",
                "fullName": "Ada",
                "userName": "ada",
                "videos": [
                    { "_id": "v1", "title": "One", "isPublished": true },
                    { "_id": "v2", "title": "Two", "isPublished": true },
                    { "_id": "v3", "title": "Three", "isPublished": false },
                ],
            } }),
        )
        .await;

        let session = SessionStore::new(api.client());
        session
            .login(&Credentials::with_username("ada", "hunter22"))
            .await
            .unwrap();
        let mut studio = StudioController::new(session);
        studio.load().await;
        studio
    }

    fn video_ids(studio: &StudioController) -> Vec<&str> {
        studio
            .videos()
            .items()
            .iter()
            .map(|v| v.id.as_str())
            .collect()
    }

    #[tokio::test]
    async fn anonymous_cannot_edit() {
        let api = MockApi::start().await.unwrap();
        let mut studio = StudioController::new(SessionStore::new(api.client()));
        studio.load().await;
        assert!(studio.profile().is_none());
        assert!(studio.error().is_some());
        assert!(api.requests().await.is_empty());
    }

    #[tokio::test]
    async fn profile_edit_updates_session_user() {
        let api = MockApi::start().await.unwrap();
        let mut studio = signed_in_studio(&api).await;
        api.respond(
            Method::PATCH,
            "/user/editProfile",
            200,
            json!({ "data": { "_id": "u1", "fullName": "Ada King", "userName": "ada" } }),
        )
        .await;

        assert!(studio.update_profile("Ada King", "ada").await);
        assert_eq!(studio.profile().unwrap().display_name, "Ada King");
        assert_eq!(
            studio.session.current_user().await.unwrap().display_name,
            "Ada King"
        );
        assert_eq!(
            studio.feedback(),
            Some(&Feedback::success("Profile updated successfully!"))
        );
        assert_eq!(
            api.last_request().await.unwrap().json(),
            json!({ "fullName": "Ada King", "userName": "ada" })
        );
    }

    #[tokio::test]
    async fn oversized_avatar_is_not_sent() {
        let api = MockApi::start().await.unwrap();
        let mut studio = signed_in_studio(&api).await;
        let huge = MediaFile::new(
            "me.png",
            "image/png",
            vec![0u8; validation::MAX_IMAGE_BYTES as usize + 1],
        );

        assert!(!studio.update_avatar(&huge).await);
        assert_eq!(
            studio.feedback(),
            Some(&Feedback::error("Image size must be less than 5MB"))
        );
        assert_eq!(api.request_count(Method::PATCH, "/user/editAvatar").await, 0);
    }

    #[tokio::test]
    async fn avatar_update_replaces_session_user() {
        let api = MockApi::start().await.unwrap();
        let mut studio = signed_in_studio(&api).await;
        api.respond(
            Method::PATCH,
            "/user/editAvatar",
            200,
            json!({ "data": { "_id": "u1", "userName": "ada", "avatar": "https://cdn/new.png" } }),
        )
        .await;

        let avatar = MediaFile::new("me.png", "image/png", &b"png"[..]);
        assert!(studio.update_avatar(&avatar).await);
        assert_eq!(
            studio.session.current_user().await.unwrap().avatar_url.as_deref(),
            Some("https://cdn/new.png")
        );
        assert_eq!(
            studio.feedback().map(Feedback::message),
            Some("Profile picture updated successfully!")
        );
    }

    #[tokio::test]
    async fn toggle_publish_replaces_only_that_video() {
        let api = MockApi::start().await.unwrap();
        let mut studio = signed_in_studio(&api).await;
        api.respond(
            Method::PATCH,
            "/video/toggle/v3",
            200,
            json!({ "data": { "_id": "v3", "title": "Three", "isPublished": true } }),
        )
        .await;

        assert!(studio.toggle_publish("v3").await);
        assert!(studio.videos().items().iter().all(|v| v.is_published));
        assert_eq!(video_ids(&studio), ["v1", "v2", "v3"]);
    }

    #[tokio::test]
    async fn delete_removes_exactly_one() {
        let api = MockApi::start().await.unwrap();
        let mut studio = signed_in_studio(&api).await;
        api.respond(Method::DELETE, "/video/v2", 200, json!({ "data": {} }))
            .await;

        assert!(studio.delete_video("v2").await);
        assert_eq!(video_ids(&studio), ["v1", "v3"]);
        assert_eq!(
            studio.feedback(),
            Some(&Feedback::success("Video deleted successfully!"))
        );
    }

    #[tokio::test]
    async fn failed_edit_keeps_video() {
        let api = MockApi::start().await.unwrap();
        let mut studio = signed_in_studio(&api).await;
        api.respond(
            Method::PATCH,
            "/video/v1",
            400,
            json!({ "message": "Title is required" }),
        )
        .await;

        let edit = VideoEdit::default();
        assert!(!studio.edit_video("v1", &edit).await);
        assert_eq!(studio.videos().get("v1").unwrap().title, "One");
        assert_eq!(
            studio.feedback(),
            Some(&Feedback::error("Title is required"))
        );
    }
}
