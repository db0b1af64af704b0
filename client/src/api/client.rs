//! The API gateway: the one place outbound requests are built.

use crate::api::comments::{Comment, CommentBody};
use crate::api::error::ApiError;
use crate::api::likes::{LikeStatus, LikeTarget, LikeToggle};
use crate::api::subscriptions::{SubscribedChannel, SubscriptionToggle};
use crate::api::tweets::{Tweet, TweetBody};
use crate::api::types::{Envelope, MediaFile};
use crate::api::users::{AuthPayload, Channel, Credentials, ProfileUpdate, RegisterProfile, User};
use crate::api::videos::{NewVideo, Video, VideoEdit, WatchPage};
use crate::config::ClientConfig;
use eyre::Context;
use http::Method;
use reqwest::multipart::Form;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

/// What, if anything, is sent as the request body.
enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(Form),
}

impl RequestBody {
    fn json(body: &impl Serialize) -> Result<Self, ApiError> {
        serde_json::to_value(body)
            .map(RequestBody::Json)
            .map_err(|e| ApiError::local(format!("encode request body: {e}")))
    }
}

/// Client for the vidtube HTTP API.
///
/// All requests go to a fixed base URL. The session credential is a cookie issued by the
/// server on login; the client keeps a cookie store so that the credential rides along on
/// every later request without callers having to handle it.
///
/// Every call either decodes the `data` of the response envelope or fails once with an
/// [`ApiError`]. Nothing is retried and no timeout is applied.
///
/// Cloning is cheap and clones share the same connection pool and cookie store, so one
/// signed-in session is visible to every clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Base URL that request path segments are appended to.
    base_url: reqwest::Url,
    /// HTTP client for API requests, including the cookie store.
    client: reqwest::Client,
}

impl ApiClient {
    /// Creates a client for the API described by `config`.
    pub fn new(config: &ClientConfig) -> eyre::Result<Self> {
        let base_url = reqwest::Url::parse(&config.base_url)
            .with_context(|| format!("parse API base URL '{}'", config.base_url))?;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build HTTP client")?;
        Ok(Self { base_url, client })
    }

    /// The base URL every request is sent under.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::local(format!("'{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a request to the API and checks its status.
    ///
    /// This method consolidates the logic shared by every endpoint:
    /// - URL construction from the base URL and path segments
    /// - JSON or multipart body
    /// - status validation, turning any non-2xx response into an [`ApiError`] that carries the
    ///   server's `message`
    ///
    /// The returned response is left for the caller to decode.
    #[instrument(skip(self, body), level = tracing::Level::TRACE)]
    async fn make_request(
        &self,
        method: Method,
        segments: &[&str],
        body: RequestBody,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.endpoint(segments)?;
        let request = self.client.request(method.clone(), url);
        let request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Multipart(form) => request.multipart(form),
        };

        let response = request.send().await.map_err(|e| {
            tracing::debug!(%method, error = %e, "request could not be sent");
            ApiError::transport(&e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let error = ApiError::from_response_body(status, &text);
            tracing::debug!(
                %method,
                status = status.as_u16(),
                message = %error.message,
                "API request failed"
            );
            return Err(error);
        }

        Ok(response)
    }

    /// Decodes a whole response body.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::transport(&e))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::decode(status, e))
    }

    /// Decodes the `data` of a response envelope.
    async fn decode_data<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let envelope: Envelope<T> = Self::decode(response).await?;
        Ok(envelope.data)
    }

    /// Decodes the `data` of a response envelope when there is one.
    ///
    /// Used for endpoints whose body is informational only: a missing or malformed body is not
    /// an error once the status said the request succeeded.
    async fn decode_optional<T: DeserializeOwned>(response: reqwest::Response) -> Option<T> {
        let bytes = response.bytes().await.ok()?;
        serde_json::from_slice::<Envelope<Option<T>>>(&bytes)
            .ok()?
            .data
    }

    async fn get_data<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let response = self
            .make_request(Method::GET, segments, RequestBody::Empty)
            .await?;
        Self::decode_data(response).await
    }

    fn file_part(file: &MediaFile) -> Result<reqwest::multipart::Part, ApiError> {
        file.to_part().map_err(|e| {
            ApiError::local(format!(
                "invalid content type '{}' for {}: {e}",
                file.content_type, file.file_name
            ))
        })
    }

    // ==============================================================================
    // Session
    // ==============================================================================

    /// Asks the server who the ambient session credential belongs to.
    ///
    /// Fails with a 401 [`ApiError`] when there is no valid session.
    ///
    /// `GET /user/getCurrentUser`
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let user: User = self.get_data(&["user", "getCurrentUser"]).await?;
        tracing::debug!(user_id = %user.id, "session belongs to user");
        Ok(user)
    }

    /// Logs in and returns the signed-in user.
    ///
    /// On success the server sets the session cookie, which this client then attaches to all
    /// later requests.
    ///
    /// `POST /user/login`
    #[instrument(skip(self, credentials))]
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        let response = self
            .make_request(
                Method::POST,
                &["user", "login"],
                RequestBody::json(credentials)?,
            )
            .await?;
        let payload: AuthPayload = Self::decode_data(response).await?;
        let user = payload.into_user();
        tracing::debug!(user_id = %user.id, "logged in");
        Ok(user)
    }

    /// Creates an account and returns the new user.
    ///
    /// `POST /user/register`
    #[instrument(skip(self, profile), fields(username = %profile.username))]
    pub async fn register(&self, profile: &RegisterProfile) -> Result<User, ApiError> {
        let response = self
            .make_request(
                Method::POST,
                &["user", "register"],
                RequestBody::json(profile)?,
            )
            .await?;
        let payload: AuthPayload = Self::decode_data(response).await?;
        let user = payload.into_user();
        tracing::debug!(user_id = %user.id, "registered");
        Ok(user)
    }

    /// Ends the server-side session.
    ///
    /// `GET /user/logout`
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.make_request(Method::GET, &["user", "logout"], RequestBody::Empty)
            .await?;
        Ok(())
    }

    // ==============================================================================
    // Users and channels
    // ==============================================================================

    /// Changes the signed-in user's full name and username.
    ///
    /// `PATCH /user/editProfile`
    #[instrument(skip(self), ret(level = tracing::Level::TRACE))]
    pub async fn edit_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let response = self
            .make_request(
                Method::PATCH,
                &["user", "editProfile"],
                RequestBody::json(update)?,
            )
            .await?;
        Self::decode_data(response).await
    }

    /// Replaces the signed-in user's profile picture.
    ///
    /// `PATCH /user/editAvatar` with a multipart `avatar` field.
    #[instrument(skip(self, avatar), fields(file = %avatar.file_name))]
    pub async fn edit_avatar(&self, avatar: &MediaFile) -> Result<User, ApiError> {
        let form = Form::new().part("avatar", Self::file_part(avatar)?);
        let response = self
            .make_request(
                Method::PATCH,
                &["user", "editAvatar"],
                RequestBody::Multipart(form),
            )
            .await?;
        Self::decode_data(response).await
    }

    /// Replaces the signed-in user's channel banner.
    ///
    /// `PATCH /user/editCoverImage` with a multipart `coverImage` field.
    #[instrument(skip(self, cover), fields(file = %cover.file_name))]
    pub async fn edit_cover_image(&self, cover: &MediaFile) -> Result<User, ApiError> {
        let form = Form::new().part("coverImage", Self::file_part(cover)?);
        let response = self
            .make_request(
                Method::PATCH,
                &["user", "editCoverImage"],
                RequestBody::Multipart(form),
            )
            .await?;
        Self::decode_data(response).await
    }

    /// Fetches a channel with its videos and the viewer's subscription state.
    ///
    /// `GET /user/getChannel/:channelId`
    #[instrument(skip(self))]
    pub async fn channel(&self, channel_id: &str) -> Result<Channel, ApiError> {
        let channel: Channel = self.get_data(&["user", "getChannel", channel_id]).await?;
        tracing::debug!(
            channel_id,
            videos = channel.videos.len(),
            subscribers = channel.subscribers_count,
            "fetched channel"
        );
        Ok(channel)
    }

    /// Videos the signed-in user has watched, most recent first.
    ///
    /// `GET /user/watchHistory`
    #[instrument(skip(self))]
    pub async fn watch_history(&self) -> Result<Vec<Video>, ApiError> {
        self.get_data(&["user", "watchHistory"]).await
    }

    // ==============================================================================
    // Videos
    // ==============================================================================

    /// Lists every published video.
    ///
    /// `GET /video/all`
    #[instrument(skip(self))]
    pub async fn list_videos(&self) -> Result<Vec<Video>, ApiError> {
        let videos: Vec<Video> = self.get_data(&["video", "all"]).await?;
        tracing::debug!(returned_items = videos.len(), "fetched videos");
        Ok(videos)
    }

    /// Fetches a video together with the viewer's like and subscription state.
    ///
    /// `GET /video/:videoId`
    #[instrument(skip(self))]
    pub async fn watch_page(&self, video_id: &str) -> Result<WatchPage, ApiError> {
        let response = self
            .make_request(Method::GET, &["video", video_id], RequestBody::Empty)
            .await?;
        let page: WatchPage = Self::decode(response).await?;
        tracing::debug!(
            video_id,
            likes = page.total_likes,
            subscribers = page.total_subscribers,
            "fetched watch page"
        );
        Ok(page)
    }

    /// Uploads a new video.
    ///
    /// `POST /video/publishVideo` with multipart fields `title`, `description`, `videoFile`,
    /// `thumbnail` and `isPublic`.
    #[instrument(skip(self, upload), fields(title = %upload.title))]
    pub async fn publish_video(&self, upload: &NewVideo) -> Result<Video, ApiError> {
        let mut form = Form::new()
            .text("title", upload.title.clone())
            .text("description", upload.description.clone())
            .part("videoFile", Self::file_part(&upload.video_file)?);
        if let Some(thumbnail) = &upload.thumbnail {
            form = form.part("thumbnail", Self::file_part(thumbnail)?);
        }
        let form = form.text("isPublic", upload.is_public.to_string());

        let response = self
            .make_request(
                Method::POST,
                &["video", "publishVideo"],
                RequestBody::Multipart(form),
            )
            .await?;
        let video: Video = Self::decode_data(response).await?;
        tracing::debug!(video_id = %video.id, "published video");
        Ok(video)
    }

    /// Changes a video's title, description and optionally its thumbnail.
    ///
    /// `PATCH /video/:videoId` (multipart)
    #[instrument(skip(self, edit))]
    pub async fn edit_video(&self, video_id: &str, edit: &VideoEdit) -> Result<Video, ApiError> {
        let mut form = Form::new()
            .text("title", edit.title.clone())
            .text("description", edit.description.clone());
        if let Some(thumbnail) = &edit.thumbnail {
            form = form.part("thumbnail", Self::file_part(thumbnail)?);
        }

        let response = self
            .make_request(
                Method::PATCH,
                &["video", video_id],
                RequestBody::Multipart(form),
            )
            .await?;
        Self::decode_data(response).await
    }

    /// Flips a video between published and unpublished, returning the updated video.
    ///
    /// `PATCH /video/toggle/:videoId`
    #[instrument(skip(self))]
    pub async fn toggle_publish(&self, video_id: &str) -> Result<Video, ApiError> {
        let response = self
            .make_request(
                Method::PATCH,
                &["video", "toggle", video_id],
                RequestBody::Empty,
            )
            .await?;
        let video: Video = Self::decode_data(response).await?;
        tracing::debug!(
            video_id,
            is_published = video.is_published,
            "toggled publish status"
        );
        Ok(video)
    }

    /// `DELETE /video/:videoId`
    #[instrument(skip(self))]
    pub async fn delete_video(&self, video_id: &str) -> Result<(), ApiError> {
        self.make_request(Method::DELETE, &["video", video_id], RequestBody::Empty)
            .await?;
        Ok(())
    }

    // ==============================================================================
    // Comments
    // ==============================================================================

    /// `GET /comment/:videoId`
    #[instrument(skip(self))]
    pub async fn list_comments(&self, video_id: &str) -> Result<Vec<Comment>, ApiError> {
        let response = self
            .make_request(Method::GET, &["comment", video_id], RequestBody::Empty)
            .await?;
        // the server sends `data: null` for a video nobody has commented on yet
        let comments: Option<Vec<Comment>> = Self::decode_data(response).await?;
        Ok(comments.unwrap_or_default())
    }

    /// Posts a comment and returns it as stored by the server.
    ///
    /// `POST /comment/:videoId`
    #[instrument(skip(self, content))]
    pub async fn add_comment(&self, video_id: &str, content: &str) -> Result<Comment, ApiError> {
        let response = self
            .make_request(
                Method::POST,
                &["comment", video_id],
                RequestBody::json(&CommentBody { content })?,
            )
            .await?;
        let comment: Comment = Self::decode_data(response).await?;
        tracing::debug!(video_id, comment_id = %comment.id, "added comment");
        Ok(comment)
    }

    /// `PATCH /comment/:commentId`
    #[instrument(skip(self, content))]
    pub async fn edit_comment(&self, comment_id: &str, content: &str) -> Result<Comment, ApiError> {
        let response = self
            .make_request(
                Method::PATCH,
                &["comment", comment_id],
                RequestBody::json(&CommentBody { content })?,
            )
            .await?;
        Self::decode_data(response).await
    }

    /// `DELETE /comment/:commentId`
    #[instrument(skip(self))]
    pub async fn delete_comment(&self, comment_id: &str) -> Result<(), ApiError> {
        self.make_request(Method::DELETE, &["comment", comment_id], RequestBody::Empty)
            .await?;
        Ok(())
    }

    // ==============================================================================
    // Likes
    // ==============================================================================

    /// Likes or unlikes a video, comment or tweet.
    ///
    /// # Returns
    ///
    /// The new like state if the server reported it, `None` if it only confirmed the toggle.
    ///
    /// `POST /like/{video,comment,tweet}/:id`
    #[instrument(skip(self), ret)]
    pub async fn toggle_like(
        &self,
        target: LikeTarget,
        target_id: &str,
    ) -> Result<Option<bool>, ApiError> {
        let response = self
            .make_request(
                Method::POST,
                &["like", target.as_path(), target_id],
                RequestBody::Empty,
            )
            .await?;
        let toggle: Option<LikeToggle> = Self::decode_optional(response).await;
        Ok(toggle.and_then(|t| t.is_liked))
    }

    /// Whether the signed-in user likes a tweet, and how many likes it has.
    ///
    /// `GET /like/check/tweet/:tweetId`
    #[instrument(skip(self))]
    pub async fn check_tweet_like(&self, tweet_id: &str) -> Result<LikeStatus, ApiError> {
        let response = self
            .make_request(
                Method::GET,
                &["like", "check", "tweet", tweet_id],
                RequestBody::Empty,
            )
            .await?;
        Self::decode(response).await
    }

    /// Videos the signed-in user has liked.
    ///
    /// `GET /like/all`
    #[instrument(skip(self))]
    pub async fn liked_videos(&self) -> Result<Vec<Video>, ApiError> {
        self.get_data(&["like", "all"]).await
    }

    // ==============================================================================
    // Subscriptions
    // ==============================================================================

    /// Subscribes to or unsubscribes from a channel.
    ///
    /// # Returns
    ///
    /// The new subscription state if the server reported it, `None` otherwise.
    ///
    /// `POST /subscription/:channelId`
    #[instrument(skip(self), ret)]
    pub async fn toggle_subscription(&self, channel_id: &str) -> Result<Option<bool>, ApiError> {
        let response = self
            .make_request(
                Method::POST,
                &["subscription", channel_id],
                RequestBody::Empty,
            )
            .await?;
        let toggle: Option<SubscriptionToggle> = Self::decode_optional(response).await;
        Ok(toggle.and_then(|t| t.is_subscribed))
    }

    /// `GET /subscription/subscribedChannels`
    #[instrument(skip(self))]
    pub async fn subscribed_channels(&self) -> Result<Vec<SubscribedChannel>, ApiError> {
        self.get_data(&["subscription", "subscribedChannels"]).await
    }

    // ==============================================================================
    // Tweets
    // ==============================================================================

    /// Community posts of a user, without like information.
    ///
    /// `GET /tweet/user/:userId`
    #[instrument(skip(self))]
    pub async fn user_tweets(&self, user_id: &str) -> Result<Vec<Tweet>, ApiError> {
        let response = self
            .make_request(Method::GET, &["tweet", "user", user_id], RequestBody::Empty)
            .await?;
        let tweets: Option<Vec<Tweet>> = Self::decode_data(response).await?;
        Ok(tweets.unwrap_or_default())
    }

    /// `POST /tweet/create`
    #[instrument(skip(self, content))]
    pub async fn create_tweet(&self, content: &str) -> Result<(), ApiError> {
        self.make_request(
            Method::POST,
            &["tweet", "create"],
            RequestBody::json(&TweetBody { content })?,
        )
        .await?;
        Ok(())
    }

    /// `PATCH /tweet/:tweetId`
    #[instrument(skip(self, content))]
    pub async fn edit_tweet(&self, tweet_id: &str, content: &str) -> Result<(), ApiError> {
        self.make_request(
            Method::PATCH,
            &["tweet", tweet_id],
            RequestBody::json(&TweetBody { content })?,
        )
        .await?;
        Ok(())
    }

    /// `DELETE /tweet/delete/:tweetId`
    #[instrument(skip(self))]
    pub async fn delete_tweet(&self, tweet_id: &str) -> Result<(), ApiError> {
        self.make_request(
            Method::DELETE,
            &["tweet", "delete", tweet_id],
            RequestBody::Empty,
        )
        .await?;
        Ok(())
    }
}
