//! Video types.

use crate::api::types::MediaFile;
use crate::api::users::User;
use crate::reconcile::Identified;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// An uploaded video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// URL of the transcoded media.
    #[serde(rename = "videoFile", default, skip_serializing_if = "Option::is_none")]
    pub video_file: Option<String>,
    /// URL of the thumbnail image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Length in seconds.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub views: u64,
    #[serde(rename = "isPublished", default = "default_published")]
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<VideoOwner>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

fn default_published() -> bool {
    true
}

impl Identified for Video {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Video {
    /// Identifier of the uploading user, whether or not the owner was embedded.
    pub fn owner_id(&self) -> Option<&str> {
        self.owner.as_ref().map(VideoOwner::id)
    }
}

/// The owner of a video: some endpoints embed the user, others only send the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VideoOwner {
    Id(String),
    User(User),
}

impl VideoOwner {
    pub fn id(&self) -> &str {
        match self {
            VideoOwner::Id(id) => id,
            VideoOwner::User(user) => &user.id,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            VideoOwner::Id(_) => None,
            VideoOwner::User(user) => Some(user),
        }
    }
}

/// Response of `GET /video/:id`: the video plus the viewer's relationship to it.
///
/// Unlike most endpoints the counters are siblings of `data` rather than inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchPage {
    #[serde(rename = "data")]
    pub video: Video,
    #[serde(rename = "isSubscribed", default)]
    pub is_subscribed: bool,
    #[serde(rename = "totalSubscribers", default)]
    pub total_subscribers: u64,
    #[serde(rename = "isLiked", default)]
    pub is_liked: bool,
    #[serde(rename = "totalLikes", default)]
    pub total_likes: u64,
}

/// A new upload for `POST /video/publishVideo`.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub video_file: MediaFile,
    pub thumbnail: Option<MediaFile>,
    pub is_public: bool,
}

/// Edits for `PATCH /video/:id`. A thumbnail is only sent when replaced.
#[derive(Debug, Clone, Default)]
pub struct VideoEdit {
    pub title: String,
    pub description: String,
    pub thumbnail: Option<MediaFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_may_be_id_or_user() {
        let by_id: Video = serde_json::from_value(serde_json::json!({
            "_id": "v1", "title": "t", "owner": "u1"
        }))
        .unwrap();
        assert_eq!(by_id.owner_id(), Some("u1"));
        assert!(by_id.owner.as_ref().unwrap().user().is_none());

        let embedded: Video = serde_json::from_value(serde_json::json!({
            "_id": "v2",
            "title": "t",
            "owner": { "_id": "u2", "fullName": "Owner", "userName": "owner" },
            "createdAt": "2024-03-01T12:00:00.000Z",
        }))
        .unwrap();
        assert_eq!(embedded.owner_id(), Some("u2"));
        assert_eq!(
            embedded.owner.as_ref().unwrap().user().unwrap().display_name,
            "Owner"
        );
        assert_eq!(
            embedded.created_at.unwrap().to_string(),
            "2024-03-01T12:00:00Z"
        );
    }

    #[test]
    fn watch_page_reads_sibling_counters() {
        let page: WatchPage = serde_json::from_value(serde_json::json!({
            "data": { "_id": "v1", "title": "Intro", "views": 7 },
            "isSubscribed": false,
            "totalSubscribers": 3,
            "isLiked": true,
            "totalLikes": 9,
        }))
        .unwrap();
        assert_eq!(page.video.views, 7);
        assert!(page.video.is_published);
        assert!(page.is_liked);
        assert_eq!(page.total_likes, 9);
        assert_eq!(page.total_subscribers, 3);
    }
}
