//! Comment types.

use crate::api::videos::VideoOwner;
use crate::reconcile::Identified;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A comment left on a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub content: String,
    /// The author, embedded or by id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<VideoOwner>,
    /// Identifier of the video the comment belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Whether the signed-in user likes this comment.
    #[serde(rename = "isLiked", default)]
    pub is_liked: bool,
    #[serde(rename = "likeCount", default)]
    pub like_count: u64,
}

impl Identified for Comment {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Body of comment create and edit requests.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CommentBody<'a> {
    pub content: &'a str,
}
