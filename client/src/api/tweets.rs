//! Tweet (community post) types.

use crate::api::likes::LikeStatus;
use crate::api::videos::VideoOwner;
use crate::reconcile::Identified;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A short community post on a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<VideoOwner>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Filled from a like check; the tweet list itself does not carry it.
    #[serde(rename = "isLiked", default)]
    pub is_liked: bool,
    #[serde(rename = "likesCount", default)]
    pub likes_count: u64,
}

impl Tweet {
    /// Applies the result of a like check.
    pub fn with_like_status(mut self, status: LikeStatus) -> Self {
        self.is_liked = status.is_liked;
        self.likes_count = status.likes_count;
        self
    }
}

impl Identified for Tweet {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Body of tweet create and edit requests.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TweetBody<'a> {
    pub content: &'a str,
}
