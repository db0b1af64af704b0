//! Like types.

use serde::{Deserialize, Serialize};

/// The kinds of content that can be liked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeTarget {
    Video,
    Comment,
    Tweet,
}

impl LikeTarget {
    /// Path segment used by `/like/{target}/:id`.
    pub fn as_path(self) -> &'static str {
        match self {
            LikeTarget::Video => "video",
            LikeTarget::Comment => "comment",
            LikeTarget::Tweet => "tweet",
        }
    }
}

/// Result of `GET /like/check/tweet/:id`.
///
/// Both fields are top-level siblings in the response rather than inside `data`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeStatus {
    #[serde(rename = "isLiked", default)]
    pub is_liked: bool,
    #[serde(rename = "likesCount", default)]
    pub likes_count: u64,
}

/// The `data` of a like toggle. Older server builds send no body at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LikeToggle {
    #[serde(rename = "isLiked", default)]
    pub is_liked: Option<bool>,
}
