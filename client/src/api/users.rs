//! User and channel types.

use crate::api::videos::Video;
use serde::{Deserialize, Serialize};

/// A registered user as returned by the server.
///
/// The client only ever holds read-only copies: in the session and in page state
/// (for example the owner of a channel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// The user's full name, shown as the channel title.
    #[serde(rename = "fullName", default)]
    pub display_name: String,
    /// Unique lowercase handle.
    #[serde(rename = "userName", default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// URL of the profile picture.
    #[serde(rename = "avatar", default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// URL of the channel banner.
    #[serde(
        rename = "coverImage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cover_image_url: Option<String>,
}

/// Login credentials. The server accepts either an email or a username.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "userName", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password: String,
}

impl Credentials {
    pub fn with_email(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            username: None,
            password: password.into(),
        }
    }

    pub fn with_username(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: None,
            username: Some(username.into()),
            password: password.into(),
        }
    }

    /// Treats identifiers containing `@` as emails, anything else as a username.
    pub fn from_identifier(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        let identifier = identifier.into();
        if identifier.contains('@') {
            Self::with_email(identifier, password)
        } else {
            Self::with_username(identifier, password)
        }
    }
}

/// The `data` of login and registration responses.
///
/// Login wraps the user next to the issued tokens; registration returns the user itself.
/// The tokens are ignored because the server also sets them as cookies.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum AuthPayload {
    Wrapped { user: User },
    Direct(User),
}

impl AuthPayload {
    pub(crate) fn into_user(self) -> User {
        match self {
            AuthPayload::Wrapped { user } => user,
            AuthPayload::Direct(user) => user,
        }
    }
}

/// Payload of `POST /user/register`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegisterProfile {
    #[serde(rename = "userName")]
    pub username: String,
    pub email: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub password: String,
}

/// Payload of `PATCH /user/editProfile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(rename = "fullName")]
    pub full_name: String,
    #[serde(rename = "userName")]
    pub username: String,
}

/// A channel page: the owning user plus their videos and subscription state.
///
/// See `GET /user/getChannel/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(flatten)]
    pub owner: User,
    #[serde(default)]
    pub videos: Vec<Video>,
    /// Whether the signed-in user follows this channel.
    #[serde(rename = "isSubscribed", default)]
    pub is_subscribed: bool,
    #[serde(rename = "subscribersCount", default)]
    pub subscribers_count: u64,
    /// How many channels this channel's owner follows.
    #[serde(rename = "subscribedToCount", default)]
    pub subscribed_to_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn user_uses_server_field_names() {
        let user: User = serde_json::from_value(serde_json::json!({
            "_id": "u1",
            "fullName": "Ada Lovelace",
            "userName": "ada",
            "email": "ada@example.com",
            "avatar": "https://cdn.example.com/a.png",
        }))
        .unwrap();
        assert_eq!(
            user,
            User {
                id: "u1".into(),
                display_name: "Ada Lovelace".into(),
                username: "ada".into(),
                email: "ada@example.com".into(),
                avatar_url: Some("https://cdn.example.com/a.png".into()),
                cover_image_url: None,
            }
        );
    }

    #[test]
    fn credentials_pick_identifier_kind() {
        let by_email = serde_json::to_value(Credentials::from_identifier("a@b.c", "pw")).unwrap();
        assert_eq!(by_email, serde_json::json!({"email": "a@b.c", "password": "pw"}));

        let by_name = serde_json::to_value(Credentials::from_identifier("ada", "pw")).unwrap();
        assert_eq!(by_name, serde_json::json!({"userName": "ada", "password": "pw"}));
    }

    #[test]
    fn auth_payload_accepts_both_shapes() {
        let wrapped: AuthPayload = serde_json::from_value(serde_json::json!({
            "user": { "_id": "u1", "userName": "ada" },
            "accessToken": "x",
        }))
        .unwrap();
        assert_eq!(wrapped.into_user().id, "u1");

        let direct: AuthPayload =
            serde_json::from_value(serde_json::json!({ "_id": "u2", "userName": "bob" })).unwrap();
        assert_eq!(direct.into_user().username, "bob");
    }

    #[test]
    fn channel_flattens_owner() {
        let channel: Channel = serde_json::from_value(serde_json::json!({
            "_id": "c1",
            "fullName": "Chan",
            "userName": "chan",
            "email": "c@example.com",
            "videos": [],
            "isSubscribed": true,
            "subscribersCount": 12,
        }))
        .unwrap();
        assert_eq!(channel.owner.id, "c1");
        assert!(channel.is_subscribed);
        assert_eq!(channel.subscribers_count, 12);
        assert_eq!(channel.subscribed_to_count, 0);
    }
}
