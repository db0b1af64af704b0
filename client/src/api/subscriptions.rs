//! Subscription types.

use crate::api::users::User;
use crate::reconcile::Identified;
use serde::{Deserialize, Serialize};

/// One entry of `GET /subscription/subscribedChannels`.
///
/// The server returns the subscribed-to channel either embedded under `channel` or as the
/// user document itself, so both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubscribedChannel {
    Wrapped {
        #[serde(rename = "channel")]
        channel: User,
    },
    Direct(User),
}

impl SubscribedChannel {
    pub fn channel(&self) -> &User {
        match self {
            SubscribedChannel::Wrapped { channel } => channel,
            SubscribedChannel::Direct(user) => user,
        }
    }
}

impl Identified for SubscribedChannel {
    fn id(&self) -> &str {
        &self.channel().id
    }
}

/// The `data` of a subscription toggle, when the server reports the new state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SubscriptionToggle {
    #[serde(rename = "isSubscribed", alias = "subscribed", default)]
    pub is_subscribed: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_both_shapes() {
        let entries: Vec<SubscribedChannel> = serde_json::from_value(serde_json::json!([
            { "channel": { "_id": "c1", "fullName": "One" } },
            { "_id": "c2", "fullName": "Two" },
        ]))
        .unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.id()).collect();
        assert_eq!(ids, ["c1", "c2"]);
    }
}
