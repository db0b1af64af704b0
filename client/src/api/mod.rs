//! The remote vidtube API: the gateway client and the resources it exchanges.

mod client;
mod error;

pub mod comments;
pub mod likes;
pub mod subscriptions;
pub mod tweets;
pub mod types;
pub mod users;
pub mod videos;

pub use client::ApiClient;
pub use comments::Comment;
pub use error::ApiError;
pub use likes::{LikeStatus, LikeTarget};
pub use subscriptions::SubscribedChannel;
pub use tweets::Tweet;
pub use types::{Envelope, MediaFile};
pub use users::{Channel, Credentials, ProfileUpdate, RegisterProfile, User};
pub use videos::{NewVideo, Video, VideoEdit, VideoOwner, WatchPage};
