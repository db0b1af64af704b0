//! Per-page state and actions.
//!
//! Each controller owns a clone of the [`ApiClient`](crate::api::ApiClient) and the state one
//! page displays. Failures never propagate out of a controller: they end up in that page's
//! error or feedback fields, and the previously displayed state stays as it was.

mod auth;
mod channel;
mod home;
mod studio;
mod upload;
mod watch;

pub use auth::{LoginForm, SignupForm};
pub use channel::{ChannelController, ChannelTab, VideoSort};
pub use home::{HomeController, Section};
pub use studio::StudioController;
pub use upload::UploadController;
pub use watch::WatchController;

/// The one-line status a form shows after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Success(String),
    Error(String),
}

impl Feedback {
    pub fn success(message: impl Into<String>) -> Self {
        Feedback::Success(message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Feedback::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Feedback::Error(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Feedback::Success(message) | Feedback::Error(message) => message,
        }
    }
}
