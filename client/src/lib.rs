//! Client core of the vidtube video-sharing platform.
//!
//! All durable work (accounts, storage, transcoding) happens on the remote API. This crate
//! holds the client half:
//!
//! - [`api::ApiClient`] sends every request and turns every failure into an [`api::ApiError`];
//! - [`session::SessionStore`] tracks who is signed in;
//! - [`pages`] holds the state of each page and applies mutations only once the server has
//!   confirmed them, via the helpers in [`reconcile`];
//! - [`routes`] decides which page a path shows to signed-in and anonymous visitors.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use vidtube_client::config::ClientConfig;
//! use vidtube_client::pages::WatchController;
//!
//! # async fn example() -> eyre::Result<()> {
//! let session = vidtube_client::connect(ClientConfig::from_env()?).await?;
//! if session.is_authenticated().await {
//!     let mut page = WatchController::new(session.api().clone());
//!     page.load("65f1c0ffee").await;
//!     page.toggle_like().await;
//!     println!("{} likes", page.like().count);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod format;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod pages;
pub mod reconcile;
pub mod routes;
pub mod session;
pub mod validation;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::session::SessionStore;

/// Builds a client for `config` and restores any existing session.
///
/// Used by every front end at startup. A missing or expired session is not an error: the
/// returned store is then simply anonymous.
pub async fn connect(config: ClientConfig) -> eyre::Result<SessionStore> {
    let api = ApiClient::new(&config)?;
    let session = SessionStore::new(api);
    let phase = session.bootstrap().await;
    tracing::debug!(base_url = %config.base_url, ?phase, "connected");
    Ok(session)
}
