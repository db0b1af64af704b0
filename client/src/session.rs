//! Who is signed in.
//!
//! A [`SessionStore`] is created once per application and handed to every page that needs to
//! know the signed-in user. It only ever changes through [`bootstrap`](SessionStore::bootstrap),
//! [`login`](SessionStore::login), [`register`](SessionStore::register),
//! [`logout`](SessionStore::logout) and [`replace_user`](SessionStore::replace_user).
//!
//! The session itself is a cookie held by the [`ApiClient`]; the store only mirrors what the
//! server said about it and never persists anything.

use crate::api::{ApiClient, ApiError, Credentials, RegisterProfile, User};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::instrument;

/// Where the session is in its lifecycle.
///
/// `Anonymous` → `Checking` → `Authenticated` | `Anonymous`, and back to `Anonymous` on
/// logout from anywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    Anonymous,
    /// The startup session check is in flight.
    Checking,
    Authenticated,
}

/// A point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub current_user: Option<User>,
    pub phase: SessionPhase,
    /// `true` iff `phase` is `Authenticated` and a user is stored.
    pub is_authenticated: bool,
    /// `true` while a session operation is in flight.
    pub is_loading: bool,
    /// Message of the last failed login or registration.
    pub last_error: Option<String>,
}

impl Session {
    fn signed_in(&mut self, user: User) {
        self.current_user = Some(user);
        self.phase = SessionPhase::Authenticated;
        self.is_authenticated = true;
        self.is_loading = false;
        self.last_error = None;
    }

    fn signed_out(&mut self, error: Option<String>) {
        self.current_user = None;
        self.phase = SessionPhase::Anonymous;
        self.is_authenticated = false;
        self.is_loading = false;
        self.last_error = error;
    }

    /// Returns to the settled state implied by whatever user is stored.
    fn abandoned(&mut self) {
        self.is_loading = false;
        self.is_authenticated = self.current_user.is_some();
        self.phase = if self.is_authenticated {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        };
    }
}

fn lock(state: &Mutex<Session>) -> MutexGuard<'_, Session> {
    // every update is a set of plain field writes, so a poisoned state is still whole
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks a session operation as in flight until it is finished.
///
/// If the operation's future is dropped before [`finish`](Pending::finish), say by a timeout,
/// the session settles back instead of staying in `Checking` or loading forever.
struct Pending<'a> {
    state: &'a Mutex<Session>,
    armed: bool,
}

impl<'a> Pending<'a> {
    fn new(state: &'a Mutex<Session>) -> Self {
        Self { state, armed: true }
    }

    /// Disarms the guard and hands out the lock for recording the outcome.
    fn finish(mut self) -> MutexGuard<'a, Session> {
        self.armed = false;
        lock(self.state)
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!("session operation abandoned");
            lock(self.state).abandoned();
        }
    }
}

/// Shared handle to the application's session.
///
/// Clones share the same state, so a login through one clone is seen by all of them. The
/// state lock is never held across a request.
#[derive(Debug, Clone)]
pub struct SessionStore {
    api: ApiClient,
    state: Arc<Mutex<Session>>,
}

impl SessionStore {
    /// Creates an anonymous session backed by `api`.
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(Session::default())),
        }
    }

    /// The client whose cookie store holds the session credential.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn snapshot(&self) -> Session {
        lock(&self.state).clone()
    }

    pub async fn current_user(&self) -> Option<User> {
        lock(&self.state).current_user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        lock(&self.state).is_authenticated
    }

    fn start(&self) -> Pending<'_> {
        lock(&self.state).is_loading = true;
        Pending::new(&self.state)
    }

    /// Asks the server whether the ambient credential is still valid.
    ///
    /// Meant to run once at startup. Any failure, including a network error, just means
    /// nobody is signed in and is not recorded as an error. If the returned future is dropped
    /// before the server answers, the session goes back to what it was before the check.
    ///
    /// # Returns
    ///
    /// The phase the session ended up in. If a check is already in flight this returns
    /// [`SessionPhase::Checking`] immediately without sending another request.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> SessionPhase {
        let pending = {
            let mut state = lock(&self.state);
            if state.phase == SessionPhase::Checking {
                tracing::debug!("session check already in flight");
                return SessionPhase::Checking;
            }
            state.phase = SessionPhase::Checking;
            state.is_loading = true;
            Pending::new(&self.state)
        };

        let result = self.api.current_user().await;

        let mut state = pending.finish();
        match result {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "restored session");
                state.signed_in(user);
            }
            Err(e) => {
                tracing::debug!(error = %e, "no valid session");
                state.signed_out(None);
            }
        }
        state.phase
    }

    /// Signs in with the given credentials.
    ///
    /// On failure the session is anonymous and the server's message is kept in
    /// [`Session::last_error`].
    #[instrument(skip(self, credentials))]
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        let pending = self.start();
        let result = self.api.login(credentials).await;
        Self::settle(pending, result)
    }

    /// Creates an account and signs in as it.
    #[instrument(skip(self, profile), fields(username = %profile.username))]
    pub async fn register(&self, profile: &RegisterProfile) -> Result<User, ApiError> {
        let pending = self.start();
        let result = self.api.register(profile).await;
        Self::settle(pending, result)
    }

    fn settle(pending: Pending<'_>, result: Result<User, ApiError>) -> Result<User, ApiError> {
        let mut state = pending.finish();
        match &result {
            Ok(user) => state.signed_in(user.clone()),
            Err(e) => {
                tracing::warn!(error = %e, "sign-in failed");
                state.signed_out(Some(e.message.clone()));
            }
        }
        result
    }

    /// Signs out.
    ///
    /// The local session is cleared whether or not the server acknowledged the logout.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let pending = self.start();
        if let Err(e) = self.api.logout().await {
            tracing::warn!(error = %e, "logout request failed, clearing session anyway");
        }
        pending.finish().signed_out(None);
    }

    /// Replaces the stored user with a fresher copy from the server, e.g. after a profile edit.
    ///
    /// Ignored unless signed in as that same user.
    pub async fn replace_user(&self, user: User) -> bool {
        let mut state = lock(&self.state);
        let same_user = state.current_user.as_ref().is_some_and(|u| u.id == user.id);
        if state.phase != SessionPhase::Authenticated || !same_user {
            tracing::debug!(user_id = %user.id, "not replacing user of another session");
            return false;
        }
        state.current_user = Some(user);
        true
    }
}
