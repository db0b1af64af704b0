//! The login and signup forms.

use crate::api::{Credentials, RegisterProfile, User};
use crate::session::SessionStore;
use crate::validation::{self, ValidationErrors};
use tracing::instrument;

/// The login form. Accepts an email or a username.
#[derive(Debug)]
pub struct LoginForm {
    session: SessionStore,
    pub identifier: String,
    pub password: String,
    errors: ValidationErrors,
    api_error: Option<String>,
}

impl LoginForm {
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            identifier: String::new(),
            password: String::new(),
            errors: ValidationErrors::default(),
            api_error: None,
        }
    }

    /// Problems with the inputs found on the last submit.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// The server's reason for rejecting the last submit.
    pub fn api_error(&self) -> Option<&str> {
        self.api_error.as_deref()
    }

    /// Validates the inputs and, if they are fine, signs in.
    #[instrument(skip(self))]
    pub async fn submit(&mut self) -> Option<User> {
        self.api_error = None;
        if let Err(errors) = validation::validate_login(&self.identifier, &self.password) {
            self.errors = errors;
            return None;
        }
        self.errors = ValidationErrors::default();

        let credentials = Credentials::from_identifier(self.identifier.trim(), &self.password);
        match self.session.login(&credentials).await {
            Ok(user) => Some(user),
            Err(e) => {
                self.api_error = Some(e.message);
                None
            }
        }
    }
}

/// The signup form.
#[derive(Debug)]
pub struct SignupForm {
    session: SessionStore,
    pub profile: RegisterProfile,
    errors: ValidationErrors,
    api_error: Option<String>,
}

impl SignupForm {
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            profile: RegisterProfile::default(),
            errors: ValidationErrors::default(),
            api_error: None,
        }
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn api_error(&self) -> Option<&str> {
        self.api_error.as_deref()
    }

    /// Validates every field and, if all are fine, creates the account.
    #[instrument(skip(self), fields(username = %self.profile.username))]
    pub async fn submit(&mut self) -> Option<User> {
        self.api_error = None;
        if let Err(errors) = validation::validate_signup(&self.profile) {
            tracing::debug!(%errors, "signup form rejected");
            self.errors = errors;
            return None;
        }
        self.errors = ValidationErrors::default();

        match self.session.register(&self.profile).await {
            Ok(user) => Some(user),
            Err(e) => {
                self.api_error = Some(e.message);
                None
            }
        }
    }
}
