//! Signed-in user state for one application instance
//!
//! [`AuthSession`] owns the current user, session and profile, and turns
//! backend errors into user-facing messages. Operations always resolve to an
//! [`Outcome`]; nothing here returns an `Err` to rendering code.
//!
//! Calls are not serialized against each other. Two overlapping sign-ins
//! leave whichever finished last in the state.

use log::{debug, error, warn};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backend::Backend;
use crate::error::{Error, ErrorKind};
use crate::models::{
    AuthResponse, Profile, ProfilePatch, Session, SignUpRequest, SignUpResponse, User,
};

/// Lifecycle of the auth state
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Uninitialized,
    Loading,
    /// `profile` is `None` until the user completes one
    Authenticated {
        user: User,
        session: Option<Session>,
        profile: Option<Profile>,
    },
    Anonymous,
}

impl AuthState {
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            AuthState::Authenticated { profile, .. } => profile.as_ref(),
            _ => None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated { session, .. } => session.as_ref(),
            _ => None,
        }
    }
}

/// Result shape handed to the UI: data on success, a message otherwise
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub data: Option<T>,
    pub error: Option<String>,
    pub kind: Option<ErrorKind>,
}

impl<T> Outcome<T> {
    fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            kind: None,
        }
    }

    fn failure(err: &Error) -> Self {
        Self {
            data: None,
            error: Some(user_message(err)),
            kind: Some(err.kind()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Message shown to the user for `err`, chosen by its kind
pub fn user_message(err: &Error) -> String {
    match err.kind() {
        ErrorKind::DuplicateEmail => {
            "An account with this email already exists. Please try signing in instead.".to_string()
        }
        ErrorKind::InvalidCredentials => {
            "Invalid email or password. Please check your credentials and try again.".to_string()
        }
        ErrorKind::EmailNotConfirmed => {
            "Please check your email and confirm your account before signing in.".to_string()
        }
        ErrorKind::AccountNotFound => {
            format!("{}. Please sign up first or try a demo account.", err)
        }
        ErrorKind::NotAuthenticated => "Please sign in to continue.".to_string(),
        ErrorKind::Validation | ErrorKind::PermissionDenied => match err {
            Error::Validation(msg) | Error::PermissionDenied(msg) => msg.clone(),
            other => other.to_string(),
        },
        ErrorKind::NotFound => format!("{}.", err),
        ErrorKind::Connectivity => {
            "Unable to reach the server. Please check your connection and try again.".to_string()
        }
        ErrorKind::Internal => {
            error!("Unexpected error: {:?}", err);
            "Something went wrong. Please try again.".to_string()
        }
    }
}

/// Auth context for one application instance
pub struct AuthSession {
    backend: Arc<dyn Backend>,
    state: RwLock<AuthState>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession").finish_non_exhaustive()
    }
}

impl AuthSession {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            state: RwLock::new(AuthState::Uninitialized),
        }
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user().cloned()
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.state.read().await.profile().cloned()
    }

    pub async fn session(&self) -> Option<Session> {
        self.state.read().await.session().cloned()
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(*self.state.read().await, AuthState::Authenticated { .. })
    }

    /// Profile for `user_id`; lookup failures count as "no profile yet"
    async fn load_profile(&self, user_id: &str) -> Option<Profile> {
        match self.backend.get_profile(user_id).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!("Could not load profile for {}: {}", user_id, err);
                None
            }
        }
    }

    /// Recover an existing session and its profile
    pub async fn initialize(&self) -> AuthState {
        *self.state.write().await = AuthState::Loading;

        let next = match self.backend.get_session().await {
            Ok(Some(session)) => {
                let profile = self.load_profile(&session.user.id).await;
                debug!("Recovered session for {}", session.user.id);
                AuthState::Authenticated {
                    user: session.user.clone(),
                    session: Some(session),
                    profile,
                }
            }
            Ok(None) => AuthState::Anonymous,
            Err(err) => {
                warn!("Session recovery failed: {}", err);
                AuthState::Anonymous
            }
        };

        *self.state.write().await = next.clone();
        next
    }

    pub async fn sign_up(&self, request: SignUpRequest) -> Outcome<SignUpResponse> {
        match self.backend.sign_up(request).await {
            Ok(response) => {
                *self.state.write().await = AuthState::Authenticated {
                    user: response.user.clone(),
                    session: response.session.clone(),
                    profile: Some(response.profile.clone()),
                };
                Outcome::success(response)
            }
            Err(err) => Outcome::failure(&err),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Outcome<AuthResponse> {
        match self.backend.sign_in(email, password).await {
            Ok(response) => {
                let profile = self.load_profile(&response.user.id).await;
                *self.state.write().await = AuthState::Authenticated {
                    user: response.user.clone(),
                    session: response.session.clone(),
                    profile,
                };
                Outcome::success(response)
            }
            Err(err) => Outcome::failure(&err),
        }
    }

    /// Clear the state; a backend failure is reported but does not keep the
    /// user signed in
    pub async fn sign_out(&self) -> Outcome<()> {
        let result = self.backend.sign_out().await;
        *self.state.write().await = AuthState::Anonymous;
        match result {
            Ok(()) => Outcome::success(()),
            Err(err) => Outcome::failure(&err),
        }
    }

    /// Merge `patch` into the signed-in user's profile
    pub async fn update_profile(&self, mut patch: ProfilePatch) -> Outcome<Profile> {
        let user = match self.user().await {
            Some(user) => user,
            None => return Outcome::failure(&Error::NotAuthenticated),
        };
        patch.id = user.id.clone();

        match self.backend.upsert_profile(patch).await {
            Ok(profile) => {
                self.cache_profile(&user.id, Some(profile.clone())).await;
                Outcome::success(profile)
            }
            Err(err) => Outcome::failure(&err),
        }
    }

    /// Reload the signed-in user's profile from the backend
    pub async fn refresh_profile(&self) -> Outcome<Option<Profile>> {
        let user = match self.user().await {
            Some(user) => user,
            None => return Outcome::failure(&Error::NotAuthenticated),
        };

        match self.backend.get_profile(&user.id).await {
            Ok(profile) => {
                self.cache_profile(&user.id, profile.clone()).await;
                Outcome::success(profile)
            }
            Err(err) => Outcome::failure(&err),
        }
    }

    async fn cache_profile(&self, user_id: &str, value: Option<Profile>) {
        let mut state = self.state.write().await;
        if let AuthState::Authenticated { user, profile, .. } = &mut *state {
            // A sign-out or another sign-in may have happened meanwhile.
            if user.id == user_id {
                *profile = value;
            }
        }
    }

    /// Drop all state, back to `Uninitialized`
    pub async fn teardown(&self) {
        *self.state.write().await = AuthState::Uninitialized;
    }
}
