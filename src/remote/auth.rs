//! GoTrue calls: sign-up, password sign-in, refresh, logout and health

use chrono::Utc;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::{json, Value};

use super::RemoteBackend;
use crate::error::{Error, Result};
use crate::fetch::Fetch;
use crate::models::{Session, SignUpRequest, User};

/// Body of `GET /auth/v1/health`
#[derive(Debug, Clone, Deserialize)]
pub(super) struct AuthHealth {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl RemoteBackend {
    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    /// Keep `session` as the credential for later table and storage calls
    pub(super) async fn remember_session(&self, mut session: Session) -> Session {
        if session.expires_at.is_none() && session.expires_in > 0 {
            let now = Utc::now().timestamp();
            session.expires_at = Some(now.saturating_add(session.expires_in));
        }
        *self.session.write().await = Some(session.clone());
        session
    }

    /// Create the auth account.
    ///
    /// The session is `None` when the project requires email confirmation.
    pub(super) async fn auth_sign_up(
        &self,
        request: &SignUpRequest,
    ) -> Result<(User, Option<Session>)> {
        let body = json!({
            "email": request.email.trim(),
            "password": request.password,
            "data": request.metadata(),
        });

        let payload: Value = Fetch::post(&self.client, &self.auth_url("/signup"))
            .header("apikey", &self.key)
            .header("X-Client-Info", super::CLIENT_INFO)
            .json(&body)?
            .execute()
            .await
            .map_err(|err| match err {
                Error::DuplicateEmail(_) => Error::DuplicateEmail(request.email.trim().to_string()),
                other => other,
            })?;

        if payload.get("access_token").is_some() {
            let session: Session = serde_json::from_value(payload)?;
            let session = self.remember_session(session).await;
            return Ok((session.user.clone(), Some(session)));
        }

        // With confirmation enabled an already registered address comes back
        // as a user without identities instead of an error.
        let no_identities = payload
            .get("identities")
            .and_then(Value::as_array)
            .map_or(false, |ids| ids.is_empty());
        if no_identities {
            return Err(Error::DuplicateEmail(request.email.trim().to_string()));
        }

        let user: User = serde_json::from_value(payload)?;
        debug!("Sign-up for {} awaits email confirmation", request.email.trim());
        Ok((user, None))
    }

    pub(super) async fn auth_sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let body = json!({ "email": email.trim(), "password": password });

        let session: Session = Fetch::post(&self.client, &self.auth_url("/token"))
            .query("grant_type", "password")
            .header("apikey", &self.key)
            .header("X-Client-Info", super::CLIENT_INFO)
            .json(&body)?
            .execute()
            .await?;

        Ok(self.remember_session(session).await)
    }

    pub(super) async fn auth_refresh(&self, refresh_token: &str) -> Result<Session> {
        let body = json!({ "refresh_token": refresh_token });

        let session: Session = Fetch::post(&self.client, &self.auth_url("/token"))
            .query("grant_type", "refresh_token")
            .header("apikey", &self.key)
            .header("X-Client-Info", super::CLIENT_INFO)
            .json(&body)?
            .execute()
            .await?;

        Ok(self.remember_session(session).await)
    }

    /// Revoke the current session; the local copy is dropped either way
    pub(super) async fn auth_sign_out(&self) -> Result<()> {
        let session = self.session.write().await.take();
        let session = match session {
            Some(session) => session,
            None => return Ok(()),
        };

        let result = Fetch::post(&self.client, &self.auth_url("/logout"))
            .header("apikey", &self.key)
            .header("X-Client-Info", super::CLIENT_INFO)
            .bearer_auth(&session.access_token)
            .execute_empty()
            .await;

        if let Err(err) = &result {
            warn!("Remote logout failed: {}", err);
        }
        result
    }

    pub(super) async fn auth_health(&self) -> Result<AuthHealth> {
        Fetch::get(&self.client, &self.auth_url("/health"))
            .header("apikey", &self.key)
            .header("X-Client-Info", super::CLIENT_INFO)
            .execute()
            .await
    }
}
