//! Auth users, sessions and sign-up input

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_blank, ImageFile, Profile, UserType};
use crate::error::{Error, Result};

/// An authenticated account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Subset of profile fields captured at sign-up
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl User {
    /// The user record created alongside a sign-up
    pub fn from_sign_up(id: &str, request: &SignUpRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            email: Some(request.email.trim().to_string()),
            user_metadata: request.metadata(),
            created_at: Some(now),
            email_confirmed_at: Some(now),
            last_sign_in_at: Some(now),
        }
    }

    /// Rebuild an auth user from a stored profile
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            id: profile.id.clone(),
            email: Some(profile.email.clone()),
            user_metadata: serde_json::json!({
                "first_name": profile.first_name,
                "last_name": profile.last_name,
                "user_type": profile.user_type,
            }),
            created_at: Some(profile.created_at),
            email_confirmed_at: Some(profile.created_at),
            last_sign_in_at: None,
        }
    }
}

/// Session data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Create a new session
    pub fn new(access_token: String, refresh_token: String, user: User, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: default_token_type(),
            expires_in,
            expires_at: Some(Utc::now().timestamp().saturating_add(expires_in)),
            user,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now().timestamp() >= expires_at,
            None => false,
        }
    }
}

/// Result of sign-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub session: Option<Session>,
}

/// Account creation input
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
    pub phone: Option<String>,
    pub school_name: Option<String>,
    pub school_description: Option<String>,
    pub school_logo: Option<ImageFile>,
}

impl SignUpRequest {
    pub fn teacher(email: &str, password: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            user_type: UserType::Teacher,
            phone: None,
            school_name: None,
            school_description: None,
            school_logo: None,
        }
    }

    pub fn school(
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        school_name: &str,
    ) -> Self {
        Self {
            user_type: UserType::School,
            school_name: Some(school_name.to_string()),
            ..Self::teacher(email, password, first_name, last_name)
        }
    }

    pub fn with_phone(mut self, value: &str) -> Self {
        self.phone = Some(value.to_string());
        self
    }

    pub fn with_school_description(mut self, value: &str) -> Self {
        self.school_description = Some(value.to_string());
        self
    }

    pub fn with_school_logo(mut self, file: ImageFile) -> Self {
        self.school_logo = Some(file);
        self
    }

    /// Reject incomplete input before anything is stored
    pub fn validate(&self) -> Result<()> {
        if is_blank(&self.email)
            || is_blank(&self.password)
            || is_blank(&self.first_name)
            || is_blank(&self.last_name)
        {
            return Err(Error::validation(
                "Missing required fields: email, password, first_name, last_name, user_type",
            ));
        }
        if !self.email.contains('@') {
            return Err(Error::validation("email address is not valid"));
        }
        if self.user_type == UserType::School
            && self.school_name.as_deref().map_or(true, is_blank)
        {
            return Err(Error::validation(
                "School name is required for school administrators",
            ));
        }
        if let (UserType::School, Some(logo)) = (self.user_type, &self.school_logo) {
            logo.validate()?;
        }
        Ok(())
    }

    /// Metadata mirrored onto the auth user
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "first_name": self.first_name.trim(),
            "last_name": self.last_name.trim(),
            "user_type": self.user_type,
            "phone": self.phone.clone().unwrap_or_default(),
            "name": format!("{} {}", self.first_name.trim(), self.last_name.trim()),
        })
    }
}

/// Result of a successful sign-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpResponse {
    pub user: User,
    pub profile: Profile,
    pub session: Option<Session>,
}

/// A ready-made account for trying the app without signing up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoAccount {
    pub email: String,
    pub user_type: UserType,
    pub name: String,
}
