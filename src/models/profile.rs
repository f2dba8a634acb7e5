//! Teacher and school profiles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_blank, non_blank, SignUpRequest};
use crate::error::{Error, Result};

/// The two sides of the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Teacher,
    School,
}

impl UserType {
    /// Availability assigned at sign-up
    pub fn default_availability(self) -> Availability {
        match self {
            UserType::Teacher => Availability::Available,
            UserType::School => Availability::Active,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Teacher => "teacher",
            UserType::School => "school",
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability status shown on a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    NotAvailable,
    Active,
}

/// One profile per account; `id` equals the auth user id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub availability: Option<Availability>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub school_name: Option<String>,
    #[serde(default)]
    pub school_logo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Build the profile stored at sign-up.
    ///
    /// School-only fields are dropped for teachers; the school description
    /// becomes the bio.
    pub fn from_sign_up(
        id: &str,
        request: &SignUpRequest,
        school_logo: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let is_school = request.user_type == UserType::School;

        Self {
            id: id.to_string(),
            email: request.email.trim().to_string(),
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            user_type: request.user_type,
            phone: non_blank(request.phone.as_deref()).map(str::to_string),
            profile_image: None,
            availability: Some(request.user_type.default_availability()),
            bio: if is_school {
                non_blank(request.school_description.as_deref()).map(str::to_string)
            } else {
                None
            },
            experience: None,
            education: None,
            skills: Vec::new(),
            location: None,
            school_name: if is_school {
                non_blank(request.school_name.as_deref()).map(str::to_string)
            } else {
                None
            },
            school_logo: if is_school { school_logo } else { None },
            created_at: now,
            updated_at: now,
        }
    }

    /// "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// School name for schools that set one, full name otherwise
    pub fn display_name(&self) -> String {
        match non_blank(self.school_name.as_deref()) {
            Some(name) => name.to_string(),
            None => self.full_name(),
        }
    }

    pub fn is_school(&self) -> bool {
        self.user_type == UserType::School
    }

    pub fn is_teacher(&self) -> bool {
        self.user_type == UserType::Teacher
    }
}

/// Partial profile used by profile edits.
///
/// `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_logo: Option<String>,
}

impl ProfilePatch {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    /// Merge into an existing profile and bump `updated_at`
    pub fn apply(self, profile: &mut Profile, now: DateTime<Utc>) -> Result<()> {
        if let Some(user_type) = self.user_type {
            if user_type != profile.user_type {
                return Err(Error::validation("user type cannot be changed"));
            }
        }
        if let Some(email) = self.email {
            if is_blank(&email) {
                return Err(Error::validation("email cannot be blank"));
            }
            profile.email = email;
        }
        if let Some(first_name) = self.first_name {
            profile.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            profile.last_name = last_name;
        }
        if self.phone.is_some() {
            profile.phone = self.phone;
        }
        if self.profile_image.is_some() {
            profile.profile_image = self.profile_image;
        }
        if self.availability.is_some() {
            profile.availability = self.availability;
        }
        if self.bio.is_some() {
            profile.bio = self.bio;
        }
        if self.experience.is_some() {
            profile.experience = self.experience;
        }
        if self.education.is_some() {
            profile.education = self.education;
        }
        if let Some(skills) = self.skills {
            profile.skills = skills;
        }
        if self.location.is_some() {
            profile.location = self.location;
        }
        if self.school_name.is_some() {
            profile.school_name = self.school_name;
        }
        if self.school_logo.is_some() {
            profile.school_logo = self.school_logo;
        }
        profile.updated_at = now;
        Ok(())
    }

    /// Create a profile from a patch when none exists yet
    pub fn into_profile(self, now: DateTime<Utc>) -> Result<Profile> {
        if is_blank(&self.id) {
            return Err(Error::validation("profile id is required"));
        }
        let (email, first_name, last_name, user_type) = match (
            self.email.clone(),
            self.first_name.clone(),
            self.last_name.clone(),
            self.user_type,
        ) {
            (Some(email), Some(first), Some(last), Some(user_type))
                if !is_blank(&email) && !is_blank(&first) && !is_blank(&last) =>
            {
                (email, first, last, user_type)
            }
            _ => {
                return Err(Error::validation(
                    "Missing required fields: email, first_name, last_name, user_type",
                ))
            }
        };

        let mut profile = Profile {
            id: self.id.clone(),
            email,
            first_name,
            last_name,
            user_type,
            phone: None,
            profile_image: None,
            availability: Some(user_type.default_availability()),
            bio: None,
            experience: None,
            education: None,
            skills: Vec::new(),
            location: None,
            school_name: None,
            school_logo: None,
            created_at: now,
            updated_at: now,
        };
        self.apply(&mut profile, now)?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teacher() -> Profile {
        let request = SignUpRequest::teacher("t1@x.com", "secret1", "Ada", "Obi");
        Profile::from_sign_up("u1", &request, None, Utc::now())
    }

    #[test]
    fn sign_up_defaults_follow_user_type() {
        let t = teacher();
        assert_eq!(t.availability, Some(Availability::Available));
        assert_eq!(t.school_name, None);

        let request = SignUpRequest::school("s1@x.com", "secret1", "Musa", "Bello", "Lagos High")
            .with_school_description("Secondary school");
        let s = Profile::from_sign_up("u2", &request, Some("logo-url".into()), Utc::now());
        assert_eq!(s.availability, Some(Availability::Active));
        assert_eq!(s.school_name.as_deref(), Some("Lagos High"));
        assert_eq!(s.bio.as_deref(), Some("Secondary school"));
        assert_eq!(s.school_logo.as_deref(), Some("logo-url"));
        assert_eq!(s.display_name(), "Lagos High");
    }

    #[test]
    fn display_name_falls_back_to_full_name() {
        assert_eq!(teacher().display_name(), "Ada Obi");
    }

    #[test]
    fn patch_merges_and_refreshes_timestamp() {
        let mut profile = teacher();
        let before = profile.updated_at;
        let later = before + chrono::Duration::seconds(5);

        let mut patch = ProfilePatch::new("u1");
        patch.bio = Some("Maths teacher".into());
        patch.skills = Some(vec!["Algebra".into(), "Geometry".into()]);
        patch.apply(&mut profile, later).unwrap();

        assert_eq!(profile.bio.as_deref(), Some("Maths teacher"));
        assert_eq!(profile.skills, vec!["Algebra", "Geometry"]);
        assert_eq!(profile.first_name, "Ada");
        assert_eq!(profile.updated_at, later);
    }

    #[test]
    fn patch_cannot_change_user_type() {
        let mut profile = teacher();
        let mut patch = ProfilePatch::new("u1");
        patch.user_type = Some(UserType::School);
        let err = patch.apply(&mut profile, Utc::now()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert_eq!(profile.user_type, UserType::Teacher);
    }

    #[test]
    fn creating_from_patch_needs_identity_fields() {
        let patch = ProfilePatch::new("u9");
        assert!(patch.into_profile(Utc::now()).is_err());

        let mut patch = ProfilePatch::new("u9");
        patch.email = Some("n@x.com".into());
        patch.first_name = Some("Ngozi".into());
        patch.last_name = Some("Eze".into());
        patch.user_type = Some(UserType::Teacher);
        let profile = patch.into_profile(Utc::now()).unwrap();
        assert_eq!(profile.availability, Some(Availability::Available));
    }

    #[test]
    fn enums_use_wire_names() {
        assert_eq!(serde_json::to_string(&UserType::School).unwrap(), "\"school\"");
        assert_eq!(
            serde_json::to_string(&Availability::NotAvailable).unwrap(),
            "\"not_available\""
        );
    }
}
