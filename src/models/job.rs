//! Job postings

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{is_blank, non_blank, Profile};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentType {
    #[default]
    FullTime,
    PartTime,
    Contract,
}

/// Posting status; "active" is accepted as a synonym for open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    #[serde(alias = "active")]
    Open,
    Closed,
    Filled,
}

/// A posting, with the school's display fields captured at creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub school_id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub location: String,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub grade_level: Option<String>,
    #[serde(default)]
    pub application_deadline: Option<NaiveDate>,
    #[serde(default)]
    pub status: JobStatus,
    pub posted_date: NaiveDate,
    /// School display name at posting time
    pub school: String,
    pub school_email: String,
    #[serde(default)]
    pub school_logo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn is_open(&self) -> bool {
        self.status == JobStatus::Open
    }
}

/// Input for a new posting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub location: String,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub employment_type: Option<EmploymentType>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub grade_level: Option<String>,
    #[serde(default)]
    pub application_deadline: Option<NaiveDate>,
}

impl NewJob {
    pub fn new(title: &str, description: &str, location: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            location: location.to_string(),
            ..Default::default()
        }
    }

    pub fn with_requirements<I, S>(mut self, requirements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirements = requirements.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_salary_range(mut self, value: &str) -> Self {
        self.salary_range = Some(value.to_string());
        self
    }

    pub fn with_employment_type(mut self, value: EmploymentType) -> Self {
        self.employment_type = Some(value);
        self
    }

    pub fn with_subject(mut self, value: &str) -> Self {
        self.subject = Some(value.to_string());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if is_blank(&self.title) || is_blank(&self.description) || is_blank(&self.location) {
            return Err(Error::validation(
                "Missing required fields: title, description, location",
            ));
        }
        Ok(())
    }

    /// Build the stored posting for `school`.
    ///
    /// The caller has already checked that `school` is a school profile.
    pub fn into_job(self, id: String, school: &Profile, now: DateTime<Utc>) -> Job {
        Job {
            id,
            school_id: school.id.clone(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            requirements: self
                .requirements
                .into_iter()
                .filter(|r| !is_blank(r))
                .collect(),
            location: self.location.trim().to_string(),
            salary_range: non_blank(self.salary_range.as_deref()).map(str::to_string),
            employment_type: self.employment_type.unwrap_or_default(),
            subject: non_blank(self.subject.as_deref()).map(str::to_string),
            grade_level: non_blank(self.grade_level.as_deref()).map(str::to_string),
            application_deadline: self.application_deadline,
            status: JobStatus::Open,
            posted_date: now.date_naive(),
            school: school.display_name(),
            school_email: school.email.clone(),
            school_logo: school.school_logo.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Sort newest first
pub fn sort_newest_first(jobs: &mut [Job]) {
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
