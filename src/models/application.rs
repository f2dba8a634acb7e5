//! Applications submitted by teachers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_blank, non_blank, Job, Profile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewed,
    Accepted,
    Rejected,
}

/// A teacher's submission against one job.
///
/// Job title and teacher contact details are copied at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub job_id: String,
    pub job_title: String,
    pub school_id: String,
    pub teacher_id: String,
    pub teacher_name: String,
    pub teacher_email: String,
    #[serde(default)]
    pub cover_letter: String,
    #[serde(default)]
    pub additional_info: Option<String>,
    #[serde(default)]
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewApplication {
    #[serde(default)]
    pub cover_letter: String,
    #[serde(default)]
    pub additional_info: Option<String>,
}

impl NewApplication {
    pub fn new(cover_letter: &str) -> Self {
        Self {
            cover_letter: cover_letter.to_string(),
            additional_info: None,
        }
    }

    pub fn with_additional_info(mut self, value: &str) -> Self {
        self.additional_info = Some(value.to_string());
        self
    }

    pub fn into_application(
        self,
        id: String,
        job: &Job,
        teacher: &Profile,
        now: DateTime<Utc>,
    ) -> Application {
        Application {
            id,
            job_id: job.id.clone(),
            job_title: job.title.clone(),
            school_id: job.school_id.clone(),
            teacher_id: teacher.id.clone(),
            teacher_name: teacher.full_name(),
            teacher_email: teacher.email.clone(),
            cover_letter: if is_blank(&self.cover_letter) {
                String::new()
            } else {
                self.cover_letter
            },
            additional_info: non_blank(self.additional_info.as_deref()).map(str::to_string),
            status: ApplicationStatus::Pending,
            submitted_at: now,
            updated_at: now,
        }
    }
}

/// Sort newest submission first
pub fn sort_newest_submitted_first(applications: &mut [Application]) {
    applications.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
}
