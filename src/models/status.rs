//! Health and analytics summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which backend served a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    Remote,
    Mock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub mode: BackendMode,
    pub timestamp: DateTime<Utc>,
}

/// Simple counts over every stored entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analytics {
    pub total_users: usize,
    pub teacher_count: usize,
    pub school_count: usize,
    pub total_jobs: usize,
    pub total_applications: usize,
    pub timestamp: DateTime<Utc>,
}
