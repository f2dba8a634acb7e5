//! The operation set shared by every backend

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Analytics, Application, ApplicationStatus, AuthResponse, HealthStatus, ImageFile, Job,
    NewApplication, NewJob, Profile, ProfilePatch, Session, SignUpRequest, SignUpResponse,
};

/// Default page size for profile listings
pub const DEFAULT_LIST_LIMIT: usize = 20;

/// Everything the UI can ask of a backend.
///
/// The mock and the remote client implement it with the same error
/// taxonomy, and the Facade implements it by composing the two.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn health_check(&self) -> Result<HealthStatus>;

    /// Create an account and its profile
    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpResponse>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse>;

    async fn sign_out(&self) -> Result<()>;

    /// The session currently held by this backend, if any
    async fn get_session(&self) -> Result<Option<Session>>;

    /// `Ok(None)` when the user has not completed a profile yet
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>>;

    /// Merge into an existing profile, creating it when absent
    async fn upsert_profile(&self, patch: ProfilePatch) -> Result<Profile>;

    /// Merge into an existing profile; fails with `NotFound` when absent
    async fn update_profile(&self, user_id: &str, patch: ProfilePatch) -> Result<Profile>;

    /// Store the image and return a URL that resolves to it
    async fn upload_profile_image(&self, user_id: &str, file: ImageFile) -> Result<String>;

    async fn upload_school_logo(&self, school_id: &str, file: ImageFile) -> Result<String>;

    async fn get_teachers(&self, limit: usize) -> Result<Vec<Profile>>;

    async fn get_schools(&self, limit: usize) -> Result<Vec<Profile>>;

    /// Open postings, newest first
    async fn get_jobs(&self) -> Result<Vec<Job>>;

    async fn create_job(&self, job: NewJob, requester_id: &str) -> Result<Job>;

    /// One school's postings in any status, newest first
    async fn get_school_jobs(&self, school_id: &str) -> Result<Vec<Job>>;

    async fn submit_application(
        &self,
        job_id: &str,
        application: NewApplication,
        teacher_id: &str,
    ) -> Result<Application>;

    /// A teacher's applications, newest first
    async fn get_user_applications(&self, teacher_id: &str) -> Result<Vec<Application>>;

    /// Applications to a school's postings, newest first
    async fn get_school_applications(&self, school_id: &str) -> Result<Vec<Application>>;

    async fn update_application_status(
        &self,
        application_id: &str,
        status: ApplicationStatus,
        requester_id: &str,
    ) -> Result<Application>;

    async fn get_analytics(&self) -> Result<Analytics>;
}
