//! Single data-access entry point over the remote and mock backends
//!
//! Every operation goes to the remote backend first when real credentials
//! are configured. Only a connectivity failure sends the call on to the mock
//! backend; domain errors such as a duplicate email or a permission denial
//! are returned as they are.

use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::backend::Backend;
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::mock::MockBackend;
use crate::models::{
    Analytics, Application, ApplicationStatus, AuthResponse, BackendMode, DemoAccount,
    HealthStatus, ImageFile, Job, NewApplication, NewJob, Profile, ProfilePatch, Session,
    SignUpRequest, SignUpResponse,
};
use crate::remote::RemoteBackend;

/// URL reported when no remote backend is configured
pub const MOCK_MODE_URL: &str = "mock-mode";

/// Which path the facade routes through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub has_real_credentials: bool,
    pub mode: BackendMode,
    pub url: String,
}

/// Decide whether a failed remote call may be retried against the mock
fn fall_back(operation: &str, err: Error) -> Result<()> {
    if err.is_connectivity() {
        warn!(
            "{} failed against the remote backend, using the mock backend: {}",
            operation, err
        );
        Ok(())
    } else {
        Err(err)
    }
}

/// Try the remote backend, then the mock after a connectivity failure.
///
/// `$call` runs once per backend, so owned arguments must be cloned inside it.
macro_rules! route {
    ($self:ident, $op:literal, |$backend:ident| $call:expr) => {{
        if let Some($backend) = $self.remote.as_deref() {
            match $call.await {
                Ok(value) => return Ok(value),
                Err(err) => fall_back($op, err)?,
            }
        }
        let $backend: &dyn Backend = &*$self.mock;
        $call.await
    }};
}

/// The data-access layer used by the application
pub struct DataAccess {
    remote: Option<Arc<dyn Backend>>,
    mock: Arc<MockBackend>,
    url: String,
}

impl std::fmt::Debug for DataAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataAccess")
            .field("remote", &self.remote.is_some())
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl DataAccess {
    /// Build both backends from `config`.
    ///
    /// Without real credentials no remote client is created at all.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let mock = Arc::new(MockBackend::from_config(&config));

        if !config.has_real_credentials() {
            info!("No backend credentials configured, running on the mock backend");
            return Ok(Self {
                remote: None,
                mock,
                url: MOCK_MODE_URL.to_string(),
            });
        }

        let remote = RemoteBackend::new(&config)?;
        info!("Using remote backend at {}", remote.url());
        let url = remote.url().to_string();
        Ok(Self {
            remote: Some(Arc::new(remote)),
            mock,
            url,
        })
    }

    /// The fallback backend
    pub fn mock(&self) -> &Arc<MockBackend> {
        &self.mock
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        ConnectionStatus {
            has_real_credentials: self.remote.is_some(),
            mode: if self.remote.is_some() {
                BackendMode::Remote
            } else {
                BackendMode::Mock
            },
            url: self.url.clone(),
        }
    }

    /// Sample accounts for sign-in hints
    pub async fn demo_accounts(&self) -> Vec<DemoAccount> {
        self.mock.demo_accounts().await
    }
}

#[async_trait]
impl Backend for DataAccess {
    async fn health_check(&self) -> Result<HealthStatus> {
        route!(self, "health_check", |backend| backend.health_check())
    }

    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpResponse> {
        route!(self, "sign_up", |backend| backend.sign_up(request.clone()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse> {
        route!(self, "sign_in", |backend| backend.sign_in(email, password))
    }

    async fn sign_out(&self) -> Result<()> {
        // Both backends may hold a session after an earlier fallback.
        let mock_result = self.mock.sign_out().await;
        if let Some(remote) = self.remote.as_deref() {
            if let Err(err) = remote.sign_out().await {
                fall_back("sign_out", err)?;
            }
        }
        mock_result
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        if let Some(remote) = self.remote.as_deref() {
            match remote.get_session().await {
                Ok(Some(session)) => return Ok(Some(session)),
                Ok(None) => {}
                Err(err) => fall_back("get_session", err)?,
            }
        }
        self.mock.get_session().await
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        route!(self, "get_profile", |backend| backend.get_profile(user_id))
    }

    async fn upsert_profile(&self, patch: ProfilePatch) -> Result<Profile> {
        route!(self, "upsert_profile", |backend| backend.upsert_profile(patch.clone()))
    }

    async fn update_profile(&self, user_id: &str, patch: ProfilePatch) -> Result<Profile> {
        route!(self, "update_profile", |backend| backend
            .update_profile(user_id, patch.clone()))
    }

    async fn upload_profile_image(&self, user_id: &str, file: ImageFile) -> Result<String> {
        route!(self, "upload_profile_image", |backend| backend
            .upload_profile_image(user_id, file.clone()))
    }

    async fn upload_school_logo(&self, school_id: &str, file: ImageFile) -> Result<String> {
        route!(self, "upload_school_logo", |backend| backend
            .upload_school_logo(school_id, file.clone()))
    }

    async fn get_teachers(&self, limit: usize) -> Result<Vec<Profile>> {
        route!(self, "get_teachers", |backend| backend.get_teachers(limit))
    }

    async fn get_schools(&self, limit: usize) -> Result<Vec<Profile>> {
        route!(self, "get_schools", |backend| backend.get_schools(limit))
    }

    async fn get_jobs(&self) -> Result<Vec<Job>> {
        route!(self, "get_jobs", |backend| backend.get_jobs())
    }

    async fn create_job(&self, job: NewJob, requester_id: &str) -> Result<Job> {
        route!(self, "create_job", |backend| backend
            .create_job(job.clone(), requester_id))
    }

    async fn get_school_jobs(&self, school_id: &str) -> Result<Vec<Job>> {
        route!(self, "get_school_jobs", |backend| backend.get_school_jobs(school_id))
    }

    async fn submit_application(
        &self,
        job_id: &str,
        application: NewApplication,
        teacher_id: &str,
    ) -> Result<Application> {
        route!(self, "submit_application", |backend| backend.submit_application(
            job_id,
            application.clone(),
            teacher_id
        ))
    }

    async fn get_user_applications(&self, teacher_id: &str) -> Result<Vec<Application>> {
        route!(self, "get_user_applications", |backend| backend
            .get_user_applications(teacher_id))
    }

    async fn get_school_applications(&self, school_id: &str) -> Result<Vec<Application>> {
        route!(self, "get_school_applications", |backend| backend
            .get_school_applications(school_id))
    }

    async fn update_application_status(
        &self,
        application_id: &str,
        status: ApplicationStatus,
        requester_id: &str,
    ) -> Result<Application> {
        route!(self, "update_application_status", |backend| backend
            .update_application_status(application_id, status, requester_id))
    }

    async fn get_analytics(&self) -> Result<Analytics> {
        route!(self, "get_analytics", |backend| backend.get_analytics())
    }
}
