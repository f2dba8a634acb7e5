//! In-process backend persisted through the local store
//!
//! Implements the whole [`Backend`] surface against entity maps loaded from a
//! [`LocalStore`]. Every mutation writes the affected map back before the call
//! returns. Image uploads are kept in an in-memory blob table and addressed by
//! signed-looking `mock://` URLs.

mod seed;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::HashMap;
use tokio::sync::Mutex;
use url::Url;
use uuid::Uuid;

use crate::backend::Backend;
use crate::config::{BackendConfig, DuplicateApplicationPolicy};
use crate::error::{Error, Result};
use crate::models::{
    is_blank, sort_newest_first, sort_newest_submitted_first, Analytics, Application,
    ApplicationStatus, AuthResponse, BackendMode, DemoAccount, HealthStatus, ImageFile, ImageKind,
    Job, NewApplication, NewJob, Profile, ProfilePatch, Session, SignUpRequest, SignUpResponse,
    User, UserType,
};
use crate::store::{EntityMap, LocalStore, APPLICATIONS_KEY, JOBS_KEY, PROFILES_KEY, USERS_KEY};

/// Lifetime of a mock session, in seconds
const MOCK_SESSION_TTL: i64 = 3600;

const SERVICE_NAME: &str = "WondasTeach Mock API Server";

struct StoredBlob {
    bytes: Vec<u8>,
    expires_at: i64,
}

#[derive(Default)]
struct MockState {
    profiles: EntityMap<Profile>,
    jobs: EntityMap<Job>,
    applications: EntityMap<Application>,
    users: EntityMap<User>,
    blobs: HashMap<String, StoredBlob>,
    session: Option<Session>,
}

impl MockState {
    fn email_taken(&self, email: &str) -> bool {
        let email = email.trim();
        self.profiles
            .values()
            .any(|p| p.email.trim().eq_ignore_ascii_case(email))
            || self.users.values().any(|u| {
                u.email
                    .as_deref()
                    .map_or(false, |e| e.trim().eq_ignore_ascii_case(email))
            })
    }

    fn find_user_by_email(&self, email: &str) -> Option<User> {
        let email = email.trim();
        let user = self.users.values().find(|u| {
            u.email
                .as_deref()
                .map_or(false, |e| e.trim().eq_ignore_ascii_case(email))
        });
        match user {
            Some(user) => Some(user.clone()),
            None => self
                .profiles
                .values()
                .find(|p| p.email.trim().eq_ignore_ascii_case(email))
                .map(User::from_profile),
        }
    }
}

/// Backend that serves every operation from local state
pub struct MockBackend {
    store: LocalStore,
    state: Mutex<MockState>,
    bucket: String,
    signed_url_expiry: i64,
    duplicate_applications: DuplicateApplicationPolicy,
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("bucket", &self.bucket)
            .field("duplicate_applications", &self.duplicate_applications)
            .finish_non_exhaustive()
    }
}

impl MockBackend {
    /// Load state from `store`, seeding sample data into an empty store when
    /// the configuration asks for it
    pub fn new(store: LocalStore, config: &BackendConfig) -> Self {
        let mut state = MockState {
            profiles: store.load(PROFILES_KEY),
            jobs: store.load(JOBS_KEY),
            applications: store.load(APPLICATIONS_KEY),
            users: store.load(USERS_KEY),
            ..Default::default()
        };

        if config.seed_sample_data && state.profiles.is_empty() && state.jobs.is_empty() {
            let school = seed::sample_school();
            let teacher = seed::sample_teacher();
            let job = seed::sample_job(&school);
            state.profiles.insert(teacher.id.clone(), teacher);
            state.profiles.insert(school.id.clone(), school);
            state.jobs.insert(job.id.clone(), job);
            store.save(PROFILES_KEY, &state.profiles);
            store.save(JOBS_KEY, &state.jobs);
            info!("Seeded mock store with sample data");
        }

        debug!(
            "Mock backend ready: {} profiles, {} jobs, {} applications",
            state.profiles.len(),
            state.jobs.len(),
            state.applications.len()
        );

        Self {
            store,
            state: Mutex::new(state),
            bucket: config.profile_bucket.clone(),
            signed_url_expiry: i64::try_from(config.signed_url_expiry.as_secs())
                .unwrap_or(i64::MAX),
            duplicate_applications: config.duplicate_applications,
        }
    }

    /// Build the store the configuration names: files under `storage_dir`,
    /// or process memory
    pub fn from_config(config: &BackendConfig) -> Self {
        let store = match &config.storage_dir {
            Some(dir) => LocalStore::in_dir(dir.clone()),
            None => LocalStore::in_memory(),
        };
        Self::new(store, config)
    }

    /// Sample accounts present in the store
    pub async fn demo_accounts(&self) -> Vec<DemoAccount> {
        let state = self.state.lock().await;
        seed::SAMPLE_ACCOUNT_IDS
            .iter()
            .filter_map(|id| state.profiles.get(*id))
            .map(|profile| DemoAccount {
                email: profile.email.clone(),
                user_type: profile.user_type,
                name: profile.display_name(),
            })
            .collect()
    }

    /// Bytes behind a URL returned by an upload, while it has not expired
    pub async fn resolve_blob(&self, url: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().await;
        let blob = state.blobs.get(url)?;
        if Utc::now().timestamp() >= blob.expires_at {
            return None;
        }
        Some(blob.bytes.clone())
    }

    fn store_blob(
        &self,
        state: &mut MockState,
        user_id: &str,
        file: ImageFile,
        kind: ImageKind,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let path = kind.object_path(user_id, &file, now);
        let expires_at = now.timestamp().saturating_add(self.signed_url_expiry);

        let mut url = Url::parse(&format!("mock://storage/{}/{}", self.bucket, path))?;
        url.query_pairs_mut()
            .append_pair("token", &Uuid::new_v4().simple().to_string())
            .append_pair("expires", &expires_at.to_string());
        let url = url.to_string();

        debug!("Stored {} bytes at {}", file.bytes.len(), path);
        state.blobs.insert(
            url.clone(),
            StoredBlob {
                bytes: file.bytes,
                expires_at,
            },
        );
        Ok(url)
    }

    async fn upload_image(
        &self,
        user_id: &str,
        file: ImageFile,
        kind: ImageKind,
    ) -> Result<String> {
        if is_blank(user_id) {
            return Err(Error::validation("user id is required"));
        }
        file.validate()?;

        let mut state = self.state.lock().await;
        if kind == ImageKind::SchoolLogo {
            if let Some(profile) = state.profiles.get(user_id) {
                if !profile.is_school() {
                    return Err(Error::permission_denied("Only schools can upload a school logo"));
                }
            }
        }

        let now = Utc::now();
        let url = self.store_blob(&mut state, user_id, file, kind, now)?;

        if let Some(profile) = state.profiles.get_mut(user_id) {
            match kind {
                ImageKind::ProfileImage => profile.profile_image = Some(url.clone()),
                ImageKind::SchoolLogo => profile.school_logo = Some(url.clone()),
            }
            profile.updated_at = now;
            self.store.save(PROFILES_KEY, &state.profiles);
        }
        Ok(url)
    }

    fn start_session(&self, state: &mut MockState, user: User) -> Session {
        let session = Session::new(
            format!("mock-token-{}", user.id),
            format!("mock-refresh-{}", Uuid::new_v4().simple()),
            user,
            MOCK_SESSION_TTL,
        );
        state.session = Some(session.clone());
        session
    }

    fn list_profiles(state: &MockState, user_type: UserType, limit: usize) -> Vec<Profile> {
        state
            .profiles
            .values()
            .filter(|p| p.user_type == user_type)
            .take(limit)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn health_check(&self) -> Result<HealthStatus> {
        Ok(HealthStatus {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
            version: format!("{}-mock", env!("CARGO_PKG_VERSION")),
            mode: BackendMode::Mock,
            timestamp: Utc::now(),
        })
    }

    async fn sign_up(&self, mut request: SignUpRequest) -> Result<SignUpResponse> {
        request.validate()?;

        let mut state = self.state.lock().await;
        if state.email_taken(&request.email) {
            return Err(Error::DuplicateEmail(request.email.trim().to_string()));
        }

        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        let logo_url = match (request.user_type, request.school_logo.take()) {
            (UserType::School, Some(logo)) => {
                Some(self.store_blob(&mut state, &id, logo, ImageKind::SchoolLogo, now)?)
            }
            _ => None,
        };

        let user = User::from_sign_up(&id, &request, now);
        let profile = Profile::from_sign_up(&id, &request, logo_url, now);

        state.users.insert(id.clone(), user.clone());
        state.profiles.insert(id.clone(), profile.clone());
        self.store.save(USERS_KEY, &state.users);
        self.store.save(PROFILES_KEY, &state.profiles);

        let session = self.start_session(&mut state, user.clone());
        info!("Mock sign-up for {} ({})", profile.email, profile.user_type);

        Ok(SignUpResponse {
            user,
            profile,
            session: Some(session),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse> {
        if is_blank(email) || is_blank(password) {
            return Err(Error::validation("Email and password are required"));
        }

        let mut state = self.state.lock().await;
        let mut user = state
            .find_user_by_email(email)
            .ok_or_else(|| Error::AccountNotFound(email.trim().to_string()))?;

        user.last_sign_in_at = Some(Utc::now());
        if state.users.contains_key(&user.id) {
            state.users.insert(user.id.clone(), user.clone());
            self.store.save(USERS_KEY, &state.users);
        }

        let session = self.start_session(&mut state, user.clone());
        debug!("Mock sign-in for {}", email.trim());

        Ok(AuthResponse {
            user,
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> Result<()> {
        self.state.lock().await.session = None;
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        let state = self.state.lock().await;
        Ok(state.session.clone().filter(|s| !s.is_expired()))
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let state = self.state.lock().await;
        Ok(state.profiles.get(user_id).cloned())
    }

    async fn upsert_profile(&self, patch: ProfilePatch) -> Result<Profile> {
        if is_blank(&patch.id) {
            return Err(Error::validation("profile id is required"));
        }

        let mut state = self.state.lock().await;
        let now = Utc::now();
        let profile = match state.profiles.get(&patch.id) {
            Some(existing) => {
                let mut updated = existing.clone();
                patch.apply(&mut updated, now)?;
                updated
            }
            None => patch.into_profile(now)?,
        };

        state.profiles.insert(profile.id.clone(), profile.clone());
        self.store.save(PROFILES_KEY, &state.profiles);
        Ok(profile)
    }

    async fn update_profile(&self, user_id: &str, mut patch: ProfilePatch) -> Result<Profile> {
        if !is_blank(&patch.id) && patch.id != user_id {
            return Err(Error::validation("profile id does not match the user"));
        }
        patch.id = user_id.to_string();

        let mut state = self.state.lock().await;
        let mut updated = state
            .profiles
            .get(user_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Profile"))?;
        patch.apply(&mut updated, Utc::now())?;

        state.profiles.insert(updated.id.clone(), updated.clone());
        self.store.save(PROFILES_KEY, &state.profiles);
        Ok(updated)
    }

    async fn upload_profile_image(&self, user_id: &str, file: ImageFile) -> Result<String> {
        self.upload_image(user_id, file, ImageKind::ProfileImage).await
    }

    async fn upload_school_logo(&self, school_id: &str, file: ImageFile) -> Result<String> {
        self.upload_image(school_id, file, ImageKind::SchoolLogo).await
    }

    async fn get_teachers(&self, limit: usize) -> Result<Vec<Profile>> {
        let state = self.state.lock().await;
        Ok(Self::list_profiles(&state, UserType::Teacher, limit))
    }

    async fn get_schools(&self, limit: usize) -> Result<Vec<Profile>> {
        let state = self.state.lock().await;
        Ok(Self::list_profiles(&state, UserType::School, limit))
    }

    async fn get_jobs(&self) -> Result<Vec<Job>> {
        let state = self.state.lock().await;
        let mut jobs: Vec<Job> = state.jobs.values().filter(|j| j.is_open()).cloned().collect();
        sort_newest_first(&mut jobs);
        Ok(jobs)
    }

    async fn create_job(&self, job: NewJob, requester_id: &str) -> Result<Job> {
        let mut state = self.state.lock().await;
        let school = match state.profiles.get(requester_id) {
            Some(profile) if profile.is_school() => profile.clone(),
            _ => return Err(Error::permission_denied("Only schools can post jobs")),
        };
        job.validate()?;

        let id = format!("job_{}", Uuid::new_v4().simple());
        let job = job.into_job(id, &school, Utc::now());

        state.jobs.insert(job.id.clone(), job.clone());
        self.store.save(JOBS_KEY, &state.jobs);
        info!("Job {} posted by {}", job.id, school.id);
        Ok(job)
    }

    async fn get_school_jobs(&self, school_id: &str) -> Result<Vec<Job>> {
        let state = self.state.lock().await;
        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|j| j.school_id == school_id)
            .cloned()
            .collect();
        sort_newest_first(&mut jobs);
        Ok(jobs)
    }

    async fn submit_application(
        &self,
        job_id: &str,
        application: NewApplication,
        teacher_id: &str,
    ) -> Result<Application> {
        let mut state = self.state.lock().await;
        let job = state
            .jobs
            .get(job_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Job"))?;
        let teacher = match state.profiles.get(teacher_id) {
            Some(profile) if profile.is_teacher() => profile.clone(),
            _ => return Err(Error::permission_denied("Only teachers can apply to jobs")),
        };

        if self.duplicate_applications == DuplicateApplicationPolicy::Reject
            && state
                .applications
                .values()
                .any(|a| a.job_id == job.id && a.teacher_id == teacher.id)
        {
            return Err(Error::validation("You have already applied to this job"));
        }

        let id = format!("app_{}", Uuid::new_v4().simple());
        let application = application.into_application(id, &job, &teacher, Utc::now());

        state
            .applications
            .insert(application.id.clone(), application.clone());
        self.store.save(APPLICATIONS_KEY, &state.applications);
        Ok(application)
    }

    async fn get_user_applications(&self, teacher_id: &str) -> Result<Vec<Application>> {
        let state = self.state.lock().await;
        let mut applications: Vec<Application> = state
            .applications
            .values()
            .filter(|a| a.teacher_id == teacher_id)
            .cloned()
            .collect();
        sort_newest_submitted_first(&mut applications);
        Ok(applications)
    }

    async fn get_school_applications(&self, school_id: &str) -> Result<Vec<Application>> {
        let state = self.state.lock().await;
        let mut applications: Vec<Application> = state
            .applications
            .values()
            .filter(|a| a.school_id == school_id)
            .cloned()
            .collect();
        sort_newest_submitted_first(&mut applications);
        Ok(applications)
    }

    async fn update_application_status(
        &self,
        application_id: &str,
        status: ApplicationStatus,
        requester_id: &str,
    ) -> Result<Application> {
        let mut state = self.state.lock().await;
        let school_id = state
            .applications
            .get(application_id)
            .map(|a| a.school_id.clone())
            .ok_or_else(|| Error::not_found("Application"))?;

        let owns_job = state
            .profiles
            .get(requester_id)
            .map_or(false, |p| p.is_school() && p.id == school_id);
        if !owns_job {
            return Err(Error::permission_denied(
                "Only the school that posted the job can review its applications",
            ));
        }

        let updated = match state.applications.get_mut(application_id) {
            Some(application) => {
                application.status = status;
                application.updated_at = Utc::now();
                application.clone()
            }
            None => return Err(Error::not_found("Application")),
        };
        self.store.save(APPLICATIONS_KEY, &state.applications);
        Ok(updated)
    }

    async fn get_analytics(&self) -> Result<Analytics> {
        let state = self.state.lock().await;
        let teacher_count = state.profiles.values().filter(|p| p.is_teacher()).count();
        let school_count = state.profiles.values().filter(|p| p.is_school()).count();
        Ok(Analytics {
            total_users: state.profiles.len(),
            teacher_count,
            school_count,
            total_jobs: state.jobs.len(),
            total_applications: state.applications.len(),
            timestamp: Utc::now(),
        })
    }
}
