//! Client for the hosted Supabase project
//!
//! Same operation set and error taxonomy as the mock backend. Auth goes
//! through GoTrue, records through PostgREST and images through object
//! storage. Once a user signs in, the session's access token replaces the
//! anon key as the bearer for table and storage calls.

mod auth;
mod rest;
mod storage;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::Backend;
use crate::config::{BackendConfig, DuplicateApplicationPolicy};
use crate::error::{Error, Result};
use crate::fetch::FetchBuilder;
use crate::models::{
    is_blank, Analytics, Application, ApplicationStatus, AuthResponse, BackendMode, HealthStatus,
    ImageFile, ImageKind, Job, NewApplication, NewJob, Profile, ProfilePatch, Session,
    SignUpRequest, SignUpResponse, UserType,
};
use rest::eq;

pub(crate) const CLIENT_INFO: &str = concat!("wondasteach/", env!("CARGO_PKG_VERSION"));

const PROFILES: &str = "profiles";
const JOBS: &str = "jobs";
const APPLICATIONS: &str = "applications";

/// Backend talking to a hosted project over HTTP
pub struct RemoteBackend {
    /// Project base URL without a trailing slash
    url: String,

    /// Anon API key
    key: String,

    client: Client,

    /// Session from the last sign-up or sign-in
    session: RwLock<Option<Session>>,

    bucket: String,

    /// Signed URL lifetime in seconds
    signed_url_expiry: u64,

    duplicate_applications: DuplicateApplicationPolicy,
}

impl std::fmt::Debug for RemoteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBackend")
            .field("url", &self.url)
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl RemoteBackend {
    /// Create a client for the project named in `config`
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            url: config.url.trim_end_matches('/').to_string(),
            key: config.anon_key.clone(),
            client: builder.build()?,
            session: RwLock::new(None),
            bucket: config.profile_bucket.clone(),
            signed_url_expiry: config.signed_url_expiry.as_secs(),
            duplicate_applications: config.duplicate_applications,
        })
    }

    /// Project base URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Add the API key and the current bearer token
    pub(crate) async fn authorize<'a>(&self, fetch: FetchBuilder<'a>) -> FetchBuilder<'a> {
        let token = match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.key.clone(),
        };
        fetch
            .header("apikey", &self.key)
            .header("X-Client-Info", CLIENT_INFO)
            .bearer_auth(&token)
    }

    async fn find_profile(&self, id: &str) -> Result<Option<Profile>> {
        self.select_by_id(PROFILES, id).await
    }

    /// Upload an already validated image and sign its URL
    async fn put_image(&self, user_id: &str, file: ImageFile, kind: ImageKind) -> Result<String> {
        let path = kind.object_path(user_id, &file, Utc::now());
        self.upload_object(&path, file).await?;
        debug!("Uploaded {}", path);
        self.sign_object(&path).await
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

        let existing = self.find_profile(user_id).await?;
        if kind == ImageKind::SchoolLogo && existing.as_ref().map_or(false, |p| !p.is_school()) {
            return Err(Error::permission_denied("Only schools can upload a school logo"));
        }

        let url = self.put_image(user_id, file, kind).await?;

        if let Some(profile) = existing {
            let column = match kind {
                ImageKind::ProfileImage => "profile_image",
                ImageKind::SchoolLogo => "school_logo",
            };
            let mut body = serde_json::Map::new();
            body.insert(column.to_string(), Value::String(url.clone()));
            body.insert("updated_at".to_string(), json!(Utc::now()));
            let _: Profile = self.update_row(PROFILES, &profile.id, &body).await?;
        }
        Ok(url)
    }

    async fn store_profile(
        &self,
        existing: Option<Profile>,
        patch: ProfilePatch,
    ) -> Result<Profile> {
        let now = Utc::now();
        match existing {
            Some(mut profile) => {
                patch.apply(&mut profile, now)?;
                self.update_row(PROFILES, &profile.id, &profile).await
            }
            None => {
                let profile = patch.into_profile(now)?;
                self.insert_row(PROFILES, &profile, true).await
            }
        }
    }

    async fn list_profiles(&self, user_type: UserType, limit: usize) -> Result<Vec<Profile>> {
        let user_type = eq(user_type.as_str());
        let limit = limit.to_string();
        self.select_rows(
            PROFILES,
            &[
                ("select", "*"),
                ("user_type", user_type.as_str()),
                ("order", "created_at.asc"),
                ("limit", limit.as_str()),
            ],
        )
        .await
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    async fn health_check(&self) -> Result<HealthStatus> {
        let health = self.auth_health().await?;
        Ok(HealthStatus {
            status: "healthy".to_string(),
            service: health.name.unwrap_or_else(|| "Supabase".to_string()),
            version: health.version.unwrap_or_default(),
            mode: BackendMode::Remote,
            timestamp: Utc::now(),
        })
    }

    async fn sign_up(&self, mut request: SignUpRequest) -> Result<SignUpResponse> {
        request.validate()?;
        let (user, session) = self.auth_sign_up(&request).await?;

        let logo_url = match (request.user_type, request.school_logo.take()) {
            (UserType::School, Some(logo)) => {
                match self.put_image(&user.id, logo, ImageKind::SchoolLogo).await {
                    Ok(url) => Some(url),
                    Err(err) => {
                        warn!("School logo upload failed for {}: {}", user.id, err);
                        None
                    }
                }
            }
            _ => None,
        };

        // The auth account exists from here on, so an outage must not send
        // the caller to the mock backend. The remote session is kept and the
        // profile can be completed later.
        let profile = Profile::from_sign_up(&user.id, &request, logo_url, Utc::now());
        let profile: Profile = self
            .insert_row(PROFILES, &profile, true)
            .await
            .map_err(|err| {
                if err.is_connectivity() {
                    Error::internal(format!(
                        "Account {} was created but its profile could not be saved: {}",
                        user.id, err
                    ))
                } else {
                    err
                }
            })?;

        Ok(SignUpResponse {
            user,
            profile,
            session,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse> {
        if is_blank(email) || is_blank(password) {
            return Err(Error::validation("Email and password are required"));
        }
        let session = self.auth_sign_in(email, password).await?;
        Ok(AuthResponse {
            user: session.user.clone(),
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> Result<()> {
        self.auth_sign_out().await
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        let current = self.session.read().await.clone();
        let session = match current {
            Some(session) => session,
            None => return Ok(None),
        };
        if !session.is_expired() {
            return Ok(Some(session));
        }
        if session.refresh_token.is_empty() {
            *self.session.write().await = None;
            return Ok(None);
        }

        match self.auth_refresh(&session.refresh_token).await {
            Ok(session) => Ok(Some(session)),
            Err(err) if err.is_connectivity() => Err(err),
            Err(err) => {
                debug!("Session refresh rejected: {}", err);
                *self.session.write().await = None;
                Ok(None)
            }
        }
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        self.find_profile(user_id).await
    }

    async fn upsert_profile(&self, patch: ProfilePatch) -> Result<Profile> {
        if is_blank(&patch.id) {
            return Err(Error::validation("profile id is required"));
        }
        let existing = self.find_profile(&patch.id).await?;
        self.store_profile(existing, patch).await
    }

    async fn update_profile(&self, user_id: &str, mut patch: ProfilePatch) -> Result<Profile> {
        if !is_blank(&patch.id) && patch.id != user_id {
            return Err(Error::validation("profile id does not match the user"));
        }
        patch.id = user_id.to_string();

        let existing = self
            .find_profile(user_id)
            .await?
            .ok_or_else(|| Error::not_found("Profile"))?;
        self.store_profile(Some(existing), patch).await
    }

    async fn upload_profile_image(&self, user_id: &str, file: ImageFile) -> Result<String> {
        self.upload_image(user_id, file, ImageKind::ProfileImage).await
    }

    async fn upload_school_logo(&self, school_id: &str, file: ImageFile) -> Result<String> {
        self.upload_image(school_id, file, ImageKind::SchoolLogo).await
    }

    async fn get_teachers(&self, limit: usize) -> Result<Vec<Profile>> {
        self.list_profiles(UserType::Teacher, limit).await
    }

    async fn get_schools(&self, limit: usize) -> Result<Vec<Profile>> {
        self.list_profiles(UserType::School, limit).await
    }

    async fn get_jobs(&self) -> Result<Vec<Job>> {
        self.select_rows(
            JOBS,
            &[
                ("select", "*"),
                ("status", "in.(open,active)"),
                ("order", "created_at.desc"),
            ],
        )
        .await
    }

    async fn create_job(&self, job: NewJob, requester_id: &str) -> Result<Job> {
        let school = match self.find_profile(requester_id).await? {
            Some(profile) if profile.is_school() => profile,
            _ => return Err(Error::permission_denied("Only schools can post jobs")),
        };
        job.validate()?;

        let job = job.into_job(Uuid::new_v4().to_string(), &school, Utc::now());
        self.insert_row(JOBS, &job, false).await
    }

    async fn get_school_jobs(&self, school_id: &str) -> Result<Vec<Job>> {
        let school = eq(school_id);
        self.select_rows(
            JOBS,
            &[
                ("select", "*"),
                ("school_id", school.as_str()),
                ("order", "created_at.desc"),
            ],
        )
        .await
    }

    async fn submit_application(
        &self,
        job_id: &str,
        application: NewApplication,
        teacher_id: &str,
    ) -> Result<Application> {
        let job: Job = self
            .select_by_id(JOBS, job_id)
            .await?
            .ok_or_else(|| Error::not_found("Job"))?;
        let teacher = match self.find_profile(teacher_id).await? {
            Some(profile) if profile.is_teacher() => profile,
            _ => return Err(Error::permission_denied("Only teachers can apply to jobs")),
        };

        if self.duplicate_applications == DuplicateApplicationPolicy::Reject {
            let job_filter = eq(&job.id);
            let teacher_filter = eq(&teacher.id);
            let previous: Vec<Value> = self
                .select_rows(
                    APPLICATIONS,
                    &[
                        ("select", "id"),
                        ("job_id", job_filter.as_str()),
                        ("teacher_id", teacher_filter.as_str()),
                        ("limit", "1"),
                    ],
                )
                .await?;
            if !previous.is_empty() {
                return Err(Error::validation("You have already applied to this job"));
            }
        }

        let application =
            application.into_application(Uuid::new_v4().to_string(), &job, &teacher, Utc::now());
        self.insert_row(APPLICATIONS, &application, false).await
    }

    async fn get_user_applications(&self, teacher_id: &str) -> Result<Vec<Application>> {
        let teacher = eq(teacher_id);
        self.select_rows(
            APPLICATIONS,
            &[
                ("select", "*"),
                ("teacher_id", teacher.as_str()),
                ("order", "submitted_at.desc"),
            ],
        )
        .await
    }

    async fn get_school_applications(&self, school_id: &str) -> Result<Vec<Application>> {
        let school = eq(school_id);
        self.select_rows(
            APPLICATIONS,
            &[
                ("select", "*"),
                ("school_id", school.as_str()),
                ("order", "submitted_at.desc"),
            ],
        )
        .await
    }

    async fn update_application_status(
        &self,
        application_id: &str,
        status: ApplicationStatus,
        requester_id: &str,
    ) -> Result<Application> {
        let application: Application = self
            .select_by_id(APPLICATIONS, application_id)
            .await?
            .ok_or_else(|| Error::not_found("Application"))?;

        let owns_job = self
            .find_profile(requester_id)
            .await?
            .map_or(false, |p| p.is_school() && p.id == application.school_id);
        if !owns_job {
            return Err(Error::permission_denied(
                "Only the school that posted the job can review its applications",
            ));
        }

        let body = json!({ "status": status, "updated_at": Utc::now() });
        self.update_row(APPLICATIONS, &application.id, &body).await
    }

    async fn get_analytics(&self) -> Result<Analytics> {
        let profiles: Vec<Value> = self.select_rows(PROFILES, &[("select", "user_type")]).await?;
        let jobs: Vec<Value> = self.select_rows(JOBS, &[("select", "id")]).await?;
        let applications: Vec<Value> = self.select_rows(APPLICATIONS, &[("select", "id")]).await?;

        let count = |kind: UserType| {
            profiles
                .iter()
                .filter(|p| p["user_type"] == kind.as_str())
                .count()
        };

        Ok(Analytics {
            total_users: profiles.len(),
            teacher_count: count(UserType::Teacher),
            school_count: count(UserType::School),
            total_jobs: jobs.len(),
            total_applications: applications.len(),
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use wiremock::matchers::{body_partial_json, header, method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.test-anon";

    fn client(server: &MockServer) -> RemoteBackend {
        RemoteBackend::new(&BackendConfig::new(&server.uri(), KEY)).unwrap()
    }

    fn profile_json(id: &str, user_type: &str) -> Value {
        json!({
            "id": id,
            "email": format!("{}@x.com", id),
            "first_name": "Ada",
            "last_name": "Obi",
            "user_type": user_type,
            "created_at": "2024-01-15T10:00:00Z",
            "updated_at": "2024-01-15T10:00:00Z"
        })
    }

    fn session_json(user_id: &str) -> Value {
        json!({
            "access_token": "user-jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": { "id": user_id, "email": "t1@x.com" }
        })
    }

    #[tokio::test]
    async fn sign_in_keeps_session_for_table_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json("u1")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .and(query_param("id", "eq.u1"))
            .and(header("Authorization", "Bearer user-jwt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([profile_json("u1", "teacher")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let remote = client(&server);
        let response = remote.sign_in("t1@x.com", "secret1").await.unwrap();
        assert_eq!(response.user.id, "u1");

        let session = remote.get_session().await.unwrap().unwrap();
        assert_eq!(session.access_token, "user-jwt");
        assert!(session.expires_at.is_some());

        let profile = remote.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.user_type, UserType::Teacher);
    }

    #[tokio::test]
    async fn rejected_credentials_are_domain_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": 400,
                "error_code": "invalid_credentials",
                "msg": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let err = client(&server).sign_in("t1@x.com", "wrong").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCredentials);
    }

    #[tokio::test]
    async fn duplicate_sign_up_names_the_email() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "code": 422,
                "error_code": "user_already_exists",
                "msg": "User already registered"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server)
            .sign_up(SignUpRequest::teacher("t1@x.com", "secret1", "Ada", "Obi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateEmail);
        assert!(err.to_string().contains("t1@x.com"));
    }

    #[tokio::test]
    async fn sign_up_inserts_profile_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(body_partial_json(json!({ "data": { "user_type": "teacher" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json("u1")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .and(body_partial_json(json!({ "id": "u1", "availability": "available" })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!([profile_json("u1", "teacher")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .sign_up(SignUpRequest::teacher("t1@x.com", "secret1", "Ada", "Obi"))
            .await
            .unwrap();
        assert_eq!(response.profile.id, "u1");
        assert!(response.session.is_some());
    }

    #[tokio::test]
    async fn registered_email_without_identities_is_duplicate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u1",
                "email": "t1@x.com",
                "identities": []
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let remote = client(&server);
        let err = remote
            .sign_up(SignUpRequest::teacher("t1@x.com", "secret1", "Ada", "Obi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateEmail);
        assert!(err.to_string().contains("t1@x.com"));
        assert!(remote.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_up_awaiting_confirmation_has_no_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u2",
                "email": "t2@x.com",
                "identities": [{ "id": "u2", "provider": "email" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .and(body_partial_json(json!({ "id": "u2" })))
            .and(header("Authorization", format!("Bearer {}", KEY).as_str()))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!([profile_json("u2", "teacher")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let remote = client(&server);
        let response = remote
            .sign_up(SignUpRequest::teacher("t2@x.com", "secret1", "Ada", "Obi"))
            .await
            .unwrap();
        assert_eq!(response.user.id, "u2");
        assert_eq!(response.profile.id, "u2");
        assert!(response.session.is_none());
        assert!(remote.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn profile_outage_after_sign_up_is_not_connectivity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json("u1")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let remote = client(&server);
        let err = remote
            .sign_up(SignUpRequest::teacher("t1@x.com", "secret1", "Ada", "Obi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);

        let session = remote.get_session().await.unwrap().unwrap();
        assert_eq!(session.user.id, "u1");
    }

    fn expired_session_json(user_id: &str) -> Value {
        let mut session = session_json(user_id);
        session["expires_at"] = json!(1);
        session
    }

    async fn signed_in_with_expired_session(server: &MockServer) -> RemoteBackend {
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(expired_session_json("u1")))
            .mount(server)
            .await;
        let remote = client(server);
        remote.sign_in("t1@x.com", "secret1").await.unwrap();
        remote
    }

    #[tokio::test]
    async fn expired_session_is_refreshed() {
        let server = MockServer::start().await;
        let mut refreshed = session_json("u1");
        refreshed["access_token"] = json!("fresh-jwt");
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(body_partial_json(json!({ "refresh_token": "refresh" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(refreshed))
            .expect(1)
            .mount(&server)
            .await;

        let remote = signed_in_with_expired_session(&server).await;
        let session = remote.get_session().await.unwrap().unwrap();
        assert_eq!(session.access_token, "fresh-jwt");
        assert!(!session.is_expired());
    }

    #[tokio::test]
    async fn rejected_refresh_drops_the_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid Refresh Token"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let remote = signed_in_with_expired_session(&server).await;
        assert!(remote.get_session().await.unwrap().is_none());
        // Dropped, so no second refresh attempt.
        assert!(remote.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn refresh_outage_keeps_the_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let remote = signed_in_with_expired_session(&server).await;
        let err = remote.get_session().await.unwrap_err();
        assert!(err.is_connectivity());
        assert!(remote.session.read().await.is_some());
    }

    #[tokio::test]
    async fn server_errors_are_connectivity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/jobs"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server).get_jobs().await.unwrap_err();
        assert!(err.is_connectivity());
    }

    #[tokio::test]
    async fn unreachable_host_is_connectivity() {
        let config = BackendConfig::new("http://127.0.0.1:9", KEY);
        let err = RemoteBackend::new(&config)
            .unwrap()
            .health_check()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connectivity);
    }

    #[tokio::test]
    async fn teacher_cannot_post_jobs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([profile_json("u1", "teacher")])),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/jobs"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server)
            .create_job(NewJob::new("Algebra I", "Teach algebra", "Lagos"), "u1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn missing_job_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let err = client(&server)
            .submit_application("nope", NewApplication::new("Hi"), "u1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn upload_returns_signed_url_and_updates_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([profile_json("u1", "teacher")])),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(
                r"^/storage/v1/object/wondasteach-profiles/u1/profile-\d+\.png$",
            ))
            .and(header("x-upsert", "true"))
            .and(header("Content-Type", "image/png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "k" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(
                r"^/storage/v1/object/sign/wondasteach-profiles/u1/profile-\d+\.png$",
            ))
            .and(body_partial_json(json!({ "expiresIn": 31_536_000 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "signedURL": "/object/sign/wondasteach-profiles/u1/p.png?token=abc"
            })))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/profiles"))
            .and(query_param("id", "eq.u1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([profile_json("u1", "teacher")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let file = ImageFile::new("me.png", "image/png", vec![1, 2, 3]);
        let url = client(&server).upload_profile_image("u1", file).await.unwrap();
        assert_eq!(
            url,
            format!(
                "{}/storage/v1/object/sign/wondasteach-profiles/u1/p.png?token=abc",
                server.uri()
            )
        );
    }

    #[tokio::test]
    async fn oversized_upload_never_reaches_storage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let bytes = vec![0; crate::models::MAX_IMAGE_BYTES + 1];
        let file = ImageFile::new("me.png", "image/png", bytes);
        let err = client(&server).upload_profile_image("u1", file).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
