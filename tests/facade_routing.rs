use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wondasteach::config::PLACEHOLDER_ANON_KEY;
use wondasteach::prelude::*;

const KEY: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.facade-test";

fn config_for(server: &MockServer, key: &str) -> BackendConfig {
    BackendConfig::new(&server.uri(), key).with_seed_sample_data(false)
}

fn job_json(id: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "school_id": "s1",
        "title": title,
        "description": "Teach it",
        "location": "Lagos",
        "status": "active",
        "posted_date": "2024-02-01",
        "school": "Lagos High",
        "school_email": "s1@x.com",
        "created_at": "2024-02-01T09:00:00Z",
        "updated_at": "2024-02-01T09:00:00Z"
    })
}

#[tokio::test]
async fn placeholder_credentials_never_reach_the_network() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let data = DataAccess::new(config_for(&server, PLACEHOLDER_ANON_KEY)).unwrap();
    let status = data.connection_status();
    assert!(!status.has_real_credentials);
    assert_eq!(status.mode, BackendMode::Mock);
    assert_eq!(status.url, "mock-mode");

    let school = data
        .sign_up(SignUpRequest::school("s1@x.com", "secret1", "Musa", "Bello", "Lagos High"))
        .await
        .unwrap();
    data.create_job(NewJob::new("Algebra I", "Teach algebra", "Lagos"), &school.profile.id)
        .await
        .unwrap();
    assert_eq!(data.get_jobs().await.unwrap().len(), 1);
    assert_eq!(data.health_check().await.unwrap().mode, BackendMode::Mock);
}

#[tokio::test]
async fn remote_results_are_returned_when_available() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([job_json("j1", "Physics")])))
        .expect(1)
        .mount(&server)
        .await;

    let data = DataAccess::new(config_for(&server, KEY)).unwrap();
    let status = data.connection_status();
    assert!(status.has_real_credentials);
    assert_eq!(status.mode, BackendMode::Remote);
    assert_eq!(status.url, server.uri());

    let jobs = data.get_jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].title, "Physics");
    assert_eq!(jobs[0].status, JobStatus::Open);
}

#[tokio::test]
async fn server_outage_falls_back_to_mock() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let data = DataAccess::new(config_for(&server, KEY)).unwrap();
    let response = data
        .sign_up(SignUpRequest::teacher("t1@x.com", "secret1", "Ada", "Obi"))
        .await
        .unwrap();
    assert!(response
        .session
        .map_or(false, |s| s.access_token.starts_with("mock-token-")));

    let profile = data.get_profile(&response.user.id).await.unwrap().unwrap();
    assert_eq!(profile.email, "t1@x.com");
    assert_eq!(data.mock().get_analytics().await.unwrap().teacher_count, 1);
}

#[tokio::test]
async fn unreachable_backend_falls_back_to_mock() {
    let config = BackendConfig::new("http://127.0.0.1:9", KEY).with_seed_sample_data(false);
    let data = DataAccess::new(config).unwrap();

    assert_eq!(data.connection_status().mode, BackendMode::Remote);
    assert!(data.get_jobs().await.unwrap().is_empty());
    assert_eq!(data.health_check().await.unwrap().mode, BackendMode::Mock);
}

#[tokio::test]
async fn duplicate_email_from_remote_is_not_masked() {
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

    let data = DataAccess::new(config_for(&server, KEY)).unwrap();
    let err = data
        .sign_up(SignUpRequest::teacher("t1@x.com", "secret1", "Ada", "Obi"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateEmail);

    // No phantom account was created on the fallback path.
    assert_eq!(data.mock().get_analytics().await.unwrap().total_users, 0);
    assert!(data.mock().get_session().await.unwrap().is_none());
}

#[tokio::test]
async fn rejected_sign_in_is_not_masked() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let app = WondasTeach::new(config_for(&server, KEY)).unwrap();
    // The mock knows this email, so a fallback would have signed the user in.
    app.data()
        .mock()
        .sign_up(SignUpRequest::teacher("t1@x.com", "secret1", "Ada", "Obi"))
        .await
        .unwrap();

    let outcome = app.auth().sign_in("t1@x.com", "wrong-password").await;
    assert_eq!(outcome.kind, Some(ErrorKind::InvalidCredentials));
    assert_eq!(
        outcome.error.as_deref(),
        Some("Invalid email or password. Please check your credentials and try again.")
    );
    assert!(!app.auth().is_authenticated().await);
}

#[tokio::test]
async fn permission_denied_from_remote_is_not_masked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "t1",
            "email": "t1@x.com",
            "first_name": "Ada",
            "last_name": "Obi",
            "user_type": "teacher",
            "created_at": "2024-01-15T10:00:00Z",
            "updated_at": "2024-01-15T10:00:00Z"
        }])))
        .mount(&server)
        .await;

    let data = DataAccess::new(config_for(&server, KEY)).unwrap();
    let err = data
        .create_job(NewJob::new("Algebra I", "Teach algebra", "Lagos"), "t1")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert_eq!(data.mock().get_analytics().await.unwrap().total_jobs, 0);
}

#[tokio::test]
async fn profile_outage_after_remote_sign_up_does_not_fall_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "remote-jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": { "id": "remote-u1", "email": "t1@x.com" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let data = DataAccess::new(config_for(&server, KEY)).unwrap();
    let err = data
        .sign_up(SignUpRequest::teacher("t1@x.com", "secret1", "Ada", "Obi"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    // The caller's identity stays the remote account, never a mock one.
    assert_eq!(data.mock().get_analytics().await.unwrap().total_users, 0);
    assert!(data.mock().get_session().await.unwrap().is_none());
    let session = data.get_session().await.unwrap().unwrap();
    assert_eq!(session.user.id, "remote-u1");
}

#[tokio::test]
async fn unconfirmed_email_gets_its_own_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 400,
            "error_code": "email_not_confirmed",
            "msg": "Email not confirmed"
        })))
        .mount(&server)
        .await;

    let app = WondasTeach::new(config_for(&server, KEY)).unwrap();
    let outcome = app.auth().sign_in("t1@x.com", "secret1").await;
    assert!(!outcome.is_ok());
    assert_eq!(outcome.kind, Some(ErrorKind::EmailNotConfirmed));
    assert_eq!(
        outcome.error.as_deref(),
        Some("Please check your email and confirm your account before signing in.")
    );
    assert!(!app.auth().is_authenticated().await);
}

#[tokio::test]
async fn duplicate_email_without_identities_is_not_masked() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "remote-u1",
            "email": "t1@x.com",
            "identities": []
        })))
        .mount(&server)
        .await;

    let app = WondasTeach::new(config_for(&server, KEY)).unwrap();
    let outcome = app
        .auth()
        .sign_up(SignUpRequest::teacher("t1@x.com", "secret1", "Ada", "Obi"))
        .await;
    assert_eq!(outcome.kind, Some(ErrorKind::DuplicateEmail));
    assert_eq!(
        outcome.error.as_deref(),
        Some("An account with this email already exists. Please try signing in instead.")
    );
    assert_eq!(app.data().mock().get_analytics().await.unwrap().total_users, 0);
}
