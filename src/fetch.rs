//! HTTP request helper for the hosted backend
//!
//! Failed responses are classified here, where the status code and error
//! body are still at hand, so callers only ever see an [`ErrorKind`].
//!
//! [`ErrorKind`]: crate::error::ErrorKind

use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            query_params: Vec::new(),
            body: None,
        }
    }

    /// Add a header to the request; invalid names or values are skipped
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add bearer token authentication to the request
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Append one query parameter, keeping insertion order
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query_params.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    /// Add a raw body with its content type
    pub fn bytes(mut self, body: Vec<u8>, content_type: &str) -> Self {
        self.body = Some(body);
        self.header("Content-Type", content_type)
    }

    fn build(&self) -> Result<RequestBuilder> {
        let mut url = Url::parse(&self.url)?;
        if !self.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                pairs.append_pair(key, value);
            }
        }

        let mut req = self
            .client
            .request(self.method.clone(), url.as_str())
            .headers(self.headers.clone());
        if let Some(body) = &self.body {
            req = req.body(body.clone());
        }
        Ok(req)
    }

    async fn send(&self) -> Result<reqwest::Response> {
        let req = self.build()?;
        debug!("{} {}", self.method, self.url);
        let response = req.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        Err(classify(status, &text, &self.url))
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<T> {
        let response = self.send().await?;
        Ok(response.json::<T>().await?)
    }

    /// Execute the request and discard the response body
    pub async fn execute_empty(&self) -> Result<()> {
        self.send().await?;
        Ok(())
    }
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a POST request
    pub fn post<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::POST)
    }

    /// Create a PATCH request
    pub fn patch<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::PATCH)
    }
}

/// Error body shapes returned by the auth, table and storage APIs
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn code(&self) -> Option<&str> {
        self.error_code
            .as_deref()
            .or_else(|| self.code.as_ref().and_then(|c| c.as_str()))
            .or(self.error.as_deref())
    }

    fn message(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
    }
}

/// Map a failed response onto the error taxonomy
pub(crate) fn classify(status: StatusCode, body: &str, url: &str) -> Error {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = match parsed.message() {
        Some(message) => message.to_string(),
        None if body.trim().is_empty() => status.to_string(),
        None => body.trim().to_string(),
    };

    if status.is_server_error() {
        return Error::connectivity(format!("{}: {}", status, message));
    }

    match parsed.code() {
        Some("user_already_exists") | Some("email_exists") => {
            return Error::DuplicateEmail(message)
        }
        Some("invalid_credentials") | Some("invalid_grant") => return Error::InvalidCredentials,
        Some("email_not_confirmed") => return Error::EmailNotConfirmed,
        _ => {}
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::permission_denied(message),
        StatusCode::NOT_FOUND => {
            let path = Url::parse(url)
                .map(|u| u.path().to_string())
                .unwrap_or_else(|_| url.to_string());
            Error::not_found(format!("Resource {}", path))
        }
        s if s.is_client_error() => Error::validation(message),
        _ => Error::internal(format!("Unexpected response {}: {}", status, message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const URL: &str = "http://localhost/rest/v1/jobs";

    #[test]
    fn server_errors_are_connectivity() {
        let err = classify(StatusCode::BAD_GATEWAY, "", URL);
        assert_eq!(err.kind(), ErrorKind::Connectivity);
        let err = classify(StatusCode::SERVICE_UNAVAILABLE, "{\"message\":\"down\"}", URL);
        assert_eq!(err.kind(), ErrorKind::Connectivity);
    }

    #[test]
    fn gotrue_codes_become_domain_errors() {
        let body = r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#;
        assert_eq!(
            classify(StatusCode::UNPROCESSABLE_ENTITY, body, URL).kind(),
            ErrorKind::DuplicateEmail
        );

        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            classify(StatusCode::BAD_REQUEST, body, URL).kind(),
            ErrorKind::InvalidCredentials
        );

        let body = r#"{"code":400,"error_code":"email_not_confirmed","msg":"Email not confirmed"}"#;
        assert_eq!(
            classify(StatusCode::BAD_REQUEST, body, URL).kind(),
            ErrorKind::EmailNotConfirmed
        );
    }

    #[test]
    fn status_fallbacks() {
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, "{\"message\":\"JWT expired\"}", URL).kind(),
            ErrorKind::PermissionDenied
        );
        let not_found = classify(StatusCode::NOT_FOUND, "", URL);
        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert!(not_found.to_string().contains("/rest/v1/jobs"));

        let body = r#"{"code":"23502","message":"null value in column \"title\""}"#;
        let err = classify(StatusCode::BAD_REQUEST, body, URL);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("title"));
    }
}
