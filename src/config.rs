//! Configuration for the data-access layer

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// URL shipped in unconfigured builds
pub const PLACEHOLDER_URL: &str = "https://your-project-id.supabase.co";

/// Anon key shipped in unconfigured builds
pub const PLACEHOLDER_ANON_KEY: &str = "your-anon-key-here";

/// Keys shorter than this cannot be real Supabase anon keys
const MIN_KEY_LEN: usize = 20;

/// What happens when a teacher applies to the same job twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateApplicationPolicy {
    /// Every submission is stored (append-only)
    #[default]
    Allow,
    /// A second application to the same job fails validation
    Reject,
}

/// Configuration options for the backends
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// The base URL of the hosted backend
    pub url: String,

    /// The public (anon) API key of the hosted backend
    pub anon_key: String,

    /// Per-request timeout for remote calls
    pub request_timeout: Option<Duration>,

    /// Directory for the local persistent store; in-memory when unset
    pub storage_dir: Option<PathBuf>,

    /// Object-storage bucket for profile images and school logos
    pub profile_bucket: String,

    /// Lifetime of signed image URLs
    pub signed_url_expiry: Duration,

    /// Resubmission policy for applications
    pub duplicate_applications: DuplicateApplicationPolicy,

    /// Seed an empty mock store with a sample school, teacher and job
    pub seed_sample_data: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: PLACEHOLDER_URL.to_string(),
            anon_key: PLACEHOLDER_ANON_KEY.to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            storage_dir: None,
            profile_bucket: "wondasteach-profiles".to_string(),
            signed_url_expiry: Duration::from_secs(31_536_000),
            duplicate_applications: DuplicateApplicationPolicy::Allow,
            seed_sample_data: true,
        }
    }
}

impl BackendConfig {
    /// Create a configuration for the given backend credentials
    pub fn new(url: &str, anon_key: &str) -> Self {
        Self::default().with_url(url).with_anon_key(anon_key)
    }

    /// Read `SUPABASE_URL`, `SUPABASE_ANON_KEY` and `WONDASTEACH_DATA_DIR`.
    ///
    /// Missing credentials fall back to the placeholders, which keeps the
    /// whole application on the mock backend.
    pub fn from_env() -> Self {
        let url = std::env::var("SUPABASE_URL").unwrap_or_else(|_| PLACEHOLDER_URL.to_string());
        let anon_key = std::env::var("SUPABASE_ANON_KEY")
            .unwrap_or_else(|_| PLACEHOLDER_ANON_KEY.to_string());
        let storage_dir = std::env::var_os("WONDASTEACH_DATA_DIR").map(PathBuf::from);

        Self::new(&url, &anon_key).with_storage_dir(storage_dir)
    }

    /// Whether the credentials look like a real hosted project
    pub fn has_real_credentials(&self) -> bool {
        if self.url == PLACEHOLDER_URL || self.anon_key == PLACEHOLDER_ANON_KEY {
            return false;
        }
        if self.anon_key.len() <= MIN_KEY_LEN {
            return false;
        }
        match Url::parse(&self.url) {
            Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
            Err(_) => false,
        }
    }

    /// Per-user data directory for the file-backed store
    pub fn default_data_dir() -> PathBuf {
        match directories::ProjectDirs::from("", "", "wondasteach") {
            Some(dirs) => dirs.data_dir().to_path_buf(),
            None => PathBuf::from(".wondasteach"),
        }
    }

    /// Set the backend URL
    pub fn with_url(mut self, value: &str) -> Self {
        self.url = value.trim_end_matches('/').to_string();
        self
    }

    /// Set the anon key
    pub fn with_anon_key(mut self, value: &str) -> Self {
        self.anon_key = value.to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the local store directory
    pub fn with_storage_dir(mut self, value: Option<PathBuf>) -> Self {
        self.storage_dir = value;
        self
    }

    /// Set the image bucket
    pub fn with_profile_bucket(mut self, value: &str) -> Self {
        self.profile_bucket = value.to_string();
        self
    }

    /// Set the signed URL lifetime
    pub fn with_signed_url_expiry(mut self, value: Duration) -> Self {
        self.signed_url_expiry = value;
        self
    }

    /// Set the duplicate application policy
    pub fn with_duplicate_applications(mut self, value: DuplicateApplicationPolicy) -> Self {
        self.duplicate_applications = value;
        self
    }

    /// Enable or disable sample data seeding
    pub fn with_seed_sample_data(mut self, value: bool) -> Self {
        self.seed_sample_data = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REAL_KEY: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.anon";

    #[test]
    fn placeholders_are_not_real_credentials() {
        assert!(!BackendConfig::default().has_real_credentials());
        assert!(!BackendConfig::new(PLACEHOLDER_URL, REAL_KEY).has_real_credentials());
        assert!(!BackendConfig::new("https://abc.supabase.co", PLACEHOLDER_ANON_KEY)
            .has_real_credentials());
    }

    #[test]
    fn short_keys_and_bad_urls_are_rejected() {
        assert!(!BackendConfig::new("https://abc.supabase.co", "short").has_real_credentials());
        assert!(!BackendConfig::new("not a url", REAL_KEY).has_real_credentials());
        assert!(!BackendConfig::new("ftp://abc.supabase.co", REAL_KEY).has_real_credentials());
    }

    #[test]
    fn real_credentials_are_accepted() {
        assert!(BackendConfig::new("https://abc.supabase.co", REAL_KEY).has_real_credentials());
        assert!(BackendConfig::new("http://127.0.0.1:54321", REAL_KEY).has_real_credentials());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = BackendConfig::new("https://abc.supabase.co/", REAL_KEY);
        assert_eq!(config.url, "https://abc.supabase.co");
    }

    #[test]
    fn builder_setters() {
        let config = BackendConfig::default()
            .with_request_timeout(None)
            .with_profile_bucket("images")
            .with_duplicate_applications(DuplicateApplicationPolicy::Reject)
            .with_seed_sample_data(false);
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.profile_bucket, "images");
        assert_eq!(config.duplicate_applications, DuplicateApplicationPolicy::Reject);
        assert!(!config.seed_sample_data);
    }
}
