//! WondasTeach data-access library
//!
//! The data layer of a job board connecting teachers and schools: profiles,
//! job postings and applications, served by a hosted Supabase project or by
//! a local mock backend when no project is configured or it cannot be
//! reached.

pub mod backend;
pub mod config;
pub mod error;
pub mod facade;
pub mod fetch;
pub mod mock;
pub mod models;
pub mod remote;
pub mod session;
pub mod store;

use std::sync::Arc;

use crate::backend::Backend;
use crate::config::BackendConfig;
use crate::error::Result;
use crate::facade::DataAccess;
use crate::session::AuthSession;

/// The main entry point: one data-access facade and the auth state on top of it
pub struct WondasTeach {
    data: Arc<DataAccess>,
    auth: AuthSession,
}

impl WondasTeach {
    /// Create an instance for the given configuration
    ///
    /// # Example
    ///
    /// ```
    /// use wondasteach::{WondasTeach, config::BackendConfig};
    ///
    /// // Placeholder credentials keep everything on the in-memory mock backend.
    /// let app = WondasTeach::new(BackendConfig::default()).unwrap();
    /// assert!(!app.data().connection_status().has_real_credentials);
    /// ```
    pub fn new(config: BackendConfig) -> Result<Self> {
        let data = Arc::new(DataAccess::new(config)?);
        let backend: Arc<dyn Backend> = data.clone();
        Ok(Self {
            data,
            auth: AuthSession::new(backend),
        })
    }

    /// Create an instance configured from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(BackendConfig::from_env())
    }

    /// The data-access facade used for every backend operation
    pub fn data(&self) -> &DataAccess {
        &self.data
    }

    /// The auth state for this instance
    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::backend::{Backend, DEFAULT_LIST_LIMIT};
    pub use crate::config::{BackendConfig, DuplicateApplicationPolicy};
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::facade::{ConnectionStatus, DataAccess};
    pub use crate::mock::MockBackend;
    pub use crate::models::*;
    pub use crate::remote::RemoteBackend;
    pub use crate::session::{AuthSession, AuthState, Outcome};
    pub use crate::store::LocalStore;
    pub use crate::WondasTeach;
}
