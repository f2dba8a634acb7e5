//! Records shared by both backends
//!
//! Field names follow the hosted database's snake_case columns; the same
//! serialization is used for the local persistent store.

mod account;
mod application;
mod job;
mod media;
mod profile;
mod status;

pub use account::*;
pub use application::*;
pub use job::*;
pub use media::*;
pub use profile::*;
pub use status::*;

/// Returns `None` for missing or whitespace-only strings
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Whether a required string is present
pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
