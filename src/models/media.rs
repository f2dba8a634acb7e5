//! Image uploads

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// Largest accepted image (5 MiB)
pub const MAX_IMAGE_BYTES: usize = 5_242_880;

/// Accepted image MIME types
pub const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// File name suffixes kept as-is in object paths
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// An image file selected for upload
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageFile {
    pub fn new(file_name: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes,
        }
    }

    /// Size and type checks shared by both backends
    pub fn validate(&self) -> Result<()> {
        if self.bytes.is_empty() {
            return Err(Error::validation("No file provided"));
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(Error::validation("File size must be less than 5MB"));
        }
        if !ALLOWED_IMAGE_TYPES.contains(&self.content_type.as_str()) {
            return Err(Error::validation(
                "Invalid file type. Please upload a JPEG, PNG, GIF, or WebP image.",
            ));
        }
        Ok(())
    }

    /// Extension from the file name when it is a known image suffix,
    /// otherwise one derived from the MIME type
    pub fn extension(&self) -> String {
        let from_name = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()));
        from_name.unwrap_or_else(|| {
            match self.content_type.as_str() {
                "image/jpeg" => "jpg",
                "image/gif" => "gif",
                "image/webp" => "webp",
                _ => "png",
            }
            .to_string()
        })
    }
}

/// What an uploaded image is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    ProfileImage,
    SchoolLogo,
}

impl ImageKind {
    fn prefix(self) -> &'static str {
        match self {
            ImageKind::ProfileImage => "profile",
            ImageKind::SchoolLogo => "logo",
        }
    }

    /// Object key: `<user_id>/<kind>-<millis>.<ext>`
    pub fn object_path(self, user_id: &str, file: &ImageFile, now: DateTime<Utc>) -> String {
        format!(
            "{}/{}-{}.{}",
            user_id,
            self.prefix(),
            now.timestamp_millis(),
            file.extension()
        )
    }
}
