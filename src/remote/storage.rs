//! Object storage uploads and signed URLs

use serde::Deserialize;
use serde_json::json;

use super::RemoteBackend;
use crate::error::Result;
use crate::fetch::Fetch;
use crate::models::ImageFile;

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl RemoteBackend {
    fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1{}", self.url, path)
    }

    /// Upload `file` to `path` in the image bucket, replacing any object there
    pub(super) async fn upload_object(&self, path: &str, file: ImageFile) -> Result<()> {
        let url = self.storage_url(&format!("/object/{}/{}", self.bucket, path));
        let fetch = Fetch::post(&self.client, &url)
            .bytes(file.bytes, &file.content_type)
            .header("Cache-Control", "3600")
            .header("x-upsert", "true");
        self.authorize(fetch).await.execute_empty().await
    }

    /// Time-limited URL for an object in the image bucket
    pub(super) async fn sign_object(&self, path: &str) -> Result<String> {
        let url = self.storage_url(&format!("/object/sign/{}/{}", self.bucket, path));
        let fetch = Fetch::post(&self.client, &url)
            .json(&json!({ "expiresIn": self.signed_url_expiry }))?;
        let signed: SignedUrlResponse = self.authorize(fetch).await.execute().await?;

        if signed.signed_url.starts_with("http") {
            Ok(signed.signed_url)
        } else {
            Ok(self.storage_url(&signed.signed_url))
        }
    }
}
