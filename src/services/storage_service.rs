use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};

/// Thin client for the object-storage HTTP API (Supabase-compatible signed
/// URL endpoints). The service key never leaves the backend; candidates and
/// reviewers only ever see time-limited signed URLs.
#[derive(Clone)]
pub struct StorageService {
    client: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

#[derive(Debug, Deserialize)]
struct SignedUploadResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl StorageService {
    pub fn new(base_url: String, service_key: String, bucket: String, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            bucket,
        }
    }

    /// Signed destination for one direct-to-storage PUT, scoped to a single
    /// object path.
    pub async fn create_signed_upload_url(&self, storage_path: &str) -> Result<String> {
        let endpoint = format!(
            "{}/object/upload/sign/{}/{}",
            self.base_url, self.bucket, storage_path
        );
        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ExternalService(format!(
                "Failed to create upload url ({}): {}",
                status, body
            )));
        }

        let parsed: SignedUploadResponse = response.json().await?;
        Ok(self.absolute(&parsed.url))
    }

    /// Time-limited read URL for in-page playback.
    pub async fn create_signed_url(&self, storage_path: &str, expires_in_secs: u32) -> Result<String> {
        let endpoint = format!(
            "{}/object/sign/{}/{}",
            self.base_url, self.bucket, storage_path
        );
        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.service_key)
            .json(&json!({ "expiresIn": expires_in_secs }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ExternalService(format!(
                "Failed to generate video URL ({}): {}",
                status, body
            )));
        }

        let parsed: SignedUrlResponse = response.json().await?;
        Ok(self.absolute(&parsed.signed_url))
    }

    pub async fn remove_objects(&self, storage_paths: &[String]) -> Result<()> {
        if storage_paths.is_empty() {
            return Ok(());
        }
        let endpoint = format!("{}/object/{}", self.base_url, self.bucket);
        let response = self
            .client
            .delete(&endpoint)
            .bearer_auth(&self.service_key)
            .json(&json!({ "prefixes": storage_paths }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ExternalService(format!(
                "Failed to delete objects ({}): {}",
                status, body
            )));
        }
        Ok(())
    }

    fn absolute(&self, maybe_relative: &str) -> String {
        if maybe_relative.starts_with("http://") || maybe_relative.starts_with("https://") {
            maybe_relative.to_string()
        } else {
            format!("{}/{}", self.base_url, maybe_relative.trim_start_matches('/'))
        }
    }
}
