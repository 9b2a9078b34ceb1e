use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;

use crate::domain::repository::ObjectStoragePort;

/// HTTP client for the object-storage collaborator that mirrors QR
/// artifacts for mail embedding. Every failure here is non-fatal to the
/// caller — tickets keep working with the inline artifact alone.
#[derive(Clone)]
pub struct HttpObjectStorage {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpObjectStorage {
    pub fn new(base_url: String, api_key: String) -> Result<Self, anyhow::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build storage HTTP client")?;
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }
}

impl ObjectStoragePort for HttpObjectStorage {
    async fn upload_png(
        &self,
        bytes: Vec<u8>,
        folder: &str,
        public_id: &str,
    ) -> Result<String, anyhow::Error> {
        let url = format!(
            "{}/images/{folder}/{public_id}",
            self.base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(bytes)
            .send()
            .await
            .context("storage upload request")?
            .error_for_status()
            .context("storage upload rejected")?;

        let uploaded: UploadedDto = response.json().await.context("decode storage response")?;
        Ok(uploaded.secure_url)
    }
}

#[derive(Deserialize)]
struct UploadedDto {
    secure_url: String,
}
