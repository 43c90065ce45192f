//! Blob storage uploads (Cloudinary unsigned upload preset).

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use shared::CloudinaryConfig;

#[derive(Debug, Clone)]
pub struct StorageService {
    cloud_name: String,
    upload_preset: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

impl StorageService {
    pub fn from_config(config: &CloudinaryConfig) -> Self {
        Self {
            cloud_name: config.cloud_name.clone(),
            upload_preset: config.upload_preset.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn upload_url(&self) -> String {
        format!("https://api.cloudinary.com/v1_1/{}/auto/upload", self.cloud_name)
    }

    /// Uploads into a per-account folder and returns the public URL and id.
    pub async fn upload(
        &self,
        user_id: i64,
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<StoredFile> {
        let mut part = Part::bytes(bytes).file_name(file_name);
        if let Some(mime) = content_type {
            part = part.mime_str(&mime)?;
        }

        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", format!("tradelog/{}", user_id));

        let response = self.client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .context("Upload request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!("Storage upload error ({}): {}", status, error_text));
        }

        let uploaded: UploadResponse = response.json().await?;
        Ok(StoredFile {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }
}
