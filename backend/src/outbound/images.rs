//! Cloudinary-backed image hosting adapter.
//!
//! Uploads base64-encoded listing photos through an unsigned upload preset
//! and returns the hosted HTTPS URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::domain::ports::{GatewayError, ImageStore};

use super::http::{map_status_error, map_transport_error};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Account settings for the Cloudinary adapter.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    /// API origin, e.g. `https://api.cloudinary.com`.
    pub api_base: Url,
    pub cloud_name: String,
    /// Unsigned upload preset registered with the account.
    pub upload_preset: String,
    /// Asset folder listing photos are grouped under.
    pub folder: String,
}

/// Cloudinary adapter implementing the [`ImageStore`] port.
pub struct CloudinaryImageStore {
    client: Client,
    config: CloudinaryConfig,
}

impl CloudinaryImageStore {
    /// Build an adapter with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: CloudinaryConfig) -> Result<Self, reqwest::Error> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(
        config: CloudinaryConfig,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }
}

#[derive(Debug, Deserialize)]
struct UploadDto {
    secure_url: String,
}

fn parse_upload(body: &[u8]) -> Result<String, GatewayError> {
    let upload: UploadDto = serde_json::from_slice(body)
        .map_err(|err| GatewayError::decode(format!("invalid upload payload: {err}")))?;
    Ok(upload.secure_url)
}

#[async_trait]
impl ImageStore for CloudinaryImageStore {
    async fn upload(&self, image: &str) -> Result<String, GatewayError> {
        let path = format!("/v1_1/{}/image/upload", self.config.cloud_name);
        let url = self
            .config
            .api_base
            .join(&path)
            .map_err(|err| GatewayError::transport(format!("invalid endpoint {path}: {err}")))?;

        let response = self
            .client
            .post(url)
            .form(&[
                ("file", image),
                ("upload_preset", self.config.upload_preset.as_str()),
                ("folder", self.config.folder.as_str()),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_upload(body.as_ref())
    }
}
