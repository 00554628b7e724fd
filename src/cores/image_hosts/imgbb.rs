use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{error, info};
use reqwest::Client;

use crate::configs::settings::ImgBbSettings;
use crate::cores::errors::RelayError;
use crate::cores::image_hosts::host_controller::ImageHost;
use crate::cores::schemas::{HostedImage, ImgBbResponse};

pub struct ImgBb {
    client: Client,
    api_base: String,
    api_key: String,
    expiration_secs: Option<u64>,
}

impl ImgBb {
    pub fn from_settings(settings: &ImgBbSettings, client: Client) -> Result<Self, RelayError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or(RelayError::MissingCredential("IMGBB_API_KEY"))?;
        Ok(ImgBb {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            api_key,
            expiration_secs: settings.expiration_secs,
        })
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("key", self.api_key.clone())];
        if let Some(expiration) = self.expiration_secs {
            query.push(("expiration", expiration.to_string()));
        }
        query
    }
}

#[async_trait]
impl ImageHost for ImgBb {
    async fn host(&self, image: &[u8], file_name: Option<&str>) -> Result<HostedImage, RelayError> {
        if image.is_empty() {
            return Err(RelayError::InvalidInput("the uploaded image is empty".to_string()));
        }

        // 1. ImgBB takes the file base64 encoded in a urlencoded form
        let mut form = vec![("image", STANDARD.encode(image))];
        if let Some(name) = file_name.filter(|n| !n.is_empty()) {
            form.push(("name", name.to_string()));
        }

        // 2. Send the upload
        let response = self.client.post(format!("{}/upload", self.api_base))
            .query(&self.query())
            .form(&form)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        // 3. ImgBB reports failures in the body, often with a 4xx status as well
        let body: ImgBbResponse = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(err) if status.is_success() => {
                return Err(RelayError::Decode {
                    service: "image host",
                    message: format!("{}: {}", err, text),
                });
            }
            Err(_) => {
                return Err(RelayError::Upstream {
                    service: "image host",
                    status: status.as_u16(),
                    message: text,
                });
            }
        };

        match body.data {
            Some(data) if body.success => {
                info!("hosted {} bytes at {}", image.len(), data.url);
                Ok(HostedImage {
                    url: data.url,
                    delete_url: data.delete_url,
                })
            }
            _ => {
                let message = body
                    .error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "unknown error".to_string());
                error!(target: "error_log", "image host rejected upload ({}): {}", status, message);
                Err(RelayError::HostRejected(message))
            }
        }
    }
}
