use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::configs::settings::{Config, ModelInput};
use crate::cores::errors::RelayError;
use crate::cores::predictions::client::{PredictionApi, ReplicateClient};
use crate::cores::predictions::poller::Poller;
use crate::cores::schemas::{CreatePrediction, UpscaleInput, UpscaleOutcome};
use crate::cores::upscale_models::upscale_controller::Upscaler;

// Real-ESRGAN hosted on Replicate.
pub struct RealEsrgan {
    api: Arc<dyn PredictionApi>,
    model_version: String,
    input: ModelInput,
    poller: Poller,
}

impl RealEsrgan {
    pub fn new(api: Arc<dyn PredictionApi>, model_version: String, input: ModelInput, poller: Poller) -> Self {
        RealEsrgan {
            api,
            model_version,
            input,
            poller,
        }
    }

    pub fn from_config(config: &Config, client: Client) -> Result<Self, RelayError> {
        let api = ReplicateClient::from_settings(&config.replicate, client)?;
        Ok(RealEsrgan::new(
            Arc::new(api),
            config.replicate.model_version.clone(),
            config.replicate.input.clone(),
            Poller::new(config.poll.policy()),
        ))
    }

    pub fn create_request(&self, image_url: &str) -> CreatePrediction {
        CreatePrediction {
            version: self.model_version.clone(),
            input: UpscaleInput::new(image_url, &self.input),
        }
    }
}

#[async_trait]
impl Upscaler for RealEsrgan {
    async fn upscale(&self, image_url: &str, cancel: CancellationToken) -> Result<UpscaleOutcome, RelayError> {
        // 1. Submit the job
        let created = self.api.create(&self.create_request(image_url)).await?;
        info!("submitted prediction {} for {}", created.id, image_url);

        // 2. Poll on its own task so a dropped request can still cancel upstream
        let api = Arc::clone(&self.api);
        let poller = self.poller.clone();
        let task = tokio::spawn(async move {
            poller.wait_for_terminal(api.as_ref(), created, &cancel).await
        });
        let finished = task
            .await
            .map_err(|err| RelayError::Internal(format!("poll task ended abnormally: {}", err)))??;

        // 3. Normalize the output shape
        let artifacts = finished.artifacts()?;
        Ok(UpscaleOutcome {
            prediction_id: finished.id,
            artifacts,
        })
    }
}
