use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response};

use crate::configs::settings::ReplicateSettings;
use crate::cores::errors::RelayError;
use crate::cores::schemas::{CreatePrediction, Prediction};

// Outbound surface of the inference provider.
#[async_trait]
pub trait PredictionApi: Send + Sync {
    async fn create(&self, request: &CreatePrediction) -> Result<Prediction, RelayError>;
    async fn get(&self, id: &str) -> Result<Prediction, RelayError>;
    async fn cancel(&self, id: &str) -> Result<(), RelayError>;
}

pub struct ReplicateClient {
    client: Client,
    api_base: String,
    api_token: String,
}

impl ReplicateClient {
    // Fails without touching the network when no token is configured.
    pub fn from_settings(settings: &ReplicateSettings, client: Client) -> Result<Self, RelayError> {
        let api_token = settings
            .api_token
            .clone()
            .ok_or(RelayError::MissingCredential("REPLICATE_API_TOKEN"))?;
        Ok(ReplicateClient {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    fn predictions_url(&self) -> String {
        format!("{}/predictions", self.api_base)
    }

    fn prediction_url(&self, id: &str) -> String {
        format!("{}/predictions/{}", self.api_base, id)
    }

    fn authorization(&self) -> String {
        format!("Token {}", self.api_token)
    }
}

async fn read_prediction(response: Response, on_failure: fn(u16, &str) -> RelayError) -> Result<Prediction, RelayError> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(on_failure(status.as_u16(), &text));
    }
    serde_json::from_str(&text).map_err(|err| RelayError::Decode {
        service: "prediction",
        message: format!("{}: {}", err, text),
    })
}

#[async_trait]
impl PredictionApi for ReplicateClient {
    async fn create(&self, request: &CreatePrediction) -> Result<Prediction, RelayError> {
        let response = self.client.post(self.predictions_url())
            .header("Authorization", self.authorization())
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;
        let prediction = read_prediction(response, RelayError::from_prediction_failure).await?;
        debug!("created prediction {} ({:?})", prediction.id, prediction.status);
        Ok(prediction)
    }

    async fn get(&self, id: &str) -> Result<Prediction, RelayError> {
        let response = self.client.get(self.prediction_url(id))
            .header("Authorization", self.authorization())
            .send()
            .await?;
        read_prediction(response, RelayError::from_poll_failure).await
    }

    async fn cancel(&self, id: &str) -> Result<(), RelayError> {
        let response = self.client.post(format!("{}/cancel", self.prediction_url(id)))
            .header("Authorization", self.authorization())
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(RelayError::from_poll_failure(status.as_u16(), &text))
        }
    }
}
