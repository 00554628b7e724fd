use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::configs::settings::ModelInput;
use crate::cores::errors::RelayError;

// ---------------------------------------------- Replicate ----------------------------------------------
// Body of POST /predictions
#[derive(Debug, Clone, Serialize)]
pub struct CreatePrediction {
    pub version: String,
    pub input: UpscaleInput,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UpscaleInput {
    pub img: String,
    pub version: String,
    pub scale: u32,
    pub tile: u32,
    pub face_enhance: bool,
}

impl UpscaleInput {
    pub fn new(image_url: &str, model: &ModelInput) -> Self {
        UpscaleInput {
            img: image_url.to_string(),
            version: model.variant.clone(),
            scale: model.scale,
            tile: model.tile,
            face_enhance: model.face_enhance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[serde(alias = "pending", alias = "queued")]
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    // Statuses this relay does not know are treated as still running.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed | JobStatus::Canceled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

// Model versions disagree on whether `output` is one URL or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictionOutput {
    One(String),
    Many(Vec<String>),
}

impl Prediction {
    // Normalize the succeeded output into an ordered list of artifact URLs.
    pub fn artifacts(&self) -> Result<Vec<String>, RelayError> {
        let raw = self.output.clone().unwrap_or(Value::Null);
        let urls = match serde_json::from_value::<PredictionOutput>(raw.clone()) {
            Ok(PredictionOutput::One(url)) => vec![url],
            Ok(PredictionOutput::Many(urls)) => urls,
            Err(_) => return Err(RelayError::UnexpectedOutput(raw.to_string())),
        };
        let urls: Vec<String> = urls.into_iter().filter(|u| !u.trim().is_empty()).collect();
        if urls.is_empty() {
            return Err(RelayError::UnexpectedOutput(raw.to_string()));
        }
        Ok(urls)
    }

    pub fn error_text(&self) -> String {
        match &self.error {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => format!("job ended with status {:?} and no error details", self.status),
            Some(other) => other.to_string(),
        }
    }
}

// ---------------------------------------------- ImgBB ----------------------------------------------
#[derive(Debug, Deserialize)]
pub struct ImgBbResponse {
    #[serde(default)]
    pub success: bool,
    pub data: Option<ImgBbData>,
    pub error: Option<ImgBbError>,
}

#[derive(Debug, Deserialize)]
pub struct ImgBbData {
    pub url: String,
    pub delete_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImgBbError {
    pub message: Option<String>,
}

// ---------------------------------------------- Relay results ----------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct UpscaleOutcome {
    pub prediction_id: String,
    pub artifacts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostedImage {
    pub url: String,
    pub delete_url: Option<String>,
}
