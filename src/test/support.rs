use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::configs::settings::Config;
use crate::cores::errors::RelayError;
use crate::cores::predictions::client::PredictionApi;
use crate::cores::predictions::poller::PollPolicy;
use crate::cores::schemas::{CreatePrediction, JobStatus, Prediction};

pub const TOKEN: &str = "test-token";
pub const IMGBB_KEY: &str = "imgbb-key";

pub fn fast_policy() -> PollPolicy {
    PollPolicy {
        initial_interval: Duration::from_millis(1),
        max_interval: Duration::from_millis(2),
        backoff_factor: 2.0,
        max_attempts: 50,
        timeout: Duration::from_secs(5),
    }
}

// Config pointing both providers at one mock server, with polling sped up.
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.replicate.api_base = base_url.to_string();
    config.replicate.api_token = Some(TOKEN.to_string());
    config.imgbb.api_base = base_url.to_string();
    config.imgbb.api_key = Some(IMGBB_KEY.to_string());
    config.poll.initial_interval_ms = 1;
    config.poll.max_interval_ms = 2;
    config.poll.max_attempts = 20;
    config.poll.timeout_secs = 5;
    config
}

/// In-memory provider that walks every job through the same status script.
///
/// Each `create` issues a fresh id; each `get` advances only that job. Once
/// the script runs out the last status repeats.
pub struct ScriptedPredictions {
    script: Vec<JobStatus>,
    output: Option<Value>,
    error: String,
    poll_failure: Option<u16>,
    next_id: AtomicUsize,
    progress: Mutex<HashMap<String, usize>>,
    pub created: Mutex<Vec<CreatePrediction>>,
    pub polled: Mutex<Vec<String>>,
    pub cancelled: Mutex<Vec<String>>,
}

impl ScriptedPredictions {
    pub fn new(script: Vec<JobStatus>) -> Self {
        ScriptedPredictions {
            script,
            output: None,
            error: "CUDA out of memory".to_string(),
            poll_failure: None,
            next_id: AtomicUsize::new(0),
            progress: Mutex::new(HashMap::new()),
            created: Mutex::new(Vec::new()),
            polled: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
        }
    }

    pub fn with_output(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.error = error.to_string();
        self
    }

    // Every status check answers with this HTTP status instead of the script
    pub fn with_poll_failure(mut self, status: u16) -> Self {
        self.poll_failure = Some(status);
        self
    }

    pub fn polls_for(&self, id: &str) -> usize {
        self.polled.lock().unwrap().iter().filter(|p| p.as_str() == id).count()
    }

    fn snapshot(&self, id: &str, status: JobStatus) -> Prediction {
        let output = match status {
            JobStatus::Succeeded => Some(
                self.output
                    .clone()
                    .unwrap_or_else(|| json!(format!("https://cdn.example.com/{}.png", id))),
            ),
            _ => None,
        };
        let error = match status {
            JobStatus::Failed => Some(json!(self.error)),
            _ => None,
        };
        Prediction {
            id: id.to_string(),
            status,
            output,
            error,
        }
    }
}

#[async_trait]
impl PredictionApi for ScriptedPredictions {
    async fn create(&self, request: &CreatePrediction) -> Result<Prediction, RelayError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("job-{}", n);
        self.created.lock().unwrap().push(request.clone());
        self.progress.lock().unwrap().insert(id.clone(), 0);
        Ok(self.snapshot(&id, JobStatus::Starting))
    }

    async fn get(&self, id: &str) -> Result<Prediction, RelayError> {
        if let Some(status) = self.poll_failure {
            self.polled.lock().unwrap().push(id.to_string());
            return Err(RelayError::from_poll_failure(status, r#"{"detail":"Not found."}"#));
        }
        let status = {
            let mut progress = self.progress.lock().unwrap();
            let step = progress.entry(id.to_string()).or_insert(0);
            let status = self
                .script
                .get(*step)
                .or_else(|| self.script.last())
                .copied()
                .unwrap_or(JobStatus::Processing);
            *step += 1;
            status
        };
        self.polled.lock().unwrap().push(id.to_string());
        Ok(self.snapshot(id, status))
    }

    async fn cancel(&self, id: &str) -> Result<(), RelayError> {
        self.cancelled.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

// Multipart body with a single part; returns (content type, body).
pub fn multipart_body(field: &str, file_name: Option<&str>, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "----upscalerTestBoundary7MA4YWxkTrZu0gW";
    let disposition = match file_name {
        Some(name) => format!("form-data; name=\"{}\"; filename=\"{}\"", field, name),
        None => format!("form-data; name=\"{}\"", field),
    };
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Disposition: {}\r\n", disposition).as_bytes());
    if file_name.is_some() {
        body.extend_from_slice(b"Content-Type: image/png\r\n");
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}
