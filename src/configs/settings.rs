use serde::Deserialize;
use std::fs::{File, metadata};
use std::io::Read;
use std::time::Duration;

use crate::cores::predictions::poller::PollPolicy;

const SYSTEM_CONFIG_PATH: &str = "/etc/upscaler/configs.yaml";
const LOCAL_CONFIG_PATH: &str = "src/configs/configs.yaml";

// ---------------------------------------------- Server ----------------------------------------------
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
    pub port: u16,
    // Upper bound for a multipart upload held in memory
    pub max_upload_bytes: usize,
    // Per-call timeout for every outbound request
    pub upstream_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            max_upload_bytes: 32 * 1024 * 1024,
            upstream_timeout_secs: 30,
        }
    }
}

// ---------------------------------------------- Replicate ----------------------------------------------
// Fixed input parameters sent with every prediction
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ModelInput {
    pub variant: String,
    pub scale: u32,
    pub tile: u32,
    pub face_enhance: bool,
}

impl Default for ModelInput {
    fn default() -> Self {
        ModelInput {
            variant: "General - v3".to_string(),
            scale: 4,
            tile: 0,
            face_enhance: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReplicateSettings {
    pub api_base: String,
    pub api_token: Option<String>,
    pub model_version: String,
    pub input: ModelInput,
}

impl Default for ReplicateSettings {
    fn default() -> Self {
        ReplicateSettings {
            api_base: "https://api.replicate.com/v1".to_string(),
            api_token: None,
            // xinntao/realesrgan
            model_version: "7b58129048a176846747d6929a56526ac87f6515c0e81b67f1b40289f64e0a4f".to_string(),
            input: ModelInput::default(),
        }
    }
}

// ---------------------------------------------- Polling ----------------------------------------------
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollSettings {
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub backoff_factor: f64,
    pub max_attempts: u32,
    pub timeout_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            initial_interval_ms: 1000,
            max_interval_ms: 5000,
            backoff_factor: 1.5,
            max_attempts: 120,
            timeout_secs: 300,
        }
    }
}

impl PollSettings {
    pub fn policy(&self) -> PollPolicy {
        let initial = Duration::from_millis(self.initial_interval_ms.max(1));
        PollPolicy {
            initial_interval: initial,
            max_interval: Duration::from_millis(self.max_interval_ms).max(initial),
            // NaN, infinite or sub-1.0 factors fall back to a fixed interval
            backoff_factor: if self.backoff_factor.is_finite() && self.backoff_factor >= 1.0 {
                self.backoff_factor
            } else {
                1.0
            },
            max_attempts: self.max_attempts.max(1),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        }
    }
}

// ---------------------------------------------- ImgBB ----------------------------------------------
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ImgBbSettings {
    pub api_base: String,
    pub api_key: Option<String>,
    // Hosted images are deleted after this many seconds when set
    pub expiration_secs: Option<u64>,
}

impl Default for ImgBbSettings {
    fn default() -> Self {
        ImgBbSettings {
            api_base: "https://api.imgbb.com/1".to_string(),
            api_key: None,
            expiration_secs: None,
        }
    }
}

// ---------------------------------------------- Config ----------------------------------------------
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub replicate: ReplicateSettings,
    pub poll: PollSettings,
    pub imgbb: ImgBbSettings,
}

impl Config {
    // Read the YAML file if one exists, then let the environment override credentials.
    pub fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
        let config_path = if metadata(SYSTEM_CONFIG_PATH).is_ok() {
            Some(SYSTEM_CONFIG_PATH)
        } else if metadata(LOCAL_CONFIG_PATH).is_ok() {
            Some(LOCAL_CONFIG_PATH)
        } else {
            None
        };

        let mut config = match config_path {
            Some(path) => {
                let mut file = File::open(path)?;
                let mut contents = String::new();
                file.read_to_string(&mut contents)?;
                Config::from_yaml(&contents)?
            }
            None => Config::default(),
        };

        dotenvy::dotenv().ok();
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Config, serde_yaml::Error> {
        let mut config: Config = serde_yaml::from_str(contents)?;
        config.normalize_credentials();
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("REPLICATE_API_TOKEN") {
            self.replicate.api_token = Some(token);
        }
        if let Some(key) = lookup("IMGBB_API_KEY") {
            self.imgbb.api_key = Some(key);
        }
        if let Some(port) = lookup("UPSCALER_PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        self.normalize_credentials();
    }

    // Blank credentials count as absent.
    fn normalize_credentials(&mut self) {
        self.replicate.api_token = non_blank(self.replicate.api_token.take());
        self.imgbb.api_key = non_blank(self.imgbb.api_key.take());
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
