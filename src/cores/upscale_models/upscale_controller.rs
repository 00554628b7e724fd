use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::cores::errors::RelayError;
use crate::cores::schemas::UpscaleOutcome;

#[async_trait]
pub trait Upscaler: Send + Sync {
    async fn upscale(&self, image_url: &str, cancel: CancellationToken) -> Result<UpscaleOutcome, RelayError>;
}
