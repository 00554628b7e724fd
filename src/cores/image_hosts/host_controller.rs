use async_trait::async_trait;

use crate::cores::errors::RelayError;
use crate::cores::schemas::HostedImage;

// Publishes raw image bytes and hands back a public URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn host(&self, image: &[u8], file_name: Option<&str>) -> Result<HostedImage, RelayError>;
}
