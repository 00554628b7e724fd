pub mod log;

use std::time::Duration;

use reqwest::Client;

use crate::configs::settings::ServerSettings;

// One client shared by every relay; reqwest pools connections internally.
pub fn build_http_client(server: &ServerSettings) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(server.upstream_timeout_secs.max(1)))
        .user_agent(concat!("upscaler/", env!("CARGO_PKG_VERSION")))
        .build()
}
