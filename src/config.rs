use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::backend::RestBackend;
use crate::error::ConfigError;

/// Connection and behaviour settings for the listing desk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the hosted backend, e.g. `https://project.example.co`
    pub backend_url: Option<String>,
    /// Public API key sent with every request
    pub api_key: Option<String>,
    /// Seller session token; without it no seller is signed in
    pub access_token: Option<String>,
    pub listings_table: String,
    pub events_table: String,
    pub media_bucket: String,
    pub autosave_interval: Duration,
    pub request_timeout: Duration,
    /// Where the last viewed wizard step is kept between runs
    pub step_store_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: None,
            api_key: None,
            access_token: None,
            listings_table: "listings".to_string(),
            events_table: "listing_events".to_string(),
            media_bucket: "listing-media".to_string(),
            autosave_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
            step_store_path: PathBuf::from(".listing-desk/steps.json"),
        }
    }
}

impl Config {
    /// Backend URL without a trailing slash
    pub fn base_url(&self) -> Option<&str> {
        self.backend_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }

    /// REST client for the configured backend; needs both the URL and the API key
    pub fn rest_backend(&self) -> Result<RestBackend, ConfigError> {
        RestBackend::new(self)
    }
}
