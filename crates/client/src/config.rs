//! Client configuration from the environment.

use std::path::PathBuf;

/// Runtime configuration for the client shell.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the platform API.
    pub api_url: String,

    /// Directory holding client state (the credential store). `None` means
    /// the platform data directory.
    pub data_dir: Option<PathBuf>,
}

impl ClientConfig {
    pub const DEFAULT_API_URL: &'static str = "http://localhost:8080";

    /// Read configuration from the environment.
    ///
    /// `GIVEHUB_API_URL` falls back to [`Self::DEFAULT_API_URL`];
    /// `GIVEHUB_DATA_DIR` falls back to the platform data directory.
    pub fn from_env() -> Self {
        let api_url = std::env::var("GIVEHUB_API_URL").unwrap_or_else(|_| {
            tracing::debug!("GIVEHUB_API_URL not set; using {}", Self::DEFAULT_API_URL);
            Self::DEFAULT_API_URL.to_string()
        });

        let data_dir = std::env::var_os("GIVEHUB_DATA_DIR").map(PathBuf::from);

        Self { api_url, data_dir }
    }

    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            data_dir: None,
        }
    }
}
