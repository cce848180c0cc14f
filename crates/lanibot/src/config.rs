use crate::errors::ConfigError;
use config::{Config, Environment};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Upper bound for a single streamed reply. Unset means no limit.
    #[serde(default)]
    pub stream_timeout_secs: Option<u64>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            stream_timeout_secs: None,
        }
    }
}

impl ApiSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn stream_timeout(&self) -> Option<Duration> {
        self.stream_timeout_secs.map(Duration::from_secs)
    }

    /// Join an endpoint path onto the configured base url
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationSettings {
    /// Skip the verification widget entirely and send the placeholder credential
    #[serde(default)]
    pub dev_mode: bool,
    #[serde(default)]
    pub site_key: Option<String>,
    /// Response value of the verification widget, when one is available
    #[serde(default)]
    pub token: Option<String>,
}

impl VerificationSettings {
    /// Whether requests must carry a real widget response
    pub fn requires_widget(&self) -> bool {
        !self.dev_mode
            && self
                .site_key
                .as_deref()
                .map(|key| !key.trim().is_empty())
                .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub verification: VerificationSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("api.base_url", default_base_url())?
            .set_default("api.connect_timeout_secs", default_connect_timeout_secs())?
            .set_default("verification.dev_mode", false)?
            .add_source(
                Environment::with_prefix("LANIBOT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize::<Self>().map_err(|err| {
            tracing::debug!("Configuration error: {:?}", &err);
            ConfigError::Other(err)
        })
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}
