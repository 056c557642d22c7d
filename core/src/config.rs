use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, id::PROVISIONAL_PREFIX};

pub const ENV_REMOTE_TIMEOUT_MS: &str = "WARROOM_REMOTE_TIMEOUT_MS";
pub const ENV_ROLLBACK_ON_ERROR: &str = "WARROOM_ROLLBACK_ON_ERROR";
pub const ENV_PROVISIONAL_PREFIX: &str = "WARROOM_PROVISIONAL_PREFIX";

/// Engine settings.
///
/// ```
/// # use warroom_core::config::EngineConfig;
/// let config = EngineConfig::from_json(r#"{ "remote_timeout_ms": 8000 }"#).unwrap();
/// assert_eq!(config.remote_timeout, Some(std::time::Duration::from_secs(8)));
/// assert!(config.rollback_on_error);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on a remote call. Expiry is reported as `RemoteError::Timeout`.
    /// `None` trusts the gateway to always settle.
    #[serde(rename = "remote_timeout_ms", with = "optional_millis")]
    pub remote_timeout: Option<Duration>,

    /// Revert speculative changes when their remote call fails. When false the failed
    /// change stays on screen and only the failure notice is sent.
    pub rollback_on_error: bool,

    /// Prefix for client-synthesized ids.
    pub provisional_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self { Self { remote_timeout: None, rollback_on_error: true, provisional_prefix: PROVISIONAL_PREFIX.to_string() } }
}

impl EngineConfig {
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = Some(timeout);
        self
    }

    pub fn with_rollback_on_error(mut self, rollback: bool) -> Self {
        self.rollback_on_error = rollback;
        self
    }

    pub fn with_provisional_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.provisional_prefix = prefix.into();
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> { Ok(serde_json::from_str(json)?) }

    /// Defaults overridden by `WARROOM_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> { Self::from_lookup(|var| std::env::var(var).ok()) }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_REMOTE_TIMEOUT_MS) {
            let millis: u64 = value.trim().parse().map_err(|_| ConfigError::InvalidValue { var: ENV_REMOTE_TIMEOUT_MS, value: value.clone() })?;
            config.remote_timeout = if millis == 0 { None } else { Some(Duration::from_millis(millis)) };
        }

        if let Some(value) = lookup(ENV_ROLLBACK_ON_ERROR) {
            config.rollback_on_error = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => return Err(ConfigError::InvalidValue { var: ENV_ROLLBACK_ON_ERROR, value }),
            };
        }

        if let Some(value) = lookup(ENV_PROVISIONAL_PREFIX) {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue { var: ENV_PROVISIONAL_PREFIX, value });
            }
            config.provisional_prefix = value;
        }

        Ok(config)
    }
}

mod optional_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.filter(|millis| *millis > 0).map(Duration::from_millis))
    }
}
