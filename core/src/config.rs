use std::fmt;

use serde::Deserialize;

use crate::error::ConfigError;

/// Prefix of the environment variables read by [`Config::from_env`].
pub const ENV_PREFIX: &str = "UM_";

/// Connection settings for one Universal Messenger installation.
///
/// Read from `UM_BASE_URL` and `UM_API_KEY`.
#[derive(Clone, Deserialize)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
}

impl Config {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_env() -> Result<Config, ConfigError> {
        let config = envy::prefixed(ENV_PREFIX).from_env::<Config>()?;
        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    }

    /// Like [`Config::from_env`], but reads the given variables instead of
    /// the process environment.
    pub fn from_vars<I>(vars: I) -> Result<Config, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter::<_, Config>(vars)?)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .finish()
    }
}
