// ABOUTME: Configuration types and parsing for the optional YAML config file.
// ABOUTME: Holds connection defaults, request timeout, and the wait policy.

mod connection;

pub use connection::{
    ConnectionArgs, ConnectionConfig, ENV_PASSWORD, ENV_URL, ENV_USERNAME,
};

use crate::error::{Error, Result};
use crate::manage::WaitPolicy;
use crate::one::DEFAULT_REQUEST_TIMEOUT;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub api_url: Option<String>,

    #[serde(default)]
    pub api_username: Option<String>,

    #[serde(default)]
    pub api_password: Option<String>,

    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    #[serde(default)]
    pub wait: WaitPolicy,
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            api_username: None,
            api_password: None,
            request_timeout: default_request_timeout(),
            wait: WaitPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        if self.wait.interval.is_zero() {
            return Err(Error::InvalidConfig(
                "wait.interval must be greater than zero".to_string(),
            ));
        }
        if self.wait.timeout < self.wait.interval {
            return Err(Error::InvalidConfig(
                "wait.timeout must not be shorter than wait.interval".to_string(),
            ));
        }
        Ok(())
    }
}
