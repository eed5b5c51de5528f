// ABOUTME: Connection parameter resolution for the OpenNebula endpoint.
// ABOUTME: Precedence is explicit value, then environment, then config file.

use super::Config;
use crate::error::{Error, Result};
use std::fmt;

pub const ENV_URL: &str = "ONE_URL";
pub const ENV_USERNAME: &str = "ONE_USERNAME";
pub const ENV_PASSWORD: &str = "ONE_PASSWORD";

/// Connection values given explicitly, e.g. on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConnectionArgs {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Fully resolved connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl ConnectionConfig {
    /// Resolve each parameter independently. Empty values count as unset.
    ///
    /// Fails with [`Error::MissingConnectionParams`] naming every parameter
    /// that could not be resolved.
    pub fn resolve(args: &ConnectionArgs, file: &Config) -> Result<Self> {
        let url = pick(args.url.as_deref(), ENV_URL, file.api_url.as_deref());
        let username = pick(
            args.username.as_deref(),
            ENV_USERNAME,
            file.api_username.as_deref(),
        );
        let password = pick(
            args.password.as_deref(),
            ENV_PASSWORD,
            file.api_password.as_deref(),
        );

        match (url, username, password) {
            (Some(url), Some(username), Some(password)) => Ok(Self {
                url,
                username,
                password,
            }),
            (url, username, password) => {
                let missing = [
                    ("api_url", url.is_none()),
                    ("api_username", username.is_none()),
                    ("api_password", password.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, missing)| missing.then_some(name))
                .collect();
                Err(Error::MissingConnectionParams(missing))
            }
        }
    }

    /// Session string OpenNebula expects as the first argument of every call.
    pub fn session(&self) -> String {
        format!("{}:{}", self.username, self.password)
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn pick(explicit: Option<&str>, env_var: &str, file: Option<&str>) -> Option<String> {
    fn non_empty(value: Option<String>) -> Option<String> {
        value.filter(|v| !v.is_empty())
    }

    non_empty(explicit.map(str::to_string))
        .or_else(|| non_empty(std::env::var(env_var).ok()))
        .or_else(|| non_empty(file.map(str::to_string)))
}
