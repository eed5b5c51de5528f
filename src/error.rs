// ABOUTME: Application-wide error types for one-image.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::manage::ManageError;
use crate::one::RpcError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "One or more connection parameters (api_url, api_username, api_password) were not specified (missing: {})",
        .0.join(", ")
    )]
    MissingConnectionParams(Vec<&'static str>),

    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Manage(#[from] ManageError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
