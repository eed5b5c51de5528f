// ABOUTME: Validated image name used as a clone or rename target.
// ABOUTME: Rejects names OpenNebula would refuse before any RPC call is made.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageNameError {
    #[error("image name cannot be empty")]
    Empty,

    #[error("image name cannot be only whitespace")]
    Blank,

    #[error("invalid character in image name: {0:?}")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageName(String);

impl ImageName {
    pub fn new(value: impl Into<String>) -> Result<Self, ImageNameError> {
        let value = value.into();

        if value.is_empty() {
            return Err(ImageNameError::Empty);
        }

        if value.trim().is_empty() {
            return Err(ImageNameError::Blank);
        }

        if let Some(c) = value.chars().find(|c| c.is_control()) {
            return Err(ImageNameError::InvalidChar(c));
        }

        Ok(Self(value))
    }

    /// Name given to a clone when the caller does not pick one.
    pub fn copy_of(original: &str) -> Result<Self, ImageNameError> {
        Self::new(format!("Copy of {original}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ImageName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<String> for ImageName {
    fn eq(&self, other: &String) -> bool {
        &self.0 == other
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
