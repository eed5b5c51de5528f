// ABOUTME: Desired-state request model for one reconciliation run.
// ABOUTME: Selector (id xor name), desired state, enabled flag, new name.

use super::error::{ConflictingTargetSnafu, ManageError, MissingTargetSnafu};
use crate::types::{ImageId, ImageName};
use serde::Deserialize;
use std::fmt;

/// How the target image is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(ImageId),
    Name(String),
}

impl Selector {
    /// Build a selector from optional id and name. Exactly one must be set.
    pub fn from_parts(id: Option<ImageId>, name: Option<String>) -> Result<Self, ManageError> {
        match (id, name) {
            (Some(id), None) => Ok(Selector::Id(id)),
            (None, Some(name)) => Ok(Selector::Name(name)),
            (Some(_), Some(_)) => ConflictingTargetSnafu.fail(),
            (None, None) => MissingTargetSnafu.fail(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Id(id) => write!(f, "id={id}"),
            Selector::Name(name) => write!(f, "name={name}"),
        }
    }
}

/// The state the image should end up in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    /// The image exists; optionally enabled or disabled.
    #[default]
    Present,
    /// The image is deleted.
    Absent,
    /// A copy of the image exists under the new name.
    Cloned,
    /// The image carries the new name.
    Renamed,
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesiredState::Present => write!(f, "present"),
            DesiredState::Absent => write!(f, "absent"),
            DesiredState::Cloned => write!(f, "cloned"),
            DesiredState::Renamed => write!(f, "renamed"),
        }
    }
}

/// One reconciliation request.
#[derive(Debug, Clone)]
pub struct Request {
    pub selector: Selector,
    pub state: DesiredState,
    pub enabled: Option<bool>,
    pub new_name: Option<ImageName>,
}

impl Request {
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            state: DesiredState::default(),
            enabled: None,
            new_name: None,
        }
    }

    pub fn state(mut self, state: DesiredState) -> Self {
        self.state = state;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn new_name(mut self, name: ImageName) -> Self {
        self.new_name = Some(name);
        self
    }
}
