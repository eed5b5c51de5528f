// ABOUTME: Orchestration error types with SNAFU context selectors.
// ABOUTME: Every variant is fatal and renders as one descriptive message.

use crate::one::{ImageState, RpcError};
use crate::types::{ImageId, ImageNameError};
use snafu::Snafu;
use std::time::Duration;

/// Errors from image lifecycle operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ManageError {
    #[snafu(display("one of 'id' or 'name' must be specified"))]
    MissingTarget,

    #[snafu(display("'id' and 'name' are mutually exclusive"))]
    ConflictingTarget,

    #[snafu(display("Option 'id' is required when the state is 'renamed'"))]
    RenameRequiresId,

    #[snafu(display("There is no image with id={id}"))]
    NotFoundById { id: ImageId },

    #[snafu(display("There is no image with name={name}"))]
    NotFoundByName { name: String },

    #[snafu(display(
        "Cannot {} {state} image!",
        if *enable { "enable" } else { "disable" }
    ))]
    IllegalState { enable: bool, state: ImageState },

    #[snafu(display("Cannot clone DISABLED image"))]
    CloneDisabled,

    #[snafu(display("'new_name' option has to be specified when the state is 'renamed'"))]
    MissingNewName,

    #[snafu(display("Name '{name}' is already taken by IMAGE with id={id}"))]
    NameTaken { name: String, id: ImageId },

    #[snafu(display("Cannot delete image. There are {running_vms} VMs using it."))]
    InUse { running_vms: u32 },

    #[snafu(display(
        "Wait timeout has expired! Image {id} did not reach {target} within {}s",
        timeout.as_secs()
    ))]
    WaitTimeout {
        id: ImageId,
        target: ImageState,
        timeout: Duration,
    },

    #[snafu(display("invalid image name: {source}"))]
    InvalidName { source: ImageNameError },

    #[snafu(display("{operation} failed: {source}"))]
    Rpc {
        operation: &'static str,
        source: RpcError,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManageErrorKind {
    /// The request does not identify exactly one image.
    InvalidTarget,
    /// The request is incomplete for the desired state.
    InvalidRequest,
    /// The selected image does not exist.
    NotFound,
    /// The image is in a state that forbids the operation.
    IllegalState,
    /// Another image already holds the requested name.
    NameConflict,
    /// VMs are using the image.
    InUse,
    /// An asynchronous operation did not settle in time.
    Timeout,
    /// The RPC collaborator failed.
    Rpc,
}

impl ManageError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ManageErrorKind {
        match self {
            ManageError::MissingTarget
            | ManageError::ConflictingTarget
            | ManageError::RenameRequiresId => ManageErrorKind::InvalidTarget,
            ManageError::MissingNewName | ManageError::InvalidName { .. } => {
                ManageErrorKind::InvalidRequest
            }
            ManageError::NotFoundById { .. } | ManageError::NotFoundByName { .. } => {
                ManageErrorKind::NotFound
            }
            ManageError::IllegalState { .. } | ManageError::CloneDisabled => {
                ManageErrorKind::IllegalState
            }
            ManageError::NameTaken { .. } => ManageErrorKind::NameConflict,
            ManageError::InUse { .. } => ManageErrorKind::InUse,
            ManageError::WaitTimeout { .. } => ManageErrorKind::Timeout,
            ManageError::Rpc { .. } => ManageErrorKind::Rpc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_state_names_direction_and_state() {
        let err = ManageError::IllegalState {
            enable: false,
            state: ImageState::Locked,
        };
        assert_eq!(err.to_string(), "Cannot disable LOCKED image!");

        let err = ManageError::IllegalState {
            enable: true,
            state: ImageState::Used,
        };
        assert_eq!(err.to_string(), "Cannot enable USED image!");
    }

    #[test]
    fn rpc_errors_keep_operation_context() {
        let err = ManageError::Rpc {
            operation: "clone",
            source: RpcError::Transport("connection refused".to_string()),
        };
        assert_eq!(err.kind(), ManageErrorKind::Rpc);
        assert!(err.to_string().starts_with("clone failed"));
        assert!(err.to_string().contains("connection refused"));
    }
}
