// ABOUTME: Image lifecycle orchestration over the OpenNebula collaborator.
// ABOUTME: Exports the manager, request model, wait policy, and outcome types.

mod error;
mod manager;
mod outcome;
mod request;
mod wait;

pub use error::{ManageError, ManageErrorKind};
pub use manager::ImageManager;
pub use outcome::{ImageReport, Outcome, Report};
pub use request::{DesiredState, Request, Selector};
pub use wait::WaitPolicy;
