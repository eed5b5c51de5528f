// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod id;
mod image_name;

pub use id::{GroupId, Id, ImageId, UserId};
pub use image_name::{ImageName, ImageNameError};
