// ABOUTME: Image operations trait for OpenNebula clients.
// ABOUTME: List, inspect, enable, clone, rename, and delete images.

use super::error::RpcError;
use super::image::Image;
use super::sealed::Sealed;
use crate::types::{ImageId, ImageName};
use async_trait::async_trait;

/// The image calls of the OpenNebula API.
///
/// Implementations are assumed to be authenticated already; every call is a
/// single request with no retry.
#[async_trait]
pub trait ImageOps: Sealed + Send + Sync {
    /// List every image the session user can use.
    async fn list_images(&self) -> Result<Vec<Image>, RpcError>;

    /// Fetch one image by id.
    async fn image_info(&self, id: ImageId) -> Result<Image, RpcError>;

    /// Enable (`true`) or disable (`false`) an image.
    async fn enable_image(&self, id: ImageId, enable: bool) -> Result<(), RpcError>;

    /// Start cloning an image. Returns the id of the new image, which becomes
    /// usable asynchronously.
    async fn clone_image(&self, id: ImageId, name: &ImageName) -> Result<ImageId, RpcError>;

    /// Rename an image.
    async fn rename_image(&self, id: ImageId, name: &ImageName) -> Result<(), RpcError>;

    /// Start deleting an image.
    async fn delete_image(&self, id: ImageId) -> Result<(), RpcError>;
}
