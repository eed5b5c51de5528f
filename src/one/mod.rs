// ABOUTME: OpenNebula collaborator: image model, XML-RPC codec, and clients.
// ABOUTME: Exposes ImageOps with an HTTP client and an in-memory client.

mod client;
mod error;
mod image;
mod memory;
pub(crate) mod sealed;
mod traits;
pub mod xmlrpc;

pub use client::{DEFAULT_REQUEST_TIMEOUT, OneClient};
pub use error::{NO_EXISTS, RpcError};
pub use image::{Image, ImageState};
pub use memory::{InMemoryClient, Mutation};
pub use traits::ImageOps;
