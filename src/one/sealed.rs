// ABOUTME: Sealed trait pattern for the image collaborator trait.
// ABOUTME: Prevents external implementations, allowing non-breaking evolution.

/// Sealed trait to prevent external implementations.
///
/// Only the clients in this crate (the XML-RPC client and the in-memory
/// client) can implement [`ImageOps`](super::ImageOps).
pub trait Sealed {}
