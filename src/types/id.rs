// ABOUTME: Phantom-typed numeric identifiers for compile-time type safety.
// ABOUTME: Prevents accidental swapping of image, user, and group IDs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
/// Using empty enums prevents instantiation and requires no trait bounds.
pub enum ImageMarker {}
pub enum UserMarker {}
pub enum GroupMarker {}

/// A type-safe OpenNebula object identifier.
///
/// OpenNebula numbers every pool object with a plain integer, so an image id
/// and its owner's user id look identical on the wire. The phantom parameter
/// keeps them apart in code.
///
/// ```compile_fail
/// use one_image::types::{ImageId, UserId};
///
/// fn takes_image(_id: ImageId) {}
///
/// takes_image(UserId::new(0));
/// ```
#[must_use = "IDs reference cluster objects and should not be ignored"]
pub struct Id<T> {
    value: u32,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub const fn new(value: u32) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub const fn get(self) -> u32 {
        self.value
    }
}

// Manual trait implementations that don't require T to implement the trait.
// This is necessary because T is only used as a phantom type marker.

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Id").field(&self.value).finish()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> From<u32> for Id<T> {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u32::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

pub type ImageId = Id<ImageMarker>;
pub type UserId = Id<UserMarker>;
pub type GroupId = Id<GroupMarker>;
