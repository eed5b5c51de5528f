// ABOUTME: Image model and lifecycle state enumeration.
// ABOUTME: Parses the IMAGE and IMAGE_POOL documents OpenNebula returns.

use super::error::RpcError;
use crate::types::{GroupId, ImageId, UserId};
use serde::Serialize;
use std::fmt;
use xmltree::{Element, XMLNode};

/// Image lifecycle state. The discriminant is the wire ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageState {
    Init = 0,
    Ready = 1,
    Used = 2,
    Disabled = 3,
    Locked = 4,
    Error = 5,
    Clone = 6,
    Delete = 7,
    UsedPers = 8,
    LockedUsed = 9,
    LockedUsedPers = 10,
}

impl ImageState {
    pub const ALL: [ImageState; 11] = [
        ImageState::Init,
        ImageState::Ready,
        ImageState::Used,
        ImageState::Disabled,
        ImageState::Locked,
        ImageState::Error,
        ImageState::Clone,
        ImageState::Delete,
        ImageState::UsedPers,
        ImageState::LockedUsed,
        ImageState::LockedUsedPers,
    ];

    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::ALL.get(usize::try_from(ordinal).ok()?).copied()
    }

    pub fn ordinal(self) -> u32 {
        self as u32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageState::Init => "INIT",
            ImageState::Ready => "READY",
            ImageState::Used => "USED",
            ImageState::Disabled => "DISABLED",
            ImageState::Locked => "LOCKED",
            ImageState::Error => "ERROR",
            ImageState::Clone => "CLONE",
            ImageState::Delete => "DELETE",
            ImageState::UsedPers => "USED_PERS",
            ImageState::LockedUsed => "LOCKED_USED",
            ImageState::LockedUsedPers => "LOCKED_USED_PERS",
        }
    }

    /// Enable and disable are only accepted from these states.
    pub fn can_toggle_enabled(self) -> bool {
        matches!(
            self,
            ImageState::Ready | ImageState::Disabled | ImageState::Error
        )
    }
}

impl fmt::Display for ImageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A virtual-machine disk image as seen by this tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub id: ImageId,
    pub name: String,
    pub state: ImageState,
    pub owner_id: UserId,
    pub owner_name: String,
    pub group_id: GroupId,
    pub group_name: String,
    pub running_vms: u32,
}

impl Image {
    pub fn is_used(&self) -> bool {
        self.running_vms > 0
    }
}

// =============================================================================
// Document Parsing
// =============================================================================

fn field_text(image: &Element, name: &str) -> String {
    image
        .get_child(name)
        .and_then(Element::get_text)
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

fn field_number(image: &Element, name: &str) -> Result<u32, RpcError> {
    let text = field_text(image, name);
    text.parse().map_err(|_| {
        RpcError::malformed(format!("<IMAGE> has invalid <{name}>: {text:?}"))
    })
}

impl TryFrom<&Element> for Image {
    type Error = RpcError;

    fn try_from(image: &Element) -> Result<Self, Self::Error> {
        let id = field_number(image, "ID")?;
        let ordinal = field_number(image, "STATE")?;
        let state = ImageState::from_ordinal(ordinal).ok_or_else(|| {
            RpcError::malformed(format!("image {id} has unknown state {ordinal}"))
        })?;
        let running_vms = match image.get_child("RUNNING_VMS") {
            Some(_) => field_number(image, "RUNNING_VMS")?,
            None => 0,
        };

        Ok(Image {
            id: ImageId::new(id),
            name: field_text(image, "NAME"),
            state,
            owner_id: UserId::new(field_number(image, "UID")?),
            owner_name: field_text(image, "UNAME"),
            group_id: GroupId::new(field_number(image, "GID")?),
            group_name: field_text(image, "GNAME"),
            running_vms,
        })
    }
}

fn parse_root(xml: &str, expected: &str) -> Result<Element, RpcError> {
    let root = Element::parse(xml.as_bytes())
        .map_err(|e| RpcError::malformed(format!("invalid {expected} document: {e}")))?;
    if root.name != expected {
        return Err(RpcError::malformed(format!(
            "expected <{expected}>, found <{}>",
            root.name
        )));
    }
    Ok(root)
}

/// Parse a single `<IMAGE>` document.
pub(crate) fn parse_image(xml: &str) -> Result<Image, RpcError> {
    let root = parse_root(xml, "IMAGE")?;
    Image::try_from(&root)
}

/// Parse an `<IMAGE_POOL>` document.
pub(crate) fn parse_image_pool(xml: &str) -> Result<Vec<Image>, RpcError> {
    let root = parse_root(xml, "IMAGE_POOL")?;
    root.children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(|child| child.name == "IMAGE")
        .map(Image::try_from)
        .collect()
}
