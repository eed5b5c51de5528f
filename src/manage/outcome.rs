// ABOUTME: Result of one reconciliation run and its serialized report shape.
// ABOUTME: Carries the changed flag and the image as left by the run.

use crate::one::{Image, ImageState};
use crate::types::{GroupId, ImageId, UserId};
use serde::Serialize;

/// What a run did and the image it left behind.
///
/// `image` is `None` after a delete, or when `absent` found nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub changed: bool,
    pub image: Option<Image>,
}

impl Outcome {
    pub fn changed(image: Image) -> Self {
        Self {
            changed: true,
            image: Some(image),
        }
    }

    pub fn unchanged(image: Image) -> Self {
        Self {
            changed: false,
            image: Some(image),
        }
    }

    pub fn deleted(changed: bool) -> Self {
        Self {
            changed,
            image: None,
        }
    }

    pub fn report(&self) -> Report {
        Report {
            image: self.image.as_ref().map(ImageReport::from),
            changed: self.changed,
        }
    }
}

/// Serialized result object.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde(flatten)]
    pub image: Option<ImageReport>,
    pub changed: bool,
}

/// Image fields exposed in the result object.
#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    pub id: ImageId,
    pub name: String,
    pub owner_id: UserId,
    pub owner_name: String,
    pub group_id: GroupId,
    pub group_name: String,
    pub state: ImageState,
    pub used: bool,
    pub running_vms: u32,
}

impl From<&Image> for ImageReport {
    fn from(image: &Image) -> Self {
        Self {
            id: image.id,
            name: image.name.clone(),
            owner_id: image.owner_id,
            owner_name: image.owner_name.clone(),
            group_id: image.group_id,
            group_name: image.group_name.clone(),
            state: image.state,
            used: image.is_used(),
            running_vms: image.running_vms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn report_flattens_image_fields() {
        let image = Image {
            id: ImageId::new(153),
            name: "app1".to_string(),
            state: ImageState::Used,
            owner_id: UserId::new(143),
            owner_name: "ansible-test".to_string(),
            group_id: GroupId::new(1),
            group_name: "one-users".to_string(),
            running_vms: 7,
        };

        let value = serde_json::to_value(Outcome::unchanged(image).report()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 153,
                "name": "app1",
                "owner_id": 143,
                "owner_name": "ansible-test",
                "group_id": 1,
                "group_name": "one-users",
                "state": "USED",
                "used": true,
                "running_vms": 7,
                "changed": false,
            })
        );
    }

    #[test]
    fn delete_report_only_has_changed() {
        let value = serde_json::to_value(Outcome::deleted(true).report()).unwrap();
        assert_eq!(value, json!({ "changed": true }));
    }
}
