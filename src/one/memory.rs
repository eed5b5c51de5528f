// ABOUTME: In-memory implementation of ImageOps for tests and offline runs.
// ABOUTME: Simulates asynchronous settling and records every mutating call.

use super::error::{NO_EXISTS, RpcError};
use super::image::{Image, ImageState};
use super::sealed::Sealed;
use super::traits::ImageOps;
use crate::types::{ImageId, ImageName};
use async_trait::async_trait;
use parking_lot::Mutex;

/// OpenNebula error code for a refused action.
const ACTION: i64 = 0x0800;

/// A mutating call received by [`InMemoryClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Enable { id: ImageId, enable: bool },
    Clone { id: ImageId, name: String },
    Rename { id: ImageId, name: String },
    Delete { id: ImageId },
}

#[derive(Debug)]
struct Pending {
    target: ImageState,
    polls_left: u32,
}

#[derive(Debug)]
struct Entry {
    image: Image,
    pending: Option<Pending>,
}

#[derive(Debug)]
struct Pool {
    entries: Vec<Entry>,
    next_id: u32,
    mutations: Vec<Mutation>,
    settle_polls: Option<u32>,
    vanish_on_delete: bool,
}

/// Image pool held in memory.
///
/// Clones appear LOCKED and turn READY, deletes turn DELETE, after a
/// configurable number of `image_info` polls.
///
/// ```
/// use one_image::one::{Image, ImageOps, ImageState, InMemoryClient};
/// use one_image::types::{GroupId, ImageId, UserId};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let client = InMemoryClient::new(vec![Image {
///     id: ImageId::new(3),
///     name: "debian".to_string(),
///     state: ImageState::Ready,
///     owner_id: UserId::new(0),
///     owner_name: "oneadmin".to_string(),
///     group_id: GroupId::new(0),
///     group_name: "oneadmin".to_string(),
///     running_vms: 0,
/// }]);
///
/// let images = client.list_images().await.unwrap();
/// assert_eq!(images[0].name, "debian");
/// # }
/// ```
#[derive(Debug)]
pub struct InMemoryClient {
    pool: Mutex<Pool>,
}

impl Sealed for InMemoryClient {}

impl InMemoryClient {
    pub fn new(images: Vec<Image>) -> Self {
        let next_id = images.iter().map(|i| i.id.get() + 1).max().unwrap_or(0);
        Self {
            pool: Mutex::new(Pool {
                entries: images
                    .into_iter()
                    .map(|image| Entry {
                        image,
                        pending: None,
                    })
                    .collect(),
                next_id,
                mutations: Vec::new(),
                settle_polls: Some(0),
                vanish_on_delete: false,
            }),
        }
    }

    /// Asynchronous operations settle after `polls` further `image_info`
    /// calls. Zero means the first poll already sees the final state.
    pub fn settle_after(self, polls: u32) -> Self {
        self.pool.lock().settle_polls = Some(polls);
        self
    }

    /// Asynchronous operations never settle.
    pub fn never_settle(self) -> Self {
        self.pool.lock().settle_polls = None;
        self
    }

    /// Deleted images leave the pool instead of lingering in DELETE.
    pub fn vanish_on_delete(self) -> Self {
        self.pool.lock().vanish_on_delete = true;
        self
    }

    /// Mutating calls received so far, in order.
    pub fn mutations(&self) -> Vec<Mutation> {
        self.pool.lock().mutations.clone()
    }

    /// Current view of an image without advancing pending transitions.
    pub fn snapshot(&self, id: ImageId) -> Option<Image> {
        self.pool
            .lock()
            .entries
            .iter()
            .find(|e| e.image.id == id)
            .map(|e| e.image.clone())
    }
}

impl Pool {
    fn position(&self, id: ImageId, method: &str) -> Result<usize, RpcError> {
        self.entries
            .iter()
            .position(|e| e.image.id == id)
            .ok_or_else(|| RpcError::Call {
                method: method.to_string(),
                code: NO_EXISTS,
                message: format!("[{method}] Error getting image [{id}]."),
            })
    }

    fn pending(&self, target: ImageState) -> Option<Pending> {
        Some(Pending {
            target,
            polls_left: self.settle_polls.unwrap_or(u32::MAX),
        })
    }

    fn ensure_name_free(&self, name: &ImageName, method: &str) -> Result<(), RpcError> {
        match self.entries.iter().find(|e| *name == e.image.name) {
            Some(existing) => Err(RpcError::Call {
                method: method.to_string(),
                code: ACTION,
                message: format!(
                    "[{method}] NAME is already taken by IMAGE {}.",
                    existing.image.id
                ),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ImageOps for InMemoryClient {
    async fn list_images(&self) -> Result<Vec<Image>, RpcError> {
        Ok(self
            .pool
            .lock()
            .entries
            .iter()
            .map(|e| e.image.clone())
            .collect())
    }

    async fn image_info(&self, id: ImageId) -> Result<Image, RpcError> {
        const METHOD: &str = "one.image.info";
        let mut pool = self.pool.lock();
        let index = pool.position(id, METHOD)?;
        let never_settles = pool.settle_polls.is_none();
        let vanish = pool.vanish_on_delete;

        let entry = &mut pool.entries[index];
        let mut settled = None;
        if let Some(pending) = entry.pending.as_mut() {
            if pending.polls_left == 0 && !never_settles {
                settled = Some(pending.target);
            } else {
                pending.polls_left = pending.polls_left.saturating_sub(1);
            }
        }

        if let Some(state) = settled {
            entry.pending = None;
            entry.image.state = state;
            if state == ImageState::Delete && vanish {
                pool.entries.remove(index);
                return Err(RpcError::Call {
                    method: METHOD.to_string(),
                    code: NO_EXISTS,
                    message: format!("[{METHOD}] Error getting image [{id}]."),
                });
            }
        }

        Ok(pool.entries[index].image.clone())
    }

    async fn enable_image(&self, id: ImageId, enable: bool) -> Result<(), RpcError> {
        let mut pool = self.pool.lock();
        let index = pool.position(id, "one.image.enable")?;
        pool.mutations.push(Mutation::Enable { id, enable });
        pool.entries[index].image.state = if enable {
            ImageState::Ready
        } else {
            ImageState::Disabled
        };
        Ok(())
    }

    async fn clone_image(&self, id: ImageId, name: &ImageName) -> Result<ImageId, RpcError> {
        const METHOD: &str = "one.image.clone";
        let mut pool = self.pool.lock();
        let index = pool.position(id, METHOD)?;
        pool.ensure_name_free(name, METHOD)?;
        pool.mutations.push(Mutation::Clone {
            id,
            name: name.to_string(),
        });

        let new_id = ImageId::new(pool.next_id);
        pool.next_id += 1;

        let source = &pool.entries[index].image;
        let image = Image {
            id: new_id,
            name: name.to_string(),
            state: ImageState::Locked,
            owner_id: source.owner_id,
            owner_name: source.owner_name.clone(),
            group_id: source.group_id,
            group_name: source.group_name.clone(),
            running_vms: 0,
        };
        let pending = pool.pending(ImageState::Ready);
        pool.entries.push(Entry { image, pending });
        Ok(new_id)
    }

    async fn rename_image(&self, id: ImageId, name: &ImageName) -> Result<(), RpcError> {
        const METHOD: &str = "one.image.rename";
        let mut pool = self.pool.lock();
        let index = pool.position(id, METHOD)?;
        pool.ensure_name_free(name, METHOD)?;
        pool.mutations.push(Mutation::Rename {
            id,
            name: name.to_string(),
        });
        pool.entries[index].image.name = name.to_string();
        Ok(())
    }

    async fn delete_image(&self, id: ImageId) -> Result<(), RpcError> {
        const METHOD: &str = "one.image.delete";
        let mut pool = self.pool.lock();
        let index = pool.position(id, METHOD)?;
        if pool.entries[index].image.is_used() {
            return Err(RpcError::Call {
                method: METHOD.to_string(),
                code: ACTION,
                message: format!("[{METHOD}] Cannot delete image {id}, it is in use."),
            });
        }
        pool.mutations.push(Mutation::Delete { id });
        let pending = pool.pending(ImageState::Delete);
        pool.entries[index].pending = pending;
        Ok(())
    }
}
