// ABOUTME: Image lifecycle operations with idempotent desired-state semantics.
// ABOUTME: Lookup, enable/disable, clone, rename, delete, and the apply flow.

use super::error::{
    CloneDisabledSnafu, IllegalStateSnafu, InUseSnafu, InvalidNameSnafu, ManageError,
    MissingNewNameSnafu, NameTakenSnafu, NotFoundByIdSnafu, NotFoundByNameSnafu,
    RenameRequiresIdSnafu, RpcSnafu,
};
use super::outcome::Outcome;
use super::request::{DesiredState, Request, Selector};
use super::wait::{WaitPolicy, wait_for_state};
use crate::one::{Image, ImageOps, ImageState};
use crate::types::ImageName;
use snafu::{ResultExt, ensure};

/// Applies image transitions through an [`ImageOps`] client.
///
/// In dry-run mode every read and validation still happens but no mutating
/// call is issued; results describe the image as the call would have left it.
pub struct ImageManager<'c, C> {
    client: &'c C,
    dry_run: bool,
    wait: WaitPolicy,
}

impl<'c, C: ImageOps> ImageManager<'c, C> {
    pub fn new(client: &'c C) -> Self {
        Self {
            client,
            dry_run: false,
            wait: WaitPolicy::default(),
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// Find the first image matching `selector` in a single pool listing.
    pub async fn lookup(&self, selector: &Selector) -> Result<Option<Image>, ManageError> {
        tracing::debug!(%selector, "looking up image");
        let images = self
            .client
            .list_images()
            .await
            .context(RpcSnafu { operation: "list images" })?;

        Ok(images.into_iter().find(|image| match selector {
            Selector::Id(id) => image.id == *id,
            Selector::Name(name) => image.name == *name,
        }))
    }

    async fn find_by_name(&self, name: &ImageName) -> Result<Option<Image>, ManageError> {
        self.lookup(&Selector::Name(name.to_string())).await
    }

    async fn refresh(&self, image: &Image) -> Result<Image, ManageError> {
        self.client
            .image_info(image.id)
            .await
            .context(RpcSnafu { operation: "get image" })
    }

    /// Enable or disable `image`.
    ///
    /// Only READY, DISABLED and ERROR images can be toggled. Already being in
    /// the target state is a no-op.
    pub async fn set_enabled(&self, image: &Image, enable: bool) -> Result<Outcome, ManageError> {
        let (image, changed) = self.toggle(image, enable).await?;
        Ok(Outcome {
            changed,
            image: Some(image),
        })
    }

    async fn toggle(&self, image: &Image, enable: bool) -> Result<(Image, bool), ManageError> {
        let image = self.refresh(image).await?;
        ensure!(
            image.state.can_toggle_enabled(),
            IllegalStateSnafu {
                enable,
                state: image.state,
            }
        );

        let target = if enable {
            ImageState::Ready
        } else {
            ImageState::Disabled
        };
        if image.state == target {
            return Ok((image, false));
        }

        if self.dry_run {
            tracing::warn!(id = %image.id, enable, "dry run: not toggling image");
            return Ok((
                Image {
                    state: target,
                    ..image
                },
                true,
            ));
        }

        tracing::info!(id = %image.id, enable, "toggling image");
        self.client
            .enable_image(image.id, enable)
            .await
            .context(RpcSnafu {
                operation: if enable { "enable image" } else { "disable image" },
            })?;
        Ok((self.refresh(&image).await?, true))
    }

    /// Clone `image` to `new_name`, defaulting to "Copy of <name>".
    ///
    /// An existing image with the destination name satisfies the request.
    /// Blocks until the copy is READY.
    pub async fn clone_image(
        &self,
        image: &Image,
        new_name: Option<&ImageName>,
    ) -> Result<Outcome, ManageError> {
        let new_name = match new_name {
            Some(name) => name.clone(),
            None => ImageName::copy_of(&image.name).context(InvalidNameSnafu)?,
        };

        if let Some(existing) = self.find_by_name(&new_name).await? {
            return Ok(Outcome::unchanged(existing));
        }

        ensure!(image.state != ImageState::Disabled, CloneDisabledSnafu);

        if self.dry_run {
            tracing::warn!(id = %image.id, %new_name, "dry run: not cloning image");
            return Ok(Outcome::changed(image.clone()));
        }

        tracing::info!(id = %image.id, %new_name, "cloning image");
        let new_id = self
            .client
            .clone_image(image.id, &new_name)
            .await
            .context(RpcSnafu {
                operation: "clone image",
            })?;

        match wait_for_state(self.client, new_id, ImageState::Ready, self.wait).await? {
            Some(clone) => Ok(Outcome::changed(clone)),
            None => NotFoundByIdSnafu { id: new_id }.fail(),
        }
    }

    /// Rename `image` to `new_name`.
    pub async fn rename(
        &self,
        image: &Image,
        new_name: Option<&ImageName>,
    ) -> Result<Outcome, ManageError> {
        let Some(new_name) = new_name else {
            return MissingNewNameSnafu.fail();
        };

        if *new_name == image.name {
            return Ok(Outcome::unchanged(image.clone()));
        }

        if let Some(holder) = self.find_by_name(new_name).await? {
            return NameTakenSnafu {
                name: new_name.as_str(),
                id: holder.id,
            }
            .fail();
        }

        if self.dry_run {
            tracing::warn!(id = %image.id, %new_name, "dry run: not renaming image");
            return Ok(Outcome::changed(Image {
                name: new_name.to_string(),
                ..image.clone()
            }));
        }

        tracing::info!(id = %image.id, %new_name, "renaming image");
        self.client
            .rename_image(image.id, new_name)
            .await
            .context(RpcSnafu {
                operation: "rename image",
            })?;
        Ok(Outcome::changed(self.refresh(image).await?))
    }

    /// Delete `image` if it exists and no VM uses it. Blocks until the
    /// cluster reports it deleted.
    pub async fn delete(&self, image: Option<&Image>) -> Result<Outcome, ManageError> {
        let Some(image) = image else {
            return Ok(Outcome::deleted(false));
        };

        ensure!(
            image.running_vms == 0,
            InUseSnafu {
                running_vms: image.running_vms,
            }
        );

        if self.dry_run {
            tracing::warn!(id = %image.id, "dry run: not deleting image");
            return Ok(Outcome::deleted(true));
        }

        tracing::info!(id = %image.id, "deleting image");
        self.client
            .delete_image(image.id)
            .await
            .context(RpcSnafu {
                operation: "delete image",
            })?;
        wait_for_state(self.client, image.id, ImageState::Delete, self.wait).await?;
        Ok(Outcome::deleted(true))
    }

    /// Fail before toggling if the clone or rename that follows would be
    /// refused, so a combined request never leaves the image half-changed.
    async fn check_after_toggle(
        &self,
        image: &Image,
        enable: bool,
        request: &Request,
    ) -> Result<(), ManageError> {
        match request.state {
            DesiredState::Cloned => {
                let new_name = match request.new_name.as_ref() {
                    Some(name) => name.clone(),
                    None => ImageName::copy_of(&image.name).context(InvalidNameSnafu)?,
                };
                if self.find_by_name(&new_name).await?.is_some() {
                    return Ok(());
                }
                let projected = match (image.state.can_toggle_enabled(), enable) {
                    (true, true) => ImageState::Ready,
                    (true, false) => ImageState::Disabled,
                    (false, _) => image.state,
                };
                ensure!(projected != ImageState::Disabled, CloneDisabledSnafu);
            }
            DesiredState::Renamed => {
                let Some(new_name) = request.new_name.as_ref() else {
                    return MissingNewNameSnafu.fail();
                };
                let holder = if *new_name == image.name {
                    None
                } else {
                    self.find_by_name(new_name).await?
                };
                if let Some(holder) = holder {
                    return NameTakenSnafu {
                        name: new_name.as_str(),
                        id: holder.id,
                    }
                    .fail();
                }
            }
            DesiredState::Present | DesiredState::Absent => {}
        }
        Ok(())
    }

    /// Run one reconciliation: lookup, optional enable/disable, then at most
    /// one of clone, rename or delete.
    pub async fn apply(&self, request: &Request) -> Result<Outcome, ManageError> {
        ensure!(
            request.state != DesiredState::Renamed || matches!(request.selector, Selector::Id(_)),
            RenameRequiresIdSnafu
        );

        let found = self.lookup(&request.selector).await?;

        if request.state == DesiredState::Absent {
            return self.delete(found.as_ref()).await;
        }

        let image = match (found, &request.selector) {
            (Some(image), _) => image,
            (None, Selector::Id(id)) => return NotFoundByIdSnafu { id: *id }.fail(),
            (None, Selector::Name(name)) => {
                return NotFoundByNameSnafu { name: name.as_str() }.fail();
            }
        };

        let (image, toggled) = match request.enabled {
            Some(enable) => {
                self.check_after_toggle(&image, enable, request).await?;
                self.toggle(&image, enable).await?
            }
            None => (image, false),
        };

        let mut outcome = match request.state {
            DesiredState::Cloned => self.clone_image(&image, request.new_name.as_ref()).await?,
            DesiredState::Renamed => self.rename(&image, request.new_name.as_ref()).await?,
            DesiredState::Present | DesiredState::Absent => Outcome::unchanged(image),
        };
        outcome.changed |= toggled;
        Ok(outcome)
    }
}
