// ABOUTME: Fixed-interval polling until an image reaches a target state.
// ABOUTME: Used after the asynchronous clone and delete calls.

use super::error::{ManageError, RpcSnafu, WaitTimeoutSnafu};
use crate::one::{Image, ImageOps, ImageState};
use crate::types::ImageId;
use serde::Deserialize;
use snafu::ResultExt;
use std::time::Duration;

/// How often and how long to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaitPolicy {
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            timeout: default_timeout(),
        }
    }
}

/// Poll `id` until it reports `target`.
///
/// Returns `Ok(None)` when waiting for DELETE and the image has already left
/// the pool.
pub(crate) async fn wait_for_state<C: ImageOps>(
    client: &C,
    id: ImageId,
    target: ImageState,
    policy: WaitPolicy,
) -> Result<Option<Image>, ManageError> {
    let poll = async {
        loop {
            match client.image_info(id).await {
                Ok(image) if image.state == target => return Ok(Some(image)),
                Ok(image) => {
                    tracing::debug!(%id, state = %image.state, %target, "waiting for image");
                }
                Err(e) if target == ImageState::Delete && e.is_not_found() => return Ok(None),
                Err(e) => return Err(e).context(RpcSnafu { operation: "poll" }),
            }

            tokio::time::sleep(policy.interval).await;
        }
    };

    // The ceiling also bounds a poll that is itself stuck.
    match tokio::time::timeout(policy.timeout, poll).await {
        Ok(result) => result,
        Err(_elapsed) => WaitTimeoutSnafu {
            id,
            target,
            timeout: policy.timeout,
        }
        .fail(),
    }
}
