// ABOUTME: Test support utilities.
// ABOUTME: Image fixtures, fast wait policy, and the fake XML-RPC server.

use one_image::manage::WaitPolicy;
use one_image::one::{Image, ImageState};
use one_image::types::{GroupId, ImageId, UserId};
use std::sync::Once;
use std::time::Duration;

// Each test binary only uses some of these modules, so allow dead_code.
#[allow(dead_code)]
pub mod fake_one;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("one_image=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// An image owned by oneadmin with no VMs attached.
#[allow(dead_code)]
pub fn image(id: u32, name: &str, state: ImageState) -> Image {
    Image {
        id: ImageId::new(id),
        name: name.to_string(),
        state,
        owner_id: UserId::new(0),
        owner_name: "oneadmin".to_string(),
        group_id: GroupId::new(0),
        group_name: "oneadmin".to_string(),
        running_vms: 0,
    }
}

/// Poll policy that keeps timeout tests short.
#[allow(dead_code)]
pub fn fast_wait() -> WaitPolicy {
    WaitPolicy {
        interval: Duration::from_millis(5),
        timeout: Duration::from_millis(200),
    }
}
