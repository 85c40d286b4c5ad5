pub use tokio_util::sync::CancellationToken;

use crate::core::error::{LauncherError, LauncherResult};

/// Maps a fired token onto `LauncherError::Cancelled`.
///
/// Checked between file transfers and between stages, never mid-transfer.
pub trait CancelCheck {
    fn check(&self) -> LauncherResult<()>;
}

impl CancelCheck for CancellationToken {
    fn check(&self) -> LauncherResult<()> {
        if self.is_cancelled() {
            Err(LauncherError::Cancelled)
        } else {
            Ok(())
        }
    }
}
