//! Driver trait - common interface for all source drivers.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{bail, Result};

/// Shared state for one ensure run, threaded to every driver install.
///
/// Carries a cancellation flag that another thread may raise; drivers check
/// it between phases of long-running work. The engine itself never raises
/// it - a failed fetch does not cancel its siblings.
#[derive(Debug, Default)]
pub struct InstallContext {
    cancelled: AtomicBool,
}

impl InstallContext {
    /// Create a fresh context.
    pub fn new() -> Self {
        InstallContext::default()
    }

    /// Request cancellation of in-flight installs.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail if cancellation was requested.
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_cancelled() {
            bail!("install cancelled");
        }
        Ok(())
    }
}

/// A driver that can install a single package.
pub trait Driver {
    /// Short driver name for logging.
    fn name(&self) -> &str;

    /// Install the package into `target_dir/<pkg_name>` at the requested
    /// version, returning the resolved immutable version identifier.
    ///
    /// Errors (unreachable upstream, unknown revision, missing
    /// subdirectory, I/O failure) are reported as-is; nothing is retried at
    /// this layer.
    fn install(
        &self,
        ctx: &InstallContext,
        pkg_name: &str,
        target_dir: &Path,
        requested: &str,
    ) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_cancellation() {
        let ctx = InstallContext::new();
        assert!(!ctx.is_cancelled());
        assert!(ctx.ensure_active().is_ok());

        ctx.cancel();
        assert!(ctx.is_cancelled());
        assert!(ctx.ensure_active().is_err());
    }
}
