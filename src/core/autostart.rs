/// Launch-at-login entry management
///
/// Thin wrapper over the platform autostart mechanism. Both operations
/// are idempotent; failures are reported to the caller and must never
/// affect panel lifecycle.

use anyhow::{Context, Result};
use auto_launch::{AutoLaunch, AutoLaunchBuilder};
use tracing::warn;

pub struct Autostart {
    inner: AutoLaunch,
}

impl Autostart {
    pub fn new() -> Result<Self> {
        let exe = std::env::current_exe().context("Failed to resolve executable path")?;
        let inner = AutoLaunchBuilder::new()
            .set_app_name("sysboard")
            .set_app_path(&exe.to_string_lossy())
            .build()
            .context("Failed to configure autostart entry")?;
        Ok(Self { inner })
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_enabled().unwrap_or_else(|err| {
            warn!(error = %err, "could not query autostart state");
            false
        })
    }

    pub fn set_enabled(&self, enable: bool) -> Result<()> {
        let current = self.inner.is_enabled().unwrap_or(false);
        if enable && !current {
            self.inner.enable().context("Failed to install autostart entry")?;
        } else if !enable && current {
            self.inner.disable().context("Failed to remove autostart entry")?;
        }
        Ok(())
    }
}
