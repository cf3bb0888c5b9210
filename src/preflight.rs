//! Preflight checks for image servicing.
//!
//! Validates host tooling before any image mutation begins, so a missing
//! imaging tool fails fast instead of mid-session.

use crate::config::Config;
use crate::error::ServicingError;

/// Verify that the configured imaging tool exists on this host.
///
/// The shell inspection tool is checked too, but only warns: inspection
/// is best-effort and its absence never blocks servicing.
pub fn check_host(config: &Config) -> Result<(), ServicingError> {
    if which::which(&config.imaging_tool).is_err() {
        return Err(ServicingError::PlatformUnsupported {
            tool: config.imaging_tool.clone(),
        });
    }

    if which::which(&config.shell_tool).is_err() {
        eprintln!(
            "[WARN] shell tool '{}' not found; mount inspection will be skipped",
            config.shell_tool
        );
    }

    Ok(())
}
