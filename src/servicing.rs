//! Transactional offline-image servicing.
//!
//! An `ImageServicingSession` wraps the external imaging tool's
//! mount/mutate/commit cycle so the mount can never outlive the session:
//! every exit from the mutation phase ends in Committed or Discarded,
//! never in a dangling mount. Mutations apply in a fixed order - drivers,
//! then features, then update packages.

use std::path::{Path, PathBuf};

use crate::error::ServicingError;
use crate::imaging::{ImagingTool, MountInspector};

/// Lifecycle state of a servicing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unmounted,
    Mounted,
    Committed,
    Discarded,
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Unmounted => "Unmounted",
            SessionState::Mounted => "Mounted",
            SessionState::Committed => "Committed",
            SessionState::Discarded => "Discarded",
        }
    }
}

/// Ordered mutations to apply to a mounted image.
#[derive(Debug, Default, Clone)]
pub struct MutationSet {
    /// Driver source directories, injected recursively.
    pub drivers: Vec<PathBuf>,
    /// Feature names, enabled with their dependency closure.
    pub features: Vec<String>,
    /// Update package files.
    pub packages: Vec<PathBuf>,
}

impl MutationSet {
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty() && self.features.is_empty() && self.packages.is_empty()
    }
}

/// A mount/apply/commit-or-discard session over one image.
///
/// The caller drives open/apply/close explicitly; if the session is
/// dropped while still mounted, a best-effort discard runs so the mount
/// is released regardless of how the caller exited.
pub struct ImageServicingSession<'t> {
    tool: &'t dyn ImagingTool,
    inspector: Option<&'t dyn MountInspector>,
    image: PathBuf,
    mount_dir: PathBuf,
    index: u32,
    state: SessionState,
}

impl<'t> ImageServicingSession<'t> {
    pub fn new(tool: &'t dyn ImagingTool, image: &Path, mount_dir: &Path, index: u32) -> Self {
        Self {
            tool,
            inspector: None,
            image: image.to_path_buf(),
            mount_dir: mount_dir.to_path_buf(),
            index,
            state: SessionState::Unmounted,
        }
    }

    /// Attach a best-effort post-mutation inspector.
    pub fn with_inspector(mut self, inspector: &'t dyn MountInspector) -> Self {
        self.inspector = Some(inspector);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mount_dir(&self) -> &Path {
        &self.mount_dir
    }

    /// Mount the image. On failure the state stays Unmounted; there is
    /// nothing to release.
    pub fn open(&mut self) -> Result<(), ServicingError> {
        self.require_state("open", SessionState::Unmounted)?;
        self.tool.mount(&self.image, self.index, &self.mount_dir)?;
        self.state = SessionState::Mounted;
        Ok(())
    }

    /// Apply mutations in fixed order: every driver, then every feature,
    /// then every update package.
    ///
    /// The first failure aborts the remaining mutations of this call but
    /// leaves the session Mounted - the caller decides whether to commit
    /// partial progress or discard. Inspection (when configured) runs
    /// after the mutation loop whatever its outcome, and its own failure
    /// is swallowed.
    pub fn apply(&mut self, mutations: &MutationSet) -> Result<(), ServicingError> {
        self.require_state("apply", SessionState::Mounted)?;
        let result = self.apply_ordered(mutations);
        self.inspect_mount();
        result
    }

    fn apply_ordered(&self, mutations: &MutationSet) -> Result<(), ServicingError> {
        for driver in &mutations.drivers {
            self.tool.add_driver(&self.mount_dir, driver)?;
        }
        for feature in &mutations.features {
            self.tool.enable_feature(&self.mount_dir, feature)?;
        }
        for package in &mutations.packages {
            self.tool.add_package(&self.mount_dir, package)?;
        }
        Ok(())
    }

    /// Unmount the image, committing or discarding its mutations.
    ///
    /// When a requested commit fails, the session issues a discard before
    /// propagating the original commit error, so the terminal state is
    /// always Committed or Discarded.
    pub fn close(&mut self, commit: bool) -> Result<(), ServicingError> {
        self.require_state("close", SessionState::Mounted)?;

        if commit {
            match self.tool.unmount(&self.mount_dir, true) {
                Ok(()) => {
                    self.state = SessionState::Committed;
                    Ok(())
                }
                Err(commit_err) => {
                    // The mount must not outlive the session: fall back to
                    // discard, then surface the original commit error.
                    if let Err(discard_err) = self.tool.unmount(&self.mount_dir, false) {
                        eprintln!(
                            "[WARN] discard after failed commit also failed: {discard_err}"
                        );
                    }
                    self.state = SessionState::Discarded;
                    Err(commit_err)
                }
            }
        } else {
            let result = self.tool.unmount(&self.mount_dir, false);
            self.state = SessionState::Discarded;
            result
        }
    }

    fn require_state(
        &self,
        operation: &'static str,
        required: SessionState,
    ) -> Result<(), ServicingError> {
        if self.state != required {
            return Err(ServicingError::InvalidState {
                operation,
                required: required.name(),
                actual: self.state.name(),
            });
        }
        Ok(())
    }

    fn inspect_mount(&self) {
        let Some(inspector) = self.inspector else {
            return;
        };
        match inspector.inspect(&self.mount_dir) {
            Ok(listing) if !listing.is_empty() => {
                println!("Mount contents after servicing:\n{listing}");
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("[WARN] mount inspection failed (ignored): {e}");
            }
        }
    }
}

impl Drop for ImageServicingSession<'_> {
    fn drop(&mut self) {
        if self.state == SessionState::Mounted {
            eprintln!(
                "[WARN] servicing session dropped while mounted; discarding {}",
                self.mount_dir.display()
            );
            if self.tool.unmount(&self.mount_dir, false).is_ok() {
                self.state = SessionState::Discarded;
            }
        }
    }
}

/// Image capture container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    Wim,
    Esd,
}

impl CaptureFormat {
    /// Parse a format name, case-insensitively.
    pub fn parse(value: &str) -> Result<Self, ServicingError> {
        match value.to_ascii_lowercase().as_str() {
            "wim" => Ok(CaptureFormat::Wim),
            "esd" => Ok(CaptureFormat::Esd),
            other => Err(ServicingError::InvalidArgument(format!(
                "capture format must be 'wim' or 'esd', got '{other}'"
            ))),
        }
    }

    /// Effective compression level for this format.
    ///
    /// esd always uses recovery compression, overriding the caller; wim
    /// honors the caller's level and defaults to max.
    pub fn compression(self, requested: Option<&str>) -> String {
        match self {
            CaptureFormat::Esd => "recovery".to_string(),
            CaptureFormat::Wim => requested.unwrap_or("max").to_string(),
        }
    }
}

/// Capture a volume into an image file. One-shot; no session involved.
pub fn capture_image(
    tool: &dyn ImagingTool,
    volume: &Path,
    image: &Path,
    name: &str,
    format: &str,
    compression: Option<&str>,
) -> Result<(), ServicingError> {
    let format = CaptureFormat::parse(format)?;
    let compression = format.compression(compression);
    tool.capture(volume, image, name, &compression)
}

/// Apply an image index onto a target directory. One-shot.
pub fn apply_image(
    tool: &dyn ImagingTool,
    image: &Path,
    target_dir: &Path,
    index: u32,
) -> Result<(), ServicingError> {
    tool.apply(image, index, target_dir)
}
