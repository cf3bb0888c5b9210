//! External imaging tool seam.
//!
//! The core only depends on success/failure of each imaging call, so the
//! tool sits behind a trait: production uses a DISM-style command-line
//! binary, tests substitute a scripted fake. The shell inspector is a
//! separate, best-effort collaborator whose failure never fails servicing.

use std::path::{Path, PathBuf};

use crate::error::ServicingError;
use crate::process::Cmd;

/// Offline-image operations the servicing layer needs.
///
/// Any tool exposing equivalent mount/mutate/commit semantics can
/// implement this.
pub trait ImagingTool {
    fn mount(&self, image: &Path, index: u32, mount_dir: &Path) -> Result<(), ServicingError>;

    /// Inject every driver found under `driver_dir`, recursively.
    fn add_driver(&self, mount_dir: &Path, driver_dir: &Path) -> Result<(), ServicingError>;

    /// Enable a feature with its dependency closure.
    fn enable_feature(&self, mount_dir: &Path, feature: &str) -> Result<(), ServicingError>;

    fn add_package(&self, mount_dir: &Path, package: &Path) -> Result<(), ServicingError>;

    /// Unmount the image, committing when `commit` is true, discarding
    /// otherwise.
    fn unmount(&self, mount_dir: &Path, commit: bool) -> Result<(), ServicingError>;

    fn capture(
        &self,
        volume: &Path,
        image: &Path,
        name: &str,
        compression: &str,
    ) -> Result<(), ServicingError>;

    fn apply(&self, image: &Path, index: u32, target_dir: &Path) -> Result<(), ServicingError>;
}

/// DISM-style command-line imaging tool.
#[derive(Debug, Clone)]
pub struct DismCli {
    binary: PathBuf,
}

impl DismCli {
    /// Locate the imaging binary on this host.
    ///
    /// Fails with `PlatformUnsupported` before any mutation begins when
    /// the tool is absent.
    pub fn locate(binary: &str) -> Result<Self, ServicingError> {
        let path = which::which(binary).map_err(|_| ServicingError::PlatformUnsupported {
            tool: binary.to_string(),
        })?;
        Ok(Self { binary: path })
    }

    /// Wrap an already-resolved binary path (used when the caller has its
    /// own discovery).
    pub fn from_path(binary: PathBuf) -> Self {
        Self { binary }
    }

    fn run(&self, operation: &str, cmd: Cmd) -> Result<(), ServicingError> {
        cmd.error_msg(format!("{operation} failed"))
            .run()
            .map(|_| ())
            .map_err(|e| ServicingError::Tool {
                operation: operation.to_string(),
                detail: e.to_string(),
            })
    }

    fn cmd(&self) -> Cmd {
        Cmd::new(self.binary.to_string_lossy())
    }
}

impl ImagingTool for DismCli {
    fn mount(&self, image: &Path, index: u32, mount_dir: &Path) -> Result<(), ServicingError> {
        self.run(
            "mount-image",
            self.cmd()
                .arg("/Mount-Image")
                .arg(format!("/ImageFile:{}", image.display()))
                .arg(format!("/Index:{index}"))
                .arg(format!("/MountDir:{}", mount_dir.display())),
        )
    }

    fn add_driver(&self, mount_dir: &Path, driver_dir: &Path) -> Result<(), ServicingError> {
        self.run(
            "add-driver",
            self.cmd()
                .arg(format!("/Image:{}", mount_dir.display()))
                .arg("/Add-Driver")
                .arg(format!("/Driver:{}", driver_dir.display()))
                .arg("/Recurse"),
        )
    }

    fn enable_feature(&self, mount_dir: &Path, feature: &str) -> Result<(), ServicingError> {
        self.run(
            "enable-feature",
            self.cmd()
                .arg(format!("/Image:{}", mount_dir.display()))
                .arg("/Enable-Feature")
                .arg(format!("/FeatureName:{feature}"))
                .arg("/All"),
        )
    }

    fn add_package(&self, mount_dir: &Path, package: &Path) -> Result<(), ServicingError> {
        self.run(
            "add-package",
            self.cmd()
                .arg(format!("/Image:{}", mount_dir.display()))
                .arg("/Add-Package")
                .arg(format!("/PackagePath:{}", package.display())),
        )
    }

    fn unmount(&self, mount_dir: &Path, commit: bool) -> Result<(), ServicingError> {
        let outcome = if commit { "/Commit" } else { "/Discard" };
        self.run(
            "unmount-image",
            self.cmd()
                .arg("/Unmount-Image")
                .arg(format!("/MountDir:{}", mount_dir.display()))
                .arg(outcome),
        )
    }

    fn capture(
        &self,
        volume: &Path,
        image: &Path,
        name: &str,
        compression: &str,
    ) -> Result<(), ServicingError> {
        self.run(
            "capture-image",
            self.cmd()
                .arg("/Capture-Image")
                .arg(format!("/ImageFile:{}", image.display()))
                .arg(format!("/CaptureDir:{}", volume.display()))
                .arg(format!("/Name:{name}"))
                .arg(format!("/Compress:{compression}")),
        )
    }

    fn apply(&self, image: &Path, index: u32, target_dir: &Path) -> Result<(), ServicingError> {
        self.run(
            "apply-image",
            self.cmd()
                .arg("/Apply-Image")
                .arg(format!("/ImageFile:{}", image.display()))
                .arg(format!("/Index:{index}"))
                .arg(format!("/ApplyDir:{}", target_dir.display())),
        )
    }
}

/// Best-effort post-mutation inspection of a mounted image.
pub trait MountInspector {
    fn inspect(&self, mount_dir: &Path) -> anyhow::Result<String>;
}

/// Runs the configured shell tool to list the drivers present in a mount.
///
/// Failures here are logged and swallowed by the caller; inspection never
/// fails the servicing operation.
#[derive(Debug, Clone)]
pub struct ShellInspector {
    binary: String,
}

impl ShellInspector {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl MountInspector for ShellInspector {
    fn inspect(&self, mount_dir: &Path) -> anyhow::Result<String> {
        let result = Cmd::new(&self.binary)
            .arg("-Command")
            .arg(format!("Get-WindowsDriver -Path '{}'", mount_dir.display()))
            .allow_fail()
            .run()?;
        Ok(result.stdout_trimmed().to_string())
    }
}
