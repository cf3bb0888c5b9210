//! Configuration management for deploykit.
//!
//! Reads configuration from .env file and environment variables.
//! Environment variables take precedence over .env file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default imaging tool binary.
pub const DEFAULT_IMAGING_TOOL: &str = "dism";

/// Default shell binary for best-effort mount inspection.
pub const DEFAULT_SHELL_TOOL: &str = "powershell";

/// Deploykit configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory where fetched media lands (default: media/)
    pub media_root: PathBuf,
    /// Imaging tool binary name or path
    pub imaging_tool: String,
    /// Shell binary for post-mutation inspection
    pub shell_tool: String,
}

impl Config {
    /// Load configuration from .env file and environment.
    pub fn load(base_dir: &Path) -> Self {
        let mut env_vars = HashMap::new();

        // Try to load .env file
        let env_path = base_dir.join(".env");
        if env_path.exists() {
            if let Ok(content) = fs::read_to_string(&env_path) {
                for line in content.lines() {
                    let line = line.trim();
                    // Skip comments and empty lines
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    // Parse KEY=value
                    if let Some((key, value)) = line.split_once('=') {
                        let key = key.trim();
                        let value = value.trim();
                        let value = value.trim_matches('"').trim_matches('\'');
                        env_vars.insert(key.to_string(), value.to_string());
                    }
                }
            }
        }

        // Environment variables override .env file
        for (key, value) in std::env::vars() {
            env_vars.insert(key, value);
        }

        let media_root = env_vars
            .get("MEDIA_ROOT")
            .map(|s| {
                let path = PathBuf::from(s);
                if path.is_absolute() {
                    path
                } else {
                    base_dir.join(path)
                }
            })
            .unwrap_or_else(|| base_dir.join("media"));

        let imaging_tool = env_vars
            .get("IMAGING_TOOL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_IMAGING_TOOL.to_string());

        let shell_tool = env_vars
            .get("SHELL_TOOL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_SHELL_TOOL.to_string());

        Self {
            media_root,
            imaging_tool,
            shell_tool,
        }
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  MEDIA_ROOT: {}", self.media_root.display());
        println!("  IMAGING_TOOL: {}", self.imaging_tool);
        println!("  SHELL_TOOL: {}", self.shell_tool);
    }
}
