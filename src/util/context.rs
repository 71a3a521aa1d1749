//! Global context for operator commands.
//!
//! Provides centralized access to the project layout and configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// File that marks the root of the Godot project.
pub const PROJECT_MARKER: &str = "project.godot";

/// Directory holding the native extension sources, build directories and
/// cross driver scripts.
pub const STAGING_ROOT: &str = "extensions";

/// Global context shared by all commands.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    project_dir: PathBuf,
    config: Config,
}

impl GlobalContext {
    /// Create a context for an explicit project directory, or discover it
    /// from the current directory.
    pub fn new(project_dir: Option<PathBuf>) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        let project_dir = match project_dir {
            Some(dir) => {
                let dir = crate::util::fs::absolutize(&cwd, &dir);
                if !dir.is_dir() {
                    anyhow::bail!("project directory does not exist: {}", dir.display());
                }
                dir
            }
            None => find_project_root(&cwd).unwrap_or(cwd),
        };

        let config = load_config(
            global_config_path().as_deref(),
            &project_config_path(&project_dir),
        );

        tracing::debug!("project directory: {}", project_dir.display());

        Ok(GlobalContext {
            project_dir,
            config,
        })
    }

    /// Create a context with an already-loaded configuration.
    pub fn with_config(project_dir: impl Into<PathBuf>, config: Config) -> Self {
        GlobalContext {
            project_dir: project_dir.into(),
            config,
        }
    }

    /// Root of the Godot project.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Merged configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The native extension staging directory.
    pub fn extensions_dir(&self) -> PathBuf {
        self.project_dir.join(STAGING_ROOT)
    }

    /// Directory for third-party tool checkouts (Aseprite, Skia).
    pub fn tools_dir(&self) -> PathBuf {
        self.project_dir
            .join(crate::util::config::CONFIG_DIR_NAME)
            .join("tools")
    }
}

/// Walk up from `start` looking for the project marker file.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(PROJECT_MARKER).is_file())
        .map(Path::to_path_buf)
}
