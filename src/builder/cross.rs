//! Containerized cross toolchains.
//!
//! Cross builds run cmake through a driver script emitted by a dockcross
//! style image: running the image with no arguments prints a shell script
//! that, placed in front of any command, executes it inside the container
//! with the current directory mounted.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::util::config::DEFAULT_IMAGE_PREFIX;
use crate::util::context::STAGING_ROOT;
use crate::util::fs::make_executable;
use crate::util::process::{ProcessBuilder, ToolError};

/// Directory under the staging root holding materialized driver scripts.
pub const CROSS_SCRIPT_DIR: &str = "cross_compile_stuff";

/// Error while producing a cross driver script.
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("no container runtime configured")]
    NoRuntime,

    #[error("image `{image}` did not emit a toolchain script")]
    EmptyScript { image: String },

    #[error("toolchain script path {} is not valid UTF-8", .path.display())]
    NonUtf8Path { path: PathBuf },

    #[error("failed to write toolchain script {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Produces an executable driver script for a cross toolchain image.
pub trait ToolchainMaterializer {
    /// Return the path of an executable script for `target_arch`, built
    /// from the image identified by `image_suffix`.
    fn materialize(&self, target_arch: &str, image_suffix: &str)
        -> Result<PathBuf, MaterializeError>;
}

/// Materializes driver scripts by running the toolchain image with docker.
#[derive(Debug, Clone)]
pub struct DockerMaterializer {
    project_dir: PathBuf,
    image_prefix: String,
    refresh: bool,
    runtime: Vec<String>,
}

impl DockerMaterializer {
    /// Create a materializer writing scripts below `project_dir`.
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        DockerMaterializer {
            project_dir: project_dir.into(),
            image_prefix: DEFAULT_IMAGE_PREFIX.to_string(),
            refresh: true,
            runtime: vec!["docker".to_string()],
        }
    }

    /// Set the image name prefix (the suffix is the mapped architecture).
    pub fn image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.image_prefix = prefix.into();
        self
    }

    /// Whether an existing script is replaced on every call.
    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// Override the container runtime command (defaults to `docker`).
    pub fn runtime<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runtime = command.into_iter().map(Into::into).collect();
        self
    }

    /// Full image reference for an architecture suffix.
    pub fn image_name(&self, image_suffix: &str) -> String {
        format!("{}{}:latest", self.image_prefix, image_suffix)
    }

    /// Where the driver script for `target_arch` is stored.
    pub fn script_path(&self, target_arch: &str) -> PathBuf {
        script_path(&self.project_dir, target_arch)
    }

    fn run_command(&self, image: &str) -> Option<ProcessBuilder> {
        let pb = ProcessBuilder::from_prefix(&self.runtime)?;
        Some(
            pb.args(["run", "--pull", "always", image])
                .cwd(&self.project_dir),
        )
    }
}

/// Deterministic location of a cross driver script.
pub fn script_path(project_dir: &Path, target_arch: &str) -> PathBuf {
    project_dir
        .join(STAGING_ROOT)
        .join(CROSS_SCRIPT_DIR)
        .join(format!("{}.sh", target_arch))
}

impl ToolchainMaterializer for DockerMaterializer {
    fn materialize(
        &self,
        target_arch: &str,
        image_suffix: &str,
    ) -> Result<PathBuf, MaterializeError> {
        let path = self.script_path(target_arch);

        if !self.refresh && path.is_file() {
            tracing::info!("Reusing cross toolchain script {}", path.display());
            return Ok(path);
        }

        let image = self.image_name(image_suffix);
        tracing::info!("Materializing cross toolchain from {}", image);

        let cmd = self.run_command(&image).ok_or(MaterializeError::NoRuntime)?;
        let output = cmd.exec_and_check("toolchain materialization")?;

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(MaterializeError::EmptyScript { image });
        }

        let write = |path: &Path| -> io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &output.stdout)?;
            make_executable(path)
        };
        write(&path).map_err(|source| MaterializeError::Write {
            path: path.clone(),
            source,
        })?;

        tracing::debug!("wrote {}", path.display());
        Ok(path)
    }
}

/// Reports where a driver script would live without running a container.
///
/// Used when only the plan is requested.
#[derive(Debug, Clone)]
pub struct DryRunMaterializer {
    project_dir: PathBuf,
}

impl DryRunMaterializer {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        DryRunMaterializer {
            project_dir: project_dir.into(),
        }
    }
}

impl ToolchainMaterializer for DryRunMaterializer {
    fn materialize(
        &self,
        target_arch: &str,
        _image_suffix: &str,
    ) -> Result<PathBuf, MaterializeError> {
        Ok(script_path(&self.project_dir, target_arch))
    }
}
