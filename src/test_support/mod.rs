//! Test doubles for the toolchain resolver's collaborators.
//!
//! These stand in for the host linker probe and the container runtime so
//! resolution can be tested without docker or a preinstalled `mold`.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;

use crate::builder::cross::{script_path, MaterializeError, ToolchainMaterializer};
use crate::builder::linker::LinkerProbe;
use crate::util::process::ToolError;

/// Linker probe with a fixed answer that counts how often it was asked.
#[derive(Debug, Default)]
pub struct FixedLinkerProbe {
    linker: Option<String>,
    calls: Cell<usize>,
}

impl FixedLinkerProbe {
    /// A probe that finds the given linker id.
    pub fn present(linker: &str) -> Self {
        FixedLinkerProbe {
            linker: Some(linker.to_string()),
            calls: Cell::new(0),
        }
    }

    /// A probe that never finds a linker.
    pub fn absent() -> Self {
        FixedLinkerProbe::default()
    }

    /// Number of probe calls so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl LinkerProbe for FixedLinkerProbe {
    fn preferred_linker(&self) -> Option<String> {
        self.calls.set(self.calls.get() + 1);
        self.linker.clone()
    }
}

/// Materializer that records requests instead of running a container.
#[derive(Debug)]
pub struct RecordingMaterializer {
    project_dir: PathBuf,
    fail: bool,
    requests: RefCell<Vec<(String, String)>>,
}

impl RecordingMaterializer {
    /// Succeeds with the deterministic script path under `project_dir`.
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        RecordingMaterializer {
            project_dir: project_dir.into(),
            fail: false,
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Fails every request as if the container runtime exited non-zero.
    pub fn failing(project_dir: impl Into<PathBuf>) -> Self {
        RecordingMaterializer {
            fail: true,
            ..RecordingMaterializer::new(project_dir)
        }
    }

    /// `(target_arch, image_suffix)` pairs requested so far.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.borrow().clone()
    }
}

impl ToolchainMaterializer for RecordingMaterializer {
    fn materialize(
        &self,
        target_arch: &str,
        image_suffix: &str,
    ) -> Result<PathBuf, MaterializeError> {
        self.requests
            .borrow_mut()
            .push((target_arch.to_string(), image_suffix.to_string()));

        if self.fail {
            return Err(MaterializeError::Tool(ToolError::ExternalToolFailure {
                phase: "toolchain materialization".to_string(),
                command: format!("docker run --pull always dockcross/linux-{}:latest", image_suffix),
                code: Some(125),
                stderr: "Unable to find image".to_string(),
            }));
        }

        Ok(script_path(&self.project_dir, target_arch))
    }
}
