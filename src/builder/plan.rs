//! Build requests and toolchain plans.
//!
//! A [`BuildRequest`] captures what the operator asked for. A
//! [`ToolchainPlan`] is the resolved answer: which command prefix drives
//! cmake, where the build directory lives and which environment variables
//! must be set. The plan expands into the three cmake phases (setup, build,
//! install) as [`Invocation`]s.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::builder::arch::{canonical_arch, BuildMode, HostPlatform, NATIVE};
use crate::util::context::STAGING_ROOT;
use crate::util::process::ProcessBuilder;

/// The build tool every plan drives.
pub const BASE_BUILD_TOOL: &str = "cmake";

/// Default cmake generator flag.
pub const DEFAULT_GENERATOR: &str = "-GNinja";

/// CMake's linker-selection environment variable.
pub const LINKER_ENV_VAR: &str = "CMAKE_LINKER_TYPE";

/// A single request to compile the native extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildRequest {
    /// Requested target architecture, or `native`
    pub target_arch: String,
    /// Architecture of the build machine
    pub host_arch: String,
    /// Operating system of the build machine
    pub host_os: String,
    /// Debug or release
    pub build_mode: BuildMode,
    /// Explicit build directory
    pub build_dir: Option<PathBuf>,
    /// cmake generator flag (e.g. `-GNinja`)
    pub generator: String,
    /// Caller-selected linker id
    pub linker_override: Option<String>,
    /// Parallel jobs, 0 lets the build tool decide
    pub job_count: Option<u32>,
}

impl BuildRequest {
    /// Create a request with default settings for the given host.
    pub fn new(target_arch: impl Into<String>, host: &HostPlatform) -> Self {
        BuildRequest {
            target_arch: target_arch.into(),
            host_arch: host.arch.clone(),
            host_os: host.os.clone(),
            build_mode: BuildMode::default(),
            build_dir: None,
            generator: DEFAULT_GENERATOR.to_string(),
            linker_override: None,
            job_count: None,
        }
    }

    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.build_mode = mode;
        self
    }

    pub fn with_build_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.build_dir = dir;
        self
    }

    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    pub fn with_linker(mut self, linker: Option<String>) -> Self {
        self.linker_override = linker;
        self
    }

    pub fn with_jobs(mut self, jobs: Option<u32>) -> Self {
        self.job_count = jobs;
        self
    }

    /// Canonical target architecture, with the `native` sentinel replaced
    /// by the host and aliases such as `arm64` or `amd64` normalized.
    pub fn resolved_target_arch(&self) -> &str {
        if self.target_arch == NATIVE {
            canonical_arch(&self.host_arch)
        } else {
            canonical_arch(&self.target_arch)
        }
    }

    /// Whether the build runs on the host toolchain.
    pub fn is_native(&self) -> bool {
        self.resolved_target_arch() == canonical_arch(&self.host_arch)
    }

    /// The caller's linker choice; an empty string counts as no choice.
    pub fn linker_override(&self) -> Option<&str> {
        self.linker_override.as_deref().filter(|l| !l.is_empty())
    }

    /// Explicit parallelism, if any.
    pub fn parallelism(&self) -> Option<u32> {
        self.job_count.filter(|jobs| *jobs > 0)
    }
}

/// The resolved toolchain for a build request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainPlan {
    /// Target architecture after `native` resolution
    pub target_arch: String,
    /// Command and arguments that prefix every cmake call
    pub invocation_prefix: Vec<String>,
    /// Build directory passed to every phase
    pub build_directory: PathBuf,
    /// Variables the caller must set on spawned processes
    pub environment_overlay: BTreeMap<String, String>,
}

/// One of the three cmake phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Setup,
    Build,
    Install,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Build => "build",
            Phase::Install => "install",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully assembled external command for one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub phase: Phase,
    pub command: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    /// Convert into a process rooted at `cwd`.
    pub fn to_process(&self, cwd: &Path) -> Option<ProcessBuilder> {
        ProcessBuilder::from_prefix(&self.command).map(|pb| pb.envs(&self.env).cwd(cwd))
    }
}

impl ToolchainPlan {
    /// Whether the plan runs through a cross driver script.
    pub fn is_cross(&self) -> bool {
        self.invocation_prefix.len() > 1
    }

    fn invocation(&self, phase: Phase, args: Vec<String>) -> Invocation {
        let mut command = self.invocation_prefix.clone();
        command.extend(args);
        Invocation {
            phase,
            command,
            env: self.environment_overlay.clone(),
        }
    }

    fn build_dir_arg(&self) -> String {
        self.build_directory.display().to_string()
    }

    /// `cmake -DCMAKE_BUILD_TYPE=<type> -B <dir> <generator> extensions`
    pub fn setup_invocation(&self, request: &BuildRequest) -> Invocation {
        let mut args = vec![
            format!("-DCMAKE_BUILD_TYPE={}", request.build_mode.cmake_build_type()),
            "-B".to_string(),
            self.build_dir_arg(),
        ];
        if !request.generator.is_empty() {
            args.push(request.generator.clone());
        }
        args.push(STAGING_ROOT.to_string());
        self.invocation(Phase::Setup, args)
    }

    /// `cmake --build <dir> [--parallel N]`
    pub fn build_invocation(&self, request: &BuildRequest) -> Invocation {
        let mut args = vec!["--build".to_string(), self.build_dir_arg()];
        if let Some(jobs) = request.parallelism() {
            args.push("--parallel".to_string());
            args.push(jobs.to_string());
        }
        self.invocation(Phase::Build, args)
    }

    /// `cmake --install <dir>`
    pub fn install_invocation(&self) -> Invocation {
        self.invocation(
            Phase::Install,
            vec!["--install".to_string(), self.build_dir_arg()],
        )
    }

    /// The phases to run in order.
    pub fn invocations(&self, request: &BuildRequest, skip_setup: bool) -> Vec<Invocation> {
        let mut invocations = Vec::with_capacity(3);
        if !skip_setup {
            invocations.push(self.setup_invocation(request));
        }
        invocations.push(self.build_invocation(request));
        invocations.push(self.install_invocation());
        invocations
    }
}
