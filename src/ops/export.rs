//! Implementation of `openchamp export`.
//!
//! Exports the game through the Godot editor's headless export pipeline,
//! using the export presets named after the build flavour and platform.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::builder::arch::{BuildMode, HostPlatform};
use crate::util::fs::ensure_dir;
use crate::util::process::ProcessBuilder;
use crate::util::GlobalContext;

/// Directory, relative to the project, that receives export archives.
pub const EXPORT_DIR: &str = "build";

/// Which half of the game to export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportType {
    #[default]
    Client,
    Server,
}

impl ExportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportType::Client => "client",
            ExportType::Server => "server",
        }
    }

    fn profile_prefix(&self) -> &'static str {
        match self {
            ExportType::Client => "Client",
            ExportType::Server => "Server",
        }
    }
}

impl FromStr for ExportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(ExportType::Client),
            "server" => Ok(ExportType::Server),
            _ => Err(format!("unknown export type `{}`", s)),
        }
    }
}

/// Concrete export platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPlatform {
    WindowsAmd64,
    WindowsArm64,
    LinuxAmd64,
    LinuxArm64,
    Macos,
}

impl ExportPlatform {
    pub const ALL: [ExportPlatform; 5] = [
        ExportPlatform::WindowsAmd64,
        ExportPlatform::WindowsArm64,
        ExportPlatform::LinuxAmd64,
        ExportPlatform::LinuxArm64,
        ExportPlatform::Macos,
    ];

    /// Platform matching the host the export runs on.
    pub fn for_host(host: &HostPlatform) -> Result<Self> {
        let arm = host.arch == "aarch64";
        match host.os.as_str() {
            "windows" if arm => Ok(ExportPlatform::WindowsArm64),
            "windows" => Ok(ExportPlatform::WindowsAmd64),
            "linux" if arm => Ok(ExportPlatform::LinuxArm64),
            "linux" => Ok(ExportPlatform::LinuxAmd64),
            "macos" => Ok(ExportPlatform::Macos),
            other => bail!(
                "no native export platform for host OS `{}`; pass --export_platform explicitly",
                other
            ),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportPlatform::WindowsAmd64 => "windows_amd64",
            ExportPlatform::WindowsArm64 => "windows_arm64",
            ExportPlatform::LinuxAmd64 => "linux_amd64",
            ExportPlatform::LinuxArm64 => "linux_arm64",
            ExportPlatform::Macos => "macos",
        }
    }

    fn profile_suffix(&self) -> &'static str {
        match self {
            ExportPlatform::WindowsAmd64 => "Windows (amd64)",
            ExportPlatform::WindowsArm64 => "Windows (arm64)",
            ExportPlatform::LinuxAmd64 => "Linux (amd64)",
            ExportPlatform::LinuxArm64 => "Linux (arm64)",
            ExportPlatform::Macos => "macOS",
        }
    }
}

impl fmt::Display for ExportPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportPlatform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown export platform `{}`", s))
    }
}

/// Options for the export command.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Path to the Godot editor console executable
    pub godot: Option<PathBuf>,

    pub export_type: ExportType,

    /// `None` exports for the host platform
    pub platform: Option<ExportPlatform>,

    pub release_type: BuildMode,

    /// Host override, detected when `None`
    pub host: Option<HostPlatform>,
}

/// What the export will produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    pub platform: ExportPlatform,
    /// Name of the Godot export preset
    pub profile: String,
    /// Archive file name inside the export directory
    pub archive: String,
}

impl ExportTarget {
    pub fn new(export_type: ExportType, platform: ExportPlatform) -> Self {
        ExportTarget {
            platform,
            profile: format!("{} {}", export_type.profile_prefix(), platform.profile_suffix()),
            archive: format!("openchamp_{}_{}.zip", export_type.as_str(), platform.as_str()),
        }
    }
}

/// Resolve the export target for the given options.
pub fn export_target(opts: &ExportOptions) -> Result<ExportTarget> {
    let platform = match opts.platform {
        Some(platform) => platform,
        None => {
            let host = opts.host.clone().unwrap_or_else(HostPlatform::host);
            ExportPlatform::for_host(&host)?
        }
    };
    Ok(ExportTarget::new(opts.export_type, platform))
}

/// The headless export command.
pub fn export_command(godot: &Path, target: &ExportTarget, release_type: BuildMode) -> ProcessBuilder {
    let export_arg = match release_type {
        BuildMode::Debug => "--export-debug",
        BuildMode::Release => "--export-release",
    };

    ProcessBuilder::new(godot).args([
        "--headless".to_string(),
        export_arg.to_string(),
        target.profile.clone(),
        format!("{}/{}", EXPORT_DIR, target.archive),
    ])
}

/// Export the game.
pub fn export(ctx: &GlobalContext, opts: &ExportOptions) -> Result<ExportTarget> {
    let target = export_target(opts)?;

    tracing::info!(
        "Exporting {} for {} as \"{}\"",
        opts.export_type.as_str(),
        target.platform,
        target.archive
    );

    let Some(godot) = opts.godot.as_ref().filter(|g| !g.as_os_str().is_empty()) else {
        bail!("no Godot executable given; pass --godot_path");
    };

    ProcessBuilder::new(godot)
        .arg("--version")
        .cwd(ctx.project_dir())
        .status_and_check("godot version check")
        .with_context(|| format!("`{}` is not a usable Godot executable", godot.display()))?;

    ensure_dir(&ctx.project_dir().join(EXPORT_DIR))?;

    export_command(godot, &target, opts.release_type)
        .cwd(ctx.project_dir())
        .status_and_check("export")
        .with_context(|| format!("failed to export \"{}\"", target.profile))?;

    Ok(target)
}
