//! Implementation of `openchamp aseprite`.
//!
//! Builds the Aseprite sprite editor from source against a prebuilt Skia
//! release, inside the project's tools directory.

use std::fmt;
use std::fs::File;
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use url::Url;

use crate::builder::arch::{canonical_arch, HostPlatform};
use crate::builder::linker::{select_linker, LinkerProbe, PathLinkerProbe};
use crate::builder::plan::{BASE_BUILD_TOOL, LINKER_ENV_VAR};
use crate::util::fs::remove_dir_all_if_exists;
use crate::util::git;
use crate::util::process::{find_executable, ProcessBuilder};
use crate::util::GlobalContext;

pub const ASEPRITE_REPO: &str = "https://github.com/aseprite/aseprite";
const SKIA_RELEASES: &str = "https://github.com/aseprite/skia/releases/download/";

const ASEPRITE_DIR: &str = "aseprite";
const SKIA_DIR: &str = "skia";
const BUILD_DIR: &str = "build";

/// What to do with the Aseprite checkout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AsepriteAction {
    #[default]
    Compile,
    Update,
    Run,
}

impl AsepriteAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AsepriteAction::Compile => "compile",
            AsepriteAction::Update => "update",
            AsepriteAction::Run => "run",
        }
    }
}

impl fmt::Display for AsepriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AsepriteAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compile" => Ok(AsepriteAction::Compile),
            "update" => Ok(AsepriteAction::Update),
            "run" => Ok(AsepriteAction::Run),
            _ => Err(format!("unknown aseprite action `{}`", s)),
        }
    }
}

/// Options for the aseprite command.
#[derive(Debug, Clone, Default)]
pub struct AsepriteOptions {
    pub action: AsepriteAction,

    /// Skia release tag (CLI > config > default)
    pub skia_tag: Option<String>,

    /// Linker id (CLI > probe)
    pub linker: Option<String>,

    /// Remove the checkout and Skia before anything else
    pub cleanup: bool,

    /// Install system build dependencies first
    pub system_deps: bool,

    /// Host override, detected when `None`
    pub host: Option<HostPlatform>,
}

/// Locations of the Aseprite sources and Skia binaries.
#[derive(Debug, Clone)]
pub struct AsepriteLayout {
    pub root: PathBuf,
}

impl AsepriteLayout {
    pub fn new(ctx: &GlobalContext) -> Self {
        AsepriteLayout {
            root: ctx.tools_dir(),
        }
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root.join(ASEPRITE_DIR)
    }

    pub fn skia_dir(&self) -> PathBuf {
        self.root.join(SKIA_DIR)
    }

    pub fn executable(&self) -> PathBuf {
        let name = if cfg!(windows) { "aseprite.exe" } else { "aseprite" };
        self.source_dir().join(BUILD_DIR).join("bin").join(name)
    }
}

/// A package manager and its install command for the build dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageManager {
    /// Executable looked up on PATH
    pub probe: &'static str,
    /// Install command, run through `sudo`
    pub install: &'static [&'static str],
}

pub const PACKAGE_MANAGERS: &[PackageManager] = &[
    PackageManager {
        probe: "apt",
        install: &[
            "apt-get", "install", "-y", "g++", "clang", "libc++-dev", "libc++abi-dev", "cmake",
            "ninja-build", "libx11-dev", "libxcursor-dev", "libxi-dev", "libgl1-mesa-dev",
            "libfontconfig1-dev",
        ],
    },
    PackageManager {
        probe: "dnf",
        install: &[
            "dnf", "install", "-y", "gcc-c++", "clang", "libcxx-devel", "cmake", "ninja-build",
            "libX11-devel", "libXcursor-devel", "libXi-devel", "mesa-libGL-devel",
            "fontconfig-devel",
        ],
    },
    PackageManager {
        probe: "pacman",
        install: &[
            "pacman", "-S", "gcc", "clang", "libc++", "cmake", "ninja", "libx11", "libxcursor",
            "mesa-libgl", "fontconfig", "libwebp",
        ],
    },
    PackageManager {
        probe: "zypper",
        install: &[
            "zypper", "install", "gcc-c++", "clang", "libc++-devel", "libc++abi-devel", "cmake",
            "ninja", "libX11-devel", "libXcursor-devel", "libXi-devel", "Mesa-libGL-devel",
            "fontconfig-devel",
        ],
    },
];

/// First package manager whose probe `is_available` accepts.
pub fn detect_package_manager(is_available: impl Fn(&str) -> bool) -> Option<&'static PackageManager> {
    PACKAGE_MANAGERS.iter().find(|pm| is_available(pm.probe))
}

/// Install the Linux build dependencies with the detected package manager.
pub fn install_system_deps(host: &HostPlatform) -> Result<()> {
    if host.os != "linux" {
        tracing::warn!("Installing build dependencies is only supported on Linux");
        return Ok(());
    }

    let Some(pm) = detect_package_manager(|name| find_executable(name).is_some()) else {
        tracing::warn!("No supported package manager found (tried apt, dnf, pacman, zypper)");
        return Ok(());
    };

    ProcessBuilder::new("sudo")
        .args(pm.install)
        .status_and_check("dependency install")?;
    Ok(())
}

/// Download URL of the prebuilt Skia archive for a host.
pub fn skia_url(tag: &str, host: &HostPlatform) -> Result<Url> {
    let (os, suffix) = match host.os.as_str() {
        "windows" => ("Windows", ""),
        "linux" => ("Linux", "-libstdc++"),
        "macos" => ("macOS", ""),
        other => bail!("no Skia binaries for host OS `{}`", other),
    };

    let arch = match canonical_arch(&host.arch) {
        "x86_64" => "x64",
        "x86" => "x86",
        "aarch64" => "arm64",
        other => bail!("no Skia binaries for host architecture `{}`", other),
    };

    let file = format!("{}/Skia-{}-Release-{}{}.zip", tag, os, arch, suffix);
    Url::parse(SKIA_RELEASES)?
        .join(&file)
        .with_context(|| format!("invalid Skia tag `{}`", tag))
}

/// Download a Skia release and unpack it into `dest`.
pub fn fetch_skia(url: &Url, dest: &Path) -> Result<()> {
    tracing::info!("Downloading Skia from {}", url);

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("openchamp-tools/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(600))
        .build()?;
    let response = client
        .get(url.clone())
        .send()
        .with_context(|| format!("failed to download {}", url))?;
    if !response.status().is_success() {
        bail!("download of {} failed with {}", url, response.status());
    }

    let pb = match response.content_length() {
        Some(len) => {
            let pb = ProgressBar::new(len);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} Skia [{bar:40.cyan/blue}] {bytes}/{total_bytes}")?
                    .progress_chars("#>-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let mut archive = tempfile::tempfile().context("failed to create temporary file")?;
    io::copy(&mut pb.wrap_read(response), &mut archive)
        .with_context(|| format!("failed to download {}", url))?;
    pb.finish_and_clear();

    archive.seek(SeekFrom::Start(0))?;
    extract_zip(archive, dest)
}

/// Unpack a zip archive into `dest`, replacing anything already there.
pub fn extract_zip(archive: File, dest: &Path) -> Result<()> {
    remove_dir_all_if_exists(dest)?;
    let mut zip = zip::ZipArchive::new(archive).context("failed to read zip archive")?;
    zip.extract(dest)
        .with_context(|| format!("failed to extract archive into {}", dest.display()))?;
    tracing::debug!("extracted {} entries into {}", zip.len(), dest.display());
    Ok(())
}

/// cmake configure command for Aseprite.
pub fn setup_command(layout: &AsepriteLayout, linker: Option<&str>) -> ProcessBuilder {
    let mut cmd = ProcessBuilder::new(BASE_BUILD_TOOL)
        .args(["-G", "Ninja", "-DCMAKE_BUILD_TYPE=Release", "-DLAF_BACKEND=skia"])
        .arg(format!("-DSKIA_DIR={}", layout.skia_dir().display()))
        .args(["-B", BUILD_DIR, "."])
        .cwd(layout.source_dir());
    if let Some(linker) = linker {
        cmd = cmd.env(LINKER_ENV_VAR, linker);
    }
    cmd
}

/// cmake build command for Aseprite.
pub fn build_command(layout: &AsepriteLayout, linker: Option<&str>) -> ProcessBuilder {
    let mut cmd = ProcessBuilder::new(BASE_BUILD_TOOL)
        .args(["--build", BUILD_DIR])
        .cwd(layout.source_dir());
    if let Some(linker) = linker {
        cmd = cmd.env(LINKER_ENV_VAR, linker);
    }
    cmd
}

/// Fetch sources and Skia, then configure and build.
fn compile(
    layout: &AsepriteLayout,
    host: &HostPlatform,
    skia_tag: &str,
    update: bool,
    linker_override: Option<&str>,
    probe: &dyn LinkerProbe,
) -> Result<()> {
    let source = layout.source_dir();
    if source.is_dir() {
        if update {
            git::pull(&source)?;
        }
    } else {
        std::fs::create_dir_all(&layout.root)?;
        git::clone(&Url::parse(ASEPRITE_REPO)?, None, &source)?;
    }
    git::update_submodules(&source)?;

    let skia = layout.skia_dir();
    if !skia.is_dir() || update {
        fetch_skia(&skia_url(skia_tag, host)?, &skia)?;
    }

    let linker = select_linker(linker_override, probe);
    if let Some(linker) = &linker {
        tracing::info!("Using linker: {}", linker);
    }

    setup_command(layout, linker.as_deref())
        .status_and_check("setup")
        .context("failed to configure Aseprite")?;
    build_command(layout, linker.as_deref())
        .status_and_check("build")
        .context("failed to build Aseprite")?;

    tracing::info!("Aseprite built at {}", layout.executable().display());
    Ok(())
}

/// Run the aseprite command.
pub fn aseprite(ctx: &GlobalContext, opts: &AsepriteOptions) -> Result<()> {
    let layout = AsepriteLayout::new(ctx);
    let host = opts.host.clone().unwrap_or_else(HostPlatform::host);

    if opts.cleanup {
        tracing::info!("Removing Aseprite sources and Skia binaries");
        remove_dir_all_if_exists(&layout.source_dir())?;
        remove_dir_all_if_exists(&layout.skia_dir())?;
    }

    if opts.system_deps {
        install_system_deps(&host)?;
    }

    let skia_tag = opts
        .skia_tag
        .as_deref()
        .unwrap_or_else(|| ctx.config().skia_tag());

    match opts.action {
        AsepriteAction::Run => {
            let exe = layout.executable();
            if !exe.is_file() {
                bail!(
                    "Aseprite is not built yet ({} is missing); run `openchamp aseprite compile`",
                    exe.display()
                );
            }
            ProcessBuilder::new(&exe)
                .cwd(ctx.project_dir())
                .status_and_check("aseprite")?;
            Ok(())
        }
        action => compile(
            &layout,
            &host,
            skia_tag,
            action == AsepriteAction::Update,
            opts.linker.as_deref(),
            &PathLinkerProbe,
        ),
    }
}
