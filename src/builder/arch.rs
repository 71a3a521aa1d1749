//! CPU architectures, host platform detection and build modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sentinel target architecture meaning "whatever the host is".
pub const NATIVE: &str = "native";

/// Canonical architecture name to cross-compilation image suffix.
const ARCH_IMAGE_SUFFIXES: &[(&str, &str)] = &[
    ("x86_64", "x64"),
    ("x86", "x86"),
    ("aarch64", "arm64"),
    ("riscv64", "riscv64"),
];

/// Read-only lookup from target architecture to container image suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchitectureMap {
    entries: &'static [(&'static str, &'static str)],
}

impl ArchitectureMap {
    /// The architectures supported for containerized cross builds.
    pub const fn standard() -> Self {
        ArchitectureMap {
            entries: ARCH_IMAGE_SUFFIXES,
        }
    }

    /// Image suffix for a canonical architecture name.
    pub fn image_suffix(&self, arch: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(name, _)| *name == arch)
            .map(|(_, suffix)| *suffix)
    }

    /// Whether the architecture has a cross toolchain image.
    pub fn contains(&self, arch: &str) -> bool {
        self.image_suffix(arch).is_some()
    }

    /// Supported architecture names, in table order.
    pub fn architectures(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }
}

impl Default for ArchitectureMap {
    fn default() -> Self {
        ArchitectureMap::standard()
    }
}

/// CPU family and operating system of the machine running the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPlatform {
    /// Canonical CPU architecture (x86_64, aarch64, ...)
    pub arch: String,
    /// Operating system (linux, macos, windows, ...)
    pub os: String,
}

impl HostPlatform {
    pub fn new(arch: impl Into<String>, os: impl Into<String>) -> Self {
        HostPlatform {
            arch: arch.into(),
            os: os.into(),
        }
    }

    /// Detect the host platform of the running binary.
    pub fn host() -> Self {
        HostPlatform::new(
            canonical_arch(std::env::consts::ARCH),
            std::env::consts::OS,
        )
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.os, self.arch)
    }
}

/// Normalize the architecture aliases used by various platforms.
pub fn canonical_arch(arch: &str) -> &str {
    match arch {
        "amd64" | "AMD64" | "x64" => "x86_64",
        "arm64" | "ARM64" => "aarch64",
        "i386" | "i686" | "x86" => "x86",
        other => other,
    }
}

/// Build configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Debug,
    Release,
}

impl BuildMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Debug => "debug",
            BuildMode::Release => "release",
        }
    }

    /// Value for `CMAKE_BUILD_TYPE`.
    pub fn cmake_build_type(&self) -> &'static str {
        match self {
            BuildMode::Debug => "Debug",
            BuildMode::Release => "Release",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(BuildMode::Debug),
            "release" => Ok(BuildMode::Release),
            _ => Err(format!(
                "unknown build mode `{}`, expected `release` or `debug`",
                s
            )),
        }
    }
}
