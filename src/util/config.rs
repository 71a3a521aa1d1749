//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `~/.openchamp/config.toml` - User-wide defaults
//! - Project: `<project>/.openchamp/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the per-user and per-project configuration directory.
pub const CONFIG_DIR_NAME: &str = ".openchamp";

/// Default image prefix for cross-compilation containers.
pub const DEFAULT_IMAGE_PREFIX: &str = "dockcross/linux-";

/// Default Skia release tag used for Aseprite builds.
pub const DEFAULT_SKIA_TAG: &str = "m102-861e4743af";

/// Tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extension compile settings
    pub compile: CompileConfig,

    /// Cross toolchain settings
    pub cross: CrossConfig,

    /// GDScript formatting settings
    pub format: FormatConfig,

    /// Repository variant settings
    pub variant: VariantConfig,

    /// Aseprite bootstrap settings
    pub aseprite: AsepriteConfig,
}

/// Extension compile configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// CMake generator flag (e.g. `-GNinja`)
    pub generator: Option<String>,

    /// Linker id passed through `CMAKE_LINKER_TYPE` (e.g. `MOLD`, `LLD`)
    pub linker: Option<String>,

    /// Default number of parallel jobs (0 = auto-detect)
    pub jobs: Option<u32>,
}

/// Cross toolchain configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossConfig {
    /// Container image prefix, the architecture suffix is appended
    pub image_prefix: Option<String>,

    /// Re-materialize the driver script on every cross build
    pub refresh: Option<bool>,
}

/// GDScript formatting configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Additional file names to skip
    pub ignore: Vec<String>,
}

/// Repository variant configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantConfig {
    /// Python interpreter used to run a checkout's install script
    pub python: Option<String>,
}

/// Aseprite bootstrap configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsepriteConfig {
    /// Skia release tag
    pub skia_tag: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.compile.generator.is_some() {
            self.compile.generator = other.compile.generator;
        }
        if other.compile.linker.is_some() {
            self.compile.linker = other.compile.linker;
        }
        if other.compile.jobs.is_some() {
            self.compile.jobs = other.compile.jobs;
        }

        if other.cross.image_prefix.is_some() {
            self.cross.image_prefix = other.cross.image_prefix;
        }
        if other.cross.refresh.is_some() {
            self.cross.refresh = other.cross.refresh;
        }

        // Ignore lists accumulate
        for name in other.format.ignore {
            if !self.format.ignore.contains(&name) {
                self.format.ignore.push(name);
            }
        }

        if other.variant.python.is_some() {
            self.variant.python = other.variant.python;
        }

        if other.aseprite.skia_tag.is_some() {
            self.aseprite.skia_tag = other.aseprite.skia_tag;
        }
    }

    /// Container image prefix for cross toolchains.
    pub fn image_prefix(&self) -> &str {
        self.cross
            .image_prefix
            .as_deref()
            .unwrap_or(DEFAULT_IMAGE_PREFIX)
    }

    /// Whether cross driver scripts are refreshed on every build.
    pub fn refresh_cross_scripts(&self) -> bool {
        self.cross.refresh.unwrap_or(true)
    }

    /// Python interpreter for install scripts.
    pub fn python(&self) -> &str {
        self.variant.python.as_deref().unwrap_or(default_python())
    }

    /// Skia release tag for Aseprite builds.
    pub fn skia_tag(&self) -> &str {
        self.aseprite.skia_tag.as_deref().unwrap_or(DEFAULT_SKIA_TAG)
    }
}

fn default_python() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.openchamp/config.toml)
/// 2. Global config (~/.openchamp/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global config directory (~/.openchamp).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR_NAME))
}

/// Get the global config path (~/.openchamp/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (<project>/.openchamp/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR_NAME).join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.compile.generator.is_none());
        assert_eq!(config.image_prefix(), "dockcross/linux-");
        assert!(config.refresh_cross_scripts());
        assert_eq!(config.skia_tag(), "m102-861e4743af");
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[compile]
generator = "-GUnix Makefiles"
linker = "LLD"
jobs = 8

[cross]
refresh = false

[format]
ignore = ["generated.gd"]
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.compile.generator.as_deref(), Some("-GUnix Makefiles"));
        assert_eq!(config.compile.linker.as_deref(), Some("LLD"));
        assert_eq!(config.compile.jobs, Some(8));
        assert!(!config.refresh_cross_scripts());
        assert_eq!(config.format.ignore, vec!["generated.gd"]);
    }

    #[test]
    fn test_config_load_invalid_falls_back() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[compile\njobs = ").unwrap();

        assert!(Config::load(&config_path).is_err());
        assert_eq!(Config::load_or_default(&config_path), Config::default());
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.compile.linker = Some("MOLD".to_string());
        base.compile.jobs = Some(4);
        base.format.ignore = vec!["a.gd".to_string()];

        let mut override_cfg = Config::default();
        override_cfg.compile.linker = Some("LLD".to_string());
        override_cfg.format.ignore = vec!["a.gd".to_string(), "b.gd".to_string()];

        base.merge(override_cfg);

        assert_eq!(base.compile.linker.as_deref(), Some("LLD"));
        assert_eq!(base.compile.jobs, Some(4)); // Not overridden
        assert_eq!(base.format.ignore, vec!["a.gd", "b.gd"]);
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[compile]
linker = "MOLD"
jobs = 2

[aseprite]
skia_tag = "m100-global"
"#,
        )
        .unwrap();

        std::fs::write(
            &project_path,
            r#"
[compile]
jobs = 16
"#,
        )
        .unwrap();

        let config = load_config(Some(&global_path), &project_path);

        assert_eq!(config.compile.jobs, Some(16));
        assert_eq!(config.compile.linker.as_deref(), Some("MOLD"));
        assert_eq!(config.skia_tag(), "m100-global");
    }

    #[test]
    fn test_load_config_missing_files() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(None, &tmp.path().join("missing.toml"));

        assert_eq!(config, Config::default());
    }
}
