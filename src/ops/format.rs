//! Implementation of `openchamp format`.
//!
//! Runs `gdformat` over every GDScript file in the project's source
//! directories, either rewriting them or only checking them.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use walkdir::WalkDir;

use crate::util::process::{find_executable, ProcessBuilder};
use crate::util::GlobalContext;

/// Project directories holding GDScript sources.
pub const SOURCE_DIRS: &[&str] = &["scenes", "scripts", "ui"];

/// Files `gdformat` must never touch.
///
/// `scalings_builder.gd` uses multiline lambdas, which crash `gdformat`.
pub const IGNORED_FILES: &[&str] = &["scalings_builder.gd"];

/// GDScript file extension.
const GDSCRIPT_EXTENSION: &str = "gd";

/// Check or rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormatMode {
    #[default]
    Check,
    Format,
}

/// Options for the format command.
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    pub mode: FormatMode,

    /// Formatter executable, `gdformat` on PATH when `None`
    pub formatter: Option<PathBuf>,
}

/// Outcome of a format run.
#[derive(Debug, Clone, Default)]
pub struct FormatReport {
    /// Files handed to the formatter
    pub checked: Vec<PathBuf>,
    /// Files the formatter rejected
    pub unformatted: Vec<PathBuf>,
}

impl FormatReport {
    pub fn is_clean(&self) -> bool {
        self.unformatted.is_empty()
    }
}

/// Collect all GDScript files below the source directories, sorted.
pub fn gdscript_files(project_dir: &Path, extra_ignored: &[String]) -> Vec<PathBuf> {
    let is_ignored = |name: &str| {
        IGNORED_FILES.contains(&name) || extra_ignored.iter().any(|ignored| ignored == name)
    };

    let mut files: Vec<PathBuf> = SOURCE_DIRS
        .iter()
        .map(|dir| project_dir.join(dir))
        .filter(|dir| dir.is_dir())
        .flat_map(|dir| WalkDir::new(dir).into_iter().filter_map(|e| e.ok()))
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let path = entry.path();
            let is_gdscript = path.extension().and_then(|e| e.to_str()) == Some(GDSCRIPT_EXTENSION);
            let name = entry.file_name().to_string_lossy();
            is_gdscript && !is_ignored(&*name)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Run the formatter over every GDScript file.
///
/// A non-zero formatter exit marks the file as unformatted; the run carries
/// on with the remaining files.
pub fn format(ctx: &GlobalContext, opts: &FormatOptions) -> Result<FormatReport> {
    let formatter = match &opts.formatter {
        Some(formatter) => formatter.clone(),
        None => match find_executable("gdformat") {
            Some(path) => path,
            None => bail!("gdformat not found in PATH; install it with `pip install gdtoolkit`"),
        },
    };

    let mut report = FormatReport::default();

    for file in gdscript_files(ctx.project_dir(), &ctx.config().format.ignore) {
        let mut cmd = ProcessBuilder::new(&formatter).cwd(ctx.project_dir());
        if opts.mode == FormatMode::Check {
            cmd = cmd.arg("--check");
        }
        cmd = cmd.arg(&file);

        tracing::debug!("{}", cmd.display_command());

        let status = cmd.status()?;
        if !status.success() {
            report.unformatted.push(file.clone());
        }
        report.checked.push(file);
    }

    Ok(report)
}
