//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// openchamp - build, export and maintenance tooling for OpenChamp
#[derive(Parser)]
#[command(name = "openchamp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project directory (defaults to the nearest directory with project.godot)
    #[arg(short = 'C', long = "project_dir", global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile the native extension, natively or in a cross container
    Compile(CompileArgs),

    /// Export the game with the Godot editor
    Export(ExportArgs),

    /// Check or apply GDScript formatting
    Format(FormatArgs),

    /// Check out a branch of an OpenChamp repository
    Variant(VariantArgs),

    /// Build and run the Aseprite sprite editor
    Aseprite(AsepriteArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct CompileArgs {
    /// The compilation mode
    #[arg(long, default_value = "debug", value_parser = ["release", "debug"])]
    pub mode: String,

    /// The target architecture, or `native` for the host
    #[arg(long = "target_arch", default_value = "native")]
    pub target_arch: String,

    /// The build directory (default: extensions/build_<target_arch>_<mode>)
    #[arg(long = "build_dir")]
    pub build_dir: Option<PathBuf>,

    /// The generator flag passed to cmake (default: -GNinja)
    #[arg(long = "build_system", allow_hyphen_values = true)]
    pub build_system: Option<String>,

    /// The linker to use (default: mold if installed)
    #[arg(long = "set_linker")]
    pub set_linker: Option<String>,

    /// Skip the cmake setup phase
    #[arg(long = "skip_setup")]
    pub skip_setup: bool,

    /// Number of parallel build jobs (0 lets cmake decide)
    #[arg(short = 'j', long = "jobs", visible_alias = "threads")]
    pub jobs: Option<u32>,

    /// Print the resolved plan as JSON without running anything
    #[arg(long)]
    pub plan: bool,

    /// Reuse an existing cross toolchain script instead of refreshing it
    #[arg(long = "reuse_toolchain")]
    pub reuse_toolchain: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Path to the Godot editor console executable
    #[arg(long = "godot_path")]
    pub godot_path: Option<PathBuf>,

    /// The export type
    #[arg(long = "export_type", default_value = "client", value_parser = ["client", "server"])]
    pub export_type: String,

    /// The export platform
    #[arg(
        long = "export_platform",
        default_value = "native",
        value_parser = ["native", "windows_amd64", "windows_arm64", "linux_amd64", "linux_arm64", "macos"]
    )]
    pub export_platform: String,

    /// The release type for the export
    #[arg(long = "release_type", default_value = "release", value_parser = ["release", "debug"])]
    pub release_type: String,
}

#[derive(Args)]
pub struct FormatArgs {
    /// CHECK reports unformatted files, FORMAT rewrites them
    #[arg(value_parser = ["CHECK", "FORMAT"], ignore_case = true)]
    pub mode: String,
}

#[derive(Args)]
pub struct VariantArgs {
    /// The GitHub organization
    #[arg(long, default_value = "openchamp")]
    pub org: String,

    /// The GitHub repository
    #[arg(long, default_value = "client")]
    pub repo: String,

    /// The branch to check out
    #[arg(long, default_value = "4.3_update")]
    pub branch: String,

    /// Only list the available branches
    #[arg(long)]
    pub list: bool,
}

#[derive(Args)]
pub struct AsepriteArgs {
    /// What to do
    #[arg(default_value = "compile", value_parser = ["compile", "update", "run"])]
    pub action: String,

    /// The Skia release tag to build against
    #[arg(long = "skia_tag")]
    pub skia_tag: Option<String>,

    /// The linker to use (default: mold if installed)
    #[arg(long = "set_linker")]
    pub set_linker: Option<String>,

    /// Delete the aseprite and skia directories first
    #[arg(long)]
    pub cleanup: bool,

    /// Install the system build dependencies (Linux only)
    #[arg(long = "system_deps")]
    pub system_deps: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
