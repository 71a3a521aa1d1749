//! `openchamp export` command

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::cli::ExportArgs;
use openchamp_tools::builder::BuildMode;
use openchamp_tools::ops::export::{export, ExportOptions, ExportPlatform, EXPORT_DIR};
use openchamp_tools::util::GlobalContext;

pub fn execute(project_dir: Option<PathBuf>, args: ExportArgs) -> Result<()> {
    let ctx = GlobalContext::new(project_dir)?;

    let platform = match args.export_platform.as_str() {
        "native" => None,
        other => Some(other.parse::<ExportPlatform>().map_err(|e| anyhow!("{}", e))?),
    };

    let opts = ExportOptions {
        godot: args.godot_path,
        export_type: args.export_type.parse().map_err(|e| anyhow!("{}", e))?,
        platform,
        release_type: args.release_type.parse::<BuildMode>().map_err(|e| anyhow!("{}", e))?,
        host: None,
    };

    let target = export(&ctx, &opts)?;
    eprintln!("    Exported {}/{}", EXPORT_DIR, target.archive);

    Ok(())
}
