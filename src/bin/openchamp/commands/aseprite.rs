//! `openchamp aseprite` command

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::cli::AsepriteArgs;
use openchamp_tools::ops::aseprite::{aseprite, AsepriteAction, AsepriteOptions};
use openchamp_tools::util::GlobalContext;

pub fn execute(project_dir: Option<PathBuf>, args: AsepriteArgs) -> Result<()> {
    let ctx = GlobalContext::new(project_dir)?;

    let opts = AsepriteOptions {
        action: args.action.parse::<AsepriteAction>().map_err(|e| anyhow!("{}", e))?,
        skia_tag: args.skia_tag,
        linker: args.set_linker,
        cleanup: args.cleanup,
        system_deps: args.system_deps,
        host: None,
    };

    aseprite(&ctx, &opts)
}
