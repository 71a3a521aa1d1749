//! `openchamp compile` command

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::cli::CompileArgs;
use openchamp_tools::builder::BuildMode;
use openchamp_tools::ops::compile::{compile, CompileOptions};
use openchamp_tools::util::GlobalContext;

pub fn execute(project_dir: Option<PathBuf>, args: CompileArgs) -> Result<()> {
    let ctx = GlobalContext::new(project_dir)?;

    let mode: BuildMode = args.mode.parse().map_err(|e| anyhow!("{}", e))?;

    let opts = CompileOptions {
        target_arch: args.target_arch,
        mode,
        build_dir: args.build_dir,
        generator: args.build_system,
        linker: args.set_linker,
        jobs: args.jobs,
        skip_setup: args.skip_setup,
        emit_plan: args.plan,
        reuse_toolchain: args.reuse_toolchain,
        host: None,
    };

    let report = compile(&ctx, &opts)?;

    if args.plan {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!(
            "    Finished {} build for {} in {}",
            report.request.build_mode,
            report.plan.target_arch,
            report.plan.build_directory.display()
        );
    }

    Ok(())
}
