//! `openchamp format` command

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::cli::FormatArgs;
use openchamp_tools::ops::format::{format, FormatMode, FormatOptions};
use openchamp_tools::util::GlobalContext;

pub fn execute(project_dir: Option<PathBuf>, args: FormatArgs) -> Result<()> {
    let ctx = GlobalContext::new(project_dir)?;

    let mode = if args.mode.eq_ignore_ascii_case("format") {
        FormatMode::Format
    } else {
        FormatMode::Check
    };

    let report = format(
        &ctx,
        &FormatOptions {
            mode,
            formatter: None,
        },
    )?;

    if report.is_clean() {
        println!("All files are formatted!");
        return Ok(());
    }

    println!("The following files are not formatted:");
    for file in &report.unformatted {
        let shown = file.strip_prefix(ctx.project_dir()).unwrap_or(file);
        println!("  {}", shown.display());
    }
    bail!(
        "{} of {} files are not formatted",
        report.unformatted.len(),
        report.checked.len()
    )
}
