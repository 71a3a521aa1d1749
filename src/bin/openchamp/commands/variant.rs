//! `openchamp variant` command

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::VariantArgs;
use openchamp_tools::ops::variant::{variant, VariantOptions, VariantOutcome};
use openchamp_tools::util::GlobalContext;

pub fn execute(project_dir: Option<PathBuf>, args: VariantArgs) -> Result<()> {
    let ctx = GlobalContext::new(project_dir)?;

    let opts = VariantOptions {
        org: args.org,
        repo: args.repo,
        branch: args.branch,
        list: args.list,
        dest_root: None,
    };

    match variant(&ctx, &opts)? {
        VariantOutcome::Branches(branches) => {
            for branch in branches {
                println!("{}", branch);
            }
        }
        VariantOutcome::CheckedOut { branch, path } => {
            eprintln!("    Checked out {} into {}", branch, path.display());
        }
    }

    Ok(())
}
