//! Implementation of `openchamp variant`.
//!
//! Checks out a branch of a project repository into its own directory and
//! runs the checkout's install script.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use url::Url;

use crate::util::git;
use crate::util::process::ProcessBuilder;
use crate::util::GlobalContext;

pub const DEFAULT_ORG: &str = "openchamp";
pub const DEFAULT_REPO: &str = "client";
pub const DEFAULT_BRANCH: &str = "4.3_update";

/// Install script run after a fresh checkout.
pub const INSTALL_SCRIPT: &str = "install.py";

const GITHUB_API: &str = "https://api.github.com/";
const USER_AGENT: &str = concat!("openchamp-tools/", env!("CARGO_PKG_VERSION"));

/// Options for the variant command.
#[derive(Debug, Clone)]
pub struct VariantOptions {
    pub org: String,
    pub repo: String,
    pub branch: String,
    /// Only list the available branches
    pub list: bool,
    /// Directory the checkout is created in
    pub dest_root: Option<PathBuf>,
}

impl Default for VariantOptions {
    fn default() -> Self {
        VariantOptions {
            org: DEFAULT_ORG.to_string(),
            repo: DEFAULT_REPO.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            list: false,
            dest_root: None,
        }
    }
}

/// Result of the variant command.
#[derive(Debug, Clone)]
pub enum VariantOutcome {
    Branches(Vec<String>),
    CheckedOut { branch: String, path: PathBuf },
}

#[derive(Debug, Deserialize)]
struct Branch {
    name: String,
}

/// Branch listing endpoint for a repository.
pub fn branches_url(org: &str, repo: &str) -> Result<Url> {
    Url::parse(GITHUB_API)?
        .join(&format!("repos/{}/{}/branches", org, repo))
        .with_context(|| format!("invalid repository name: {}/{}", org, repo))
}

/// Parse the GitHub branch listing response.
pub fn parse_branches(body: &str) -> Result<Vec<String>> {
    let branches: Vec<Branch> =
        serde_json::from_str(body).context("unexpected response from the GitHub API")?;
    Ok(branches.into_iter().map(|b| b.name).collect())
}

/// Fetch all branch names of a GitHub repository.
pub fn fetch_branches(org: &str, repo: &str) -> Result<Vec<String>> {
    let url = branches_url(org, repo)?;
    tracing::debug!("GET {}", url);

    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()?;

    let response = client
        .get(url.clone())
        .query(&[("per_page", "100")])
        .send()
        .with_context(|| format!("failed to query {}", url))?;

    if !response.status().is_success() {
        bail!("GitHub API returned {} for {}", response.status(), url);
    }

    parse_branches(&response.text()?)
}

/// Directory name for a checkout.
pub fn checkout_dir_name(org: &str, repo: &str, branch: &str) -> String {
    format!("openchamp_{}_{}_{}", org, repo, branch.replace('/', "_"))
}

/// Ensure the requested branch is in the listing.
pub fn select_branch<'a>(branches: &'a [String], requested: &str) -> Result<&'a str> {
    if branches.is_empty() {
        bail!("no branches found; are the organization and repository correct?");
    }

    match branches.iter().find(|b| *b == requested) {
        Some(branch) => Ok(branch),
        None => bail!(
            "branch `{}` not found\navailable branches: {}",
            requested,
            branches.join(", ")
        ),
    }
}

/// List branches or check out a variant.
pub fn variant(ctx: &GlobalContext, opts: &VariantOptions) -> Result<VariantOutcome> {
    let branches = fetch_branches(&opts.org, &opts.repo)?;

    if opts.list {
        return Ok(VariantOutcome::Branches(branches));
    }

    let branch = select_branch(&branches, &opts.branch)?.to_string();

    let dest_root = match &opts.dest_root {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to get current directory")?,
    };
    let dest = dest_root.join(checkout_dir_name(&opts.org, &opts.repo, &branch));
    if dest.exists() {
        bail!("destination `{}` already exists", dest.display());
    }

    let remote = git::github_repo_url(&opts.org, &opts.repo)?;
    git::clone(&remote, Some(&branch), &dest)?;
    tracing::info!("Cloned branch {} to {}", branch, dest.display());

    if dest.join(INSTALL_SCRIPT).is_file() {
        ProcessBuilder::new(ctx.config().python())
            .arg(INSTALL_SCRIPT)
            .cwd(&dest)
            .status_and_check("install")
            .with_context(|| format!("install script failed in {}", dest.display()))?;
    } else {
        tracing::warn!("No {} in {}, skipping install", INSTALL_SCRIPT, dest.display());
    }

    Ok(VariantOutcome::CheckedOut { branch, path: dest })
}
