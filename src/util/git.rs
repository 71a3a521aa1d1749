//! Git access for project variants and third-party checkouts.

use std::path::Path;

use anyhow::{bail, Context, Result};
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::Repository;
use url::Url;

/// Web URL of a GitHub repository.
pub fn github_repo_url(org: &str, repo: &str) -> Result<Url> {
    let url = Url::parse("https://github.com/")?;
    url.join(&format!("{}/{}", org, repo))
        .with_context(|| format!("invalid repository name: {}/{}", org, repo))
}

/// Clone a repository, optionally checking out a specific branch.
pub fn clone(remote: &Url, branch: Option<&str>, dest: &Path) -> Result<Repository> {
    match branch {
        Some(branch) => tracing::info!("Cloning {} (branch {})", remote, branch),
        None => tracing::info!("Cloning {}", remote),
    }

    let mut builder = RepoBuilder::new();
    if let Some(branch) = branch {
        builder.branch(branch);
    }

    builder
        .clone(remote.as_str(), dest)
        .with_context(|| format!("failed to clone {}", remote))
}

/// Fast-forward the current branch of a checkout to its upstream.
pub fn pull(dir: &Path) -> Result<()> {
    let repo = Repository::open(dir)
        .with_context(|| format!("failed to open git repository: {}", dir.display()))?;

    let head = repo.head().context("failed to read HEAD")?;
    let Some(branch) = head.shorthand().filter(|_| head.is_branch()) else {
        bail!("cannot pull in {}: HEAD is detached", dir.display());
    };
    let branch = branch.to_string();

    tracing::info!("Pulling latest commits for {}", branch);

    let mut remote = repo.find_remote("origin")?;
    remote
        .fetch(&[branch.as_str()], None, None)
        .with_context(|| format!("failed to fetch {} from origin", branch))?;

    let fetch_head = repo.find_reference("FETCH_HEAD")?;
    let fetch_commit = repo.reference_to_annotated_commit(&fetch_head)?;
    let (analysis, _) = repo.merge_analysis(&[&fetch_commit])?;

    if analysis.is_up_to_date() {
        tracing::info!("Already up to date");
        return Ok(());
    }

    if !analysis.is_fast_forward() {
        bail!(
            "cannot fast-forward {} in {}; resolve the divergence manually",
            branch,
            dir.display()
        );
    }

    let refname = format!("refs/heads/{}", branch);
    let mut reference = repo.find_reference(&refname)?;
    reference.set_target(fetch_commit.id(), "fast-forward")?;
    repo.set_head(&refname)?;
    repo.checkout_head(Some(CheckoutBuilder::default().force()))?;

    Ok(())
}

/// Initialize and update all submodules, recursively.
pub fn update_submodules(dir: &Path) -> Result<()> {
    let repo = Repository::open(dir)
        .with_context(|| format!("failed to open git repository: {}", dir.display()))?;
    update_submodules_in(&repo)
}

fn update_submodules_in(repo: &Repository) -> Result<()> {
    for mut submodule in repo.submodules()? {
        let name = submodule.name().unwrap_or("<unnamed>").to_string();
        tracing::debug!("updating submodule {}", name);

        submodule
            .update(true, None)
            .with_context(|| format!("failed to update submodule {}", name))?;

        let sub_repo = submodule
            .open()
            .with_context(|| format!("failed to open submodule {}", name))?;
        update_submodules_in(&sub_repo)?;
    }
    Ok(())
}
