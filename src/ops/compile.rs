//! Implementation of `openchamp compile`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::builder::arch::{BuildMode, HostPlatform};
use crate::builder::cross::{DockerMaterializer, DryRunMaterializer, ToolchainMaterializer};
use crate::builder::executor::PhaseExecutor;
use crate::builder::linker::PathLinkerProbe;
use crate::builder::plan::{BuildRequest, Invocation, ToolchainPlan, DEFAULT_GENERATOR};
use crate::builder::resolver::Resolver;
use crate::util::fs::{absolutize, ensure_dir};
use crate::util::GlobalContext;

/// Options for the compile command.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Target architecture or `native`
    pub target_arch: String,

    /// Debug or release
    pub mode: BuildMode,

    /// Explicit build directory
    pub build_dir: Option<PathBuf>,

    /// cmake generator flag (CLI > config > `-GNinja`)
    pub generator: Option<String>,

    /// Linker id (CLI > config > probe)
    pub linker: Option<String>,

    /// Parallel jobs (CLI > config > auto)
    pub jobs: Option<u32>,

    /// Skip the cmake setup phase
    pub skip_setup: bool,

    /// Only resolve and report the plan
    pub emit_plan: bool,

    /// Reuse an existing cross driver script
    pub reuse_toolchain: bool,

    /// Host override, detected when `None`
    pub host: Option<HostPlatform>,
}

/// Everything the compile command resolved.
#[derive(Debug, Clone, Serialize)]
pub struct CompileReport {
    pub request: BuildRequest,
    pub plan: ToolchainPlan,
    pub phases: Vec<Invocation>,
}

/// Build the request from CLI options and configuration.
pub fn build_request(ctx: &GlobalContext, opts: &CompileOptions) -> BuildRequest {
    let config = &ctx.config().compile;
    let host = opts.host.clone().unwrap_or_else(HostPlatform::host);

    let generator = opts
        .generator
        .clone()
        .or_else(|| config.generator.clone())
        .unwrap_or_else(|| DEFAULT_GENERATOR.to_string());

    BuildRequest::new(opts.target_arch.clone(), &host)
        .with_mode(opts.mode)
        .with_build_dir(opts.build_dir.clone())
        .with_generator(generator)
        .with_linker(opts.linker.clone().or_else(|| config.linker.clone()))
        .with_jobs(opts.jobs.or(config.jobs))
}

/// Resolve the toolchain and run the setup/build/install phases.
pub fn compile(ctx: &GlobalContext, opts: &CompileOptions) -> Result<CompileReport> {
    let request = build_request(ctx, opts);
    tracing::debug!("build request: {:?}", request);

    let docker = DockerMaterializer::new(ctx.project_dir())
        .image_prefix(ctx.config().image_prefix())
        .refresh(ctx.config().refresh_cross_scripts() && !opts.reuse_toolchain);
    let dry_run = DryRunMaterializer::new(ctx.project_dir());
    let materializer: &dyn ToolchainMaterializer = if opts.emit_plan {
        &dry_run
    } else {
        &docker
    };

    let probe = PathLinkerProbe;
    let resolver = Resolver::new(ctx.project_dir(), &probe, materializer);
    let plan = resolver.resolve(&request)?;
    let phases = plan.invocations(&request, opts.skip_setup);

    let report = CompileReport {
        request,
        plan,
        phases,
    };

    if opts.emit_plan {
        return Ok(report);
    }

    let build_dir = absolutize(ctx.project_dir(), &report.plan.build_directory);
    if ensure_dir(&build_dir)? {
        tracing::info!("Build directory already exists.");
    }

    PhaseExecutor::new(ctx.project_dir())
        .execute(&report.phases)
        .with_context(|| format!("failed to compile the extension for {}", report.plan.target_arch))?;

    Ok(report)
}
