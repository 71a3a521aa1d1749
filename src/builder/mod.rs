//! Native extension build support.
//!
//! This module resolves build requests into toolchain plans (native or
//! containerized cross builds) and runs the resulting cmake phases.

pub mod arch;
pub mod cross;
pub mod executor;
pub mod linker;
pub mod plan;
pub mod resolver;

pub use arch::{ArchitectureMap, BuildMode, HostPlatform};
pub use cross::{DockerMaterializer, MaterializeError, ToolchainMaterializer};
pub use executor::PhaseExecutor;
pub use linker::{LinkerProbe, PathLinkerProbe};
pub use plan::{BuildRequest, Invocation, Phase, ToolchainPlan};
pub use resolver::{ResolveError, Resolver};
