//! openchamp-tools - developer tooling for the OpenChamp game project
//!
//! This crate resolves and runs native or containerized cross builds of
//! the game's native extension, and wraps the surrounding project chores:
//! exporting, formatting, variant checkouts and the Aseprite build.

pub mod builder;
pub mod ops;
pub mod util;

/// Test doubles for the linker probe and toolchain materializer.
#[cfg(test)]
pub mod test_support;

pub use builder::{BuildMode, BuildRequest, HostPlatform, Resolver, ToolchainPlan};
pub use util::context::GlobalContext;
