//! Preferred linker detection.

use crate::util::process::find_executable;

/// Executable name of the preferred fast linker.
pub const PREFERRED_LINKER: &str = "mold";

/// Value of `CMAKE_LINKER_TYPE` that selects the preferred linker.
pub const PREFERRED_LINKER_ID: &str = "MOLD";

/// Optional capability check for a faster linker on the host.
///
/// A probe never fails: an absent linker is `None` and the build tool keeps
/// its default.
pub trait LinkerProbe {
    /// Linker id to select, if the preferred linker is available.
    fn preferred_linker(&self) -> Option<String>;
}

/// Looks up the preferred linker on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathLinkerProbe;

impl LinkerProbe for PathLinkerProbe {
    fn preferred_linker(&self) -> Option<String> {
        let path = find_executable(PREFERRED_LINKER)?;
        tracing::debug!("found {} at {}", PREFERRED_LINKER, path.display());
        Some(PREFERRED_LINKER_ID.to_string())
    }
}

/// Pick the linker for a build: the caller's choice wins, then the probe.
pub fn select_linker(linker_override: Option<&str>, probe: &dyn LinkerProbe) -> Option<String> {
    match linker_override.filter(|l| !l.is_empty()) {
        Some(linker) => Some(linker.to_string()),
        None => probe.preferred_linker(),
    }
}
