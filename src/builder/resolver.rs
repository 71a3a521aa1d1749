//! Toolchain resolution.
//!
//! Decides, for a [`BuildRequest`], whether the extension builds natively or
//! through a containerized cross toolchain, and assembles the resulting
//! [`ToolchainPlan`]. Resolution performs no I/O of its own: the linker probe
//! and the toolchain materializer are the only collaborators, and the
//! materializer is only reached for supported cross targets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::builder::arch::ArchitectureMap;
use crate::builder::cross::{MaterializeError, ToolchainMaterializer};
use crate::builder::linker::{select_linker, LinkerProbe};
use crate::builder::plan::{BuildRequest, ToolchainPlan, BASE_BUILD_TOOL, LINKER_ENV_VAR};
use crate::util::context::STAGING_ROOT;
use crate::util::fs::absolutize;

/// Error during toolchain resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(
        "unsupported target architecture `{arch}` (host is `{host}`, cross targets: {})",
        .supported.join(", ")
    )]
    UnsupportedArchitecture {
        arch: String,
        host: String,
        supported: Vec<String>,
    },

    #[error("failed to materialize the cross toolchain for `{arch}`")]
    Materialization {
        arch: String,
        #[source]
        source: MaterializeError,
    },
}

/// Resolves build requests into toolchain plans.
pub struct Resolver<'a> {
    project_dir: PathBuf,
    arch_map: ArchitectureMap,
    linker_probe: &'a dyn LinkerProbe,
    materializer: &'a dyn ToolchainMaterializer,
}

impl<'a> Resolver<'a> {
    /// Create a resolver for the project rooted at `project_dir`.
    pub fn new(
        project_dir: impl Into<PathBuf>,
        linker_probe: &'a dyn LinkerProbe,
        materializer: &'a dyn ToolchainMaterializer,
    ) -> Self {
        Resolver {
            project_dir: project_dir.into(),
            arch_map: ArchitectureMap::standard(),
            linker_probe,
            materializer,
        }
    }

    /// Use a different architecture table.
    pub fn with_arch_map(mut self, arch_map: ArchitectureMap) -> Self {
        self.arch_map = arch_map;
        self
    }

    /// Resolve a request into a plan.
    pub fn resolve(&self, request: &BuildRequest) -> Result<ToolchainPlan, ResolveError> {
        let target_arch = request.resolved_target_arch().to_string();
        let mut environment_overlay = BTreeMap::new();

        let (invocation_prefix, linker) = if request.is_native() {
            tracing::info!(
                "Building natively for the host architecture ({})",
                request.host_arch
            );
            let linker = select_linker(request.linker_override(), self.linker_probe);
            (vec![BASE_BUILD_TOOL.to_string()], linker)
        } else {
            let Some(image_suffix) = self.arch_map.image_suffix(&target_arch) else {
                return Err(ResolveError::UnsupportedArchitecture {
                    arch: target_arch,
                    host: request.host_arch.clone(),
                    supported: self.arch_map.architectures().map(str::to_string).collect(),
                });
            };

            tracing::info!("Building in a container for the target architecture: {}", target_arch);

            let script = self
                .materializer
                .materialize(&target_arch, image_suffix)
                .map_err(|source| ResolveError::Materialization {
                    arch: target_arch.clone(),
                    source,
                })?;

            let script = match script.into_os_string().into_string() {
                Ok(script) => script,
                Err(path) => {
                    return Err(ResolveError::Materialization {
                        arch: target_arch,
                        source: MaterializeError::NonUtf8Path { path: path.into() },
                    })
                }
            };
            let prefix = vec![script, BASE_BUILD_TOOL.to_string()];
            (prefix, request.linker_override().map(str::to_string))
        };

        let build_directory = self.build_directory(request, &target_arch);

        if let Some(linker) = linker {
            tracing::info!("Using linker: {}", linker);
            environment_overlay.insert(LINKER_ENV_VAR.to_string(), linker);
        }

        Ok(ToolchainPlan {
            target_arch,
            invocation_prefix,
            build_directory,
            environment_overlay,
        })
    }

    fn build_directory(&self, request: &BuildRequest, target_arch: &str) -> PathBuf {
        let dir = match &request.build_dir {
            Some(dir) => dir.clone(),
            None => default_build_dir(target_arch, request),
        };

        // Cross builds stay relative to the directory the container mounts
        if request.is_native() {
            absolutize(&self.project_dir, &dir)
        } else {
            dir
        }
    }

    /// Root directory the plan's relative paths are anchored to.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }
}

/// `<staging_root>/build_<arch>_<mode>`
pub fn default_build_dir(target_arch: &str, request: &BuildRequest) -> PathBuf {
    Path::new(STAGING_ROOT).join(format!("build_{}_{}", target_arch, request.build_mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::arch::{BuildMode, HostPlatform};
    use crate::test_support::{FixedLinkerProbe, RecordingMaterializer};

    fn x86_64_linux() -> HostPlatform {
        HostPlatform::new("x86_64", "linux")
    }

    #[test]
    fn test_native_debug_without_preferred_linker() {
        let probe = FixedLinkerProbe::absent();
        let materializer = RecordingMaterializer::new("/work");
        let resolver = Resolver::new("/work", &probe, &materializer);

        let request = BuildRequest::new("x86_64", &x86_64_linux())
            .with_mode(BuildMode::Debug)
            .with_linker(Some(String::new()));
        let plan = resolver.resolve(&request).unwrap();

        assert_eq!(plan.invocation_prefix, vec!["cmake"]);
        assert!(plan.environment_overlay.is_empty());
        assert!(plan.build_directory.ends_with("build_x86_64_debug"));
        assert!(plan.build_directory.is_absolute());
        assert_eq!(probe.calls(), 1);
        assert!(materializer.requests().is_empty());
    }

    #[test]
    fn test_native_sentinel_never_materializes() {
        let probe = FixedLinkerProbe::absent();
        let materializer = RecordingMaterializer::new("/work");
        let resolver = Resolver::new("/work", &probe, &materializer);

        for host_arch in ["x86_64", "aarch64", "riscv64", "mips"] {
            let host = HostPlatform::new(host_arch, "linux");
            let plan = resolver.resolve(&BuildRequest::new("native", &host)).unwrap();

            assert_eq!(plan.target_arch, host_arch);
            assert_eq!(plan.invocation_prefix, vec!["cmake"]);
            assert!(!plan.is_cross());
        }
        assert!(materializer.requests().is_empty());
    }

    #[test]
    fn test_native_probe_sets_linker() {
        let probe = FixedLinkerProbe::present("MOLD");
        let materializer = RecordingMaterializer::new("/work");
        let resolver = Resolver::new("/work", &probe, &materializer);

        let plan = resolver
            .resolve(&BuildRequest::new("native", &x86_64_linux()))
            .unwrap();

        assert_eq!(
            plan.environment_overlay.get(LINKER_ENV_VAR).map(String::as_str),
            Some("MOLD")
        );
    }

    #[test]
    fn test_native_override_skips_probe() {
        let probe = FixedLinkerProbe::present("MOLD");
        let materializer = RecordingMaterializer::new("/work");
        let resolver = Resolver::new("/work", &probe, &materializer);

        let request =
            BuildRequest::new("x86_64", &x86_64_linux()).with_linker(Some("LLD".to_string()));
        let plan = resolver.resolve(&request).unwrap();

        assert_eq!(probe.calls(), 0);
        assert_eq!(
            plan.environment_overlay.get(LINKER_ENV_VAR).map(String::as_str),
            Some("LLD")
        );
    }

    #[test]
    fn test_cross_aarch64_uses_arm64_image() {
        let probe = FixedLinkerProbe::present("MOLD");
        let materializer = RecordingMaterializer::new("/work");
        let resolver = Resolver::new("/work", &probe, &materializer);

        let request = BuildRequest::new("aarch64", &x86_64_linux()).with_mode(BuildMode::Release);
        let plan = resolver.resolve(&request).unwrap();

        assert_eq!(
            materializer.requests(),
            vec![("aarch64".to_string(), "arm64".to_string())]
        );
        assert_eq!(plan.invocation_prefix.len(), 2);
        assert_eq!(
            plan.invocation_prefix[0],
            "/work/extensions/cross_compile_stuff/aarch64.sh"
        );
        assert_eq!(plan.invocation_prefix[1], "cmake");
        assert_eq!(plan.build_directory, PathBuf::from("extensions/build_aarch64_release"));
        // The probe only applies to native builds
        assert_eq!(probe.calls(), 0);
        assert!(plan.environment_overlay.is_empty());
    }

    #[test]
    fn test_host_alias_builds_natively() {
        let probe = FixedLinkerProbe::absent();
        let materializer = RecordingMaterializer::new("/work");
        let resolver = Resolver::new("/work", &probe, &materializer);

        // Apple Silicon reports `arm64` for the machine architecture
        let host = HostPlatform::new("aarch64", "macos");
        let plan = resolver.resolve(&BuildRequest::new("arm64", &host)).unwrap();

        assert_eq!(plan.invocation_prefix, vec!["cmake"]);
        assert_eq!(plan.target_arch, "aarch64");
        assert!(plan.build_directory.ends_with("build_aarch64_debug"));

        for alias in ["amd64", "AMD64", "x64"] {
            let plan = resolver.resolve(&BuildRequest::new(alias, &x86_64_linux())).unwrap();
            assert_eq!(plan.invocation_prefix, vec!["cmake"], "{alias}");
        }
        assert!(materializer.requests().is_empty());
    }

    #[test]
    fn test_cross_alias_uses_canonical_name() {
        let probe = FixedLinkerProbe::absent();
        let materializer = RecordingMaterializer::new("/work");
        let resolver = Resolver::new("/work", &probe, &materializer);

        let plan = resolver
            .resolve(&BuildRequest::new("arm64", &x86_64_linux()))
            .unwrap();

        assert_eq!(
            materializer.requests(),
            vec![("aarch64".to_string(), "arm64".to_string())]
        );
        assert_eq!(
            plan.invocation_prefix[0],
            "/work/extensions/cross_compile_stuff/aarch64.sh"
        );
        assert_eq!(plan.build_directory, PathBuf::from("extensions/build_aarch64_debug"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_script_path_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let project = Path::new(OsStr::from_bytes(b"/work/\xffproj"));
        let probe = FixedLinkerProbe::absent();
        let materializer = RecordingMaterializer::new(project);
        let resolver = Resolver::new(project, &probe, &materializer);

        let err = resolver
            .resolve(&BuildRequest::new("aarch64", &x86_64_linux()))
            .unwrap_err();

        match err {
            ResolveError::Materialization { arch, source } => {
                assert_eq!(arch, "aarch64");
                assert!(matches!(source, MaterializeError::NonUtf8Path { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cross_keeps_caller_linker() {
        let probe = FixedLinkerProbe::absent();
        let materializer = RecordingMaterializer::new("/work");
        let resolver = Resolver::new("/work", &probe, &materializer);

        let request = BuildRequest::new("riscv64", &x86_64_linux())
            .with_linker(Some("BFD".to_string()))
            .with_build_dir(Some(PathBuf::from("out/rv")));
        let plan = resolver.resolve(&request).unwrap();

        assert_eq!(plan.build_directory, PathBuf::from("out/rv"));
        assert_eq!(
            plan.environment_overlay.get(LINKER_ENV_VAR).map(String::as_str),
            Some("BFD")
        );
    }

    #[test]
    fn test_unsupported_architecture_fails_before_materialization() {
        let probe = FixedLinkerProbe::present("MOLD");
        let materializer = RecordingMaterializer::new("/work");
        let resolver = Resolver::new("/work", &probe, &materializer);

        let err = resolver
            .resolve(&BuildRequest::new("mips", &x86_64_linux()))
            .unwrap_err();

        match &err {
            ResolveError::UnsupportedArchitecture { arch, host, supported } => {
                assert_eq!(arch, "mips");
                assert_eq!(host, "x86_64");
                assert!(supported.contains(&"aarch64".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("mips"));
        assert!(materializer.requests().is_empty());
        assert_eq!(probe.calls(), 0);
    }

    #[test]
    fn test_unmapped_host_arch_builds_natively() {
        let probe = FixedLinkerProbe::absent();
        let materializer = RecordingMaterializer::new("/work");
        let resolver = Resolver::new("/work", &probe, &materializer);

        let host = HostPlatform::new("loongarch64", "linux");
        let plan = resolver
            .resolve(&BuildRequest::new("loongarch64", &host))
            .unwrap();

        assert_eq!(plan.invocation_prefix, vec!["cmake"]);
    }

    #[test]
    fn test_explicit_native_build_dir_made_absolute() {
        let probe = FixedLinkerProbe::absent();
        let materializer = RecordingMaterializer::new("/work");
        let resolver = Resolver::new("/work", &probe, &materializer);

        let request = BuildRequest::new("x86_64", &x86_64_linux())
            .with_build_dir(Some(PathBuf::from("custom/build")));
        let plan = resolver.resolve(&request).unwrap();

        assert_eq!(plan.build_directory, PathBuf::from("/work/custom/build"));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let probe = FixedLinkerProbe::present("MOLD");
        let materializer = RecordingMaterializer::new("/work");
        let resolver = Resolver::new("/work", &probe, &materializer);

        for target in ["native", "x86_64", "aarch64", "x86"] {
            let request = BuildRequest::new(target, &x86_64_linux()).with_jobs(Some(4));
            let first = resolver.resolve(&request).unwrap();
            let second = resolver.resolve(&request).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_materialization_failure_is_reported() {
        let probe = FixedLinkerProbe::absent();
        let materializer = RecordingMaterializer::failing("/work");
        let resolver = Resolver::new("/work", &probe, &materializer);

        let err = resolver
            .resolve(&BuildRequest::new("aarch64", &x86_64_linux()))
            .unwrap_err();

        assert!(matches!(err, ResolveError::Materialization { ref arch, .. } if arch == "aarch64"));
    }
}
