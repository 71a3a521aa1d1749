//! Sequential execution of build phases.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::builder::plan::Invocation;
use crate::util::process::ToolError;

/// Runs setup/build/install invocations in order.
///
/// Each phase mutates the build directory the next one reads, so phases never
/// overlap and the first failure stops the run.
pub struct PhaseExecutor {
    cwd: PathBuf,
}

impl PhaseExecutor {
    /// Create an executor running every phase from `cwd`.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        PhaseExecutor {
            cwd: cwd.as_ref().to_path_buf(),
        }
    }

    /// Execute the invocations, returning the elapsed time.
    pub fn execute(&self, invocations: &[Invocation]) -> Result<Duration, ToolError> {
        let start = Instant::now();

        for invocation in invocations {
            let Some(process) = invocation.to_process(&self.cwd) else {
                return Err(ToolError::EmptyCommand {
                    phase: invocation.phase.to_string(),
                });
            };

            tracing::info!("Running {}: {}", invocation.phase, process.display_command());
            process.status_and_check(invocation.phase.as_str())?;
        }

        let elapsed = start.elapsed();
        tracing::info!("Finished {} phase(s) in {:.2}s", invocations.len(), elapsed.as_secs_f64());

        Ok(elapsed)
    }
}
