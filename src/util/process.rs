//! Subprocess execution utilities.
//!
//! Every external tool the operator commands drive (cmake, docker, godot,
//! gdformat, git, package managers) goes through [`ProcessBuilder`].

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};

use thiserror::Error;

/// Failure of an external tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to spawn `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{phase} has no command to run")]
    EmptyCommand { phase: String },

    #[error("{phase} failed: `{command}` exited with {}", describe_code(.code))]
    ExternalToolFailure {
        phase: String,
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl ToolError {
    /// Exit code reported by the external tool, if it exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ToolError::Spawn { .. } | ToolError::EmptyCommand { .. } => None,
            ToolError::ExternalToolFailure { code, .. } => *code,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Builder for subprocess execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Build a process from a command prefix such as `[script, "cmake"]`.
    ///
    /// Returns `None` for an empty prefix.
    pub fn from_prefix(prefix: &[String]) -> Option<Self> {
        let (program, rest) = prefix.split_first()?;
        Some(ProcessBuilder::new(program).args(rest))
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Apply a set of environment variables.
    pub fn envs<'a>(mut self, vars: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        for (key, value) in vars {
            self.env.insert(key.clone(), value.clone());
        }
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get the environment overlay.
    pub fn get_env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Get the working directory.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute the command with captured stdout/stderr.
    pub fn exec(&self) -> Result<Output, ToolError> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("running `{}`", self.display_command());

        cmd.output().map_err(|source| ToolError::Spawn {
            command: self.display_command(),
            source,
        })
    }

    /// Execute with captured output and require success.
    pub fn exec_and_check(&self, phase: &str) -> Result<Output, ToolError> {
        let output = self.exec()?;
        if !output.status.success() {
            return Err(ToolError::ExternalToolFailure {
                phase: phase.to_string(),
                command: self.display_command(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(output)
    }

    /// Execute with inherited stdio and return the status only.
    pub fn status(&self) -> Result<ExitStatus, ToolError> {
        tracing::debug!("running `{}`", self.display_command());

        self.build_command()
            .status()
            .map_err(|source| ToolError::Spawn {
                command: self.display_command(),
                source,
            })
    }

    /// Execute with inherited stdio and require success.
    pub fn status_and_check(&self, phase: &str) -> Result<(), ToolError> {
        let status = self.status()?;
        if !status.success() {
            return Err(ToolError::ExternalToolFailure {
                phase: phase.to_string(),
                command: self.display_command(),
                code: status.code(),
                stderr: String::new(),
            });
        }
        Ok(())
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|arg| {
            if arg.contains(' ') {
                format!("\"{}\"", arg)
            } else {
                arg.clone()
            }
        }));
        parts.join(" ")
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
