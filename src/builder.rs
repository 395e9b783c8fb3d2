//! # Release Build Invocation
//!
//! The build itself is somebody else's tool (`flutter build windows --release` by default).
//! We run it to completion with the console passed straight through, and only look at the
//! exit status.
//!
//! [`BuildTool`] is the seam that lets the pipeline run against a scripted builder in tests,
//! so nothing in the test suite needs a Flutter toolchain.

use std::path::Path;
use std::process::{Command, ExitStatus};
use log::{debug, info};
use crate::error::{PackageError, Result};

pub trait BuildTool {
    /// Runs the release build in `project_dir` and blocks until it finishes.
    fn build(&self, project_dir: &Path) -> Result<()>;

    /// Human readable command line, for progress output.
    fn describe(&self) -> String;
}

/// Runs an external command, inheriting stdin/stdout/stderr.
#[derive(Debug, Clone)]
pub struct CommandBuild {
    program: String,
    args: Vec<String>,
}

impl CommandBuild {
    /// `argv[0]` is the program. Returns `None` for an empty command.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn command(&self) -> Command {
        // Flutter ships as `flutter.bat` on Windows, which `CreateProcess` won't resolve
        // from a bare name. Going through cmd picks up .bat/.cmd shims.
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(&self.program).args(&self.args);
            cmd
        } else {
            let mut cmd = Command::new(&self.program);
            cmd.args(&self.args);
            cmd
        }
    }
}

impl BuildTool for CommandBuild {
    fn build(&self, project_dir: &Path) -> Result<()> {
        let line = self.describe();
        debug!("Spawning `{}` in {:?}", line, project_dir);

        let status = self
            .command()
            .current_dir(project_dir)
            .status()
            .map_err(|e| PackageError::BuildTool {
                command: line.clone(),
                detail: format!("could not be started: {}", e),
            })?;

        check_status(&line, status)?;
        info!("Build command finished successfully");
        Ok(())
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn check_status(command: &str, status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    let detail = match status.code() {
        Some(code) => format!("failed with exit code {}", code),
        None => "was terminated by a signal".to_string(),
    };
    Err(PackageError::BuildTool {
        command: command.to_string(),
        detail,
    })
}

/// A scripted builder for tests: writes a fixed set of files into the build output,
/// or fails like a broken toolchain would.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockBuild {
    /// Output directory, relative to the project dir.
    pub output: std::path::PathBuf,
    /// (relative path, contents) pairs to produce.
    pub files: Vec<(String, String)>,
    pub fail_with_code: Option<i32>,
    pub calls: std::sync::Mutex<u32>,
}

#[cfg(test)]
impl MockBuild {
    pub fn producing(output: impl Into<std::path::PathBuf>, files: &[(&str, &str)]) -> Self {
        Self {
            output: output.into(),
            files: files
                .iter()
                .map(|(name, data)| (name.to_string(), data.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing(code: i32) -> Self {
        Self {
            fail_with_code: Some(code),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[cfg(test)]
impl BuildTool for MockBuild {
    fn build(&self, project_dir: &Path) -> Result<()> {
        *self.calls.lock().unwrap() += 1;

        if let Some(code) = self.fail_with_code {
            return Err(PackageError::BuildTool {
                command: self.describe(),
                detail: format!("failed with exit code {}", code),
            });
        }

        let out = project_dir.join(&self.output);
        for (name, data) in &self.files {
            let path = out.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&path, data).unwrap();
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "mock build".to_string()
    }
}
