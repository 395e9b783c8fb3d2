//! # Packaging Pipeline
//!
//! One forward-only run:
//!
//! `ReadVersion -> RunBuild -> VerifyArtifact -> PrepareDeployDir -> CopyArtifacts -> PrepareZipPath -> CreateZip`
//!
//! The first error stops everything and is returned together with the step it came from.
//! Whatever the earlier steps wrote stays on disk.

use std::fmt;
use std::path::{Path, PathBuf};
use log::{debug, info};
use thiserror::Error;
use crate::archive;
use crate::builder::BuildTool;
use crate::config::{self, Layout, PackageConfig};
use crate::error::PackageError;
use crate::materialize;
use crate::version;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ReadVersion,
    RunBuild,
    VerifyArtifact,
    PrepareDeployDir,
    CopyArtifacts,
    PrepareZipPath,
    CreateZip,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Step::ReadVersion => "read version",
            Step::RunBuild => "run build",
            Step::VerifyArtifact => "verify executable",
            Step::PrepareDeployDir => "prepare deploy directory",
            Step::CopyArtifacts => "copy build output",
            Step::PrepareZipPath => "prepare zip path",
            Step::CreateZip => "create zip",
        };
        f.write_str(label)
    }
}

/// A pipeline error tagged with where it happened.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct StepError {
    pub step: Step,
    #[source]
    pub source: PackageError,
}

trait AtStep<T> {
    fn at(self, step: Step) -> Result<T, StepError>;
}

impl<T> AtStep<T> for Result<T, PackageError> {
    fn at(self, step: Step) -> Result<T, StepError> {
        self.map_err(|source| StepError { step, source })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PackageOptions {
    /// Package whatever is already in the build output.
    pub skip_build: bool,
    /// Fail instead of replacing an existing deploy folder or zip.
    pub no_clobber: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutcome {
    pub version: String,
    pub deploy_folder: PathBuf,
    pub zip_path: PathBuf,
    pub zip_bytes: u64,
    pub files_copied: u64,
}

/// Reads the version and resolves every path for this run. No side effects.
pub fn resolve_layout(project_dir: &Path, config: &PackageConfig) -> Result<(String, Layout), PackageError> {
    let manifest = config::resolve(project_dir, &config.manifest);
    let version = version::read_version(&manifest)?;
    let layout = Layout::new(project_dir, config, &version);
    Ok((version, layout))
}

/// Runs the whole packaging procedure.
pub fn run(
    project_dir: &Path,
    config: &PackageConfig,
    builder: &impl BuildTool,
    options: PackageOptions,
) -> Result<PackageOutcome, StepError> {
    info!("Starting Windows build...");

    let (version, layout) = resolve_layout(project_dir, config).at(Step::ReadVersion)?;
    info!("Version: {}", version);
    debug!("Layout: {:?}", layout);

    if options.skip_build {
        info!("Skipping build, packaging existing output in {}", layout.build_output.display());
    } else {
        info!("Building: {}", builder.describe());
        builder.build(project_dir).at(Step::RunBuild)?;
    }

    materialize::verify_artifact(&layout.executable).at(Step::VerifyArtifact)?;

    materialize::prepare_target(&layout.deploy_root, &layout.target_dir, options.no_clobber)
        .at(Step::PrepareDeployDir)?;

    let files_copied =
        materialize::copy_tree(&layout.build_output, &layout.target_dir).at(Step::CopyArtifacts)?;

    archive::prepare_zip_path(&layout.zip_path, options.no_clobber).at(Step::PrepareZipPath)?;

    let zip_bytes = archive::create_zip(&layout.target_dir, &layout.zip_path).at(Step::CreateZip)?;

    Ok(PackageOutcome {
        version,
        deploy_folder: layout.target_dir,
        zip_path: layout.zip_path,
        zip_bytes,
        files_copied,
    })
}
