//! Console output for the end of a run: the success banner, the failure line and the
//! dry-run / check summaries. Step-by-step progress goes through `log` instead.

use std::fmt::Write as _;
use log::{debug, error};
use crate::config::{Layout, PackageConfig};
use crate::pipeline::{PackageOptions, PackageOutcome, StepError};

pub fn success(outcome: &PackageOutcome) {
    print!("{}", success_banner(outcome));
}

/// Every failure, pipeline or not, ends up here right before exit code 1.
pub fn failure(what: &str, err: &anyhow::Error) {
    error!("{}", failure_line(what, err));
    if let Some(step) = err.downcast_ref::<StepError>() {
        debug!("Stopped at step '{}' with a {} error", step.step, step.source.kind());
    }
}

fn failure_line(what: &str, err: &anyhow::Error) -> String {
    format!("✗ {} failed: {}", what, err)
}

fn success_banner(outcome: &PackageOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "✓ Build complete!");
    let _ = writeln!(out, "  Version:       {}", outcome.version);
    let _ = writeln!(out, "  Deploy folder: {}", outcome.deploy_folder.display());
    let _ = writeln!(
        out,
        "  Zip file:      {} ({} bytes, {} files)",
        outcome.zip_path.display(),
        outcome.zip_bytes,
        outcome.files_copied
    );
    out
}

/// What a real run would do, without doing any of it.
pub fn plan(version: &str, layout: &Layout, config: &PackageConfig, options: PackageOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "═══════════════════════════════════════════════════════════════");
    let _ = writeln!(out, "                 What winpack Will Do");
    let _ = writeln!(out, "═══════════════════════════════════════════════════════════════");
    let _ = writeln!(out);
    let _ = writeln!(out, "Version:          {}", version);
    if options.skip_build {
        let _ = writeln!(out, "Build:            skipped (--skip-build)");
    } else {
        let _ = writeln!(out, "Build:            {}", config.build_command_line());
    }
    let _ = writeln!(out, "Build output:     {}", layout.build_output.display());
    let _ = writeln!(out, "Expected exe:     {}", layout.executable.display());
    let _ = writeln!(out, "Deploy folder:    {}", layout.target_dir.display());
    let _ = writeln!(out, "Zip file:         {}", layout.zip_path.display());

    let mut existing = Vec::new();
    if std::fs::symlink_metadata(&layout.target_dir).is_ok() {
        existing.push(&layout.target_dir);
    }
    if layout.zip_path.exists() {
        existing.push(&layout.zip_path);
    }
    if !existing.is_empty() {
        let _ = writeln!(out);
        if options.no_clobber {
            let _ = writeln!(out, "WOULD FAIL (--no-clobber, these already exist and are kept):");
        } else {
            let _ = writeln!(out, "REPLACING (deleted without backup):");
        }
        for p in existing {
            let _ = writeln!(out, "    ✕ {}", p.display());
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "───────────────────────────────────────────────────────────────");
    let _ = writeln!(out, "This is a preview. Run 'winpack package' to build and package.");
    out
}

/// Summary for `winpack check`.
pub fn check(version: &str, layout: &Layout) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "✓ {} is ready to package as v{}", layout.executable.display(), version);
    let _ = writeln!(out, "  Deploy folder: {}", layout.target_dir.display());
    let _ = writeln!(out, "  Zip file:      {}", layout.zip_path.display());
    out
}
