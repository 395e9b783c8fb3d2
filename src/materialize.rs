//! # Deploy Folder Materializer
//!
//! Turns the release build output into `deploy/<App> v<version>/`:
//! 1. Check the executable is actually there (`verify_artifact`).
//! 2. Make sure `deploy/` exists and the versioned folder does not (`prepare_target`).
//! 3. Copy the whole tree across (`copy_tree`).
//!
//! An existing versioned folder is deleted outright. There is no merge and no backup.

use std::fs;
use std::path::Path;
use log::{debug, info, trace, warn};
use walkdir::WalkDir;
use crate::error::{PackageError, Result};

/// Fails with `ArtifactMissing` unless `executable` is a regular file.
pub fn verify_artifact(executable: &Path) -> Result<()> {
    if !executable.is_file() {
        return Err(PackageError::ArtifactMissing {
            path: executable.to_path_buf(),
        });
    }
    info!("Executable found: {}", executable.display());
    Ok(())
}

/// Creates `deploy_root` if needed and clears `target_dir` out of the way.
///
/// With `no_clobber`, an existing target is an error instead of being removed.
pub fn prepare_target(deploy_root: &Path, target_dir: &Path, no_clobber: bool) -> Result<()> {
    if !deploy_root.is_dir() {
        debug!("Creating deploy directory {:?}", deploy_root);
        fs::create_dir_all(deploy_root)
            .map_err(|e| PackageError::fs("create directory", deploy_root, e))?;
    }

    // Whatever sits at the target path goes, even a stray file or a dangling link.
    let Ok(existing) = fs::symlink_metadata(target_dir) else {
        return Ok(());
    };
    if no_clobber {
        return Err(PackageError::fs(
            "replace directory",
            target_dir,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "already exists (--no-clobber)"),
        ));
    }

    if existing.is_dir() {
        warn!("Removing existing directory: {}", target_dir.display());
        fs::remove_dir_all(target_dir)
            .map_err(|e| PackageError::fs("remove directory", target_dir, e))?;
    } else {
        warn!("Removing file in the way of the deploy folder: {}", target_dir.display());
        fs::remove_file(target_dir).map_err(|e| PackageError::fs("remove file", target_dir, e))?;
    }
    Ok(())
}

/// Recursively copies `src` into `dest`, creating `dest` first.
///
/// Returns the number of files copied. Symlinks are not followed while walking;
/// a link to a file is copied as the file it points at.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<u64> {
    info!("Copying build output to: {}", dest.display());
    fs::metadata(src).map_err(|e| PackageError::fs("read directory", src, e))?;
    fs::create_dir_all(dest).map_err(|e| PackageError::fs("create directory", dest, e))?;

    let mut copied = 0u64;
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            PackageError::fs("read directory", path, e.into())
        })?;

        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| PackageError::fs("resolve", entry.path(), std::io::Error::other(e)))?;
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| PackageError::fs("create directory", &target, e))?;
        } else {
            trace!("{:?} -> {:?}", entry.path(), target);
            fs::copy(entry.path(), &target).map_err(|e| PackageError::fs("copy file", entry.path(), e))?;
            copied += 1;
        }
    }

    info!("Copied {} files", copied);
    Ok(copied)
}

/// Relative path -> contents for every file under `root`.
#[cfg(test)]
pub(crate) fn snapshot(root: &Path) -> std::collections::BTreeMap<std::path::PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}
