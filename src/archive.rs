//! # Zip Archiver
//!
//! Packs the deploy folder into `<App> v<version>.zip`. The folder's own name is the single
//! top-level entry, so unzipping next to the archive recreates the folder as-is.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::Path;
use log::{debug, info, trace, warn};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};
use crate::error::{PackageError, Result};

/// Deflate at its strongest.
const COMPRESSION_LEVEL: i32 = 9;

/// Deletes a zip left over from an earlier run.
pub fn prepare_zip_path(zip_path: &Path, no_clobber: bool) -> Result<()> {
    if !zip_path.exists() {
        return Ok(());
    }
    if no_clobber {
        return Err(PackageError::fs(
            "replace zip",
            zip_path,
            io::Error::new(io::ErrorKind::AlreadyExists, "already exists (--no-clobber)"),
        ));
    }
    warn!("Removing existing zip: {}", zip_path.display());
    fs::remove_file(zip_path).map_err(|e| PackageError::fs("remove file", zip_path, e))
}

/// Writes `source_dir` into a new zip at `zip_path` and returns its size in bytes.
///
/// The archive only counts as done once the central directory is written and the file
/// is synced. A failure part-way leaves the partial zip on disk.
pub fn create_zip(source_dir: &Path, zip_path: &Path) -> Result<u64> {
    info!("Creating zip archive...");

    let root = source_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            PackageError::archive(
                zip_path,
                io::Error::new(io::ErrorKind::InvalidInput, "source directory has no name"),
            )
        })?;

    let file = File::create(zip_path).map_err(|e| PackageError::archive(zip_path, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| PackageError::archive(zip_path, io::Error::from(e)))?;
        let name = entry_name(&root, source_dir, entry.path());

        if entry.file_type().is_dir() {
            trace!("dir  {}", name);
            zip.add_directory(name, options)
                .map_err(|e| PackageError::archive(zip_path, e))?;
        } else {
            trace!("file {}", name);
            zip.start_file(name, options)
                .map_err(|e| PackageError::archive(zip_path, e))?;
            let mut input = File::open(entry.path()).map_err(|e| PackageError::archive(zip_path, e))?;
            io::copy(&mut input, &mut zip).map_err(|e| PackageError::archive(zip_path, e))?;
        }
    }

    let writer = zip.finish().map_err(|e| PackageError::archive(zip_path, e))?;
    let file = writer
        .into_inner()
        .map_err(|e| PackageError::archive(zip_path, e.into_error()))?;
    file.sync_all().map_err(|e| PackageError::archive(zip_path, e))?;

    let bytes = file
        .metadata()
        .map_err(|e| PackageError::archive(zip_path, e))?
        .len();
    debug!("Finalized {:?}", zip_path);
    info!("Created zip: {} ({} bytes)", zip_path.display(), bytes);
    Ok(bytes)
}

/// `<root>/<relative path>` with forward slashes. Directories end up without a trailing
/// slash here; `add_directory` appends one.
fn entry_name(root: &str, source_dir: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(source_dir).unwrap_or(path);
    std::iter::once(root.to_string())
        .chain(rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()))
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io::Read;
    use std::path::PathBuf;
    use crate::materialize::snapshot;

    fn deploy_folder(root: &Path) -> PathBuf {
        let dir = root.join("Woodbine v2.3.1");
        fs::create_dir_all(dir.join("data/flutter_assets")).unwrap();
        fs::write(dir.join("woodbine.exe"), b"MZ\x90\x00\x03").unwrap();
        fs::write(dir.join("flutter_windows.dll"), vec![0xABu8; 64 * 1024]).unwrap();
        fs::write(dir.join("data/flutter_assets/AssetManifest.json"), br#"{"a":["b"]}"#).unwrap();
        fs::write(dir.join("data/app.so"), b"elf-ish").unwrap();
        dir
    }

    /// Entry name -> contents for every file entry in the archive.
    fn unzip(zip_path: &Path) -> BTreeMap<String, Vec<u8>> {
        let mut archive = zip::ZipArchive::new(File::open(zip_path).unwrap()).unwrap();
        let mut files = BTreeMap::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).unwrap();
            if entry.is_dir() {
                continue;
            }
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            files.insert(entry.name().to_string(), data);
        }
        files
    }

    #[test]
    fn archive_round_trips_the_deploy_folder() {
        let dir = tempfile::tempdir().unwrap();
        let source = deploy_folder(dir.path());
        let zip_path = dir.path().join("Woodbine v2.3.1.zip");

        let bytes = create_zip(&source, &zip_path).unwrap();
        assert_eq!(bytes, fs::metadata(&zip_path).unwrap().len());

        let expected: BTreeMap<String, Vec<u8>> = snapshot(&source)
            .into_iter()
            .map(|(rel, data)| {
                let parts: Vec<String> = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                (format!("Woodbine v2.3.1/{}", parts.join("/")), data)
            })
            .collect();
        assert_eq!(unzip(&zip_path), expected);
    }

    #[test]
    fn entries_are_deflated_under_the_folder_name() {
        let dir = tempfile::tempdir().unwrap();
        let source = deploy_folder(dir.path());
        let zip_path = dir.path().join("out.zip");
        create_zip(&source, &zip_path).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        assert!(names.iter().all(|n| n.starts_with("Woodbine v2.3.1/")), "{:?}", names);
        assert!(names.contains(&"Woodbine v2.3.1/data/flutter_assets/".to_string()));

        let dll = archive.by_name("Woodbine v2.3.1/flutter_windows.dll").unwrap();
        assert_eq!(dll.compression(), CompressionMethod::Deflated);
        assert!(dll.compressed_size() < dll.size(), "repetitive data should shrink");
    }

    #[test]
    fn prepare_zip_path_removes_old_archive() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("Woodbine v1.0.0.zip");
        fs::write(&zip_path, b"old zip").unwrap();

        prepare_zip_path(&zip_path, false).unwrap();
        assert!(!zip_path.exists());

        // Nothing there is fine too.
        prepare_zip_path(&zip_path, false).unwrap();
    }

    #[test]
    fn prepare_zip_path_respects_no_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("Woodbine v1.0.0.zip");
        fs::write(&zip_path, b"old zip").unwrap();

        let err = prepare_zip_path(&zip_path, true).unwrap_err();
        assert!(matches!(err, PackageError::Filesystem { .. }));
        assert!(zip_path.exists());
    }

    #[test]
    fn unwritable_zip_path_is_an_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = deploy_folder(dir.path());

        let err = create_zip(&source, &dir.path().join("missing/parent/out.zip")).unwrap_err();
        assert!(matches!(err, PackageError::Archive { .. }), "{:?}", err);
    }

    #[test]
    fn entry_names_use_forward_slashes() {
        let src = Path::new("deploy").join("App v1");
        let nested = src.join("data").join("flutter_assets").join("x.json");
        assert_eq!(entry_name("App v1", &src, &nested), "App v1/data/flutter_assets/x.json");
        assert_eq!(entry_name("App v1", &src, &src), "App v1");
    }
}
