//! # Error Taxonomy
//!
//! Every failure the packager can hit falls into one of five buckets. None of them
//! are recoverable: they bubble up to `main`, get logged, and the process exits with 1.
//! Nothing already written to disk is cleaned up, so a half-copied folder or a
//! truncated zip stays around for inspection.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PackageError>;

#[derive(Debug, Error)]
pub enum PackageError {
    /// The manifest or the packager config could not be read or made sense of.
    #[error("{0}")]
    Config(String),

    /// The external release build failed to start or exited non-zero.
    #[error("Build command `{command}` {detail}")]
    BuildTool { command: String, detail: String },

    /// The build claimed success but the expected executable is not there.
    #[error("Executable not found at {}", .path.display())]
    ArtifactMissing { path: PathBuf },

    #[error("Failed to {action} {}: {source}", .path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write zip {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

impl PackageError {
    pub fn config(msg: impl Into<String>) -> Self {
        PackageError::Config(msg.into())
    }

    pub fn fs(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PackageError::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn archive(path: impl Into<PathBuf>, source: impl Into<zip::result::ZipError>) -> Self {
        PackageError::Archive {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Short label used in the failure report.
    pub fn kind(&self) -> &'static str {
        match self {
            PackageError::Config(_) => "config",
            PackageError::BuildTool { .. } => "build tool",
            PackageError::ArtifactMissing { .. } => "artifact missing",
            PackageError::Filesystem { .. } => "filesystem",
            PackageError::Archive { .. } => "archive",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_path() {
        let err = PackageError::ArtifactMissing {
            path: PathBuf::from("build/Release/woodbine.exe"),
        };
        assert!(err.to_string().contains("woodbine.exe"));
        assert_eq!(err.kind(), "artifact missing");

        let err = PackageError::fs(
            "remove directory",
            "deploy/Woodbine v1.0.0",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to remove directory"), "{}", msg);
        assert!(msg.contains("Woodbine v1.0.0"));
        assert!(msg.ends_with("denied"));
    }

    #[test]
    fn io_errors_convert_into_archive_errors() {
        let err = PackageError::archive(
            "deploy/out.zip",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert_eq!(err.kind(), "archive");
        assert!(err.to_string().contains("disk full"));
    }
}
