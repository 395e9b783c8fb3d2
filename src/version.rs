//! Reads the release version out of the project manifest.

use std::path::Path;
use std::sync::LazyLock;
use log::debug;
use regex::Regex;
use crate::error::{PackageError, Result};

/// First `version:` line; the token stops at an optional `+build` suffix.
static VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^version:[ \t]*(.+?)(?:\+|$)").expect("version regex is valid")
});

/// Extracts the version token from manifest text, e.g. `2.3.1` from `version: 2.3.1+45`.
pub fn parse_version(content: &str) -> Option<String> {
    let caps = VERSION_LINE.captures(content)?;
    let token = caps.get(1)?.as_str().trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Reads `manifest` and returns its version token.
///
/// An unreadable manifest and a manifest without a usable `version:` line are both
/// config errors. Nothing is written either way.
pub fn read_version(manifest: &Path) -> Result<String> {
    let content = std::fs::read_to_string(manifest).map_err(|e| {
        PackageError::config(format!("Could not read {}: {}", manifest.display(), e))
    })?;

    let version = parse_version(&content).ok_or_else(|| {
        PackageError::config(format!("Could not find version in {}", manifest.display()))
    })?;
    debug!("Parsed version {:?} from {:?}", version, manifest);
    Ok(version)
}
