//! # Packager Configuration
//!
//! The defaults describe the Woodbine Flutter app. A project can override any of them
//! with a `winpack.json` next to its manifest:
//!
//! ```json
//! { "appName": "Woodbine", "executable": "woodbine.exe", "deployDir": "dist" }
//! ```
//!
//! [`Layout`] turns the config, the project directory and the detected version into the
//! concrete paths every pipeline step works with.

use std::path::{Path, PathBuf};
use log::debug;
use serde::Deserialize;
use crate::error::{PackageError, Result};

/// Name of the optional per-project config file.
pub const CONFIG_FILE: &str = "winpack.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PackageConfig {
    /// Display name used for the deploy folder and zip (`<appName> v<version>`).
    pub app_name: String,
    /// File that must exist in the build output after a successful build.
    pub executable: String,
    /// Manifest holding the `version:` line, relative to the project dir.
    pub manifest: PathBuf,
    /// Program followed by its arguments.
    pub build_command: Vec<String>,
    pub build_output: PathBuf,
    pub deploy_dir: PathBuf,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            app_name: "Woodbine".to_string(),
            executable: "woodbine.exe".to_string(),
            manifest: PathBuf::from("pubspec.yaml"),
            build_command: ["flutter", "build", "windows", "--release"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            build_output: ["build", "windows", "x64", "runner", "Release"].iter().collect(),
            deploy_dir: PathBuf::from("deploy"),
        }
    }
}

impl PackageConfig {
    /// Loads the config for `project_dir`.
    ///
    /// An explicit path must exist. Without one, `winpack.json` in the project
    /// directory is used if present, otherwise the built-in defaults.
    pub fn load(project_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => resolve(project_dir, p),
            None => {
                let candidate = project_dir.join(CONFIG_FILE);
                if !candidate.is_file() {
                    debug!("No {} in {:?}, using defaults", CONFIG_FILE, project_dir);
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let raw = std::fs::read_to_string(&path).map_err(|e| {
            PackageError::config(format!("Could not read config {}: {}", path.display(), e))
        })?;
        let config: PackageConfig = serde_json::from_str(&raw).map_err(|e| {
            PackageError::config(format!("Invalid config {}: {}", path.display(), e))
        })?;
        debug!("Loaded config from {:?}: {:?}", path, config);

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty() {
            return Err(PackageError::config("appName must not be empty"));
        }
        if self.executable.trim().is_empty() {
            return Err(PackageError::config("executable must not be empty"));
        }
        if self.build_command.first().is_none_or(|p| p.trim().is_empty()) {
            return Err(PackageError::config("buildCommand must name a program"));
        }
        Ok(())
    }

    /// The build command as a single printable string.
    pub fn build_command_line(&self) -> String {
        self.build_command.join(" ")
    }
}

/// Every path one packaging run reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub build_output: PathBuf,
    pub executable: PathBuf,
    pub deploy_root: PathBuf,
    pub target_dir: PathBuf,
    pub zip_path: PathBuf,
}

impl Layout {
    pub fn new(project_dir: &Path, config: &PackageConfig, version: &str) -> Self {
        let build_output = resolve(project_dir, &config.build_output);
        let deploy_root = resolve(project_dir, &config.deploy_dir);
        let folder_name = format!("{} v{}", config.app_name, version);

        Self {
            executable: build_output.join(&config.executable),
            build_output,
            target_dir: deploy_root.join(&folder_name),
            zip_path: deploy_root.join(format!("{}.zip", folder_name)),
            deploy_root,
        }
    }
}

/// Joins relative paths onto the project directory; absolute paths win.
pub fn resolve(project_dir: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        project_dir.join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_flutter_windows_build() {
        let config = PackageConfig::default();
        assert_eq!(config.build_command_line(), "flutter build windows --release");

        let layout = Layout::new(Path::new("/proj"), &config, "2.3.1");
        assert_eq!(
            layout.executable,
            Path::new("/proj/build/windows/x64/runner/Release/woodbine.exe")
        );
        assert_eq!(layout.target_dir, Path::new("/proj/deploy/Woodbine v2.3.1"));
        assert_eq!(layout.zip_path, Path::new("/proj/deploy/Woodbine v2.3.1.zip"));
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PackageConfig::load(dir.path(), None).unwrap();
        assert_eq!(config, PackageConfig::default());
    }

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "appName": "Birch", "deployDir": "dist" }"#,
        )
        .unwrap();

        let config = PackageConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.app_name, "Birch");
        assert_eq!(config.deploy_dir, PathBuf::from("dist"));
        assert_eq!(config.executable, "woodbine.exe");

        let layout = Layout::new(dir.path(), &config, "0.9.0");
        assert_eq!(layout.zip_path, dir.path().join("dist").join("Birch v0.9.0.zip"));
    }

    #[test]
    fn bad_configs_are_config_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = PackageConfig::load(dir.path(), Some(Path::new("nope.json")));
        assert!(matches!(missing, Err(PackageError::Config(_))));

        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        assert!(matches!(
            PackageConfig::load(dir.path(), None),
            Err(PackageError::Config(_))
        ));

        std::fs::write(dir.path().join(CONFIG_FILE), r#"{ "buildCommand": [] }"#).unwrap();
        let err = PackageConfig::load(dir.path(), None).unwrap_err();
        assert!(err.to_string().contains("buildCommand"));

        std::fs::write(dir.path().join(CONFIG_FILE), r#"{ "appName": "  " }"#).unwrap();
        assert!(PackageConfig::load(dir.path(), None).is_err());
    }

    #[test]
    fn absolute_paths_are_not_rebased() {
        let dir = tempfile::tempdir().unwrap();
        let elsewhere = dir.path().join("elsewhere");
        assert_eq!(resolve(Path::new("/proj"), &elsewhere), elsewhere);
        assert_eq!(resolve(Path::new("/proj"), Path::new("out")), Path::new("/proj/out"));
    }
}
