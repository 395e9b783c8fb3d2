//! # winpack: The Main Entry Point
//!
//! This module handles Command Line Interface (CLI) parsing, logging initialization,
//! and dispatching to the packaging pipeline.
//!
//! Running `winpack` with no sub-command is the same as `winpack package`: build the
//! release, copy it into `deploy/<App> v<version>/`, and zip it next to the folder.

use std::path::{Path, PathBuf};
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simplelog::{Config, SimpleLogger};

mod archive;
mod builder;
mod config;
mod error;
mod materialize;
mod pipeline;
mod report;
mod version;

use builder::CommandBuild;
use config::PackageConfig;
use error::PackageError;
use pipeline::PackageOptions;

/// The primary Command Line Interface (CLI) configuration.
#[derive(Parser)]
#[command(name = "winpack")]
#[command(about = "Builds, copies and zips a Windows release", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Project root holding the manifest. Defaults to the current directory.
    #[arg(long, global = true, value_name = "DIR")]
    project_dir: Option<PathBuf>,

    /// Config file to use instead of `<project>/winpack.json`.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Turn on verbose logging.
    ///
    /// - `-v`: Debug
    /// - `-vv`: Trace (every copied file and zip entry)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the release and package it (the default).
    ///
    /// 1. Read the version from the manifest.
    /// 2. Run the release build.
    /// 3. Copy the build output to `deploy/<App> v<version>/`.
    /// 4. Zip that folder to `deploy/<App> v<version>.zip`.
    Package {
        /// Package the existing build output without running the build.
        #[arg(long)]
        skip_build: bool,

        /// Print what would happen without building or touching the deploy folder.
        #[arg(long)]
        dry_run: bool,

        /// Fail instead of replacing an existing deploy folder or zip.
        #[arg(long)]
        no_clobber: bool,
    },
    /// Print the version found in the manifest.
    Version,
    /// Check that the build output holds the expected executable.
    Check,
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    // Logging failure shouldn't stop a release.
    let _ = SimpleLogger::init(log_level, Config::default());

    let command = cli.command.unwrap_or(Commands::Package {
        skip_build: false,
        dry_run: false,
        no_clobber: false,
    });
    let what = command.label();

    let result = project_dir(cli.project_dir.as_deref()).and_then(|dir| {
        let config = PackageConfig::load(&dir, cli.config.as_deref())?;
        match command {
            Commands::Package { skip_build, dry_run, no_clobber } => {
                let options = PackageOptions { skip_build, no_clobber };
                if dry_run {
                    dry_run_package(&dir, &config, options)
                } else {
                    package(&dir, &config, options)
                }
            }
            Commands::Version => print_version(&dir, &config),
            Commands::Check => check(&dir, &config),
        }
    });

    if let Err(e) = result {
        report::failure(what, &e);
        std::process::exit(1);
    }
}

impl Commands {
    /// How a failure of this command is announced.
    fn label(&self) -> &'static str {
        match self {
            Commands::Package { .. } => "Build",
            Commands::Version => "Version lookup",
            Commands::Check => "Check",
        }
    }
}

fn project_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir.to_path_buf()),
        None => std::env::current_dir()
            .map_err(|e| anyhow!("Could not determine the current directory: {}", e)),
    }
}

fn package(dir: &Path, config: &PackageConfig, options: PackageOptions) -> Result<()> {
    let builder = CommandBuild::from_argv(&config.build_command)
        .ok_or_else(|| PackageError::config("buildCommand must name a program"))?;

    let outcome = pipeline::run(dir, config, &builder, options)?;
    report::success(&outcome);
    Ok(())
}

fn dry_run_package(dir: &Path, config: &PackageConfig, options: PackageOptions) -> Result<()> {
    let (version, layout) = pipeline::resolve_layout(dir, config)?;
    print!("{}", report::plan(&version, &layout, config, options));
    Ok(())
}

fn print_version(dir: &Path, config: &PackageConfig) -> Result<()> {
    let (version, _) = pipeline::resolve_layout(dir, config)?;
    println!("{}", version);
    Ok(())
}

fn check(dir: &Path, config: &PackageConfig) -> Result<()> {
    let (version, layout) = pipeline::resolve_layout(dir, config)?;
    materialize::verify_artifact(&layout.executable)?;
    print!("{}", report::check(&version, &layout));
    Ok(())
}
