/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for Syn-Patch Core. Resolves the patch set for
    an installer, verifies it against the conflict checker and
    emits a manifest describing the archives to apply.

  Security / Safety Notes:
    The password is read from SYNPATCH_PASSWORD only, never
    from the command line. Performs HTTPS requests only.

  Dependencies:
    clap for CLI parsing, chrono for timestamps, tokio-util
    for Ctrl-C cancellation.

  Operational Scope:
    Invoked by image build tooling or by operators needing a
    standalone patch manifest.

  Revision History:
    2026-10-17 COD  Reworked entry point for patch resolution.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Configurable execution via CLI and config file
============================================================*/

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{ArgAction, Parser};
use tokio_util::sync::CancellationToken;

use synpatch_core::config::SynpatchConfig;
use synpatch_core::error::{Result, SynpatchError};
use synpatch_core::installer::{Architecture, InstallerType};
use synpatch_core::inventory::Inventory;
use synpatch_core::logger::Logger;
use synpatch_core::manifest::{build_manifest, write_manifest, DirectoryCache, ManifestDocument};
use synpatch_core::service::Credentials;
use synpatch_core::{PatchEngine, ResolveRequest};

const ENV_PASSWORD: &str = "SYNPATCH_PASSWORD";

/// Command-line arguments for Syn-Patch-Core.
#[derive(Debug, Parser)]
#[command(
    name = "Syn-Patch-Core",
    version,
    author = "Synavera Systems",
    about = "Patch set resolver and conflict verifier for middleware images"
)]
struct Cli {
    /// Installer type (WLS, FMW, SOA, OSB, OHS).
    #[arg(long = "type", value_name = "TYPE", default_value = "WLS")]
    installer_type: String,
    /// Installer version, e.g. 12.2.1.4.0.
    #[arg(long, value_name = "VERSION")]
    version: String,
    /// Target architecture (generic, amd64, arm64).
    #[arg(long, value_name = "ARCH", default_value = "generic")]
    arch: String,
    /// Patch to include as `bug` or `bug_version`.
    #[arg(long = "patch", value_name = "ID", action = ArgAction::Append, value_delimiter = ',')]
    patches: Vec<String>,
    /// Include the latest PSU of every installed product.
    #[arg(long, action = ArgAction::SetTrue)]
    latest_psu: bool,
    /// Include all recommended patches (implies the latest PSU).
    #[arg(long, action = ArgAction::SetTrue)]
    recommended: bool,
    /// Support account user; password is read from SYNPATCH_PASSWORD.
    #[arg(long, value_name = "USER")]
    user: Option<String>,
    /// Installed-patch inventory of the image being updated.
    #[arg(long, value_name = "PATH")]
    inventory: Option<PathBuf>,
    /// Override configuration file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override manifest output path.
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,
    /// Explicit log file path.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
    /// Do not write manifest; emit summary only.
    #[arg(long, action = ArgAction::SetTrue)]
    dry_run: bool,
    /// Enable verbose logging to stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[Syn-Patch-Core] {}", err);
            err.exit_code()
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let installer: InstallerType = cli.installer_type.parse()?;
    let architecture: Architecture = cli.arch.parse()?;
    let credentials = credentials_from(cli.user.as_deref(), std::env::var(ENV_PASSWORD).ok())?;

    let config = SynpatchConfig::load_from_optional_path(cli.config.as_deref())?;
    let manifest_path = cli
        .manifest
        .clone()
        .unwrap_or_else(|| config.manifest_path());

    let session_stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let log_path = cli
        .log
        .clone()
        .or_else(|| Some(config.log_dir().join(format!("patch_{session_stamp}.log"))));
    let logger = Arc::new(Logger::new(log_path, cli.verbose)?);
    logger.info("INIT", "Syn-Patch Core awakening.");

    let inventory = match &cli.inventory {
        Some(path) => Some(read_inventory(path, &logger)?),
        None => None,
    };

    let request = ResolveRequest {
        patch_ids: cli.patches.clone(),
        latest_psu: cli.latest_psu || cli.recommended,
        recommended: cli.recommended,
        inventory,
        ..ResolveRequest::new(installer, cli.version.clone(), architecture)
    };
    if request.patch_ids.is_empty() && !request.latest_psu {
        logger.warn("EMPTY", "No patches requested; exiting");
        logger.finalize()?;
        return Ok(ExitCode::SUCCESS);
    }

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            watcher.cancel();
        }
    });

    let engine = PatchEngine::new(&config, logger.clone(), cancel)?;
    let outcome = engine.run(&request, credentials.as_ref()).await;
    let resolution = match outcome {
        Ok(resolution) => resolution,
        Err(err) => {
            logger.error("ABORT", err.to_string());
            logger.finalize()?;
            return Err(err);
        }
    };

    let cache = DirectoryCache::new(config.cache_dir());
    let document = build_manifest(
        installer,
        &request.version,
        architecture,
        &resolution,
        &cache,
        &logger,
    );

    if cli.dry_run {
        print_summary(&document);
    } else {
        write_manifest(&document, &manifest_path)?;
        logger.info(
            "MANIFEST",
            format!("Manifest written to {}", manifest_path.display()),
        );
    }

    logger.info(
        "SUMMARY",
        format!(
            "patches={} psu={} cached={}",
            document.metadata.total_patches,
            document.metadata.psu_patches,
            document.metadata.cached_patches
        ),
    );
    logger.info("COMPLETE", "Patch set verified.");
    logger.finalize()?;

    Ok(ExitCode::SUCCESS)
}

fn credentials_from(user: Option<&str>, password: Option<String>) -> Result<Option<Credentials>> {
    match (user, password) {
        (Some(user), Some(password)) if !password.is_empty() => {
            Ok(Some(Credentials::new(user, password)))
        }
        (Some(user), _) => Err(SynpatchError::Config(format!(
            "--user {user} given but {ENV_PASSWORD} is not set"
        ))),
        (None, _) => Ok(None),
    }
}

fn read_inventory(path: &Path, logger: &Logger) -> Result<Inventory> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        SynpatchError::Filesystem(format!(
            "Failed to read inventory {}: {err}",
            path.display()
        ))
    })?;
    let inventory = Inventory::parse(&raw);
    logger.info(
        "INVENTORY",
        format!(
            "Loaded {} installed patches{}",
            inventory.patches().len(),
            inventory
                .psu_version()
                .map(|psu| format!(" (PSU {psu})"))
                .unwrap_or_default()
        ),
    );
    Ok(inventory)
}

fn print_summary(document: &ManifestDocument) {
    println!(
        "→ Manifest dry-run. Patches={} PSU={} Cached={}",
        document.metadata.total_patches,
        document.metadata.psu_patches,
        document.metadata.cached_patches
    );
    for entry in &document.patches {
        println!("  {} {} {}", entry.bug, entry.version.as_deref().unwrap_or("-"), entry.file_name);
    }
    for note in &document.notes {
        println!("  note: {note}");
    }
}
