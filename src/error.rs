/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core::error
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Centralise Syn-Patch-Core error types so resolution,
    remote and conflict failures share one taxonomy and one
    set of exit semantics.

  Security / Safety Notes:
    Error contexts never carry credentials; only user ids,
    bug numbers, hosts and operation names are exposed.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Used across modules to propagate failures and consolidate
    exit codes for the binary entry point.

  Revision History:
    2026-10-17 COD  Established shared error definitions.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - No silent failure paths
    - Stable exit codes for operational tooling
============================================================*/

use std::io;
use std::process::ExitCode;

use thiserror::Error;

/// Result alias for Syn-Patch-Core operations.
pub type Result<T> = std::result::Result<T, SynpatchError>;

/// Enumerates high-level error domains surfaced by Syn-Patch-Core.
#[derive(Debug, Error)]
pub enum SynpatchError {
    #[error("Patch service host `{host}` could not be resolved: {detail}")]
    RemoteUnreachable { host: String, detail: String },
    #[error("Remote operation `{operation}` failed after {attempts} attempts: {last_error}")]
    RetryExhausted {
        operation: String,
        attempts: usize,
        last_error: String,
    },
    #[error("Remote operation `{operation}` cancelled")]
    Cancelled { operation: String },
    #[error("Version {requested} of patch {bug} not found; available: {}", .available.join(", "))]
    VersionNotFound {
        bug: String,
        requested: String,
        available: Vec<String>,
    },
    #[error("Patch {bug} is a Stack Patch Bundle and cannot be requested directly")]
    InvalidPatchNumber { bug: String },
    #[error("Conflicts detected between patches: {}", format_conflict_groups(.groups))]
    PatchConflict { groups: Vec<Vec<String>> },
    #[error("Invalid credentials for user `{user}`")]
    InvalidCredentials { user: String },
    #[error("Invalid version `{text}`: {reason}")]
    VersionFormat { text: String, reason: String },
    #[error("Malformed patch record: {0}")]
    PatchFormat(String),
    #[error("Patch service: {0}")]
    Service(String),
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Network: {0}")]
    Network(String),
    #[error("Serialization: {0}")]
    Serialization(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error("Runtime: {0}")]
    Runtime(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SynpatchError {
    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SynpatchError::RemoteUnreachable { .. } => ExitCode::from(32),
            SynpatchError::RetryExhausted { .. } => ExitCode::from(33),
            SynpatchError::Cancelled { .. } => ExitCode::from(130),
            SynpatchError::VersionNotFound { .. } => ExitCode::from(60),
            SynpatchError::InvalidPatchNumber { .. } => ExitCode::from(61),
            SynpatchError::PatchConflict { .. } => ExitCode::from(62),
            SynpatchError::InvalidCredentials { .. } => ExitCode::from(21),
            SynpatchError::VersionFormat { .. } => ExitCode::from(63),
            SynpatchError::PatchFormat(_) => ExitCode::from(34),
            SynpatchError::Service(_) => ExitCode::from(35),
            SynpatchError::Config(_) => ExitCode::from(20),
            SynpatchError::Network(_) => ExitCode::from(30),
            SynpatchError::Serialization(_) => ExitCode::from(31),
            SynpatchError::Filesystem(_) => ExitCode::from(40),
            SynpatchError::Runtime(_) => ExitCode::from(50),
            SynpatchError::Io(_) => ExitCode::from(41),
        }
    }
}

/// Render conflict groups as `[a,b] [c]`, one bracketed entry per group.
pub fn format_conflict_groups(groups: &[Vec<String>]) -> String {
    groups
        .iter()
        .map(|group| format!("[{}]", group.join(",")))
        .collect::<Vec<_>>()
        .join(" ")
}
