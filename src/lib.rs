/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Library surface of Syn-Patch Core: resolve the patch set
    for a middleware image and verify it is conflict free.

  Security / Safety Notes:
    Network access is confined to the patch service module;
    credentials are never persisted.

  Dependencies:
    See Cargo.toml; the binary is a thin layer over this crate.

  Operational Scope:
    Linked by the synpatch_core binary and integration tests.

  Revision History:
    2026-10-17 COD  Split library from the binary entry point.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit module boundaries per concern
    - Result-first error handling with deterministic exits
============================================================*/

pub mod catalog;
pub mod config;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod installer;
pub mod inventory;
pub mod logger;
pub mod manifest;
pub mod patch;
pub mod remote;
pub mod resolver;
pub mod retry;
pub mod selector;
pub mod service;
pub mod version;

#[cfg(test)]
mod testing;

pub use engine::PatchEngine;
pub use error::{Result, SynpatchError};
pub use resolver::{Resolution, ResolveRequest};
