/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core::manifest
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Construct the patch manifest from a validated candidate
    set, noting which artifacts are already cached locally.

  Security / Safety Notes:
    Manifest data is written to operator-controlled paths; no
    credentials or response bodies are recorded.

  Dependencies:
    serde for JSON serialization.

  Operational Scope:
    Consumed by the image build layer to decide which patch
    archives still need downloading.

  Revision History:
    2026-10-17 COD  Adapted manifest builder to patch sets.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Resolution order preserved for reproducible manifests
    - Explicit PSU attribution for each entry
    - Rich metadata for audit and observability
============================================================*/

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{Result, SynpatchError};
use crate::installer::{Architecture, InstallerType};
use crate::logger::Logger;
use crate::patch::PatchMetadata;
use crate::resolver::Resolution;

/// Lookup of patch archives that were already downloaded.
pub trait ArtifactCache: Send + Sync {
    /// Local path of `file_name`, if present.
    fn cached_path(&self, file_name: &str) -> Option<PathBuf>;
}

/// Cache laid out as `<root>/<file name>`.
#[derive(Debug, Clone)]
pub struct DirectoryCache {
    root: PathBuf,
}

impl DirectoryCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactCache for DirectoryCache {
    fn cached_path(&self, file_name: &str) -> Option<PathBuf> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return None;
        }
        let candidate = self.root.join(file_name);
        candidate.is_file().then_some(candidate)
    }
}

/// Wrapper representing the full manifest document.
#[derive(Debug, Serialize)]
pub struct ManifestDocument {
    pub metadata: ManifestMetadata,
    pub patches: Vec<ManifestEntry>,
    pub notes: Vec<String>,
}

/// Metadata block describing manifest context.
#[derive(Debug, Serialize)]
pub struct ManifestMetadata {
    pub generated_at: String,
    pub generated_by: String,
    pub installer: InstallerType,
    pub version: String,
    pub architecture: Architecture,
    pub total_patches: usize,
    pub psu_patches: usize,
    pub cached_patches: usize,
}

/// Per-patch manifest entry.
#[derive(Debug, Serialize)]
pub struct ManifestEntry {
    pub bug: String,
    pub version: Option<String>,
    pub description: String,
    pub release_id: String,
    pub platform: String,
    pub psu: bool,
    pub psu_version: Option<String>,
    pub download_url: String,
    pub file_name: String,
    pub cached_path: Option<PathBuf>,
}

impl ManifestEntry {
    fn from_patch(patch: &PatchMetadata, cache: &dyn ArtifactCache) -> Self {
        Self {
            bug: patch.bug().to_string(),
            version: patch.version().map(str::to_string),
            description: patch.description().to_string(),
            release_id: patch.release_id().to_string(),
            platform: patch.platform().to_string(),
            psu: patch.is_psu(),
            psu_version: patch.psu_version().map(str::to_string),
            download_url: patch.download_url(),
            file_name: patch.file_name().to_string(),
            cached_path: cache.cached_path(patch.file_name()),
        }
    }
}

/// Build a manifest from a validated resolution.
pub fn build_manifest(
    installer: InstallerType,
    version: &str,
    architecture: Architecture,
    resolution: &Resolution,
    cache: &dyn ArtifactCache,
    logger: &Logger,
) -> ManifestDocument {
    let patches: Vec<ManifestEntry> = resolution
        .patches
        .iter()
        .map(|patch| {
            let entry = ManifestEntry::from_patch(patch, cache);
            logger.debug(
                "MANIFEST",
                format!(
                    "{} → {}{}",
                    patch.key(),
                    entry.file_name,
                    if entry.cached_path.is_some() { " (cached)" } else { "" }
                ),
            );
            entry
        })
        .collect();

    let metadata = ManifestMetadata {
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        generated_by: "synpatch_core".to_string(),
        installer,
        version: version.to_string(),
        architecture,
        total_patches: patches.len(),
        psu_patches: patches.iter().filter(|entry| entry.psu).count(),
        cached_patches: patches.iter().filter(|entry| entry.cached_path.is_some()).count(),
    };

    ManifestDocument {
        metadata,
        patches,
        notes: resolution.notes.clone(),
    }
}

/// Persist the manifest to the given path.
pub fn write_manifest(document: &ManifestDocument, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| {
            SynpatchError::Filesystem(format!(
                "Failed to create manifest directory {}: {err}",
                parent.display()
            ))
        })?;
    }
    let file = File::create(path).map_err(|err| {
        SynpatchError::Filesystem(format!(
            "Failed to create manifest file {}: {err}",
            path.display()
        ))
    })?;
    serde_json::to_writer_pretty(file, document).map_err(|err| {
        SynpatchError::Filesystem(format!(
            "Failed to write manifest {}: {err}",
            path.display()
        ))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::testing::{patch, psu};

    fn resolution() -> Resolution {
        Resolution {
            patches: vec![
                psu("35893811", "12.2.1.4.0", "12.2.1.4.240104"),
                patch("34809489", Some("12.2.1.4.0")),
            ],
            notes: vec!["No release published for Oracle Coherence 12.2.1.4.0".to_string()],
        }
    }

    #[test]
    fn directory_cache_finds_existing_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("p34809489_Generic.zip"), b"zip").unwrap();
        let cache = DirectoryCache::new(dir.path());
        assert_eq!(
            cache.cached_path("p34809489_Generic.zip"),
            Some(dir.path().join("p34809489_Generic.zip"))
        );
        assert_eq!(cache.cached_path("p35893811_Generic.zip"), None);
        assert_eq!(cache.cached_path("../p34809489_Generic.zip"), None);
    }

    #[test]
    fn manifest_marks_psu_and_cached_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("p34809489_Generic.zip"), b"zip").unwrap();
        let document = build_manifest(
            InstallerType::Wls,
            "12.2.1.4.0",
            Architecture::Amd64,
            &resolution(),
            &DirectoryCache::new(dir.path()),
            &Logger::silent(),
        );
        assert_eq!(document.metadata.total_patches, 2);
        assert_eq!(document.metadata.psu_patches, 1);
        assert_eq!(document.metadata.cached_patches, 1);
        assert_eq!(document.patches[0].bug, "35893811");
        assert_eq!(document.patches[0].psu_version.as_deref(), Some("12.2.1.4.240104"));
        assert!(document.patches[1].cached_path.is_some());
        assert_eq!(document.notes.len(), 1);
    }

    #[test]
    fn written_manifest_is_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("manifest.json");
        let document = build_manifest(
            InstallerType::Wls,
            "12.2.1.4.0",
            Architecture::Generic,
            &resolution(),
            &DirectoryCache::new(dir.path()),
            &Logger::silent(),
        );
        write_manifest(&document, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["metadata"]["installer"], "WLS");
        assert_eq!(value["metadata"]["architecture"], "generic");
        assert_eq!(
            value["patches"][1]["download_url"],
            "https://updates.example.com/Orion/Services/download/p34809489_Generic.zip?patch_file=p34809489_Generic.zip"
        );
    }
}
