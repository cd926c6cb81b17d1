/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core::resolver
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Reconcile the latest PSU, the recommended-patch chain (PSU
    overlays included) and user-requested patches into one
    ordered candidate set for an installer, version and
    architecture.

  Security / Safety Notes:
    Read-only queries against the patch service; credentials
    are forwarded, never logged.

  Dependencies:
    Release catalog, remote client and selector of this crate.

  Operational Scope:
    Invoked once per image build or update before the conflict
    check and any download.

  Revision History:
    2026-10-17 COD  Implemented patch set resolution.
  ------------------------------------------------------------
  SSE Principles Observed:
    - "Nothing published" continues, failures abort
    - Deterministic candidate ordering for reproducible builds
    - Every skipped source recorded as an informational note
============================================================*/

use std::collections::HashSet;
use std::sync::Arc;

use crate::catalog::{ReleaseCatalog, ReleaseLookup};
use crate::error::{Result, SynpatchError};
use crate::installer::{Architecture, InstallerCatalog, InstallerType, Product};
use crate::inventory::Inventory;
use crate::logger::Logger;
use crate::patch::{PatchLookup, PatchMetadata};
use crate::remote::RemoteResolutionClient;
use crate::selector::{select, VersionPreference};
use crate::service::Credentials;

/// Which patch sources to combine for one image.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub installer: InstallerType,
    pub version: String,
    pub architecture: Architecture,
    /// `bug` or `bug_version` identifiers supplied by the operator.
    pub patch_ids: Vec<String>,
    pub latest_psu: bool,
    pub recommended: bool,
    /// Inventory of the image being updated, if any.
    pub inventory: Option<Inventory>,
}

impl ResolveRequest {
    pub fn new(installer: InstallerType, version: impl Into<String>, architecture: Architecture) -> Self {
        Self {
            installer,
            version: version.into(),
            architecture,
            patch_ids: Vec::new(),
            latest_psu: false,
            recommended: false,
            inventory: None,
        }
    }
}

/// Candidate set plus informational notes about sources that produced nothing.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub patches: Vec<PatchMetadata>,
    pub notes: Vec<String>,
}

/// Split `bug_version` into the bug number and optional explicit version.
pub fn split_patch_id(id: &str) -> (&str, Option<&str>) {
    match id.trim().split_once('_') {
        Some((bug, version)) if !version.trim().is_empty() => (bug.trim(), Some(version.trim())),
        Some((bug, _)) => (bug.trim(), None),
        None => (id.trim(), None),
    }
}

/// Orchestrates PSU, recommended and user patch discovery.
pub struct PatchSetResolver {
    remote: Arc<RemoteResolutionClient>,
    catalog: Arc<ReleaseCatalog>,
    installers: InstallerCatalog,
    logger: Arc<Logger>,
}

impl PatchSetResolver {
    pub fn new(
        remote: Arc<RemoteResolutionClient>,
        catalog: Arc<ReleaseCatalog>,
        installers: InstallerCatalog,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            remote,
            catalog,
            installers,
            logger,
        }
    }

    /// Resolve every requested source into one ordered candidate set.
    ///
    /// PSU or recommended patches come first, user patches after them.
    pub async fn resolve(
        &self,
        request: &ResolveRequest,
        credentials: Option<&Credentials>,
    ) -> Result<Resolution> {
        let mut resolution = Resolution::default();
        let ResolveRequest {
            installer,
            version,
            architecture,
            ..
        } = request;

        if request.recommended {
            let patches = self
                .recommended_with_notes(*installer, version, *architecture, credentials, &mut resolution.notes)
                .await?;
            resolution.patches.extend(patches);
        } else if request.latest_psu {
            let patches = self
                .latest_psu_with_notes(*installer, version, *architecture, credentials, &mut resolution.notes)
                .await?;
            resolution.patches.extend(patches);
        }

        let base = installer.base_product();
        let psu_version = resolution
            .patches
            .iter()
            .find(|patch| patch.is_psu() && patch.product() == base.code())
            .and_then(|patch| patch.psu_version().map(str::to_string))
            .or_else(|| request.inventory.as_ref().and_then(Inventory::psu_version));
        if let Some(psu) = &psu_version {
            self.logger
                .info("PSU", format!("Effective PSU version {psu}"));
        }

        let user_patches = self
            .user_patches_with_notes(
                *installer,
                version,
                *architecture,
                &request.patch_ids,
                psu_version,
                credentials,
                &mut resolution.notes,
            )
            .await?;

        let mut seen: HashSet<(String, String)> = resolution
            .patches
            .iter()
            .map(|patch| (patch.bug().to_string(), patch.release_id().to_string()))
            .collect();
        for patch in user_patches {
            if seen.insert((patch.bug().to_string(), patch.release_id().to_string())) {
                resolution.patches.push(patch);
            } else {
                self.logger.debug(
                    "MERGE",
                    format!("{} already part of the PSU/recommended set", patch.key()),
                );
            }
        }

        self.logger.info(
            "RESOLVE",
            format!(
                "Resolved {} candidate patches for {installer:?} {version}",
                resolution.patches.len()
            ),
        );
        Ok(resolution)
    }

    /// Latest PSU of every product the installer lays down.
    pub async fn resolve_latest_psu(
        &self,
        installer: InstallerType,
        version: &str,
        architecture: Architecture,
        credentials: Option<&Credentials>,
    ) -> Result<Vec<PatchMetadata>> {
        self.latest_psu_with_notes(installer, version, architecture, credentials, &mut Vec::new())
            .await
    }

    /// All recommended patches, PSU overlays included.
    pub async fn resolve_recommended_patches(
        &self,
        installer: InstallerType,
        version: &str,
        architecture: Architecture,
        credentials: Option<&Credentials>,
    ) -> Result<Vec<PatchMetadata>> {
        self.recommended_with_notes(installer, version, architecture, credentials, &mut Vec::new())
            .await
    }

    /// Resolve operator-supplied `bug` / `bug_version` ids.
    pub async fn resolve_user_patches(
        &self,
        installer: InstallerType,
        version: &str,
        architecture: Architecture,
        patch_ids: &[String],
        psu_version: Option<String>,
        credentials: Option<&Credentials>,
    ) -> Result<Vec<PatchMetadata>> {
        self.user_patches_with_notes(
            installer,
            version,
            architecture,
            patch_ids,
            psu_version,
            credentials,
            &mut Vec::new(),
        )
        .await
    }

    async fn latest_psu_with_notes(
        &self,
        installer: InstallerType,
        version: &str,
        architecture: Architecture,
        credentials: Option<&Credentials>,
        notes: &mut Vec<String>,
    ) -> Result<Vec<PatchMetadata>> {
        let mut psus = Vec::new();
        for &product in self.installers.products(installer) {
            let lookup_version = self.installers.lookup_version(product, version);
            let patches = self
                .applicable_recommended(product, &lookup_version, architecture, credentials, notes)
                .await?;
            let found: Vec<PatchMetadata> = patches.into_iter().filter(PatchMetadata::is_psu).collect();
            if found.is_empty() {
                self.logger.info(
                    "PSU",
                    format!("No PSU published for {product} {lookup_version}"),
                );
            }
            for psu in &found {
                self.logger.info(
                    "PSU",
                    format!("Latest PSU for {product}: {} ({})", psu.key(), psu.description()),
                );
            }
            psus.extend(found);
        }
        Ok(psus)
    }

    async fn recommended_with_notes(
        &self,
        installer: InstallerType,
        version: &str,
        architecture: Architecture,
        credentials: Option<&Credentials>,
        notes: &mut Vec<String>,
    ) -> Result<Vec<PatchMetadata>> {
        let mut result: Vec<PatchMetadata> = Vec::new();

        for &product in self.installers.products(installer) {
            let lookup_version = self.installers.lookup_version(product, version);
            let patches: Vec<PatchMetadata> = self
                .applicable_recommended(product, &lookup_version, architecture, credentials, notes)
                .await?
                .into_iter()
                .filter(|patch| self.applies_to(installer, patch))
                .collect();

            let overlay_sources: Vec<String> = patches
                .iter()
                .filter_map(|patch| patch.psu_version().map(str::to_string))
                .collect();
            result.extend(patches);

            for psu_version in overlay_sources {
                let overlays: Vec<PatchMetadata> = self
                    .applicable_recommended(product, &psu_version, architecture, credentials, notes)
                    .await?
                    .into_iter()
                    .filter(|patch| self.applies_to(installer, patch))
                    .collect();
                let (added, replaced) = self.merge_overlays(&mut result, overlays);
                self.logger.info(
                    "OVERLAY",
                    format!(
                        "Added {added} and replaced {replaced} overlay patches for {product} PSU {psu_version}"
                    ),
                );
            }
        }

        Ok(result)
    }

    /// False for patches published under the installer's releases that belong to another product.
    fn applies_to(&self, installer: InstallerType, patch: &PatchMetadata) -> bool {
        let description = patch.description().to_ascii_uppercase();
        let excluded = installer
            .excluded_descriptions()
            .iter()
            .any(|marker| description.contains(marker));
        if excluded {
            self.logger.debug(
                "EXCLUDE",
                format!("{} is not applicable to {installer:?}", patch.key()),
            );
        }
        !excluded
    }

    /// Merge PSU-release patches into `result`.
    ///
    /// Exact `(bug, release)` duplicates are dropped; a PSU-release variant of a
    /// bug already present replaces that entry in place, so one archive per bug
    /// is downloaded. Returns `(added, replaced)`.
    fn merge_overlays(&self, result: &mut Vec<PatchMetadata>, overlays: Vec<PatchMetadata>) -> (usize, usize) {
        let mut added = 0usize;
        let mut replaced = 0usize;
        for overlay in overlays {
            let same_bug = result.iter().position(|patch| patch.bug() == overlay.bug());
            match same_bug {
                Some(idx) if result[idx].release_id() == overlay.release_id() => {}
                Some(idx) => {
                    self.logger.info(
                        "OVERLAY",
                        format!("{} supersedes {}", overlay.key(), result[idx].key()),
                    );
                    result[idx] = overlay;
                    replaced += 1;
                }
                None => {
                    result.push(overlay);
                    added += 1;
                }
            }
        }
        (added, replaced)
    }

    #[allow(clippy::too_many_arguments)]
    async fn user_patches_with_notes(
        &self,
        installer: InstallerType,
        version: &str,
        architecture: Architecture,
        patch_ids: &[String],
        psu_version: Option<String>,
        credentials: Option<&Credentials>,
        notes: &mut Vec<String>,
    ) -> Result<Vec<PatchMetadata>> {
        let base = installer.base_product();
        let mut effective_psu = psu_version;
        let mut resolved = Vec::new();

        for id in patch_ids {
            let (bug, explicit) = split_patch_id(id);
            if bug.is_empty() {
                continue;
            }
            let variants: Vec<PatchMetadata> = self
                .remote
                .search_patches(bug, credentials)
                .await?
                .into_patches()
                .into_iter()
                .filter(|patch| architecture.accepts(patch.platform()))
                .collect();

            if variants.iter().any(PatchMetadata::is_stack_patch_bundle) {
                return Err(SynpatchError::InvalidPatchNumber {
                    bug: bug.to_string(),
                });
            }

            let preference = VersionPreference {
                provided: explicit,
                psu: effective_psu.as_deref(),
                installer: Some(version),
            };
            match select(&variants, preference, &self.logger)? {
                Some(patch) => {
                    if patch.is_psu() && patch.product() == base.code() {
                        if let Some(psu) = patch.psu_version() {
                            self.logger.info(
                                "PSU",
                                format!("Patch {} sets PSU version {psu}", patch.bug()),
                            );
                            effective_psu = Some(psu.to_string());
                        }
                    }
                    self.logger
                        .info("PATCH", format!("Selected {}", patch.key()));
                    resolved.push(patch);
                }
                None => {
                    let note = format!(
                        "No variant of patch {bug} matches {version} on {architecture:?}"
                    );
                    self.logger.warn("PATCH404", &note);
                    notes.push(note);
                }
            }
        }

        Ok(resolved)
    }

    /// Recommended patches of `product` at `version`, filtered to the platform with irregular ones dropped.
    async fn applicable_recommended(
        &self,
        product: Product,
        version: &str,
        architecture: Architecture,
        credentials: Option<&Credentials>,
        notes: &mut Vec<String>,
    ) -> Result<Vec<PatchMetadata>> {
        let release = match self.catalog.release_number(product, version, credentials).await? {
            ReleaseLookup::Found(release) => release,
            ReleaseLookup::NotFound => {
                let note = format!("No release published for {product} {version}");
                self.logger.info("RELEASE", &note);
                notes.push(note);
                return Ok(Vec::new());
            }
        };

        let patches = match self
            .remote
            .recommended_patches(product, release.as_str(), credentials)
            .await?
        {
            PatchLookup::Found(patches) => patches,
            PatchLookup::NotFound => {
                let note = format!("No recommended patches for {product} {version}");
                self.logger.info("RECOMMEND", &note);
                notes.push(note);
                return Ok(Vec::new());
            }
        };

        Ok(patches
            .into_iter()
            .filter(|patch| architecture.accepts(patch.platform()))
            .filter(|patch| {
                if patch.is_irregular() {
                    self.logger.debug(
                        "IRREGULAR",
                        format!("Discarding {} ({})", patch.key(), patch.description()),
                    );
                    return false;
                }
                true
            })
            .collect())
    }
}
