/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core::conflict
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Verify that the candidate patch set, together with the
    patches already installed, contains no known conflicts.

  Security / Safety Notes:
    The check requires credentials; without them it is skipped
    with a warning and nothing is transmitted.

  Dependencies:
    quick-xml for response decoding and request escaping.

  Operational Scope:
    Runs after resolution and before any download; a conflict
    aborts the whole build.

  Revision History:
    2026-10-17 COD  Implemented remote conflict verification.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Every conflicting group reported, not just the first
    - Best-effort skip is explicit and logged
============================================================*/

use std::sync::Arc;

use quick_xml::escape::escape;
use serde::Deserialize;

use crate::error::{format_conflict_groups, Result, SynpatchError};
use crate::installer::Architecture;
use crate::inventory::Inventory;
use crate::logger::Logger;
use crate::patch::{PatchMetadata, ServiceErrorRecord};
use crate::remote::RemoteResolutionClient;
use crate::service::Credentials;

/// Response of the inventory resolution endpoint.
#[derive(Debug, Deserialize)]
pub struct InventoryResolutionDocument {
    #[serde(rename = "patch", default)]
    patches: Vec<ResolvedInstalledPatch>,
    #[serde(default)]
    error: Option<ServiceErrorRecord>,
}

#[derive(Debug, Deserialize)]
struct ResolvedInstalledPatch {
    #[serde(rename = "@unique_patch_id")]
    unique_patch_id: String,
}

impl InventoryResolutionDocument {
    pub(crate) fn parse(xml: &str) -> std::result::Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(xml)
    }

    pub(crate) fn into_patch_ids(self) -> Result<Vec<String>> {
        if let Some(error) = self.error {
            return Err(SynpatchError::Service(format!(
                "Inventory resolution failed: {}",
                error.describe()
            )));
        }
        Ok(self
            .patches
            .into_iter()
            .map(|patch| patch.unique_patch_id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect())
    }
}

/// Response of the conflict-check endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ConflictCheckDocument {
    #[serde(default)]
    conflict_sets: Option<ConflictSets>,
    #[serde(default)]
    error: Option<ServiceErrorRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct ConflictSets {
    #[serde(rename = "conflict_set", default)]
    sets: Vec<ConflictSet>,
}

#[derive(Debug, Default, Deserialize)]
struct ConflictSet {
    #[serde(rename = "patch", default)]
    patches: Vec<ConflictingPatch>,
}

#[derive(Debug, Deserialize)]
struct ConflictingPatch {
    #[serde(rename = "@bug")]
    bug: String,
}

impl ConflictCheckDocument {
    pub(crate) fn parse(xml: &str) -> std::result::Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(xml)
    }

    /// Non-empty conflict groups, each a list of bug numbers.
    pub fn groups(&self) -> Result<Vec<Vec<String>>> {
        if let Some(error) = &self.error {
            return Err(SynpatchError::Service(format!(
                "Conflict check failed: {}",
                error.describe()
            )));
        }
        Ok(self
            .conflict_sets
            .iter()
            .flat_map(|sets| sets.sets.iter())
            .map(|set| {
                set.patches
                    .iter()
                    .map(|patch| patch.bug.trim().to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|group| !group.is_empty())
            .collect())
    }
}

/// Render the conflict-check request document.
pub fn build_request(
    installed_ids: &[String],
    candidates: &[PatchMetadata],
    architecture: Architecture,
) -> String {
    let mut xml = String::from("<conflict_check_request>\n");
    xml.push_str(&format!(
        "  <platform>{}</platform>\n",
        architecture.platform_code()
    ));
    xml.push_str("  <target_patch_list>\n");
    for id in installed_ids {
        xml.push_str(&format!("    <installed_patch patch_id=\"{}\"/>\n", escape(id)));
    }
    xml.push_str("  </target_patch_list>\n  <candidate_patch_list>\n");
    for patch in candidates {
        xml.push_str(&format!(
            "    <patch_group rel_id=\"{}\" language_id=\"0\">{}</patch_group>\n",
            escape(patch.release_id()),
            escape(patch.bug())
        ));
    }
    xml.push_str("  </candidate_patch_list>\n</conflict_check_request>\n");
    xml
}

/// Submits candidate sets to the remote conflict checker.
pub struct ConflictChecker {
    remote: Arc<RemoteResolutionClient>,
    logger: Arc<Logger>,
}

impl ConflictChecker {
    pub fn new(remote: Arc<RemoteResolutionClient>, logger: Arc<Logger>) -> Self {
        Self { remote, logger }
    }

    /// Fail with `PatchConflict` if `candidates` conflict with each other or the inventory.
    pub async fn validate(
        &self,
        inventory: Option<&Inventory>,
        candidates: &[PatchMetadata],
        architecture: Architecture,
        credentials: Option<&Credentials>,
    ) -> Result<()> {
        let Some(credentials) = credentials else {
            self.logger.warn(
                "CONFLICT",
                "No credentials supplied; skipping patch conflict check",
            );
            return Ok(());
        };
        if candidates.is_empty() {
            self.logger
                .info("CONFLICT", "No candidate patches; nothing to check");
            return Ok(());
        }

        let installed_ids = match inventory {
            Some(inventory) if !inventory.raw().trim().is_empty() => {
                self.remote
                    .installed_patch_ids(inventory, credentials)
                    .await?
            }
            _ => Vec::new(),
        };

        let request = build_request(&installed_ids, candidates, architecture);
        self.logger.debug(
            "CONFLICT",
            format!(
                "Checking {} candidates against {} installed patches",
                candidates.len(),
                installed_ids.len()
            ),
        );

        let groups = self
            .remote
            .check_conflicts(&request, credentials)
            .await?
            .groups()?;
        if groups.is_empty() {
            self.logger.info("CONFLICT", "No patch conflicts detected");
            return Ok(());
        }

        self.logger.error(
            "CONFLICT",
            format!("Conflicting patches: {}", format_conflict_groups(&groups)),
        );
        Err(SynpatchError::PatchConflict { groups })
    }
}
