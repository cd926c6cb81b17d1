/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core::inventory
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Parse the installed-patch inventory of an existing image
    and derive the PSU level it is currently running.

  Security / Safety Notes:
    Pure parsing of operator-supplied text; nothing executed.

  Dependencies:
    regex for PSU description patterns.

  Operational Scope:
    Feeds the conflict checker (raw inventory) and the
    resolver (effective PSU version for image updates).

  Revision History:
    2026-10-17 COD  Added inventory parsing and PSU detection.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic first-match PSU detection
    - Raw input preserved for remote resolution
============================================================*/

use std::sync::OnceLock;

use regex::Regex;

use crate::version::Version;

/// A patch reported as installed in an existing Oracle home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPatch {
    pub bug: String,
    pub unique_patch_id: String,
    pub description: String,
}

impl InstalledPatch {
    /// PSU version advertised in this patch's description, if any.
    pub fn psu_version(&self) -> Option<String> {
        let (with_id, plain) = psu_patterns();
        let candidate = match with_id.captures(&self.description) {
            Some(caps) => format!("{}.{}", &caps[1], &caps[2]),
            None => plain.captures(&self.description)?[1].to_string(),
        };
        Version::parse(&candidate).is_ok().then_some(candidate)
    }
}

// `12.2.1.3.0(ID:191217.1425)` and `12.2.1.4.210930`.
fn psu_patterns() -> &'static (Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Regex::new(r"\b(\d+\.\d+\.\d+\.\d+)\.0\(ID:(\d+)\.\d+\)").expect("valid PSU regex"),
            Regex::new(r"\b(\d+\.\d+\.\d+\.\d+\.[1-9]\d+)\b").expect("valid PSU regex"),
        )
    })
}

/// Installed-patch inventory: the raw dump plus its parsed entries.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    raw: String,
    patches: Vec<InstalledPatch>,
}

impl Inventory {
    /// Parse a `bug;unique-id;description;...` dump. An incomplete trailing group is ignored.
    pub fn parse(raw: &str) -> Self {
        let fields: Vec<&str> = raw.trim().split(';').map(str::trim).collect();
        let patches = fields
            .chunks_exact(3)
            .filter(|group| !group[0].is_empty())
            .map(|group| InstalledPatch {
                bug: group[0].to_string(),
                unique_patch_id: group[1].to_string(),
                description: group[2].to_string(),
            })
            .collect();
        Self {
            raw: raw.to_string(),
            patches,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn patches(&self) -> &[InstalledPatch] {
        &self.patches
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// PSU version of the first installed patch that advertises one.
    pub fn psu_version(&self) -> Option<String> {
        self.patches.iter().find_map(InstalledPatch::psu_version)
    }

    pub fn contains_bug(&self, bug: &str) -> bool {
        self.patches.iter().any(|patch| patch.bug == bug)
    }
}
