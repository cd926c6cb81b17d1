/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core::version
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Parse and compare dot-separated middleware version strings
    such as `12.2.1.4.0` or `12.2.1.4.240104`.

  Security / Safety Notes:
    Pure computation; no I/O performed in this module.

  Dependencies:
    None beyond std.

  Operational Scope:
    Used by inventory PSU detection and patch selection to
    reason about release ordering.

  Revision History:
    2026-10-17 COD  Introduced zero-padded version ordering.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Equality, ordering and hashing agree on one rule
    - Explicit parse errors for malformed input
============================================================*/

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{Result, SynpatchError};

/// Numeric dotted version. `1.2` and `1.2.0` are the same version.
#[derive(Debug, Clone)]
pub struct Version {
    components: Vec<u64>,
}

impl Version {
    /// Parse a dotted version. Empty text yields `0`.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self {
                components: vec![0],
            });
        }

        let mut components = Vec::new();
        for token in trimmed.split('.') {
            let value = token.parse::<u64>().map_err(|err| SynpatchError::VersionFormat {
                text: text.to_string(),
                reason: format!("component `{token}` is not numeric: {err}"),
            })?;
            components.push(value);
        }
        Ok(Self { components })
    }

    /// Parse an optional version, treating absence like an empty string.
    pub fn parse_optional(text: Option<&str>) -> Result<Self> {
        Self::parse(text.unwrap_or_default())
    }

    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Components with trailing zeros removed; the canonical form for hashing.
    fn significant(&self) -> &[u64] {
        let end = self
            .components
            .iter()
            .rposition(|value| *value != 0)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        &self.components[..end]
    }
}

/// Compare two versions, padding the shorter one with zeros.
pub fn compare(a: &Version, b: &Version) -> Ordering {
    let len = a.components.len().max(b.components.len());
    for idx in 0..len {
        let left = a.components.get(idx).copied().unwrap_or(0);
        let right = b.components.get(idx).copied().unwrap_or(0);
        match left.cmp(&right) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Compare two version strings directly.
pub fn compare_str(a: &str, b: &str) -> Result<Ordering> {
    Ok(compare(&Version::parse(a)?, &Version::parse(b)?))
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        compare(self, other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl FromStr for Version {
    type Err = SynpatchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.components.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", rendered.join("."))
    }
}
