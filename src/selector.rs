/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core::selector
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Choose one patch among the version variants published for
    a bug number, following an explicit preference order.

  Security / Safety Notes:
    Pure selection logic; no I/O performed in this module.

  Dependencies:
    None beyond std.

  Operational Scope:
    Applied by the resolver to every user-requested patch.

  Revision History:
    2026-10-17 COD  Implemented variant selection.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Absence is a value, a bad explicit request is an error
    - Duplicate variants are surfaced, never hidden
============================================================*/

use std::collections::HashMap;

use crate::error::{Result, SynpatchError};
use crate::logger::Logger;
use crate::patch::PatchMetadata;
use crate::version::Version;

/// Version preferences applied in order: explicit, PSU, installer.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionPreference<'a> {
    pub provided: Option<&'a str>,
    pub psu: Option<&'a str>,
    pub installer: Option<&'a str>,
}

/// Pick the variant of one bug number that matches the preferences.
///
/// Returns `Ok(None)` when nothing applies; fails with `VersionNotFound`
/// only when an explicitly provided version is missing.
pub fn select(
    candidates: &[PatchMetadata],
    preference: VersionPreference<'_>,
    logger: &Logger,
) -> Result<Option<PatchMetadata>> {
    match candidates {
        [] => Ok(None),
        [single] => select_single(single, preference),
        many => select_among(many, preference, logger),
    }
}

fn select_single(
    patch: &PatchMetadata,
    preference: VersionPreference<'_>,
) -> Result<Option<PatchMetadata>> {
    match patch.version() {
        None => {
            let adopted = preference
                .provided
                .or(preference.psu)
                .or(preference.installer);
            Ok(Some(match adopted {
                Some(version) => patch.with_version(version),
                None => patch.clone(),
            }))
        }
        Some(version) => match preference.provided {
            Some(provided) if Version::parse(provided)? != Version::parse(version)? => {
                Err(SynpatchError::VersionNotFound {
                    bug: patch.bug().to_string(),
                    requested: provided.to_string(),
                    available: vec![patch.key()],
                })
            }
            _ => Ok(Some(patch.clone())),
        },
    }
}

fn select_among(
    candidates: &[PatchMetadata],
    preference: VersionPreference<'_>,
    logger: &Logger,
) -> Result<Option<PatchMetadata>> {
    let mut by_version: HashMap<Version, &PatchMetadata> = HashMap::new();
    for patch in candidates {
        let version = Version::parse_optional(patch.version())?;
        if let Some(existing) = by_version.get(&version) {
            logger.warn(
                "DUPVER",
                format!(
                    "Patch {} lists version {version} more than once (releases {} and {}); keeping the first",
                    patch.bug(),
                    existing.release_id(),
                    patch.release_id()
                ),
            );
            continue;
        }
        by_version.insert(version, patch);
    }

    if let Some(provided) = preference.provided {
        return match by_version.get(&Version::parse(provided)?) {
            Some(patch) => Ok(Some((*patch).clone())),
            None => Err(SynpatchError::VersionNotFound {
                bug: candidates[0].bug().to_string(),
                requested: provided.to_string(),
                available: candidates.iter().map(PatchMetadata::key).collect(),
            }),
        };
    }

    for wanted in [preference.psu, preference.installer].into_iter().flatten() {
        if let Some(patch) = by_version.get(&Version::parse(wanted)?) {
            return Ok(Some((*patch).clone()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::testing::{patch, released};

    fn prefs<'a>(
        provided: Option<&'a str>,
        psu: Option<&'a str>,
        installer: Option<&'a str>,
    ) -> VersionPreference<'a> {
        VersionPreference {
            provided,
            psu,
            installer,
        }
    }

    #[test]
    fn no_candidates_selects_nothing() {
        let chosen = select(&[], prefs(Some("1"), None, None), &Logger::silent()).unwrap();
        assert!(chosen.is_none());
    }

    #[test]
    fn unversioned_single_adopts_provided_version() {
        let candidates = [patch("28186730", None)];
        let chosen = select(
            &candidates,
            prefs(Some("12.2.1.4.0"), Some("12.2.1.4.240104"), Some("12.2.1.3.0")),
            &Logger::silent(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(chosen.version(), Some("12.2.1.4.0"));
    }

    #[test]
    fn unversioned_single_falls_back_to_psu_then_installer() {
        let candidates = [patch("28186730", None)];
        let logger = Logger::silent();
        let psu = select(&candidates, prefs(None, Some("12.2.1.4.240104"), Some("12.2.1.4.0")), &logger)
            .unwrap()
            .unwrap();
        assert_eq!(psu.version(), Some("12.2.1.4.240104"));
        let installer = select(&candidates, prefs(None, None, Some("12.2.1.4.0")), &logger)
            .unwrap()
            .unwrap();
        assert_eq!(installer.version(), Some("12.2.1.4.0"));
    }

    #[test]
    fn versioned_single_with_mismatched_request_fails() {
        let candidates = [patch("33416868", Some("12.2.1.3.0"))];
        let err = select(&candidates, prefs(Some("12.2.1.4.0"), None, None), &Logger::silent())
            .unwrap_err();
        match err {
            SynpatchError::VersionNotFound { available, .. } => {
                assert_eq!(available, vec!["33416868_12.2.1.3.0".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn versioned_single_without_request_is_kept() {
        let candidates = [patch("33416868", Some("12.2.1.3.0"))];
        let chosen = select(&candidates, prefs(None, Some("12.2.1.4.0"), None), &Logger::silent())
            .unwrap()
            .unwrap();
        assert_eq!(chosen.version(), Some("12.2.1.3.0"));
    }

    #[test]
    fn psu_version_preferred_among_variants() {
        let candidates = [
            patch("33416868", Some("12.2.1.3.0")),
            patch("33416868", Some("12.2.1.4.0")),
        ];
        let chosen = select(&candidates, prefs(None, Some("12.2.1.4.0"), None), &Logger::silent())
            .unwrap()
            .unwrap();
        assert_eq!(chosen.release_id(), "rel-12.2.1.4.0");
    }

    #[test]
    fn installer_version_used_when_psu_absent_from_set() {
        let candidates = [
            patch("33416868", Some("12.2.1.3.0")),
            patch("33416868", Some("12.2.1.4.0")),
        ];
        let chosen = select(
            &candidates,
            prefs(None, Some("12.2.1.4.240104"), Some("12.2.1.3.0")),
            &Logger::silent(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(chosen.version(), Some("12.2.1.3.0"));
    }

    #[test]
    fn no_matching_preference_selects_nothing() {
        let candidates = [
            patch("33416868", Some("12.2.1.3.0")),
            patch("33416868", Some("12.2.1.4.0")),
        ];
        let chosen = select(&candidates, prefs(None, None, Some("14.1.1.0.0")), &Logger::silent())
            .unwrap();
        assert!(chosen.is_none());
    }

    #[test]
    fn missing_provided_version_lists_all_variants() {
        let candidates = [
            patch("33416868", Some("12.2.1.3.0")),
            patch("33416868", Some("12.2.1.4.0")),
        ];
        let err = select(&candidates, prefs(Some("14.1.1.0.0"), None, None), &Logger::silent())
            .unwrap_err();
        match err {
            SynpatchError::VersionNotFound {
                bug,
                requested,
                available,
            } => {
                assert_eq!(bug, "33416868");
                assert_eq!(requested, "14.1.1.0.0");
                assert_eq!(
                    available,
                    vec![
                        "33416868_12.2.1.3.0".to_string(),
                        "33416868_12.2.1.4.0".to_string()
                    ]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn trailing_zero_versions_match_variants() {
        let candidates = [
            patch("33416868", Some("12.2.1.3.0")),
            patch("33416868", Some("12.2.1.4.0")),
        ];
        let logger = Logger::silent();
        let chosen = select(&candidates, prefs(Some("12.2.1.4"), None, None), &logger)
            .unwrap()
            .unwrap();
        assert_eq!(chosen.release_id(), "rel-12.2.1.4.0");

        let by_installer = select(&candidates, prefs(None, Some("12.2.1.5"), Some("12.2.1.3")), &logger)
            .unwrap()
            .unwrap();
        assert_eq!(by_installer.version(), Some("12.2.1.3.0"));

        let single = [patch("33416868", Some("12.2.1.4.0"))];
        assert!(select(&single, prefs(Some("12.2.1.4.0.0"), None, None), &logger)
            .unwrap()
            .is_some());
    }

    #[test]
    fn malformed_requested_version_is_a_format_error() {
        let candidates = [
            patch("33416868", Some("12.2.1.3.0")),
            patch("33416868", Some("12.2.1.4.0")),
        ];
        let err = select(&candidates, prefs(Some("12.2.x"), None, None), &Logger::silent())
            .unwrap_err();
        assert!(matches!(err, SynpatchError::VersionFormat { .. }));
    }

    #[test]
    fn duplicate_versions_keep_first_variant() {
        let candidates = [
            released("33416868", "12.2.1.4.0", "600000000073715"),
            released("33416868", "12.2.1.4.0", "600000000099999"),
            patch("33416868", Some("12.2.1.3.0")),
        ];
        let chosen = select(&candidates, prefs(Some("12.2.1.4.0"), None, None), &Logger::silent())
            .unwrap()
            .unwrap();
        assert_eq!(chosen.release_id(), "600000000073715");
    }
}
