/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core::patch
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Model patch metadata returned by the patch service and
    parse search/recommendation XML documents into immutable
    PatchMetadata values.

  Security / Safety Notes:
    Pure parsing; download URLs are recorded but never
    dereferenced here.

  Dependencies:
    quick-xml (serde) for XML decoding, serde for manifest
    serialization.

  Operational Scope:
    Shared by the remote client, selector, resolver, conflict
    checker and manifest builder.

  Revision History:
    2026-10-17 COD  Introduced PatchMetadata and record parsing.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Immutable values after construction
    - Malformed records fail loudly, never default silently
============================================================*/

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynpatchError};

const PATCH_FILE_MARKER: &str = "patch_file=";
const STACK_PATCH_BUNDLE: &str = "STACK PATCH BUNDLE";

/// One patch as published by the patch service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchMetadata {
    bug: String,
    version: Option<String>,
    description: String,
    product: String,
    release_id: String,
    release_name: String,
    psu_bundle: Option<String>,
    platform: String,
    download_host: String,
    download_path: String,
    file_name: String,
    access: String,
    lifecycle: String,
}

impl PatchMetadata {
    fn from_record(record: PatchRecord) -> Result<Self> {
        let bug = record.bug.number.trim().to_string();
        let file = record
            .files
            .and_then(|files| files.files.into_iter().next())
            .ok_or_else(|| {
                SynpatchError::PatchFormat(format!("patch {bug} has no downloadable file"))
            })?;
        let download_path = file.download_url.path.trim().to_string();
        let file_name = extract_file_name(&download_path).ok_or_else(|| {
            SynpatchError::PatchFormat(format!(
                "download path for patch {bug} lacks `{PATCH_FILE_MARKER}`: {download_path}"
            ))
        })?;

        let release_name = record
            .release
            .name
            .clone()
            .unwrap_or_else(|| record.release.text.trim().to_string());
        let version = record
            .release
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        Ok(Self {
            bug,
            version,
            description: record.bug.summary.trim().to_string(),
            product: record.product.id.trim().to_string(),
            release_id: record.release.id.trim().to_string(),
            release_name,
            psu_bundle: record
                .psu_bundle
                .map(|bundle| bundle.trim().to_string())
                .filter(|bundle| !bundle.is_empty()),
            platform: record
                .platform
                .map(|platform| platform.id.trim().to_string())
                .unwrap_or_else(|| crate::installer::GENERIC_PLATFORM.to_string()),
            download_host: file.download_url.host.trim().trim_end_matches('/').to_string(),
            download_path,
            file_name,
            access: record.access.unwrap_or_default().trim().to_string(),
            lifecycle: record.life_cycle.unwrap_or_default().trim().to_string(),
        })
    }

    /// Copy of this patch carrying `version`.
    pub fn with_version(&self, version: &str) -> Self {
        Self {
            version: Some(version.to_string()),
            ..self.clone()
        }
    }

    pub fn bug(&self) -> &str {
        &self.bug
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn release_id(&self) -> &str {
        &self.release_id
    }

    pub fn release_name(&self) -> &str {
        &self.release_name
    }

    pub fn psu_bundle(&self) -> Option<&str> {
        self.psu_bundle.as_deref()
    }

    pub fn is_psu(&self) -> bool {
        self.psu_bundle.is_some()
    }

    /// Version of the PSU this patch delivers, taken from the bundle name.
    pub fn psu_version(&self) -> Option<&str> {
        self.psu_bundle
            .as_deref()
            .and_then(|bundle| bundle.split_whitespace().last())
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn download_host(&self) -> &str {
        &self.download_host
    }

    pub fn download_path(&self) -> &str {
        &self.download_path
    }

    pub fn download_url(&self) -> String {
        format!("{}{}", self.download_host, self.download_path)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn access(&self) -> &str {
        &self.access
    }

    pub fn lifecycle(&self) -> &str {
        &self.lifecycle
    }

    pub fn is_recommended(&self) -> bool {
        self.lifecycle.eq_ignore_ascii_case("Recommended")
    }

    pub fn is_open_access(&self) -> bool {
        self.access.eq_ignore_ascii_case("Open access")
    }

    pub fn is_stack_patch_bundle(&self) -> bool {
        self.description.to_ascii_uppercase().contains(STACK_PATCH_BUNDLE)
    }

    /// Patches the service reports with misleading metadata, e.g. a Stack
    /// Patch Bundle flagged as an ordinary PSU.
    pub fn is_irregular(&self) -> bool {
        self.is_stack_patch_bundle()
    }

    /// `bug_version` identifier, or the bare bug number without a version.
    pub fn key(&self) -> String {
        match &self.version {
            Some(version) => format!("{}_{}", self.bug, version),
            None => self.bug.clone(),
        }
    }
}

fn extract_file_name(download_path: &str) -> Option<String> {
    let start = download_path.find(PATCH_FILE_MARKER)? + PATCH_FILE_MARKER.len();
    let rest = &download_path[start..];
    let name = rest.split('&').next().unwrap_or_default().trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Outcome of a patch query: either patches or an explicit "nothing published".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchLookup {
    Found(Vec<PatchMetadata>),
    NotFound,
}

impl PatchLookup {
    pub fn into_patches(self) -> Vec<PatchMetadata> {
        match self {
            PatchLookup::Found(patches) => patches,
            PatchLookup::NotFound => Vec::new(),
        }
    }
}

/// Raw `<results>` document from the search and recommendation endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct PatchSearchResults {
    #[serde(rename = "patch", default)]
    patches: Vec<PatchRecord>,
    #[serde(default)]
    error: Option<ServiceErrorRecord>,
}

impl PatchSearchResults {
    pub(crate) fn parse(xml: &str) -> std::result::Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(xml)
    }

    /// Convert the document into domain values, separating "no results" from failures.
    pub(crate) fn into_lookup(self) -> Result<PatchLookup> {
        if let Some(error) = self.error {
            if error.is_no_results() {
                return Ok(PatchLookup::NotFound);
            }
            return Err(SynpatchError::Service(error.describe()));
        }
        if self.patches.is_empty() {
            return Ok(PatchLookup::NotFound);
        }
        let patches = self
            .patches
            .into_iter()
            .map(PatchMetadata::from_record)
            .collect::<Result<Vec<_>>>()?;
        Ok(PatchLookup::Found(patches))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceErrorRecord {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ServiceErrorRecord {
    fn is_no_results(&self) -> bool {
        self.message
            .as_deref()
            .map(|message| message.to_ascii_lowercase().contains("no results"))
            .unwrap_or(false)
    }

    pub(crate) fn describe(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{message} (code {code})"),
            (None, Some(message)) => message.clone(),
            (Some(code), None) => format!("error code {code}"),
            (None, None) => "unspecified service error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PatchRecord {
    bug: BugRecord,
    product: IdRecord,
    release: ReleaseRecord,
    #[serde(default)]
    platform: Option<IdRecord>,
    #[serde(default)]
    psu_bundle: Option<String>,
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    life_cycle: Option<String>,
    #[serde(default)]
    files: Option<FilesRecord>,
}

#[derive(Debug, Deserialize)]
struct BugRecord {
    number: String,
    #[serde(rename = "abstract", default)]
    summary: String,
}

#[derive(Debug, Deserialize)]
struct IdRecord {
    #[serde(rename = "@id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct ReleaseRecord {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@name", default)]
    name: Option<String>,
    #[serde(rename = "$text", default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct FilesRecord {
    #[serde(rename = "file", default)]
    files: Vec<FileRecord>,
}

#[derive(Debug, Deserialize)]
struct FileRecord {
    download_url: DownloadUrlRecord,
}

#[derive(Debug, Deserialize)]
struct DownloadUrlRecord {
    #[serde(rename = "@host", default)]
    host: String,
    #[serde(rename = "$text", default)]
    path: String,
}
