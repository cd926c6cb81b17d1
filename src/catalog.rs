/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core::catalog
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Map (product, version) pairs to the release identifiers the
    patch service uses to scope its queries.

  Security / Safety Notes:
    The catalog is public metadata; it is cached in memory
    only and never persisted.

  Dependencies:
    quick-xml (serde) for decoding, tokio OnceCell for a
    single-flight fetch.

  Operational Scope:
    Owned by one engine; the first lookup fetches the catalog,
    later lookups are pure prefix scans.

  Revision History:
    2026-10-17 COD  Implemented fetch-once release catalog.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Concurrent first lookups trigger exactly one fetch
    - A failed fetch is not cached
============================================================*/

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::error::Result;
use crate::installer::Product;
use crate::logger::Logger;
use crate::remote::RemoteResolutionClient;
use crate::service::Credentials;

/// Opaque release identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseId(String);

impl ReleaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a catalog lookup. `NotFound` means no release is published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseLookup {
    Found(ReleaseId),
    NotFound,
}

/// Decoded `<results><release id=".." name=".."/>...</results>` catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseCatalogDocument {
    #[serde(rename = "release", default)]
    releases: Vec<ReleaseEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReleaseEntry {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@name", default)]
    name: String,
}

impl ReleaseCatalogDocument {
    pub(crate) fn parse(xml: &str) -> std::result::Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(xml)
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// First release whose name starts with `prefix`, in document order.
    pub fn lookup_prefix(&self, prefix: &str) -> ReleaseLookup {
        self.releases
            .iter()
            .find(|entry| entry.name.starts_with(prefix))
            .map(|entry| ReleaseLookup::Found(ReleaseId::new(entry.id.trim())))
            .unwrap_or(ReleaseLookup::NotFound)
    }
}

/// Fetch-once view of the release catalog.
pub struct ReleaseCatalog {
    remote: Arc<RemoteResolutionClient>,
    document: OnceCell<ReleaseCatalogDocument>,
    logger: Arc<Logger>,
}

impl ReleaseCatalog {
    pub fn new(remote: Arc<RemoteResolutionClient>, logger: Arc<Logger>) -> Self {
        Self {
            remote,
            document: OnceCell::new(),
            logger,
        }
    }

    async fn document(&self, credentials: Option<&Credentials>) -> Result<&ReleaseCatalogDocument> {
        self.document
            .get_or_try_init(|| self.remote.release_catalog(credentials))
            .await
    }

    /// Release id for `<product description> <version>`.
    pub async fn release_number(
        &self,
        product: Product,
        version: &str,
        credentials: Option<&Credentials>,
    ) -> Result<ReleaseLookup> {
        self.release_named(&format!("{} {}", product.description(), version), credentials)
            .await
    }

    /// Release id for an exact release-name prefix, e.g. a PSU bundle name.
    pub async fn release_named(
        &self,
        name: &str,
        credentials: Option<&Credentials>,
    ) -> Result<ReleaseLookup> {
        let lookup = self.document(credentials).await?.lookup_prefix(name);
        match &lookup {
            ReleaseLookup::Found(id) => {
                self.logger
                    .debug("RELEASE", format!("{name} resolved to release {id}"));
            }
            ReleaseLookup::NotFound => {
                self.logger
                    .debug("RELEASE", format!("No release published for {name}"));
            }
        }
        Ok(lookup)
    }
}
