/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core::remote
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Perform every patch-service call under the shared retry
    policy and decode responses into typed documents.

  Security / Safety Notes:
    Credentials are passed through to the transport only; no
    response body is logged beyond counts and identifiers.

  Dependencies:
    quick-xml (via module parsers), tokio-util cancellation.

  Operational Scope:
    Used by the release catalog, resolver and conflict checker;
    owns the only path to the network.

  Revision History:
    2026-10-17 COD  Implemented retrying remote client.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Body decoding happens inside the retry boundary
    - Domain interpretation happens outside it
============================================================*/

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::catalog::ReleaseCatalogDocument;
use crate::conflict::{ConflictCheckDocument, InventoryResolutionDocument};
use crate::error::{Result, SynpatchError};
use crate::installer::Product;
use crate::inventory::Inventory;
use crate::logger::Logger;
use crate::patch::{PatchLookup, PatchSearchResults};
use crate::retry::{with_retry, RetryPolicy};
use crate::service::{Credentials, PatchService, RemoteFailure};

/// Retrying front end over a [`PatchService`].
pub struct RemoteResolutionClient {
    service: Arc<dyn PatchService>,
    policy: RetryPolicy,
    cancel: CancellationToken,
    logger: Arc<Logger>,
}

fn undecodable(what: &str, err: impl std::fmt::Display) -> RemoteFailure {
    RemoteFailure::Transient(format!("Failed to decode {what}: {err}"))
}

impl RemoteResolutionClient {
    pub fn new(
        service: Arc<dyn PatchService>,
        policy: RetryPolicy,
        cancel: CancellationToken,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            service,
            policy,
            cancel,
            logger,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Fetch the complete release catalog.
    pub async fn release_catalog(
        &self,
        credentials: Option<&Credentials>,
    ) -> Result<ReleaseCatalogDocument> {
        let service = self.service.as_ref();
        let document = with_retry(
            &self.policy,
            "release catalog",
            &self.cancel,
            &self.logger,
            move |_| async move {
                let xml = service.release_catalog(credentials).await?;
                ReleaseCatalogDocument::parse(&xml).map_err(|err| undecodable("release catalog", err))
            },
        )
        .await?;
        self.logger.debug(
            "CATALOG",
            format!("Fetched {} releases", document.len()),
        );
        Ok(document)
    }

    /// Recommended patches for one product release.
    pub async fn recommended_patches(
        &self,
        product: Product,
        release_id: &str,
        credentials: Option<&Credentials>,
    ) -> Result<PatchLookup> {
        let service = self.service.as_ref();
        let code = product.code();
        let operation = format!("recommended patches for {product} release {release_id}");
        let results = with_retry(
            &self.policy,
            &operation,
            &self.cancel,
            &self.logger,
            move |_| async move {
                let xml = service.recommended_patches(code, release_id, credentials).await?;
                PatchSearchResults::parse(&xml).map_err(|err| undecodable("recommended patches", err))
            },
        )
        .await?;
        results.into_lookup()
    }

    /// Every published variant of `bug`.
    pub async fn search_patches(
        &self,
        bug: &str,
        credentials: Option<&Credentials>,
    ) -> Result<PatchLookup> {
        let service = self.service.as_ref();
        let operation = format!("search for patch {bug}");
        let results = with_retry(
            &self.policy,
            &operation,
            &self.cancel,
            &self.logger,
            move |_| async move {
                let xml = service.search_patches(bug, credentials).await?;
                PatchSearchResults::parse(&xml).map_err(|err| undecodable("patch search", err))
            },
        )
        .await?;
        results.into_lookup()
    }

    /// Unique patch ids for the installed inventory.
    pub async fn installed_patch_ids(
        &self,
        inventory: &Inventory,
        credentials: &Credentials,
    ) -> Result<Vec<String>> {
        let service = self.service.as_ref();
        let raw = inventory.raw();
        let document = with_retry(
            &self.policy,
            "installed inventory resolution",
            &self.cancel,
            &self.logger,
            move |_| async move {
                let xml = service.resolve_inventory(raw, credentials).await?;
                InventoryResolutionDocument::parse(&xml)
                    .map_err(|err| undecodable("inventory resolution", err))
            },
        )
        .await?;
        document.into_patch_ids()
    }

    /// Submit a conflict-check request document.
    pub async fn check_conflicts(
        &self,
        request: &str,
        credentials: &Credentials,
    ) -> Result<ConflictCheckDocument> {
        let service = self.service.as_ref();
        with_retry(
            &self.policy,
            "conflict check",
            &self.cancel,
            &self.logger,
            move |_| async move {
                let xml = service.check_conflicts(request, credentials).await?;
                ConflictCheckDocument::parse(&xml).map_err(|err| undecodable("conflict check", err))
            },
        )
        .await
    }

    /// Fail with `InvalidCredentials` unless the service accepts `credentials`.
    pub async fn validate_credentials(&self, credentials: &Credentials) -> Result<()> {
        let service = self.service.as_ref();
        let accepted = with_retry(
            &self.policy,
            "credential validation",
            &self.cancel,
            &self.logger,
            move |_| async move { service.validate_credentials(credentials).await },
        )
        .await?;
        if accepted {
            self.logger.info(
                "AUTH",
                format!("Credentials accepted for {}", credentials.user),
            );
            Ok(())
        } else {
            Err(SynpatchError::InvalidCredentials {
                user: credentials.user.clone(),
            })
        }
    }

    pub fn host(&self) -> &str {
        self.service.host()
    }
}
