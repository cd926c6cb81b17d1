/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core::engine
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Wire configuration, transport, catalog, resolver and
    conflict checker into one explicit engine value.

  Security / Safety Notes:
    Credentials are validated before any patch query when
    supplied; they are borrowed per call and never stored.

  Dependencies:
    tokio-util cancellation shared with the retry loop.

  Operational Scope:
    One engine per build or update session; may be shared via
    Arc between concurrent callers.

  Revision History:
    2026-10-17 COD  Assembled the patch engine.
  ------------------------------------------------------------
  SSE Principles Observed:
    - No global state; every collaborator is owned here
    - Validate, resolve, verify in a fixed order
============================================================*/

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::catalog::ReleaseCatalog;
use crate::config::SynpatchConfig;
use crate::conflict::ConflictChecker;
use crate::error::Result;
use crate::installer::InstallerCatalog;
use crate::logger::Logger;
use crate::remote::RemoteResolutionClient;
use crate::resolver::{PatchSetResolver, Resolution, ResolveRequest};
use crate::retry::RetryPolicy;
use crate::service::{Credentials, HttpPatchService, PatchService};

/// Patch resolution and verification session.
pub struct PatchEngine {
    remote: Arc<RemoteResolutionClient>,
    catalog: Arc<ReleaseCatalog>,
    resolver: PatchSetResolver,
    checker: ConflictChecker,
    logger: Arc<Logger>,
}

impl PatchEngine {
    /// Engine talking HTTP to the configured patch service.
    pub fn new(config: &SynpatchConfig, logger: Arc<Logger>, cancel: CancellationToken) -> Result<Self> {
        let service = Arc::new(HttpPatchService::new(&config.remote)?);
        Ok(Self::with_service(
            service,
            config.remote.retry_policy(),
            config.installer_catalog()?,
            logger,
            cancel,
        ))
    }

    /// Engine over an arbitrary transport.
    pub fn with_service(
        service: Arc<dyn PatchService>,
        policy: RetryPolicy,
        installers: InstallerCatalog,
        logger: Arc<Logger>,
        cancel: CancellationToken,
    ) -> Self {
        let remote = Arc::new(RemoteResolutionClient::new(
            service,
            policy,
            cancel,
            logger.clone(),
        ));
        let catalog = Arc::new(ReleaseCatalog::new(remote.clone(), logger.clone()));
        let resolver = PatchSetResolver::new(
            remote.clone(),
            catalog.clone(),
            installers,
            logger.clone(),
        );
        let checker = ConflictChecker::new(remote.clone(), logger.clone());
        Self {
            remote,
            catalog,
            resolver,
            checker,
            logger,
        }
    }

    pub fn catalog(&self) -> &ReleaseCatalog {
        &self.catalog
    }

    pub fn resolver(&self) -> &PatchSetResolver {
        &self.resolver
    }

    pub fn checker(&self) -> &ConflictChecker {
        &self.checker
    }

    pub fn cancellation(&self) -> &CancellationToken {
        self.remote.cancellation()
    }

    /// Validate credentials, resolve the patch set, then verify it is conflict free.
    pub async fn run(
        &self,
        request: &ResolveRequest,
        credentials: Option<&Credentials>,
    ) -> Result<Resolution> {
        self.logger.info(
            "ENGINE",
            format!(
                "Resolving patches for {:?} {} ({:?}) against {}",
                request.installer,
                request.version,
                request.architecture,
                self.remote.host()
            ),
        );
        if let Some(credentials) = credentials {
            self.remote.validate_credentials(credentials).await?;
        }

        let resolution = self.resolver.resolve(request, credentials).await?;
        self.checker
            .validate(
                request.inventory.as_ref(),
                &resolution.patches,
                request.architecture,
                credentials,
            )
            .await?;
        Ok(resolution)
    }
}
