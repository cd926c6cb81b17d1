/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core::tests::patch_engine
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Drive the patch engine end to end against a scripted
    patch service: overlays, retries, conflicts, manifest.

  Security / Safety Notes:
    No network access; the service is an in-process fake and
    manifests are written to temporary directories.

  Dependencies:
    tempfile for scratch directories, async-trait for the fake.

  Operational Scope:
    Integration tests only; run with the crate's test suite.

  Revision History:
    2026-10-17 COD  Authored engine integration tests.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Whole pipeline exercised through the public API
    - Deterministic fixtures, no external services
============================================================*/

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use synpatch_core::installer::{Architecture, InstallerCatalog, InstallerType};
use synpatch_core::inventory::Inventory;
use synpatch_core::logger::Logger;
use synpatch_core::manifest::{build_manifest, write_manifest, DirectoryCache};
use synpatch_core::retry::RetryPolicy;
use synpatch_core::service::{Credentials, PatchService, RemoteFailure, RemoteResult};
use synpatch_core::{PatchEngine, ResolveRequest, SynpatchError};

const WLS_BASE: &str = "600000000073715";
const WLS_PSU: &str = "600000000116234";

/// Patch service answering from canned XML keyed by request.
struct ScriptedService {
    responses: HashMap<String, String>,
    flaky_searches: Mutex<usize>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedService {
    fn new(conflicts: &str) -> Self {
        let mut responses = HashMap::new();
        responses.insert(
            "catalog".to_string(),
            format!(
                r#"<results>
  <release id="{WLS_BASE}" name="Oracle WebLogic Server 12.2.1.4.0"/>
  <release id="{WLS_PSU}" name="Oracle WebLogic Server 12.2.1.4.240104"/>
  <release id="80121410" name="Oracle Coherence 12.2.1.4.0"/>
</results>"#
            ),
        );
        responses.insert(
            format!("recommended:15991:{WLS_BASE}"),
            document(&[
                record("35893811", WLS_BASE, "12.2.1.4.0", "WLS PATCH SET UPDATE 12.2.1.4.240104", "Oracle WebLogic Server 12.2.1.4.240104"),
                record("34809489", WLS_BASE, "12.2.1.4.0", "ADR FOR WEBLOGIC SERVER", ""),
            ]),
        );
        responses.insert(
            format!("recommended:15991:{WLS_PSU}"),
            document(&[record("36068046", WLS_PSU, "12.2.1.4.240104", "OVERLAY FIX", "")]),
        );
        responses.insert(
            "search:33416868".to_string(),
            document(&[
                record("33416868", "600000000063541", "12.2.1.3.0", "ONE-OFF", ""),
                record("33416868", WLS_PSU, "12.2.1.4.240104", "ONE-OFF", ""),
            ]),
        );
        responses.insert(
            "inventory".to_string(),
            r#"<results><patch unique_patch_id="23869477"/></results>"#.to_string(),
        );
        responses.insert("conflicts".to_string(), conflicts.to_string());
        Self {
            responses,
            flaky_searches: Mutex::new(1),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn answer(&self, key: &str) -> RemoteResult<String> {
        self.requests.lock().unwrap().push(key.to_string());
        Ok(self
            .responses
            .get(key)
            .cloned()
            .unwrap_or_else(|| "<results></results>".to_string()))
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn record(bug: &str, release: &str, name: &str, summary: &str, psu: &str) -> String {
    format!(
        r#"<patch>
  <bug><number>{bug}</number><abstract>{summary}</abstract></bug>
  <product id="15991">WebLogic</product>
  <release id="{release}" name="{name}">{name}</release>
  <platform id="2000">Generic</platform>
  <psu_bundle>{psu}</psu_bundle>
  <files><file><download_url host="https://updates.example.com">/Orion/Services/download/p{bug}.zip?aru=1&amp;patch_file=p{bug}_{release}.zip</download_url></file></files>
</patch>"#
    )
}

fn document(records: &[String]) -> String {
    format!("<results>{}</results>", records.join(""))
}

#[async_trait]
impl PatchService for ScriptedService {
    async fn release_catalog(&self, _credentials: Option<&Credentials>) -> RemoteResult<String> {
        self.answer("catalog")
    }

    async fn recommended_patches(
        &self,
        product_code: &str,
        release_id: &str,
        _credentials: Option<&Credentials>,
    ) -> RemoteResult<String> {
        self.answer(&format!("recommended:{product_code}:{release_id}"))
    }

    async fn search_patches(&self, bug: &str, _credentials: Option<&Credentials>) -> RemoteResult<String> {
        {
            let mut flaky = self.flaky_searches.lock().unwrap();
            if *flaky > 0 {
                *flaky -= 1;
                self.requests.lock().unwrap().push(format!("search:{bug}"));
                return Err(RemoteFailure::Transient("502 Bad Gateway".to_string()));
            }
        }
        self.answer(&format!("search:{bug}"))
    }

    async fn resolve_inventory(&self, _inventory: &str, _credentials: &Credentials) -> RemoteResult<String> {
        self.answer("inventory")
    }

    async fn check_conflicts(&self, _request: &str, _credentials: &Credentials) -> RemoteResult<String> {
        self.answer("conflicts")
    }

    async fn validate_credentials(&self, credentials: &Credentials) -> RemoteResult<bool> {
        self.requests.lock().unwrap().push("validate".to_string());
        Ok(credentials.password() == "welcome1")
    }

    fn host(&self) -> &str {
        "updates.example.com"
    }
}

fn engine(service: Arc<ScriptedService>) -> PatchEngine {
    PatchEngine::with_service(
        service,
        RetryPolicy::new(3, Duration::from_millis(1)),
        InstallerCatalog::default(),
        Arc::new(Logger::silent()),
        CancellationToken::new(),
    )
}

fn update_request() -> ResolveRequest {
    ResolveRequest {
        recommended: true,
        patch_ids: vec!["33416868".to_string()],
        inventory: Some(Inventory::parse(
            "31960985;23869477;WLS PATCH SET UPDATE 12.2.1.4.201001",
        )),
        ..ResolveRequest::new(InstallerType::Wls, "12.2.1.4.0", Architecture::Amd64)
    }
}

#[tokio::test]
async fn update_resolves_recommended_overlays_and_user_patches() {
    let service = Arc::new(ScriptedService::new("<conflict_check><conflict_sets/></conflict_check>"));
    let credentials = Credentials::new("ops@example.com", "welcome1");
    let resolution = engine(service.clone())
        .run(&update_request(), Some(&credentials))
        .await
        .expect("clean patch set");

    let keys: Vec<String> = resolution.patches.iter().map(|patch| patch.key()).collect();
    assert_eq!(
        keys,
        vec![
            "35893811_12.2.1.4.0",
            "34809489_12.2.1.4.0",
            "36068046_12.2.1.4.240104",
            "33416868_12.2.1.4.240104",
        ]
    );

    let requests = service.requests();
    assert_eq!(requests.first().map(String::as_str), Some("validate"));
    assert_eq!(requests.iter().filter(|r| *r == "catalog").count(), 1);
    assert_eq!(requests.iter().filter(|r| *r == "search:33416868").count(), 2);
    assert_eq!(
        &requests[requests.len() - 2..],
        &["inventory".to_string(), "conflicts".to_string()]
    );

    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("p34809489_600000000073715.zip"), b"zip").expect("seed cache");
    let document = build_manifest(
        InstallerType::Wls,
        "12.2.1.4.0",
        Architecture::Amd64,
        &resolution,
        &DirectoryCache::new(dir.path()),
        &Logger::silent(),
    );
    let path = dir.path().join("patches.json");
    write_manifest(&document, &path).expect("manifest written");
    assert_eq!(document.metadata.total_patches, 4);
    assert_eq!(document.metadata.cached_patches, 1);
    assert!(path.exists());
}

#[tokio::test]
async fn conflicting_patch_set_is_rejected() {
    let service = Arc::new(ScriptedService::new(
        r#"<conflict_check><conflict_sets><conflict_set><patch bug="34809489"/><patch bug="33416868"/></conflict_set></conflict_sets></conflict_check>"#,
    ));
    let credentials = Credentials::new("ops@example.com", "welcome1");
    let err = engine(service)
        .run(&update_request(), Some(&credentials))
        .await
        .expect_err("conflict expected");
    assert!(matches!(err, SynpatchError::PatchConflict { .. }));
    assert!(err.to_string().contains("[34809489,33416868]"));
}

#[tokio::test]
async fn without_credentials_the_conflict_check_is_skipped() {
    let service = Arc::new(ScriptedService::new("unused"));
    let resolution = engine(service.clone())
        .run(&update_request(), None)
        .await
        .expect("resolution without credentials");
    assert_eq!(resolution.patches.len(), 4);
    let requests = service.requests();
    assert!(!requests.iter().any(|r| r == "validate" || r == "conflicts" || r == "inventory"));
}
