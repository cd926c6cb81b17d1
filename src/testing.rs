//! In-memory patch service and XML builders shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::service::{Credentials, PatchService, RemoteFailure, RemoteResult};

#[derive(Default)]
pub(crate) struct FakePatchService {
    catalog: String,
    recommended: HashMap<(String, String), String>,
    searches: HashMap<String, String>,
    inventory: String,
    conflicts: String,
    valid_password: Option<String>,
    transient_failures: Mutex<HashMap<String, usize>>,
    calls: Mutex<Vec<String>>,
    conflict_requests: Mutex<Vec<String>>,
}

impl FakePatchService {
    pub(crate) fn with_catalog(mut self, xml: &str) -> Self {
        self.catalog = xml.to_string();
        self
    }

    pub(crate) fn with_recommended(mut self, product_code: &str, release_id: &str, xml: &str) -> Self {
        self.recommended
            .insert((product_code.to_string(), release_id.to_string()), xml.to_string());
        self
    }

    pub(crate) fn with_search(mut self, bug: &str, xml: &str) -> Self {
        self.searches.insert(bug.to_string(), xml.to_string());
        self
    }

    pub(crate) fn with_inventory(mut self, xml: &str) -> Self {
        self.inventory = xml.to_string();
        self
    }

    pub(crate) fn with_conflicts(mut self, xml: &str) -> Self {
        self.conflicts = xml.to_string();
        self
    }

    pub(crate) fn with_password(mut self, password: &str) -> Self {
        self.valid_password = Some(password.to_string());
        self
    }

    /// Make the next `count` calls of `operation` fail transiently.
    pub(crate) fn with_transient_failures(self, operation: &str, count: usize) -> Self {
        self.transient_failures
            .lock()
            .unwrap()
            .insert(operation.to_string(), count);
        self
    }

    /// Operations invoked so far, failed attempts included.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn last_conflict_request(&self) -> Option<String> {
        self.conflict_requests.lock().unwrap().last().cloned()
    }

    fn record(&self, operation: &str) -> RemoteResult<()> {
        self.calls.lock().unwrap().push(operation.to_string());
        let mut failures = self.transient_failures.lock().unwrap();
        match failures.get_mut(operation) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(RemoteFailure::Transient(format!("{operation}: connection reset")))
            }
            _ => Ok(()),
        }
    }
}

fn empty_results() -> String {
    "<results></results>".to_string()
}

#[async_trait]
impl PatchService for FakePatchService {
    async fn release_catalog(&self, _credentials: Option<&Credentials>) -> RemoteResult<String> {
        self.record("catalog")?;
        Ok(self.catalog.clone())
    }

    async fn recommended_patches(
        &self,
        product_code: &str,
        release_id: &str,
        _credentials: Option<&Credentials>,
    ) -> RemoteResult<String> {
        self.record(&format!("recommended:{product_code}:{release_id}"))?;
        Ok(self
            .recommended
            .get(&(product_code.to_string(), release_id.to_string()))
            .cloned()
            .unwrap_or_else(empty_results))
    }

    async fn search_patches(
        &self,
        bug: &str,
        _credentials: Option<&Credentials>,
    ) -> RemoteResult<String> {
        self.record(&format!("search:{bug}"))?;
        Ok(self.searches.get(bug).cloned().unwrap_or_else(empty_results))
    }

    async fn resolve_inventory(
        &self,
        _inventory: &str,
        _credentials: &Credentials,
    ) -> RemoteResult<String> {
        self.record("inventory")?;
        Ok(self.inventory.clone())
    }

    async fn check_conflicts(
        &self,
        request: &str,
        _credentials: &Credentials,
    ) -> RemoteResult<String> {
        self.record("conflicts")?;
        self.conflict_requests
            .lock()
            .unwrap()
            .push(request.to_string());
        Ok(self.conflicts.clone())
    }

    async fn validate_credentials(&self, credentials: &Credentials) -> RemoteResult<bool> {
        self.record("validate")?;
        Ok(self.valid_password.as_deref() == Some(credentials.password()))
    }

    fn host(&self) -> &str {
        "updates.example.com"
    }
}

/// One `<patch>` record in the service's search format.
pub(crate) struct PatchXml<'a> {
    pub bug: &'a str,
    pub product: &'a str,
    pub release_id: &'a str,
    pub release_name: &'a str,
    pub platform: &'a str,
    pub description: &'a str,
    pub psu_bundle: Option<&'a str>,
}

impl<'a> PatchXml<'a> {
    pub(crate) fn new(bug: &'a str, release_id: &'a str, release_name: &'a str) -> Self {
        Self {
            bug,
            product: "15991",
            release_id,
            release_name,
            platform: "2000",
            description: "ONE-OFF PATCH",
            psu_bundle: None,
        }
    }

    pub(crate) fn product(mut self, product: &'a str) -> Self {
        self.product = product;
        self
    }

    pub(crate) fn platform(mut self, platform: &'a str) -> Self {
        self.platform = platform;
        self
    }

    pub(crate) fn description(mut self, description: &'a str) -> Self {
        self.description = description;
        self
    }

    pub(crate) fn psu(mut self, bundle: &'a str) -> Self {
        self.psu_bundle = Some(bundle);
        self
    }

    pub(crate) fn render(&self) -> String {
        let file = format!("p{}_{}_Generic.zip", self.bug, self.release_name.replace('.', ""));
        format!(
            r#"<patch>
  <bug><number>{bug}</number><abstract>{description}</abstract></bug>
  <product id="{product}">product</product>
  <release id="{release_id}" name="{release_name}">release</release>
  <platform id="{platform}">platform</platform>
  <psu_bundle>{psu}</psu_bundle>
  <access>Open access</access>
  <life_cycle>Recommended</life_cycle>
  <files><file><download_url host="https://updates.example.com">/Orion/Services/download/{file}?aru=1&amp;patch_file={file}</download_url></file></files>
</patch>"#,
            bug = self.bug,
            description = self.description,
            product = self.product,
            release_id = self.release_id,
            release_name = self.release_name,
            platform = self.platform,
            psu = self.psu_bundle.unwrap_or_default(),
            file = file,
        )
    }
}

/// Wrap rendered patches in a `<results>` document.
pub(crate) fn results(patches: &[PatchXml<'_>]) -> String {
    let body: Vec<String> = patches.iter().map(PatchXml::render).collect();
    format!("<results>\n{}\n</results>", body.join("\n"))
}
