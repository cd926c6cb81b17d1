/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core::installer
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Describe installer types, the middleware products each one
    lays down, and the architecture codes used by the patch
    service to scope platform-specific patches.

  Security / Safety Notes:
    Static lookup tables only; no I/O performed in this module.

  Dependencies:
    serde for configuration and manifest representation.

  Operational Scope:
    Consulted by the resolver to enumerate products and to
    filter search results to the target platform.

  Revision History:
    2026-10-17 COD  Added installer and architecture tables.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Single source of truth for product codes
    - Deterministic ordering of product enumeration
============================================================*/

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SynpatchError;

/// Middleware product as known to the patch service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Product {
    Wls,
    Coh,
    Fmwplat,
    Jdev,
    Fit,
    Opss,
    Owsm,
    Jrf,
    Soa,
    Osb,
    Ohs,
    Wlsplugin,
}

impl Product {
    /// Product id used in recommended-patch queries.
    pub fn code(self) -> &'static str {
        match self {
            Product::Wls => "15991",
            Product::Coh => "13964",
            Product::Fmwplat => "27638",
            Product::Jdev => "11281",
            Product::Fit => "33256",
            Product::Opss => "16606",
            Product::Owsm => "12787",
            Product::Jrf => "10120",
            Product::Soa => "12745",
            Product::Osb => "10086",
            Product::Ohs => "10600",
            Product::Wlsplugin => "15956",
        }
    }

    /// Release-catalog description prefix.
    pub fn description(self) -> &'static str {
        match self {
            Product::Wls => "Oracle WebLogic Server",
            Product::Coh => "Oracle Coherence",
            Product::Fmwplat => "Oracle FMW Platform",
            Product::Jdev => "Oracle JDeveloper",
            Product::Fit => "Oracle Fusion Middleware Infrastructure Tools",
            Product::Opss => "Oracle Platform Security Service",
            Product::Owsm => "Oracle Webservices Manager",
            Product::Jrf => "Oracle Java Required Files",
            Product::Soa => "Oracle SOA Suite",
            Product::Osb => "Oracle Service Bus",
            Product::Ohs => "Oracle HTTP Server",
            Product::Wlsplugin => "Oracle WebLogic Server Proxy Plug-In",
        }
    }

    /// Product whose version numbering this product's patch line follows.
    pub fn version_source(self) -> Option<Product> {
        match self {
            Product::Wlsplugin => Some(Product::Ohs),
            _ => None,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        ALL_PRODUCTS.iter().copied().find(|p| p.code() == code)
    }
}

impl FromStr for Product {
    type Err = SynpatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        ALL_PRODUCTS
            .iter()
            .copied()
            .find(|p| format!("{p:?}").to_ascii_uppercase() == upper)
            .ok_or_else(|| SynpatchError::Config(format!("Unknown product `{s}`")))
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

const ALL_PRODUCTS: [Product; 12] = [
    Product::Wls,
    Product::Coh,
    Product::Fmwplat,
    Product::Jdev,
    Product::Fit,
    Product::Opss,
    Product::Owsm,
    Product::Jrf,
    Product::Soa,
    Product::Osb,
    Product::Ohs,
    Product::Wlsplugin,
];

/// Installer bundle that determines which products are patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstallerType {
    Wls,
    Fmw,
    Soa,
    Osb,
    Ohs,
}

impl InstallerType {
    /// Products laid down by the installer, base product first.
    pub fn products(self) -> &'static [Product] {
        match self {
            InstallerType::Wls => &[Product::Wls, Product::Coh],
            InstallerType::Fmw => &[
                Product::Wls,
                Product::Coh,
                Product::Jrf,
                Product::Fmwplat,
                Product::Fit,
                Product::Opss,
                Product::Owsm,
            ],
            InstallerType::Soa => &[
                Product::Wls,
                Product::Coh,
                Product::Jrf,
                Product::Fmwplat,
                Product::Fit,
                Product::Opss,
                Product::Owsm,
                Product::Soa,
            ],
            InstallerType::Osb => &[
                Product::Wls,
                Product::Coh,
                Product::Jrf,
                Product::Fmwplat,
                Product::Fit,
                Product::Opss,
                Product::Owsm,
                Product::Osb,
            ],
            InstallerType::Ohs => &[
                Product::Ohs,
                Product::Opss,
                Product::Fmwplat,
                Product::Wlsplugin,
            ],
        }
    }

    /// Product whose PSU defines the PSU level of the whole installation.
    pub fn base_product(self) -> Product {
        self.products()[0]
    }

    /// Patch descriptions published under this installer's releases but not applicable to it.
    pub fn excluded_descriptions(self) -> &'static [&'static str] {
        match self {
            InstallerType::Ohs => &["WLS PLUGIN"],
            _ => &[],
        }
    }
}

impl FromStr for InstallerType {
    type Err = SynpatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WLS" => Ok(InstallerType::Wls),
            "FMW" => Ok(InstallerType::Fmw),
            "SOA" => Ok(InstallerType::Soa),
            "OSB" => Ok(InstallerType::Osb),
            "OHS" => Ok(InstallerType::Ohs),
            other => Err(SynpatchError::Config(format!(
                "Unknown installer type `{other}`"
            ))),
        }
    }
}

/// Platform code for patches that apply to every architecture.
pub const GENERIC_PLATFORM: &str = "2000";

/// Target image architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    #[default]
    Generic,
    Amd64,
    Arm64,
}

impl Architecture {
    pub fn platform_code(self) -> &'static str {
        match self {
            Architecture::Generic => GENERIC_PLATFORM,
            Architecture::Amd64 => "226",
            Architecture::Arm64 => "541",
        }
    }

    /// Whether a patch built for `platform` can be applied on this architecture.
    pub fn accepts(self, platform: &str) -> bool {
        platform == GENERIC_PLATFORM || platform == self.platform_code()
    }
}

impl FromStr for Architecture {
    type Err = SynpatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" => Ok(Architecture::Generic),
            "amd64" | "x86_64" => Ok(Architecture::Amd64),
            "arm64" | "aarch64" => Ok(Architecture::Arm64),
            other => Err(SynpatchError::Config(format!(
                "Unknown architecture `{other}`"
            ))),
        }
    }
}

/// Installer metadata plus operator-supplied base version overrides.
#[derive(Debug, Clone, Default)]
pub struct InstallerCatalog {
    base_versions: BTreeMap<Product, String>,
}

impl InstallerCatalog {
    pub fn new(base_versions: BTreeMap<Product, String>) -> Self {
        Self { base_versions }
    }

    pub fn products(&self, installer: InstallerType) -> &'static [Product] {
        installer.products()
    }

    /// Version used to look up `product`'s release for an installation at `version`.
    ///
    /// A configured override wins; otherwise a product that follows another
    /// product's numbering uses that product's override, falling back to the
    /// installer version.
    pub fn lookup_version(&self, product: Product, version: &str) -> String {
        if let Some(explicit) = self.base_versions.get(&product) {
            return explicit.clone();
        }
        product
            .version_source()
            .and_then(|source| self.base_versions.get(&source))
            .cloned()
            .unwrap_or_else(|| version.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_patches_apply_everywhere() {
        assert!(Architecture::Arm64.accepts(GENERIC_PLATFORM));
        assert!(Architecture::Amd64.accepts("226"));
        assert!(!Architecture::Amd64.accepts("541"));
        assert!(!Architecture::Generic.accepts("226"));
    }

    #[test]
    fn base_product_is_first() {
        assert_eq!(InstallerType::Soa.base_product(), Product::Wls);
        assert_eq!(InstallerType::Ohs.base_product(), Product::Ohs);
    }

    #[test]
    fn lookup_version_honours_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert(Product::Ohs, "12.2.1.4.0".to_string());
        let catalog = InstallerCatalog::new(overrides);
        assert_eq!(catalog.lookup_version(Product::Wlsplugin, "14.1.1.0.0"), "12.2.1.4.0");
        assert_eq!(catalog.lookup_version(Product::Opss, "14.1.1.0.0"), "14.1.1.0.0");
    }

    #[test]
    fn parses_installer_and_architecture_names() {
        assert_eq!("fmw".parse::<InstallerType>().unwrap(), InstallerType::Fmw);
        assert_eq!("aarch64".parse::<Architecture>().unwrap(), Architecture::Arm64);
        assert!("mips".parse::<Architecture>().is_err());
    }

    #[test]
    fn product_codes_round_trip() {
        assert_eq!(Product::from_code("15991"), Some(Product::Wls));
        assert_eq!(Product::from_code("0"), None);
        assert_eq!("wlsplugin".parse::<Product>().unwrap(), Product::Wlsplugin);
    }
}
