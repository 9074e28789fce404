use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::capability::Capability;
use crate::error::{AuditError, Result};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    capability: Vec<Capability>,
}

/// Load a catalog file. `.json` files hold a plain array of capabilities,
/// anything else is read as TOML with `[[capability]]` tables.
pub fn load_catalog(path: &Path) -> Result<Vec<Capability>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AuditError::Io(format!("{}: {e}", path.display())))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        parse_catalog_json(&content)
    } else {
        parse_catalog(&content)
    }
}

/// Parse a TOML catalog. Entry order is preserved.
pub fn parse_catalog(toml_str: &str) -> Result<Vec<Capability>> {
    let file: CatalogFile =
        toml::from_str(toml_str).map_err(|e| AuditError::parse("catalog", e))?;
    validate(&file.capability)?;
    Ok(file.capability)
}

pub fn parse_catalog_json(json: &str) -> Result<Vec<Capability>> {
    let caps: Vec<Capability> = serde_json::from_str(json)?;
    validate(&caps)?;
    Ok(caps)
}

/// Load the bundled capabilities.toml from the data/ directory.
pub fn load_bundled_catalog() -> Result<Vec<Capability>> {
    let toml_str = include_str!("../../../data/capabilities.toml");
    parse_catalog(toml_str)
}

/// Check the invariants the audit relies on: unique ids, non-negative
/// cost and latency, quality within [0, 1].
pub fn validate(caps: &[Capability]) -> Result<()> {
    let mut seen = HashSet::new();
    for cap in caps {
        if cap.id.trim().is_empty() {
            return Err(AuditError::InvalidCatalog(format!(
                "capability '{}' has an empty id",
                cap.name
            )));
        }
        if !seen.insert(cap.id.as_str()) {
            return Err(AuditError::InvalidCatalog(format!("duplicate id: {}", cap.id)));
        }
        let p = &cap.performance;
        if !p.cost_per_1k_tokens_usd.is_finite() || p.cost_per_1k_tokens_usd < 0.0 {
            return Err(AuditError::InvalidCatalog(format!(
                "{}: cost_per_1k_tokens_usd must be >= 0, got {}",
                cap.id, p.cost_per_1k_tokens_usd
            )));
        }
        if !p.avg_latency_ms.is_finite() || p.avg_latency_ms < 0.0 {
            return Err(AuditError::InvalidCatalog(format!(
                "{}: avg_latency_ms must be >= 0, got {}",
                cap.id, p.avg_latency_ms
            )));
        }
        if !(0.0..=1.0).contains(&p.quality_score_0_to_1) {
            return Err(AuditError::InvalidCatalog(format!(
                "{}: quality_score_0_to_1 must be in [0, 1], got {}",
                cap.id, p.quality_score_0_to_1
            )));
        }
    }
    Ok(())
}

pub fn find<'a>(caps: &'a [Capability], id: &str) -> Option<&'a Capability> {
    caps.iter().find(|c| c.id == id)
}

/// Every tag in the catalog, in first-seen order.
pub fn all_tags(caps: &[Capability]) -> Vec<&str> {
    let mut seen = HashSet::new();
    caps.iter()
        .flat_map(|c| c.tags.iter())
        .map(String::as_str)
        .filter(|t| seen.insert(*t))
        .collect()
}

/// `(capability id, alternative id)` pairs whose alternative is not in the catalog.
pub fn dangling_alternatives(caps: &[Capability]) -> Vec<(&str, &str)> {
    let ids: HashSet<&str> = caps.iter().map(|c| c.id.as_str()).collect();
    caps.iter()
        .flat_map(|c| {
            c.alternatives
                .iter()
                .filter(|alt| !ids.contains(alt.as_str()))
                .map(move |alt| (c.id.as_str(), alt.as_str()))
        })
        .collect()
}
