use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityType {
    Model,
    Tool,
    Pipeline,
    Service,
}

impl std::fmt::Display for CapabilityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Tool => write!(f, "tool"),
            Self::Pipeline => write!(f, "pipeline"),
            Self::Service => write!(f, "service"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityStatus {
    Active,
    Beta,
    Deprecated,
    #[serde(other)]
    Unknown,
}

impl CapabilityStatus {
    /// Active and beta capabilities take part in benchmarking.
    pub fn is_auditable(self) -> bool {
        matches!(self, Self::Active | Self::Beta)
    }
}

impl std::fmt::Display for CapabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Beta => write!(f, "beta"),
            Self::Deprecated => write!(f, "deprecated"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for CapabilityStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "beta" => Ok(Self::Beta),
            "deprecated" => Ok(Self::Deprecated),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Cost, latency and quality of a capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Performance {
    /// USD per 1000 tokens (or units, for non-text capabilities).
    pub cost_per_1k_tokens_usd: f64,
    pub avg_latency_ms: f64,
    /// Normalized quality score in [0, 1].
    pub quality_score_0_to_1: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Usage {
    /// Zero means "unknown"; the audit falls back to per-tag defaults.
    #[serde(default)]
    pub estimated_monthly_calls: u64,
    #[serde(default)]
    pub used_by_services: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Links {
    pub docs_url: Option<String>,
    pub repo_url: Option<String>,
    pub runbook_url: Option<String>,
}

/// Field name to type name, e.g. `{ text = "string" }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Interfaces {
    #[serde(default)]
    pub input: Vec<BTreeMap<String, String>>,
    #[serde(default)]
    pub output: Vec<BTreeMap<String, String>>,
}

/// A cataloged model, tool, pipeline or service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Capability {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CapabilityType,
    pub provider: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: CapabilityStatus,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub interfaces: Interfaces,
    pub performance: Performance,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default)]
    pub links: Links,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl Capability {
    pub fn cost(&self) -> f64 {
        self.performance.cost_per_1k_tokens_usd
    }

    pub fn latency_ms(&self) -> f64 {
        self.performance.avg_latency_ms
    }

    pub fn quality(&self) -> f64 {
        self.performance.quality_score_0_to_1
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Case-insensitive substring match on id, name or provider.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.id.to_lowercase().contains(&q)
            || self.name.to_lowercase().contains(&q)
            || self.provider.to_lowercase().contains(&q)
    }
}
