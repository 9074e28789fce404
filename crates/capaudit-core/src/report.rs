use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::audit::{self, Recommendation};
use crate::capability::{Capability, CapabilityStatus};
use crate::catalog;
use crate::config::AuditConfig;
use crate::error::Result;

/// Benchmarks and recommendations for one tag.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TagGroupAnalysis<'a> {
    pub tag: &'a str,
    pub cheapest: &'a Capability,
    pub fastest: &'a Capability,
    pub best_quality: &'a Capability,
    pub recommendations: Vec<Recommendation>,
}

impl TagGroupAnalysis<'_> {
    pub fn total_savings(&self) -> f64 {
        self.recommendations.iter().map(|r| r.potential_savings).sum()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport<'a> {
    pub timestamp: DateTime<Utc>,
    pub total_capabilities: usize,
    /// Active and beta.
    pub active_count: usize,
    pub deprecated_count: usize,
    pub deprecated_items: Vec<&'a Capability>,
    /// Sorted by total potential savings, largest first.
    pub tag_groups: Vec<TagGroupAnalysis<'a>>,
}

impl AuditReport<'_> {
    pub fn total_potential_savings(&self) -> f64 {
        self.tag_groups.iter().map(TagGroupAnalysis::total_savings).sum()
    }

    pub fn recommendation_count(&self) -> usize {
        self.tag_groups.iter().map(|g| g.recommendations.len()).sum()
    }
}

/// Audit a catalog snapshot, stamped with the current time.
pub fn generate_report<'a>(caps: &'a [Capability], config: &AuditConfig) -> AuditReport<'a> {
    generate_report_at(caps, config, Utc::now())
}

/// Validate the catalog and config before auditing. For inputs that did not
/// come through the catalog and config loaders.
pub fn generate_validated_report<'a>(
    caps: &'a [Capability],
    config: &AuditConfig,
) -> Result<AuditReport<'a>> {
    catalog::validate(caps)?;
    config.validate()?;
    Ok(generate_report(caps, config))
}

/// Audit a catalog snapshot. Deterministic for a given `timestamp`.
pub fn generate_report_at<'a>(
    caps: &'a [Capability],
    config: &AuditConfig,
    timestamp: DateTime<Utc>,
) -> AuditReport<'a> {
    let mut tag_groups = Vec::new();
    for group in audit::group_by_tag(caps) {
        let Some(b) = audit::select_benchmarks(&group) else {
            continue;
        };
        tracing::debug!(
            tag = group.tag,
            members = group.members.len(),
            cheapest = %b.cheapest.id,
            fastest = %b.fastest.id,
            best_quality = %b.best_quality.id,
            "benchmarked tag group"
        );
        let recommendations = audit::recommend(group.tag, &group.members, b.cheapest, config);
        tag_groups.push(TagGroupAnalysis {
            tag: group.tag,
            cheapest: b.cheapest,
            fastest: b.fastest,
            best_quality: b.best_quality,
            recommendations,
        });
    }

    // sort_by is stable: equal savings keep first-seen order.
    tag_groups.sort_by(|a, b| {
        b.total_savings()
            .partial_cmp(&a.total_savings())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let deprecated_items: Vec<&Capability> = caps
        .iter()
        .filter(|c| c.status == CapabilityStatus::Deprecated)
        .collect();
    let active_count = caps.iter().filter(|c| c.status.is_auditable()).count();

    let report = AuditReport {
        timestamp,
        total_capabilities: caps.len(),
        active_count,
        deprecated_count: deprecated_items.len(),
        deprecated_items,
        tag_groups,
    };
    tracing::info!(
        capabilities = report.total_capabilities,
        groups = report.tag_groups.len(),
        recommendations = report.recommendation_count(),
        savings = report.total_potential_savings(),
        "audit report generated"
    );
    report
}
