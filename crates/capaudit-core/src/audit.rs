use std::collections::HashMap;

use serde::Serialize;

use crate::capability::Capability;
use crate::config::AuditConfig;

/// Monthly calls assumed when neither the capability nor the config has a figure.
pub const FALLBACK_MONTHLY_CALLS: u64 = 1000;

/// Active and beta capabilities sharing one tag, in catalog order.
#[derive(Debug, Clone)]
pub struct TagGroup<'a> {
    pub tag: &'a str,
    pub members: Vec<&'a Capability>,
}

/// Partition auditable capabilities by tag. A capability with N tags lands
/// in N groups. Groups come out in the order their tag is first seen.
pub fn group_by_tag(caps: &[Capability]) -> Vec<TagGroup<'_>> {
    let mut groups: Vec<TagGroup<'_>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for cap in caps.iter().filter(|c| c.status.is_auditable()) {
        for tag in &cap.tags {
            let i = *index.entry(tag.as_str()).or_insert_with(|| {
                groups.push(TagGroup {
                    tag: tag.as_str(),
                    members: Vec::new(),
                });
                groups.len() - 1
            });
            let members = &mut groups[i].members;
            // Same tag listed twice on one capability.
            if members.last().is_some_and(|m| std::ptr::eq(*m, cap)) {
                continue;
            }
            members.push(cap);
        }
    }
    groups
}

/// Best-in-group capability along each axis. The three may coincide.
#[derive(Debug, Clone, Copy)]
pub struct Benchmarks<'a> {
    pub cheapest: &'a Capability,
    pub fastest: &'a Capability,
    pub best_quality: &'a Capability,
}

/// One pass over the group; on ties the earlier member wins.
pub fn select_benchmarks<'a>(group: &TagGroup<'a>) -> Option<Benchmarks<'a>> {
    let (&first, rest) = group.members.split_first()?;
    let mut b = Benchmarks {
        cheapest: first,
        fastest: first,
        best_quality: first,
    };
    for &cap in rest {
        if cap.cost() < b.cheapest.cost() {
            b.cheapest = cap;
        }
        if cap.latency_ms() < b.fastest.latency_ms() {
            b.fastest = cap;
        }
        if cap.quality() > b.best_quality.quality() {
            b.best_quality = cap;
        }
    }
    Some(b)
}

/// How much more a capability costs than a baseline, relative to the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CostPremium {
    /// `(cost - baseline) / |baseline|`.
    Ratio(f64),
    /// Baseline is free and the capability is not.
    Unbounded,
}

impl CostPremium {
    pub fn between(cap: &Capability, baseline: &Capability) -> Self {
        let base = baseline.cost();
        let diff = cap.cost() - base;
        if base != 0.0 {
            Self::Ratio(diff / base.abs())
        } else if diff > 0.0 {
            Self::Unbounded
        } else {
            Self::Ratio(0.0)
        }
    }

    pub fn meets(self, min_ratio: f64) -> bool {
        match self {
            Self::Ratio(r) => r >= min_ratio,
            Self::Unbounded => true,
        }
    }

    pub fn ratio(self) -> Option<f64> {
        match self {
            Self::Ratio(r) => Some(r),
            Self::Unbounded => None,
        }
    }
}

/// A flagged capability and the cheaper one its traffic could move to.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub capability_id: String,
    pub better_alternative_id: String,
    pub reason: String,
    /// Estimated USD saved per month, assuming 1000 tokens per call.
    pub potential_savings: f64,
    /// `None` when the alternative is free.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_increase_ratio: Option<f64>,
    pub monthly_volume: u64,
}

/// Calls per month to price a capability at: its own estimate, then the
/// tag default, then [`FALLBACK_MONTHLY_CALLS`].
pub fn monthly_volume(cap: &Capability, tag: &str, config: &AuditConfig) -> u64 {
    match cap.usage.estimated_monthly_calls {
        0 => config.default_calls_for(tag).unwrap_or(FALLBACK_MONTHLY_CALLS),
        n => n,
    }
}

/// Compare every member of a tag group against the group's cheapest.
///
/// A member is flagged when it costs at least `min_cost_saving_ratio_for_flag`
/// more than the cheapest and the cheapest is no more than
/// `min_quality_difference_for_flag` worse in quality. Output follows member order.
pub fn recommend(
    tag: &str,
    members: &[&Capability],
    cheapest: &Capability,
    config: &AuditConfig,
) -> Vec<Recommendation> {
    let t = &config.audit;
    let mut out = Vec::new();

    for &cap in members {
        if cap.id == cheapest.id {
            continue;
        }

        let premium = CostPremium::between(cap, cheapest);
        let quality_diff = cheapest.quality() - cap.quality();
        if !premium.meets(t.min_cost_saving_ratio_for_flag) {
            continue;
        }
        if quality_diff <= -t.min_quality_difference_for_flag {
            tracing::debug!(
                tag,
                capability = %cap.id,
                quality_diff,
                "premium justified by quality"
            );
            continue;
        }

        let volume = monthly_volume(cap, tag, config);
        let potential_savings = (cap.cost() - cheapest.cost()) * volume as f64;
        let reason = match premium {
            CostPremium::Ratio(r) => format!(
                "Cost is {}% higher than {} with similar quality.",
                (r * 100.0).round() as i64,
                cheapest.id
            ),
            CostPremium::Unbounded => format!(
                "Cost is higher than {}, which is free, with similar quality.",
                cheapest.id
            ),
        };

        tracing::debug!(tag, capability = %cap.id, potential_savings, "flagged");
        out.push(Recommendation {
            capability_id: cap.id.clone(),
            better_alternative_id: cheapest.id.clone(),
            reason,
            potential_savings,
            cost_increase_ratio: premium.ratio(),
            monthly_volume: volume,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityStatus, CapabilityType, Performance, Usage};

    fn cap(id: &str, tags: &[&str], status: CapabilityStatus, cost: f64, latency: f64, quality: f64) -> Capability {
        Capability {
            id: id.to_string(),
            name: id.to_string(),
            kind: CapabilityType::Model,
            provider: "test".to_string(),
            description: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            status,
            version: "1.0.0".to_string(),
            owner: String::new(),
            interfaces: Default::default(),
            performance: Performance {
                cost_per_1k_tokens_usd: cost,
                avg_latency_ms: latency,
                quality_score_0_to_1: quality,
            },
            usage: Usage::default(),
            links: Default::default(),
            alternatives: Vec::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn grouping_skips_deprecated_and_keeps_order() {
        let caps = vec![
            cap("a", &["x", "y"], CapabilityStatus::Active, 1.0, 1.0, 0.5),
            cap("b", &["y"], CapabilityStatus::Deprecated, 1.0, 1.0, 0.5),
            cap("c", &["y", "z"], CapabilityStatus::Beta, 1.0, 1.0, 0.5),
        ];
        let groups = group_by_tag(&caps);
        let tags: Vec<&str> = groups.iter().map(|g| g.tag).collect();
        assert_eq!(tags, vec!["x", "y", "z"]);
        let y: Vec<&str> = groups[1].members.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(y, vec!["a", "c"]);
    }

    #[test]
    fn grouping_ignores_repeated_tag() {
        let caps = vec![cap("a", &["x", "x"], CapabilityStatus::Active, 1.0, 1.0, 0.5)];
        let groups = group_by_tag(&caps);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members.len(), 1);
    }

    #[test]
    fn grouping_drops_unknown_status() {
        let caps = vec![cap("a", &["x"], CapabilityStatus::Unknown, 1.0, 1.0, 0.5)];
        assert!(group_by_tag(&caps).is_empty());
    }

    #[test]
    fn benchmarks_first_occurrence_wins_ties() {
        let caps = vec![
            cap("a", &["x"], CapabilityStatus::Active, 2.0, 50.0, 0.9),
            cap("b", &["x"], CapabilityStatus::Active, 1.0, 50.0, 0.9),
            cap("c", &["x"], CapabilityStatus::Active, 1.0, 10.0, 0.7),
        ];
        let groups = group_by_tag(&caps);
        let b = select_benchmarks(&groups[0]).unwrap();
        assert_eq!(b.cheapest.id, "b");
        assert_eq!(b.fastest.id, "c");
        assert_eq!(b.best_quality.id, "a");
    }

    #[test]
    fn benchmarks_empty_group() {
        let g = TagGroup { tag: "x", members: Vec::new() };
        assert!(select_benchmarks(&g).is_none());
    }

    #[test]
    fn premium_against_free_baseline() {
        let free = cap("free", &[], CapabilityStatus::Active, 0.0, 1.0, 0.5);
        let paid = cap("paid", &[], CapabilityStatus::Active, 0.01, 1.0, 0.5);
        assert_eq!(CostPremium::between(&paid, &free), CostPremium::Unbounded);
        assert_eq!(CostPremium::between(&free, &free), CostPremium::Ratio(0.0));
        assert!(CostPremium::Unbounded.meets(1e9));
        assert!(CostPremium::Unbounded.ratio().is_none());
    }

    #[test]
    fn volume_prefers_own_usage_then_tag_default() {
        let mut config = AuditConfig::default();
        config.default_monthly_calls_per_tag.insert("x".into(), 7_000);
        let mut c = cap("a", &["x"], CapabilityStatus::Active, 1.0, 1.0, 0.5);
        assert_eq!(monthly_volume(&c, "x", &config), 7_000);
        assert_eq!(monthly_volume(&c, "other", &config), FALLBACK_MONTHLY_CALLS);
        c.usage.estimated_monthly_calls = 42;
        assert_eq!(monthly_volume(&c, "x", &config), 42);
    }

    #[test]
    fn marginally_better_quality_is_still_flagged() {
        let config = AuditConfig::default();
        let cheap = cap("cheap", &["x"], CapabilityStatus::Active, 1.0, 1.0, 0.80);
        let pricey = cap("pricey", &["x"], CapabilityStatus::Active, 2.0, 1.0, 0.84);
        let recs = recommend("x", &[&cheap, &pricey], &cheap, &config);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].capability_id, "pricey");
    }

    #[test]
    fn quality_just_past_margin_is_exempt() {
        let config = AuditConfig::default();
        let cheap = cap("cheap", &["x"], CapabilityStatus::Active, 1.0, 1.0, 0.80);
        let pricey = cap("pricey", &["x"], CapabilityStatus::Active, 2.0, 1.0, 0.86);
        assert!(recommend("x", &[&cheap, &pricey], &cheap, &config).is_empty());
    }

    #[test]
    fn negative_baseline_is_not_free() {
        let odd = cap("odd", &[], CapabilityStatus::Active, -0.01, 1.0, 0.5);
        let paid = cap("paid", &[], CapabilityStatus::Active, 0.02, 1.0, 0.5);
        match CostPremium::between(&paid, &odd) {
            CostPremium::Ratio(r) => assert!((r - 3.0).abs() < 1e-9, "ratio {r}"),
            CostPremium::Unbounded => panic!("negative cost treated as free"),
        }
    }

    #[test]
    fn premium_below_threshold_not_flagged() {
        let config = AuditConfig::default();
        let cheap = cap("cheap", &["x"], CapabilityStatus::Active, 1.0, 1.0, 0.8);
        let pricey = cap("pricey", &["x"], CapabilityStatus::Active, 1.1, 1.0, 0.8);
        assert!(recommend("x", &[&cheap, &pricey], &cheap, &config).is_empty());
    }

    #[test]
    fn reason_rounds_percentage() {
        let config = AuditConfig::default();
        let cheap = cap("cheap", &["x"], CapabilityStatus::Active, 0.003, 1.0, 0.92);
        let pricey = cap("pricey", &["x"], CapabilityStatus::Active, 0.005, 1.0, 0.9);
        let recs = recommend("x", &[&pricey, &cheap], &cheap, &config);
        assert_eq!(recs[0].reason, "Cost is 67% higher than cheap with similar quality.");
    }

    #[test]
    fn free_cheapest_flags_without_ratio() {
        let config = AuditConfig::default();
        let free = cap("free", &["x"], CapabilityStatus::Active, 0.0, 1.0, 0.9);
        let paid = cap("paid", &["x"], CapabilityStatus::Active, 0.02, 1.0, 0.9);
        let recs = recommend("x", &[&free, &paid], &free, &config);
        assert_eq!(recs.len(), 1);
        let r = &recs[0];
        assert!(r.cost_increase_ratio.is_none());
        assert!(r.reason.contains("free"), "{}", r.reason);
        assert!(r.potential_savings.is_finite());
        assert!((r.potential_savings - 20.0).abs() < 1e-9);
    }
}
