//! The rule-based resolver: multi-phase scoring over a compiled rule set.
//!
//! `resolve` takes no locks and performs no I/O; thread scalability is bounded
//! only by regex-engine contention, per the concurrency model.

pub mod sink;

use std::sync::Arc;

use crate::rule::{CompiledRule, CompiledRuleSet, FingerprintResult, Input, TECHNIQUE_STATIC};
pub use sink::{DetectionSink, LineSink};

/// Confidence below this is discarded; confidence exactly at the cutoff survives.
pub const MIN_CONFIDENCE: f32 = 0.50;

/// Penalty subtracted per matching soft-exclude pattern.
const SOFT_EXCLUDE_PENALTY: f32 = 0.20;

/// Bonus added when the observed port is in a rule's bonus-port set.
const PORT_BONUS: f32 = 0.10;

/// A rule that survived protocol gating, primary match, and hard exclusion.
struct Candidate<'a> {
    rule: &'a CompiledRule,
    confidence: f32,
}

/// Something that can resolve an [`Input`] into a [`FingerprintResult`].
///
/// Implementations must be `Send + Sync` so a single instance can be shared
/// across resolver threads behind an `Arc` without locking.
pub trait FingerprintResolver: Send + Sync {
    fn resolve(&self, input: &Input) -> Option<FingerprintResult>;
}

/// The default, rule-based resolver. Immutable after construction; replacing
/// the active rule set means building a new `RuleResolver` and swapping the
/// shared reference, never mutating this one in place.
#[derive(Clone, Default)]
pub struct RuleResolver {
    rules: CompiledRuleSet,
    sink: Option<Arc<dyn DetectionSink>>,
}

impl std::fmt::Debug for RuleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleResolver")
            .field("rules", &self.rules)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl RuleResolver {
    pub fn new(rules: CompiledRuleSet) -> Self {
        Self { rules, sink: None }
    }

    /// Attach a telemetry sink; every successful `resolve` is reported to it.
    pub fn with_sink(rules: CompiledRuleSet, sink: Arc<dyn DetectionSink>) -> Self {
        Self { rules, sink: Some(sink) }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Run the multi-phase scoring algorithm and select a winner.
    ///
    /// Returns `None` (the `NoMatch` outcome) when no rule produces a
    /// surviving candidate.
    pub fn resolve(&self, input: &Input) -> Option<FingerprintResult> {
        let banner_lower = input.banner_lossy().to_lowercase();

        let mut best: Option<Candidate<'_>> = None;

        for rule in self.rules.rules().iter() {
            // 1. Protocol gate — empty input protocol means fallback mode.
            if !input.protocol.is_empty() && input.protocol != rule.protocol {
                continue;
            }

            // 2. Primary match.
            if !rule.match_re.is_match(&banner_lower) {
                continue;
            }

            // 3. Hard exclude — eliminates the candidate outright, never demotes it.
            if rule
                .hard_excludes
                .iter()
                .any(|re| re.is_match(&banner_lower))
            {
                continue;
            }

            // 4. Soft-exclude penalty.
            let soft_matches = rule
                .soft_excludes
                .iter()
                .filter(|re| re.is_match(&banner_lower))
                .count();
            let penalty = soft_matches as f32 * SOFT_EXCLUDE_PENALTY;

            // 5. Port bonus.
            let bonus = if rule.bonus_ports.contains(&input.port) {
                PORT_BONUS
            } else {
                0.0
            };

            // 6. Score.
            let confidence = (rule.pattern_strength - penalty + bonus).clamp(0.0, 1.0);

            // 7. Threshold.
            if confidence < MIN_CONFIDENCE {
                continue;
            }

            let candidate = Candidate { rule, confidence };

            best = Some(match best {
                // Strict `>` keeps the earlier-encountered rule on ties, giving
                // the stable "first in rule order wins" tie-break.
                Some(current) if current.confidence >= candidate.confidence => current,
                _ => candidate,
            });
        }

        let result = best.map(|candidate| {
            let version = extract_version(candidate.rule, &banner_lower);
            FingerprintResult {
                product: candidate.rule.product.clone(),
                vendor: candidate.rule.vendor.clone(),
                version,
                cpe: candidate.rule.cpe.clone(),
                confidence: candidate.confidence,
                technique: TECHNIQUE_STATIC.to_string(),
                description: candidate.rule.description.clone(),
                source_probe_id: None,
                tls_observation: None,
            }
        });

        if let (Some(sink), Some(result)) = (&self.sink, &result) {
            sink.record(input, result);
        }

        result
    }
}

impl FingerprintResolver for RuleResolver {
    fn resolve(&self, input: &Input) -> Option<FingerprintResult> {
        RuleResolver::resolve(self, input)
    }
}

/// Extract and normalize the version capture group, if the rule declares one
/// and it matches. Empty version strings are valid — absence of a capture or
/// no match simply yields `""`.
fn extract_version(rule: &CompiledRule, banner_lower: &str) -> String {
    rule.version_re
        .as_ref()
        .and_then(|re| re.captures(banner_lower))
        .and_then(|caps| caps.get(1))
        .map(|m| normalize_version(m.as_str()))
        .unwrap_or_default()
}

/// Trim ASCII whitespace and lowercase. Idempotent: `normalize(normalize(v)) == normalize(v)`.
pub fn normalize_version(value: &str) -> String {
    value.trim_matches(|c: char| c.is_ascii_whitespace()).to_lowercase()
}
