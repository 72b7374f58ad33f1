//! Eager compilation of raw rules into their regex-backed, read-only form.
//!
//! Compilation happens once, at load time, never inside `resolve`. A
//! [`CompiledRuleSet`] is immutable after construction and safe to share by
//! reference across threads without locking.

use std::collections::HashSet;
use std::sync::Arc;

use regex::Regex;

use super::model::{RawRule, DEFAULT_PATTERN_STRENGTH};
use super::validate::validate;
use crate::error::RuleError;

/// A single rule after regex compilation. Read-only; constructed only by
/// [`compile`].
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub id: String,
    pub protocol: String,
    pub description: String,
    pub product: String,
    pub vendor: String,
    pub cpe: String,
    pub match_re: Arc<Regex>,
    pub version_re: Option<Arc<Regex>>,
    pub hard_excludes: Vec<Arc<Regex>>,
    pub soft_excludes: Vec<Arc<Regex>>,
    pub pattern_strength: f32,
    pub bonus_ports: HashSet<u16>,
    pub binary_min_length: Option<usize>,
    pub binary_magic: Vec<Vec<u8>>,
}

/// An immutable, compiled rule set ready for the resolver to evaluate.
///
/// Rule order is preserved from the source catalog; winner selection relies
/// on this order for its stable tie-break.
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleSet {
    rules: Vec<CompiledRule>,
}

impl CompiledRuleSet {
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn build_regex(pattern: &str) -> Option<Regex> {
    if pattern.is_empty() {
        return None;
    }
    // All matching is case-insensitive; the resolver additionally pre-lowercases
    // the banner once per call, so this flag is defense in depth rather than
    // the sole source of case folding.
    Some(
        regex::RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .expect("regex already validated"),
    )
}

fn decode_magic(hex_or_text: &str) -> Vec<u8> {
    // Accept either a `\x`-escaped hex string or plain text magic bytes.
    if let Some(stripped) = hex_or_text.strip_prefix("0x") {
        (0..stripped.len())
            .step_by(2)
            .filter_map(|i| u8::from_str_radix(&stripped[i..i + 2], 16).ok())
            .collect()
    } else {
        hex_or_text.as_bytes().to_vec()
    }
}

/// Compile a raw rule set, returning either the compiled form or the list of
/// fatal validation errors. Warnings are logged but never block compilation.
pub fn compile(raw_rules: &[RawRule]) -> Result<CompiledRuleSet, Vec<RuleError>> {
    let report = validate(raw_rules);
    if !report.is_ok() {
        return Err(report.errors);
    }

    for warning in &report.warnings {
        tracing::warn!(%warning, "rule catalog warning");
    }

    let rules = raw_rules
        .iter()
        .map(|raw| {
            let pattern_strength = if raw.pattern_strength == 0.0 {
                DEFAULT_PATTERN_STRENGTH
            } else {
                raw.pattern_strength
            };

            CompiledRule {
                id: raw.id.clone(),
                protocol: raw.protocol.clone(),
                description: raw.description.clone(),
                product: raw.product.clone(),
                vendor: raw.vendor.clone(),
                cpe: raw.cpe.clone(),
                match_re: Arc::new(
                    build_regex(&raw.match_pattern).expect("match pattern already validated"),
                ),
                version_re: build_regex(&raw.version_extraction).map(Arc::new),
                hard_excludes: raw
                    .hard_exclude_patterns
                    .iter()
                    .map(|p| Arc::new(build_regex(p).expect("exclude pattern already validated")))
                    .collect(),
                soft_excludes: raw
                    .soft_exclude_patterns
                    .iter()
                    .map(|p| Arc::new(build_regex(p).expect("exclude pattern already validated")))
                    .collect(),
                pattern_strength,
                bonus_ports: raw.bonus_ports.iter().map(|p| *p as u16).collect(),
                binary_min_length: raw.binary_min_length,
                binary_magic: raw.binary_magic.iter().map(|s| decode_magic(s)).collect(),
            }
        })
        .collect();

    tracing::info!(
        rule_count = raw_rules.len(),
        warning_count = report.warnings.len(),
        "compiled rule catalog"
    );

    Ok(CompiledRuleSet { rules })
}
