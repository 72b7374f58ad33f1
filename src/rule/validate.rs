//! Load-time validation of a raw rule set: errors block use, warnings don't.

use std::collections::HashSet;

use regex::Regex;

use super::model::{RawRule, DEFAULT_PATTERN_STRENGTH};
use crate::error::RuleError;

/// A non-fatal observation about a rule that still compiles and loads fine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleWarning {
    EmptyVendor { id: String },
    EmptyDescription { id: String },
    EmptyCpe { id: String },
    CpeComponentCount { id: String, count: usize },
    ZeroCaptureGroups { id: String },
    LowPatternStrength { id: String, value: String },
    PatternStrengthDefaulted { id: String },
}

impl std::fmt::Display for RuleWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleWarning::EmptyVendor { id } => write!(f, "rule `{id}`: vendor is empty"),
            RuleWarning::EmptyDescription { id } => {
                write!(f, "rule `{id}`: description is empty")
            }
            RuleWarning::EmptyCpe { id } => write!(f, "rule `{id}`: cpe is empty"),
            RuleWarning::CpeComponentCount { id, count } => write!(
                f,
                "rule `{id}`: cpe has {count} colon-separated components, expected 13"
            ),
            RuleWarning::ZeroCaptureGroups { id } => write!(
                f,
                "rule `{id}`: version_extraction has zero capture groups"
            ),
            RuleWarning::LowPatternStrength { id, value } => write!(
                f,
                "rule `{id}`: pattern_strength {value} is in (0, 0.50)"
            ),
            RuleWarning::PatternStrengthDefaulted { id } => write!(
                f,
                "rule `{id}`: pattern_strength unset, defaulting to {DEFAULT_PATTERN_STRENGTH}"
            ),
        }
    }
}

/// Outcome of validating a raw rule set: a set of fatal errors (any of which
/// blocks compilation) and a set of non-fatal warnings.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<RuleError>,
    pub warnings: Vec<RuleWarning>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Counts the colon-separated components of a CPE string, per the 13-component
/// `cpe:2.3:` form (`cpe`, `2.3`, `part`, `vendor`, `product`, `version`,
/// `update`, `edition`, `language`, `sw_edition`, `target_sw`, `target_hw`, `other`).
fn cpe_component_count(cpe: &str) -> usize {
    cpe.split(':').count()
}

/// Validate a raw rule set, collecting every error and warning rather than
/// stopping at the first problem, so a catalog author sees the whole picture.
pub fn validate(rules: &[RawRule]) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen_ids: HashSet<&str> = HashSet::new();

    for (index, rule) in rules.iter().enumerate() {
        if rule.id.is_empty() {
            report.errors.push(RuleError::MissingField { index, field: "id" });
        } else if !seen_ids.insert(rule.id.as_str()) {
            report.errors.push(RuleError::DuplicateId { id: rule.id.clone() });
        }

        if rule.protocol.is_empty() {
            report
                .errors
                .push(RuleError::MissingField { index, field: "protocol" });
        }
        if rule.product.is_empty() {
            report
                .errors
                .push(RuleError::MissingField { index, field: "product" });
        }
        if rule.match_pattern.is_empty() {
            report
                .errors
                .push(RuleError::MissingField { index, field: "match" });
        } else if let Err(e) = Regex::new(&rule.match_pattern) {
            report.errors.push(RuleError::BadRegex {
                id: rule.id.clone(),
                field: "match",
                source: e.to_string(),
            });
        }

        if !rule.version_extraction.is_empty() {
            match Regex::new(&rule.version_extraction) {
                Ok(re) => {
                    if re.captures_len() < 2 {
                        report
                            .warnings
                            .push(RuleWarning::ZeroCaptureGroups { id: rule.id.clone() });
                    }
                }
                Err(e) => report.errors.push(RuleError::BadRegex {
                    id: rule.id.clone(),
                    field: "version_extraction",
                    source: e.to_string(),
                }),
            }
        }

        for pattern in &rule.hard_exclude_patterns {
            if let Err(e) = Regex::new(pattern) {
                report.errors.push(RuleError::BadRegex {
                    id: rule.id.clone(),
                    field: "exclude_patterns",
                    source: e.to_string(),
                });
            }
        }
        for pattern in &rule.soft_exclude_patterns {
            if let Err(e) = Regex::new(pattern) {
                report.errors.push(RuleError::BadRegex {
                    id: rule.id.clone(),
                    field: "soft_exclude_patterns",
                    source: e.to_string(),
                });
            }
        }

        if rule.cpe.is_empty() {
            report.warnings.push(RuleWarning::EmptyCpe { id: rule.id.clone() });
        } else if !rule.cpe.starts_with("cpe:2.3:") {
            report.errors.push(RuleError::BadCpePrefix { id: rule.id.clone() });
        } else {
            let count = cpe_component_count(&rule.cpe);
            if count != 13 {
                report
                    .warnings
                    .push(RuleWarning::CpeComponentCount { id: rule.id.clone(), count });
            }
        }

        if rule.vendor.is_empty() {
            report.warnings.push(RuleWarning::EmptyVendor { id: rule.id.clone() });
        }
        if rule.description.is_empty() {
            report
                .warnings
                .push(RuleWarning::EmptyDescription { id: rule.id.clone() });
        }

        if rule.pattern_strength == 0.0 {
            report
                .warnings
                .push(RuleWarning::PatternStrengthDefaulted { id: rule.id.clone() });
        } else if !(0.0..=1.0).contains(&rule.pattern_strength) {
            report.errors.push(RuleError::BadPatternStrength {
                id: rule.id.clone(),
                value: rule.pattern_strength,
            });
        } else if rule.pattern_strength < 0.50 {
            report.warnings.push(RuleWarning::LowPatternStrength {
                id: rule.id.clone(),
                value: format!("{:.2}", rule.pattern_strength),
            });
        }

        for port in &rule.bonus_ports {
            if *port == 0 || *port > 65535 {
                report.errors.push(RuleError::BadBonusPort {
                    id: rule.id.clone(),
                    port: *port,
                });
            }
        }
    }

    report
}
