//! Pure metric aggregation and a separate pass/fail evaluation step.
//!
//! Aggregation never mixes in judgement: [`aggregate`] only computes counts
//! and rates. [`ThresholdProfile::evaluate`] is the only place confidence in
//! those numbers gets turned into pass/fail flags.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Outcome of a single validation case against the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    TruePositive,
    FalsePositive,
    FalseNegative,
    TrueNegative,
    /// The case could not be completed (cancelled, timed out, or errored).
    Errored,
}

/// Result of running a single case through the resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub protocol: String,
    pub outcome: Outcome,
    pub confidence: Option<f32>,
    pub detection_micros: u64,
    pub version_attempted: bool,
    pub version_extracted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Scalar counts, derived rates, and summaries aggregated over a set of
/// [`CaseResult`]s.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub true_positives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub true_negatives: u64,
    pub errored: u64,

    pub false_positive_rate: f64,
    pub true_positive_rate: f64,
    pub precision: f64,
    pub f1: f64,
    pub version_extraction_rate: f64,

    pub mean_confidence: f64,
    pub median_confidence: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,

    pub mean_detection_micros: f64,

    pub protocol_coverage: u64,
    pub per_protocol: HashMap<String, ProtocolBreakdown>,
}

/// Per-protocol slice of the same aggregation, plus protocol-scoped averages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtocolBreakdown {
    pub true_positives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub true_negatives: u64,
    pub true_positive_rate: f64,
    pub precision: f64,
    pub average_confidence: f64,
    pub average_detection_micros: f64,
}

fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn rates(tp: u64, fp: u64, fn_: u64, tn: u64) -> (f64, f64, f64, f64) {
    let fpr = safe_div(fp as f64, (fp + tn) as f64);
    let tpr = safe_div(tp as f64, (tp + fn_) as f64);
    let precision = safe_div(tp as f64, (tp + fp) as f64);
    let f1 = safe_div(2.0 * precision * tpr, precision + tpr);
    (fpr, tpr, precision, f1)
}

fn confidence_summary(mut confidences: Vec<f64>) -> (f64, f64, f64, f64) {
    if confidences.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    confidences.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let sum: f64 = confidences.iter().sum();
    let mean = sum / confidences.len() as f64;
    let mid = confidences.len() / 2;
    let median = if confidences.len() % 2 == 0 {
        (confidences[mid - 1] + confidences[mid]) / 2.0
    } else {
        confidences[mid]
    };
    (mean, median, confidences[0], confidences[confidences.len() - 1])
}

/// Aggregate a set of per-case results into [`Metrics`]. Pure: no pass/fail
/// judgement is applied here.
pub fn aggregate(results: &[CaseResult]) -> Metrics {
    let mut tp = 0u64;
    let mut fp = 0u64;
    let mut fn_ = 0u64;
    let mut tn = 0u64;
    let mut errored = 0u64;
    let mut version_attempted = 0u64;
    let mut version_extracted = 0u64;
    let mut confidences = Vec::new();
    let mut detection_total = 0u64;
    let mut detection_count = 0u64;
    let mut protocols: HashMap<String, Vec<&CaseResult>> = HashMap::new();

    for result in results {
        match result.outcome {
            Outcome::TruePositive => tp += 1,
            Outcome::FalsePositive => fp += 1,
            Outcome::FalseNegative => fn_ += 1,
            Outcome::TrueNegative => tn += 1,
            Outcome::Errored => errored += 1,
        }
        if result.version_attempted {
            version_attempted += 1;
        }
        if result.version_extracted {
            version_extracted += 1;
        }
        if let Some(confidence) = result.confidence {
            if result.outcome == Outcome::TruePositive {
                confidences.push(confidence as f64);
            }
        }
        detection_total += result.detection_micros;
        detection_count += 1;
        protocols.entry(result.protocol.clone()).or_default().push(result);
    }

    let (fpr, tpr, precision, f1) = rates(tp, fp, fn_, tn);
    let (mean, median, min, max) = confidence_summary(confidences);

    let per_protocol = protocols
        .into_iter()
        .map(|(protocol, cases)| {
            let mut p_tp = 0u64;
            let mut p_fp = 0u64;
            let mut p_fn = 0u64;
            let mut p_tn = 0u64;
            let mut p_confidences = Vec::new();
            let mut p_detection_total = 0u64;

            for case in &cases {
                match case.outcome {
                    Outcome::TruePositive => {
                        p_tp += 1;
                        if let Some(c) = case.confidence {
                            p_confidences.push(c as f64);
                        }
                    }
                    Outcome::FalsePositive => p_fp += 1,
                    Outcome::FalseNegative => p_fn += 1,
                    Outcome::TrueNegative => p_tn += 1,
                    Outcome::Errored => {}
                }
                p_detection_total += case.detection_micros;
            }

            let (_, p_tpr, p_precision, _) = rates(p_tp, p_fp, p_fn, p_tn);
            let avg_confidence = safe_div(p_confidences.iter().sum(), p_confidences.len() as f64);
            let avg_detection = safe_div(p_detection_total as f64, cases.len() as f64);

            (
                protocol,
                ProtocolBreakdown {
                    true_positives: p_tp,
                    false_positives: p_fp,
                    false_negatives: p_fn,
                    true_negatives: p_tn,
                    true_positive_rate: p_tpr,
                    precision: p_precision,
                    average_confidence: avg_confidence,
                    average_detection_micros: avg_detection,
                },
            )
        })
        .collect::<HashMap<_, _>>();

    Metrics {
        true_positives: tp,
        false_positives: fp,
        false_negatives: fn_,
        true_negatives: tn,
        errored,
        false_positive_rate: fpr,
        true_positive_rate: tpr,
        precision,
        f1,
        version_extraction_rate: safe_div(version_extracted as f64, version_attempted as f64),
        mean_confidence: mean,
        median_confidence: median,
        min_confidence: min,
        max_confidence: max,
        mean_detection_micros: safe_div(detection_total as f64, detection_count as f64),
        protocol_coverage: per_protocol.len() as u64,
        per_protocol,
    }
}

/// Target values a [`Metrics`] result is judged against. Distinct from
/// aggregation so evaluation can be swapped (e.g. per-environment targets)
/// without touching the pure math above.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdProfile {
    pub max_false_positive_rate: f64,
    pub min_true_positive_rate: f64,
    pub min_precision: f64,
    pub min_f1: f64,
    pub min_version_extraction_rate: f64,
    pub min_protocol_coverage: u64,
    pub max_mean_detection_micros: f64,
}

impl Default for ThresholdProfile {
    fn default() -> Self {
        Self {
            max_false_positive_rate: 0.05,
            min_true_positive_rate: 0.90,
            min_precision: 0.90,
            min_f1: 0.90,
            min_version_extraction_rate: 0.70,
            min_protocol_coverage: 1,
            max_mean_detection_micros: 5_000.0,
        }
    }
}

/// Per-metric pass/fail flags against a [`ThresholdProfile`], plus the count
/// of metrics passed (bounded by the seven scalar targets above).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsEvaluation {
    pub false_positive_rate_passed: bool,
    pub true_positive_rate_passed: bool,
    pub precision_passed: bool,
    pub f1_passed: bool,
    pub version_extraction_rate_passed: bool,
    pub protocol_coverage_passed: bool,
    pub performance_passed: bool,
    pub metrics_passed: u8,
}

impl ThresholdProfile {
    /// Evaluate already-computed metrics against this profile. FPR and the
    /// performance target use strict `<`; the rest use strict `>`, except
    /// protocol coverage which uses `>=`.
    pub fn evaluate(&self, metrics: &Metrics) -> MetricsEvaluation {
        let false_positive_rate_passed = metrics.false_positive_rate < self.max_false_positive_rate;
        let true_positive_rate_passed = metrics.true_positive_rate > self.min_true_positive_rate;
        let precision_passed = metrics.precision > self.min_precision;
        let f1_passed = metrics.f1 > self.min_f1;
        let version_extraction_rate_passed =
            metrics.version_extraction_rate > self.min_version_extraction_rate;
        let protocol_coverage_passed = metrics.protocol_coverage >= self.min_protocol_coverage;
        let performance_passed = metrics.mean_detection_micros < self.max_mean_detection_micros;

        let metrics_passed = [
            false_positive_rate_passed,
            true_positive_rate_passed,
            precision_passed,
            f1_passed,
            version_extraction_rate_passed,
            protocol_coverage_passed,
            performance_passed,
        ]
        .iter()
        .filter(|passed| **passed)
        .count() as u8;

        MetricsEvaluation {
            false_positive_rate_passed,
            true_positive_rate_passed,
            precision_passed,
            f1_passed,
            version_extraction_rate_passed,
            protocol_coverage_passed,
            performance_passed,
            metrics_passed,
        }
    }
}
