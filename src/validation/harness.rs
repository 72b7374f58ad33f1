//! Validation harness: replays a [`ValidationDataset`] through a resolver on
//! a bounded worker pool, classifies each case, and aggregates [`Metrics`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::ValidationError;
use crate::resolver::FingerprintResolver;
use crate::validation::dataset::{ValidationDataset, ValidationTestCase};
use crate::validation::metrics::{aggregate, CaseResult, Metrics, Outcome};

/// Cooperative cancellation flag shared between the caller and a running
/// harness. Checked between cases, not preemptively.
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Tuning knobs for a single [`run`] call.
pub struct HarnessConfig {
    /// Upper bound on concurrent case evaluation. `None` lets rayon pick.
    pub max_workers: Option<usize>,
    /// Wall-clock budget for the whole run. `None` means no deadline.
    pub timeout: Option<std::time::Duration>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self { max_workers: None, timeout: None }
    }
}

/// Outcome of a complete harness run: the aggregated metrics plus the raw
/// per-case results they were computed from.
pub struct HarnessRun {
    pub metrics: Metrics,
    pub results: Vec<(String, CaseResult)>,
}

/// Classify a case against what the resolver returned, per the documented
/// rule: a negative case (`expected_match == false`) wants no match; a
/// positive case wants a match whose product equals `expected_product`. An
/// `expected_version` marks a version-attempt, credited as extracted when the
/// resolver's version string is non-empty.
fn classify(case: &ValidationTestCase, resolved: &Option<crate::rule::FingerprintResult>) -> (Outcome, bool, bool) {
    if case.is_negative() {
        return match resolved {
            Some(_) => (Outcome::FalsePositive, false, false),
            None => (Outcome::TrueNegative, false, false),
        };
    }

    match resolved {
        None => (Outcome::FalseNegative, false, false),
        Some(result) => {
            let product_matches = case
                .expected_product
                .as_deref()
                .map(|expected| result.product.eq_ignore_ascii_case(expected))
                .unwrap_or(true);
            if !product_matches {
                return (Outcome::FalsePositive, false, false);
            }
            let version_attempted = case.expected_version.is_some();
            let version_extracted = version_attempted && !result.version.is_empty();
            (Outcome::TruePositive, version_attempted, version_extracted)
        }
    }
}

fn run_case(
    resolver: &dyn FingerprintResolver,
    case: &ValidationTestCase,
) -> CaseResult {
    let start = Instant::now();
    let resolved = resolver.resolve(&case.input());
    let elapsed = start.elapsed().as_micros().max(1) as u64;

    let (outcome, version_attempted, version_extracted) = classify(case, &resolved);

    CaseResult {
        protocol: case.protocol.clone(),
        outcome,
        confidence: resolved.as_ref().map(|r| r.confidence),
        detection_micros: elapsed,
        version_attempted,
        version_extracted,
        error: None,
    }
}

/// Record a case that never ran because the run was cancelled or the
/// deadline passed before its turn. Counted as `Outcome::Errored`, not
/// silently dropped, so the aggregate still accounts for every case.
fn errored_case(case: &ValidationTestCase, reason: ValidationError) -> CaseResult {
    CaseResult {
        protocol: case.protocol.clone(),
        outcome: Outcome::Errored,
        confidence: None,
        detection_micros: 0,
        version_attempted: false,
        version_extracted: false,
        error: Some(reason.to_string()),
    }
}

/// Run every case in `dataset` through `resolver`, calling `progress` after
/// each completed case with `(completed, total)`. Runs on a dedicated,
/// bounded rayon pool so a harness invocation never steals threads from a
/// caller's own pool. Cases that don't get to run because `token` was
/// cancelled or `config.timeout` elapsed are recorded as `Outcome::Errored`
/// rather than dropped; the run itself still completes and returns `Ok`.
pub fn run(
    resolver: Arc<dyn FingerprintResolver>,
    dataset: &ValidationDataset,
    config: &HarnessConfig,
    token: &CancelToken,
    mut progress: impl FnMut(usize, usize) + Send,
) -> Result<HarnessRun, ValidationError> {
    let cases: Vec<&ValidationTestCase> = dataset.cases().collect();
    let total = cases.len();
    if total == 0 {
        return Ok(HarnessRun { metrics: aggregate(&[]), results: Vec::new() });
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_workers.unwrap_or(0))
        .build()
        .map_err(|e| ValidationError::InvalidConfig(e.to_string()))?;

    let deadline = config.timeout.map(|timeout| Instant::now() + timeout);

    let results: Vec<(String, CaseResult)> = pool.install(|| {
        use rayon::prelude::*;
        cases
            .par_iter()
            .map(|case| {
                if token.is_cancelled() {
                    return (case.description.clone(), errored_case(case, ValidationError::Cancelled));
                }
                if let Some(deadline) = deadline {
                    if Instant::now() > deadline {
                        return (case.description.clone(), errored_case(case, ValidationError::TimedOut));
                    }
                }
                let result = run_case(resolver.as_ref(), case);
                (case.description.clone(), result)
            })
            .collect()
    });

    for (done, _) in results.iter().enumerate() {
        progress(done + 1, total);
    }

    let case_results: Vec<CaseResult> = results.iter().map(|(_, r)| r.clone()).collect();
    let metrics = aggregate(&case_results);

    Ok(HarnessRun { metrics, results })
}
