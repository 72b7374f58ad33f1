//! Active probe coordinator: orchestrates passive-then-active analysis across
//! a set of pluggable fingerprinters.
//!
//! Fingerprinters and the probe executor are `async_trait` objects, matching
//! this codebase's convention for pluggable, I/O-capable components. The
//! coordinator's only suspension point is inside [`ProbeExecutor::execute`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::CoordinatorError;
use crate::probe::ProbeSpec;

/// A passive or active observation of a service, independent of any single
/// fingerprinter's internal representation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    pub protocol_hint: String,
    pub banner: Vec<u8>,
    pub port: u16,
    pub hints: Vec<String>,
}

/// A candidate identification produced by a fingerprinter, either passively
/// or after an active probe round.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCandidate {
    pub protocol: String,
    pub confidence: f32,
    pub attributes: HashMap<String, JsonValue>,
    pub evidence: Vec<u8>,
    pub matched_probe: Option<String>,
    pub fingerprinter_id: String,
}

/// The three-way outcome a fingerprinter reports at each analysis step:
/// an optional candidate, whether further probing should stop, or a failure.
pub struct AnalysisOutcome {
    pub candidate: Option<ServiceCandidate>,
    pub finalized: bool,
}

impl AnalysisOutcome {
    pub fn none() -> Self {
        Self { candidate: None, finalized: false }
    }

    pub fn candidate(candidate: ServiceCandidate, finalized: bool) -> Self {
        Self { candidate: Some(candidate), finalized }
    }
}

/// A pluggable identification module: passive analysis, a list of active
/// probes, and a verify step that interprets probe responses.
#[async_trait]
pub trait Fingerprinter: Send + Sync {
    /// Stable identifier used in error messages and `ServiceCandidate::fingerprinter_id`.
    fn id(&self) -> &str;

    /// Analyze the passive observation alone. Errors fail the whole `identify` call.
    async fn analyze_passive(
        &self,
        observation: &Observation,
    ) -> Result<AnalysisOutcome, Box<dyn std::error::Error + Send + Sync>>;

    /// Active probes this fingerprinter would like to send, given the observation.
    fn active_probes(&self, observation: &Observation) -> Vec<ProbeSpec>;

    /// Interpret a probe's response.
    async fn verify(
        &self,
        probe: &ProbeSpec,
        response: &[u8],
    ) -> Result<AnalysisOutcome, Box<dyn std::error::Error + Send + Sync>>;
}

/// The sole I/O boundary of the coordinator: sends a probe and returns the
/// raw response bytes.
#[async_trait]
pub trait ProbeExecutor: Send + Sync {
    async fn execute(
        &self,
        probe: &ProbeSpec,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Append-only registry of fingerprinters. Reads snapshot the current list so
/// iteration is decoupled from concurrent registration.
#[derive(Default)]
pub struct FingerprinterRegistry {
    inner: RwLock<Vec<Arc<dyn Fingerprinter>>>,
}

impl FingerprinterRegistry {
    pub fn new() -> Self {
        Self { inner: RwLock::new(Vec::new()) }
    }

    pub fn register(&self, fingerprinter: Arc<dyn Fingerprinter>) {
        self.inner
            .write()
            .expect("fingerprinter registry lock poisoned")
            .push(fingerprinter);
    }

    pub fn snapshot(&self) -> Vec<Arc<dyn Fingerprinter>> {
        self.inner
            .read()
            .expect("fingerprinter registry lock poisoned")
            .clone()
    }
}

/// Orchestrates passive-then-active analysis over a registry of fingerprinters.
pub struct Coordinator {
    registry: FingerprinterRegistry,
}

impl Coordinator {
    pub fn new() -> Self {
        Self { registry: FingerprinterRegistry::new() }
    }

    pub fn register(&self, fingerprinter: Arc<dyn Fingerprinter>) {
        self.registry.register(fingerprinter);
    }

    /// Run passive analysis for every registered fingerprinter, then active
    /// probing (if an executor is supplied), and return the single
    /// highest-confidence candidate.
    pub async fn identify(
        &self,
        observation: &Observation,
        executor: Option<&dyn ProbeExecutor>,
    ) -> Result<Option<ServiceCandidate>, CoordinatorError> {
        let fingerprinters = self.registry.snapshot();
        let mut candidates: Vec<ServiceCandidate> = Vec::new();

        for fingerprinter in &fingerprinters {
            let span = tracing::debug_span!("analyze_passive", fingerprinter = fingerprinter.id());
            let _enter = span.enter();

            let outcome = fingerprinter
                .analyze_passive(observation)
                .await
                .map_err(|source| CoordinatorError::PassiveAnalysis {
                    fingerprinter: fingerprinter.id().to_string(),
                    source,
                })?;

            if let Some(candidate) = outcome.candidate {
                candidates.push(candidate);
            }

            if outcome.finalized {
                continue;
            }

            let Some(executor) = executor else {
                continue;
            };

            for probe in fingerprinter.active_probes(observation) {
                let probe_span =
                    tracing::debug_span!("active_probe", fingerprinter = fingerprinter.id(), probe = %probe.id);
                let _enter = probe_span.enter();

                let response = executor.execute(&probe).await.map_err(|source| {
                    CoordinatorError::ProbeExecution {
                        fingerprinter: fingerprinter.id().to_string(),
                        probe: probe.id.clone(),
                        source,
                    }
                })?;

                let outcome = fingerprinter.verify(&probe, &response).await.map_err(|source| {
                    CoordinatorError::Verify {
                        fingerprinter: fingerprinter.id().to_string(),
                        probe: probe.id.clone(),
                        source,
                    }
                })?;

                if let Some(mut candidate) = outcome.candidate {
                    candidate.matched_probe = Some(probe.id.clone());
                    candidates.push(candidate);
                }

                if outcome.finalized {
                    break;
                }
            }
        }

        // Stable sort so equal-confidence candidates keep fingerprinter-registration order.
        candidates.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());
        Ok(candidates.into_iter().next())
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FinalizingFingerprinter {
        id: String,
        confidence: f32,
    }

    #[async_trait]
    impl Fingerprinter for FinalizingFingerprinter {
        fn id(&self) -> &str {
            &self.id
        }

        async fn analyze_passive(
            &self,
            observation: &Observation,
        ) -> Result<AnalysisOutcome, Box<dyn std::error::Error + Send + Sync>> {
            Ok(AnalysisOutcome::candidate(
                ServiceCandidate {
                    protocol: observation.protocol_hint.clone(),
                    confidence: self.confidence,
                    attributes: HashMap::new(),
                    evidence: observation.banner.clone(),
                    matched_probe: None,
                    fingerprinter_id: self.id.clone(),
                },
                true,
            ))
        }

        fn active_probes(&self, _observation: &Observation) -> Vec<ProbeSpec> {
            vec![]
        }

        async fn verify(
            &self,
            _probe: &ProbeSpec,
            _response: &[u8],
        ) -> Result<AnalysisOutcome, Box<dyn std::error::Error + Send + Sync>> {
            Ok(AnalysisOutcome::none())
        }
    }

    struct ActiveOnlyFingerprinter {
        probe_called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Fingerprinter for ActiveOnlyFingerprinter {
        fn id(&self) -> &str {
            "active-only"
        }

        async fn analyze_passive(
            &self,
            _observation: &Observation,
        ) -> Result<AnalysisOutcome, Box<dyn std::error::Error + Send + Sync>> {
            Ok(AnalysisOutcome::none())
        }

        fn active_probes(&self, _observation: &Observation) -> Vec<ProbeSpec> {
            vec![ProbeSpec {
                id: "probe-1".into(),
                protocol: "http".into(),
                payload: b"GET / HTTP/1.0\r\n\r\n".to_vec(),
                port_include: vec![],
                port_exclude: vec![],
            }]
        }

        async fn verify(
            &self,
            probe: &ProbeSpec,
            response: &[u8],
        ) -> Result<AnalysisOutcome, Box<dyn std::error::Error + Send + Sync>> {
            self.probe_called.store(true, Ordering::SeqCst);
            Ok(AnalysisOutcome::candidate(
                ServiceCandidate {
                    protocol: "http".into(),
                    confidence: 0.7,
                    attributes: HashMap::new(),
                    evidence: response.to_vec(),
                    matched_probe: Some(probe.id.clone()),
                    fingerprinter_id: "active-only".into(),
                },
                true,
            ))
        }
    }

    struct EchoExecutor;

    #[async_trait]
    impl ProbeExecutor for EchoExecutor {
        async fn execute(
            &self,
            _probe: &ProbeSpec,
        ) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(b"HTTP/1.1 200 OK".to_vec())
        }
    }

    #[tokio::test]
    async fn picks_highest_confidence_candidate() {
        let coordinator = Coordinator::new();
        coordinator.register(Arc::new(FinalizingFingerprinter { id: "low".into(), confidence: 0.4 }));
        coordinator.register(Arc::new(FinalizingFingerprinter { id: "high".into(), confidence: 0.9 }));

        let observation = Observation {
            protocol_hint: "http".into(),
            banner: b"banner".to_vec(),
            port: 80,
            hints: vec![],
        };

        let best = coordinator.identify(&observation, None).await.unwrap().unwrap();
        assert_eq!(best.fingerprinter_id, "high");
    }

    #[tokio::test]
    async fn finalized_passive_skips_active_probes() {
        let coordinator = Coordinator::new();
        coordinator.register(Arc::new(FinalizingFingerprinter { id: "f".into(), confidence: 0.6 }));

        let observation = Observation::default();
        let executor = EchoExecutor;
        let best = coordinator.identify(&observation, Some(&executor)).await.unwrap();
        assert_eq!(best.unwrap().fingerprinter_id, "f");
    }

    #[tokio::test]
    async fn active_probe_runs_when_passive_is_inconclusive() {
        let probe_called = Arc::new(AtomicBool::new(false));
        let coordinator = Coordinator::new();
        coordinator.register(Arc::new(ActiveOnlyFingerprinter { probe_called: probe_called.clone() }));

        let observation = Observation::default();
        let executor = EchoExecutor;
        let best = coordinator
            .identify(&observation, Some(&executor))
            .await
            .unwrap()
            .unwrap();

        assert!(probe_called.load(Ordering::SeqCst));
        assert_eq!(best.matched_probe.as_deref(), Some("probe-1"));
    }

    #[tokio::test]
    async fn no_executor_skips_active_probing() {
        let coordinator = Coordinator::new();
        coordinator.register(Arc::new(ActiveOnlyFingerprinter {
            probe_called: Arc::new(AtomicBool::new(false)),
        }));

        let observation = Observation::default();
        let best = coordinator.identify(&observation, None).await.unwrap();
        assert!(best.is_none());
    }
}
