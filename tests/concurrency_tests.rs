use std::sync::Arc;
use std::thread;

use svcfp::catalog::embedded_rules;
use svcfp::coordinator::{Coordinator, Observation};
use svcfp::resolver::{FingerprintResolver, RuleResolver};
use svcfp::rule::{compile, Input};

#[test]
fn resolver_is_shared_across_threads_without_locking() {
    let resolver: Arc<dyn FingerprintResolver> =
        Arc::new(RuleResolver::new(compile(&embedded_rules()).unwrap()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let resolver = resolver.clone();
            thread::spawn(move || {
                let input = Input::from_text("ssh", "SSH-2.0-OpenSSH_9.3", 22 + i);
                resolver.resolve(&input).is_some()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[tokio::test]
async fn coordinator_identify_runs_concurrently_across_calls() {
    let coordinator = Arc::new(Coordinator::new());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                let observation = Observation {
                    protocol_hint: "http".into(),
                    banner: format!("banner-{i}").into_bytes(),
                    port: 80,
                    hints: vec![],
                };
                coordinator.identify(&observation, None).await
            })
        })
        .collect();

    for handle in handles {
        // No fingerprinters registered: every call should cleanly report no candidate.
        assert!(handle.await.unwrap().unwrap().is_none());
    }
}

#[test]
fn fingerprinter_registry_snapshot_is_decoupled_from_concurrent_registration() {
    use async_trait::async_trait;
    use svcfp::coordinator::{AnalysisOutcome, Fingerprinter};

    struct Noop(&'static str);
    #[async_trait]
    impl Fingerprinter for Noop {
        fn id(&self) -> &str {
            self.0
        }
        async fn analyze_passive(
            &self,
            _observation: &Observation,
        ) -> Result<AnalysisOutcome, Box<dyn std::error::Error + Send + Sync>> {
            Ok(AnalysisOutcome::none())
        }
        fn active_probes(&self, _observation: &Observation) -> Vec<svcfp::probe::ProbeSpec> {
            vec![]
        }
        async fn verify(
            &self,
            _probe: &svcfp::probe::ProbeSpec,
            _response: &[u8],
        ) -> Result<AnalysisOutcome, Box<dyn std::error::Error + Send + Sync>> {
            Ok(AnalysisOutcome::none())
        }
    }

    let coordinator = Arc::new(Coordinator::new());
    coordinator.register(Arc::new(Noop("a")));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let coordinator = coordinator.clone();
            thread::spawn(move || coordinator.register(Arc::new(Noop(Box::leak(format!("t{i}").into_boxed_str())))))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Registration from several threads must not panic or corrupt the registry.
}
