//! Validation harness: replay labeled datasets through a resolver and
//! aggregate precision/recall-style metrics against a threshold profile.

pub mod dataset;
pub mod harness;
pub mod metrics;

pub use dataset::{ValidationDataset, ValidationTestCase};
pub use harness::{run, CancelToken, HarnessConfig, HarnessRun};
pub use metrics::{aggregate, CaseResult, Metrics, MetricsEvaluation, Outcome, ProtocolBreakdown, ThresholdProfile};
