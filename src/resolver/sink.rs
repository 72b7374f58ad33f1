//! `DetectionSink`: an optional telemetry capability port the resolver may
//! report completed resolutions through, independent of `tracing`.
//!
//! Modeled the same way as [`crate::coordinator::ProbeExecutor`]: a narrow
//! trait object behind an `Arc`, held as `Option<Arc<dyn DetectionSink>>` so
//! a resolver without telemetry pays nothing for it.

use std::io::Write;
use std::sync::Mutex;

use crate::rule::{FingerprintResult, Input};

/// Receives a record of every `resolve` call that produced a result.
/// Implementations must be `Send + Sync`; the resolver may call this from
/// any thread.
pub trait DetectionSink: Send + Sync {
    fn record(&self, input: &Input, result: &FingerprintResult);
}

/// A `DetectionSink` that appends one line per detection to a writer,
/// serialized behind a mutex so concurrent resolver calls don't interleave
/// partial lines.
pub struct LineSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer: Mutex::new(writer) }
    }
}

impl<W: Write + Send> DetectionSink for LineSink<W> {
    fn record(&self, input: &Input, result: &FingerprintResult) {
        let mut writer = self.writer.lock().expect("detection sink lock poisoned");
        let _ = writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{:.2}",
            input.protocol, input.port, result.product, result.version, result.confidence
        );
    }
}
