//! Mock middleware for testing pipelines.

use crate::errors::FlowcellError;
use crate::pipeline::{Middleware, Next};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// A shared, ordered log of labels pushed by probe middleware.
///
/// Clones share the same underlying log, so a single `ProbeLog` can be
/// handed to every middleware in a chain to record the observed execution
/// order.
#[derive(Clone, Debug, Default)]
pub struct ProbeLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl ProbeLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a label.
    pub fn push(&self, label: impl Into<String>) {
        self.entries.lock().push(label.into());
    }

    /// Returns all recorded labels in order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns the number of recorded labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Clears the log.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// A middleware that records "{name}-before" and "{name}-after" around its
/// delegation, for onion-ordering assertions.
#[derive(Debug)]
pub struct RecordingMiddleware {
    name: String,
    log: ProbeLog,
}

impl RecordingMiddleware {
    /// Creates a recording middleware writing into `log`.
    #[must_use]
    pub fn new(name: impl Into<String>, log: ProbeLog) -> Self {
        Self {
            name: name.into(),
            log,
        }
    }
}

#[async_trait]
impl<I, O> Middleware<I, O> for RecordingMiddleware
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, input: I, next: Next<I, O>) -> Result<O, FlowcellError> {
        self.log.push(format!("{}-before", self.name));
        let result = next.run(input).await;
        self.log.push(format!("{}-after", self.name));
        result
    }
}

/// A middleware that returns a fixed output without invoking its
/// continuation.
#[derive(Debug)]
pub struct ShortCircuitMiddleware<O> {
    name: String,
    output: O,
}

impl<O> ShortCircuitMiddleware<O> {
    /// Creates a short-circuiting middleware returning `output`.
    #[must_use]
    pub fn new(name: impl Into<String>, output: O) -> Self {
        Self {
            name: name.into(),
            output,
        }
    }
}

#[async_trait]
impl<I, O> Middleware<I, O> for ShortCircuitMiddleware<O>
where
    I: Send + 'static,
    O: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, _input: I, _next: Next<I, O>) -> Result<O, FlowcellError> {
        Ok(self.output.clone())
    }
}

/// A middleware that always fails with the configured message.
#[derive(Debug)]
pub struct FailingMiddleware {
    name: String,
    message: String,
}

impl FailingMiddleware {
    /// Creates a failing middleware.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl<I, O> Middleware<I, O> for FailingMiddleware
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, _input: I, _next: Next<I, O>) -> Result<O, FlowcellError> {
        Err(FlowcellError::middleware(anyhow::anyhow!(
            "{}",
            self.message
        )))
    }
}

/// A middleware that sleeps before delegating.
#[derive(Debug)]
pub struct SlowMiddleware {
    name: String,
    delay: Duration,
}

impl SlowMiddleware {
    /// Creates a slow middleware.
    #[must_use]
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
        }
    }

    /// Creates a slow middleware with delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(name: impl Into<String>, ms: u64) -> Self {
        Self::new(name, Duration::from_millis(ms))
    }
}

#[async_trait]
impl<I, O> Middleware<I, O> for SlowMiddleware
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, input: I, next: Next<I, O>) -> Result<O, FlowcellError> {
        tokio::time::sleep(self.delay).await;
        next.run(input).await
    }
}

/// A middleware that returns its input unchanged without delegating.
///
/// Useful as the innermost step of a pipeline whose input and output types
/// coincide.
#[derive(Debug, Default)]
pub struct EchoMiddleware;

#[async_trait]
impl<T> Middleware<T, T> for EchoMiddleware
where
    T: Send + 'static,
{
    fn name(&self) -> &str {
        "echo"
    }

    async fn handle(&self, input: T, _next: Next<T, T>) -> Result<T, FlowcellError> {
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineBuilder;

    #[test]
    fn test_probe_log_records_in_order() {
        let log = ProbeLog::new();
        assert!(log.is_empty());

        log.push("a");
        log.push("b");

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries(), vec!["a", "b"]);

        log.clear();
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_recording_middleware_wraps_delegation() {
        let log = ProbeLog::new();
        let pipeline = PipelineBuilder::<i32, i32>::new("probe")
            .with(RecordingMiddleware::new("probe", log.clone()))
            .with(EchoMiddleware)
            .build();

        pipeline.run(1).await.unwrap();
        assert_eq!(log.entries(), vec!["probe-before", "probe-after"]);
    }

    #[tokio::test]
    async fn test_short_circuit_middleware_skips_downstream() {
        let log = ProbeLog::new();
        let pipeline = PipelineBuilder::<i32, i32>::new("short")
            .with(ShortCircuitMiddleware::new("stop", -1))
            .with(RecordingMiddleware::new("unreached", log.clone()))
            .build();

        assert_eq!(pipeline.run(5).await.unwrap(), -1);
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_failing_middleware() {
        let pipeline = PipelineBuilder::<i32, i32>::new("failing")
            .with(FailingMiddleware::new("bad", "expected failure"))
            .build();

        let err = pipeline.run(1).await.unwrap_err();
        assert_eq!(err.to_string(), "expected failure");
    }

    #[tokio::test]
    async fn test_slow_middleware_delays() {
        let pipeline = PipelineBuilder::<i32, i32>::new("slow")
            .with(SlowMiddleware::with_delay_ms("slow", 10))
            .with(EchoMiddleware)
            .build();

        let start = std::time::Instant::now();
        pipeline.run(1).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_echo_middleware() {
        let pipeline = PipelineBuilder::<String, String>::new("echo")
            .with(EchoMiddleware)
            .build();

        assert_eq!(pipeline.run("hi".to_string()).await.unwrap(), "hi");
    }
}
