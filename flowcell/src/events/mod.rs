//! Event emission for pipeline lifecycle observability.
//!
//! The runner reports run starts, completions, failures, and lazy-slot
//! resolutions to an [`EventSink`]. A sink can be installed per pipeline
//! (`PipelineBuilder::with_event_sink`) or process-wide through the
//! registry below; with neither, events are discarded.

mod sink;

pub use sink::{EventSink, LoggingEventSink, NoOpEventSink};

use parking_lot::RwLock;
use std::sync::Arc;

/// Well-known event topics emitted by the pipeline runner.
pub mod topics {
    /// A pipeline run entered its scope.
    pub const RUN_STARTED: &str = "pipeline.run.started";
    /// A pipeline run completed successfully.
    pub const RUN_COMPLETED: &str = "pipeline.run.completed";
    /// A pipeline run failed with an error.
    pub const RUN_FAILED: &str = "pipeline.run.failed";
    /// A bound pipeline was invoked inside its captured container.
    pub const RUN_NESTED: &str = "pipeline.run.nested";
    /// A lazy middleware slot resolved its factory.
    pub const LAZY_RESOLVED: &str = "pipeline.lazy.resolved";
}

static GLOBAL_EVENT_SINK: RwLock<Option<Arc<dyn EventSink>>> = RwLock::new(None);

/// Sets the process-wide event sink.
pub fn set_event_sink(sink: Arc<dyn EventSink>) {
    *GLOBAL_EVENT_SINK.write() = Some(sink);
}

/// Clears the process-wide event sink.
pub fn clear_event_sink() {
    *GLOBAL_EVENT_SINK.write() = None;
}

/// Gets the process-wide event sink.
///
/// Returns a [`NoOpEventSink`] if no sink is set.
#[must_use]
pub fn get_event_sink() -> Arc<dyn EventSink> {
    GLOBAL_EVENT_SINK
        .read()
        .clone()
        .unwrap_or_else(|| Arc::new(NoOpEventSink))
}
