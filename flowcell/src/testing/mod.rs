//! Testing utilities for flowcell pipelines.
//!
//! This module provides:
//! - Mock middleware for order, failure, and timing scenarios
//! - A recording event sink for lifecycle assertions
//! - Tracing setup for test output

mod fixtures;
mod mocks;

pub use fixtures::{init_test_tracing, RecordingEventSink};
pub use mocks::{
    EchoMiddleware, FailingMiddleware, ProbeLog, RecordingMiddleware, ShortCircuitMiddleware,
    SlowMiddleware,
};
