//! Nested pipeline invocation that preserves the caller's active container.

use super::runner::Pipeline;
use crate::context::{current_container_or_default, run_in_scope, Container};
use crate::errors::FlowcellError;
use crate::events::topics;
use std::sync::Arc;

/// A pipeline bound to the container that was active when
/// [`use_pipeline`] captured it.
///
/// Calling [`call`](BoundPipeline::call) executes the chain inside that
/// container without pushing a new layer, so context writes inside the
/// nested pipeline are visible to the caller afterward, and the caller's
/// earlier writes are visible inside. A plain [`Pipeline::run`] gives
/// neither guarantee: it creates a child container of its own.
pub struct BoundPipeline<I, O> {
    pipeline: Pipeline<I, O>,
    container: Arc<Container>,
}

impl<I, O> BoundPipeline<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Returns the captured container.
    #[must_use]
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Returns the underlying pipeline's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.pipeline.name()
    }

    /// Runs the nested chain inside the captured container.
    ///
    /// # Errors
    ///
    /// Whatever the chain returns; see [`Pipeline::run`].
    pub async fn call(&self, input: I) -> Result<O, FlowcellError> {
        self.pipeline.event_sink().try_emit(
            topics::RUN_NESTED,
            Some(serde_json::json!({
                "pipeline": self.pipeline.name(),
            })),
        );

        let chain = self.pipeline.chain().await?;
        run_in_scope(Arc::clone(&self.container), chain.run(input)).await
    }
}

/// Binds `pipeline` to the currently-active container, eagerly.
///
/// Capture happens here, not when the returned [`BoundPipeline`] is later
/// invoked: by the time the bound call executes, possibly after an
/// asynchronous hop, the active scope may already be a different one.
/// The supported pattern is to call `use_pipeline` inside a middleware
/// body and invoke the result within that same body.
///
/// Outside any active scope the binding captures a fresh detached
/// container, which behaves like a plain isolated [`Pipeline::run`].
#[must_use]
pub fn use_pipeline<I, O>(pipeline: &Pipeline<I, O>) -> BoundPipeline<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    BoundPipeline {
        pipeline: pipeline.clone(),
        container: current_container_or_default(),
    }
}
