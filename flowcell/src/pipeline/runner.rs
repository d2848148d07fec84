//! Pipeline execution: container setup, scope activation, chain drive.

use super::builder::Step;
use super::middleware::{Middleware, Next, Terminal};
use crate::context::{current_container, run_in_scope, Container};
use crate::errors::FlowcellError;
use crate::events::{get_event_sink, topics, EventSink};
use crate::utils::RunStamp;
use std::sync::Arc;
use std::time::Instant;

/// Options accepted by [`Pipeline::run_with`].
#[derive(Default)]
pub struct RunOptions {
    /// Use this container as-is instead of creating one.
    ///
    /// Enables deterministic tests, environment injection, and deliberate
    /// state sharing across runs.
    pub container: Option<Arc<Container>>,
}

impl RunOptions {
    /// Options that run inside `container` without creating a new one.
    #[must_use]
    pub fn in_container(container: Arc<Container>) -> Self {
        Self {
            container: Some(container),
        }
    }
}

pub(crate) struct PipelineInner<I, O> {
    name: Arc<str>,
    steps: Vec<Step<I, O>>,
    terminal: Option<Arc<Terminal<I, O>>>,
    sink: Option<Arc<dyn EventSink>>,
}

/// An ordered, composed middleware chain with a single entry point.
///
/// A pipeline is immutable once built and cheap to clone (the chain is
/// shared). It is re-entrant: every [`run`](Pipeline::run) activates its
/// own container and scope, so concurrent and recursive runs never
/// observe each other's context mutations unless a container is shared
/// explicitly.
pub struct Pipeline<I, O> {
    inner: Arc<PipelineInner<I, O>>,
}

impl<I, O> Clone for Pipeline<I, O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I, O> Pipeline<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub(crate) fn from_parts(
        name: String,
        steps: Vec<Step<I, O>>,
        terminal: Option<Arc<Terminal<I, O>>>,
        sink: Option<Arc<dyn EventSink>>,
    ) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                name: Arc::from(name),
                steps,
                terminal,
                sink,
            }),
        }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the number of registered steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.steps.len()
    }

    /// Returns true if no steps are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.steps.is_empty()
    }

    /// Runs the chain with a fresh container.
    ///
    /// The container inherits from the currently-active container when one
    /// exists, so a recursive run layers its local bindings over the
    /// caller's without mutating them; sibling recursive runs stay
    /// isolated from each other.
    ///
    /// # Errors
    ///
    /// Whatever the chain returns, plus [`FlowcellError::LazyInit`] when a
    /// lazy slot's factory fails.
    pub async fn run(&self, input: I) -> Result<O, FlowcellError> {
        self.run_with(input, RunOptions::default()).await
    }

    /// Runs the chain with explicit options.
    ///
    /// # Errors
    ///
    /// See [`run`](Pipeline::run).
    pub async fn run_with(&self, input: I, options: RunOptions) -> Result<O, FlowcellError> {
        let container = options.container.unwrap_or_else(|| {
            current_container().map_or_else(
                || Arc::new(Container::new()),
                |active| Arc::new(Container::with_parent(active)),
            )
        });

        let stamp = RunStamp::new();
        let sink = self.event_sink();
        sink.try_emit(
            topics::RUN_STARTED,
            Some(serde_json::json!({
                "pipeline": self.inner.name.as_ref(),
                "run": serde_json::to_value(&stamp).unwrap_or_default(),
            })),
        );

        let started = Instant::now();
        let result = match self.chain().await {
            Ok(chain) => run_in_scope(container, chain.run(input)).await,
            Err(err) => Err(err),
        };
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &result {
            Ok(_) => {
                sink.try_emit(
                    topics::RUN_COMPLETED,
                    Some(serde_json::json!({
                        "pipeline": self.inner.name.as_ref(),
                        "run_id": stamp.run_id.to_string(),
                        "duration_ms": duration_ms,
                    })),
                );
            }
            Err(err) => {
                tracing::debug!(
                    pipeline = %self.inner.name,
                    error = %err,
                    "pipeline run failed"
                );
                sink.try_emit(
                    topics::RUN_FAILED,
                    Some(serde_json::json!({
                        "pipeline": self.inner.name.as_ref(),
                        "run_id": stamp.run_id.to_string(),
                        "duration_ms": duration_ms,
                        "error": err.to_string(),
                    })),
                );
            }
        }

        result
    }

    /// Resolves lazy slots and assembles the continuation chain for one
    /// run.
    pub(crate) async fn chain(&self) -> Result<Next<I, O>, FlowcellError> {
        let mut steps: Vec<Arc<dyn Middleware<I, O>>> =
            Vec::with_capacity(self.inner.steps.len());

        for step in &self.inner.steps {
            match step {
                Step::Ready(middleware) => steps.push(Arc::clone(middleware)),
                Step::Lazy(slot) => steps.push(slot.resolve().await?),
            }
        }

        Ok(Next {
            pipeline: Arc::clone(&self.inner.name),
            steps: steps.into(),
            index: 0,
            terminal: self.inner.terminal.clone(),
        })
    }

    pub(crate) fn event_sink(&self) -> Arc<dyn EventSink> {
        self.inner.sink.clone().unwrap_or_else(get_event_sink)
    }
}
