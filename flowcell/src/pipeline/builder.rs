//! Pipeline builder: ordered middleware registration.

use super::lazy::LazySlot;
use super::middleware::{FnMiddleware, Middleware, Next, Terminal};
use super::runner::Pipeline;
use crate::errors::FlowcellError;
use crate::events::EventSink;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// A registered chain entry: a ready middleware or a lazy slot.
pub(crate) enum Step<I, O> {
    Ready(Arc<dyn Middleware<I, O>>),
    Lazy(LazySlot<I, O>),
}

/// Builder for [`Pipeline`]s.
///
/// Middleware are appended in registration order; the first registered is
/// outermost when the chain runs (its "before next" code runs first, its
/// "after next" code runs last). [`build`](PipelineBuilder::build) freezes
/// the chain into a runnable, immutable pipeline.
///
/// ```rust,ignore
/// let pipeline = PipelineBuilder::<String, String>::new("greet")
///     .with(TimingMiddleware::default())
///     .with_fn("shout", |input, next| async move {
///         next.run(input.to_uppercase()).await
///     })
///     .terminal(|name| async move { Ok(format!("hello, {name}")) })
///     .build();
/// ```
pub struct PipelineBuilder<I, O> {
    name: String,
    steps: Vec<Step<I, O>>,
    terminal: Option<Arc<Terminal<I, O>>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl<I, O> PipelineBuilder<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Creates a named builder with no middleware.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            terminal: None,
            sink: None,
        }
    }

    /// Appends a middleware.
    #[must_use]
    pub fn with<M>(mut self, middleware: M) -> Self
    where
        M: Middleware<I, O> + 'static,
    {
        self.steps.push(Step::Ready(Arc::new(middleware)));
        self
    }

    /// Appends an already-shared middleware.
    #[must_use]
    pub fn with_shared(mut self, middleware: Arc<dyn Middleware<I, O>>) -> Self {
        self.steps.push(Step::Ready(middleware));
        self
    }

    /// Appends an inline middleware built from an async closure.
    #[must_use]
    pub fn with_fn<F, Fut>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(I, Next<I, O>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, FlowcellError>> + Send + 'static,
    {
        self.with(FnMiddleware::new(name, func))
    }

    /// Appends a lazily-constructed middleware.
    ///
    /// The factory runs at most once, when the first run of the chain
    /// assembles it; concurrent first runs share the single resolution. A
    /// failing factory fails that run and is retried on the next one.
    /// Laziness does not change the slot's position in the chain.
    #[must_use]
    pub fn with_lazy<F, Fut>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Arc<dyn Middleware<I, O>>>> + Send + 'static,
    {
        self.steps.push(Step::Lazy(LazySlot::new(name, factory)));
        self
    }

    /// Installs a terminal handler, invoked when every middleware has
    /// delegated.
    ///
    /// Without one, invoking `next` past the last middleware is an error
    /// ([`FlowcellError::ChainExhausted`]).
    #[must_use]
    pub fn terminal<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, FlowcellError>> + Send + 'static,
    {
        self.terminal = Some(Arc::new(
            move |input: I| -> BoxFuture<'static, Result<O, FlowcellError>> {
                Box::pin(handler(input))
            },
        ));
        self
    }

    /// Overrides the event sink for this pipeline instead of the global
    /// registry.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Returns the builder's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of registered steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if no steps are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Freezes the chain into a runnable [`Pipeline`].
    #[must_use]
    pub fn build(self) -> Pipeline<I, O> {
        Pipeline::from_parts(self.name, self.steps, self.terminal, self.sink)
    }
}
