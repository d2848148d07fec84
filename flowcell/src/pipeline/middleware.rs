//! The middleware trait and its continuation type.

use crate::errors::FlowcellError;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// The terminal handler invoked when every middleware has delegated.
pub(crate) type Terminal<I, O> =
    dyn Fn(I) -> BoxFuture<'static, Result<O, FlowcellError>> + Send + Sync;

/// A composable processing step in a pipeline.
///
/// A middleware receives the run's input and a [`Next`] continuation for
/// the remainder of the chain. It either invokes the continuation and
/// returns its result (possibly transformed), or returns a value directly
/// without invoking it, short-circuiting the downstream chain.
///
/// [`Next::run`] consumes the continuation, so invoking it a second time
/// does not compile; the onion-ordering guarantee cannot be broken by a
/// double invocation.
///
/// Errors from a middleware body propagate to the enclosing middleware's
/// `next.run(..)` call site as an `Err`. The chain installs no implicit
/// recovery; a middleware that wraps `next.run(..)` and maps the error is
/// the pattern for building an error boundary.
#[async_trait]
pub trait Middleware<I, O>: Send + Sync {
    /// Returns the middleware's name, used in logs and events.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Processes `input`, optionally delegating to the rest of the chain.
    async fn handle(&self, input: I, next: Next<I, O>) -> Result<O, FlowcellError>;
}

/// Continuation over the remainder of a middleware chain.
///
/// Each `run` of a pipeline assembles a fresh `Next` over the resolved
/// middleware list; invoking it drives the next step, and past the last
/// step either the pipeline's terminal handler or a
/// [`FlowcellError::ChainExhausted`] error.
pub struct Next<I, O> {
    pub(crate) pipeline: Arc<str>,
    pub(crate) steps: Arc<[Arc<dyn Middleware<I, O>>]>,
    pub(crate) index: usize,
    pub(crate) terminal: Option<Arc<Terminal<I, O>>>,
}

impl<I, O> Next<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Invokes the next middleware in the chain, or the terminal handler.
    ///
    /// Consumes the continuation: a middleware holds at most one shot at
    /// the downstream chain.
    ///
    /// # Errors
    ///
    /// [`FlowcellError::ChainExhausted`] when invoked past the last
    /// middleware of a pipeline without a terminal handler; otherwise
    /// whatever the downstream chain returns.
    pub async fn run(mut self, input: I) -> Result<O, FlowcellError> {
        match self.steps.get(self.index).map(Arc::clone) {
            Some(step) => {
                self.index += 1;
                step.handle(input, self).await
            }
            None => match self.terminal.as_ref().map(Arc::clone) {
                Some(terminal) => terminal(input).await,
                None => Err(FlowcellError::chain_exhausted(self.pipeline.as_ref())),
            },
        }
    }

    /// Returns the number of steps remaining, excluding the terminal.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.steps.len().saturating_sub(self.index)
    }
}

/// A middleware built from an async closure, for inline steps.
///
/// ```rust,ignore
/// let double = FnMiddleware::new("double", |input: i64, next| async move {
///     next.run(input * 2).await
/// });
/// ```
pub struct FnMiddleware<F> {
    name: String,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a named function middleware.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<I, O, F, Fut> Middleware<I, O> for FnMiddleware<F>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I, Next<I, O>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, FlowcellError>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, input: I, next: Next<I, O>) -> Result<O, FlowcellError> {
        (self.func)(input, next).await
    }
}
