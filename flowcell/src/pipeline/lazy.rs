//! Lazily-resolved middleware slots.

use super::middleware::Middleware;
use crate::errors::FlowcellError;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

type Factory<I, O> =
    dyn Fn() -> BoxFuture<'static, anyhow::Result<Arc<dyn Middleware<I, O>>>> + Send + Sync;

/// A middleware slot whose construction is deferred to the first run of
/// the owning chain.
///
/// Resolution is race-safe: concurrent first invocations elect one factory
/// call and the rest await and reuse its result. A factory error fails the
/// run that triggered it and leaves the slot empty, so the next invocation
/// retries the factory.
///
/// Deferral is purely a startup-cost optimization; a lazy slot occupies
/// its registration position in the chain like any other middleware.
pub(crate) struct LazySlot<I, O> {
    name: String,
    factory: Box<Factory<I, O>>,
    cell: OnceCell<Arc<dyn Middleware<I, O>>>,
}

impl<I, O> LazySlot<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub(crate) fn new<F, Fut>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Arc<dyn Middleware<I, O>>>> + Send + 'static,
    {
        Self {
            name: name.into(),
            factory: Box::new(move || -> BoxFuture<'static, anyhow::Result<Arc<dyn Middleware<I, O>>>> {
                Box::pin(factory())
            }),
            cell: OnceCell::new(),
        }
    }

    /// Resolves the slot, invoking the factory at most once overall.
    pub(crate) async fn resolve(&self) -> Result<Arc<dyn Middleware<I, O>>, FlowcellError> {
        let resolved = self
            .cell
            .get_or_try_init(|| async {
                let middleware = (self.factory)().await?;
                tracing::debug!(middleware = %self.name, "lazy middleware resolved");
                Ok::<_, anyhow::Error>(middleware)
            })
            .await
            .map_err(|err| FlowcellError::lazy_init(self.name.as_str(), &err))?;

        Ok(Arc::clone(resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::middleware::{FnMiddleware, Next};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn passthrough() -> Arc<dyn Middleware<i32, i32>> {
        Arc::new(FnMiddleware::new(
            "passthrough",
            |input: i32, next: Next<i32, i32>| async move { next.run(input).await },
        ))
    }

    #[tokio::test]
    async fn test_factory_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let slot = LazySlot::new("lazy", move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(passthrough())
            }
        });

        slot.resolve().await.unwrap();
        slot.resolve().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_factory_failure_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let slot = LazySlot::new("flaky", move || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    anyhow::bail!("not ready");
                }
                Ok(passthrough())
            }
        });

        let err = match slot.resolve().await {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(err, FlowcellError::LazyInit { .. }));

        slot.resolve().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_message_names_the_slot() {
        let slot: LazySlot<i32, i32> =
            LazySlot::new("named", || async { anyhow::bail!("unavailable") });

        let err = match slot.resolve().await {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(err.to_string().contains("named"));
        assert!(err.to_string().contains("unavailable"));
    }
}
