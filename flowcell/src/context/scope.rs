//! Execution scope management: the task-local active container.
//!
//! The scope module is what makes the "ambient" cell API work without any
//! global mutable state: the active [`Container`] is task-local storage,
//! carried by the future that [`run_in_scope`] wraps. It therefore
//! survives `.await` points and cross-thread resumption on a multi-thread
//! runtime, and it is restored (or cleared) when the scoped future
//! completes, fails, or is dropped.
//!
//! # Limitation
//!
//! Task-local state does not cross `tokio::spawn`. A detached task
//! observes no active scope, so cell reads inside it fall back to
//! defaults rather than the spawning scope's bindings. Hand the container
//! over explicitly (`RunOptions::in_container`) when moving work onto a
//! spawned task.

use super::container::Container;
use std::future::Future;
use std::sync::Arc;

tokio::task_local! {
    static ACTIVE_CONTAINER: Arc<Container>;
}

/// Returns the active container for the calling task, if any.
#[must_use]
pub fn current_container() -> Option<Arc<Container>> {
    ACTIVE_CONTAINER.try_with(Arc::clone).ok()
}

/// Returns the active container, or a fresh detached container when no
/// scope is active.
///
/// The detached fallback means reads degrade to cell defaults instead of
/// failing; writes into it are not observable by any other scope.
#[must_use]
pub fn current_container_or_default() -> Arc<Container> {
    current_container().unwrap_or_else(|| Arc::new(Container::new()))
}

/// Returns true if the calling task has an active scope.
#[must_use]
pub fn has_active_scope() -> bool {
    current_container().is_some()
}

/// Executes `fut` with `container` active for the calling task.
///
/// Nested activations shadow the outer container for the duration of the
/// inner future; the outer one is visible again afterward.
pub async fn run_in_scope<F, T>(container: Arc<Container>, fut: F) -> T
where
    F: Future<Output = T>,
{
    ACTIVE_CONTAINER.scope(container, fut).await
}

/// Synchronous counterpart of [`run_in_scope`].
pub fn sync_scope<F, T>(container: Arc<Container>, f: F) -> T
where
    F: FnOnce() -> T,
{
    ACTIVE_CONTAINER.sync_scope(container, f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_scope_by_default() {
        assert!(!has_active_scope());
        assert!(current_container().is_none());
    }

    #[tokio::test]
    async fn test_scope_activates_container() {
        let container = Arc::new(Container::new());
        let seen = run_in_scope(Arc::clone(&container), async { current_container() }).await;

        assert!(seen.is_some_and(|c| Arc::ptr_eq(&c, &container)));
        assert!(!has_active_scope());
    }

    #[tokio::test]
    async fn test_nested_scope_shadows_and_restores() {
        let outer = Arc::new(Container::new());
        let inner = Arc::new(Container::new());

        run_in_scope(Arc::clone(&outer), async {
            let before = current_container_or_default();
            assert!(Arc::ptr_eq(&before, &outer));

            run_in_scope(Arc::clone(&inner), async {
                let active = current_container_or_default();
                assert!(Arc::ptr_eq(&active, &inner));
            })
            .await;

            let after = current_container_or_default();
            assert!(Arc::ptr_eq(&after, &outer));
        })
        .await;
    }

    #[tokio::test]
    async fn test_sync_scope() {
        let container = Arc::new(Container::new());
        let active = sync_scope(Arc::clone(&container), current_container);

        assert!(active.is_some_and(|c| Arc::ptr_eq(&c, &container)));
        assert!(!has_active_scope());
    }

    #[tokio::test]
    async fn test_detached_fallback_is_fresh() {
        let first = current_container_or_default();
        let second = current_container_or_default();

        assert!(!Arc::ptr_eq(&first, &second));
    }
}
