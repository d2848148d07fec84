//! Typed context cells: identity-keyed slots with a default value.

use super::container::Container;
use super::scope;
use crate::errors::FlowcellError;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_CELL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`ContextCell`].
///
/// Ids are issued from a monotonically increasing counter and are never
/// reused, so two cells compare equal only if they are the same instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(u64);

impl CellId {
    fn next() -> Self {
        Self(NEXT_CELL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

/// A typed, identity-keyed context slot with a default value.
///
/// Cells are created once at initialization time and are immutable
/// thereafter. The cell itself carries no state beyond identity and
/// default; the current value lives in the active [`Container`] of the
/// calling task's execution scope.
///
/// Reads and writes go through the active scope, so middleware can share
/// request-scoped state without threading parameters:
///
/// ```rust,ignore
/// let principal = ContextCell::new("principal", String::new());
///
/// // inside a middleware body, within a pipeline run:
/// principal.set("alice".to_string());
/// assert_eq!(principal.get(), "alice");
/// ```
pub struct ContextCell<T> {
    id: CellId,
    name: &'static str,
    default: T,
    required: bool,
}

impl<T> ContextCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a new cell with the given diagnostic name and default value.
    #[must_use]
    pub fn new(name: &'static str, default: T) -> Self {
        Self {
            id: CellId::next(),
            name,
            default,
            required: false,
        }
    }

    /// Creates a cell whose [`assert`](Self::assert) demands an explicit
    /// binding somewhere in the active container chain.
    #[must_use]
    pub fn required(name: &'static str, default: T) -> Self {
        Self {
            id: CellId::next(),
            name,
            default,
            required: true,
        }
    }

    /// Returns the cell's unique identity.
    #[must_use]
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Returns the cell's diagnostic name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the cell's default value.
    #[must_use]
    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Returns true if the cell was created with [`required`](Self::required).
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Reads the nearest bound value through the active scope's container
    /// chain, falling back to the default.
    ///
    /// Outside any active scope the read degrades to the default value
    /// rather than failing.
    #[must_use]
    pub fn get(&self) -> T {
        match scope::current_container() {
            Some(container) => container.lookup(self),
            None => self.default.clone(),
        }
    }

    /// Binds a value into the active container's local map.
    ///
    /// The write targets the active container only; parent containers are
    /// never mutated, so sibling scopes sharing the same parent keep their
    /// own view. Outside any active scope the write has nowhere to land
    /// and is dropped with a warning.
    pub fn set(&self, value: T) {
        match scope::current_container() {
            Some(container) => container.bind(self, value),
            None => {
                tracing::warn!(
                    cell = self.name,
                    "context write outside an active scope; value dropped"
                );
            }
        }
    }

    /// Like [`get`](Self::get), but fails when the cell is required and no
    /// explicit binding exists anywhere in the active chain.
    ///
    /// # Errors
    ///
    /// [`FlowcellError::MissingContextValue`] for an unbound required cell.
    pub fn assert(&self) -> Result<T, FlowcellError> {
        let container: Option<Arc<Container>> = scope::current_container();
        let bound = container.as_ref().is_some_and(|c| c.has_binding(self));

        if self.required && !bound {
            return Err(FlowcellError::missing_context_value(self.name));
        }

        Ok(container.map_or_else(|| self.default.clone(), |c| c.lookup(self)))
    }
}

impl<T> PartialEq for ContextCell<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ContextCell<T> {}

impl<T> fmt::Debug for ContextCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextCell")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}
