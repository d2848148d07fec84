//! Per-run containers binding context cells to values.

use super::cell::{CellId, ContextCell};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type BoxedValue = Arc<dyn Any + Send + Sync>;

/// A per-execution store of context cell bindings with optional parent
/// inheritance.
///
/// Lookups check the local map first, then walk the parent chain, then
/// fall back to the cell's default, so a lookup never fails. Writes go to
/// the local map only; parents and siblings are never mutated through a
/// child.
///
/// Containers are normally created by the pipeline runner, one per run.
/// They can also be constructed explicitly with preset bindings for tests
/// or fixed multi-environment setups (see [`Container::preset`]).
#[derive(Default)]
pub struct Container {
    bindings: RwLock<HashMap<CellId, BoxedValue>>,
    parent: Option<Arc<Container>>,
}

impl Container {
    /// Creates an empty container with no parent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty container inheriting from `parent`.
    #[must_use]
    pub fn with_parent(parent: Arc<Container>) -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
            parent: Some(parent),
        }
    }

    /// Starts a preset-binding builder.
    #[must_use]
    pub fn preset() -> ContainerBuilder {
        ContainerBuilder::default()
    }

    /// Binds `value` to `cell` in this container's local map, overwriting
    /// any previous local binding.
    pub fn bind<T>(&self, cell: &ContextCell<T>, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        self.bindings.write().insert(cell.id(), Arc::new(value));
    }

    /// Returns the nearest bound value for `cell`, else its default.
    #[must_use]
    pub fn lookup<T>(&self, cell: &ContextCell<T>) -> T
    where
        T: Clone + Send + Sync + 'static,
    {
        self.lookup_raw(cell.id())
            .and_then(|value| value.downcast_ref::<T>().cloned())
            .unwrap_or_else(|| cell.default_value().clone())
    }

    /// Returns true if `cell` has an explicit binding in this container or
    /// any ancestor.
    #[must_use]
    pub fn has_binding<T>(&self, cell: &ContextCell<T>) -> bool
    where
        T: Clone + Send + Sync + 'static,
    {
        self.lookup_raw(cell.id()).is_some()
    }

    fn lookup_raw(&self, id: CellId) -> Option<BoxedValue> {
        if let Some(value) = self.bindings.read().get(&id) {
            return Some(Arc::clone(value));
        }
        self.parent.as_ref().and_then(|parent| parent.lookup_raw(id))
    }

    /// Returns the parent container, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Container>> {
        self.parent.as_ref()
    }

    /// Returns the number of local bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    /// Returns true if the container has no local bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.read().is_empty()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.len())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// Builder for containers with preset bindings.
///
/// Useful for deterministic tests and for running the same pipeline
/// against several fixed environments without a scope in place.
#[derive(Default)]
pub struct ContainerBuilder {
    bindings: HashMap<CellId, BoxedValue>,
}

impl ContainerBuilder {
    /// Adds a preset binding.
    #[must_use]
    pub fn binds<T>(mut self, cell: &ContextCell<T>, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.bindings.insert(cell.id(), Arc::new(value));
        self
    }

    /// Finishes the builder into a parentless container.
    #[must_use]
    pub fn build(self) -> Arc<Container> {
        Arc::new(Container {
            bindings: RwLock::new(self.bindings),
            parent: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_and_lookup() {
        let cell = ContextCell::new("key", 0_i32);
        let container = Container::new();

        container.bind(&cell, 7);
        assert_eq!(container.lookup(&cell), 7);
        assert!(container.has_binding(&cell));
    }

    #[test]
    fn test_lookup_falls_back_to_default() {
        let cell = ContextCell::new("unbound", "default".to_string());
        let container = Container::new();

        assert_eq!(container.lookup(&cell), "default");
        assert!(!container.has_binding(&cell));
    }

    #[test]
    fn test_bind_overwrites_local_binding() {
        let cell = ContextCell::new("key", 0_i32);
        let container = Container::new();

        container.bind(&cell, 1);
        container.bind(&cell, 2);
        assert_eq!(container.lookup(&cell), 2);
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_lookup_walks_parent_chain() {
        let cell = ContextCell::new("inherited", 0_i32);
        let grandparent = Arc::new(Container::new());
        grandparent.bind(&cell, 10);

        let parent = Arc::new(Container::with_parent(grandparent));
        let child = Container::with_parent(parent);

        assert_eq!(child.lookup(&cell), 10);
        assert!(child.has_binding(&cell));
        assert!(child.is_empty());
    }

    #[test]
    fn test_child_write_does_not_touch_parent() {
        let cell = ContextCell::new("shadowed", 0_i32);
        let parent = Arc::new(Container::new());
        parent.bind(&cell, 1);

        let child = Container::with_parent(Arc::clone(&parent));
        child.bind(&cell, 2);

        assert_eq!(child.lookup(&cell), 2);
        assert_eq!(parent.lookup(&cell), 1);
    }

    #[test]
    fn test_siblings_are_isolated() {
        let cell = ContextCell::new("sibling", 0_i32);
        let parent = Arc::new(Container::new());

        let left = Container::with_parent(Arc::clone(&parent));
        let right = Container::with_parent(Arc::clone(&parent));

        left.bind(&cell, 1);
        assert_eq!(left.lookup(&cell), 1);
        assert_eq!(right.lookup(&cell), 0);
    }

    #[test]
    fn test_preset_builder() {
        let count = ContextCell::new("count", 0_i32);
        let label = ContextCell::new("label", String::new());

        let container = Container::preset()
            .binds(&count, 3)
            .binds(&label, "staging".to_string())
            .build();

        assert_eq!(container.lookup(&count), 3);
        assert_eq!(container.lookup(&label), "staging");
        assert_eq!(container.len(), 2);
        assert!(container.parent().is_none());
    }

    #[test]
    fn test_cells_of_same_type_do_not_collide() {
        let a = ContextCell::new("a", 0_i32);
        let b = ContextCell::new("b", 0_i32);
        let container = Container::new();

        container.bind(&a, 1);
        assert_eq!(container.lookup(&a), 1);
        assert_eq!(container.lookup(&b), 0);
    }

    #[test]
    fn test_container_debug() {
        let container = Container::new();
        let rendered = format!("{container:?}");
        assert!(rendered.contains("bindings"));
    }
}
