//! Context management: cells, containers, and execution scopes.
//!
//! This module provides:
//! - Typed context cells with identity-keyed defaults
//! - Per-run containers with parent inheritance
//! - Task-local scope propagation of the active container

mod cell;
mod container;
pub mod scope;

pub use cell::{CellId, ContextCell};
pub use container::{Container, ContainerBuilder};
pub use scope::{
    current_container, current_container_or_default, has_active_scope, run_in_scope, sync_scope,
};
