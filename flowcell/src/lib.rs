//! # Flowcell
//!
//! A typed middleware pipeline with per-run, inheritable execution context.
//!
//! Flowcell composes independently-authored processing steps into ordered
//! chains with onion semantics, and gives them request-scoped shared state
//! without global variables or parameter threading:
//!
//! - **Context cells**: typed slots with defaults, read and written
//!   ambiently from anywhere inside a run
//! - **Containers**: per-run binding stores with parent inheritance
//! - **Execution scopes**: task-local propagation of the active container
//!   across await points
//! - **Pipelines**: continuation-passing middleware chains with lazy slots
//! - **Nested invocation**: `use_pipeline` runs a second chain in the
//!   caller's container instead of an isolated one
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flowcell::prelude::*;
//! use std::sync::Arc;
//!
//! let request_id = Arc::new(ContextCell::new("request_id", String::new()));
//!
//! let cell = Arc::clone(&request_id);
//! let pipeline = PipelineBuilder::<String, String>::new("greet")
//!     .with_fn("tag", move |input, next| {
//!         let cell = Arc::clone(&cell);
//!         async move {
//!             cell.set(generate_uuid().to_string());
//!             next.run(input).await
//!         }
//!     })
//!     .terminal(|name| async move { Ok(format!("hello, {name}")) })
//!     .build();
//!
//! let greeting = pipeline.run("ada".to_string()).await?;
//! assert_eq!(greeting, "hello, ada");
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod context;
pub mod errors;
pub mod events;
pub mod pipeline;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::{
        current_container, current_container_or_default, has_active_scope, run_in_scope,
        sync_scope, CellId, Container, ContainerBuilder, ContextCell,
    };
    pub use crate::errors::FlowcellError;
    pub use crate::events::{
        clear_event_sink, get_event_sink, set_event_sink, EventSink, LoggingEventSink,
        NoOpEventSink,
    };
    pub use crate::pipeline::{
        use_pipeline, BoundPipeline, FnMiddleware, Middleware, Next, Pipeline, PipelineBuilder,
        RunOptions,
    };
    pub use crate::utils::{generate_uuid, iso_timestamp, RunStamp};
}
