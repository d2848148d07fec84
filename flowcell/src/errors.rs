//! Error types for the flowcell pipeline core.
//!
//! The core never swallows an error: middleware failures propagate to the
//! enclosing middleware's `next.run(..)` call site unchanged, and recovery
//! is always an explicit middleware concern.

use thiserror::Error;

/// The main error type for flowcell operations.
#[derive(Debug, Error)]
pub enum FlowcellError {
    /// A required context cell was read with no explicit binding anywhere
    /// in the active container chain.
    #[error("Missing context value: cell '{cell}' is required but has no binding")]
    MissingContextValue {
        /// The cell's diagnostic name.
        cell: String,
    },

    /// A middleware invoked its continuation past the last registered
    /// middleware of a pipeline with no terminal handler installed.
    #[error("Chain exhausted: pipeline '{pipeline}' has no handler past the last middleware")]
    ChainExhausted {
        /// The pipeline name.
        pipeline: String,
    },

    /// A lazily-registered middleware factory failed.
    ///
    /// The slot stays unresolved, so the next chain invocation retries the
    /// factory.
    #[error("Lazy middleware '{middleware}' failed to initialize: {message}")]
    LazyInit {
        /// The lazy slot name.
        middleware: String,
        /// The factory failure, rendered.
        message: String,
    },

    /// An error raised by a middleware body, carried unchanged.
    ///
    /// Downcast through [`anyhow::Error`] to recover the original type.
    #[error(transparent)]
    Middleware(#[from] anyhow::Error),
}

impl FlowcellError {
    /// Creates a missing-context-value error.
    #[must_use]
    pub fn missing_context_value(cell: impl Into<String>) -> Self {
        Self::MissingContextValue { cell: cell.into() }
    }

    /// Creates a chain-exhausted error.
    #[must_use]
    pub fn chain_exhausted(pipeline: impl Into<String>) -> Self {
        Self::ChainExhausted {
            pipeline: pipeline.into(),
        }
    }

    /// Creates a lazy-initialization error from a factory failure.
    #[must_use]
    pub fn lazy_init(middleware: impl Into<String>, source: &anyhow::Error) -> Self {
        Self::LazyInit {
            middleware: middleware.into(),
            message: format!("{source:#}"),
        }
    }

    /// Creates a middleware error from any error value.
    #[must_use]
    pub fn middleware(err: impl Into<anyhow::Error>) -> Self {
        Self::Middleware(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_context_value_display() {
        let err = FlowcellError::missing_context_value("request_id");
        assert!(err.to_string().contains("request_id"));
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn test_chain_exhausted_display() {
        let err = FlowcellError::chain_exhausted("ingest");
        assert_eq!(
            err.to_string(),
            "Chain exhausted: pipeline 'ingest' has no handler past the last middleware"
        );
    }

    #[test]
    fn test_lazy_init_display() {
        let source = anyhow::anyhow!("connection refused");
        let err = FlowcellError::lazy_init("auth", &source);
        assert!(err.to_string().contains("auth"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_middleware_error_is_transparent() {
        let err: FlowcellError = anyhow::anyhow!("boom").into();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_middleware_error_downcast() {
        #[derive(Debug, Error)]
        #[error("custom failure")]
        struct CustomError;

        let err = FlowcellError::middleware(CustomError);
        match err {
            FlowcellError::Middleware(inner) => {
                assert!(inner.downcast_ref::<CustomError>().is_some());
            }
            other => panic!("expected Middleware variant, got {other:?}"),
        }
    }
}
