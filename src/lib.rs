//! # content-transformer: Pluggable Content Transformation Pipeline
//!
//! Independently registered transformer plugins, each bound to a content type,
//! are applied in sequence to a piece of content. The output of one feeds the
//! next; a failing transformer is reported and skipped, never aborting the
//! chain.
//!
//! ## Features
//!
//! - **Content-type dispatch**: transformers are selected by plain key equality
//! - **Chaining**: each transformer sees the previous transformer's output
//! - **Fail-open**: failures (and panics) are logged, the content passes through
//! - **Explicit outcomes**: `Transformed`, `NoOpinion` and `Err` are distinct
//! - **Live registry**: register and unregister at any time, from any thread
//! - **YAML pipelines**: built-in string transformers wired from a config file
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use content_transformer::{ContentType, FnTransformer, InMemoryRegistry, Outcome, TransformationEngine};
//!
//! let registry = Arc::new(InMemoryRegistry::new());
//! let text = ContentType::new("text/plain");
//!
//! registry.register(
//!     FnTransformer::new("greet", text.clone(), |s: &String| {
//!         Ok(Outcome::Transformed(format!("hello, {s}")))
//!     })
//!     .shared(),
//! );
//!
//! let engine = TransformationEngine::new(registry);
//! assert_eq!(engine.transform(&text, "world".to_string()), "hello, world");
//! ```

// Core modules
pub mod content_type;
pub mod transformer;
pub mod registry;
pub mod engine;

// Built-in transformers and pipeline files
pub mod builtin;
pub mod config;

pub mod logging;

// Re-export key types
pub use content_type::ContentType;
pub use transformer::{FnTransformer, Outcome, TransformError, Transformer};
pub use registry::{InMemoryRegistry, RegistrationId, RegistrationInfo, TransformerRegistry};
pub use engine::{
    FailureRecord, FailureReporter, Severity, StepOutcome, StepRecord, TracingReporter,
    TransformReport, TransformationEngine, FAILURE_MESSAGE,
};
pub use config::{ConfigError, EngineConfig, PipelineConfig, TransformerDef};
