//! Transformation engine.
//!
//! Folds a piece of content through every transformer registered for its
//! content type. Each transformer sees the previous one's output. A failing
//! transformer is reported and skipped; the caller always gets content back.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::content_type::ContentType;
use crate::registry::TransformerRegistry;
use crate::transformer::{Outcome, TransformError, Transformer};

/// Message attached to every failure record.
pub const FAILURE_MESSAGE: &str = "Error processing content";

/// Severity of a failure record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warn,
    Error,
}

/// One transformer failure, as handed to the [`FailureReporter`].
#[derive(Debug)]
pub struct FailureRecord<'a> {
    pub severity: Severity,
    pub message: &'static str,
    pub transformer: &'a str,
    pub content_type: &'a str,
    pub cause: &'a TransformError,
}

/// Side channel for transformer failures. Fire and forget.
pub trait FailureReporter: Send + Sync {
    fn report(&self, record: &FailureRecord<'_>);
}

/// Default reporter: one `tracing` error event per failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, record: &FailureRecord<'_>) {
        match record.severity {
            Severity::Error => tracing::error!(
                transformer = record.transformer,
                content_type = record.content_type,
                error = %record.cause,
                "{}",
                record.message
            ),
            Severity::Warn => tracing::warn!(
                transformer = record.transformer,
                content_type = record.content_type,
                error = %record.cause,
                "{}",
                record.message
            ),
        }
    }
}

/// What happened at one step of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Applied,
    Declined,
    Failed { cause: String },
}

/// Record of a single transformer invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub transformer: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Result of [`TransformationEngine::transform_with_report`].
#[derive(Debug, Clone, Serialize)]
pub struct TransformReport<T> {
    pub content_type: String,
    pub content: T,
    pub steps: Vec<StepRecord>,
}

impl<T> TransformReport<T> {
    /// At least one transformer produced new content.
    pub fn changed(&self) -> bool {
        self.steps
            .iter()
            .any(|step| step.outcome == StepOutcome::Applied)
    }

    /// Number of transformers that failed.
    pub fn failures(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step.outcome, StepOutcome::Failed { .. }))
            .count()
    }

    pub fn into_content(self) -> T {
        self.content
    }
}

/// Best-effort chain over the transformers registered for a content type.
///
/// The engine holds no per-call state; share it freely between threads.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use content_transformer::{ContentType, FnTransformer, InMemoryRegistry, Outcome, TransformationEngine};
///
/// let registry = Arc::new(InMemoryRegistry::new());
/// let html = ContentType::new("text/html");
/// registry.register(
///     FnTransformer::new("https", html.clone(), |s: &String| {
///         Ok(Outcome::from_option(s.contains("http://").then(|| s.replace("http://", "https://"))))
///     })
///     .shared(),
/// );
///
/// let engine = TransformationEngine::new(registry);
/// let out = engine.transform(&html, "<a href=\"http://x\">".to_string());
/// assert_eq!(out, "<a href=\"https://x\">");
/// ```
pub struct TransformationEngine<T> {
    registry: Arc<dyn TransformerRegistry<T>>,
    reporter: Arc<dyn FailureReporter>,
    config: EngineConfig,
}

impl<T> TransformationEngine<T> {
    /// Create an engine reading from `registry`, reporting through `tracing`.
    pub fn new(registry: Arc<dyn TransformerRegistry<T>>) -> Self {
        Self {
            registry,
            reporter: Arc::new(TracingReporter),
            config: EngineConfig::default(),
        }
    }

    /// Replace the failure reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn FailureReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Transform `content` with every transformer registered for
    /// `content_type`, in registration order.
    ///
    /// Never fails. When nothing applies, `content` itself is returned.
    pub fn transform(&self, content_type: &ContentType<T>, content: T) -> T {
        self.fold(content_type, content, |_, _| {})
    }

    /// Same as [`transform`](Self::transform), also recording each step.
    pub fn transform_with_report(&self, content_type: &ContentType<T>, content: T) -> TransformReport<T> {
        let mut steps = Vec::new();
        let content = self.fold(content_type, content, |transformer, outcome| {
            steps.push(StepRecord {
                transformer: transformer.to_string(),
                outcome,
            });
        });

        TransformReport {
            content_type: content_type.key().to_string(),
            content,
            steps,
        }
    }

    fn fold<F>(&self, content_type: &ContentType<T>, content: T, mut on_step: F) -> T
    where
        F: FnMut(&str, StepOutcome),
    {
        let transformers = self.registry.transformers_for(content_type);
        if transformers.is_empty() {
            tracing::trace!("No transformers registered for '{}'", content_type);
            return content;
        }

        let mut current = content;
        for transformer in &transformers {
            match self.invoke(transformer.as_ref(), &current) {
                Ok(Outcome::Transformed(next)) => {
                    tracing::trace!("Transformer '{}' applied", transformer.name());
                    current = next;
                    on_step(transformer.name(), StepOutcome::Applied);
                }
                Ok(Outcome::NoOpinion) => {
                    tracing::trace!("Transformer '{}' declined", transformer.name());
                    on_step(transformer.name(), StepOutcome::Declined);
                }
                Err(err) => {
                    self.reporter.report(&FailureRecord {
                        severity: Severity::Error,
                        message: FAILURE_MESSAGE,
                        transformer: transformer.name(),
                        content_type: content_type.key(),
                        cause: &err,
                    });
                    on_step(
                        transformer.name(),
                        StepOutcome::Failed {
                            cause: err.to_string(),
                        },
                    );
                }
            }
        }

        current
    }

    fn invoke(&self, transformer: &dyn Transformer<T>, content: &T) -> Result<Outcome<T>, TransformError> {
        if !self.config.isolate_panics {
            return transformer.transform(content);
        }

        // Content is only borrowed shared here.
        panic::catch_unwind(AssertUnwindSafe(|| transformer.transform(content)))
            .unwrap_or_else(|payload| Err(TransformError::Panicked(panic_message(payload.as_ref()))))
    }
}

impl<T> fmt::Debug for TransformationEngine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformationEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
