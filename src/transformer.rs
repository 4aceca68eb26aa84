//! Transformer plugin interface.
//!
//! A transformer is a named unit of behaviour bound to exactly one content
//! type. Given a piece of content it either produces new content, declines
//! with [`Outcome::NoOpinion`], or fails with a [`TransformError`].

use std::fmt;
use std::sync::Arc;

use crate::content_type::ContentType;

/// Error raised by a single transformer invocation.
///
/// The engine never returns these to its callers; they are reported through
/// the failure side channel and the chain moves on.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Execution error: {0}")]
    Execution(String),
    #[error("Invalid content: {0}")]
    InvalidContent(String),
    #[error("Transformer panicked: {0}")]
    Panicked(String),
    #[error(transparent)]
    Source(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl TransformError {
    /// Convenience constructor for [`TransformError::Execution`].
    pub fn execution(msg: impl Into<String>) -> Self {
        TransformError::Execution(msg.into())
    }

    /// Convenience constructor for [`TransformError::InvalidContent`].
    pub fn invalid_content(msg: impl Into<String>) -> Self {
        TransformError::InvalidContent(msg.into())
    }
}

/// Successful result of a transformer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The transformer produced new content. An empty value is still a result.
    Transformed(T),
    /// The transformer does not apply to this input; pass it through unchanged.
    NoOpinion,
}

impl<T> Outcome<T> {
    /// Returns `true` for [`Outcome::Transformed`].
    pub fn is_transformed(&self) -> bool {
        matches!(self, Outcome::Transformed(_))
    }

    /// Lift an `Option` into an outcome, treating `None` as no opinion.
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Outcome::Transformed(v),
            None => Outcome::NoOpinion,
        }
    }
}

/// Trait implemented by every transformer plugin.
///
/// Implementations receive the content by shared reference and must return a
/// new value; in-place mutation is not possible.
///
/// # Example
///
/// ```
/// use content_transformer::{ContentType, Outcome, TransformError, Transformer};
///
/// struct Shout {
///     content_type: ContentType<String>,
/// }
///
/// impl Transformer<String> for Shout {
///     fn name(&self) -> &str {
///         "shout"
///     }
///
///     fn content_type(&self) -> &ContentType<String> {
///         &self.content_type
///     }
///
///     fn transform(&self, content: &String) -> Result<Outcome<String>, TransformError> {
///         if content.chars().any(|c| c.is_lowercase()) {
///             Ok(Outcome::Transformed(content.to_uppercase()))
///         } else {
///             Ok(Outcome::NoOpinion)
///         }
///     }
/// }
/// ```
pub trait Transformer<T>: Send + Sync {
    /// Human readable name, used in failure records and reports.
    fn name(&self) -> &str;

    /// The content type this transformer is registered for.
    fn content_type(&self) -> &ContentType<T>;

    /// Transform `content`.
    ///
    /// # Returns
    ///
    /// * `Ok(Outcome::Transformed(v))` - New content for the next step
    /// * `Ok(Outcome::NoOpinion)` - Not applicable to this input
    /// * `Err(TransformError)` - Execution failed
    fn transform(&self, content: &T) -> Result<Outcome<T>, TransformError>;
}

impl<T> fmt::Debug for dyn Transformer<T> + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("name", &self.name())
            .field("content_type", self.content_type())
            .finish()
    }
}

type TransformClosure<T> = dyn Fn(&T) -> Result<Outcome<T>, TransformError> + Send + Sync;

/// Closure-backed transformer.
///
/// Handy for small plugins and tests where a dedicated type is overkill.
///
/// ```
/// use content_transformer::{ContentType, FnTransformer, Outcome, Transformer};
///
/// let trim = FnTransformer::new("trim", ContentType::new("text/plain"), |s: &String| {
///     Ok(Outcome::from_option((s.trim() != s).then(|| s.trim().to_string())))
/// });
/// assert_eq!(trim.transform(&" hi ".to_string()).unwrap(), Outcome::Transformed("hi".to_string()));
/// ```
pub struct FnTransformer<T> {
    name: String,
    content_type: ContentType<T>,
    func: Box<TransformClosure<T>>,
}

impl<T> FnTransformer<T> {
    /// Create a transformer from a closure.
    pub fn new<F>(name: impl Into<String>, content_type: ContentType<T>, func: F) -> Self
    where
        F: Fn(&T) -> Result<Outcome<T>, TransformError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            content_type,
            func: Box::new(func),
        }
    }

    /// Wrap into an `Arc` ready for registration.
    pub fn shared(self) -> Arc<dyn Transformer<T>>
    where
        T: 'static,
    {
        Arc::new(self)
    }
}

impl<T> Transformer<T> for FnTransformer<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> &ContentType<T> {
        &self.content_type
    }

    fn transform(&self, content: &T) -> Result<Outcome<T>, TransformError> {
        (self.func)(content)
    }
}
