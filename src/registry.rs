//! Transformer registry.
//!
//! The engine only needs the read side ([`TransformerRegistry`]): an ordered
//! view of the transformers registered for a content type. [`InMemoryRegistry`]
//! is the default, thread-safe implementation with register/unregister.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content_type::ContentType;
use crate::transformer::Transformer;

/// Read interface the engine consumes.
///
/// Implementations must return transformers in registration order and must
/// hand back an owned snapshot: the caller iterates it without holding any
/// registry lock.
pub trait TransformerRegistry<T>: Send + Sync {
    /// Transformers whose content type matches `content_type`, in order.
    fn transformers_for(&self, content_type: &ContentType<T>) -> Vec<Arc<dyn Transformer<T>>>;
}

/// Handle returned by [`InMemoryRegistry::register`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationId(Uuid);

impl RegistrationId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Summary of one registration, for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationInfo {
    pub id: RegistrationId,
    pub name: String,
    pub content_type: String,
}

struct Entry<T> {
    id: RegistrationId,
    transformer: Arc<dyn Transformer<T>>,
}

/// Mutable, thread-safe set of transformers kept in registration order.
///
/// Registration and unregistration may happen at any time, including while
/// other threads are inside [`TransformerRegistry::transformers_for`]; those
/// callers keep iterating the snapshot they already took.
///
/// # Example
///
/// ```
/// use content_transformer::{ContentType, FnTransformer, InMemoryRegistry, Outcome, TransformerRegistry};
///
/// let registry = InMemoryRegistry::new();
/// let html = ContentType::new("text/html");
/// let id = registry.register(
///     FnTransformer::new("noop", html.clone(), |_: &String| Ok(Outcome::NoOpinion)).shared(),
/// );
/// assert_eq!(registry.transformers_for(&html).len(), 1);
/// assert!(registry.unregister(&id));
/// assert!(registry.transformers_for(&html).is_empty());
/// ```
pub struct InMemoryRegistry<T> {
    entries: RwLock<Vec<Entry<T>>>,
}

impl<T> InMemoryRegistry<T> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Register a transformer. The same transformer may be registered more
    /// than once; each registration gets its own id and runs separately.
    pub fn register(&self, transformer: Arc<dyn Transformer<T>>) -> RegistrationId {
        let id = RegistrationId::new();
        tracing::debug!(
            "Registered transformer '{}' for content type '{}' ({})",
            transformer.name(),
            transformer.content_type(),
            id
        );
        self.entries.write().push(Entry { id, transformer });
        id
    }

    /// Remove a registration. Returns `false` if the id is unknown.
    pub fn unregister(&self, id: &RegistrationId) -> bool {
        let mut entries = self.entries.write();
        match entries.iter().position(|entry| entry.id == *id) {
            Some(index) => {
                let entry = entries.remove(index);
                tracing::debug!(
                    "Unregistered transformer '{}' ({})",
                    entry.transformer.name(),
                    id
                );
                true
            }
            None => false,
        }
    }

    /// Number of registrations across all content types.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Remove every registration.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// All registrations in order.
    pub fn registrations(&self) -> Vec<RegistrationInfo> {
        self.entries
            .read()
            .iter()
            .map(|entry| RegistrationInfo {
                id: entry.id,
                name: entry.transformer.name().to_string(),
                content_type: entry.transformer.content_type().key().to_string(),
            })
            .collect()
    }
}

impl<T> Default for InMemoryRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TransformerRegistry<T> for InMemoryRegistry<T> {
    fn transformers_for(&self, content_type: &ContentType<T>) -> Vec<Arc<dyn Transformer<T>>> {
        self.entries
            .read()
            .iter()
            .filter(|entry| entry.transformer.content_type().matches(content_type))
            .map(|entry| Arc::clone(&entry.transformer))
            .collect()
    }
}
