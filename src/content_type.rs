//! Content type keys.
//!
//! A content type is an opaque key used to decide which transformers apply to
//! a piece of content. Two content types match when their keys are equal.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Opaque key identifying a family of content with payload type `T`.
///
/// The payload type is a marker only: it keeps a `Transformer<String>` from
/// being registered against a `ContentType<Vec<u8>>`. Matching is plain key
/// equality.
///
/// # Example
///
/// ```
/// use content_transformer::ContentType;
///
/// let html: ContentType<String> = ContentType::new("text/html");
/// assert!(html.matches(&ContentType::new("text/html")));
/// assert!(!html.matches(&ContentType::new("text/plain")));
/// ```
pub struct ContentType<T> {
    key: Cow<'static, str>,
    _content: PhantomData<fn() -> T>,
}

impl<T> ContentType<T> {
    /// Create a content type from a key.
    pub fn new(key: impl Into<Cow<'static, str>>) -> Self {
        Self {
            key: key.into(),
            _content: PhantomData,
        }
    }

    /// Create a content type from a static key, usable in `const` items.
    pub const fn from_static(key: &'static str) -> Self {
        Self {
            key: Cow::Borrowed(key),
            _content: PhantomData,
        }
    }

    /// The key this content type is identified by.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether `other` identifies the same family of content.
    pub fn matches(&self, other: &ContentType<T>) -> bool {
        self.key == other.key
    }
}

// Manual impls: derives would put bounds on `T`.

impl<T> Clone for ContentType<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            _content: PhantomData,
        }
    }
}

impl<T> PartialEq for ContentType<T> {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl<T> Eq for ContentType<T> {}

impl<T> Hash for ContentType<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for ContentType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentType").field(&self.key).finish()
    }
}

impl<T> fmt::Display for ContentType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_matches_by_key() {
        let a: ContentType<String> = ContentType::new("text/html");
        let b: ContentType<String> = ContentType::new(String::from("text/html"));
        let c: ContentType<String> = ContentType::new("text/plain");

        assert!(a.matches(&b));
        assert_eq!(a, b);
        assert!(!a.matches(&c));
    }

    #[test]
    fn test_static_content_type() {
        const HTML: ContentType<String> = ContentType::from_static("text/html");
        assert_eq!(HTML.key(), "text/html");
        assert_eq!(HTML.to_string(), "text/html");
    }

    #[test]
    fn test_hash_follows_key() {
        let mut set: HashSet<ContentType<Vec<u8>>> = HashSet::new();
        set.insert(ContentType::new("image/png"));
        set.insert(ContentType::new("image/png"));
        set.insert(ContentType::new("image/jpeg"));
        assert_eq!(set.len(), 2);
    }
}
