//! Built-in string transformers.
//!
//! These back the `kind:` entries of a pipeline file. Every one of them
//! declines when it has nothing to contribute, so chains stay cheap to read
//! in a step report.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::content_type::ContentType;
use crate::transformer::{Outcome, TransformError, Transformer};

/// Target case for [`CaseTransformer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Case {
    Upper,
    Lower,
}

/// Literal substring replacement.
#[derive(Debug)]
pub struct ReplaceTransformer {
    name: String,
    content_type: ContentType<String>,
    from: String,
    to: String,
}

impl ReplaceTransformer {
    pub fn new(name: impl Into<String>, content_type: ContentType<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type,
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Transformer<String> for ReplaceTransformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> &ContentType<String> {
        &self.content_type
    }

    fn transform(&self, content: &String) -> Result<Outcome<String>, TransformError> {
        if self.from.is_empty() || !content.contains(&self.from) {
            return Ok(Outcome::NoOpinion);
        }
        Ok(Outcome::Transformed(content.replace(&self.from, &self.to)))
    }
}

/// Regex replacement over every match.
#[derive(Debug)]
pub struct RegexReplaceTransformer {
    name: String,
    content_type: ContentType<String>,
    pattern: Regex,
    replacement: String,
}

impl RegexReplaceTransformer {
    /// Compile `pattern`. Fails on an invalid expression.
    pub fn new(
        name: impl Into<String>,
        content_type: ContentType<String>,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            content_type,
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }
}

impl Transformer<String> for RegexReplaceTransformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> &ContentType<String> {
        &self.content_type
    }

    fn transform(&self, content: &String) -> Result<Outcome<String>, TransformError> {
        if !self.pattern.is_match(content) {
            return Ok(Outcome::NoOpinion);
        }
        Ok(Outcome::Transformed(
            self.pattern
                .replace_all(content, self.replacement.as_str())
                .into_owned(),
        ))
    }
}

/// Where [`AffixTransformer`] puts its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affix {
    Prefix,
    Suffix,
}

/// Adds a prefix or suffix unless it is already there.
#[derive(Debug)]
pub struct AffixTransformer {
    name: String,
    content_type: ContentType<String>,
    affix: Affix,
    value: String,
}

impl AffixTransformer {
    pub fn new(name: impl Into<String>, content_type: ContentType<String>, affix: Affix, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type,
            affix,
            value: value.into(),
        }
    }
}

impl Transformer<String> for AffixTransformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> &ContentType<String> {
        &self.content_type
    }

    fn transform(&self, content: &String) -> Result<Outcome<String>, TransformError> {
        let present = match self.affix {
            Affix::Prefix => content.starts_with(&self.value),
            Affix::Suffix => content.ends_with(&self.value),
        };
        if present {
            return Ok(Outcome::NoOpinion);
        }
        let out = match self.affix {
            Affix::Prefix => format!("{}{}", self.value, content),
            Affix::Suffix => format!("{}{}", content, self.value),
        };
        Ok(Outcome::Transformed(out))
    }
}

/// Strips leading and trailing whitespace.
#[derive(Debug)]
pub struct TrimTransformer {
    name: String,
    content_type: ContentType<String>,
}

impl TrimTransformer {
    pub fn new(name: impl Into<String>, content_type: ContentType<String>) -> Self {
        Self {
            name: name.into(),
            content_type,
        }
    }
}

impl Transformer<String> for TrimTransformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> &ContentType<String> {
        &self.content_type
    }

    fn transform(&self, content: &String) -> Result<Outcome<String>, TransformError> {
        let trimmed = content.trim();
        if trimmed.len() == content.len() {
            return Ok(Outcome::NoOpinion);
        }
        Ok(Outcome::Transformed(trimmed.to_string()))
    }
}

#[derive(Debug)]
pub struct CaseTransformer {
    name: String,
    content_type: ContentType<String>,
    case: Case,
}

impl CaseTransformer {
    pub fn new(name: impl Into<String>, content_type: ContentType<String>, case: Case) -> Self {
        Self {
            name: name.into(),
            content_type,
            case,
        }
    }
}

impl Transformer<String> for CaseTransformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> &ContentType<String> {
        &self.content_type
    }

    fn transform(&self, content: &String) -> Result<Outcome<String>, TransformError> {
        let out = match self.case {
            Case::Upper => content.to_uppercase(),
            Case::Lower => content.to_lowercase(),
        };
        if out == *content {
            return Ok(Outcome::NoOpinion);
        }
        Ok(Outcome::Transformed(out))
    }
}

/// Sets a value inside JSON content at a JSON pointer (RFC 6901).
///
/// Content that is not JSON, or a pointer whose parent does not exist, is a
/// failure rather than a decline: the transformer was configured for JSON.
#[derive(Debug)]
pub struct JsonSetTransformer {
    name: String,
    content_type: ContentType<String>,
    pointer: String,
    value: JsonValue,
}

impl JsonSetTransformer {
    pub fn new(name: impl Into<String>, content_type: ContentType<String>, pointer: impl Into<String>, value: JsonValue) -> Self {
        Self {
            name: name.into(),
            content_type,
            pointer: pointer.into(),
            value,
        }
    }
}

impl Transformer<String> for JsonSetTransformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> &ContentType<String> {
        &self.content_type
    }

    fn transform(&self, content: &String) -> Result<Outcome<String>, TransformError> {
        let mut doc: JsonValue = serde_json::from_str(content)
            .map_err(|e| TransformError::invalid_content(format!("not JSON: {}", e)))?;

        if doc.pointer(&self.pointer) == Some(&self.value) {
            return Ok(Outcome::NoOpinion);
        }

        if let Some(slot) = doc.pointer_mut(&self.pointer) {
            *slot = self.value.clone();
        } else {
            let (parent, key) = split_pointer(&self.pointer)?;
            match doc.pointer_mut(parent) {
                Some(JsonValue::Object(map)) => {
                    map.insert(key, self.value.clone());
                }
                _ => {
                    return Err(TransformError::invalid_content(format!(
                        "no object at '{}'",
                        parent
                    )))
                }
            }
        }

        serde_json::to_string(&doc)
            .map(Outcome::Transformed)
            .map_err(|e| TransformError::execution(e.to_string()))
    }
}

fn split_pointer(pointer: &str) -> Result<(&str, String), TransformError> {
    let index = pointer
        .rfind('/')
        .ok_or_else(|| TransformError::execution(format!("invalid JSON pointer '{}'", pointer)))?;
    let key = pointer[index + 1..].replace("~1", "/").replace("~0", "~");
    Ok((&pointer[..index], key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ct() -> ContentType<String> {
        ContentType::new("text/plain")
    }

    fn run(t: &dyn Transformer<String>, input: &str) -> Outcome<String> {
        t.transform(&input.to_string()).unwrap()
    }

    #[test]
    fn test_replace() {
        let t = ReplaceTransformer::new("https", ct(), "http://", "https://");
        assert_eq!(
            run(&t, "see http://a and http://b"),
            Outcome::Transformed("see https://a and https://b".to_string())
        );
        assert_eq!(run(&t, "nothing here"), Outcome::NoOpinion);
    }

    #[test]
    fn test_regex_replace() {
        let t = RegexReplaceTransformer::new("lazy", ct(), r"<img (\w)", "<img loading=\"lazy\" $1").unwrap();
        assert_eq!(
            run(&t, "<img src=\"a.png\">"),
            Outcome::Transformed("<img loading=\"lazy\" src=\"a.png\">".to_string())
        );
        assert_eq!(run(&t, "<p>text</p>"), Outcome::NoOpinion);
    }

    #[test]
    fn test_regex_invalid() {
        assert!(RegexReplaceTransformer::new("bad", ct(), "(", "").is_err());
    }

    #[test]
    fn test_affix() {
        let t = AffixTransformer::new("banner", ct(), Affix::Prefix, "> ");
        assert_eq!(run(&t, "hi"), Outcome::Transformed("> hi".to_string()));
        assert_eq!(run(&t, "> hi"), Outcome::NoOpinion);

        let t = AffixTransformer::new("newline", ct(), Affix::Suffix, "\n");
        assert_eq!(run(&t, "hi"), Outcome::Transformed("hi\n".to_string()));
        assert_eq!(run(&t, "hi\n"), Outcome::NoOpinion);
    }

    #[test]
    fn test_trim_and_case() {
        let trim = TrimTransformer::new("trim", ct());
        assert_eq!(run(&trim, "  a "), Outcome::Transformed("a".to_string()));
        assert_eq!(run(&trim, "a"), Outcome::NoOpinion);

        let upper = CaseTransformer::new("upper", ct(), Case::Upper);
        assert_eq!(run(&upper, "abc"), Outcome::Transformed("ABC".to_string()));
        assert_eq!(run(&upper, "ABC"), Outcome::NoOpinion);
    }

    #[test]
    fn test_json_set() {
        let t = JsonSetTransformer::new("flag", ct(), "/meta/processed", json!(true));

        let out = run(&t, r#"{"meta":{}}"#);
        let Outcome::Transformed(text) = out else {
            panic!("expected transformed content");
        };
        let doc: JsonValue = serde_json::from_str(&text).unwrap();
        assert_eq!(doc, json!({"meta": {"processed": true}}));

        assert_eq!(run(&t, r#"{"meta":{"processed":true}}"#), Outcome::NoOpinion);
    }

    #[test]
    fn test_json_set_fails_on_non_json() {
        let t = JsonSetTransformer::new("flag", ct(), "/processed", json!(true));
        let err = t.transform(&"<html>".to_string()).unwrap_err();
        assert!(matches!(err, TransformError::InvalidContent(_)));
    }

    #[test]
    fn test_json_set_fails_on_missing_parent() {
        let t = JsonSetTransformer::new("flag", ct(), "/missing/processed", json!(1));
        let err = t.transform(&"{}".to_string()).unwrap_err();
        assert!(matches!(err, TransformError::InvalidContent(_)));
    }
}
