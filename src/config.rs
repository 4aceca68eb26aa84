//! Engine and pipeline configuration.
//!
//! A pipeline file maps content type keys to an ordered list of built-in
//! transformer definitions:
//!
//! ```yaml
//! engine:
//!   isolate_panics: true
//! pipelines:
//!   text/html:
//!     - kind: replace
//!       name: http-to-https
//!       from: "http://"
//!       to: "https://"
//!     - kind: regex_replace
//!       name: lazy-images
//!       pattern: "<img "
//!       replacement: "<img loading=\"lazy\" "
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::builtin::{
    Affix, AffixTransformer, Case, CaseTransformer, JsonSetTransformer, RegexReplaceTransformer,
    ReplaceTransformer, TrimTransformer,
};
use crate::content_type::ContentType;
use crate::registry::{InMemoryRegistry, RegistrationId};
use crate::transformer::Transformer;

/// Errors raised while loading or validating a pipeline file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Content type key must not be empty")]
    EmptyContentType,
    #[error("Transformer #{index} for '{content_type}' has an empty name")]
    EmptyName { content_type: String, index: usize },
    #[error("Duplicate transformer name '{name}' in pipeline '{content_type}'")]
    DuplicateName { content_type: String, name: String },
    #[error("Invalid regex in transformer '{name}': {source}")]
    InvalidRegex {
        name: String,
        #[source]
        source: regex::Error,
    },
    #[error("Invalid JSON pointer '{pointer}' in transformer '{name}'")]
    InvalidPointer { name: String, pointer: String },
}

/// Engine behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Treat a panicking transformer like a failing one.
    pub isolate_panics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { isolate_panics: true }
    }
}

/// One built-in transformer entry in a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformerDef {
    Replace { name: String, from: String, to: String },
    RegexReplace { name: String, pattern: String, replacement: String },
    Prefix { name: String, value: String },
    Suffix { name: String, value: String },
    Trim { name: String },
    Case { name: String, to: Case },
    JsonSet { name: String, pointer: String, value: JsonValue },
}

impl TransformerDef {
    pub fn name(&self) -> &str {
        match self {
            TransformerDef::Replace { name, .. }
            | TransformerDef::RegexReplace { name, .. }
            | TransformerDef::Prefix { name, .. }
            | TransformerDef::Suffix { name, .. }
            | TransformerDef::Trim { name }
            | TransformerDef::Case { name, .. }
            | TransformerDef::JsonSet { name, .. } => name,
        }
    }

    /// Build the transformer for `content_type`.
    pub fn build(&self, content_type: &ContentType<String>) -> Result<Arc<dyn Transformer<String>>, ConfigError> {
        let ct = content_type.clone();
        let transformer: Arc<dyn Transformer<String>> = match self {
            TransformerDef::Replace { name, from, to } => {
                Arc::new(ReplaceTransformer::new(name.as_str(), ct, from.as_str(), to.as_str()))
            }
            TransformerDef::RegexReplace {
                name,
                pattern,
                replacement,
            } => Arc::new(
                RegexReplaceTransformer::new(name.as_str(), ct, pattern, replacement.as_str()).map_err(
                    |source| ConfigError::InvalidRegex {
                        name: name.clone(),
                        source,
                    },
                )?,
            ),
            TransformerDef::Prefix { name, value } => {
                Arc::new(AffixTransformer::new(name.as_str(), ct, Affix::Prefix, value.as_str()))
            }
            TransformerDef::Suffix { name, value } => {
                Arc::new(AffixTransformer::new(name.as_str(), ct, Affix::Suffix, value.as_str()))
            }
            TransformerDef::Trim { name } => Arc::new(TrimTransformer::new(name.as_str(), ct)),
            TransformerDef::Case { name, to } => Arc::new(CaseTransformer::new(name.as_str(), ct, *to)),
            TransformerDef::JsonSet { name, pointer, value } => {
                if !pointer.starts_with('/') {
                    return Err(ConfigError::InvalidPointer {
                        name: name.clone(),
                        pointer: pointer.clone(),
                    });
                }
                Arc::new(JsonSetTransformer::new(name.as_str(), ct, pointer.as_str(), value.clone()))
            }
        };
        Ok(transformer)
    }
}

/// Pipeline file: engine settings plus transformers per content type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    /// content type key -> transformers, in registration order
    #[serde(default)]
    pub pipelines: IndexMap<String, Vec<TransformerDef>>,
}

impl PipelineConfig {
    /// Load and validate a pipeline file.
    ///
    /// # Example
    /// ```ignore
    /// use content_transformer::PipelineConfig;
    ///
    /// let config = PipelineConfig::load_from_file("pipelines.yaml")?;
    /// let registry = config.build_registry()?;
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_yaml_str(&contents)?;
        tracing::info!(
            "Loaded {} pipeline(s) from {}",
            config.pipelines.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check names and build every transformer once, discarding the result.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, defs) in &self.pipelines {
            if key.trim().is_empty() {
                return Err(ConfigError::EmptyContentType);
            }
            let content_type = ContentType::new(key.clone());
            let mut seen = HashSet::new();
            for (index, def) in defs.iter().enumerate() {
                if def.name().trim().is_empty() {
                    return Err(ConfigError::EmptyName {
                        content_type: key.clone(),
                        index,
                    });
                }
                if !seen.insert(def.name()) {
                    return Err(ConfigError::DuplicateName {
                        content_type: key.clone(),
                        name: def.name().to_string(),
                    });
                }
                def.build(&content_type)?;
            }
        }
        Ok(())
    }

    /// Register every configured transformer into `registry`, in file order.
    pub fn register_into(&self, registry: &InMemoryRegistry<String>) -> Result<Vec<RegistrationId>, ConfigError> {
        // Build everything first so a bad entry registers nothing.
        let mut built = Vec::new();
        for (key, defs) in &self.pipelines {
            let content_type = ContentType::new(key.clone());
            for def in defs {
                built.push(def.build(&content_type)?);
            }
        }
        Ok(built.into_iter().map(|t| registry.register(t)).collect())
    }

    /// Fresh registry holding every configured transformer.
    pub fn build_registry(&self) -> Result<InMemoryRegistry<String>, ConfigError> {
        let registry = InMemoryRegistry::new();
        self.register_into(&registry)?;
        Ok(registry)
    }

    /// Number of transformer entries across all pipelines.
    pub fn transformer_count(&self) -> usize {
        self.pipelines.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TransformerRegistry;

    const YAML: &str = r#"
engine:
  isolate_panics: false
pipelines:
  text/html:
    - kind: replace
      name: https
      from: "http://"
      to: "https://"
    - kind: case
      name: shout
      to: upper
  application/json:
    - kind: json_set
      name: processed
      pointer: /processed
      value: true
"#;

    #[test]
    fn test_parse_pipeline() {
        let config = PipelineConfig::from_yaml_str(YAML).unwrap();

        assert!(!config.engine.isolate_panics);
        assert_eq!(config.pipelines.len(), 2);
        assert_eq!(config.transformer_count(), 3);

        let keys: Vec<&String> = config.pipelines.keys().collect();
        assert_eq!(keys, vec!["text/html", "application/json"]);
        assert_eq!(
            config.pipelines["text/html"][1],
            TransformerDef::Case {
                name: "shout".to_string(),
                to: Case::Upper
            }
        );
    }

    #[test]
    fn test_engine_defaults() {
        let config = PipelineConfig::from_yaml_str("pipelines: {}").unwrap();
        assert!(config.engine.isolate_panics);
        assert!(config.pipelines.is_empty());
    }

    #[test]
    fn test_build_registry_preserves_order() {
        let config = PipelineConfig::from_yaml_str(YAML).unwrap();
        let registry = config.build_registry().unwrap();

        let html = registry.transformers_for(&ContentType::new("text/html"));
        let names: Vec<&str> = html.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["https", "shout"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let yaml = r#"
pipelines:
  text/plain:
    - kind: regex_replace
      name: broken
      pattern: "("
      replacement: ""
"#;
        let err = PipelineConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegex { ref name, .. } if name == "broken"));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let yaml = r#"
pipelines:
  text/plain:
    - kind: trim
      name: same
    - kind: trim
      name: same
"#;
        let err = PipelineConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName { .. }));
    }

    #[test]
    fn test_empty_content_type_rejected() {
        let yaml = r#"
pipelines:
  "":
    - kind: trim
      name: t
"#;
        let err = PipelineConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyContentType));
    }

    #[test]
    fn test_invalid_pointer_rejected() {
        let yaml = r#"
pipelines:
  application/json:
    - kind: json_set
      name: p
      pointer: processed
      value: 1
"#;
        let err = PipelineConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPointer { .. }));
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let yaml = r#"
pipelines:
  text/plain:
    - kind: teleport
      name: t
"#;
        let err = PipelineConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = PipelineConfig::load_from_file("/nonexistent/pipelines.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/pipelines.yaml"));
    }
}
