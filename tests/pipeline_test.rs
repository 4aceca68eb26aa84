//! Pipeline file -> registry -> engine

use std::io::Write;
use std::sync::Arc;

use content_transformer::{ContentType, PipelineConfig, StepOutcome, TransformationEngine};
use tempfile::NamedTempFile;

const PIPELINES: &str = r#"
pipelines:
  text/html:
    - kind: replace
      name: http-to-https
      from: "http://"
      to: "https://"
    - kind: regex_replace
      name: lazy-images
      pattern: "<img "
      replacement: "<img loading=\"lazy\" "
    - kind: trim
      name: trim
  application/json:
    - kind: json_set
      name: mark-processed
      pointer: /processed
      value: true
    - kind: suffix
      name: newline
      value: "\n"
"#;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn engine_from(file: &NamedTempFile) -> TransformationEngine<String> {
    let config = PipelineConfig::load_from_file(file.path()).unwrap();
    let registry = config.build_registry().unwrap();
    TransformationEngine::new(Arc::new(registry)).with_config(config.engine)
}

#[test]
fn test_html_pipeline_chains_builtins() {
    let file = write_config(PIPELINES);
    let engine = engine_from(&file);

    let out = engine.transform(
        &ContentType::new("text/html"),
        "  <a href=\"http://example.com\"><img src=\"a.png\"></a>\n".to_string(),
    );

    assert_eq!(out, "<a href=\"https://example.com\"><img loading=\"lazy\" src=\"a.png\"></a>");
}

#[test]
fn test_json_pipeline_fails_open_on_non_json() {
    let file = write_config(PIPELINES);
    let engine = engine_from(&file);

    let report = engine.transform_with_report(&ContentType::new("application/json"), "not json".to_string());

    // json_set fails, the suffix transformer still runs
    assert_eq!(report.content, "not json\n");
    assert!(matches!(report.steps[0].outcome, StepOutcome::Failed { .. }));
    assert_eq!(report.steps[1].outcome, StepOutcome::Applied);
}

#[test]
fn test_json_pipeline_on_json() {
    let file = write_config(PIPELINES);
    let engine = engine_from(&file);

    let out = engine.transform(&ContentType::new("application/json"), r#"{"id":1}"#.to_string());

    let doc: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
    assert_eq!(doc, serde_json::json!({"id": 1, "processed": true}));
    assert!(out.ends_with('\n'));
}

#[test]
fn test_unconfigured_content_type_passes_through() {
    let file = write_config(PIPELINES);
    let engine = engine_from(&file);

    let content = "http://unchanged".to_string();
    let ptr = content.as_ptr();
    let out = engine.transform(&ContentType::new("text/plain"), content);

    assert_eq!(out.as_ptr(), ptr);
}

#[test]
fn test_invalid_file_registers_nothing() {
    let file = write_config(
        r#"
pipelines:
  text/plain:
    - kind: regex_replace
      name: broken
      pattern: "["
      replacement: ""
"#,
    );

    assert!(PipelineConfig::load_from_file(file.path()).is_err());
}
