use pathquill::document::node::{DocumentFormat, TreeNode};
use pathquill::document::parser::{parse_document, parse_yaml};
use pathquill::treepath::{QueryEngine, QueryError};
use serde_json::json;

const CONFIG: &str = r#"
server:
  host: localhost
  ports: [80, 443]
users:
  - name: alice
    admin: true
  - name: bob
    admin: false
"#;

#[test]
fn test_yaml_uses_json_dialect() {
    let yaml = parse_yaml(CONFIG).unwrap();
    let engine = QueryEngine::for_format(yaml.format());
    let result = engine.query(&yaml, "$.server.ports[-1]");
    assert_eq!(result.matches, vec![json!(443)]);
    assert_eq!(result.paths, vec!["$.server.ports[1]"]);
}

#[test]
fn test_yaml_predicate_on_booleans() {
    let doc = parse_document(CONFIG, DocumentFormat::Yaml).unwrap();
    let result = doc.query("$.users[?(@admin == true)].name");
    assert_eq!(result.matches, vec![json!("alice")]);
}

#[test]
fn test_yaml_recursive_descent() {
    let doc = parse_document(CONFIG, DocumentFormat::Yaml).unwrap();
    let result = doc.query("$..name");
    assert_eq!(result.matches, vec![json!("alice"), json!("bob")]);
    assert_eq!(result.paths, vec!["$.users[0].name", "$.users[1].name"]);
}

#[test]
fn test_yaml_values_project_to_json() {
    let doc = parse_document(CONFIG, DocumentFormat::Yaml).unwrap();
    let result = doc.query("$.server");
    assert_eq!(
        result.matches,
        vec![json!({"host": "localhost", "ports": [80, 443]})]
    );
}

#[test]
fn test_yaml_has_no_attributes() {
    let doc = parse_document(CONFIG, DocumentFormat::Yaml).unwrap();
    let result = doc.query("$.users[0].@id");
    assert!(!result.success);
    assert_eq!(
        result.error,
        Some(QueryError::Unsupported {
            step: "attribute access",
            format: DocumentFormat::Yaml,
        })
    );
}

#[test]
fn test_yaml_comments_unsupported() {
    let doc = parse_document(CONFIG, DocumentFormat::Yaml).unwrap();
    let result = doc.query("$..comment()");
    assert!(matches!(result.error, Some(QueryError::Unsupported { .. })));
}

#[test]
fn test_yaml_multi_document_stream() {
    let doc = parse_document("a: 1\n---\na: 2\n", DocumentFormat::Yaml).unwrap();
    let result = doc.query("$[*].a");
    assert_eq!(result.matches, vec![json!(1), json!(2)]);
    assert_eq!(result.paths, vec!["$[0].a", "$[1].a"]);
}

#[test]
fn test_yaml_integer_keys() {
    let doc = parse_document("codes:\n  404: missing\n  500: broken\n", DocumentFormat::Yaml)
        .unwrap();
    let result = doc.query("$.codes['404']");
    assert_eq!(result.matches, vec![json!("missing")]);
    assert_eq!(result.paths, vec!["$.codes['404']"]);
}
