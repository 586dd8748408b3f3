//! Tests for schema validation

use super::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Serialize, Deserialize)]
struct NewPost {
    title: String,
    #[serde(default)]
    status: Option<String>,
}

fn post_shape() -> JsonShape {
    JsonShape::object()
        .field("id", JsonShape::of(JsonType::Integer))
        .field(
            "title",
            JsonShape::object().field("rendered", JsonShape::of(JsonType::String)),
        )
        .property("tags", JsonShape::array_of(JsonShape::of(JsonType::Integer)))
        .property("excerpt", JsonShape::of(JsonType::String).nullable())
}

#[test]
fn test_json_type_of() {
    assert_eq!(JsonType::of(&json!(1)), JsonType::Integer);
    assert_eq!(JsonType::of(&json!(1.5)), JsonType::Number);
    assert_eq!(JsonType::of(&json!("x")), JsonType::String);
    assert_eq!(JsonType::of(&json!(null)), JsonType::Null);
    assert_eq!(JsonType::of(&json!([])), JsonType::Array);
    assert_eq!(JsonType::of(&json!({})), JsonType::Object);
}

#[test]
fn test_integer_matches_number() {
    assert!(JsonType::Number.matches(&json!(3)));
    assert!(!JsonType::Integer.matches(&json!(3.5)));
    assert!(JsonType::Any.matches(&json!({"a": 1})));
}

#[test]
fn test_shape_accepts_valid_document() {
    let post = json!({
        "id": 12,
        "title": {"rendered": "Hello"},
        "tags": [1, 2],
        "excerpt": null,
        "extra": true
    });
    assert_eq!(post_shape().validate(&post).unwrap(), post);
}

#[test]
fn test_shape_reports_missing_field() {
    let err = post_shape()
        .validate(&json!({"id": 1, "title": {}}))
        .unwrap_err();
    assert_eq!(err.path, "$.title");
    assert!(err.message.contains("rendered"));
}

#[test]
fn test_shape_reports_wrong_type_with_path() {
    let err = post_shape()
        .validate(&json!({"id": 1, "title": {"rendered": "x"}, "tags": [1, "two"]}))
        .unwrap_err();
    assert_eq!(err.path, "$.tags[1]");
    assert_eq!(err.message, "expected integer, found string");
    assert_eq!(err.to_string(), "$.tags[1]: expected integer, found string");
}

#[test]
fn test_shape_deserializes_from_json() {
    let shape: JsonShape = serde_json::from_value(json!({
        "type": "object",
        "required": ["slug"],
        "properties": {"slug": {"type": "string"}}
    }))
    .unwrap();

    assert!(shape.validate(&json!({"slug": "hello-world"})).is_ok());
    assert!(shape.validate(&json!({"slug": 5})).is_err());
}

#[test]
fn test_typed_schema_normalizes() {
    let schema = Schema::typed::<NewPost>();
    let out = schema
        .validate(&json!({"title": "Draft", "ignored": 1}))
        .unwrap();
    assert_eq!(out, json!({"title": "Draft", "status": null}));
}

#[test]
fn test_typed_schema_rejects() {
    let schema = Schema::typed::<NewPost>();
    let err = schema.validate(&json!({"status": "draft"})).unwrap_err();
    assert_eq!(err.path, "$");
    assert!(err.message.contains("title"));
    assert!(schema.name().contains("NewPost"));
}

#[test]
fn test_fn_schema() {
    let schema = Schema::from_fn("non_empty_title", |value| {
        match value.get("title").and_then(|t| t.as_str()) {
            Some(title) if !title.is_empty() => Ok(value.clone()),
            _ => Err(SchemaViolation::new("$.title", "must not be empty")),
        }
    });

    assert!(schema.validate(&json!({"title": "ok"})).is_ok());
    assert!(schema.validate(&json!({"title": ""})).is_err());
    assert_eq!(schema.name(), "non_empty_title");
    assert_eq!(format!("{schema:?}"), "Schema(\"non_empty_title\")");
}
