// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! AST input from JSON

use super::node::{AstNode, KNOWN_KINDS};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AstError {
    #[error("invalid AST JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected an AST node object or an array of nodes, found {0}")]
    Shape(&'static str),
}

/// Parse one node or an array of root nodes
pub fn from_json_str(input: &str) -> Result<Vec<AstNode>, AstError> {
    let value: Value = serde_json::from_str(input)?;
    from_json_value(value)
}

/// Parse one node or an array of root nodes.
///
/// Objects whose `type` is not a known kind become
/// [`AstNode::Unsupported`] so the converter can report them by name.
pub fn from_json_value(mut value: Value) -> Result<Vec<AstNode>, AstError> {
    normalize_unknown_kinds(&mut value);
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(_) => Ok(vec![serde_json::from_value(value)?]),
        other => Err(AstError::Shape(value_name(&other))),
    }
}

fn normalize_unknown_kinds(value: &mut Value) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(normalize_unknown_kinds),
        Value::Object(map) => {
            let unknown = match map.get("type") {
                Some(Value::String(kind)) if kind != "unsupported" => {
                    (!KNOWN_KINDS.contains(&kind.as_str())).then(|| kind.clone())
                }
                _ => None,
            };
            if let Some(kind) = unknown {
                log::debug!("unknown node type '{}' kept as unsupported", kind);
                let mut replacement = Map::new();
                replacement.insert("type".into(), Value::from("unsupported"));
                replacement.insert("kind".into(), Value::from(kind));
                *map = replacement;
            } else if let Some(children) = map.get_mut("children") {
                normalize_unknown_kinds(children);
            }
        }
        _ => {}
    }
}

fn value_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Size3;

    #[test]
    fn test_single_node() {
        let nodes =
            from_json_str(r#"{"type": "cube", "size": [1, 2, 3], "center": true}"#).unwrap();
        assert_eq!(
            nodes,
            vec![AstNode::Cube {
                size: Size3::Vector([1.0, 2.0, 3.0]),
                center: true
            }]
        );
    }

    #[test]
    fn test_defaults_and_dollar_fn() {
        let nodes = from_json_str(r#"[{"type": "cube"}, {"type": "sphere", "r": 2, "$fn": 8}]"#)
            .unwrap();
        assert_eq!(
            nodes[0],
            AstNode::Cube {
                size: Size3::Scalar(1.0),
                center: false
            }
        );
        assert_eq!(
            nodes[1],
            AstNode::Sphere {
                r: 2.0,
                fn_: Some(8)
            }
        );
    }

    #[test]
    fn test_missing_children_default_to_empty() {
        let nodes = from_json_str(r#"{"type": "union"}"#).unwrap();
        assert!(nodes[0].children().is_empty());
    }

    #[test]
    fn test_unknown_kinds_nested() {
        let nodes = from_json_str(
            r#"{"type": "translate", "v": [0, 0, 1], "children": [{"type": "bogus", "x": 1}]}"#,
        )
        .unwrap();
        assert_eq!(nodes[0].children(), &[AstNode::unsupported("bogus")]);
    }

    #[test]
    fn test_rejects_scalars() {
        assert!(matches!(from_json_str("42"), Err(AstError::Shape("a number"))));
        assert!(matches!(from_json_str("{"), Err(AstError::Json(_))));
    }
}
