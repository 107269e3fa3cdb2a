//! Parser for the JSON-array filter grammar.
//!
//! Grammar (first element is always the operator token):
//!
//! filter  = ["has", prop] | ["!has", prop]
//!         | [op, prop, literal]            op in ==, !=, >, <, >=, <=
//!         | ["in", prop, v1, ..., vn] | ["!in", prop, v1, ..., vn]
//!         | ["all", filter...] | ["any", filter...] | ["none", filter...]
//! literal = number | string | boolean

use super::ast::{CombinatorKind, CompareOp, ExprNode, Literal};
use super::error::FilterError;
use serde_json::Value as Json;

/// Parse a JSON value into a filter expression tree.
///
/// The value must be an array whose first element is one of the grammar's
/// operator tokens; anything else fails with [`FilterError::MalformedFilter`].
pub fn parse_filter(json: &Json) -> Result<ExprNode, FilterError> {
    let items = json
        .as_array()
        .ok_or_else(|| {
            FilterError::malformed(
                "<filter>",
                format!("expected a JSON array, found {}", json_kind(json)),
            )
        })?;

    let Some(head) = items.first() else {
        return Err(FilterError::malformed(
            "<filter>",
            "empty array, missing operator token",
        ));
    };

    let token = head.as_str().ok_or_else(|| {
        FilterError::malformed(
            "<filter>",
            format!("operator token must be a string, found {}", json_kind(head)),
        )
    })?;

    match token {
        "has" | "!has" => {
            let property = parse_property(items, token)?;
            let node = ExprNode::Existence { property };
            if token == "!has" {
                Ok(ExprNode::Negation(Box::new(node)))
            } else {
                Ok(node)
            }
        }

        "==" | "!=" | ">" | "<" | ">=" | "<=" => {
            // from_token covers exactly the tokens matched above
            let op = CompareOp::from_token(token).unwrap();
            if items.len() != 3 {
                return Err(FilterError::malformed(
                    token,
                    format!(
                        "expected [op, property, value], got {} element(s)",
                        items.len()
                    ),
                ));
            }
            let property = parse_property(items, token)?;
            let literal = parse_literal(&items[2], token)?;
            Ok(ExprNode::Comparison {
                op,
                property,
                literal,
            })
        }

        "in" | "!in" => {
            let property = parse_property(items, token)?;
            let values = items[2..]
                .iter()
                .map(|v| parse_literal(v, token))
                .collect::<Result<Vec<_>, _>>()?;
            let node = ExprNode::Membership { property, values };
            if token == "!in" {
                Ok(ExprNode::Negation(Box::new(node)))
            } else {
                Ok(node)
            }
        }

        "all" | "any" | "none" => {
            let kind = match token {
                "all" => CombinatorKind::All,
                "any" => CombinatorKind::Any,
                _ => CombinatorKind::None,
            };
            let children = items[1..]
                .iter()
                .map(parse_filter)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ExprNode::Combinator { kind, children })
        }

        other => Err(FilterError::malformed(other, "unknown operator token")),
    }
}

/// The property name always sits at index 1 and is always a literal string.
fn parse_property(items: &[Json], token: &str) -> Result<String, FilterError> {
    let value = items.get(1).ok_or_else(|| {
        FilterError::malformed(token, "missing property name")
    })?;
    let name = value.as_str().ok_or_else(|| {
        FilterError::malformed(
            token,
            format!("property name must be a string, found {}", json_kind(value)),
        )
    })?;
    if name.is_empty() {
        return Err(FilterError::malformed(token, "property name is empty"));
    }
    Ok(name.to_string())
}

fn parse_literal(value: &Json, token: &str) -> Result<Literal, FilterError> {
    match value {
        Json::Number(n) => {
            let n = n.as_f64().ok_or_else(|| {
                FilterError::invalid_operand(token, format!("number {} out of range", n))
            })?;
            Ok(Literal::Number(n))
        }
        Json::String(s) => Ok(Literal::String(s.clone())),
        Json::Bool(b) => Ok(Literal::Bool(*b)),
        other => Err(FilterError::invalid_operand(
            token,
            format!(
                "expected a number, string, or boolean, found {}",
                json_kind(other)
            ),
        )),
    }
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
