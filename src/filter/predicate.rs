//! Compiled predicate tree: evaluation and canonical rendering.

use super::ast::{CombinatorKind, CompareOp, ExprNode, Literal, format_number};
use serde_json::Value as Json;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// The single capability the evaluator needs from a feature: look up an
/// attribute by name. Absent keys are treated as semantic null.
pub trait AttributeLookup {
    fn get(&self, name: &str) -> Option<&Json>;
}

impl AttributeLookup for serde_json::Map<String, Json> {
    fn get(&self, name: &str) -> Option<&Json> {
        serde_json::Map::get(self, name)
    }
}

impl AttributeLookup for HashMap<String, Json> {
    fn get(&self, name: &str) -> Option<&Json> {
        HashMap::get(self, name)
    }
}

/// Compiled, immutable filter predicate.
///
/// A `Predicate` is a pure value with no reference back to the source
/// JSON; it can be shared across threads and evaluated any number of
/// times. Its `Display` impl is the canonical textual rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// True iff the attribute is absent or null.
    IsNull { property: String },

    /// Comparison of an attribute against a literal.
    Compare {
        op: CompareOp,
        property: String,
        literal: Literal,
    },

    /// Set membership test. `expect` is true for `in` and false for
    /// `!in`; folding the negation here keeps the rendering in the
    /// `EQUALS(in(..), 'true'|'false')` function-call form.
    In {
        property: String,
        values: Vec<Literal>,
        expect: bool,
    },

    /// Logical complement.
    Not(Box<Predicate>),

    /// Conjunction; vacuously true when empty.
    All(Vec<Predicate>),

    /// Disjunction; vacuously false when empty.
    Any(Vec<Predicate>),
}

impl Predicate {
    /// Compile an expression tree into a predicate.
    ///
    /// Compilation is total: every shape invariant is already enforced by
    /// the parser and carried in the [`ExprNode`] type, so no failure
    /// path remains here.
    pub fn compile(node: ExprNode) -> Predicate {
        match node {
            ExprNode::Existence { property } => Predicate::IsNull { property },

            ExprNode::Comparison {
                op,
                property,
                literal,
            } => Predicate::Compare {
                op,
                property,
                literal,
            },

            ExprNode::Membership { property, values } => Predicate::In {
                property,
                values,
                expect: true,
            },

            ExprNode::Combinator { kind, children } => {
                let compiled = children.into_iter().map(Predicate::compile);
                match kind {
                    CombinatorKind::All => Predicate::All(compiled.collect()),
                    CombinatorKind::Any => Predicate::Any(compiled.collect()),
                    // none is a conjunction of per-child negations, not a
                    // negated disjunction; the rendering depends on it
                    CombinatorKind::None => Predicate::All(
                        compiled.map(|p| Predicate::Not(Box::new(p))).collect(),
                    ),
                }
            }

            ExprNode::Negation(inner) => match *inner {
                ExprNode::Membership { property, values } => Predicate::In {
                    property,
                    values,
                    expect: false,
                },
                other => Predicate::Not(Box::new(Predicate::compile(other))),
            },
        }
    }

    /// Evaluate against an attribute set. Pure and total: absent
    /// attributes are semantic null, never an error.
    pub fn evaluate<A: AttributeLookup + ?Sized>(&self, attrs: &A) -> bool {
        match self {
            Predicate::IsNull { property } => {
                matches!(attrs.get(property), None | Some(Json::Null))
            }

            Predicate::Compare {
                op,
                property,
                literal,
            } => match attrs.get(property) {
                // null compares false under every operator, including <>
                None | Some(Json::Null) => false,
                Some(value) => op_matches(*op, compare_values(value, literal)),
            },

            Predicate::In {
                property,
                values,
                expect,
            } => {
                let member = match attrs.get(property) {
                    None | Some(Json::Null) => false,
                    Some(value) => values.iter().any(|v| equal_values(value, v)),
                };
                member == *expect
            }

            Predicate::Not(inner) => !inner.evaluate(attrs),

            Predicate::All(children) => children.iter().all(|c| c.evaluate(attrs)),

            Predicate::Any(children) => children.iter().any(|c| c.evaluate(attrs)),
        }
    }
}

/// Ordering between an attribute value and a literal.
///
/// Numeric ordering applies iff both sides are numbers; every other
/// pairing falls back to lexicographic comparison of the string forms.
pub(crate) fn compare_values(attr: &Json, literal: &Literal) -> Ordering {
    match (attr.as_f64(), literal.as_number()) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        _ => attr_string_form(attr).cmp(&literal.string_form()),
    }
}

/// Equality between an attribute value and a literal, same domain rule
/// as [`compare_values`].
pub(crate) fn equal_values(attr: &Json, literal: &Literal) -> bool {
    compare_values(attr, literal) == Ordering::Equal
}

fn op_matches(op: CompareOp, ord: Ordering) -> bool {
    match op {
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Ne => ord != Ordering::Equal,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Ge => ord != Ordering::Less,
        CompareOp::Le => ord != Ordering::Greater,
    }
}

/// Unquoted string form of an attribute value, aligned with
/// [`Literal::string_form`] so cross-domain comparison is symmetric.
fn attr_string_form(attr: &Json) -> String {
    match attr {
        Json::String(s) => s.clone(),
        Json::Number(n) => match n.as_f64() {
            Some(f) => format_number(f),
            None => n.to_string(),
        },
        Json::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::IsNull { property } => write!(f, "{} IS NULL", property),

            Predicate::Compare {
                op,
                property,
                literal,
            } => write!(f, "{} {} {}", property, op, literal),

            Predicate::In {
                property,
                values,
                expect,
            } => {
                write!(f, "EQUALS(in({}", property)?;
                for value in values {
                    write!(f, ",{}", value)?;
                }
                write!(f, "), '{}')", expect)
            }

            Predicate::Not(inner) => write!(f, "NOT ({})", inner),

            // INCLUDE / EXCLUDE are ECQL's spellings for the constant filters
            Predicate::All(children) if children.is_empty() => write!(f, "INCLUDE"),
            Predicate::Any(children) if children.is_empty() => write!(f, "EXCLUDE"),

            Predicate::All(children) => write_joined(f, children, " AND "),
            Predicate::Any(children) => write_joined(f, children, " OR "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Predicate], sep: &str) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        // parenthesize nested combinators so mixed AND/OR stays unambiguous
        if matches!(child, Predicate::All(c) | Predicate::Any(c) if !c.is_empty()) {
            write!(f, "({})", child)?;
        } else {
            write!(f, "{}", child)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::parse_filter;
    use serde_json::json;

    fn predicate(filter: Json) -> Predicate {
        Predicate::compile(parse_filter(&filter).unwrap())
    }

    fn attrs(value: Json) -> serde_json::Map<String, Json> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn existence_matches_absent_and_null() {
        let p = predicate(json!(["has", "key"]));
        assert!(p.evaluate(&attrs(json!({}))));
        assert!(p.evaluate(&attrs(json!({"key": null}))));
        assert!(!p.evaluate(&attrs(json!({"key": "value"}))));
    }

    #[test]
    fn negated_existence_is_complement() {
        let has = predicate(json!(["has", "key"]));
        let not_has = predicate(json!(["!has", "key"]));
        for a in [json!({}), json!({"key": null}), json!({"key": 1})] {
            let a = attrs(a);
            assert_ne!(has.evaluate(&a), not_has.evaluate(&a));
        }
    }

    #[test]
    fn string_equality() {
        let p = predicate(json!(["==", "key", "value"]));
        assert!(p.evaluate(&attrs(json!({"key": "value"}))));
        assert!(!p.evaluate(&attrs(json!({"key": "other"}))));
        assert!(!p.evaluate(&attrs(json!({}))));
    }

    #[test]
    fn numeric_ordering() {
        let p = predicate(json!([">=", "lanes", 2]));
        assert!(p.evaluate(&attrs(json!({"lanes": 2}))));
        assert!(p.evaluate(&attrs(json!({"lanes": 4.5}))));
        assert!(!p.evaluate(&attrs(json!({"lanes": 1}))));
    }

    #[test]
    fn string_ordering_is_lexicographic() {
        let p = predicate(json!(["<", "name", "m"]));
        assert!(p.evaluate(&attrs(json!({"name": "abc"}))));
        assert!(!p.evaluate(&attrs(json!({"name": "xyz"}))));
    }

    #[test]
    fn numeric_attribute_equals_string_literal_by_string_form() {
        // cross-domain equality reduces both sides to string form
        let p = predicate(json!(["==", "ref", "2"]));
        assert!(p.evaluate(&attrs(json!({"ref": 2}))));
        assert!(!p.evaluate(&attrs(json!({"ref": 3}))));
    }

    #[test]
    fn boolean_attribute_compares_by_string_form() {
        let p = predicate(json!(["==", "oneway", true]));
        assert!(p.evaluate(&attrs(json!({"oneway": true}))));
        assert!(p.evaluate(&attrs(json!({"oneway": "true"}))));
        assert!(!p.evaluate(&attrs(json!({"oneway": false}))));
    }

    #[test]
    fn absent_attribute_fails_every_comparison() {
        for token in ["==", "!=", ">", "<", ">=", "<="] {
            let p = predicate(json!([token, "key", "value"]));
            assert!(!p.evaluate(&attrs(json!({}))), "op {}", token);
            assert!(!p.evaluate(&attrs(json!({"key": null}))), "op {}", token);
        }
    }

    #[test]
    fn membership_and_negation_are_complements() {
        let within = predicate(json!(["in", "a", 1, 2, 3]));
        let without = predicate(json!(["!in", "a", 1, 2, 3]));
        for a in [json!({"a": 2}), json!({"a": 5}), json!({})] {
            let a = attrs(a);
            assert_ne!(within.evaluate(&a), without.evaluate(&a));
        }
        assert!(within.evaluate(&attrs(json!({"a": 2}))));
        assert!(!within.evaluate(&attrs(json!({"a": 5}))));
    }

    #[test]
    fn empty_membership_never_matches() {
        let p = predicate(json!(["in", "a"]));
        assert!(!p.evaluate(&attrs(json!({"a": 1}))));
        assert!(!p.evaluate(&attrs(json!({}))));
    }

    #[test]
    fn empty_combinators() {
        assert!(predicate(json!(["all"])).evaluate(&attrs(json!({}))));
        assert!(!predicate(json!(["any"])).evaluate(&attrs(json!({}))));
        assert!(predicate(json!(["none"])).evaluate(&attrs(json!({}))));
    }

    #[test]
    fn none_negates_each_child() {
        let p = predicate(json!(["none", ["==", "a", 1], ["==", "b", 2]]));
        assert!(p.evaluate(&attrs(json!({"a": 9, "b": 9}))));
        assert!(!p.evaluate(&attrs(json!({"a": 1, "b": 9}))));
        assert!(!p.evaluate(&attrs(json!({"a": 9, "b": 2}))));
    }

    #[test]
    fn none_compiles_to_conjunction_of_negations() {
        let p = predicate(json!(["none", ["has", "a"], ["has", "b"]]));
        assert_eq!(
            p,
            Predicate::All(vec![
                Predicate::Not(Box::new(Predicate::IsNull {
                    property: "a".into()
                })),
                Predicate::Not(Box::new(Predicate::IsNull {
                    property: "b".into()
                })),
            ])
        );
    }

    #[test]
    fn nested_combinators_evaluate() {
        let p = predicate(json!([
            "all",
            ["any", ["==", "class", "primary"], ["==", "class", "secondary"]],
            [">=", "lanes", 2]
        ]));
        assert!(p.evaluate(&attrs(json!({"class": "primary", "lanes": 3}))));
        assert!(!p.evaluate(&attrs(json!({"class": "primary", "lanes": 1}))));
        assert!(!p.evaluate(&attrs(json!({"class": "service", "lanes": 3}))));
    }

    #[test]
    fn renders_existence() {
        assert_eq!(predicate(json!(["has", "key"])).to_string(), "key IS NULL");
        assert_eq!(
            predicate(json!(["!has", "key"])).to_string(),
            "NOT (key IS NULL)"
        );
    }

    #[test]
    fn renders_comparisons() {
        assert_eq!(
            predicate(json!(["==", "key", "value"])).to_string(),
            "key = 'value'"
        );
        assert_eq!(
            predicate(json!(["!=", "key", "value"])).to_string(),
            "key <> 'value'"
        );
        assert_eq!(predicate(json!(["<=", "key", 10])).to_string(), "key <= 10");
    }

    #[test]
    fn renders_membership() {
        assert_eq!(
            predicate(json!(["in", "a", 1, 2, 3])).to_string(),
            "EQUALS(in(a,1,2,3), 'true')"
        );
        assert_eq!(
            predicate(json!(["!in", "a", 1, 2, 3])).to_string(),
            "EQUALS(in(a,1,2,3), 'false')"
        );
    }

    #[test]
    fn renders_combinators() {
        assert_eq!(
            predicate(json!(["all", ["==", "a", 1], ["==", "b", 2]])).to_string(),
            "a = 1 AND b = 2"
        );
        assert_eq!(
            predicate(json!(["any", ["==", "a", 1], ["==", "b", 2]])).to_string(),
            "a = 1 OR b = 2"
        );
        assert_eq!(
            predicate(json!(["none", ["==", "a", 1], ["==", "b", 2]])).to_string(),
            "NOT (a = 1) AND NOT (b = 2)"
        );
    }

    #[test]
    fn renders_nested_combinators_with_parens() {
        let p = predicate(json!([
            "all",
            ["any", ["==", "a", 1], ["==", "b", 2]],
            ["has", "c"]
        ]));
        assert_eq!(p.to_string(), "(a = 1 OR b = 2) AND c IS NULL");
    }

    #[test]
    fn renders_constant_filters() {
        assert_eq!(predicate(json!(["all"])).to_string(), "INCLUDE");
        assert_eq!(predicate(json!(["any"])).to_string(), "EXCLUDE");
        assert_eq!(predicate(json!(["none"])).to_string(), "INCLUDE");
    }

    #[test]
    fn evaluates_against_hashmap_attributes() {
        let p = predicate(json!(["==", "key", "value"]));
        let mut map = HashMap::new();
        map.insert("key".to_string(), json!("value"));
        assert!(p.evaluate(&map));
    }
}
