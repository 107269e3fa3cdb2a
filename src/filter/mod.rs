//! Compiler for the JSON-array style filter grammar.
//!
//! Syntax (each filter is a JSON array starting with an operator token):
//!   ["has", prop]              - attribute is absent/null
//!   ["!has", prop]             - attribute is present
//!   ["==", prop, value]        - comparison (also !=, >, <, >=, <=)
//!   ["in", prop, v1, v2, ...]  - set membership
//!   ["!in", prop, v1, v2, ...] - set exclusion
//!   ["all", f1, f2, ...]       - conjunction
//!   ["any", f1, f2, ...]       - disjunction
//!   ["none", f1, f2, ...]      - conjunction of per-child negations
//!
//! Parsing produces a transient [`ExprNode`] tree which compiles into an
//! immutable [`Predicate`] with `evaluate(attributes) -> bool` and a
//! deterministic `Display` rendering.

mod ast;
mod error;
mod parse;
mod predicate;

pub use ast::{CombinatorKind, CompareOp, ExprNode, Literal};
pub use error::FilterError;
pub use parse::parse_filter;
pub use predicate::{AttributeLookup, Predicate};

/// Parse and compile a filter in one step.
pub fn compile_filter(json: &serde_json::Value) -> Result<Predicate, FilterError> {
    Ok(Predicate::compile(parse_filter(json)?))
}
