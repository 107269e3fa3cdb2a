//! Expression tree produced by the filter grammar parser.

use std::fmt;

/// Parsed filter expression, one node per grammar form.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    /// Existence check: `["has", prop]`
    Existence { property: String },

    /// Comparison against a literal: `["==", prop, value]` etc.
    Comparison {
        op: CompareOp,
        property: String,
        literal: Literal,
    },

    /// Set membership: `["in", prop, v1, v2, ...]`
    Membership {
        property: String,
        values: Vec<Literal>,
    },

    /// Logical aggregation: `["all", f1, f2, ...]` etc.
    Combinator {
        kind: CombinatorKind,
        children: Vec<ExprNode>,
    },

    /// Negation, produced only for the `!has` / `!in` surface forms.
    Negation(Box<ExprNode>),
}

/// Comparison operator token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq, // ==
    Ne, // !=
    Gt, // >
    Lt, // <
    Ge, // >=
    Le, // <=
}

impl CompareOp {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "==" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            ">" => Some(CompareOp::Gt),
            "<" => Some(CompareOp::Lt),
            ">=" => Some(CompareOp::Ge),
            "<=" => Some(CompareOp::Le),
            _ => None,
        }
    }
}

/// Renders the ECQL spelling of the operator (`<>` for not-equal).
impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "="),
            CompareOp::Ne => write!(f, "<>"),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Ge => write!(f, ">="),
            CompareOp::Le => write!(f, "<="),
        }
    }
}

/// Logical combinator kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinatorKind {
    All,
    Any,
    None,
}

/// Literal operand value. The grammar admits only these three kinds;
/// objects and arrays are rejected at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Bool(bool),
}

impl Literal {
    /// The numeric value, if this literal is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Literal::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String form used for cross-domain comparison (unquoted).
    pub fn string_form(&self) -> String {
        match self {
            Literal::Number(n) => format_number(*n),
            Literal::String(s) => s.clone(),
            Literal::Bool(b) => b.to_string(),
        }
    }
}

/// Renders the literal the way ECQL would: strings single-quoted with
/// embedded quotes doubled, numbers and booleans bare.
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", format_number(*n)),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Format a number without a trailing `.0` for integral values.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
