//! Compiler for JSON-array style filters: parses the boolean expression
//! grammar used by map style documents and compiles it into an immutable
//! predicate evaluable against feature attribute sets.

pub mod filter;
pub mod style;

pub use filter::{
    AttributeLookup, CompareOp, ExprNode, FilterError, Literal, Predicate, compile_filter,
    parse_filter,
};
pub use style::{CompiledLayer, LayerConfig, StyleConfig, StyleRules};
