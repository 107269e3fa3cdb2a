//! Error taxonomy for filter parsing and compilation.

use thiserror::Error;

/// Fatal filter compilation error. Evaluation itself never fails;
/// absent attributes are treated as semantic null.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// The JSON shape does not match the grammar: wrong arity, unknown
    /// operator token, or the wrong JSON kind at a fixed position.
    #[error("malformed filter at `{token}`: {reason}")]
    MalformedFilter { token: String, reason: String },

    /// A literal position holds something outside the closed value set
    /// (number, string, boolean).
    #[error("invalid operand for `{token}`: {reason}")]
    InvalidOperand { token: String, reason: String },
}

impl FilterError {
    pub(crate) fn malformed(token: impl Into<String>, reason: impl Into<String>) -> Self {
        FilterError::MalformedFilter {
            token: token.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_operand(token: impl Into<String>, reason: impl Into<String>) -> Self {
        FilterError::InvalidOperand {
            token: token.into(),
            reason: reason.into(),
        }
    }
}
