//! # error.rs
//!
//! The error taxonomy shared by the tokenizer, the tree builders and
//! evaluation. Each failure mode gets its own variant so callers can
//! distinguish malformed input from absent input, an unknown variable from a
//! type mismatch, and so on, instead of matching on message strings.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ExprError>;

/// Every way tokenizing, building or evaluating an expression can fail.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    /// The input text violates the grammar: an unexpected character, a
    /// malformed number, unbalanced parentheses, a missing operand or
    /// trailing tokens after a complete expression. `found` is the offending
    /// token or character.
    #[error("syntax error at \"{found}\"")]
    Syntax { found: String },

    /// Evaluation reached a variable leaf with no binding in the context.
    #[error("variable \"{name}\" has no assigned value")]
    UnassignedVariable { name: String },

    /// An operator or function met an operand it cannot work on, e.g.
    /// adding a matrix to a scalar of mismatched shape or taking the sine
    /// of a matrix.
    #[error("{operation}: expected {expected}, got {actual}")]
    InvalidArgumentType {
        operation: String,
        expected: String,
        actual: String,
    },

    /// A builder was asked to construct a node kind it does not declare
    /// support for. Raised at build time, not evaluation time.
    #[error("builder \"{builder}\" does not support the \"{operator}\" construction")]
    UnsupportedConstruction {
        builder: &'static str,
        operator: String,
    },

    /// No input text was supplied at all. Distinct from [`Self::Syntax`] so
    /// callers can tell "nothing to parse" from "malformed input".
    #[error("no input expression supplied")]
    AbsentInput,

    /// A registry rejected a constant or function definition that violates
    /// its population invariants.
    #[error("cannot register \"{name}\": {reason}")]
    Registration { name: String, reason: String },
}

impl ExprError {
    /// Shorthand for [`ExprError::InvalidArgumentType`].
    pub(crate) fn bad_argument(
        operation: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        ExprError::InvalidArgumentType {
            operation: operation.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_message_names_token() {
        let err = ExprError::Syntax { found: "}".into() };
        assert_eq!(err.to_string(), "syntax error at \"}\"");
    }

    #[test]
    fn test_absent_input_is_not_syntax() {
        assert_ne!(
            ExprError::AbsentInput,
            ExprError::Syntax { found: "".into() }
        );
        assert_eq!(
            ExprError::AbsentInput.to_string(),
            "no input expression supplied"
        );
    }

    #[test]
    fn test_bad_argument_shorthand() {
        let err = ExprError::bad_argument("sin", "a complex scalar", "3x3 matrix");
        assert_eq!(err.to_string(), "sin: expected a complex scalar, got 3x3 matrix");
    }
}
