use thiserror::Error;

use crate::token::Position;
use crate::types::EntityUID;

/// Fatal error produced while tokenizing or parsing a policy document.
///
/// Parsing is fail-fast: the first error aborts the whole input. The message
/// carries the source position and the offending token text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at <input>:{line}:{column} {token:?}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    /// Text of the token the parser was looking at when it gave up.
    pub token: String,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(
        position: Position,
        token: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ParseError {
            line: position.line,
            column: position.column,
            token: token.into(),
            message: message.into(),
        }
    }
}

/// Error raised while evaluating a single policy condition.
///
/// An `EvalError` is fatal for the policy that raised it and for nothing
/// else: the authorizer records it in the diagnostic and keeps going with
/// the remaining policies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("attribute `{0}` does not exist")]
    AttributeDoesNotExist(String),

    #[error("entity `{0}` does not exist")]
    EntityDoesNotExist(EntityUID),

    /// Defensive: cannot occur for expressions produced by a clean parse.
    #[error("unknown extension function `{0}`")]
    UnknownExtensionFunction(String),

    /// Defensive: cannot occur for expressions produced by a clean parse.
    #[error("unknown extension method `{0}`")]
    UnknownExtensionMethod(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Position;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new(
            Position {
                offset: 10,
                line: 2,
                column: 5,
            },
            ")",
            "got ) want ::",
        );
        assert_eq!(
            err.to_string(),
            "parse error at <input>:2:5 \")\": got ) want ::"
        );
    }

    #[test]
    fn test_eval_error_display() {
        let err = EvalError::TypeError {
            expected: "long",
            got: "bool",
        };
        assert_eq!(err.to_string(), "type error: expected long, got bool");

        let err = EvalError::AttributeDoesNotExist("age".into());
        assert_eq!(err.to_string(), "attribute `age` does not exist");

        let err = EvalError::EntityDoesNotExist(EntityUID::new("User", "alice"));
        assert_eq!(err.to_string(), "entity `User::\"alice\"` does not exist");
    }
}
