use thiserror::Error;

/// Grammar errors detected while turning an expression string into an AST.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expression is empty")]
    Empty,
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("no comparison, null-test or logical operator found")]
    MissingOperator,
    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken { token: String, position: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected trailing input starting at '{token}'")]
    TrailingInput { token: String },
}
