//! Boolean row-filter expressions.
//!
//! An expression such as `age > 18 & (income IS NOT pd.NA | vip)` is lexed by
//! [`tokenize`], parsed into an [`Expr`] tree by [`parse_expression`] and
//! evaluated against a [`rowsift_core::Table`] by [`evaluate`], which yields a
//! row mask. Parsing is strict and fails eagerly; evaluation never fails and
//! reports data anomalies as [`EvalWarning`]s instead.

pub mod ast;
pub mod errors;
pub mod eval;
pub mod parser;
pub mod token;

pub use ast::{CompareOp, Expr, Literal};
pub use errors::ParseError;
pub use eval::{EvalWarning, Evaluation, evaluate};
pub use parser::parse_expression;
pub use token::{Token, TokenKind, tokenize};
