//! Recursive-descent parser.
//!
//! ```text
//! Or      := And ('|' And)*
//! And     := Primary ('&' Primary)*
//! Primary := '(' Or ')' | Operand [ ('IS' ['NOT'] 'NA') | CompOp Operand ]
//! Operand := FIELD | FIELD '+' Operand | NUMBER | DATE(...) | 'pd.NA'
//! ```

use crate::ast::{CompareOp, Expr, Literal};
use crate::errors::ParseError;
use crate::token::{Token, TokenKind, classify_word, tokenize};

const LOGICAL_OPS: [&str; 2] = ["&", "|"];
const NULL_TEST_OPS: [&str; 2] = ["IS", "IS NOT"];

/// Tokenize and parse one expression string.
///
/// Besides grammar errors this rejects empty input, unbalanced parentheses
/// and expressions without any comparison, null-test or logical operator.
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    if source.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let tokens = tokenize(source);
    check_parens(&tokens)?;
    if !tokens.iter().any(is_recognized_operator) {
        return Err(ParseError::MissingOperator);
    }
    Parser::new(tokens).parse()
}

fn check_parens(tokens: &[Token]) -> Result<(), ParseError> {
    let mut depth = 0_usize;
    for token in tokens {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth = depth.checked_sub(1).ok_or(ParseError::UnbalancedParens)?;
            }
            _ => {}
        }
    }
    if depth == 0 {
        Ok(())
    } else {
        Err(ParseError::UnbalancedParens)
    }
}

fn is_recognized_operator(token: &Token) -> bool {
    token.kind == TokenKind::Op
        && (CompareOp::from_symbol(&token.text).is_some()
            || LOGICAL_OPS.contains(&token.text.as_str())
            || NULL_TEST_OPS.contains(&token.text.as_str()))
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn parse(mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_or()?;
        match self.current() {
            None => Ok(expr),
            Some(token) => Err(ParseError::TrailingInput {
                token: token.text.clone(),
            }),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.match_op("|") {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_primary()?;
        while self.match_op("&") {
            let right = self.parse_primary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        if self.match_kind(TokenKind::LParen) {
            let inner = self.parse_or()?;
            if !self.match_kind(TokenKind::RParen) {
                return Err(self.unexpected());
            }
            return Ok(Expr::Group(Box::new(inner)));
        }

        let operand = self.parse_operand()?;

        if let Some(negated) = self.match_null_test() {
            self.expect_na()?;
            return Ok(Expr::NullTest {
                operand: Box::new(operand),
                negated,
            });
        }

        if let Some(op) = self.match_compare() {
            let right = self.parse_operand()?;
            return Ok(Expr::Compare {
                left: Box::new(operand),
                op,
                right: Box::new(right),
            });
        }

        Ok(operand)
    }

    fn parse_operand(&mut self) -> Result<Expr, ParseError> {
        let token = self.current().cloned().ok_or(ParseError::UnexpectedEnd)?;
        let left = match token.kind {
            TokenKind::Ident => {
                self.advance();
                split_sum(&token.text).ok_or_else(|| self.unexpected_at(&token))?
            }
            TokenKind::Number | TokenKind::DateLiteral | TokenKind::NaLiteral => {
                self.advance();
                atom(&token).ok_or_else(|| self.unexpected_at(&token))?
            }
            _ => return Err(self.unexpected()),
        };

        if self.match_op("+") {
            let right = self.parse_operand()?;
            return Ok(Expr::Sum(Box::new(left), Box::new(right)));
        }

        // `a +b` lexes as `a`, `+b`.
        if let Some(next) = self.current().cloned()
            && next.kind == TokenKind::Ident
            && let Some(rest) = next.text.strip_prefix('+')
        {
            self.advance();
            let right = split_sum(rest).ok_or_else(|| self.unexpected_at(&next))?;
            return Ok(Expr::Sum(Box::new(left), Box::new(right)));
        }

        Ok(left)
    }

    fn match_null_test(&mut self) -> Option<bool> {
        if self.match_op("IS NOT") {
            Some(true)
        } else if self.match_op("IS") {
            Some(false)
        } else {
            None
        }
    }

    fn expect_na(&mut self) -> Result<(), ParseError> {
        match self.current() {
            Some(token)
                if token.kind == TokenKind::NaLiteral
                    || (token.kind == TokenKind::Ident && token.text == "NA") =>
            {
                self.advance();
                Ok(())
            }
            _ => Err(self.unexpected()),
        }
    }

    fn match_compare(&mut self) -> Option<CompareOp> {
        let token = self.current()?;
        if token.kind != TokenKind::Op {
            return None;
        }
        let op = CompareOp::from_symbol(&token.text)?;
        self.advance();
        Some(op)
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn match_op(&mut self, text: &str) -> bool {
        if self.current().is_some_and(|token| token.is_op(text)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.current().is_some_and(|token| token.kind == kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self) -> ParseError {
        match self.current() {
            Some(token) => ParseError::UnexpectedToken {
                token: token.text.clone(),
                position: self.position,
            },
            None => ParseError::UnexpectedEnd,
        }
    }

    fn unexpected_at(&self, token: &Token) -> ParseError {
        ParseError::UnexpectedToken {
            token: token.text.clone(),
            position: self.position.saturating_sub(1),
        }
    }
}

/// Expand an identifier run with embedded `+` (`a+b+1`) into a right-nested
/// sum. Returns `None` when a part is empty (`a+`, `+`).
fn split_sum(text: &str) -> Option<Expr> {
    if is_number_text(text) {
        return atom(&classify_word(text));
    }
    let parts: Vec<&str> = text.split('+').collect();
    if parts.iter().any(|part| part.is_empty()) {
        return None;
    }
    let mut operands = parts
        .into_iter()
        .map(|part| atom(&classify_word(part)))
        .collect::<Option<Vec<_>>>()?;
    let mut expr = operands.pop()?;
    while let Some(left) = operands.pop() {
        expr = Expr::Sum(Box::new(left), Box::new(expr));
    }
    Some(expr)
}

fn is_number_text(text: &str) -> bool {
    classify_word(text).kind == TokenKind::Number
}

fn atom(token: &Token) -> Option<Expr> {
    match token.kind {
        TokenKind::Ident => Some(Expr::Field(token.text.clone())),
        TokenKind::NaLiteral => Some(Expr::Literal(Literal::Na)),
        TokenKind::Number => {
            let literal = match token.text.parse::<i64>() {
                Ok(value) => Literal::Int(value),
                Err(_) => Literal::Float(token.text.parse::<f64>().ok()?),
            };
            Some(Expr::Literal(literal))
        }
        TokenKind::DateLiteral => {
            let raw = token.text.strip_prefix("DATE(")?.strip_suffix(')')?;
            Some(Expr::Literal(Literal::Date(raw.to_string())))
        }
        TokenKind::Op | TokenKind::LParen | TokenKind::RParen => None,
    }
}
