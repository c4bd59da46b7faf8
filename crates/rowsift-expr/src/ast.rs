use std::collections::BTreeSet;
use std::fmt;

use crate::token::NA_LITERAL;

/// Comparison operators, in the order they appear in the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Ge,
    Eq,
    Ne,
    Lt,
    Le,
}

impl CompareOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Ge),
            "==" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }
}

/// Literal operand.
///
/// Date literals keep their raw text; they are parsed when evaluated so that
/// an impossible date degrades to a warning instead of a grammar error.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Date(String),
    Na,
}

/// Predicate AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Field(String),
    Literal(Literal),
    Sum(Box<Expr>, Box<Expr>),
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },
    NullTest {
        operand: Box<Expr>,
        negated: bool,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Group(Box<Expr>),
}

impl Expr {
    /// Field names referenced anywhere in the tree.
    pub fn fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Field(name) => {
                out.insert(name.clone());
            }
            Expr::Literal(_) => {}
            Expr::Sum(left, right) | Expr::And(left, right) | Expr::Or(left, right) => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
            Expr::Compare { left, right, .. } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
            Expr::NullTest { operand, .. } => operand.collect_fields(out),
            Expr::Group(inner) => inner.collect_fields(out),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(value) => write!(f, "{value}"),
            Literal::Float(value) => write!(f, "{value:?}"),
            Literal::Date(raw) => write!(f, "DATE({raw})"),
            Literal::Na => f.write_str(NA_LITERAL),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Field(name) => f.write_str(name),
            Expr::Literal(literal) => write!(f, "{literal}"),
            Expr::Sum(left, right) => write!(f, "{left} + {right}"),
            Expr::Compare { left, op, right } => write!(f, "{left} {} {right}", op.symbol()),
            Expr::NullTest { operand, negated } => {
                let op = if *negated { "IS NOT" } else { "IS" };
                write!(f, "{operand} {op} {NA_LITERAL}")
            }
            Expr::And(left, right) => write!(f, "{left} & {right}"),
            Expr::Or(left, right) => write!(f, "{left} | {right}"),
            Expr::Group(inner) => write!(f, "({inner})"),
        }
    }
}
