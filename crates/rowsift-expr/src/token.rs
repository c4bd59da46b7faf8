use std::sync::LazyLock;

use regex::Regex;

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    DateLiteral,
    NaLiteral,
    Op,
    LParen,
    RParen,
}

/// A lexed token. `text` is the token as written, with inner whitespace
/// collapsed (`IS   NOT` becomes `IS NOT`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// True when this is an operator token with exactly `text`.
    pub fn is_op(&self, text: &str) -> bool {
        self.kind == TokenKind::Op && self.text == text
    }
}

/// Null literal accepted on either side of a comparison or after `IS`.
pub const NA_LITERAL: &str = "pd.NA";

// Alternatives are tried left to right at each position, which gives the
// operator precedence `IS NOT` > `IS` > two-char > one-char.
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        (?P<date>DATE\(\s*\d{4}-\d{2}-\d{2}\s*\))
        | (?P<lparen>\()
        | (?P<rparen>\))
        | (?P<op>IS\s+NOT\b | IS\b | <= | >= | == | != | < | > | & | \|)
        | (?P<neg>-\d+(?:\.\d+)?(?:[eE][+-]?\d+)?)
        | (?P<exp>\d+(?:\.\d+)?[eE][+-]?\d+\b)
        | (?P<word>[\w.+]+)
        | (?P<other>\S)
        ",
    )
    .expect("token pattern is a valid regex")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is a valid regex"));

/// Split an expression into tokens.
///
/// Never fails: characters outside the grammar come back as single-char
/// `Op` tokens and are rejected by the parser.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for caps in TOKEN_PATTERN.captures_iter(input) {
        let token = if let Some(m) = caps.name("date") {
            let text = WHITESPACE.replace_all(m.as_str(), "");
            Token::new(TokenKind::DateLiteral, text)
        } else if caps.name("lparen").is_some() {
            Token::new(TokenKind::LParen, "(")
        } else if caps.name("rparen").is_some() {
            Token::new(TokenKind::RParen, ")")
        } else if let Some(m) = caps.name("op") {
            Token::new(TokenKind::Op, WHITESPACE.replace_all(m.as_str(), " "))
        } else if let Some(m) = caps.name("neg").or_else(|| caps.name("exp")) {
            Token::new(TokenKind::Number, m.as_str())
        } else if let Some(m) = caps.name("word") {
            classify_word(m.as_str())
        } else if let Some(m) = caps.name("other") {
            Token::new(TokenKind::Op, m.as_str())
        } else {
            continue;
        };
        tokens.push(token);
    }
    tokens
}

/// Classify an identifier/number run. A bare `+` is an operator.
pub(crate) fn classify_word(word: &str) -> Token {
    if word == "+" {
        Token::new(TokenKind::Op, word)
    } else if word == NA_LITERAL {
        Token::new(TokenKind::NaLiteral, word)
    } else if is_number(word) {
        Token::new(TokenKind::Number, word)
    } else {
        Token::new(TokenKind::Ident, word)
    }
}

fn is_number(word: &str) -> bool {
    let leading = word.trim_start_matches('-').chars().next();
    matches!(leading, Some(c) if c.is_ascii_digit() || c == '.') && word.parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<(TokenKind, String)> {
        tokenize(input)
            .into_iter()
            .map(|token| (token.kind, token.text))
            .collect()
    }

    #[test]
    fn lexes_comparison_chain() {
        assert_eq!(
            kinds("age>18&age<=65"),
            vec![
                (TokenKind::Ident, "age".to_string()),
                (TokenKind::Op, ">".to_string()),
                (TokenKind::Number, "18".to_string()),
                (TokenKind::Op, "&".to_string()),
                (TokenKind::Ident, "age".to_string()),
                (TokenKind::Op, "<=".to_string()),
                (TokenKind::Number, "65".to_string()),
            ]
        );
    }

    #[test]
    fn prefers_is_not_over_is() {
        assert_eq!(
            kinds("income IS   NOT pd.NA"),
            vec![
                (TokenKind::Ident, "income".to_string()),
                (TokenKind::Op, "IS NOT".to_string()),
                (TokenKind::NaLiteral, "pd.NA".to_string()),
            ]
        );
        assert_eq!(kinds("ISLAND")[0], (TokenKind::Ident, "ISLAND".to_string()));
    }

    #[test]
    fn date_literal_is_one_token() {
        assert_eq!(
            kinds("(start >= DATE(2024-01-31))"),
            vec![
                (TokenKind::LParen, "(".to_string()),
                (TokenKind::Ident, "start".to_string()),
                (TokenKind::Op, ">=".to_string()),
                (TokenKind::DateLiteral, "DATE(2024-01-31)".to_string()),
                (TokenKind::RParen, ")".to_string()),
            ]
        );
    }

    #[test]
    fn keeps_embedded_plus_inside_runs() {
        assert_eq!(
            kinds("a+b > c + 1.5"),
            vec![
                (TokenKind::Ident, "a+b".to_string()),
                (TokenKind::Op, ">".to_string()),
                (TokenKind::Ident, "c".to_string()),
                (TokenKind::Op, "+".to_string()),
                (TokenKind::Number, "1.5".to_string()),
            ]
        );
    }

    #[test]
    fn negative_numbers_and_stray_characters() {
        assert_eq!(kinds("x > -3")[2], (TokenKind::Number, "-3".to_string()));
        assert_eq!(kinds("x = 3")[1], (TokenKind::Op, "=".to_string()));
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn scientific_numbers_keep_signed_exponents() {
        assert_eq!(kinds("x > 1e-5")[2], (TokenKind::Number, "1e-5".to_string()));
        assert_eq!(kinds("x<2.5E+3")[2], (TokenKind::Number, "2.5E+3".to_string()));
        assert_eq!(kinds("x > -1e-5")[2], (TokenKind::Number, "-1e-5".to_string()));
        assert_eq!(kinds("x > 1e5")[2], (TokenKind::Number, "1e5".to_string()));
    }
}
