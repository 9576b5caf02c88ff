//! Rule string tokenizer

use crate::config::ParseOptions;
use crate::error::{Result, RuleError};
use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::fmt;
use std::ops::Range;

/// Scanner pattern. Alternatives are tried in order at each position:
/// parenthesis, logical keyword, atomic condition.
static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\s*(?P<paren>[()])\s*|\s*(?P<logic>AND|OR)\b\s*|(?P<cond>[A-Za-z_][A-Za-z0-9_]*\s*(?:==|!=|>=|<=|=|>|<)\s*(?:'[^']*'|"[^"]*"|[0-9]+))\s*"#,
    )
    .expect("token pattern is valid")
});

/// Lexical token of a rule string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    And,
    Or,
    /// Raw text of one atomic comparison
    Condition(String),
}

/// Token plus its byte span in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    pub fn text(&self) -> &str {
        match &self.kind {
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Condition(raw) => raw,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Token buffer; most rules fit inline
pub type Tokens = SmallVec<[Token; 16]>;

/// Tokenize with the default (lenient) options
pub fn tokenize(rule: &str) -> Result<Tokens> {
    tokenize_with(rule, &ParseOptions::default())
}

/// Split a rule string into tokens.
///
/// Text matching none of the token patterns is skipped in lenient mode and
/// rejected with `UnexpectedToken` in strict mode.
pub fn tokenize_with(rule: &str, options: &ParseOptions) -> Result<Tokens> {
    if rule.trim().is_empty() {
        return Err(RuleError::EmptyRule);
    }

    let mut tokens = Tokens::new();
    let mut last_end = 0;

    for caps in TOKEN_PATTERN.captures_iter(rule) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if options.is_strict() {
            check_skipped(&rule[last_end..whole.start()])?;
        }
        last_end = whole.end();

        let (kind, span) = if let Some(m) = caps.name("paren") {
            let kind = if m.as_str() == "(" {
                TokenKind::LParen
            } else {
                TokenKind::RParen
            };
            (kind, m.range())
        } else if let Some(m) = caps.name("logic") {
            let kind = if m.as_str() == "AND" {
                TokenKind::And
            } else {
                TokenKind::Or
            };
            (kind, m.range())
        } else if let Some(m) = caps.name("cond") {
            (TokenKind::Condition(m.as_str().to_string()), m.range())
        } else {
            continue;
        };

        tokens.push(Token { kind, span });
    }

    if options.is_strict() {
        check_skipped(&rule[last_end..])?;
    }

    if tokens.is_empty() {
        return Err(RuleError::EmptyRule);
    }

    Ok(tokens)
}

fn check_skipped(gap: &str) -> Result<()> {
    let gap = gap.trim();
    if gap.is_empty() {
        Ok(())
    } else {
        Err(RuleError::UnexpectedToken(gap.to_string()))
    }
}
