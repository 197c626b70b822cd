use bebop_foundation::{
    errors::{Diagnostic, Label},
    source::{Span, Spanned},
};

use crate::{
    lexis::{token::TokenKind, TokenStream},
    Parse, ParseError, Parser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Decimal,
    Hex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloatLit {
    /// Decimal digits with an optional fraction, sign included.
    Digits(String),
    Inf,
    NegInf,
    Nan,
}

/// A literal as written in the schema. Target types are not known until
/// semantic analysis; the literal keeps whatever the lexer saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lit {
    Bool {
        value: bool,
        span: Span,
    },
    Int {
        /// Digits only; no sign, no `0x` prefix.
        digits: String,
        negative: bool,
        radix: Radix,
        span: Span,
    },
    Float {
        value: FloatLit,
        span: Span,
    },
    String {
        /// Quotes resolved: the delimiters are stripped and doubled quotes
        /// collapsed.
        value: String,
        span: Span,
    },
}

impl Spanned for Lit {
    fn span(&self) -> Span {
        match self {
            Lit::Bool { span, .. }
            | Lit::Int { span, .. }
            | Lit::Float { span, .. }
            | Lit::String { span, .. } => *span,
        }
    }
}

impl Lit {
    pub fn describe(&self) -> &'static str {
        match self {
            Lit::Bool { .. } => "boolean literal",
            Lit::Int { .. } => "integer literal",
            Lit::Float { .. } => "float literal",
            Lit::String { .. } => "string literal",
        }
    }
}

/// Strips the delimiting quotes and collapses doubled quotes. The lexer has
/// already validated the shape, so this cannot fail.
fn unquote(lexeme: &str) -> String {
    let quote = lexeme.chars().next().expect("string lexeme cannot be empty");
    let inner = &lexeme[quote.len_utf8()..lexeme.len() - quote.len_utf8()];
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        value.push(c);
        if c == quote {
            // The second quote of an escaped pair.
            chars.next();
        }
    }
    value
}

impl Parse for Lit {
    fn parse(parser: &mut Parser<'_, impl TokenStream>) -> Result<Self, ParseError> {
        let token = match parser.next_token() {
            Ok(token) => token,
            Err(span) => return Err(ParseError::new(span)),
        };
        let lexeme = token.span.get_input(parser.input);
        Ok(match token.kind {
            TokenKind::KTrue => Lit::Bool {
                value: true,
                span: token.span,
            },
            TokenKind::KFalse => Lit::Bool {
                value: false,
                span: token.span,
            },
            TokenKind::Int => {
                let negative = lexeme.starts_with('-');
                Lit::Int {
                    digits: lexeme.trim_start_matches('-').to_owned(),
                    negative,
                    radix: Radix::Decimal,
                    span: token.span,
                }
            }
            TokenKind::IntHex => {
                let negative = lexeme.starts_with('-');
                let digits = lexeme.trim_start_matches('-');
                let digits = digits
                    .strip_prefix("0x")
                    .or_else(|| digits.strip_prefix("0X"))
                    .expect("hex literal must start with 0x");
                Lit::Int {
                    digits: digits.to_owned(),
                    negative,
                    radix: Radix::Hex,
                    span: token.span,
                }
            }
            TokenKind::Float => Lit::Float {
                value: match lexeme {
                    "-inf" => FloatLit::NegInf,
                    _ => FloatLit::Digits(lexeme.to_owned()),
                },
                span: token.span,
            },
            TokenKind::KInf => Lit::Float {
                value: FloatLit::Inf,
                span: token.span,
            },
            TokenKind::KNan => Lit::Float {
                value: FloatLit::Nan,
                span: token.span,
            },
            TokenKind::String => Lit::String {
                value: unquote(lexeme),
                span: token.span,
            },
            _ => {
                return parser.bail(
                    token.span,
                    Diagnostic::error(parser.file, "literal expected")
                        .with_code("malformed-literal")
                        .with_label(Label::primary(token.span, "literal expected here")),
                )
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquote_collapses_doubled_quotes() {
        assert_eq!(unquote("\"hello\""), "hello");
        assert_eq!(unquote("'it''s'"), "it's");
        assert_eq!(unquote("\"say \"\"hi\"\"\""), "say \"hi\"");
        assert_eq!(unquote("\"\""), "");
    }
}
