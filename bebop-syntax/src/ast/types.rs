use bebop_foundation::{
    errors::{Diagnostic, Label},
    source::{Span, Spanned},
};

use crate::{
    ast::Ident,
    lexis::{token::TokenKind, TokenStream},
    parsing::diagnostics::notes,
    Parse, ParseError, Parser,
};

/// A type expression. Base types (`int32`, `string`, ..) are `Named` like any
/// user type; they are told apart during analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named(Ident),
    Array {
        element: Box<TypeExpr>,
        span: Span,
    },
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
        span: Span,
    },
    Option {
        inner: Box<TypeExpr>,
        span: Span,
    },
}

impl Spanned for TypeExpr {
    fn span(&self) -> Span {
        match self {
            TypeExpr::Named(name) => name.span,
            TypeExpr::Array { span, .. }
            | TypeExpr::Map { span, .. }
            | TypeExpr::Option { span, .. } => *span,
        }
    }
}

impl Parse for TypeExpr {
    fn parse(parser: &mut Parser<'_, impl TokenStream>) -> Result<Self, ParseError> {
        let name = match parser.peek_token() {
            Ok(token) if token.kind == TokenKind::Ident => {
                _ = parser.next_token();
                Ident::from_span(token.span, parser.input)
            }
            Ok(token) => {
                return parser.bail(
                    token.span,
                    Diagnostic::error(parser.file, "type expected")
                        .with_label(Label::primary(token.span, "type expected here")),
                )
            }
            Err(span) => return Err(ParseError::new(span)),
        };

        // `map` is not a keyword, but `map[` always begins a map type.
        let mut ty = if name.text == "map"
            && matches!(parser.peek_token(), Ok(token) if token.kind == TokenKind::LeftBracket)
        {
            let open = parser.expect(TokenKind::LeftBracket)?;
            let key = parser.parse::<TypeExpr>()?;
            parser.expect(TokenKind::Comma).map_err(|error| {
                parser.emit_diagnostic(
                    Diagnostic::error(parser.file, "`,` expected between map key and value types")
                        .with_label(Label::secondary(open.span, "the map type starts here"))
                        .with_note(notes::MAP_TYPE_SYNTAX),
                );
                error
            })?;
            let value = parser.parse::<TypeExpr>()?;
            let close = parser.expect(TokenKind::RightBracket)?;
            TypeExpr::Map {
                key: Box::new(key),
                value: Box::new(value),
                span: name.span.join(&close.span),
            }
        } else {
            TypeExpr::Named(name)
        };

        loop {
            match parser.peek_token() {
                Ok(token) if token.kind == TokenKind::Question => {
                    _ = parser.next_token();
                    ty = TypeExpr::Option {
                        span: ty.span().join(&token.span),
                        inner: Box::new(ty),
                    };
                }
                Ok(token) if token.kind == TokenKind::LeftBracket => {
                    _ = parser.next_token();
                    let close = parser.expect(TokenKind::RightBracket)?;
                    ty = TypeExpr::Array {
                        span: ty.span().join(&close.span),
                        element: Box::new(ty),
                    };
                }
                _ => break,
            }
        }
        Ok(ty)
    }
}
