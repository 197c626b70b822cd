use bebop_foundation::{
    errors::{Diagnostic, Label},
    source::{Span, Spanned},
};

use crate::{
    ast::{Attribute, Ident, Lit, TypeExpr},
    lexis::{token::TokenKind, TokenStream},
    parsing::diagnostics::notes,
    ParseError, Parser,
};

use super::{parse_attributes, recover_to_semi};

/// `message Name { index -> type field; .. }`
#[derive(Debug, Clone)]
pub struct ItemMessage {
    pub doc: Option<String>,
    pub attributes: Vec<Attribute>,
    pub name: Ident,
    pub fields: Vec<MessageField>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct MessageField {
    pub doc: Option<String>,
    pub attributes: Vec<Attribute>,
    /// Checked to be in `1..=255` and strictly increasing during analysis.
    pub index: Lit,
    pub ty: TypeExpr,
    pub name: Ident,
    pub span: Span,
}

impl ItemMessage {
    pub fn parse(
        parser: &mut Parser<'_, impl TokenStream>,
        doc: Option<String>,
        attributes: Vec<Attribute>,
    ) -> Result<Self, ParseError> {
        let kmessage = parser.expect(TokenKind::KMessage)?;
        let name = parser.parse::<Ident>().map_err(|error| {
            parser.emit_diagnostic(
                Diagnostic::error(parser.file, "message name expected")
                    .with_label(Label::primary(error.span, "message name expected here")),
            );
            error
        })?;
        parser.expect(TokenKind::LeftBrace)?;

        let mut fields = vec![];
        let close = loop {
            if let Some(close) = parser.eat(TokenKind::RightBrace) {
                break close;
            }
            if matches!(parser.peek_token(), Ok(token) if token.kind == TokenKind::EndOfFile) {
                break parser.expect(TokenKind::RightBrace)?;
            }
            match MessageField::parse(parser) {
                Ok(field) => fields.push(field),
                Err(_) => recover_to_semi(parser),
            }
        };

        Ok(Self {
            doc,
            attributes,
            name,
            fields,
            span: kmessage.span.join(&close.span),
        })
    }
}

impl MessageField {
    fn parse(parser: &mut Parser<'_, impl TokenStream>) -> Result<Self, ParseError> {
        let doc = parser.take_docs();
        let attributes = parse_attributes(parser)?;
        let index = parser.parse::<Lit>()?;
        parser.expect(TokenKind::Arrow).map_err(|error| {
            parser.emit_diagnostic(
                Diagnostic::error(parser.file, "`->` expected after message field index")
                    .with_label(Label::primary(index.span(), "this is the field index"))
                    .with_note(notes::MESSAGE_FIELD_SYNTAX),
            );
            error
        })?;
        let ty = parser.parse::<TypeExpr>()?;
        let name = parser.parse::<Ident>()?;
        let semi = parser.expect(TokenKind::Semi)?;
        Ok(Self {
            span: index.span().join(&semi.span),
            doc,
            attributes,
            index,
            ty,
            name,
        })
    }
}

impl Spanned for ItemMessage {
    fn span(&self) -> Span {
        self.span
    }
}
