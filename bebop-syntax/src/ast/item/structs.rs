use bebop_foundation::{
    errors::{Diagnostic, Label},
    source::{Span, Spanned},
};

use crate::{
    ast::{Attribute, Ident, TypeExpr},
    lexis::{token::TokenKind, TokenStream},
    ParseError, Parser,
};

use super::{parse_attributes, recover_to_semi};

/// `[readonly] struct Name { type field; .. }`
#[derive(Debug, Clone)]
pub struct ItemStruct {
    pub doc: Option<String>,
    pub attributes: Vec<Attribute>,
    pub readonly: Option<Span>,
    pub name: Ident,
    pub fields: Vec<Field>,
    pub span: Span,
}

/// `type name;` - used by structs directly and by messages behind an index.
#[derive(Debug, Clone)]
pub struct Field {
    pub doc: Option<String>,
    pub attributes: Vec<Attribute>,
    pub ty: TypeExpr,
    pub name: Ident,
    pub span: Span,
}

impl ItemStruct {
    pub fn parse(
        parser: &mut Parser<'_, impl TokenStream>,
        doc: Option<String>,
        attributes: Vec<Attribute>,
    ) -> Result<Self, ParseError> {
        let readonly = parser.eat(TokenKind::KReadonly).map(|token| token.span);
        let kstruct = parser.expect(TokenKind::KStruct)?;
        let name = parser.parse::<Ident>().map_err(|error| {
            parser.emit_diagnostic(
                Diagnostic::error(parser.file, "struct name expected")
                    .with_label(Label::primary(error.span, "struct name expected here")),
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
            match Field::parse(parser) {
                Ok(field) => fields.push(field),
                Err(_) => recover_to_semi(parser),
            }
        };

        Ok(Self {
            doc,
            attributes,
            readonly,
            name,
            fields,
            span: readonly.unwrap_or(kstruct.span).join(&close.span),
        })
    }
}

impl Field {
    pub(crate) fn parse(parser: &mut Parser<'_, impl TokenStream>) -> Result<Self, ParseError> {
        let doc = parser.take_docs();
        let attributes = parse_attributes(parser)?;
        let ty = parser.parse::<TypeExpr>()?;
        let name = parser.parse::<Ident>()?;
        let semi = parser.expect(TokenKind::Semi)?;
        Ok(Self {
            span: ty.span().join(&semi.span),
            doc,
            attributes,
            ty,
            name,
        })
    }
}

impl Spanned for ItemStruct {
    fn span(&self) -> Span {
        self.span
    }
}
