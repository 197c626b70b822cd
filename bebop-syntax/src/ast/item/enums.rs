use bebop_foundation::{
    errors::{Diagnostic, Label},
    source::{Span, Spanned},
};

use crate::{
    ast::{Attribute, Ident, Lit},
    lexis::{token::TokenKind, TokenStream},
    ParseError, Parser,
};

use super::{parse_attributes, recover_to_semi};

/// `enum Name [: baseType] { Member = value; .. }`
#[derive(Debug, Clone)]
pub struct ItemEnum {
    pub doc: Option<String>,
    pub attributes: Vec<Attribute>,
    pub name: Ident,
    /// The backing scalar. `None` means the default, `uint32`.
    pub base: Option<Ident>,
    pub members: Vec<EnumMember>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub doc: Option<String>,
    pub attributes: Vec<Attribute>,
    pub name: Ident,
    pub value: Lit,
    pub span: Span,
}

impl ItemEnum {
    pub fn parse(
        parser: &mut Parser<'_, impl TokenStream>,
        doc: Option<String>,
        attributes: Vec<Attribute>,
    ) -> Result<Self, ParseError> {
        let kenum = parser.expect(TokenKind::KEnum)?;
        let name = parser.parse::<Ident>().map_err(|error| {
            parser.emit_diagnostic(
                Diagnostic::error(parser.file, "enum name expected")
                    .with_label(Label::primary(error.span, "enum name expected here")),
            );
            error
        })?;
        let base = if parser.eat(TokenKind::Colon).is_some() {
            Some(parser.parse::<Ident>()?)
        } else {
            None
        };
        parser.expect(TokenKind::LeftBrace)?;

        let mut members = vec![];
        let close = loop {
            if let Some(close) = parser.eat(TokenKind::RightBrace) {
                break close;
            }
            if matches!(parser.peek_token(), Ok(token) if token.kind == TokenKind::EndOfFile) {
                let close = parser.expect(TokenKind::RightBrace)?;
                break close;
            }
            match EnumMember::parse(parser) {
                Ok(member) => members.push(member),
                Err(_) => recover_to_semi(parser),
            }
        };

        Ok(Self {
            doc,
            attributes,
            name,
            base,
            members,
            span: kenum.span.join(&close.span),
        })
    }
}

impl EnumMember {
    fn parse(parser: &mut Parser<'_, impl TokenStream>) -> Result<Self, ParseError> {
        let doc = parser.take_docs();
        let attributes = parse_attributes(parser)?;
        let name = parser.parse::<Ident>()?;
        parser.expect(TokenKind::Assign).map_err(|error| {
            parser.emit_diagnostic(
                Diagnostic::error(parser.file, "enum members must be assigned explicit values")
                    .with_label(Label::primary(
                        name.span,
                        format!("`{} = value;` expected", name.text),
                    )),
            );
            error
        })?;
        let value = parser.parse::<Lit>()?;
        let semi = parser.expect(TokenKind::Semi)?;
        Ok(Self {
            span: name.span.join(&semi.span),
            doc,
            attributes,
            name,
            value,
        })
    }
}

impl Spanned for ItemEnum {
    fn span(&self) -> Span {
        self.span
    }
}
