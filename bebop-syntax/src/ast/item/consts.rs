use bebop_foundation::{
    errors::{Diagnostic, Label},
    source::{Span, Spanned},
};

use crate::{
    ast::{Attribute, Ident, Lit},
    lexis::{token::TokenKind, TokenStream},
    ParseError, Parser,
};

/// `const baseType NAME = literal;`
#[derive(Debug, Clone)]
pub struct ItemConst {
    pub doc: Option<String>,
    pub attributes: Vec<Attribute>,
    pub ty: Ident,
    pub name: Ident,
    pub value: Lit,
    pub span: Span,
}

impl ItemConst {
    pub fn parse(
        parser: &mut Parser<'_, impl TokenStream>,
        doc: Option<String>,
        attributes: Vec<Attribute>,
    ) -> Result<Self, ParseError> {
        let kconst = parser.expect(TokenKind::KConst)?;
        let ty = parser.parse::<Ident>().map_err(|error| {
            parser.emit_diagnostic(
                Diagnostic::error(parser.file, "constant type expected")
                    .with_label(Label::primary(error.span, "base type expected after `const`")),
            );
            error
        })?;
        let name = parser.parse::<Ident>()?;
        parser.expect(TokenKind::Assign)?;
        let value = parser.parse::<Lit>()?;
        let semi = parser.expect(TokenKind::Semi)?;
        Ok(Self {
            doc,
            attributes,
            ty,
            name,
            value,
            span: kconst.span.join(&semi.span),
        })
    }
}

impl Spanned for ItemConst {
    fn span(&self) -> Span {
        self.span
    }
}
