use bebop_foundation::{
    errors::{Diagnostic, Label},
    source::{Span, Spanned},
};

use crate::{
    ast::{Attribute, Ident, Item, ItemMessage, ItemStruct, Lit},
    lexis::{token::TokenKind, TokenStream},
    parsing::diagnostics::notes,
    ParseError, Parser,
};

use super::{parse_attributes, recover_to_semi};

/// `union Name { discriminator -> struct A { .. }; .. }`
///
/// Branch bodies are full inline definitions; they live in a scope of their
/// own during analysis.
#[derive(Debug, Clone)]
pub struct ItemUnion {
    pub doc: Option<String>,
    pub attributes: Vec<Attribute>,
    pub name: Ident,
    pub branches: Vec<UnionBranch>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct UnionBranch {
    pub doc: Option<String>,
    /// Checked to be in `1..=255` and strictly increasing during analysis.
    pub discriminator: Lit,
    pub item: Box<Item>,
    pub span: Span,
}

impl ItemUnion {
    pub fn parse(
        parser: &mut Parser<'_, impl TokenStream>,
        doc: Option<String>,
        attributes: Vec<Attribute>,
    ) -> Result<Self, ParseError> {
        let kunion = parser.expect(TokenKind::KUnion)?;
        let name = parser.parse::<Ident>().map_err(|error| {
            parser.emit_diagnostic(
                Diagnostic::error(parser.file, "union name expected")
                    .with_label(Label::primary(error.span, "union name expected here")),
            );
            error
        })?;
        parser.expect(TokenKind::LeftBrace)?;

        let mut branches = vec![];
        let close = loop {
            if let Some(close) = parser.eat(TokenKind::RightBrace) {
                break close;
            }
            if matches!(parser.peek_token(), Ok(token) if token.kind == TokenKind::EndOfFile) {
                break parser.expect(TokenKind::RightBrace)?;
            }
            match UnionBranch::parse(parser) {
                Ok(branch) => branches.push(branch),
                Err(_) => recover_to_semi(parser),
            }
        };

        Ok(Self {
            doc,
            attributes,
            name,
            branches,
            span: kunion.span.join(&close.span),
        })
    }
}

impl UnionBranch {
    fn parse(parser: &mut Parser<'_, impl TokenStream>) -> Result<Self, ParseError> {
        let doc = parser.take_docs();
        let discriminator = parser.parse::<Lit>()?;
        parser.expect(TokenKind::Arrow).map_err(|error| {
            parser.emit_diagnostic(
                Diagnostic::error(parser.file, "`->` expected after union discriminator")
                    .with_label(Label::primary(
                        discriminator.span(),
                        "this is the discriminator",
                    ))
                    .with_note(notes::UNION_BRANCH_SYNTAX),
            );
            error
        })?;

        // Only aggregate definitions can be union branches; enums and nested
        // unions have no place here.
        let branch_doc = parser.take_docs();
        let branch_attributes = parse_attributes(parser)?;
        let item = match parser.peek_token() {
            Ok(token) => match token.kind {
                TokenKind::KStruct | TokenKind::KReadonly => Item::Struct(ItemStruct::parse(
                    parser,
                    branch_doc,
                    branch_attributes,
                )?),
                TokenKind::KMessage => Item::Message(ItemMessage::parse(
                    parser,
                    branch_doc,
                    branch_attributes,
                )?),
                _ => {
                    return parser.bail(
                        token.span,
                        Diagnostic::error(
                            parser.file,
                            "a union branch must be a struct or message definition",
                        )
                        .with_label(Label::primary(
                            token.span,
                            "`struct` or `message` expected here",
                        ))
                        .with_note(notes::UNION_BRANCH_SYNTAX),
                    )
                }
            },
            Err(span) => return Err(ParseError::new(span)),
        };
        let semi = parser.expect(TokenKind::Semi)?;
        Ok(Self {
            span: discriminator.span().join(&semi.span),
            doc,
            discriminator,
            item: Box::new(item),
        })
    }
}

impl Spanned for ItemUnion {
    fn span(&self) -> Span {
        self.span
    }
}
