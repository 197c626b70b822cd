mod consts;
mod enums;
mod messages;
mod structs;
mod unions;

pub use consts::*;
pub use enums::*;
pub use messages::*;
pub use structs::*;
pub use unions::*;

use bebop_foundation::{
    errors::{Diagnostic, Label},
    source::{Span, Spanned},
};

use crate::{
    ast::Lit,
    lexis::{token::TokenKind, TokenStream},
    parsing::diagnostics::{labels, notes},
    Parse, ParseError, Parser,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub text: String,
    pub span: Span,
}

impl Ident {
    pub fn from_span(span: Span, input: &str) -> Self {
        Self {
            text: span.get_input(input).to_owned(),
            span,
        }
    }
}

impl Spanned for Ident {
    fn span(&self) -> Span {
        self.span
    }
}

impl Parse for Ident {
    fn parse(parser: &mut Parser<'_, impl TokenStream>) -> Result<Self, ParseError> {
        match parser.next_token() {
            Ok(token) if token.kind == TokenKind::Ident => {
                Ok(Ident::from_span(token.span, parser.input))
            }
            Ok(token) => parser.bail(
                token.span,
                Diagnostic::error(parser.file, "identifier expected")
                    .with_label(labels::invalid_identifier(token.span, parser.input))
                    .with_note(notes::IDENTIFIER_CHARS),
            ),
            Err(span) => Err(ParseError::new(span)),
        }
    }
}

/// `[name]` or `[name(literal)]`, attached to the definition or field that
/// follows. Which names mean anything is decided during analysis.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: Ident,
    pub value: Option<Lit>,
    pub span: Span,
}

impl Spanned for Attribute {
    fn span(&self) -> Span {
        self.span
    }
}

impl Parse for Attribute {
    fn parse(parser: &mut Parser<'_, impl TokenStream>) -> Result<Self, ParseError> {
        let open = parser.expect(TokenKind::LeftBracket)?;
        let name = parser.parse::<Ident>()?;
        let value = if parser.eat(TokenKind::LeftParen).is_some() {
            let value = parser.parse::<Lit>()?;
            parser.expect(TokenKind::RightParen)?;
            Some(value)
        } else {
            None
        };
        let close = parser.expect(TokenKind::RightBracket).map_err(|error| {
            parser.emit_diagnostic(
                Diagnostic::error(parser.file, "missing `]` to close attribute")
                    .with_code("malformed-attribute")
                    .with_label(Label::secondary(open.span, "the attribute starts here")),
            );
            error
        })?;
        Ok(Self {
            name,
            value,
            span: open.span.join(&close.span),
        })
    }
}

fn parse_attributes(
    parser: &mut Parser<'_, impl TokenStream>,
) -> Result<Vec<Attribute>, ParseError> {
    let mut attributes = vec![];
    while matches!(parser.peek_token(), Ok(token) if token.kind == TokenKind::LeftBracket) {
        attributes.push(parser.parse::<Attribute>()?);
    }
    Ok(attributes)
}

#[derive(Debug, Clone)]
pub enum Item {
    Enum(ItemEnum),
    Struct(ItemStruct),
    Message(ItemMessage),
    Union(ItemUnion),
    Const(ItemConst),
}

impl Item {
    pub fn name(&self) -> &Ident {
        match self {
            Item::Enum(item) => &item.name,
            Item::Struct(item) => &item.name,
            Item::Message(item) => &item.name,
            Item::Union(item) => &item.name,
            Item::Const(item) => &item.name,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Item::Enum(_) => "enum",
            Item::Struct(_) => "struct",
            Item::Message(_) => "message",
            Item::Union(_) => "union",
            Item::Const(_) => "const",
        }
    }

    /// Parses one definition, with its documentation already collected by the
    /// caller. Attributes are parsed here so that recovery can resume at a
    /// `[` as well as at a keyword.
    pub fn parse_with_doc(
        parser: &mut Parser<'_, impl TokenStream>,
        doc: Option<String>,
    ) -> Result<Item, ParseError> {
        let attributes = parse_attributes(parser)?;
        let token = match parser.peek_token() {
            Ok(token) => token,
            Err(span) => return Err(ParseError::new(span)),
        };
        match token.kind {
            TokenKind::KEnum => Ok(Item::Enum(ItemEnum::parse(parser, doc, attributes)?)),
            TokenKind::KStruct | TokenKind::KReadonly => {
                Ok(Item::Struct(ItemStruct::parse(parser, doc, attributes)?))
            }
            TokenKind::KMessage => Ok(Item::Message(ItemMessage::parse(parser, doc, attributes)?)),
            TokenKind::KUnion => Ok(Item::Union(ItemUnion::parse(parser, doc, attributes)?)),
            TokenKind::KConst => Ok(Item::Const(ItemConst::parse(parser, doc, attributes)?)),
            _ => parser.bail(
                token.span,
                Diagnostic::error(
                    parser.file,
                    format!(
                        "definition expected, but found {}",
                        token.kind.describe()
                    ),
                )
                .with_code("unexpected-token")
                .with_label(Label::primary(
                    token.span,
                    "`enum`, `struct`, `message`, `union` or `const` expected here",
                )),
            ),
        }
    }
}

impl Spanned for Item {
    fn span(&self) -> Span {
        match self {
            Item::Enum(item) => item.span,
            Item::Struct(item) => item.span,
            Item::Message(item) => item.span,
            Item::Union(item) => item.span,
            Item::Const(item) => item.span,
        }
    }
}

/// Recovery inside a `{ .. }` body: skip to just past the next `;`, or stop
/// before the `}` that would close the body.
fn recover_to_semi(parser: &mut Parser<'_, impl TokenStream>) {
    let mut depth = 0usize;
    loop {
        match parser.peek_token() {
            Ok(token) => match token.kind {
                TokenKind::EndOfFile => return,
                TokenKind::Semi if depth == 0 => {
                    _ = parser.next_token();
                    return;
                }
                TokenKind::LeftBrace => {
                    depth += 1;
                    _ = parser.next_token();
                }
                TokenKind::RightBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    _ = parser.next_token();
                }
                _ => _ = parser.next_token(),
            },
            Err(_) => _ = parser.next_token(),
        }
    }
}
