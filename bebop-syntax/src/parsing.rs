pub mod diagnostics;

use bebop_foundation::{
    errors::{Diagnostic, Label},
    source::{SourceFileId, Span},
};

use crate::lexis::{
    token::{clean_block_comment, Token, TokenKind},
    LexError, TokenStream,
};

pub struct Parser<'a, T> {
    pub file: SourceFileId,
    pub input: &'a str,
    pub tokens: T,
    pub errors: Vec<Diagnostic>,
}

impl<'a, T> Parser<'a, T> {
    pub fn new(file: SourceFileId, input: &'a str, tokens: T) -> Self {
        Self {
            file,
            input,
            tokens,
            errors: vec![],
        }
    }

    pub fn emit_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.errors.push(diagnostic);
    }

    pub fn bail<N>(&mut self, error_span: Span, error: Diagnostic) -> Result<N, ParseError> {
        self.errors.push(error);
        Err(ParseError::new(error_span))
    }
}

impl<'a, T> Parser<'a, T>
where
    T: TokenStream,
{
    pub fn next_token(&mut self) -> Result<Token, Span> {
        self.tokens.next().map_err(|LexError { span, diagnostic }| {
            self.errors.push(*diagnostic);
            span
        })
    }

    pub fn peek_token(&mut self) -> Result<Token, Span> {
        self.tokens.peek().map_err(|LexError { span, .. }| span)
    }

    /// Consumes the next token, requiring it to be of the given kind.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        match self.next_token() {
            Ok(token) if token.kind == kind => Ok(token),
            Ok(token) => {
                let code = match kind {
                    TokenKind::Semi => "missing-semicolon",
                    _ => "unexpected-token",
                };
                self.bail(
                    token.span,
                    Diagnostic::error(
                        self.file,
                        format!(
                            "{} expected, but found {}",
                            kind.describe(),
                            token.kind.describe()
                        ),
                    )
                    .with_code(code)
                    .with_label(Label::primary(
                        token.span,
                        format!("{} expected here", kind.describe()),
                    )),
                )
            }
            Err(span) => Err(ParseError::new(span)),
        }
    }

    /// Consumes the next token if it is of the given kind.
    pub fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        match self.peek_token() {
            Ok(token) if token.kind == kind => {
                _ = self.next_token();
                Some(token)
            }
            _ => None,
        }
    }

    /// Collects the contiguous run of block comments before the next real
    /// token. The cleaned text becomes the documentation of whatever is
    /// parsed next.
    pub fn take_docs(&mut self) -> Option<String> {
        let mut docs: Option<String> = None;
        while let Ok(token) = self.tokens.peek_include_comments() {
            if token.kind != TokenKind::Comment {
                break;
            }
            _ = self.tokens.next_include_comments();
            let text = clean_block_comment(token.span.get_input(self.input));
            match &mut docs {
                Some(docs) => {
                    docs.push('\n');
                    docs.push_str(&text);
                }
                None => docs = Some(text),
            }
        }
        docs
    }

    /// Error recovery: skip forward to the next definition-start keyword at
    /// brace depth zero, or just past the `}` that closes the current body.
    pub fn skip_to_next_definition(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek_token() {
                Ok(token) => match token.kind {
                    TokenKind::EndOfFile => return,
                    TokenKind::LeftBrace => {
                        depth += 1;
                        _ = self.next_token();
                    }
                    TokenKind::RightBrace => {
                        _ = self.next_token();
                        if depth == 0 {
                            return;
                        }
                        depth -= 1;
                    }
                    kind if depth == 0 && kind.starts_definition() => return,
                    _ => _ = self.next_token(),
                },
                // The lexer already advanced past whatever it could not
                // recognize; recording the diagnostic is enough here.
                Err(_) => _ = self.next_token(),
            }
        }
    }

    pub fn parse<N>(&mut self) -> Result<N, ParseError>
    where
        N: Parse,
    {
        N::parse(self)
    }
}

/// The AST node could not be parsed. The diagnostic describing why has
/// already been recorded by the time this is returned.
pub struct ParseError {
    pub span: Span,
}

impl ParseError {
    pub fn new(span: Span) -> Self {
        Self { span }
    }
}

pub trait Parse: Sized {
    fn parse(parser: &mut Parser<'_, impl TokenStream>) -> Result<Self, ParseError>;
}
