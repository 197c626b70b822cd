use bebop_foundation::{
    errors::{Diagnostic, Label, ReplacementSuggestion},
    source::{SourceFileId, Span},
};

use crate::lexis::{
    token::{Token, TokenKind},
    LexError, TokenStream,
};

pub struct Lexer<'a> {
    pub file: SourceFileId,
    pub input: &'a str,
    pub position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(file: SourceFileId, input: &'a str) -> Self {
        Self {
            file,
            input,
            position: 0,
        }
    }

    pub fn current_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn next_char(&self) -> Option<char> {
        self.input[self.position..].chars().nth(1)
    }

    pub fn advance_char(&mut self) {
        if let Some(char) = self.current_char() {
            self.position += char.len_utf8();
        }
    }

    fn span(&self, start: usize) -> Span {
        Span {
            start,
            end: self.position,
        }
    }

    fn span_with_len(&self, start: usize, len: usize) -> Span {
        let len = self.input[start..]
            .char_indices()
            .skip(len)
            .map(|(index, _)| index)
            .next()
            .unwrap_or(self.input.len() - start);
        Span {
            start,
            end: start + len,
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.current_char() {
                Some(' ' | '\t' | '\r' | '\n') => self.advance_char(),
                // Line comments are trivia; block comments become tokens so
                // that documentation can be attached to definitions.
                Some('/') if self.next_char() == Some('/') => {
                    while !matches!(self.current_char(), None | Some('\r' | '\n')) {
                        self.advance_char();
                    }
                }
                _ => break,
            }
        }
    }

    fn block_comment(&mut self, start: usize) -> Result<TokenKind, LexError> {
        self.advance_char();
        self.advance_char();
        let mut nesting = 1;
        while nesting > 0 {
            match self.current_char() {
                Some('*') => {
                    self.advance_char();
                    if self.current_char() == Some('/') {
                        nesting -= 1;
                        self.advance_char();
                    }
                }
                Some('/') => {
                    self.advance_char();
                    if self.current_char() == Some('*') {
                        nesting += 1;
                        self.advance_char();
                    }
                }
                None => {
                    return Err(LexError::new(
                        self.span(start),
                        Diagnostic::error(
                            self.file,
                            "block comment does not have a matching `*/` terminator",
                        )
                        .with_code("unterminated-block-comment")
                        .with_label(Label::primary(
                            self.span_with_len(start, 2),
                            "the comment starts here",
                        )),
                    ))
                }
                _ => self.advance_char(),
            }
        }
        Ok(TokenKind::Comment)
    }

    fn identifier_or_keyword(&mut self, start: usize) -> TokenKind {
        while let Some('a'..='z' | 'A'..='Z' | '0'..='9' | '_') = self.current_char() {
            self.advance_char();
        }
        TokenKind::from_keyword(&self.input[start..self.position]).unwrap_or(TokenKind::Ident)
    }

    fn decimal_number(&mut self) -> TokenKind {
        while let Some('0'..='9') = self.current_char() {
            self.advance_char();
        }
        if self.current_char() == Some('.') {
            self.advance_char();
            while let Some('0'..='9') = self.current_char() {
                self.advance_char();
            }
            TokenKind::Float
        } else {
            TokenKind::Int
        }
    }

    fn number(&mut self, start: usize) -> Result<TokenKind, LexError> {
        let kind = if self.current_char() == Some('0') && matches!(self.next_char(), Some('x' | 'X'))
        {
            self.advance_char();
            self.advance_char();
            let digits_start = self.position;
            while let Some('0'..='9' | 'A'..='F' | 'a'..='f') = self.current_char() {
                self.advance_char();
            }
            if self.position == digits_start {
                return Err(LexError::new(
                    self.span(start),
                    Diagnostic::error(self.file, "hexadecimal literal has no digits")
                        .with_label(Label::primary(self.span(start), "digits expected after `0x`")),
                ));
            }
            TokenKind::IntHex
        } else {
            self.decimal_number()
        };

        if let Some('A'..='Z' | 'a'..='z' | '_') = self.current_char() {
            let ident_start = self.position;
            self.identifier_or_keyword(ident_start);
            let ident_end = self.position;
            return Err(LexError::new(
                self.span(start),
                Diagnostic::error(
                    self.file,
                    "number literal must not be immediately followed by an identifier",
                )
                .with_label(Label::secondary(
                    Span {
                        start,
                        end: ident_start,
                    },
                    "number literal occurs here...",
                ))
                .with_label(Label::primary(
                    Span {
                        start: ident_start,
                        end: ident_end,
                    },
                    "...and is immediately followed by an identifier",
                ))
                .with_note((
                    "help: add a space between the number and the identifier",
                    ReplacementSuggestion {
                        span: Span {
                            start,
                            end: ident_end,
                        },
                        replacement: format!(
                            "{} {}",
                            &self.input[start..ident_start],
                            &self.input[ident_start..ident_end]
                        ),
                    },
                )),
            ));
        }

        Ok(kind)
    }

    fn keyword_follows(&self, word: &str) -> bool {
        let rest = &self.input[self.position..];
        rest.starts_with(word)
            && !matches!(
                rest[word.len()..].chars().next(),
                Some('a'..='z' | 'A'..='Z' | '0'..='9' | '_')
            )
    }

    /// `-` is never a token of its own: it introduces `->`, a negative number
    /// literal, or `-inf`.
    fn minus(&mut self, start: usize) -> Result<TokenKind, LexError> {
        self.advance_char();
        match self.current_char() {
            Some('>') => {
                self.advance_char();
                Ok(TokenKind::Arrow)
            }
            Some('0'..='9') => self.number(start),
            Some('i') if self.keyword_follows("inf") => {
                self.position += "inf".len();
                Ok(TokenKind::Float)
            }
            _ => Err(LexError::new(
                self.span(start),
                Diagnostic::error(self.file, "number literal or `->` expected after `-`")
                    .with_label(Label::primary(
                        self.span(start),
                        "this `-` does not begin a literal",
                    )),
            )),
        }
    }

    /// Quotes escape themselves by doubling (`''` inside a single-quoted
    /// string, `""` inside a double-quoted one). Backslash is an ordinary
    /// character and newlines are allowed.
    fn string(&mut self, start: usize, quote: char) -> Result<TokenKind, LexError> {
        self.advance_char();
        loop {
            match self.current_char() {
                None => {
                    return Err(LexError::new(
                        self.span(start),
                        Diagnostic::error(
                            self.file,
                            format!("string literal does not have a closing quote `{quote}`"),
                        )
                        .with_code("unterminated-string")
                        .with_label(Label::primary(
                            self.span_with_len(start, 1),
                            "the string starts here",
                        )),
                    ))
                }
                Some(c) if c == quote => {
                    self.advance_char();
                    if self.current_char() == Some(quote) {
                        self.advance_char();
                    } else {
                        return Ok(TokenKind::String);
                    }
                }
                _ => self.advance_char(),
            }
        }
    }

    fn single_char_token(&mut self, kind: TokenKind) -> TokenKind {
        self.advance_char();
        kind
    }

    pub fn next_token_include_comments(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();

        let start = self.position;

        let kind = if let Some(char) = self.current_char() {
            match char {
                '/' if self.next_char() == Some('*') => self.block_comment(start)?,
                'a'..='z' | 'A'..='Z' | '_' => self.identifier_or_keyword(start),
                '0'..='9' => self.number(start)?,
                '-' => self.minus(start)?,
                '\'' | '"' => self.string(start, char)?,
                '{' => self.single_char_token(TokenKind::LeftBrace),
                '}' => self.single_char_token(TokenKind::RightBrace),
                '[' => self.single_char_token(TokenKind::LeftBracket),
                ']' => self.single_char_token(TokenKind::RightBracket),
                '(' => self.single_char_token(TokenKind::LeftParen),
                ')' => self.single_char_token(TokenKind::RightParen),
                ',' => self.single_char_token(TokenKind::Comma),
                ';' => self.single_char_token(TokenKind::Semi),
                '=' => self.single_char_token(TokenKind::Assign),
                '|' => self.single_char_token(TokenKind::Pipe),
                '?' => self.single_char_token(TokenKind::Question),
                '<' => self.single_char_token(TokenKind::Less),
                '>' => self.single_char_token(TokenKind::Greater),
                ':' => self.single_char_token(TokenKind::Colon),
                unknown => {
                    self.advance_char();
                    return Err(LexError::new(
                        self.span(start),
                        Diagnostic::error(self.file, format!("unrecognized character: {unknown:?}"))
                            .with_code("unrecognized-character")
                            .with_label(Label::primary(
                                self.span(start),
                                "this character is not valid syntax",
                            )),
                    ));
                }
            }
        } else {
            TokenKind::EndOfFile
        };

        Ok(Token {
            kind,
            span: self.span(start),
        })
    }
}

impl TokenStream for Lexer<'_> {
    type Position = usize;

    fn position(&self) -> usize {
        self.position
    }

    fn seek(&mut self, to: usize) {
        self.position = to;
    }

    fn next_include_comments(&mut self) -> Result<Token, LexError> {
        self.next_token_include_comments()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn lex(input: &str) -> Vec<(TokenKind, Span)> {
        let mut lexer = Lexer::new(test_file(), input);
        let mut tokens = vec![];
        loop {
            let token = lexer.next_token_include_comments().expect("lex error");
            let done = token.kind == TokenKind::EndOfFile;
            tokens.push((token.kind, token.span));
            if done {
                break;
            }
        }
        tokens
    }

    fn test_file() -> SourceFileId {
        use bebop_foundation::source::{SourceFile, SourceFileSet};
        let mut set = SourceFileSet::new();
        set.add(SourceFile::new(
            "test.bop".into(),
            "test.bop".into(),
            String::new(),
        ))
    }

    fn span(range: std::ops::Range<usize>) -> Span {
        Span::from(range)
    }

    #[test]
    fn symbols_and_spans() {
        use TokenKind::*;
        assert_eq!(
            lex("{}[](),;=|?<>:"),
            vec![
                (LeftBrace, span(0..1)),
                (RightBrace, span(1..2)),
                (LeftBracket, span(2..3)),
                (RightBracket, span(3..4)),
                (LeftParen, span(4..5)),
                (RightParen, span(5..6)),
                (Comma, span(6..7)),
                (Semi, span(7..8)),
                (Assign, span(8..9)),
                (Pipe, span(9..10)),
                (Question, span(10..11)),
                (Less, span(11..12)),
                (Greater, span(12..13)),
                (Colon, span(13..14)),
                (EndOfFile, span(14..14)),
            ]
        );
    }

    #[test]
    fn keywords_vs_identifiers() {
        use TokenKind::*;
        assert_eq!(
            lex("enum struct Point readonly mut int32"),
            vec![
                (KEnum, span(0..4)),
                (KStruct, span(5..11)),
                (Ident, span(12..17)),
                (KReadonly, span(18..26)),
                (KMut, span(27..30)),
                (Ident, span(31..36)),
                (EndOfFile, span(36..36)),
            ]
        );
    }

    #[test]
    fn numbers() {
        use TokenKind::*;
        assert_eq!(
            lex("0 42 -7 0xFF 3.25 -0.5 -inf"),
            vec![
                (Int, span(0..1)),
                (Int, span(2..4)),
                (Int, span(5..7)),
                (IntHex, span(8..12)),
                (Float, span(13..17)),
                (Float, span(18..22)),
                (Float, span(23..27)),
                (EndOfFile, span(27..27)),
            ]
        );
    }

    #[test]
    fn arrow_is_one_token() {
        use TokenKind::*;
        assert_eq!(
            lex("1 -> x"),
            vec![
                (Int, span(0..1)),
                (Arrow, span(2..4)),
                (Ident, span(5..6)),
                (EndOfFile, span(6..6)),
            ]
        );
    }

    #[test]
    fn strings_with_doubled_quotes() {
        use TokenKind::*;
        assert_eq!(
            lex(r#""hello" 'wor''ld' "he said ""hi""""#),
            vec![
                (String, span(0..7)),
                (String, span(8..17)),
                (String, span(18..34)),
                (EndOfFile, span(34..34)),
            ]
        );
    }

    #[test]
    fn string_may_contain_newlines_and_backslashes() {
        use TokenKind::*;
        assert_eq!(
            lex("\"a\\nb\nc\""),
            vec![(String, span(0..8)), (EndOfFile, span(8..8))]
        );
    }

    #[test]
    fn comments() {
        use TokenKind::*;
        assert_eq!(
            lex("// trivia\n/* doc */ x /* outer /* nested */ still */"),
            vec![
                (Comment, span(10..19)),
                (Ident, span(20..21)),
                (Comment, span(22..52)),
                (EndOfFile, span(52..52)),
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut lexer = Lexer::new(test_file(), "\"oops");
        assert!(lexer.next_token_include_comments().is_err());
    }

    #[test]
    fn unterminated_block_comment_is_an_error() {
        let mut lexer = Lexer::new(test_file(), "/* oops");
        assert!(lexer.next_token_include_comments().is_err());
    }

    #[test]
    fn number_glued_to_identifier_is_an_error() {
        let mut lexer = Lexer::new(test_file(), "123abc");
        assert!(lexer.next_token_include_comments().is_err());
    }
}
