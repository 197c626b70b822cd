use bebop_foundation::source::{Span, Spanned};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Block comment. Line comments are trivia and never surface as tokens.
    Comment,

    Ident,

    Int,
    IntHex,
    Float,
    String,

    KEnum,
    KStruct,
    KMessage,
    KUnion,
    KConst,
    KReadonly,
    KMut,
    KImport,
    KTrue,
    KFalse,
    KInf,
    KNan,

    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    LeftParen,    // (
    RightParen,   // )
    Comma,        // ,
    Semi,         // ;
    Assign,       // =
    Pipe,         // |
    Question,     // ?
    Less,         // <
    Greater,      // >
    Arrow,        // ->
    Colon,        // :

    EndOfFile,
}

impl TokenKind {
    pub fn from_keyword(lexeme: &str) -> Option<TokenKind> {
        Some(match lexeme {
            "enum" => TokenKind::KEnum,
            "struct" => TokenKind::KStruct,
            "message" => TokenKind::KMessage,
            "union" => TokenKind::KUnion,
            "const" => TokenKind::KConst,
            "readonly" => TokenKind::KReadonly,
            "mut" => TokenKind::KMut,
            "import" => TokenKind::KImport,
            "true" => TokenKind::KTrue,
            "false" => TokenKind::KFalse,
            "inf" => TokenKind::KInf,
            "nan" => TokenKind::KNan,
            _ => return None,
        })
    }

    /// Human-readable name used in "x expected" diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Comment => "comment",
            TokenKind::Ident => "identifier",
            TokenKind::Int | TokenKind::IntHex => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::String => "string literal",
            TokenKind::KEnum => "`enum`",
            TokenKind::KStruct => "`struct`",
            TokenKind::KMessage => "`message`",
            TokenKind::KUnion => "`union`",
            TokenKind::KConst => "`const`",
            TokenKind::KReadonly => "`readonly`",
            TokenKind::KMut => "`mut`",
            TokenKind::KImport => "`import`",
            TokenKind::KTrue => "`true`",
            TokenKind::KFalse => "`false`",
            TokenKind::KInf => "`inf`",
            TokenKind::KNan => "`nan`",
            TokenKind::LeftBrace => "`{`",
            TokenKind::RightBrace => "`}`",
            TokenKind::LeftBracket => "`[`",
            TokenKind::RightBracket => "`]`",
            TokenKind::LeftParen => "`(`",
            TokenKind::RightParen => "`)`",
            TokenKind::Comma => "`,`",
            TokenKind::Semi => "`;`",
            TokenKind::Assign => "`=`",
            TokenKind::Pipe => "`|`",
            TokenKind::Question => "`?`",
            TokenKind::Less => "`<`",
            TokenKind::Greater => "`>`",
            TokenKind::Arrow => "`->`",
            TokenKind::Colon => "`:`",
            TokenKind::EndOfFile => "end of file",
        }
    }

    /// True for tokens that can begin a top-level definition. Used by error
    /// recovery to find a place to resume parsing.
    pub fn starts_definition(self) -> bool {
        matches!(
            self,
            TokenKind::KEnum
                | TokenKind::KStruct
                | TokenKind::KMessage
                | TokenKind::KUnion
                | TokenKind::KConst
                | TokenKind::KReadonly
                | TokenKind::KImport
                | TokenKind::LeftBracket
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Spanned for Token {
    fn span(&self) -> Span {
        self.span
    }
}

/// Strips `/*`..`*/` and per-line `*` decoration from a block comment,
/// producing the documentation text attached to the following definition.
pub fn clean_block_comment(raw: &str) -> String {
    let inner = raw
        .strip_prefix("/*")
        .unwrap_or(raw)
        .strip_suffix("*/")
        .unwrap_or(raw);
    let mut lines: Vec<&str> = inner
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').map(str::trim_start).unwrap_or(line)
        })
        .collect();
    while lines.first().is_some_and(|line| line.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_round_trip() {
        assert_eq!(TokenKind::from_keyword("enum"), Some(TokenKind::KEnum));
        assert_eq!(TokenKind::from_keyword("readonly"), Some(TokenKind::KReadonly));
        assert_eq!(TokenKind::from_keyword("Enum"), None);
        assert_eq!(TokenKind::from_keyword("enums"), None);
    }

    #[test]
    fn block_comment_cleanup() {
        assert_eq!(clean_block_comment("/* hello */"), "hello");
        assert_eq!(
            clean_block_comment("/**\n * first\n * second\n */"),
            "first\nsecond"
        );
        assert_eq!(clean_block_comment("/*\n\n  text\n\n*/"), "text");
    }
}
