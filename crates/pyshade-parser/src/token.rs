//! Token types for the Python line/statement grammar.
//!
//! The pipeline only needs to understand line structure, `def` headers,
//! identifiers, and string literals. Everything else is carried through as
//! opaque operator/punctuation tokens and re-emitted verbatim.

use crate::span::Span;

/// A token with its kind and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Create a new token.
    #[inline]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier: `foo`, `_bar`. Also covers keywords the parser is not
    /// sensitive to (`if`, `return`, `lambda`, ...).
    Ident(String),
    /// Plain or raw string literal: decoded value plus the exact source
    /// spelling (prefix and quotes included).
    Str { value: String, raw: String },
    /// f-string literal, spelling kept verbatim. Never an encoding candidate.
    FStr(String),
    /// Bytes literal, spelling kept verbatim. Never an encoding candidate.
    Bytes(String),
    /// Numeric literal, spelling preserved (Python ints are unbounded).
    Number(String),

    // Keywords the parser dispatches on. All other keywords stay `Ident`.
    Def,
    Class,

    // Structural punctuation.
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }
    Comma,    // ,
    Colon,    // :
    Semicolon, // ;
    Dot,      // .
    /// Any other operator: `+`, `**`, `->`, `:=`, `<=`, `@`, ...
    Op(String),

    /// End of a logical line (only emitted outside brackets).
    Newline,
    /// Start of an indented block.
    Indent,
    /// End of an indented block.
    Dedent,
    Eof,
    /// Lexically invalid input (unterminated string, unbalanced brackets,
    /// inconsistent dedent, stray byte).
    Invalid,
}

impl TokenKind {
    /// The source text this token renders as. Layout tokens render empty.
    pub fn text(&self) -> &str {
        match self {
            TokenKind::Ident(s) => s,
            TokenKind::Str { raw, .. } => raw,
            TokenKind::FStr(raw) => raw,
            TokenKind::Bytes(raw) => raw,
            TokenKind::Number(raw) => raw,
            TokenKind::Def => "def",
            TokenKind::Class => "class",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Dot => ".",
            TokenKind::Op(s) => s,
            TokenKind::Newline
            | TokenKind::Indent
            | TokenKind::Dedent
            | TokenKind::Eof
            | TokenKind::Invalid => "",
        }
    }

    /// Check for a specific identifier spelling.
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(self, TokenKind::Ident(s) if s == name)
    }
}

/// Map an identifier spelling to a keyword token, if the parser cares.
pub fn keyword_from_str(name: &str) -> Option<TokenKind> {
    match name {
        "def" => Some(TokenKind::Def),
        "class" => Some(TokenKind::Class),
        _ => None,
    }
}

/// Keywords that open a suite (`<header>: <block>`). `def` is handled
/// structurally by the parser and is not in this set.
pub fn is_block_keyword(name: &str) -> bool {
    matches!(
        name,
        "if" | "elif" | "else" | "while" | "for" | "try" | "except" | "finally"
            | "with" | "match" | "case" | "async"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(keyword_from_str("def"), Some(TokenKind::Def));
        assert_eq!(keyword_from_str("class"), Some(TokenKind::Class));
        assert_eq!(keyword_from_str("return"), None);
        assert_eq!(keyword_from_str("lambda"), None);
    }

    #[test]
    fn test_block_keywords() {
        assert!(is_block_keyword("if"));
        assert!(is_block_keyword("except"));
        assert!(!is_block_keyword("def"));
        assert!(!is_block_keyword("return"));
    }

    #[test]
    fn test_token_text() {
        assert_eq!(TokenKind::Ident("foo".into()).text(), "foo");
        assert_eq!(
            TokenKind::Str { value: "hi".into(), raw: "'hi'".into() }.text(),
            "'hi'"
        );
        assert_eq!(TokenKind::Op("->".into()).text(), "->");
        assert_eq!(TokenKind::Newline.text(), "");
    }
}
