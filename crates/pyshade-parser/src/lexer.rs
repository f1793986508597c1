//! Lexer (tokenizer) for Python source.
//!
//! The lexer is called on-demand by the parser, not upfront. It understands
//! Python's line structure: comments, blank lines, backslash continuations,
//! implicit line joining inside brackets, and indentation. Block structure is
//! surfaced as `Newline`/`Indent`/`Dedent` tokens, like CPython's tokenizer.

use crate::span::Span;
use crate::token::{keyword_from_str, Token, TokenKind};

/// The lexer state.
#[derive(Clone)]
pub struct Lexer<'a> {
    /// Source code as bytes (for fast indexing).
    source: &'a [u8],
    /// Current byte position.
    pos: usize,
    /// Start position of the current token.
    token_start: usize,
    /// Open bracket stack. Newlines are insignificant while non-empty.
    brackets: Vec<u8>,
    /// Indentation stack, in columns. Always starts with 0.
    indents: Vec<usize>,
    /// Dedents still owed to the caller.
    pending_dedents: usize,
    /// Whether the next token begins a fresh logical line.
    at_line_start: bool,
    /// Why the last `Invalid` token was produced.
    last_error: Option<&'static str>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            token_start: 0,
            brackets: Vec::new(),
            indents: vec![0],
            pending_dedents: 0,
            at_line_start: true,
            last_error: None,
        }
    }

    /// Get the current byte position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Explanation for the most recent `Invalid` token.
    pub fn error_message(&self) -> Option<&'static str> {
        self.last_error
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token {
        if self.pending_dedents > 0 {
            self.pending_dedents -= 1;
            return Token::new(TokenKind::Dedent, Span::empty(self.pos as u32));
        }

        if self.at_line_start && self.brackets.is_empty() {
            if let Some(token) = self.handle_line_start() {
                return token;
            }
        }

        self.skip_inline_trivia();
        self.token_start = self.pos;

        if self.is_eof() {
            return self.finish_file();
        }

        let ch = self.current();

        // Logical line end (only significant outside brackets).
        if ch == b'\n' || ch == b'\r' {
            self.consume_newline();
            self.at_line_start = true;
            return self.make_token(TokenKind::Newline);
        }

        let kind = match ch {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(),
            // Non-ASCII identifier characters are carried through opaquely.
            0x80.. => self.scan_identifier(),

            b'0'..=b'9' => self.scan_number(),

            b'"' | b'\'' => self.scan_string(""),

            b'(' | b'[' | b'{' => self.scan_open_bracket(ch),
            b')' | b']' | b'}' => self.scan_close_bracket(ch),

            b',' => { self.advance(); TokenKind::Comma }
            b';' => { self.advance(); TokenKind::Semicolon }
            b'.' => self.scan_dot(),
            b':' => self.scan_colon(),

            _ => self.scan_operator(),
        };

        self.make_token(kind)
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&mut self) -> Token {
        let saved = self.clone();
        let token = self.next_token();
        *self = saved;
        token
    }

    // === Helper methods ===

    fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn current(&self) -> u8 {
        self.source.get(self.pos).copied().unwrap_or(0)
    }

    fn peek_char(&self) -> u8 {
        self.source.get(self.pos + 1).copied().unwrap_or(0)
    }

    fn peek_char_n(&self, n: usize) -> u8 {
        self.source.get(self.pos + n).copied().unwrap_or(0)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, Span::new(self.token_start as u32, self.pos as u32))
    }

    fn invalid(&mut self, message: &'static str) -> TokenKind {
        self.last_error = Some(message);
        TokenKind::Invalid
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        // SAFETY: token boundaries always fall on UTF-8 char boundaries
        unsafe { std::str::from_utf8_unchecked(&self.source[start..end]) }
    }

    fn token_slice(&self) -> &'a str {
        self.slice(self.token_start, self.pos)
    }

    // === Line structure ===

    /// At the start of a logical line: skip blank/comment lines, measure the
    /// indentation of the first real line, and emit `Indent`/`Dedent` tokens
    /// against the indent stack. Returns `None` when the line continues at
    /// the current indentation level.
    fn handle_line_start(&mut self) -> Option<Token> {
        let column = loop {
            let line_start = self.pos;
            let column = self.measure_indent();
            match self.current() {
                // Blank or comment-only line: not a logical line at all.
                b'#' => {
                    self.skip_comment();
                    self.consume_newline();
                }
                b'\n' | b'\r' => {
                    self.consume_newline();
                }
                0 if self.is_eof() => {
                    self.pos = line_start;
                    self.at_line_start = false;
                    return Some(self.finish_file());
                }
                _ => break column,
            }
        };

        self.at_line_start = false;
        let top = *self.indents.last().unwrap_or(&0);

        if column > top {
            self.indents.push(column);
            self.token_start = self.pos;
            return Some(Token::new(TokenKind::Indent, Span::empty(self.pos as u32)));
        }

        if column < top {
            let mut dedents = 0;
            while self.indents.len() > 1 && *self.indents.last().unwrap() > column {
                self.indents.pop();
                dedents += 1;
            }
            if *self.indents.last().unwrap() != column {
                self.token_start = self.pos;
                let kind = self.invalid("unindent does not match any outer indentation level");
                return Some(self.make_token(kind));
            }
            self.pending_dedents = dedents - 1;
            return Some(Token::new(TokenKind::Dedent, Span::empty(self.pos as u32)));
        }

        None
    }

    /// Consume leading whitespace and return the column it reaches.
    /// Tabs advance to the next multiple of 8, matching CPython's default.
    fn measure_indent(&mut self) -> usize {
        let mut column = 0;
        loop {
            match self.current() {
                b' ' => {
                    column += 1;
                    self.advance();
                }
                b'\t' => {
                    column = (column / 8 + 1) * 8;
                    self.advance();
                }
                b'\x0c' => {
                    // Form feed resets the column count, as in CPython.
                    column = 0;
                    self.advance();
                }
                _ => break,
            }
        }
        column
    }

    fn consume_newline(&mut self) {
        if self.current() == b'\r' {
            self.advance();
        }
        if self.current() == b'\n' {
            self.advance();
        }
    }

    /// Skip spaces, comments, explicit `\` continuations, and (inside
    /// brackets) newlines.
    fn skip_inline_trivia(&mut self) {
        loop {
            match self.current() {
                b' ' | b'\t' | b'\x0c' => self.advance(),
                b'#' => self.skip_comment(),
                b'\\' if self.peek_char() == b'\n' || self.peek_char() == b'\r' => {
                    self.advance();
                    self.consume_newline();
                }
                b'\n' | b'\r' if !self.brackets.is_empty() => {
                    self.consume_newline();
                }
                _ => break,
            }
        }
    }

    fn skip_comment(&mut self) {
        while !self.is_eof() && self.current() != b'\n' && self.current() != b'\r' {
            self.advance();
        }
    }

    /// Produce the end-of-file token sequence: close open blocks, then `Eof`.
    fn finish_file(&mut self) -> Token {
        self.token_start = self.pos;
        if !self.brackets.is_empty() {
            self.brackets.clear();
            let kind = self.invalid("unexpected end of file inside brackets");
            return self.make_token(kind);
        }
        if self.indents.len() > 1 {
            self.pending_dedents = self.indents.len() - 2;
            self.indents.truncate(1);
            return Token::new(TokenKind::Dedent, Span::empty(self.pos as u32));
        }
        self.make_token(TokenKind::Eof)
    }

    // === Brackets ===

    fn scan_open_bracket(&mut self, ch: u8) -> TokenKind {
        self.advance();
        self.brackets.push(ch);
        match ch {
            b'(' => TokenKind::LParen,
            b'[' => TokenKind::LBracket,
            _ => TokenKind::LBrace,
        }
    }

    fn scan_close_bracket(&mut self, ch: u8) -> TokenKind {
        self.advance();
        let expected = match ch {
            b')' => b'(',
            b']' => b'[',
            _ => b'{',
        };
        match self.brackets.pop() {
            Some(open) if open == expected => match ch {
                b')' => TokenKind::RParen,
                b']' => TokenKind::RBracket,
                _ => TokenKind::RBrace,
            },
            _ => self.invalid("unmatched closing bracket"),
        }
    }

    // === Identifiers and keywords ===

    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while matches!(self.current(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | 0x80..) {
            self.advance();
        }
        let word = self.slice(start, self.pos);

        // A short identifier directly followed by a quote is a string prefix
        // (`r"..."`, `b'...'`, `f"..."`, `rb"..."`).
        if (self.current() == b'"' || self.current() == b'\'') && is_string_prefix(word) {
            return self.scan_string(word);
        }

        if let Some(keyword) = keyword_from_str(word) {
            return keyword;
        }
        TokenKind::Ident(word.to_string())
    }

    // === Numbers ===

    fn scan_number(&mut self) -> TokenKind {
        let start = self.pos;

        if self.current() == b'0' && matches!(self.peek_char(), b'x' | b'X' | b'o' | b'O' | b'b' | b'B') {
            self.advance_n(2);
            while self.current().is_ascii_alphanumeric() || self.current() == b'_' {
                self.advance();
            }
            return TokenKind::Number(self.slice(start, self.pos).to_string());
        }

        self.scan_digits();
        if self.current() == b'.' && self.peek_char().is_ascii_digit() {
            self.advance();
            self.scan_digits();
        }
        if matches!(self.current(), b'e' | b'E')
            && (self.peek_char().is_ascii_digit()
                || (matches!(self.peek_char(), b'+' | b'-') && self.peek_char_n(2).is_ascii_digit()))
        {
            self.advance();
            if matches!(self.current(), b'+' | b'-') {
                self.advance();
            }
            self.scan_digits();
        }
        if matches!(self.current(), b'j' | b'J') {
            self.advance();
        }

        TokenKind::Number(self.slice(start, self.pos).to_string())
    }

    fn scan_digits(&mut self) {
        while self.current().is_ascii_digit() || self.current() == b'_' {
            self.advance();
        }
    }

    // === Strings ===

    /// Scan a string literal. `prefix` is the already-consumed prefix letters
    /// (empty for a plain string); `token_start` still points at the prefix.
    fn scan_string(&mut self, prefix: &str) -> TokenKind {
        let quote = self.current();
        let triple = self.peek_char() == quote && self.peek_char_n(2) == quote;
        self.advance_n(if triple { 3 } else { 1 });

        let body_start = self.pos;
        let raw_mode = prefix.bytes().any(|b| matches!(b, b'r' | b'R'));
        let is_bytes = prefix.bytes().any(|b| matches!(b, b'b' | b'B'));
        let is_fstring = prefix.bytes().any(|b| matches!(b, b'f' | b'F'));

        loop {
            if self.is_eof() {
                return self.invalid("unterminated string literal");
            }
            let ch = self.current();
            if ch == quote {
                if !triple {
                    break;
                }
                if self.peek_char() == quote && self.peek_char_n(2) == quote {
                    break;
                }
                self.advance();
            } else if ch == b'\\' {
                // A backslash escapes the next character even in raw mode
                // (it stays in the value, but does not terminate the string).
                self.advance();
                if self.current() == b'\r' || self.current() == b'\n' {
                    self.consume_newline();
                } else if !self.is_eof() {
                    self.advance();
                }
            } else if (ch == b'\n' || ch == b'\r') && !triple {
                return self.invalid("unterminated string literal");
            } else {
                self.advance();
            }
        }

        let body_end = self.pos;
        self.advance_n(if triple { 3 } else { 1 });
        let raw = self.token_slice().to_string();

        if is_bytes {
            return TokenKind::Bytes(raw);
        }
        if is_fstring {
            return TokenKind::FStr(raw);
        }

        let body = self.slice(body_start, body_end);
        let value = if raw_mode {
            body.to_string()
        } else {
            unescape(body)
        };
        TokenKind::Str { value, raw }
    }

    // === Punctuation and operators ===

    fn scan_dot(&mut self) -> TokenKind {
        if self.peek_char().is_ascii_digit() {
            return self.scan_number_from_dot();
        }
        self.advance();
        TokenKind::Dot
    }

    fn scan_number_from_dot(&mut self) -> TokenKind {
        let start = self.pos;
        self.advance(); // .
        self.scan_digits();
        if matches!(self.current(), b'e' | b'E') {
            self.advance();
            if matches!(self.current(), b'+' | b'-') {
                self.advance();
            }
            self.scan_digits();
        }
        if matches!(self.current(), b'j' | b'J') {
            self.advance();
        }
        TokenKind::Number(self.slice(start, self.pos).to_string())
    }

    fn scan_colon(&mut self) -> TokenKind {
        self.advance();
        if self.current() == b'=' {
            self.advance();
            return TokenKind::Op(":=".to_string());
        }
        TokenKind::Colon
    }

    fn scan_operator(&mut self) -> TokenKind {
        const THREE: &[&str] = &["**=", "//=", ">>=", "<<="];
        const TWO: &[&str] = &[
            "**", "//", ">>", "<<", "<=", ">=", "==", "!=", "->", "+=", "-=",
            "*=", "/=", "%=", "@=", "&=", "|=", "^=",
        ];
        const ONE: &[u8] = b"+-*/%@&|^~<>=";

        let rest = &self.source[self.pos..];
        for op in THREE {
            if rest.starts_with(op.as_bytes()) {
                self.advance_n(3);
                return TokenKind::Op((*op).to_string());
            }
        }
        for op in TWO {
            if rest.starts_with(op.as_bytes()) {
                self.advance_n(2);
                return TokenKind::Op((*op).to_string());
            }
        }
        if ONE.contains(&self.current()) {
            let op = (self.current() as char).to_string();
            self.advance();
            return TokenKind::Op(op);
        }

        self.advance();
        self.invalid("invalid character")
    }
}

/// Check whether an identifier spelling is a valid string-literal prefix.
fn is_string_prefix(word: &str) -> bool {
    matches!(
        word.to_ascii_lowercase().as_str(),
        "r" | "b" | "f" | "u" | "rb" | "br" | "rf" | "fr"
    )
}

/// Decode backslash escapes in a (non-raw) string literal body.
/// Unrecognized escapes keep the backslash, matching CPython. `\N{...}`
/// named escapes are not looked up and stay verbatim.
fn unescape(body: &str) -> String {
    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            value.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('r') => value.push('\r'),
            Some('t') => value.push('\t'),
            Some('\\') => value.push('\\'),
            Some('\'') => value.push('\''),
            Some('"') => value.push('"'),
            // Octal escape: one to three octal digits, max 0o777.
            Some(c @ '0'..='7') => {
                let mut code = c as u32 - '0' as u32;
                for _ in 0..2 {
                    let mut lookahead = chars.clone();
                    match lookahead.next() {
                        Some(d @ '0'..='7') => {
                            code = code * 8 + (d as u32 - '0' as u32);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                if let Some(ch) = char::from_u32(code) {
                    value.push(ch);
                }
            }
            Some('a') => value.push('\x07'),
            Some('b') => value.push('\x08'),
            Some('f') => value.push('\x0c'),
            Some('v') => value.push('\x0b'),
            Some('\n') => {} // line continuation inside the literal
            Some('\r') => {
                // CRLF line continuation: swallow the LF half too.
                let mut lookahead = chars.clone();
                if lookahead.next() == Some('\n') {
                    chars.next();
                }
            }
            Some('x') => push_hex_escape(&mut value, &mut chars, 2, 'x'),
            Some('u') => push_hex_escape(&mut value, &mut chars, 4, 'u'),
            Some('U') => push_hex_escape(&mut value, &mut chars, 8, 'U'),
            Some(other) => {
                value.push('\\');
                value.push(other);
            }
            None => value.push('\\'),
        }
    }
    value
}

fn push_hex_escape(value: &mut String, chars: &mut std::str::Chars<'_>, len: usize, marker: char) {
    let mut digits = String::new();
    let mut lookahead = chars.clone();
    for _ in 0..len {
        match lookahead.next() {
            Some(c) if c.is_ascii_hexdigit() => digits.push(c),
            _ => break,
        }
    }
    if digits.len() == len {
        if let Some(c) = u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
            for _ in 0..len {
                chars.next();
            }
            value.push(c);
            return;
        }
    }
    // Malformed escape: keep it verbatim.
    value.push('\\');
    value.push(marker);
}
