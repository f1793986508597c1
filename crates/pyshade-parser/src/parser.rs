//! Parser for the statement-level Python grammar.
//!
//! The parser consumes logical lines from the lexer and builds the
//! statement tree. It only gives structure to what the pipeline rewrites:
//! `def` headers and suite nesting. Every other line is kept as an opaque
//! token sequence.

use crate::ast::{Ast, Stmt, StmtKind};
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{is_block_keyword, Token, TokenKind};

/// Parse error. This is the only way the pipeline fails: input text that is
/// not valid source in the target grammar.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}",
            self.message, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for ParseError {}

/// The parser.
pub struct Parser<'a> {
    /// The lexer.
    lexer: Lexer<'a>,
    /// Current token.
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self { lexer, current }
    }

    /// Parse the source into an AST.
    pub fn parse(mut self) -> Result<Ast, ParseError> {
        let stmts = self.parse_stmts()?;
        match self.current.kind {
            TokenKind::Eof => Ok(Ast::new(stmts)),
            TokenKind::Dedent => Err(ParseError::new("unexpected dedent", self.current.span)),
            _ => Err(ParseError::new("unexpected token", self.current.span)),
        }
    }

    /// Advance to the next token, returning the one we were on.
    fn bump(&mut self) -> Token {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.current, next)
    }

    fn lex_error(&self, span: Span) -> ParseError {
        let message = self.lexer.error_message().unwrap_or("invalid syntax");
        ParseError::new(message, span)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Parse statements until end of file or end of the enclosing block.
    fn parse_stmts(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = Vec::new();
        loop {
            match &self.current.kind {
                TokenKind::Eof | TokenKind::Dedent => return Ok(stmts),
                TokenKind::Indent => {
                    return Err(ParseError::new("unexpected indent", self.current.span))
                }
                TokenKind::Invalid => return Err(self.lex_error(self.current.span)),
                _ => stmts.push(self.parse_stmt()?),
            }
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current.span;
        if matches!(self.current.kind, TokenKind::Def) {
            self.bump();
            return self.parse_def(false, start);
        }
        if self.current.kind.is_ident("async") && matches!(self.lexer.peek().kind, TokenKind::Def) {
            self.bump(); // async
            self.bump(); // def
            return self.parse_def(true, start);
        }
        self.parse_line_stmt()
    }

    /// Parse a `def` statement. The `def` (and optional `async`) tokens have
    /// already been consumed.
    fn parse_def(&mut self, is_async: bool, start: Span) -> Result<Stmt, ParseError> {
        let tokens = self.read_line_tokens()?;

        let (name, name_span) = match tokens.first() {
            Some(Token {
                kind: TokenKind::Ident(name),
                span,
            }) => (name.clone(), *span),
            _ => {
                return Err(ParseError::new(
                    "expected function name after 'def'",
                    tokens.first().map_or(start, |t| t.span),
                ))
            }
        };

        if !matches!(tokens.get(1).map(|t| &t.kind), Some(TokenKind::LParen)) {
            return Err(ParseError::new(
                "expected '(' after function name",
                tokens.get(1).map_or(name_span, |t| t.span),
            ));
        }

        let colon = find_suite_colon(&tokens, 1).ok_or_else(|| {
            ParseError::new(
                "expected ':' in function definition",
                tokens.last().map_or(start, |t| t.span),
            )
        })?;

        let tail = tokens[1..colon].to_vec();
        let body = self.parse_suite(&tokens[colon + 1..], tokens[colon].span)?;
        let end = body.last().map_or(tokens[colon].span, |s| s.span);

        Ok(Stmt::new(
            StmtKind::FunctionDef {
                name,
                name_span,
                is_async,
                tail,
                body,
            },
            start.merge(end),
        ))
    }

    /// Parse any non-`def` logical line: a compound statement if it opens a
    /// suite, otherwise an opaque simple statement.
    fn parse_line_stmt(&mut self) -> Result<Stmt, ParseError> {
        let tokens = self.read_line_tokens()?;
        debug_assert!(!tokens.is_empty());
        let start = tokens.first().map_or(Span::default(), |t| t.span);

        let opens_suite = match &tokens[0].kind {
            TokenKind::Class => true,
            TokenKind::Ident(name) => is_block_keyword(name),
            _ => false,
        };

        if !opens_suite {
            let end = tokens.last().map_or(start, |t| t.span);
            return Ok(Stmt::new(StmtKind::Simple(tokens), start.merge(end)));
        }

        let Some(colon) = find_suite_colon(&tokens, 0) else {
            // `match` and `case` are soft keywords: `match = 1` is a plain
            // statement, not a truncated block.
            if matches!(&tokens[0].kind, TokenKind::Ident(n) if n == "match" || n == "case") {
                let end = tokens.last().map_or(start, |t| t.span);
                return Ok(Stmt::new(StmtKind::Simple(tokens), start.merge(end)));
            }
            return Err(ParseError::new(
                "expected ':'",
                tokens.last().map_or(start, |t| t.span),
            ));
        };

        let header = tokens[..colon].to_vec();
        let body = self.parse_suite(&tokens[colon + 1..], tokens[colon].span)?;
        let end = body.last().map_or(tokens[colon].span, |s| s.span);

        Ok(Stmt::new(
            StmtKind::Compound { header, body },
            start.merge(end),
        ))
    }

    /// Parse the suite following a block colon. `inline` holds any tokens
    /// that appeared on the same line after the colon.
    fn parse_suite(&mut self, inline: &[Token], colon_span: Span) -> Result<Vec<Stmt>, ParseError> {
        if !inline.is_empty() {
            // Inline suite: `if x: return`. Canonicalized to block form by
            // the serializer.
            let start = inline[0].span;
            let end = inline.last().map_or(start, |t| t.span);
            return Ok(vec![Stmt::new(
                StmtKind::Simple(inline.to_vec()),
                start.merge(end),
            )]);
        }

        if !matches!(self.current.kind, TokenKind::Indent) {
            return Err(ParseError::new("expected an indented block", colon_span));
        }
        self.bump(); // indent

        let body = self.parse_stmts()?;
        if matches!(self.current.kind, TokenKind::Dedent) {
            self.bump();
        }
        Ok(body)
    }

    /// Collect the remaining tokens of the current logical line, consuming
    /// the trailing newline.
    fn read_line_tokens(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            match &self.current.kind {
                TokenKind::Newline => {
                    self.bump();
                    return Ok(tokens);
                }
                TokenKind::Eof | TokenKind::Dedent => return Ok(tokens),
                TokenKind::Invalid => return Err(self.lex_error(self.current.span)),
                _ => tokens.push(self.bump()),
            }
        }
    }
}

/// Find the first colon at bracket depth zero, starting at `from`.
/// That colon introduces the statement's suite.
fn find_suite_colon(tokens: &[Token], from: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(from) {
        match token.kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                depth = depth.saturating_sub(1);
            }
            TokenKind::Colon if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Ast {
        Parser::new(source).parse().unwrap()
    }

    fn parse_err(source: &str) -> ParseError {
        Parser::new(source).parse().unwrap_err()
    }

    #[test]
    fn test_simple_statements() {
        let ast = parse("x = 1\ny = x + 2\n");
        assert_eq!(ast.stmts.len(), 2);
        assert!(matches!(ast.stmts[0].kind, StmtKind::Simple(_)));
    }

    #[test]
    fn test_function_def() {
        let ast = parse("def add(a, b):\n    return a + b\n");
        match &ast.stmts[0].kind {
            StmtKind::FunctionDef {
                name,
                is_async,
                tail,
                body,
                ..
            } => {
                assert_eq!(name, "add");
                assert!(!is_async);
                assert!(matches!(tail.first().map(|t| &t.kind), Some(TokenKind::LParen)));
                assert!(matches!(tail.last().map(|t| &t.kind), Some(TokenKind::RParen)));
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected function def, got {other:?}"),
        }
    }

    #[test]
    fn test_async_def() {
        let ast = parse("async def fetch(url):\n    pass\n");
        match &ast.stmts[0].kind {
            StmtKind::FunctionDef { name, is_async, .. } => {
                assert_eq!(name, "fetch");
                assert!(is_async);
            }
            other => panic!("expected function def, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_def() {
        let ast = parse("def outer():\n    def inner():\n        pass\n    return inner\n");
        match &ast.stmts[0].kind {
            StmtKind::FunctionDef { body, .. } => {
                assert!(matches!(body[0].kind, StmtKind::FunctionDef { .. }));
                assert_eq!(body.len(), 2);
            }
            other => panic!("expected function def, got {other:?}"),
        }
    }

    #[test]
    fn test_inline_suite() {
        let ast = parse("def f(): return 1\n");
        match &ast.stmts[0].kind {
            StmtKind::FunctionDef { body, .. } => {
                assert_eq!(body.len(), 1);
                assert!(matches!(body[0].kind, StmtKind::Simple(_)));
            }
            other => panic!("expected function def, got {other:?}"),
        }
    }

    #[test]
    fn test_compound_statements() {
        let ast = parse("if x:\n    a = 1\nelse:\n    a = 2\n");
        assert_eq!(ast.stmts.len(), 2);
        assert!(matches!(ast.stmts[0].kind, StmtKind::Compound { .. }));
        assert!(matches!(ast.stmts[1].kind, StmtKind::Compound { .. }));
    }

    #[test]
    fn test_class_def_is_compound() {
        let ast = parse("class Foo(Base):\n    def method(self):\n        pass\n");
        match &ast.stmts[0].kind {
            StmtKind::Compound { header, body } => {
                assert!(matches!(header[0].kind, TokenKind::Class));
                assert!(matches!(body[0].kind, StmtKind::FunctionDef { .. }));
            }
            other => panic!("expected compound, got {other:?}"),
        }
    }

    #[test]
    fn test_decorator_line_is_simple() {
        let ast = parse("@wraps(fn)\ndef g():\n    pass\n");
        assert!(matches!(ast.stmts[0].kind, StmtKind::Simple(_)));
        assert!(matches!(ast.stmts[1].kind, StmtKind::FunctionDef { .. }));
    }

    #[test]
    fn test_dict_colon_is_not_a_suite() {
        let ast = parse("d = {1: 2, 3: 4}\n");
        assert!(matches!(ast.stmts[0].kind, StmtKind::Simple(_)));
    }

    #[test]
    fn test_match_as_plain_assignment() {
        let ast = parse("match = re.match(p, s)\n");
        assert!(matches!(ast.stmts[0].kind, StmtKind::Simple(_)));
    }

    #[test]
    fn test_missing_colon() {
        let err = parse_err("if x\n    pass\n");
        assert!(err.message.contains("':'"));
    }

    #[test]
    fn test_missing_block() {
        let err = parse_err("def f():\nx = 1\n");
        assert!(err.message.contains("indented block"));
    }

    #[test]
    fn test_bad_def_header() {
        let err = parse_err("def :\n    pass\n");
        assert!(err.message.contains("function name"));

        let err = parse_err("def f:\n    pass\n");
        assert!(err.message.contains("'('"));
    }

    #[test]
    fn test_unbalanced_brackets() {
        assert!(Parser::new("f(1, 2\n").parse().is_err());
        assert!(Parser::new("x = )\n").parse().is_err());
    }

    #[test]
    fn test_top_level_indent() {
        let err = parse_err("    x = 1\n");
        assert!(err.message.contains("indent"));
    }

    #[test]
    fn test_unterminated_string() {
        let err = parse_err("s = 'oops\n");
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn test_no_trailing_newline() {
        let ast = parse("def f():\n    return 1");
        assert!(matches!(ast.stmts[0].kind, StmtKind::FunctionDef { .. }));
    }
}
