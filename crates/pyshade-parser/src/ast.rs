//! AST node types for the statement-level Python tree.
//!
//! Design principle: the pipeline only distinguishes the constructs it
//! rewrites. Function definitions are modeled structurally (their name is
//! overwritten during renaming), other block statements keep their header as
//! a token sequence, and everything else is a single logical line of tokens
//! preserved verbatim. Identifier and string tokens inside those sequences
//! are the rename/encode targets.

use crate::span::Span;
use crate::token::Token;

/// The root AST for a parsed source file.
#[derive(Debug, Clone)]
pub struct Ast {
    /// All top-level statements.
    pub stmts: Vec<Stmt>,
}

impl Ast {
    /// Create a new AST.
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `def name(...):` (or `async def`). `tail` holds the tokens between
    /// the name and the suite colon: parameter list and optional
    /// `-> annotation`.
    FunctionDef {
        name: String,
        name_span: Span,
        is_async: bool,
        tail: Vec<Token>,
        body: Vec<Stmt>,
    },
    /// Any other suite-introducing statement (`if`, `for`, `while`, `try`,
    /// `with`, `class`, ...). `header` holds the tokens before the colon.
    Compound { header: Vec<Token>, body: Vec<Stmt> },
    /// One logical line, preserved as its token sequence.
    Simple(Vec<Token>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    #[test]
    fn test_simple_stmt_roundtrips_tokens() {
        let tokens = vec![
            Token::new(TokenKind::Ident("x".into()), Span::new(0, 1)),
            Token::new(TokenKind::Op("=".into()), Span::new(2, 3)),
            Token::new(TokenKind::Number("1".into()), Span::new(4, 5)),
        ];
        let stmt = Stmt::new(StmtKind::Simple(tokens.clone()), Span::new(0, 5));
        match stmt.kind {
            StmtKind::Simple(inner) => assert_eq!(inner, tokens),
            _ => panic!("expected simple statement"),
        }
    }
}
