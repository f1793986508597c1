//! Python code generator.
//!
//! Converts the statement tree back to source text. Output is a canonical
//! re-rendering: 4-space indentation, single-space token joining with
//! punctuation-aware suppression, inline suites expanded to block form.
//! Comments and original whitespace are not preserved.

use crate::ast::{Ast, Stmt, StmtKind};
use crate::token::{Token, TokenKind};

/// Code generation options.
#[derive(Debug, Clone, Default)]
pub struct CodegenOptions {
    /// Indent string (default: four spaces).
    pub indent: Option<String>,
}

/// The code generator.
pub struct Codegen<'a> {
    /// The AST to generate code from.
    ast: &'a Ast,
    /// Output buffer.
    output: String,
    /// Current indentation level.
    indent_level: usize,
    /// Indent string.
    indent_str: String,
}

impl<'a> Codegen<'a> {
    /// Create a new code generator.
    pub fn new(ast: &'a Ast, options: CodegenOptions) -> Self {
        let indent_str = options.indent.unwrap_or_else(|| "    ".to_string());
        Self {
            ast,
            output: String::new(),
            indent_level: 0,
            indent_str,
        }
    }

    /// Generate Python source code. Deterministic for a given tree.
    pub fn generate(mut self) -> String {
        for stmt in &self.ast.stmts {
            self.emit_stmt(stmt);
        }
        self.output
    }

    // =========================================================================
    // Output Helpers
    // =========================================================================

    fn emit_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.output.push_str(&self.indent_str);
        }
    }

    fn emit_newline(&mut self) {
        self.output.push('\n');
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    // =========================================================================
    // Statement Emission
    // =========================================================================

    fn emit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::FunctionDef {
                name,
                is_async,
                tail,
                body,
                ..
            } => {
                self.emit_indent();
                if *is_async {
                    self.output.push_str("async ");
                }
                self.output.push_str("def ");
                self.output.push_str(name);
                self.render_tokens(tail);
                self.output.push(':');
                self.emit_newline();
                self.emit_block(body);
            }
            StmtKind::Compound { header, body } => {
                self.emit_indent();
                self.render_tokens(header);
                self.output.push(':');
                self.emit_newline();
                self.emit_block(body);
            }
            StmtKind::Simple(tokens) => {
                self.emit_indent();
                self.render_tokens(tokens);
                self.emit_newline();
            }
        }
    }

    fn emit_block(&mut self, body: &[Stmt]) {
        self.indent();
        if body.is_empty() {
            // Only reachable for hand-built trees; keep the output parseable.
            self.emit_indent();
            self.output.push_str("pass");
            self.emit_newline();
        }
        for stmt in body {
            self.emit_stmt(stmt);
        }
        self.dedent();
    }

    // =========================================================================
    // Token Rendering
    // =========================================================================

    /// Render a token sequence with canonical spacing.
    fn render_tokens(&mut self, tokens: &[Token]) {
        let mut brackets: Vec<&TokenKind> = Vec::new();
        let mut prev: Option<&TokenKind> = None;
        let mut tight = false;

        for token in tokens {
            let kind = &token.kind;
            if prev.is_some() && !tight && needs_space_before(prev, kind, &brackets) {
                self.output.push(' ');
            }
            self.output.push_str(kind.text());

            match kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                    brackets.push(kind);
                }
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    brackets.pop();
                }
                _ => {}
            }

            tight = glues_to_next(kind, prev, &brackets);
            prev = Some(kind);
        }
    }
}

/// Whether a token reads as a value (something a call, subscript, or
/// attribute access can attach to).
fn is_value_like(kind: &TokenKind) -> bool {
    match kind {
        TokenKind::Ident(name) => !is_python_keyword(name),
        TokenKind::Str { .. }
        | TokenKind::FStr(_)
        | TokenKind::Bytes(_)
        | TokenKind::Number(_)
        | TokenKind::RParen
        | TokenKind::RBracket
        | TokenKind::RBrace => true,
        _ => false,
    }
}

/// Whether a space belongs before `cur`, given the previous token.
fn needs_space_before(prev: Option<&TokenKind>, cur: &TokenKind, brackets: &[&TokenKind]) -> bool {
    match cur {
        TokenKind::RParen
        | TokenKind::RBracket
        | TokenKind::RBrace
        | TokenKind::Comma
        | TokenKind::Colon
        | TokenKind::Semicolon => false,
        // Attribute access glues; a bare leading dot (`from . import x`)
        // does not.
        TokenKind::Dot => !matches!(prev, Some(p) if is_value_like(p)),
        // Keyword-argument / default-value `=` is rendered tight.
        TokenKind::Op(op) if op == "=" && !brackets.is_empty() => false,
        // Call and subscript glue to the value before them.
        TokenKind::LParen | TokenKind::LBracket => {
            !matches!(prev, Some(p) if is_value_like(p))
        }
        _ => true,
    }
}

/// Whether `cur` glues directly to whatever follows it.
fn glues_to_next(cur: &TokenKind, prev: Option<&TokenKind>, brackets: &[&TokenKind]) -> bool {
    match cur {
        TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace | TokenKind::Dot => true,
        // Subscript/slice colon: `a[1:2]`.
        TokenKind::Colon => matches!(brackets.last(), Some(TokenKind::LBracket)),
        TokenKind::Op(op) => match op.as_str() {
            "=" => !brackets.is_empty(),
            // Decorator marker at the start of a line.
            "@" => prev.is_none(),
            // Unary context: start of line, after an opener, separator, or
            // another operator. Also covers `*args` / `**kwargs`.
            "-" | "+" | "~" | "*" | "**" => matches!(
                prev,
                None | Some(
                    TokenKind::LParen
                        | TokenKind::LBracket
                        | TokenKind::LBrace
                        | TokenKind::Comma
                        | TokenKind::Colon
                        | TokenKind::Semicolon
                        | TokenKind::Op(_)
                )
            ) || matches!(prev, Some(TokenKind::Ident(name)) if is_python_keyword(name)),
            _ => false,
        },
        _ => false,
    }
}

/// The full Python keyword set (identifier tokens the renderer must not
/// treat as callable values).
fn is_python_keyword(name: &str) -> bool {
    matches!(
        name,
        "False" | "None" | "True" | "and" | "as" | "assert" | "async" | "await"
            | "break" | "class" | "continue" | "def" | "del" | "elif" | "else"
            | "except" | "finally" | "for" | "from" | "global" | "if" | "import"
            | "in" | "is" | "lambda" | "nonlocal" | "not" | "or" | "pass"
            | "raise" | "return" | "try" | "while" | "with" | "yield"
    )
}
