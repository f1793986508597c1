//! String literal encoding.
//!
//! Re-parses serialized source, walks string literals in tree order, and
//! replaces each literal's exact source spelling with a Python expression
//! that rebuilds the value at run time from a base64 payload (standard
//! alphabet, no wrapping):
//!
//! ```text
//! 'hello'  ->  __builtins__.__import__("base64").b64decode(b"aGVsbG8=").decode()
//! ```
//!
//! Adjacent string literals (Python's implicit concatenation, `'a' 'b'`)
//! are collapsed into one expression encoding the joined value: a decode
//! call cannot take part in implicit concatenation, so substituting each
//! literal of the run separately would juxtapose two calls with no operator
//! between them. A run that mixes in an f-string or bytes literal is left
//! alone entirely.
//!
//! Substitution is textual, applied over the whole source per literal, in
//! the order literals are encountered. Two literals with the same spelling
//! collapse to identical replacement text. A spelling that also occurs
//! inside a larger literal, or inside an earlier replacement's payload, is
//! rewritten there too; nothing anchors a substitution to its own node.
//! f-strings and bytes literals are left alone.

use crate::ast::{Stmt, StmtKind};
use crate::parser::{ParseError, Parser};
use crate::token::{Token, TokenKind};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Output of the encoding pass.
#[derive(Debug, Clone)]
pub struct EncodedLiterals {
    /// The rewritten source text.
    pub code: String,
    /// Number of string literal nodes processed.
    pub count: usize,
}

/// Replace every plain string literal in `source` with a runtime decode
/// expression. `source` must parse; the pipeline always hands this function
/// its own serializer output.
pub fn encode_literals(source: &str) -> Result<EncodedLiterals, ParseError> {
    let ast = Parser::new(source).parse()?;

    let mut literals = Vec::new();
    collect_literals(&ast.stmts, source, &mut literals);

    let count = literals.len();
    let mut code = source.to_string();
    for (raw, value) in literals {
        code = code.replace(&raw, &decode_expr(&value));
    }

    Ok(EncodedLiterals { code, count })
}

/// Build the replacement expression for one literal value.
fn decode_expr(value: &str) -> String {
    let payload = STANDARD.encode(value.as_bytes());
    format!("__builtins__.__import__(\"base64\").b64decode(b\"{payload}\").decode()")
}

/// Collect `(spelling, value)` for every string literal, depth-first in
/// source order. An implicit-concatenation run of plain literals becomes a
/// single entry spanning the whole run.
fn collect_literals(stmts: &[Stmt], source: &str, literals: &mut Vec<(String, String)>) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::FunctionDef { tail, body, .. } => {
                collect_from_tokens(tail, source, literals);
                collect_literals(body, source, literals);
            }
            StmtKind::Compound { header, body } => {
                collect_from_tokens(header, source, literals);
                collect_literals(body, source, literals);
            }
            StmtKind::Simple(tokens) => collect_from_tokens(tokens, source, literals),
        }
    }
}

fn collect_from_tokens(tokens: &[Token], source: &str, literals: &mut Vec<(String, String)>) {
    let mut i = 0;
    while i < tokens.len() {
        if !is_string_token(&tokens[i].kind) {
            i += 1;
            continue;
        }
        let start = i;
        while i < tokens.len() && is_string_token(&tokens[i].kind) {
            i += 1;
        }
        let run = &tokens[start..i];
        if !run.iter().all(|t| matches!(t.kind, TokenKind::Str { .. })) {
            continue;
        }
        let mut value = String::new();
        for token in run {
            if let TokenKind::Str { value: part, .. } = &token.kind {
                value.push_str(part);
            }
        }
        // The spelling is the exact source text of the run, whitespace
        // between the literals included.
        let span = run[0].span.merge(run[run.len() - 1].span);
        let raw = source[span.start as usize..span.end as usize].to_string();
        literals.push((raw, value));
    }
}

fn is_string_token(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Str { .. } | TokenKind::FStr(_) | TokenKind::Bytes(_)
    )
}
