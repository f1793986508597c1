//! Function name obfuscation.
//!
//! Replaces every declared function name with an opaque synthetic name
//! (`__obf_0001__`, `__obf_0002__`, ...) by:
//! 1. Walking the tree depth-first, registering each `def` name and
//!    overwriting the declaration in place
//! 2. Rewriting every identifier token whose spelling matches a registered
//!    name, in a second full pass
//!
//! Two passes are required: a reference may textually precede its
//! declaration (forward reference, recursion, closures), so the table must
//! be complete before any reference is rewritten.
//!
//! The table is keyed by spelling, not by binding: no scope resolution is
//! performed. A local variable that happens to share a function's name is
//! redirected to that function's synthetic name. Attribute names (after `.`),
//! the declaration identifier after `class`, and keyword-argument names at
//! call sites are never rewritten.

use crate::ast::{Stmt, StmtKind};
use crate::Ast;
use rustc_hash::{FxHashMap, FxHashSet};

/// Options for renaming.
#[derive(Debug, Clone, Default)]
pub struct RenameOptions {
    /// Function names to never rename.
    pub reserved: FxHashSet<String>,
}

/// Generator for synthetic names. Monotonic within one run, never reset.
#[derive(Debug, Default)]
pub struct NameGenerator {
    counter: u32,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the next synthetic name: `__obf_` + 4-digit zero-padded
    /// ordinal + `__`.
    pub fn next_name(&mut self) -> String {
        self.counter += 1;
        format!("__obf_{:04}__", self.counter)
    }
}

/// The per-run mapping from original function names to synthetic names.
/// Append-only: entries are never removed or overwritten.
#[derive(Debug, Default)]
pub struct RenameTable {
    map: FxHashMap<String, String>,
    generator: NameGenerator,
}

impl RenameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the synthetic name for an original spelling.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    /// Number of distinct renamed declarations.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over (original, synthetic) pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Return the synthetic name for `name`, generating and recording a
    /// fresh one on first sight.
    fn assign(&mut self, name: &str) -> String {
        if let Some(existing) = self.map.get(name) {
            return existing.clone();
        }
        let synthetic = self.generator.next_name();
        self.map.insert(name.to_string(), synthetic.clone());
        synthetic
    }
}

/// Rename function declarations and their references in-place.
///
/// Returns the table built during the run; the caller can report or discard
/// it. The codegen emits the mutated tree as-is.
pub fn rename(ast: &mut Ast, options: &RenameOptions) -> RenameTable {
    let mut table = RenameTable::new();

    // Phase 1: Declare — register every `def` name, overwrite in place
    collect_stmts(&mut ast.stmts, options, &mut table);

    // Phase 2: Rewrite — replace matching identifier tokens everywhere
    rewrite_stmts(&mut ast.stmts, &table);

    table
}

// =============================================================================
// Phase 1: Declarations
// =============================================================================

fn collect_stmts(stmts: &mut [Stmt], options: &RenameOptions, table: &mut RenameTable) {
    for stmt in stmts {
        match &mut stmt.kind {
            StmtKind::FunctionDef { name, body, .. } => {
                if !options.reserved.contains(name.as_str()) {
                    *name = table.assign(name);
                }
                collect_stmts(body, options, table);
            }
            StmtKind::Compound { body, .. } => {
                collect_stmts(body, options, table);
            }
            StmtKind::Simple(_) => {}
        }
    }
}

// =============================================================================
// Phase 2: References
// =============================================================================

fn rewrite_stmts(stmts: &mut [Stmt], table: &RenameTable) {
    for stmt in stmts {
        match &mut stmt.kind {
            StmtKind::FunctionDef { tail, body, .. } => {
                rewrite_tokens(tail, table);
                rewrite_stmts(body, table);
            }
            StmtKind::Compound { header, body } => {
                rewrite_tokens(header, table);
                rewrite_stmts(body, table);
            }
            StmtKind::Simple(tokens) => rewrite_tokens(tokens, table),
        }
    }
}

/// Rewrite identifier tokens in one token sequence. An identifier is a
/// reference unless it follows `.` (attribute name) or `class` (declaration),
/// or names a keyword argument (`f(name=...)`, or a parameter default in a
/// `def` header).
fn rewrite_tokens(tokens: &mut [crate::token::Token], table: &RenameTable) {
    use crate::token::TokenKind;

    let mut depth = 0usize;
    for i in 0..tokens.len() {
        match &tokens[i].kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                depth = depth.saturating_sub(1);
            }
            TokenKind::Ident(_) => {
                if i > 0 && matches!(tokens[i - 1].kind, TokenKind::Dot | TokenKind::Class) {
                    continue;
                }
                // Keyword-argument name: inside brackets, preceded by `(`
                // or `,`, directly followed by `=`.
                let is_kwarg_name = depth > 0
                    && matches!(tokens[i - 1].kind, TokenKind::LParen | TokenKind::Comma)
                    && matches!(
                        tokens.get(i + 1).map(|t| &t.kind),
                        Some(TokenKind::Op(op)) if op == "="
                    );
                if is_kwarg_name {
                    continue;
                }
                if let TokenKind::Ident(name) = &mut tokens[i].kind {
                    if let Some(synthetic) = table.get(name) {
                        *name = synthetic.to_string();
                    }
                }
            }
            _ => {}
        }
    }
}
