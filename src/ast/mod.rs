//! Abstract Syntax Tree (AST) definitions for the Fortlang front end.
//!
//! Nodes are owned by a single [`AstArena`] per compilation unit and refer to
//! each other through opaque index handles. They are immutable once built;
//! the only sanctioned mutations are statement-label back-patching and the
//! re-resolution of identifier placeholders, both reachable from sema only.

mod arena;
mod declarations;
mod expressions;
pub mod numeric;
mod statements;
mod types;

pub use arena::{ArraySpecId, AstArena, CompilationUnit, DeclId, ExprId, StmtId, WordsId};
pub use declarations::{Decl, DeclKind};
pub use expressions::{BinaryOp, Expr, ExprKind, IntrinsicFunction, UnaryOp};
pub use numeric::{FloatSemantics, FloatValue, IntValue};
pub use statements::{
    FormatItem, FormatSpec, IfBranch, LetterSpec, ModuleNature, RenamePair, Stmt, StmtKind,
    StmtLabelReference,
};
pub use types::{ArraySpec, DeclSpec, TypeSpec};

use serde::{Deserialize, Serialize};

/// Span information for source location tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}
