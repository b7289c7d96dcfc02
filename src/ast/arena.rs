//! The bump arena that owns every AST node of one compilation unit.
//!
//! Nodes are appended and never individually freed; tearing the arena down
//! invalidates every handle at once. Handles are plain indices, so a node can
//! never own (and thus never `delete`) another node.

use serde::{Deserialize, Serialize};

use super::declarations::{Decl, DeclKind};
use super::expressions::{Expr, ExprKind};
use super::statements::{Stmt, StmtKind, StmtLabelReference};
use super::types::ArraySpec;
use super::Span;
use crate::types::{TypeAuthority, TypeId};

macro_rules! define_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_handle!(
    /// Handle to an [`Expr`] in the arena.
    ExprId
);
define_handle!(
    /// Handle to a [`Stmt`] in the arena.
    StmtId
);
define_handle!(
    /// Handle to a [`Decl`] in the arena.
    DeclId
);
define_handle!(
    /// Handle to an [`ArraySpec`] in the arena.
    ArraySpecId
);

/// Handle to a slice of numeric storage words in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordsId {
    start: u32,
    len: u32,
}

/// Owns expression, statement, declaration and array-spec nodes, plus the
/// word storage backing wide numeric literals.
#[derive(Debug, Default, Serialize)]
pub struct AstArena {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    decls: Vec<Decl>,
    array_specs: Vec<ArraySpec>,
    words: Vec<u64>,
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn alloc_expr(&mut self, kind: ExprKind, ty: Option<TypeId>, span: Span) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(Expr::new(kind, ty, span));
        id
    }

    pub(crate) fn alloc_stmt(
        &mut self,
        kind: StmtKind,
        label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(Stmt::new(kind, label, span));
        id
    }

    pub(crate) fn alloc_decl(&mut self, kind: DeclKind, name: String, span: Span) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(Decl::new(kind, name, span));
        id
    }

    pub(crate) fn alloc_array_spec(&mut self, spec: ArraySpec) -> ArraySpecId {
        let id = ArraySpecId(self.array_specs.len() as u32);
        self.array_specs.push(spec);
        id
    }

    pub(crate) fn alloc_words(&mut self, words: &[u64]) -> WordsId {
        let start = self.words.len() as u32;
        self.words.extend_from_slice(words);
        WordsId {
            start,
            len: words.len() as u32,
        }
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    pub fn array_spec(&self, id: ArraySpecId) -> &ArraySpec {
        &self.array_specs[id.index()]
    }

    pub fn word_slice(&self, id: WordsId) -> &[u64] {
        &self.words[id.start as usize..(id.start + id.len) as usize]
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn stmt_count(&self) -> usize {
        self.stmts.len()
    }

    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }

    /// All expression handles, in allocation order.
    pub fn expr_ids(&self) -> impl Iterator<Item = ExprId> {
        (0..self.exprs.len() as u32).map(ExprId)
    }

    // Controlled patch points. Statement labels may be declared after the
    // statements that reference them; sema patches the reference in place
    // once the target is known.

    pub(crate) fn patch_goto_target(&mut self, id: StmtId, target: StmtId) {
        match &mut self.stmts[id.index()].kind {
            StmtKind::Goto { destination } => *destination = StmtLabelReference::resolved(target),
            other => unreachable!("goto patch on non-goto statement: {:?}", other),
        }
    }

    pub(crate) fn patch_assign_address(&mut self, id: StmtId, target: StmtId) {
        match &mut self.stmts[id.index()].kind {
            StmtKind::Assign { address, .. } => *address = StmtLabelReference::resolved(target),
            other => unreachable!("assign patch on non-assign statement: {:?}", other),
        }
    }

    pub(crate) fn patch_assigned_goto_value(&mut self, id: StmtId, index: usize, target: StmtId) {
        match &mut self.stmts[id.index()].kind {
            StmtKind::AssignedGoto { allowed_values, .. } => {
                allowed_values[index] = StmtLabelReference::resolved(target)
            }
            other => unreachable!("assigned-goto patch on other statement: {:?}", other),
        }
    }

    /// Re-binds an identifier placeholder to the declaration it turned out to
    /// name, giving the expression its type in the same step.
    pub(crate) fn resolve_identifier(&mut self, id: ExprId, decl: DeclId, ty: Option<TypeId>) {
        let expr = &mut self.exprs[id.index()];
        debug_assert!(
            matches!(expr.kind, ExprKind::UnresolvedIdentifier(_)),
            "re-resolution of a resolved expression"
        );
        expr.kind = ExprKind::Var(decl);
        expr.ty = ty;
    }

    pub(crate) fn set_decl_type(&mut self, id: DeclId, ty: TypeId) {
        self.decls[id.index()].set_type(ty);
    }

    pub(crate) fn set_decl_init(&mut self, id: DeclId, init: ExprId) {
        self.decls[id.index()].set_init(init);
    }

    pub(crate) fn mark_parameter(&mut self, id: DeclId) {
        match &mut self.decls[id.index()].kind {
            DeclKind::Variable { is_parameter, .. } => *is_parameter = true,
            other => unreachable!("PARAMETER attribute on a non-variable: {:?}", other),
        }
    }

    pub(crate) fn set_record_fields(&mut self, id: DeclId, field_ids: Vec<DeclId>) {
        match &mut self.decls[id.index()].kind {
            DeclKind::Record { fields } => *fields = field_ids,
            other => unreachable!("field list on non-record declaration: {:?}", other),
        }
    }

    pub(crate) fn set_function_result(&mut self, id: DeclId, ty: TypeId) {
        match &mut self.decls[id.index()].kind {
            DeclKind::Function { result_ty, .. } => *result_ty = Some(ty),
            other => unreachable!("result type on non-function declaration: {:?}", other),
        }
    }

    pub(crate) fn push_function_arg(&mut self, id: DeclId, arg: DeclId) {
        match &mut self.decls[id.index()].kind {
            DeclKind::Function { args, .. } => args.push(arg),
            other => unreachable!("argument on non-function declaration: {:?}", other),
        }
    }
}

/// The finished product of one run of semantic analysis: the arena with every
/// node of the unit, and the type authority that uniques their types.
///
/// Consumers (pretty printers, code generators) traverse it read-only.
pub struct CompilationUnit {
    arena: AstArena,
    types: TypeAuthority,
}

impl CompilationUnit {
    pub(crate) fn new(arena: AstArena, types: TypeAuthority) -> Self {
        Self { arena, types }
    }

    pub fn arena(&self) -> &AstArena {
        &self.arena
    }

    pub fn types(&self) -> &TypeAuthority {
        &self.types
    }

    /// Serializes every node table to JSON, for external AST dumps.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.arena)
    }
}
