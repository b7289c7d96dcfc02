//! Declaration nodes.

use serde::Serialize;

use super::arena::{DeclId, ExprId};
use super::Span;
use crate::types::TypeId;

/// A named declaration owned by the arena.
#[derive(Debug, Serialize)]
pub struct Decl {
    pub(crate) kind: DeclKind,
    name: String,
    span: Span,
}

impl Decl {
    pub(crate) fn new(kind: DeclKind, name: String, span: Span) -> Self {
        Self { kind, name, span }
    }

    pub fn kind(&self) -> &DeclKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// The declared entity's type, where the kind carries one.
    pub fn ty(&self) -> Option<TypeId> {
        match &self.kind {
            DeclKind::Variable { ty, .. } | DeclKind::Field { ty, .. } => *ty,
            DeclKind::Function { result_ty, .. } => *result_ty,
            DeclKind::Record { .. } | DeclKind::External | DeclKind::Intrinsic => None,
        }
    }

    pub fn init(&self) -> Option<ExprId> {
        match &self.kind {
            DeclKind::Variable { init, .. } | DeclKind::Field { init, .. } => *init,
            _ => None,
        }
    }

    pub(crate) fn set_type(&mut self, new_ty: TypeId) {
        match &mut self.kind {
            DeclKind::Variable { ty, .. } | DeclKind::Field { ty, .. } => *ty = Some(new_ty),
            other => unreachable!("type assignment on non-entity declaration: {:?}", other),
        }
    }

    pub(crate) fn set_init(&mut self, new_init: ExprId) {
        match &mut self.kind {
            DeclKind::Variable { init, .. } | DeclKind::Field { init, .. } => {
                *init = Some(new_init)
            }
            other => unreachable!("initializer on non-entity declaration: {:?}", other),
        }
    }
}

/// Declaration variants
#[derive(Debug, Serialize)]
pub enum DeclKind {
    /// A data entity. `ty` is `None` only for degraded error-recovery nodes.
    Variable {
        ty: Option<TypeId>,
        init: Option<ExprId>,
        is_parameter: bool,
    },
    /// A component of a derived type.
    Field {
        ty: Option<TypeId>,
        init: Option<ExprId>,
    },
    /// A function or subroutine unit. Subroutines have no result type.
    Function {
        is_subroutine: bool,
        result_ty: Option<TypeId>,
        args: Vec<DeclId>,
    },
    /// A derived type definition; its fields are collected at END TYPE.
    Record {
        fields: Vec<DeclId>,
    },
    /// A name given the EXTERNAL attribute.
    External,
    /// A name given the INTRINSIC attribute.
    Intrinsic,
}
