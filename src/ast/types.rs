//! Syntactic type material: array bound specifications and the declaration
//! specifier accumulated while a type declaration statement is being parsed.
//!
//! These are surface-level forms. The semantic, uniqued types live in
//! [`crate::types`]; sema turns a [`DeclSpec`] into a
//! [`crate::types::TypeId`] when the declaration is acted on.

use serde::Serialize;

use super::arena::{ArraySpecId, ExprId};

/// The type keyword of a declaration, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeSpec {
    Unspecified,
    Integer,
    Real,
    DoublePrecision,
    Complex,
    Character,
    Logical,
    /// `TYPE(name)`, resolved against the derived types in scope.
    Record(String),
}

/// One dimension of an array declaration.
///
/// A dimension with an explicit upper bound is kept structurally distinct
/// from every assumed or deferred form, even when their extents coincide.
#[derive(Debug, Serialize)]
pub enum ArraySpec {
    /// `(lower:upper)` or `(upper)`; the lower bound defaults to 1.
    ExplicitShape {
        lower: Option<ExprId>,
        upper: ExprId,
    },
    /// `(lower:)` or `(:)`, shape taken from the actual argument.
    AssumedShape { lower: Option<ExprId> },
    /// `(:)` on an allocatable or pointer entity.
    DeferredShape,
    /// `(lower:*)` or `(*)`, final dimension of an assumed-size array.
    AssumedSize { lower: Option<ExprId> },
    /// `(lower:*)` on an implied-shape named constant.
    ImpliedShape { lower: Option<ExprId> },
}

/// Accumulates the pieces of a type declaration statement before sema
/// resolves them into a single uniqued type.
#[derive(Debug, Default)]
pub struct DeclSpec {
    type_spec: Option<TypeSpec>,
    kind_selector: Option<ExprId>,
    length_selector: Option<ExprId>,
    attrs: u32,
    dimensions: Vec<ArraySpecId>,
}

impl DeclSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_type_spec(&mut self, spec: TypeSpec) {
        self.type_spec = Some(spec);
    }

    pub fn type_spec(&self) -> Option<&TypeSpec> {
        self.type_spec.as_ref()
    }

    pub fn set_kind_selector(&mut self, kind: ExprId) {
        self.kind_selector = Some(kind);
    }

    pub fn kind_selector(&self) -> Option<ExprId> {
        self.kind_selector
    }

    pub fn set_length_selector(&mut self, len: ExprId) {
        self.length_selector = Some(len);
    }

    pub fn length_selector(&self) -> Option<ExprId> {
        self.length_selector
    }

    pub fn add_attr(&mut self, attr: u32) {
        self.attrs |= attr;
    }

    pub fn attrs(&self) -> u32 {
        self.attrs
    }

    pub fn set_dimensions(&mut self, dims: Vec<ArraySpecId>) {
        self.dimensions = dims;
    }

    pub fn dimensions(&self) -> &[ArraySpecId] {
        &self.dimensions
    }
}
