//! Statement nodes.
//!
//! Statements carry an optional statement label (itself an integer constant
//! expression) and a span. References *to* labels go through
//! [`StmtLabelReference`], which starts unresolved for forward references and
//! is patched in place by sema once the labelled statement appears.

use serde::{Deserialize, Serialize};

use super::arena::{DeclId, ExprId, StmtId};
use super::types::TypeSpec;
use super::Span;

/// A statement node owned by the arena.
#[derive(Debug, Serialize)]
pub struct Stmt {
    pub(crate) kind: StmtKind,
    label: Option<ExprId>,
    span: Span,
}

impl Stmt {
    pub(crate) fn new(kind: StmtKind, label: Option<ExprId>, span: Span) -> Self {
        Self { kind, label, span }
    }

    pub fn kind(&self) -> &StmtKind {
        &self.kind
    }

    /// The statement's own label, if it carries one.
    pub fn label(&self) -> Option<ExprId> {
        self.label
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// A reference to a labelled statement.
///
/// `target` is `None` while the reference is still a forward reference; the
/// arena patches it once the label is declared. A reference that stays
/// unresolved at unit end is a reported user error, and consumers must treat
/// a `None` target as "label never declared", not as a broken tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StmtLabelReference {
    target: Option<StmtId>,
}

impl StmtLabelReference {
    pub fn resolved(target: StmtId) -> Self {
        Self {
            target: Some(target),
        }
    }

    pub fn unresolved() -> Self {
        Self { target: None }
    }

    pub fn target(&self) -> Option<StmtId> {
        self.target
    }

    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }
}

/// One letter range of an IMPLICIT rule, e.g. `I-N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterSpec {
    pub first: char,
    pub last: char,
}

/// The nature clause of a USE statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleNature {
    None,
    Intrinsic,
    NonIntrinsic,
}

/// A `local => use` rename in a USE statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePair {
    pub local: String,
    pub original: String,
}

/// One arm of an IF construct. `condition` is `None` for the ELSE arm.
#[derive(Debug, Serialize)]
pub struct IfBranch {
    pub condition: Option<ExprId>,
    pub body: StmtId,
}

/// The format selector of an I/O statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatSpec {
    /// List-directed, `PRINT *`.
    Star,
    /// A statement-label reference to a FORMAT statement.
    Label(ExprId),
    /// A character expression evaluated as the format.
    CharExpr(ExprId),
}

/// One edit descriptor of a FORMAT statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatItem {
    /// Data edit descriptor, e.g. `I5`, `F10.3`, held verbatim.
    Descriptor(String),
    /// Character string edit descriptor.
    Literal(String),
    /// Slash record terminator.
    Slash,
}

/// Statement variants
#[derive(Debug, Serialize)]
pub enum StmtKind {
    // Program unit delimiters
    Program {
        name: String,
    },
    EndProgram {
        name: Option<String>,
    },

    // Specification statements
    Use {
        nature: ModuleNature,
        module: String,
        /// `true` when an ONLY clause was present; the renames then list the
        /// imported entities.
        only: bool,
        renames: Vec<RenamePair>,
    },
    Import {
        names: Vec<String>,
    },
    Implicit {
        /// `None` for IMPLICIT NONE.
        ty: Option<TypeSpec>,
        letter_specs: Vec<LetterSpec>,
        is_none: bool,
    },
    Parameter {
        /// Named constants defined by this statement.
        pairs: Vec<DeclId>,
    },
    Dimension {
        decl: DeclId,
    },
    Format {
        items: Vec<FormatItem>,
    },
    Entry {
        name: String,
    },
    Asynchronous {
        names: Vec<String>,
    },
    External {
        decls: Vec<DeclId>,
    },
    Intrinsic {
        decls: Vec<DeclId>,
    },

    // Executable statements
    Block {
        body: Vec<StmtId>,
    },
    Assign {
        address: StmtLabelReference,
        target: ExprId,
    },
    AssignedGoto {
        target: ExprId,
        allowed_values: Vec<StmtLabelReference>,
    },
    Goto {
        destination: StmtLabelReference,
    },
    If {
        branches: Vec<IfBranch>,
    },
    Continue,
    Stop {
        code: Option<ExprId>,
    },
    Assignment {
        lhs: ExprId,
        rhs: ExprId,
    },
    Print {
        format: FormatSpec,
        items: Vec<ExprId>,
    },
}
