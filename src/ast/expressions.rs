//! Expression nodes.
//!
//! Every expression carries its discriminant, a source span, and the type
//! handle assigned during semantic analysis. The variant set is closed:
//! consumers dispatch with an exhaustive `match`, so adding a variant is a
//! compile error at every traversal site until it is handled.

use serde::{Deserialize, Serialize};

use super::arena::{DeclId, ExprId};
use super::numeric::{FloatValue, IntValue};
use super::Span;
use crate::types::TypeId;

/// An expression node owned by the arena.
///
/// Immutable after construction; only sema may re-bind an
/// [`ExprKind::UnresolvedIdentifier`] placeholder.
#[derive(Debug, Serialize)]
pub struct Expr {
    pub(crate) kind: ExprKind,
    pub(crate) ty: Option<TypeId>,
    pub(crate) span: Span,
}

impl Expr {
    pub(crate) fn new(kind: ExprKind, ty: Option<TypeId>, span: Span) -> Self {
        Self { kind, ty, span }
    }

    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    /// The resolved type. `None` only for identifier placeholders and
    /// degraded error-recovery nodes.
    pub fn ty(&self) -> Option<TypeId> {
        self.ty
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Plus,
    Minus,
    Multiply,
    Divide,
    Power,

    // Character
    Concat,

    // Comparison
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Logical
    And,
    Or,
    Eqv,
    Neqv,
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Plus
                | BinaryOp::Minus
                | BinaryOp::Multiply
                | BinaryOp::Divide
                | BinaryOp::Power
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(
            self,
            BinaryOp::And | BinaryOp::Or | BinaryOp::Eqv | BinaryOp::Neqv
        )
    }
}

/// The closed set of intrinsic functions known to the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntrinsicFunction {
    Abs,
    Mod,
    Sqrt,
    Len,
    Index,
    Char,
    Ichar,
}

impl IntrinsicFunction {
    /// Looks an intrinsic up by its (case-insensitive) source name.
    pub fn from_name(name: &str) -> Option<IntrinsicFunction> {
        match name.to_ascii_uppercase().as_str() {
            "ABS" => Some(IntrinsicFunction::Abs),
            "MOD" => Some(IntrinsicFunction::Mod),
            "SQRT" => Some(IntrinsicFunction::Sqrt),
            "LEN" => Some(IntrinsicFunction::Len),
            "INDEX" => Some(IntrinsicFunction::Index),
            "CHAR" => Some(IntrinsicFunction::Char),
            "ICHAR" => Some(IntrinsicFunction::Ichar),
            _ => None,
        }
    }

    pub fn arity(self) -> usize {
        match self {
            IntrinsicFunction::Abs
            | IntrinsicFunction::Sqrt
            | IntrinsicFunction::Len
            | IntrinsicFunction::Char
            | IntrinsicFunction::Ichar => 1,
            IntrinsicFunction::Mod | IntrinsicFunction::Index => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntrinsicFunction::Abs => "ABS",
            IntrinsicFunction::Mod => "MOD",
            IntrinsicFunction::Sqrt => "SQRT",
            IntrinsicFunction::Len => "LEN",
            IntrinsicFunction::Index => "INDEX",
            IntrinsicFunction::Char => "CHAR",
            IntrinsicFunction::Ichar => "ICHAR",
        }
    }
}

/// Expression variants
#[derive(Debug, Serialize)]
pub enum ExprKind {
    // Constants. Each may carry a kind-selector sub-expression.
    IntegerConstant {
        value: IntValue,
        kind: Option<ExprId>,
    },
    RealConstant {
        value: FloatValue,
        kind: Option<ExprId>,
    },
    ComplexConstant {
        re: ExprId,
        im: ExprId,
        kind: Option<ExprId>,
    },
    CharacterConstant {
        value: String,
        kind: Option<ExprId>,
    },
    LogicalConstant {
        value: bool,
        kind: Option<ExprId>,
    },
    /// B/O/Z bit-pattern literal, held as an integer value.
    BozConstant {
        value: IntValue,
        kind: Option<ExprId>,
    },
    /// `count * value`, as in `DATA x /15*0/`.
    RepeatedConstant {
        count: ExprId,
        value: ExprId,
    },

    // Designators
    Var(DeclId),
    Substring {
        target: ExprId,
        start: Option<ExprId>,
        end: Option<ExprId>,
    },
    ArrayElement {
        target: ExprId,
        subscripts: Vec<ExprId>,
    },

    // Operations
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    /// User-defined operator application, e.g. `a .cross. b`.
    DefinedOperator {
        name: String,
        args: Vec<ExprId>,
    },

    // Calls
    Call {
        function: DeclId,
        args: Vec<ExprId>,
    },
    IntrinsicCall {
        function: IntrinsicFunction,
        args: Vec<ExprId>,
    },

    /// Compiler-inserted conversion; never appears in source.
    ImplicitCast {
        operand: ExprId,
    },

    ArrayConstructor(Vec<ExprId>),
    /// Bounded iteration descriptor used inside literal lists.
    ImpliedDo {
        var: String,
        body: Vec<ExprId>,
        init: ExprId,
        limit: ExprId,
        step: Option<ExprId>,
    },

    /// A name seen before its declaration; re-resolved in a later pass.
    UnresolvedIdentifier(String),
}
