//! Fortlang Front End Library
//!
//! This library provides the semantic middle tier of the Fortlang compiler:
//! it turns the actions produced by an external parser into a fully typed,
//! arena-owned abstract syntax tree for one compilation unit.

pub mod ast;
pub mod diagnostics;
pub mod error;
pub mod sema;
pub mod types;

// Re-export commonly used types
pub use ast::{AstArena, CompilationUnit, Expr, ExprId, Span, Stmt, StmtId};
pub use diagnostics::{DiagnosticClient, DiagnosticEngine, Severity};
pub use error::{ErrorCollector, FortError, FortResult, SemaError};
pub use sema::SemanticActions;
pub use types::{TypeAuthority, TypeId};
