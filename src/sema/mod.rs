//! 意味解析モジュール
//!
//! パーサーからの構文イベント（ActOn系メソッド）を受け取り、型付けと
//! 名前解決を済ませたASTノードをアリーナ上に構築する。利用者のソース
//! コードに起因するエラーは診断として報告したうえで解析を続け、内部
//! 不変条件の破れ（スコープの不均衡など）はパニックとして扱う。

mod declarations;
mod eval;
mod expressions;
mod scope;
mod statements;

pub use scope::{
    ContextId, ContextKind, DeclContext, ForwardRef, ImplicitTypingScope, LabelUser, ScopeTree,
    StmtLabelScope,
};

use crate::ast::{AstArena, CompilationUnit, DeclId, ExprId, StmtId};
use crate::diagnostics::{DiagnosticClient, DiagnosticEngine};
use crate::types::TypeAuthority;

use scope::ProgramUnitScope;

/// 縮退を示す番兵。
///
/// 利用者エラーで有効なノードを作れなかったことを表す。エラー自体は
/// 診断として報告済みで、この値が診断を運ぶことはない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalid;

pub type ExprResult = Result<ExprId, Invalid>;
pub type StmtResult = Result<StmtId, Invalid>;
pub type DeclResult = Result<DeclId, Invalid>;

/// 意味解析の本体。
///
/// パーサーが文法要素を認識するたびに対応する`act_on_*`を呼び、
/// 解析が終わったら[`finish`](SemanticActions::finish)で成果物の
/// [`CompilationUnit`]を取り出す。
pub struct SemanticActions {
    pub(crate) arena: AstArena,
    pub(crate) types: TypeAuthority,
    pub(crate) scopes: ScopeTree,
    /// 現在開いているプログラム単位のスコープ（文番号・IMPLICIT規則）。
    pub(crate) unit_scopes: Vec<ProgramUnitScope>,
    pub(crate) diag: DiagnosticEngine,
}

impl SemanticActions {
    pub fn new(file_id: usize) -> Self {
        Self::with_engine(DiagnosticEngine::new(file_id))
    }

    pub fn with_client(client: Box<dyn DiagnosticClient>, file_id: usize) -> Self {
        Self::with_engine(DiagnosticEngine::with_client(client, file_id))
    }

    fn with_engine(diag: DiagnosticEngine) -> Self {
        Self {
            arena: AstArena::new(),
            types: TypeAuthority::new(),
            scopes: ScopeTree::new(),
            unit_scopes: Vec::new(),
            diag,
        }
    }

    pub fn arena(&self) -> &AstArena {
        &self.arena
    }

    pub fn types(&self) -> &TypeAuthority {
        &self.types
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    pub fn error_count(&self) -> usize {
        self.diag.error_count()
    }

    pub fn has_errors(&self) -> bool {
        self.diag.has_errors()
    }

    /// 解析を締めて成果物を取り出す。
    ///
    /// すべてのプログラム単位が閉じられていなければパニックする。
    pub fn finish(self) -> CompilationUnit {
        assert!(
            self.unit_scopes.is_empty(),
            "program unit left open at end of analysis"
        );
        assert!(
            self.scopes.at_translation_unit(),
            "unbalanced scope stack at end of analysis"
        );
        CompilationUnit::new(self.arena, self.types)
    }

    /// 現在のプログラム単位スコープ。プログラム単位の外での呼び出しは
    /// 呼び出し側のバグ。
    pub(crate) fn unit_scope(&mut self) -> &mut ProgramUnitScope {
        self.unit_scopes
            .last_mut()
            .expect("statement outside of any program unit")
    }
}
