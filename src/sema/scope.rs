//! スコープ管理
//!
//! 宣言コンテキストの木、文番号スコープ、IMPLICIT規則のスコープを
//! 保持する。スコープのpush/popが釣り合わないのは解析ドライバの
//! バグであり、診断ではなくパニックになる。

use indexmap::IndexMap;

use crate::ast::{AstArena, DeclId, ExprId, Span, StmtId};
use crate::types::TypeId;

/// 宣言コンテキストへのハンドル。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u32);

impl ContextId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 宣言コンテキストの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// 最外殻。プログラム単位の親で、pop不可。
    TranslationUnit,
    MainProgram,
    Function,
    Subroutine,
    /// 派生型定義の内側。成分宣言を保持する。
    RecordType,
}

/// ひとつの宣言コンテキスト。
///
/// 名前解決はこのコンテキスト単体で閉じており、外側への探索
/// （ホスト結合）は行わない。
#[derive(Debug)]
pub struct DeclContext {
    kind: ContextKind,
    name: Option<String>,
    parent: Option<ContextId>,
    symbols: IndexMap<String, DeclId>,
}

impl DeclContext {
    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parent(&self) -> Option<ContextId> {
        self.parent
    }

    /// 宣言順の実体一覧。
    pub fn decls(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.symbols.values().copied()
    }

    pub fn lookup(&self, name: &str) -> Option<DeclId> {
        self.symbols.get(name).copied()
    }
}

/// 宣言コンテキストの木と、現在開いているコンテキストのスタック。
#[derive(Debug)]
pub struct ScopeTree {
    contexts: Vec<DeclContext>,
    stack: Vec<ContextId>,
}

impl ScopeTree {
    /// 翻訳単位コンテキストだけを持つ木を作り、それを開いた状態で返す。
    pub fn new() -> Self {
        let root = DeclContext {
            kind: ContextKind::TranslationUnit,
            name: None,
            parent: None,
            symbols: IndexMap::new(),
        };
        Self {
            contexts: vec![root],
            stack: vec![ContextId(0)],
        }
    }

    pub fn context(&self, id: ContextId) -> &DeclContext {
        &self.contexts[id.index()]
    }

    /// 現在開いているコンテキスト。
    pub fn current(&self) -> ContextId {
        *self.stack.last().expect("scope stack is never empty")
    }

    pub fn at_translation_unit(&self) -> bool {
        self.stack.len() == 1
    }

    /// 現在のコンテキストを親として新しいコンテキストを作る。
    /// まだ開かない。
    pub fn create_context(&mut self, kind: ContextKind, name: Option<String>) -> ContextId {
        let id = ContextId(self.contexts.len() as u32);
        self.contexts.push(DeclContext {
            kind,
            name,
            parent: Some(self.current()),
            symbols: IndexMap::new(),
        });
        id
    }

    /// コンテキストを開く。親が現在のコンテキストでなければパニック。
    pub fn push(&mut self, id: ContextId) {
        assert_eq!(
            self.contexts[id.index()].parent,
            Some(self.current()),
            "pushed context is not a child of the current context"
        );
        self.stack.push(id);
    }

    /// 現在のコンテキストを閉じる。翻訳単位は閉じられない。
    pub fn pop(&mut self) -> ContextId {
        assert!(
            self.stack.len() > 1,
            "attempted to pop the translation unit scope"
        );
        self.stack.pop().expect("scope stack is never empty")
    }

    /// 現在のコンテキストに名前を登録する。既に同名の宣言があれば
    /// 登録せず、最初の宣言を返す。
    pub fn declare(&mut self, name: &str, decl: DeclId) -> Result<(), DeclId> {
        let current = self.current();
        let symbols = &mut self.contexts[current.index()].symbols;
        if let Some(&first) = symbols.get(name) {
            return Err(first);
        }
        symbols.insert(name.to_string(), decl);
        Ok(())
    }

    /// 現在のコンテキストで名前を解決する。外側のコンテキストは
    /// 探索しない。
    pub fn resolve(&self, name: &str) -> Option<DeclId> {
        self.context(self.current()).lookup(name)
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

/// 文番号を参照する側の種別。前方参照の解決時に、どのノードの
/// どこを書き換えるかを表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelUser {
    GotoDestination(StmtId),
    AssignAddress(StmtId),
    /// 割り当て形GOTOの許容並びの1要素。
    AssignedGotoValue(StmtId, usize),
}

/// 未解決の文番号参照。
#[derive(Debug)]
pub struct ForwardRef {
    pub label: u32,
    pub user: LabelUser,
    pub span: Span,
}

/// ひとつのプログラム単位の文番号スコープ。
///
/// 文番号は宣言より先に参照されうるため、未解決の参照を溜めておき、
/// 番号付きの文が現れた時点でアリーナ上のノードを書き換える。
#[derive(Debug, Default)]
pub struct StmtLabelScope {
    declared: IndexMap<u32, StmtId>,
    forward: Vec<ForwardRef>,
}

impl StmtLabelScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// 番号付きの文を登録する。同じ番号が既にあれば登録せず、最初の
    /// 文を返す。登録に成功したら、この番号を待っていた前方参照を
    /// すべて解決する。
    pub fn declare(
        &mut self,
        label: u32,
        stmt: StmtId,
        arena: &mut AstArena,
    ) -> Result<(), StmtId> {
        if let Some(&first) = self.declared.get(&label) {
            return Err(first);
        }
        self.declared.insert(label, stmt);

        let mut i = 0;
        while i < self.forward.len() {
            if self.forward[i].label == label {
                let resolved = self.forward.swap_remove(i);
                match resolved.user {
                    LabelUser::GotoDestination(id) => arena.patch_goto_target(id, stmt),
                    LabelUser::AssignAddress(id) => arena.patch_assign_address(id, stmt),
                    LabelUser::AssignedGotoValue(id, index) => {
                        arena.patch_assigned_goto_value(id, index, stmt)
                    }
                }
            } else {
                i += 1;
            }
        }
        Ok(())
    }

    pub fn resolve(&self, label: u32) -> Option<StmtId> {
        self.declared.get(&label).copied()
    }

    /// 未解決の参照を記録する。番号付きの文が現れたときに解決される。
    pub fn declare_forward(&mut self, label: u32, user: LabelUser, span: Span) {
        self.forward.push(ForwardRef { label, user, span });
    }

    /// プログラム単位の終端で残った未解決参照。
    pub fn unresolved(&self) -> &[ForwardRef] {
        &self.forward
    }
}

/// ひとつのプログラム単位のIMPLICIT規則。
///
/// 頭文字ごとの型規則と、IMPLICIT NONEの有無を持つ。規則が無い文字は
/// 既定規則（I〜NはINTEGER、他はREAL）に落ちる。
#[derive(Debug, Default)]
pub struct ImplicitTypingScope {
    rules: [Option<TypeId>; 26],
    none: bool,
}

impl ImplicitTypingScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// 文字範囲に型規則を与える。既に規則のある文字が含まれていれば
    /// 何も変えず、その文字を返す。
    pub fn apply(&mut self, first: char, last: char, ty: TypeId) -> Result<(), char> {
        let lo = letter_index(first);
        let hi = letter_index(last);
        assert!(lo <= hi, "inverted implicit letter range");
        for i in lo..=hi {
            if self.rules[i].is_some() {
                return Err((b'A' + i as u8) as char);
            }
        }
        for i in lo..=hi {
            self.rules[i] = Some(ty);
        }
        Ok(())
    }

    pub fn apply_none(&mut self) {
        self.none = true;
    }

    pub fn is_none(&self) -> bool {
        self.none
    }

    /// 頭文字に対する明示的なIMPLICIT規則。既定規則はここでは扱わない。
    pub fn resolve(&self, letter: char) -> Option<TypeId> {
        self.rules[letter_index(letter)]
    }
}

fn letter_index(letter: char) -> usize {
    let upper = letter.to_ascii_uppercase();
    assert!(upper.is_ascii_uppercase(), "implicit rule on a non-letter");
    (upper as u8 - b'A') as usize
}

/// ひとつのプログラム単位に付随するスコープ一式。
#[derive(Debug, Default)]
pub struct ProgramUnitScope {
    pub stmt_labels: StmtLabelScope,
    pub implicit: ImplicitTypingScope,
    /// IMPLICIT NONEのもとで宣言前に現れた名前の占位式。後続の
    /// 実体宣言がこの並びを引き取って解決し直す。
    pub unresolved_uses: Vec<(String, ExprId)>,
}
