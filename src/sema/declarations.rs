//! 宣言の意味解析
//!
//! プログラム単位の開閉、実体宣言、派生型定義、IMPLICIT規則による
//! 型付けを扱う。重複宣言は最初の宣言を保持したまま報告し、型の
//! 決まらない実体は型なしの縮退ノードとして解析を続ける。

use crate::ast::{
    ArraySpec, ArraySpecId, DeclId, DeclKind, DeclSpec, ExprId, Span, StmtId, StmtKind, TypeSpec,
};
use crate::error::SemaError;
use crate::types::{Qualifiers, TypeId};

use super::scope::{ContextKind, ProgramUnitScope};
use super::{DeclResult, Invalid, SemanticActions};

impl SemanticActions {
    /// PROGRAM文。主プログラムのスコープを開く。
    pub fn act_on_main_program(
        &mut self,
        name: &str,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        let ctx = self
            .scopes
            .create_context(ContextKind::MainProgram, Some(name.to_string()));
        self.scopes.push(ctx);
        self.unit_scopes.push(ProgramUnitScope::default());
        log::debug!("entering main program {}", name);
        let stmt = self.arena.alloc_stmt(
            StmtKind::Program {
                name: name.to_string(),
            },
            stmt_label,
            span,
        );
        self.declare_stmt_label(stmt_label, stmt);
        stmt
    }

    /// END PROGRAM文。名前の不一致はエラーを1件報告したうえで、
    /// スコープは必ず閉じる。
    pub fn act_on_end_main_program(
        &mut self,
        name: Option<&str>,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        let stmt = self.arena.alloc_stmt(
            StmtKind::EndProgram {
                name: name.map(str::to_string),
            },
            stmt_label,
            span,
        );
        self.declare_stmt_label(stmt_label, stmt);
        self.close_program_unit(ContextKind::MainProgram, name, span);
        stmt
    }

    /// FUNCTION文。関数を親スコープに宣言し、本体のスコープを開く。
    pub fn act_on_function(&mut self, name: &str, span: Span) -> DeclResult {
        self.open_subprogram(ContextKind::Function, name, span, false)
    }

    /// SUBROUTINE文。
    pub fn act_on_subroutine(&mut self, name: &str, span: Span) -> DeclResult {
        self.open_subprogram(ContextKind::Subroutine, name, span, true)
    }

    fn open_subprogram(
        &mut self,
        kind: ContextKind,
        name: &str,
        span: Span,
        is_subroutine: bool,
    ) -> DeclResult {
        let decl = self.arena.alloc_decl(
            DeclKind::Function {
                is_subroutine,
                result_ty: None,
                args: Vec::new(),
            },
            name.to_string(),
            span,
        );
        let declared = self.declare_or_report(name, decl, span);

        let ctx = self.scopes.create_context(kind, Some(name.to_string()));
        self.scopes.push(ctx);
        self.unit_scopes.push(ProgramUnitScope::default());

        // 関数名は結果変数として本体スコープからも見える。
        if !is_subroutine {
            let _ = self.scopes.declare(name, decl);
        }
        declared.map(|()| decl)
    }

    /// 仮引数。本体スコープに宣言し、関数の引数並びに加える。
    pub fn act_on_subprogram_arg(
        &mut self,
        subprogram: DeclId,
        name: &str,
        span: Span,
    ) -> DeclResult {
        let ty = self.resolve_implicit_type(name);
        let decl = self.arena.alloc_decl(
            DeclKind::Variable {
                ty,
                init: None,
                is_parameter: false,
            },
            name.to_string(),
            span,
        );
        self.declare_or_report(name, decl, span)?;
        self.arena.push_function_arg(subprogram, decl);
        Ok(decl)
    }

    /// 関数の結果型を確定する。
    pub fn act_on_function_result_type(&mut self, function: DeclId, ty: TypeId) {
        self.arena.set_function_result(function, ty);
    }

    /// END FUNCTION / END SUBROUTINE文。
    pub fn act_on_end_subprogram(&mut self, name: Option<&str>, span: Span) {
        let kind = self.scopes.context(self.scopes.current()).kind();
        assert!(
            matches!(kind, ContextKind::Function | ContextKind::Subroutine),
            "END of a subprogram outside of one"
        );
        self.close_program_unit(kind, name, span);
    }

    /// プログラム単位を閉じる。名前の検査と未解決文番号の報告を行い、
    /// 失敗してもスコープは必ず閉じる。
    fn close_program_unit(&mut self, expected: ContextKind, name: Option<&str>, span: Span) {
        let current = self.scopes.current();
        let ctx = self.scopes.context(current);
        assert_eq!(ctx.kind(), expected, "END does not match the open unit");

        if let (Some(found), Some(unit_name)) = (name, ctx.name()) {
            if !found.eq_ignore_ascii_case(unit_name) {
                let expected_name = unit_name.to_string();
                self.diag.error(SemaError::EndNameMismatch {
                    expected: expected_name,
                    found: found.to_string(),
                    span,
                });
            }
        }

        let unit = self.unit_scopes.pop().expect("unit scope missing at END");
        for forward in unit.stmt_labels.unresolved() {
            self.diag.error(SemaError::UndefinedStatementLabel {
                label: forward.label,
                span: forward.span,
            });
        }
        self.scopes.pop();
    }

    /// TYPE文。派生型定義のスコープを開く。
    ///
    /// 名前が重複していても新しい定義で解析を続け、最初の定義は
    /// そのまま残す。
    pub fn act_on_derived_type(&mut self, name: &str, span: Span) -> DeclId {
        let decl = self.arena.alloc_decl(
            DeclKind::Record { fields: Vec::new() },
            name.to_string(),
            span,
        );
        let _ = self.declare_or_report(name, decl, span);
        let ctx = self
            .scopes
            .create_context(ContextKind::RecordType, Some(name.to_string()));
        self.scopes.push(ctx);
        decl
    }

    /// 派生型の成分宣言。
    pub fn act_on_field_decl(&mut self, ds: &DeclSpec, name: &str, span: Span) -> DeclResult {
        assert_eq!(
            self.scopes.context(self.scopes.current()).kind(),
            ContextKind::RecordType,
            "field declaration outside of a derived type"
        );
        let ty = self.act_on_type_name(ds, span).unwrap_or(None);
        let decl = self.arena.alloc_decl(
            DeclKind::Field { ty, init: None },
            name.to_string(),
            span,
        );
        if self.scopes.declare(name, decl).is_err() {
            self.diag.error(SemaError::DuplicateField {
                name: name.to_string(),
                span,
            });
            return Err(Invalid);
        }
        Ok(decl)
    }

    /// END TYPE文。集めた成分を定義に書き戻してスコープを閉じる。
    pub fn act_on_end_derived_type(&mut self, decl: DeclId) {
        let current = self.scopes.current();
        let ctx = self.scopes.context(current);
        assert_eq!(
            ctx.kind(),
            ContextKind::RecordType,
            "END TYPE outside of a derived type"
        );
        let fields: Vec<DeclId> = ctx.decls().collect();
        self.arena.set_record_fields(decl, fields);
        self.scopes.pop();
    }

    /// 実体宣言。型が決まらなくても型なしの実体として登録し、
    /// 重複だけは最初の宣言を保持して拒否する。
    pub fn act_on_entity_decl(&mut self, ds: &DeclSpec, name: &str, span: Span) -> DeclResult {
        let mut ty = self.act_on_type_name(ds, span).unwrap_or(None);
        if ty.is_none() {
            ty = self.resolve_implicit_type(name);
            if ty.is_none() {
                self.diag.error(SemaError::NoImplicitType {
                    name: name.to_string(),
                    span,
                });
            }
        }
        let decl = self.arena.alloc_decl(
            DeclKind::Variable {
                ty,
                init: None,
                is_parameter: false,
            },
            name.to_string(),
            span,
        );
        self.declare_or_report(name, decl, span)?;
        self.rebind_unresolved_uses(name, decl, ty);
        Ok(decl)
    }

    /// 宣言前に現れていた同名の占位式を、確定した宣言へ解決し直す。
    fn rebind_unresolved_uses(&mut self, name: &str, decl: DeclId, ty: Option<TypeId>) {
        let Some(unit) = self.unit_scopes.last_mut() else {
            return;
        };
        let mut index = 0;
        while index < unit.unresolved_uses.len() {
            if unit.unresolved_uses[index].0 == name {
                let (_, expr) = unit.unresolved_uses.swap_remove(index);
                self.arena.resolve_identifier(expr, decl, ty);
            } else {
                index += 1;
            }
        }
    }

    /// IMPLICIT規則による暗黙の実体宣言。型付けと式の構築の両方から
    /// 使われる。
    pub(crate) fn act_on_implicit_entity_decl(&mut self, name: &str, span: Span) -> DeclResult {
        let ty = self.resolve_implicit_type(name);
        if ty.is_none() {
            self.diag.error(SemaError::NoImplicitType {
                name: name.to_string(),
                span,
            });
            return Err(Invalid);
        }
        let decl = self.arena.alloc_decl(
            DeclKind::Variable {
                ty,
                init: None,
                is_parameter: false,
            },
            name.to_string(),
            span,
        );
        self.declare_or_report(name, decl, span)?;
        Ok(decl)
    }

    /// 頭文字から実体の型を決める。
    ///
    /// 現在の単位のIMPLICIT規則が最優先、次にIMPLICIT NONEなら型なし、
    /// どちらも無ければ既定規則（I〜NはINTEGER、他はREAL）。
    pub(crate) fn resolve_implicit_type(&self, name: &str) -> Option<TypeId> {
        let letter = name.chars().next()?;
        let unit = self.unit_scopes.last()?;
        if let Some(ty) = unit.implicit.resolve(letter) {
            return Some(ty);
        }
        if unit.implicit.is_none() {
            return None;
        }
        Some(match letter.to_ascii_uppercase() {
            'I'..='N' => self.types.integer_type(),
            _ => self.types.real_type(),
        })
    }

    /// 宣言指定子から一意化済みの型を作る。型指定が無ければ`None`。
    pub fn act_on_type_name(
        &mut self,
        ds: &DeclSpec,
        span: Span,
    ) -> Result<Option<TypeId>, Invalid> {
        let spec = match ds.type_spec() {
            None | Some(TypeSpec::Unspecified) => return Ok(None),
            Some(spec) => spec.clone(),
        };
        let mut ty = match spec {
            TypeSpec::Integer => self.types.integer_type(),
            TypeSpec::Real => self.types.real_type(),
            TypeSpec::DoublePrecision => self.types.double_precision_type(),
            TypeSpec::Complex => self.types.complex_type(),
            TypeSpec::Logical => self.types.logical_type(),
            TypeSpec::Character => {
                let len = match ds.length_selector() {
                    Some(expr) => match self.evaluate_as_integer(expr) {
                        Ok(len) => Some(len),
                        Err(Invalid) => {
                            let at = self.arena.expr(expr).span();
                            self.diag.error(SemaError::NotConstant { span: at });
                            None
                        }
                    },
                    None => None,
                };
                self.types.get_character(len)
            }
            TypeSpec::Record(type_name) => match self.resolve_record_type(&type_name, span) {
                Some(ty) => ty,
                None => return Err(Invalid),
            },
            TypeSpec::Unspecified => unreachable!(),
        };

        if let Some(kind_expr) = ds.kind_selector() {
            if let Some(kind) = self.act_on_kind_selector(kind_expr) {
                ty = self.types.get_qualified(ty, Qualifiers::empty(), Some(kind));
            }
        }
        if !ds.dimensions().is_empty() {
            ty = self.types.get_array(ty, ds.dimensions().to_vec());
        }
        if ds.attrs() != 0 {
            let mut quals = Qualifiers::empty();
            quals.add_attr(ds.attrs());
            ty = self.types.get_qualified(ty, quals, None);
        }
        Ok(Some(ty))
    }

    /// 配列次元指定子をアリーナに確保する。
    ///
    /// 明示形状の境界は定数でなくてもよい（寸法引継ぎ配列など）。
    /// 境界が定数かどうかは[`evaluate_bounds`](Self::evaluate_bounds)が
    /// 後から判定する。
    pub fn act_on_array_spec(&mut self, spec: ArraySpec) -> ArraySpecId {
        self.arena.alloc_array_spec(spec)
    }

    /// KIND選択子を整数定数として評価する。
    pub fn act_on_kind_selector(&mut self, expr: ExprId) -> Option<i64> {
        match self.evaluate_as_integer(expr) {
            Ok(kind) => Some(kind),
            Err(Invalid) => {
                let span = self.arena.expr(expr).span();
                self.diag.error(SemaError::NotConstant { span });
                None
            }
        }
    }

    fn resolve_record_type(&mut self, type_name: &str, span: Span) -> Option<TypeId> {
        match self.scopes.resolve(type_name) {
            Some(decl) if matches!(self.arena.decl(decl).kind(), DeclKind::Record { .. }) => {
                Some(self.types.get_record(decl))
            }
            _ => {
                self.diag.error(SemaError::UndeclaredEntity {
                    name: type_name.to_string(),
                    span,
                });
                None
            }
        }
    }

    /// 現在のスコープに登録し、重複なら最初の宣言付きで報告する。
    fn declare_or_report(&mut self, name: &str, decl: DeclId, span: Span) -> Result<(), Invalid> {
        match self.scopes.declare(name, decl) {
            Ok(()) => Ok(()),
            Err(first) => {
                let first_span = self.arena.decl(first).span();
                self.diag.error(SemaError::DuplicateDeclaration {
                    name: name.to_string(),
                    span,
                });
                self.diag.note(SemaError::PreviousDeclaration {
                    name: name.to_string(),
                    span: first_span,
                });
                Err(Invalid)
            }
        }
    }
}
