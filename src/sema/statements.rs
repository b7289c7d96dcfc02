//! 文の意味解析
//!
//! 各文のビルダーは文番号の登録、文番号参照の前方解決、文ごとの
//! 型検査を行ってからアリーナにノードを確保する。エラーのある文も
//! 可能な限りノードとして残し、解析を続ける。

use crate::ast::{
    ArraySpecId, DeclKind, ExprId, FormatItem, FormatSpec, IfBranch, LetterSpec, ModuleNature,
    RenamePair, Span, StmtId, StmtKind, StmtLabelReference, TypeSpec,
};
use crate::error::SemaError;

use super::scope::LabelUser;
use super::{Invalid, SemanticActions, StmtResult};

/// Fortranの文番号が取りうる範囲。
const MAX_STMT_LABEL: i64 = 99999;

impl SemanticActions {
    /// 文に付いた番号を現在の単位の文番号スコープへ登録する。
    /// この番号を待っていた前方参照はここで解決される。
    pub(crate) fn declare_stmt_label(&mut self, stmt_label: Option<ExprId>, stmt: StmtId) {
        let Some(label_expr) = stmt_label else {
            return;
        };
        let span = self.arena.expr(label_expr).span();
        let label = match self.evaluate_as_integer(label_expr) {
            Ok(v) if (1..=MAX_STMT_LABEL).contains(&v) => v as u32,
            _ => {
                self.diag.error(SemaError::InvalidStatementLabel { span });
                return;
            }
        };
        let result = self
            .unit_scopes
            .last_mut()
            .expect("labelled statement outside of any program unit")
            .stmt_labels
            .declare(label, stmt, &mut self.arena);
        if result.is_err() {
            self.diag
                .error(SemaError::DuplicateStatementLabel { label, span });
        }
    }

    /// 文番号参照を解決するか、前方参照として記録する。
    fn bind_label_use(&mut self, label_expr: ExprId, user: LabelUser) {
        let span = self.arena.expr(label_expr).span();
        let label = match self.evaluate_as_integer(label_expr) {
            Ok(v) if (1..=MAX_STMT_LABEL).contains(&v) => v as u32,
            _ => {
                self.diag.error(SemaError::InvalidStatementLabel { span });
                return;
            }
        };
        let resolved = self
            .unit_scopes
            .last()
            .expect("label reference outside of any program unit")
            .stmt_labels
            .resolve(label);
        match resolved {
            Some(target) => match user {
                LabelUser::GotoDestination(id) => self.arena.patch_goto_target(id, target),
                LabelUser::AssignAddress(id) => self.arena.patch_assign_address(id, target),
                LabelUser::AssignedGotoValue(id, index) => {
                    self.arena.patch_assigned_goto_value(id, index, target)
                }
            },
            None => self
                .unit_scope()
                .stmt_labels
                .declare_forward(label, user, span),
        }
    }

    pub fn act_on_use_stmt(
        &mut self,
        nature: ModuleNature,
        module: &str,
        only: bool,
        renames: Vec<RenamePair>,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        let stmt = self.arena.alloc_stmt(
            StmtKind::Use {
                nature,
                module: module.to_string(),
                only,
                renames,
            },
            stmt_label,
            span,
        );
        self.declare_stmt_label(stmt_label, stmt);
        stmt
    }

    pub fn act_on_import_stmt(
        &mut self,
        names: Vec<String>,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        let stmt = self
            .arena
            .alloc_stmt(StmtKind::Import { names }, stmt_label, span);
        self.declare_stmt_label(stmt_label, stmt);
        stmt
    }

    /// 型規則付きのIMPLICIT文。文字範囲の衝突は範囲ごとに報告する。
    pub fn act_on_implicit_stmt(
        &mut self,
        ty: TypeSpec,
        letter_specs: Vec<LetterSpec>,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtResult {
        let mut ds = crate::ast::DeclSpec::new();
        ds.set_type_spec(ty.clone());
        let resolved = match self.act_on_type_name(&ds, span) {
            Ok(Some(resolved)) => resolved,
            _ => return Err(Invalid),
        };

        for spec in &letter_specs {
            let applied = self
                .unit_scope()
                .implicit
                .apply(spec.first, spec.last, resolved);
            if let Err(letter) = applied {
                self.diag
                    .error(SemaError::ImplicitRuleConflict { letter, span });
            }
        }

        let stmt = self.arena.alloc_stmt(
            StmtKind::Implicit {
                ty: Some(ty),
                letter_specs,
                is_none: false,
            },
            stmt_label,
            span,
        );
        self.declare_stmt_label(stmt_label, stmt);
        Ok(stmt)
    }

    /// IMPLICIT NONE文。以後この単位では頭文字規則が無効になる。
    pub fn act_on_implicit_none_stmt(
        &mut self,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        self.unit_scope().implicit.apply_none();
        let stmt = self.arena.alloc_stmt(
            StmtKind::Implicit {
                ty: None,
                letter_specs: Vec::new(),
                is_none: true,
            },
            stmt_label,
            span,
        );
        self.declare_stmt_label(stmt_label, stmt);
        stmt
    }

    /// PARAMETER文。値が定数式でない実体は初期値なしのまま残す。
    /// 変数以外の実体や初期化済みのPARAMETERへの適用は報告して飛ばす。
    pub fn act_on_parameter_stmt(
        &mut self,
        pairs: Vec<(String, ExprId)>,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        let mut decls = Vec::with_capacity(pairs.len());
        for (name, value) in pairs {
            let value_span = self.arena.expr(value).span();
            let decl = match self.scopes.resolve(&name) {
                Some(decl) => decl,
                None => match self.act_on_implicit_entity_decl(&name, value_span) {
                    Ok(decl) => decl,
                    Err(Invalid) => continue,
                },
            };
            match self.arena.decl(decl).kind() {
                DeclKind::Variable {
                    is_parameter: true, ..
                } => {
                    self.diag.error(SemaError::DuplicateParameter {
                        name,
                        span: value_span,
                    });
                    continue;
                }
                DeclKind::Variable { .. } => {}
                _ => {
                    self.diag.error(SemaError::ParameterOnNonVariable {
                        name,
                        span: value_span,
                    });
                    continue;
                }
            }
            if self.is_evaluable(value) {
                self.arena.set_decl_init(decl, value);
                self.arena.mark_parameter(decl);
            } else {
                self.diag.error(SemaError::ParameterNotConstant {
                    name,
                    span: value_span,
                });
            }
            decls.push(decl);
        }
        let stmt = self
            .arena
            .alloc_stmt(StmtKind::Parameter { pairs: decls }, stmt_label, span);
        self.declare_stmt_label(stmt_label, stmt);
        stmt
    }

    /// DIMENSION文。実体の型を配列型に引き上げる。
    pub fn act_on_dimension_stmt(
        &mut self,
        name: &str,
        dims: Vec<ArraySpecId>,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtResult {
        let decl = match self.scopes.resolve(name) {
            Some(decl) => decl,
            None => self.act_on_implicit_entity_decl(name, span)?,
        };
        if let Some(base) = self.arena.decl(decl).ty() {
            let array_ty = self.types.get_array(base, dims);
            self.arena.set_decl_type(decl, array_ty);
        }
        let stmt = self
            .arena
            .alloc_stmt(StmtKind::Dimension { decl }, stmt_label, span);
        self.declare_stmt_label(stmt_label, stmt);
        Ok(stmt)
    }

    pub fn act_on_format_stmt(
        &mut self,
        items: Vec<FormatItem>,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        let stmt = self
            .arena
            .alloc_stmt(StmtKind::Format { items }, stmt_label, span);
        self.declare_stmt_label(stmt_label, stmt);
        stmt
    }

    pub fn act_on_entry_stmt(
        &mut self,
        name: &str,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        let stmt = self.arena.alloc_stmt(
            StmtKind::Entry {
                name: name.to_string(),
            },
            stmt_label,
            span,
        );
        self.declare_stmt_label(stmt_label, stmt);
        stmt
    }

    pub fn act_on_asynchronous_stmt(
        &mut self,
        names: Vec<String>,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        let stmt = self
            .arena
            .alloc_stmt(StmtKind::Asynchronous { names }, stmt_label, span);
        self.declare_stmt_label(stmt_label, stmt);
        stmt
    }

    /// EXTERNAL文。名前ごとにEXTERNAL実体を宣言する。
    pub fn act_on_external_stmt(
        &mut self,
        names: Vec<String>,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        let decls = self.declare_attribute_entities(names, span, DeclKind::External);
        let stmt = self
            .arena
            .alloc_stmt(StmtKind::External { decls }, stmt_label, span);
        self.declare_stmt_label(stmt_label, stmt);
        stmt
    }

    /// INTRINSIC文。
    pub fn act_on_intrinsic_stmt(
        &mut self,
        names: Vec<String>,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        let decls = self.declare_attribute_entities(names, span, DeclKind::Intrinsic);
        let stmt = self
            .arena
            .alloc_stmt(StmtKind::Intrinsic { decls }, stmt_label, span);
        self.declare_stmt_label(stmt_label, stmt);
        stmt
    }

    fn declare_attribute_entities(
        &mut self,
        names: Vec<String>,
        span: Span,
        kind: DeclKind,
    ) -> Vec<crate::ast::DeclId> {
        let mut decls = Vec::with_capacity(names.len());
        for name in names {
            let template = match &kind {
                DeclKind::External => DeclKind::External,
                DeclKind::Intrinsic => DeclKind::Intrinsic,
                _ => unreachable!("attribute statement with a non-attribute kind"),
            };
            let decl = self.arena.alloc_decl(template, name.clone(), span);
            if self.scopes.declare(&name, decl).is_err() {
                self.diag
                    .error(SemaError::DuplicateDeclaration { name, span });
                continue;
            }
            decls.push(decl);
        }
        decls
    }

    pub fn act_on_block_stmt(
        &mut self,
        body: Vec<StmtId>,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        let stmt = self
            .arena
            .alloc_stmt(StmtKind::Block { body }, stmt_label, span);
        self.declare_stmt_label(stmt_label, stmt);
        stmt
    }

    /// GOTO文。行き先の文番号は未出でもよく、後から埋められる。
    pub fn act_on_goto_stmt(
        &mut self,
        destination: ExprId,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        let stmt = self.arena.alloc_stmt(
            StmtKind::Goto {
                destination: StmtLabelReference::unresolved(),
            },
            stmt_label,
            span,
        );
        self.declare_stmt_label(stmt_label, stmt);
        self.bind_label_use(destination, LabelUser::GotoDestination(stmt));
        stmt
    }

    /// ASSIGN文。代入先は整数変数でなければならない。
    pub fn act_on_assign_stmt(
        &mut self,
        address: ExprId,
        target: ExprId,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        if let Some(ty) = self.arena.expr(target).ty() {
            if !self.types.is_integer_type(ty) {
                let target_span = self.arena.expr(target).span();
                self.diag.error(SemaError::TypeMismatch {
                    expected: "INTEGER".to_string(),
                    found: self.type_name(Some(ty)),
                    span: target_span,
                });
            }
        }
        let stmt = self.arena.alloc_stmt(
            StmtKind::Assign {
                address: StmtLabelReference::unresolved(),
                target,
            },
            stmt_label,
            span,
        );
        self.declare_stmt_label(stmt_label, stmt);
        self.bind_label_use(address, LabelUser::AssignAddress(stmt));
        stmt
    }

    /// 割り当て形GOTO文。許容並びの各文番号を個別に解決する。
    pub fn act_on_assigned_goto_stmt(
        &mut self,
        target: ExprId,
        allowed: Vec<ExprId>,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        let stmt = self.arena.alloc_stmt(
            StmtKind::AssignedGoto {
                target,
                allowed_values: vec![StmtLabelReference::unresolved(); allowed.len()],
            },
            stmt_label,
            span,
        );
        self.declare_stmt_label(stmt_label, stmt);
        for (index, label_expr) in allowed.into_iter().enumerate() {
            self.bind_label_use(label_expr, LabelUser::AssignedGotoValue(stmt, index));
        }
        stmt
    }

    /// IF構文。各分岐の条件式は論理型でなければならない。
    pub fn act_on_if_stmt(
        &mut self,
        branches: Vec<IfBranch>,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        for branch in &branches {
            if let Some(condition) = branch.condition {
                if let Some(ty) = self.arena.expr(condition).ty() {
                    if !self.types.is_logical_type(ty) {
                        let at = self.arena.expr(condition).span();
                        self.diag
                            .error(SemaError::ExpectedLogicalCondition { span: at });
                    }
                }
            }
        }
        let stmt = self
            .arena
            .alloc_stmt(StmtKind::If { branches }, stmt_label, span);
        self.declare_stmt_label(stmt_label, stmt);
        stmt
    }

    pub fn act_on_continue_stmt(&mut self, stmt_label: Option<ExprId>, span: Span) -> StmtId {
        let stmt = self.arena.alloc_stmt(StmtKind::Continue, stmt_label, span);
        self.declare_stmt_label(stmt_label, stmt);
        stmt
    }

    pub fn act_on_stop_stmt(
        &mut self,
        code: Option<ExprId>,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        let stmt = self
            .arena
            .alloc_stmt(StmtKind::Stop { code }, stmt_label, span);
        self.declare_stmt_label(stmt_label, stmt);
        stmt
    }

    /// 代入文。数値型同士の不一致は右辺への暗黙変換で埋め、
    /// それ以外の不一致はエラー。
    pub fn act_on_assignment_stmt(
        &mut self,
        lhs: ExprId,
        rhs: ExprId,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        let rhs = self.convert_for_assignment(lhs, rhs);
        let stmt = self
            .arena
            .alloc_stmt(StmtKind::Assignment { lhs, rhs }, stmt_label, span);
        self.declare_stmt_label(stmt_label, stmt);
        stmt
    }

    fn convert_for_assignment(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        let (Some(lhs_ty), Some(rhs_ty)) = (self.arena.expr(lhs).ty(), self.arena.expr(rhs).ty())
        else {
            return rhs;
        };
        let lhs_canon = self.types.canonical(lhs_ty);
        let rhs_canon = self.types.canonical(rhs_ty);
        if lhs_canon == rhs_canon {
            return rhs;
        }
        if self.types.is_numeric_type(lhs_ty) && self.types.is_numeric_type(rhs_ty) {
            return self.insert_implicit_cast(rhs, lhs_canon);
        }
        if self.types.is_character_type(lhs_ty) && self.types.is_character_type(rhs_ty) {
            return rhs;
        }
        let at = self.arena.expr(rhs).span();
        self.diag.error(SemaError::TypeMismatch {
            expected: self.type_name(Some(lhs_ty)),
            found: self.type_name(Some(rhs_ty)),
            span: at,
        });
        rhs
    }

    pub fn act_on_print_stmt(
        &mut self,
        format: FormatSpec,
        items: Vec<ExprId>,
        stmt_label: Option<ExprId>,
        span: Span,
    ) -> StmtId {
        let stmt = self
            .arena
            .alloc_stmt(StmtKind::Print { format, items }, stmt_label, span);
        self.declare_stmt_label(stmt_label, stmt);
        stmt
    }
}
