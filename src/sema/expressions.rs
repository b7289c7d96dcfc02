//! 式の意味解析
//!
//! 定数・指示子・演算・呼び出しの各ビルダーを提供する。すべての式は
//! 構築時に型が決まり、数値型の混在は暗黙変換ノードの挿入で揃える。
//! 型の決められない式は型なしのまま残し、検査だけを諦める。

use crate::ast::{
    BinaryOp, DeclKind, ExprId, ExprKind, FloatSemantics, FloatValue, IntValue,
    IntrinsicFunction, Span, UnaryOp,
};
use crate::error::SemaError;
use crate::types::{TypeId, TypeKind};

use super::{ExprResult, Invalid, SemanticActions};

impl SemanticActions {
    /// 整数定数。
    pub fn act_on_integer_constant(
        &mut self,
        text: &str,
        kind: Option<ExprId>,
        span: Span,
    ) -> ExprResult {
        let value = match IntValue::parse(text, 10, &mut self.arena) {
            Ok(value) => value,
            Err(e) => {
                self.diag.error(SemaError::InvalidLiteral {
                    message: e.to_string(),
                    span,
                });
                return Err(Invalid);
            }
        };
        let base = self.types.integer_type();
        let ty = self.constant_type(base, kind);
        Ok(self
            .arena
            .alloc_expr(ExprKind::IntegerConstant { value, kind }, Some(ty), span))
    }

    /// 実数定数。`D`指数の定数は倍精度になる。
    pub fn act_on_real_constant(
        &mut self,
        text: &str,
        kind: Option<ExprId>,
        span: Span,
    ) -> ExprResult {
        let value = match FloatValue::parse(text) {
            Ok(value) => value,
            Err(e) => {
                self.diag.error(SemaError::InvalidLiteral {
                    message: e.to_string(),
                    span,
                });
                return Err(Invalid);
            }
        };
        let base = match value.semantics() {
            FloatSemantics::Double | FloatSemantics::Quad => self.types.double_precision_type(),
            FloatSemantics::Half | FloatSemantics::Single => self.types.real_type(),
        };
        let ty = self.constant_type(base, kind);
        Ok(self
            .arena
            .alloc_expr(ExprKind::RealConstant { value, kind }, Some(ty), span))
    }

    /// 複素数定数。実部と虚部は構築済みの実数定数式。
    pub fn act_on_complex_constant(
        &mut self,
        re: ExprId,
        im: ExprId,
        kind: Option<ExprId>,
        span: Span,
    ) -> ExprId {
        let base = self.types.complex_type();
        let ty = self.constant_type(base, kind);
        self.arena
            .alloc_expr(ExprKind::ComplexConstant { re, im, kind }, Some(ty), span)
    }

    /// 文字定数。型は定数の長さを持つ文字型になる。
    pub fn act_on_character_constant(
        &mut self,
        value: &str,
        kind: Option<ExprId>,
        span: Span,
    ) -> ExprId {
        let len = value.chars().count() as i64;
        let ty = self.types.get_character(Some(len));
        self.arena.alloc_expr(
            ExprKind::CharacterConstant {
                value: value.to_string(),
                kind,
            },
            Some(ty),
            span,
        )
    }

    /// 論理定数。
    pub fn act_on_logical_constant(
        &mut self,
        value: bool,
        kind: Option<ExprId>,
        span: Span,
    ) -> ExprId {
        let base = self.types.logical_type();
        let ty = self.constant_type(base, kind);
        self.arena
            .alloc_expr(ExprKind::LogicalConstant { value, kind }, Some(ty), span)
    }

    /// BOZ定数。基数は2・8・16のいずれか。
    pub fn act_on_boz_constant(&mut self, text: &str, radix: u32, span: Span) -> ExprResult {
        let value = match IntValue::parse(text, radix, &mut self.arena) {
            Ok(value) => value,
            Err(e) => {
                self.diag.error(SemaError::InvalidLiteral {
                    message: e.to_string(),
                    span,
                });
                return Err(Invalid);
            }
        };
        let ty = self.types.integer_type();
        Ok(self
            .arena
            .alloc_expr(ExprKind::BozConstant { value, kind: None }, Some(ty), span))
    }

    /// 繰り返し定数 `count * value`。繰り返し数は正の整数定数。
    pub fn act_on_repeated_constant(
        &mut self,
        count: ExprId,
        value: ExprId,
        span: Span,
    ) -> ExprResult {
        match self.evaluate_as_integer(count) {
            Ok(n) if n > 0 => {}
            _ => {
                let at = self.arena.expr(count).span();
                self.diag
                    .error(SemaError::RepeatCountNotPositive { span: at });
                return Err(Invalid);
            }
        }
        let ty = self.arena.expr(value).ty();
        Ok(self
            .arena
            .alloc_expr(ExprKind::RepeatedConstant { count, value }, ty, span))
    }

    /// 変数参照。未宣言の名前はIMPLICIT規則で暗黙に宣言する。
    /// IMPLICIT NONEのもとではエラーを報告し、未解決の識別子として
    /// ノードだけを残す。
    pub fn act_on_var_expr(&mut self, name: &str, span: Span) -> ExprResult {
        let decl = match self.scopes.resolve(name) {
            Some(decl) => decl,
            None => match self.act_on_implicit_entity_decl(name, span) {
                Ok(decl) => decl,
                Err(Invalid) => {
                    let expr = self.arena.alloc_expr(
                        ExprKind::UnresolvedIdentifier(name.to_string()),
                        None,
                        span,
                    );
                    if let Some(unit) = self.unit_scopes.last_mut() {
                        unit.unresolved_uses.push((name.to_string(), expr));
                    }
                    return Ok(expr);
                }
            },
        };
        let ty = self.arena.decl(decl).ty();
        Ok(self.arena.alloc_expr(ExprKind::Var(decl), ty, span))
    }

    /// 部分列参照。対象は文字型でなければならない。
    pub fn act_on_substring_expr(
        &mut self,
        target: ExprId,
        start: Option<ExprId>,
        end: Option<ExprId>,
        span: Span,
    ) -> ExprResult {
        if let Some(target_ty) = self.arena.expr(target).ty() {
            if !self.types.is_character_type(target_ty) {
                let at = self.arena.expr(target).span();
                self.diag.error(SemaError::TypeMismatch {
                    expected: "CHARACTER".to_string(),
                    found: self.type_name(Some(target_ty)),
                    span: at,
                });
                return Err(Invalid);
            }
        }
        // 両端が定数なら結果の長さも定数になる。
        let len = match (start, end) {
            (Some(s), Some(e)) => match (self.evaluate_as_integer(s), self.evaluate_as_integer(e))
            {
                (Ok(lo), Ok(hi)) if hi >= lo => Some(hi - lo + 1),
                _ => None,
            },
            _ => None,
        };
        let ty = self.types.get_character(len);
        Ok(self.arena.alloc_expr(
            ExprKind::Substring { target, start, end },
            Some(ty),
            span,
        ))
    }

    /// 配列要素参照。添字の数は宣言された次元数と一致すること。
    pub fn act_on_subscript_expr(
        &mut self,
        target: ExprId,
        subscripts: Vec<ExprId>,
        span: Span,
    ) -> ExprResult {
        let Some(target_ty) = self.arena.expr(target).ty() else {
            return Ok(self.arena.alloc_expr(
                ExprKind::ArrayElement { target, subscripts },
                None,
                span,
            ));
        };
        let Some(rank) = self.types.array_rank(target_ty) else {
            let name = match self.arena.expr(target).kind() {
                ExprKind::Var(decl) => self.arena.decl(*decl).name().to_string(),
                _ => "式".to_string(),
            };
            let at = self.arena.expr(target).span();
            self.diag.error(SemaError::NotArray { name, span: at });
            return Err(Invalid);
        };
        if subscripts.len() != rank {
            self.diag.error(SemaError::SubscriptRankMismatch {
                expected: rank,
                found: subscripts.len(),
                span,
            });
            return Err(Invalid);
        }
        let ty = self.types.element_type(target_ty);
        Ok(self
            .arena
            .alloc_expr(ExprKind::ArrayElement { target, subscripts }, ty, span))
    }

    /// 単項演算。`.NOT.`は論理型、符号は数値型にのみ適用できる。
    pub fn act_on_unary_expr(&mut self, op: UnaryOp, operand: ExprId, span: Span) -> ExprResult {
        if let Some(ty) = self.arena.expr(operand).ty() {
            let ok = match op {
                UnaryOp::Not => self.types.is_logical_type(ty),
                UnaryOp::Plus | UnaryOp::Minus => self.types.is_numeric_type(ty),
            };
            if !ok {
                self.diag.error(SemaError::InvalidOperandTypes {
                    op: unary_op_name(op).to_string(),
                    span,
                });
                return Err(Invalid);
            }
        }
        let ty = self.arena.expr(operand).ty();
        Ok(self
            .arena
            .alloc_expr(ExprKind::Unary { op, operand }, ty, span))
    }

    /// 二項演算。数値型の混在は低い側に暗黙変換を挿入して揃える。
    /// 整数の指数は昇格させない。
    pub fn act_on_binary_expr(
        &mut self,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        span: Span,
    ) -> ExprResult {
        let lhs_ty = self.arena.expr(lhs).ty();
        let rhs_ty = self.arena.expr(rhs).ty();
        let (Some(lhs_ty), Some(rhs_ty)) = (lhs_ty, rhs_ty) else {
            return Ok(self
                .arena
                .alloc_expr(ExprKind::Binary { op, lhs, rhs }, None, span));
        };

        if op.is_arithmetic() {
            if !self.types.is_numeric_type(lhs_ty) || !self.types.is_numeric_type(rhs_ty) {
                return self.invalid_operands(op, span);
            }
            if op == BinaryOp::Power && self.types.is_integer_type(rhs_ty) {
                let ty = self.types.canonical(lhs_ty);
                return Ok(self
                    .arena
                    .alloc_expr(ExprKind::Binary { op, lhs, rhs }, Some(ty), span));
            }
            let (lhs, rhs, ty) = self.usual_arithmetic_conversions(lhs, rhs, lhs_ty, rhs_ty);
            return Ok(self
                .arena
                .alloc_expr(ExprKind::Binary { op, lhs, rhs }, Some(ty), span));
        }

        if op == BinaryOp::Concat {
            if !self.types.is_character_type(lhs_ty) || !self.types.is_character_type(rhs_ty) {
                return self.invalid_operands(op, span);
            }
            let ty = self.types.get_character(None);
            return Ok(self
                .arena
                .alloc_expr(ExprKind::Binary { op, lhs, rhs }, Some(ty), span));
        }

        if op.is_comparison() {
            let logical = self.types.logical_type();
            if self.types.is_numeric_type(lhs_ty) && self.types.is_numeric_type(rhs_ty) {
                let (lhs, rhs, _) = self.usual_arithmetic_conversions(lhs, rhs, lhs_ty, rhs_ty);
                return Ok(self.arena.alloc_expr(
                    ExprKind::Binary { op, lhs, rhs },
                    Some(logical),
                    span,
                ));
            }
            if self.types.is_character_type(lhs_ty) && self.types.is_character_type(rhs_ty) {
                return Ok(self.arena.alloc_expr(
                    ExprKind::Binary { op, lhs, rhs },
                    Some(logical),
                    span,
                ));
            }
            return self.invalid_operands(op, span);
        }

        // 論理演算
        if !self.types.is_logical_type(lhs_ty) || !self.types.is_logical_type(rhs_ty) {
            return self.invalid_operands(op, span);
        }
        let ty = self.types.logical_type();
        Ok(self
            .arena
            .alloc_expr(ExprKind::Binary { op, lhs, rhs }, Some(ty), span))
    }

    /// 利用者定義演算子。解決は行わず、型なしのまま保持する。
    pub fn act_on_defined_operator_expr(
        &mut self,
        name: &str,
        args: Vec<ExprId>,
        span: Span,
    ) -> ExprId {
        self.arena.alloc_expr(
            ExprKind::DefinedOperator {
                name: name.to_string(),
                args,
            },
            None,
            span,
        )
    }

    /// 関数・サブルーチン呼び出し。引数の数を宣言と照合する。
    pub fn act_on_call_expr(&mut self, name: &str, args: Vec<ExprId>, span: Span) -> ExprResult {
        let Some(decl) = self.scopes.resolve(name) else {
            self.diag.error(SemaError::UndeclaredEntity {
                name: name.to_string(),
                span,
            });
            return Err(Invalid);
        };
        let ty = match self.arena.decl(decl).kind() {
            DeclKind::Function {
                result_ty,
                args: params,
                ..
            } => {
                if params.len() != args.len() {
                    let expected = params.len();
                    self.diag.error(SemaError::ArgumentCountMismatch {
                        name: name.to_string(),
                        expected,
                        found: args.len(),
                        span,
                    });
                }
                *result_ty
            }
            // EXTERNAL宣言の実体は引数も結果型も未知のまま呼べる。
            DeclKind::External => None,
            _ => {
                self.diag.error(SemaError::TypeMismatch {
                    expected: "関数".to_string(),
                    found: "変数".to_string(),
                    span,
                });
                return Err(Invalid);
            }
        };
        Ok(self.arena.alloc_expr(
            ExprKind::Call {
                function: decl,
                args,
            },
            ty,
            span,
        ))
    }

    /// 組み込み関数呼び出し。引数の数は関数ごとに固定。
    pub fn act_on_intrinsic_call_expr(
        &mut self,
        function: IntrinsicFunction,
        args: Vec<ExprId>,
        span: Span,
    ) -> ExprResult {
        if args.len() != function.arity() {
            self.diag.error(SemaError::ArgumentCountMismatch {
                name: function.name().to_string(),
                expected: function.arity(),
                found: args.len(),
                span,
            });
            return Err(Invalid);
        }
        let ty = self.intrinsic_result_type(function, &args);
        Ok(self
            .arena
            .alloc_expr(ExprKind::IntrinsicCall { function, args }, ty, span))
    }

    /// 配列構成子。要素の型はすべて一致していなければならない。
    pub fn act_on_array_constructor(&mut self, items: Vec<ExprId>, span: Span) -> ExprResult {
        let mut element_ty: Option<TypeId> = None;
        for &item in &items {
            let Some(ty) = self.arena.expr(item).ty() else {
                continue;
            };
            let canon = self.types.canonical(ty);
            match element_ty {
                None => element_ty = Some(canon),
                Some(first) if first != canon => {
                    self.diag
                        .error(SemaError::NonHomogeneousArrayConstructor { span });
                    return Err(Invalid);
                }
                Some(_) => {}
            }
        }
        Ok(self
            .arena
            .alloc_expr(ExprKind::ArrayConstructor(items), element_ty, span))
    }

    /// DO形反復。値並びの中でのみ現れる。
    pub fn act_on_implied_do(
        &mut self,
        var: &str,
        body: Vec<ExprId>,
        init: ExprId,
        limit: ExprId,
        step: Option<ExprId>,
        span: Span,
    ) -> ExprId {
        let ty = body.first().and_then(|&e| self.arena.expr(e).ty());
        self.arena.alloc_expr(
            ExprKind::ImpliedDo {
                var: var.to_string(),
                body,
                init,
                limit,
                step,
            },
            ty,
            span,
        )
    }

    /// 暗黙変換ノードを挿入する。
    pub(crate) fn insert_implicit_cast(&mut self, operand: ExprId, ty: TypeId) -> ExprId {
        let span = self.arena.expr(operand).span();
        self.arena
            .alloc_expr(ExprKind::ImplicitCast { operand }, Some(ty), span)
    }

    /// 数値型の昇格。順位は INTEGER < REAL < DOUBLE PRECISION < COMPLEX。
    fn usual_arithmetic_conversions(
        &mut self,
        lhs: ExprId,
        rhs: ExprId,
        lhs_ty: TypeId,
        rhs_ty: TypeId,
    ) -> (ExprId, ExprId, TypeId) {
        let lhs_rank = self.numeric_rank(lhs_ty);
        let rhs_rank = self.numeric_rank(rhs_ty);
        if lhs_rank == rhs_rank {
            return (lhs, rhs, self.types.canonical(lhs_ty));
        }
        if lhs_rank < rhs_rank {
            let ty = self.types.canonical(rhs_ty);
            (self.insert_implicit_cast(lhs, ty), rhs, ty)
        } else {
            let ty = self.types.canonical(lhs_ty);
            (lhs, self.insert_implicit_cast(rhs, ty), ty)
        }
    }

    fn numeric_rank(&self, ty: TypeId) -> u8 {
        if self.types.is_integer_type(ty) {
            0
        } else if self.types.is_double_precision_type(ty) {
            2
        } else if self.types.is_real_type(ty) {
            1
        } else {
            3
        }
    }

    fn invalid_operands(&mut self, op: BinaryOp, span: Span) -> ExprResult {
        self.diag.error(SemaError::InvalidOperandTypes {
            op: binary_op_name(op).to_string(),
            span,
        });
        Err(Invalid)
    }

    fn intrinsic_result_type(
        &mut self,
        function: IntrinsicFunction,
        args: &[ExprId],
    ) -> Option<TypeId> {
        let arg_ty = args.first().and_then(|&a| self.arena.expr(a).ty());
        match function {
            IntrinsicFunction::Abs | IntrinsicFunction::Mod => {
                arg_ty.map(|ty| self.types.canonical(ty))
            }
            IntrinsicFunction::Sqrt => match arg_ty {
                Some(ty) if self.types.is_complex_type(ty) => Some(self.types.complex_type()),
                Some(ty) if self.types.is_double_precision_type(ty) => {
                    Some(self.types.double_precision_type())
                }
                _ => Some(self.types.real_type()),
            },
            IntrinsicFunction::Len | IntrinsicFunction::Index | IntrinsicFunction::Ichar => {
                Some(self.types.integer_type())
            }
            IntrinsicFunction::Char => Some(self.types.get_character(Some(1))),
        }
    }

    /// 定数の型にKIND選択子の修飾を付ける。
    fn constant_type(&mut self, base: TypeId, kind: Option<ExprId>) -> TypeId {
        let Some(kind_expr) = kind else {
            return base;
        };
        match self.act_on_kind_selector(kind_expr) {
            Some(kind_value) => {
                self.types
                    .get_qualified(base, crate::types::Qualifiers::empty(), Some(kind_value))
            }
            None => base,
        }
    }

    /// 診断メッセージ用の型名。
    pub(crate) fn type_name(&self, ty: Option<TypeId>) -> String {
        let Some(ty) = ty else {
            return "型なし".to_string();
        };
        match self.types.kind(self.types.canonical(ty)) {
            TypeKind::Builtin(spec) => builtin_name(*spec).to_string(),
            TypeKind::Character { len: Some(len) } => format!("CHARACTER(LEN={})", len),
            TypeKind::Character { len: None } => "CHARACTER".to_string(),
            TypeKind::Pointer { base, .. } => {
                format!("{}のポインタ", self.type_name(Some(*base)))
            }
            TypeKind::Array { base, .. } => format!("{}の配列", self.type_name(Some(*base))),
            TypeKind::Record(decl) => format!("TYPE({})", self.arena.decl(*decl).name()),
            TypeKind::Qualified { base, .. } => self.type_name(Some(*base)),
        }
    }
}

fn builtin_name(spec: crate::types::BuiltinSpec) -> &'static str {
    use crate::types::BuiltinSpec;
    match spec {
        BuiltinSpec::Integer => "INTEGER",
        BuiltinSpec::Real => "REAL",
        BuiltinSpec::DoublePrecision => "DOUBLE PRECISION",
        BuiltinSpec::Complex => "COMPLEX",
        BuiltinSpec::Character => "CHARACTER",
        BuiltinSpec::Logical => "LOGICAL",
    }
}

fn unary_op_name(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Plus => "+",
        UnaryOp::Minus => "-",
        UnaryOp::Not => ".NOT.",
    }
}

fn binary_op_name(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Plus => "+",
        BinaryOp::Minus => "-",
        BinaryOp::Multiply => "*",
        BinaryOp::Divide => "/",
        BinaryOp::Power => "**",
        BinaryOp::Concat => "//",
        BinaryOp::Equal => "==",
        BinaryOp::NotEqual => "/=",
        BinaryOp::Less => "<",
        BinaryOp::LessEqual => "<=",
        BinaryOp::Greater => ">",
        BinaryOp::GreaterEqual => ">=",
        BinaryOp::And => ".AND.",
        BinaryOp::Or => ".OR.",
        BinaryOp::Eqv => ".EQV.",
        BinaryOp::Neqv => ".NEQV.",
    }
}
