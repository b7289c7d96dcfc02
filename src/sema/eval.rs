//! 定数式の評価
//!
//! 配列境界・KIND選択子・文番号などで必要になる整数定数式の畳み込みと、
//! 式が定数かどうかの判定を行う。評価は副作用を持たず、失敗しても
//! 診断は出さない。診断を出すかどうかは呼び出し側が決める。

use crate::ast::{ArraySpec, ArraySpecId, BinaryOp, ExprId, ExprKind, UnaryOp};

use super::{Invalid, SemanticActions};

impl SemanticActions {
    /// 式が定数式として評価可能かどうか。
    ///
    /// PARAMETER定数への参照はその初期値まで辿って判定する。
    pub fn is_evaluable(&self, expr: ExprId) -> bool {
        match self.arena.expr(expr).kind() {
            ExprKind::IntegerConstant { .. }
            | ExprKind::RealConstant { .. }
            | ExprKind::CharacterConstant { .. }
            | ExprKind::LogicalConstant { .. }
            | ExprKind::BozConstant { .. } => true,
            ExprKind::ComplexConstant { re, im, .. } => {
                self.is_evaluable(*re) && self.is_evaluable(*im)
            }
            ExprKind::Unary { operand, .. } => self.is_evaluable(*operand),
            ExprKind::Binary { lhs, rhs, .. } => self.is_evaluable(*lhs) && self.is_evaluable(*rhs),
            ExprKind::ImplicitCast { operand } => self.is_evaluable(*operand),
            ExprKind::RepeatedConstant { count, value } => {
                self.is_evaluable(*count) && self.is_evaluable(*value)
            }
            ExprKind::Var(decl) => self.parameter_init(*decl).is_some_and(|init| {
                self.is_evaluable(init)
            }),
            ExprKind::Substring { .. }
            | ExprKind::ArrayElement { .. }
            | ExprKind::DefinedOperator { .. }
            | ExprKind::Call { .. }
            | ExprKind::IntrinsicCall { .. }
            | ExprKind::ArrayConstructor(_)
            | ExprKind::ImpliedDo { .. }
            | ExprKind::UnresolvedIdentifier(_) => false,
        }
    }

    /// 整数定数式として畳み込む。
    ///
    /// 非定数・非整数・オーバーフロー・ゼロ除算はすべて[`Invalid`]。
    /// 64ビットを超える整数リテラルも定数折り畳みの対象外とする。
    pub fn evaluate_as_integer(&self, expr: ExprId) -> Result<i64, Invalid> {
        match self.arena.expr(expr).kind() {
            ExprKind::IntegerConstant { value, .. } | ExprKind::BozConstant { value, .. } => {
                value.as_i64().ok_or(Invalid)
            }
            ExprKind::Unary { op, operand } => {
                let v = self.evaluate_as_integer(*operand)?;
                match op {
                    UnaryOp::Plus => Ok(v),
                    UnaryOp::Minus => v.checked_neg().ok_or(Invalid),
                    UnaryOp::Not => Err(Invalid),
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let l = self.evaluate_as_integer(*lhs)?;
                let r = self.evaluate_as_integer(*rhs)?;
                match op {
                    BinaryOp::Plus => l.checked_add(r).ok_or(Invalid),
                    BinaryOp::Minus => l.checked_sub(r).ok_or(Invalid),
                    BinaryOp::Multiply => l.checked_mul(r).ok_or(Invalid),
                    BinaryOp::Divide => {
                        if r == 0 {
                            Err(Invalid)
                        } else {
                            l.checked_div(r).ok_or(Invalid)
                        }
                    }
                    BinaryOp::Power => integer_power(l, r),
                    _ => Err(Invalid),
                }
            }
            ExprKind::ImplicitCast { operand } => self.evaluate_as_integer(*operand),
            ExprKind::Var(decl) => {
                let init = self.parameter_init(*decl).ok_or(Invalid)?;
                self.evaluate_as_integer(init)
            }
            _ => Err(Invalid),
        }
    }

    /// 式を定数評価できなくしている部分式を集める。
    ///
    /// 葉ではない式は子を再帰的に調べ、どの子にも原因が無いのに全体が
    /// 評価できない場合は式自身を原因として報告する。
    pub fn gather_non_evaluable(&self, expr: ExprId, out: &mut Vec<ExprId>) {
        if self.is_evaluable(expr) {
            return;
        }
        let before = out.len();
        match self.arena.expr(expr).kind() {
            ExprKind::ComplexConstant { re, im, .. } => {
                self.gather_non_evaluable(*re, out);
                self.gather_non_evaluable(*im, out);
            }
            ExprKind::Unary { operand, .. } | ExprKind::ImplicitCast { operand } => {
                self.gather_non_evaluable(*operand, out);
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                self.gather_non_evaluable(*lhs, out);
                self.gather_non_evaluable(*rhs, out);
            }
            ExprKind::RepeatedConstant { count, value } => {
                self.gather_non_evaluable(*count, out);
                self.gather_non_evaluable(*value, out);
            }
            ExprKind::Var(decl) => {
                if let Some(init) = self.parameter_init(*decl) {
                    self.gather_non_evaluable(init, out);
                }
            }
            _ => {}
        }
        if out.len() == before {
            out.push(expr);
        }
    }

    /// 配列次元の下限と上限。評価できなければ`None`、下限省略時は1。
    pub fn evaluate_bounds(&self, spec: ArraySpecId) -> Option<(i64, i64)> {
        match self.arena.array_spec(spec) {
            ArraySpec::ExplicitShape { lower, upper } => {
                let lo = match lower {
                    Some(e) => self.evaluate_as_integer(*e).ok()?,
                    None => 1,
                };
                let hi = self.evaluate_as_integer(*upper).ok()?;
                Some((lo, hi))
            }
            ArraySpec::AssumedShape { .. }
            | ArraySpec::DeferredShape
            | ArraySpec::AssumedSize { .. }
            | ArraySpec::ImpliedShape { .. } => None,
        }
    }

    /// PARAMETER定数の初期値。それ以外の実体では`None`。
    fn parameter_init(&self, decl: crate::ast::DeclId) -> Option<ExprId> {
        match self.arena.decl(decl).kind() {
            crate::ast::DeclKind::Variable {
                is_parameter: true,
                init,
                ..
            } => *init,
            _ => None,
        }
    }
}

/// 整数の冪。負の指数と桁あふれは定数折り畳みの対象外。
fn integer_power(base: i64, exponent: i64) -> Result<i64, Invalid> {
    if exponent < 0 {
        return Err(Invalid);
    }
    let mut result: i64 = 1;
    for _ in 0..exponent {
        result = result.checked_mul(base).ok_or(Invalid)?;
    }
    Ok(result)
}
