//! 意味解析テスト
//!
//! プログラム単位の開閉、IMPLICIT規則による型付け、宣言と式の
//! 型検査の動きをテストする。エラーのある入力でも解析が続き、
//! 成果物が取り出せることを確認する。

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use fortlang::ast::{DeclSpec, ExprKind, LetterSpec, Span, StmtKind, TypeSpec};
    use fortlang::sema::SemanticActions;

    fn in_main_program() -> SemanticActions {
        let mut sema = SemanticActions::new(0);
        sema.act_on_main_program("demo", None, Span::dummy());
        sema
    }

    #[test]
    fn test_end_name_mismatch_reports_one_error_and_still_closes() {
        let mut sema = in_main_program();
        sema.act_on_end_main_program(Some("wrong"), None, Span::new(30, 35));
        assert_eq!(sema.error_count(), 1);
        // スコープは閉じられており、成果物は取り出せる
        let unit = sema.finish();
        assert_eq!(unit.arena().stmt_count(), 2);
    }

    #[test]
    fn test_end_name_match_is_case_insensitive() {
        let mut sema = in_main_program();
        sema.act_on_end_main_program(Some("DEMO"), None, Span::dummy());
        assert_eq!(sema.error_count(), 0);
    }

    #[test_case('i', true; "i is integer")]
    #[test_case('n', true; "n is integer")]
    #[test_case('a', false; "a is real")]
    #[test_case('x', false; "x is real")]
    fn test_default_implicit_rule(letter: char, is_integer: bool) {
        let mut sema = in_main_program();
        let name = letter.to_string();
        let expr = sema.act_on_var_expr(&name, Span::dummy()).unwrap();
        let ty = sema.arena().expr(expr).ty().unwrap();
        assert_eq!(sema.types().is_integer_type(ty), is_integer);
        assert_eq!(sema.types().is_real_type(ty), !is_integer);
    }

    #[test]
    fn test_implicit_stmt_overrides_default_rule() {
        let mut sema = in_main_program();
        sema.act_on_implicit_stmt(
            TypeSpec::Real,
            vec![LetterSpec {
                first: 'i',
                last: 'k',
            }],
            None,
            Span::dummy(),
        )
        .unwrap();
        let expr = sema.act_on_var_expr("item", Span::dummy()).unwrap();
        let ty = sema.arena().expr(expr).ty().unwrap();
        assert!(sema.types().is_real_type(ty));
        // 規則の範囲外の文字は既定規則のまま
        let expr = sema.act_on_var_expr("m", Span::dummy()).unwrap();
        let ty = sema.arena().expr(expr).ty().unwrap();
        assert!(sema.types().is_integer_type(ty));
    }

    #[test]
    fn test_implicit_rule_conflict_is_reported() {
        let mut sema = in_main_program();
        sema.act_on_implicit_stmt(
            TypeSpec::Real,
            vec![LetterSpec {
                first: 'i',
                last: 'k',
            }],
            None,
            Span::dummy(),
        )
        .unwrap();
        sema.act_on_implicit_stmt(
            TypeSpec::Logical,
            vec![LetterSpec {
                first: 'j',
                last: 'j',
            }],
            None,
            Span::dummy(),
        )
        .unwrap();
        assert_eq!(sema.error_count(), 1);
    }

    #[test]
    fn test_implicit_none_makes_unmapped_reference_an_error() {
        let mut sema = in_main_program();
        sema.act_on_implicit_none_stmt(None, Span::dummy());
        let expr = sema.act_on_var_expr("q", Span::new(5, 6)).unwrap();
        assert_eq!(sema.error_count(), 1);
        // 未解決の識別子として型なしのまま残る
        assert!(matches!(
            sema.arena().expr(expr).kind(),
            ExprKind::UnresolvedIdentifier(name) if name.as_str() == "q"
        ));
        assert_eq!(sema.arena().expr(expr).ty(), None);
    }

    #[test]
    fn test_later_declaration_resolves_placeholder() {
        let mut sema = in_main_program();
        sema.act_on_implicit_none_stmt(None, Span::dummy());
        let expr = sema.act_on_var_expr("q", Span::new(5, 6)).unwrap();
        assert_eq!(sema.error_count(), 1);

        // 後から宣言が現れると占位式はその場で解決し直される
        let mut ds = DeclSpec::new();
        ds.set_type_spec(TypeSpec::Integer);
        let decl = sema.act_on_entity_decl(&ds, "q", Span::dummy()).unwrap();
        assert!(matches!(
            sema.arena().expr(expr).kind(),
            ExprKind::Var(resolved) if *resolved == decl
        ));
        let ty = sema.arena().expr(expr).ty().unwrap();
        assert!(sema.types().is_integer_type(ty));
        // 使用時のエラーはそのまま残る
        assert_eq!(sema.error_count(), 1);
    }

    #[test]
    fn test_dimension_stmt_builds_array_type() {
        let mut sema = in_main_program();
        let mut ds = DeclSpec::new();
        ds.set_type_spec(TypeSpec::Integer);
        sema.act_on_entity_decl(&ds, "a", Span::dummy()).unwrap();

        let ten = sema
            .act_on_integer_constant("10", None, Span::dummy())
            .unwrap();
        let dim = sema.act_on_array_spec(fortlang::ast::ArraySpec::ExplicitShape {
            lower: None,
            upper: ten,
        });
        sema.act_on_dimension_stmt("a", vec![dim], None, Span::dummy())
            .unwrap();

        let decl = sema.scopes().resolve("a").unwrap();
        let ty = sema.arena().decl(decl).ty().unwrap();
        assert!(sema.types().is_array_type(ty));
        assert_eq!(sema.types().array_rank(ty), Some(1));
        let element = sema.types().element_type(ty).unwrap();
        assert!(sema.types().is_integer_type(element));
        assert_eq!(sema.error_count(), 0);
    }

    #[test]
    fn test_entity_decl_gives_declared_type() {
        let mut sema = in_main_program();
        let mut ds = DeclSpec::new();
        ds.set_type_spec(TypeSpec::DoublePrecision);
        let decl = sema.act_on_entity_decl(&ds, "x", Span::dummy()).unwrap();
        let ty = sema.arena().decl(decl).ty().unwrap();
        assert!(sema.types().is_double_precision_type(ty));
        // 以後の参照は宣言された型を見る
        let expr = sema.act_on_var_expr("x", Span::dummy()).unwrap();
        assert_eq!(sema.arena().expr(expr).ty(), Some(ty));
    }

    #[test]
    fn test_character_decl_with_constant_length() {
        let mut sema = in_main_program();
        let len = sema
            .act_on_integer_constant("8", None, Span::dummy())
            .unwrap();
        let mut ds = DeclSpec::new();
        ds.set_type_spec(TypeSpec::Character);
        ds.set_length_selector(len);
        let decl = sema.act_on_entity_decl(&ds, "name", Span::dummy()).unwrap();
        let ty = sema.arena().decl(decl).ty().unwrap();
        assert!(sema.types().is_character_type(ty));
    }

    #[test]
    fn test_assignment_inserts_numeric_conversion() {
        let mut sema = in_main_program();
        let lhs = sema.act_on_var_expr("i", Span::dummy()).unwrap();
        let rhs = sema
            .act_on_real_constant("2.5", None, Span::dummy())
            .unwrap();
        let stmt = sema.act_on_assignment_stmt(lhs, rhs, None, Span::dummy());
        let StmtKind::Assignment { rhs: stored, .. } = sema.arena().stmt(stmt).kind() else {
            panic!("assignment statement expected");
        };
        // 右辺は整数への暗黙変換で包まれる
        assert!(matches!(
            sema.arena().expr(*stored).kind(),
            ExprKind::ImplicitCast { .. }
        ));
        let ty = sema.arena().expr(*stored).ty().unwrap();
        assert!(sema.types().is_integer_type(ty));
        assert_eq!(sema.error_count(), 0);
    }

    #[test]
    fn test_assignment_rejects_character_to_integer() {
        let mut sema = in_main_program();
        let lhs = sema.act_on_var_expr("i", Span::dummy()).unwrap();
        let rhs = sema.act_on_character_constant("ab", None, Span::dummy());
        sema.act_on_assignment_stmt(lhs, rhs, None, Span::dummy());
        assert_eq!(sema.error_count(), 1);
    }

    #[test]
    fn test_logical_condition_required_in_if() {
        let mut sema = in_main_program();
        let cond = sema
            .act_on_integer_constant("1", None, Span::dummy())
            .unwrap();
        let body = sema.act_on_continue_stmt(None, Span::dummy());
        sema.act_on_if_stmt(
            vec![fortlang::ast::IfBranch {
                condition: Some(cond),
                body,
            }],
            None,
            Span::dummy(),
        );
        assert_eq!(sema.error_count(), 1);
    }

    #[test]
    fn test_binary_promotion_integer_and_real() {
        let mut sema = in_main_program();
        let lhs = sema
            .act_on_integer_constant("2", None, Span::dummy())
            .unwrap();
        let rhs = sema
            .act_on_real_constant("1.5", None, Span::dummy())
            .unwrap();
        let sum = sema
            .act_on_binary_expr(fortlang::ast::BinaryOp::Plus, lhs, rhs, Span::dummy())
            .unwrap();
        let ty = sema.arena().expr(sum).ty().unwrap();
        assert!(sema.types().is_real_type(ty));
        // 整数側に変換が挿入される
        let ExprKind::Binary { lhs: new_lhs, .. } = sema.arena().expr(sum).kind() else {
            panic!("binary expression expected");
        };
        assert!(matches!(
            sema.arena().expr(*new_lhs).kind(),
            ExprKind::ImplicitCast { .. }
        ));
    }

    #[test]
    fn test_integer_power_keeps_base_type() {
        let mut sema = in_main_program();
        let base = sema
            .act_on_real_constant("2.0", None, Span::dummy())
            .unwrap();
        let exp = sema
            .act_on_integer_constant("3", None, Span::dummy())
            .unwrap();
        let power = sema
            .act_on_binary_expr(fortlang::ast::BinaryOp::Power, base, exp, Span::dummy())
            .unwrap();
        let ty = sema.arena().expr(power).ty().unwrap();
        assert!(sema.types().is_real_type(ty));
        // 指数は整数のまま変換されない
        let ExprKind::Binary { rhs, .. } = sema.arena().expr(power).kind() else {
            panic!("binary expression expected");
        };
        assert!(matches!(
            sema.arena().expr(*rhs).kind(),
            ExprKind::IntegerConstant { .. }
        ));
    }

    #[test]
    fn test_subscript_rank_mismatch() {
        let mut sema = in_main_program();
        let mut ds = DeclSpec::new();
        ds.set_type_spec(TypeSpec::Integer);
        sema.act_on_entity_decl(&ds, "v", Span::dummy()).unwrap();
        let target = sema.act_on_var_expr("v", Span::dummy()).unwrap();
        let index = sema
            .act_on_integer_constant("1", None, Span::dummy())
            .unwrap();
        // スカラーへの添字付けはエラー
        let result = sema.act_on_subscript_expr(target, vec![index], Span::dummy());
        assert!(result.is_err());
        assert_eq!(sema.error_count(), 1);
    }

    #[test]
    fn test_derived_type_duplicate_field() {
        let mut sema = in_main_program();
        let record = sema.act_on_derived_type("point", Span::dummy());
        let mut ds = DeclSpec::new();
        ds.set_type_spec(TypeSpec::Real);
        sema.act_on_field_decl(&ds, "x", Span::dummy()).unwrap();
        assert!(sema.act_on_field_decl(&ds, "x", Span::dummy()).is_err());
        sema.act_on_end_derived_type(record);
        assert_eq!(sema.error_count(), 1);
        // 最初の成分だけが残る
        let fortlang::ast::DeclKind::Record { fields } = sema.arena().decl(record).kind() else {
            panic!("record declaration expected");
        };
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_intrinsic_call_arity_check() {
        let mut sema = in_main_program();
        let arg = sema
            .act_on_integer_constant("5", None, Span::dummy())
            .unwrap();
        let call = sema
            .act_on_intrinsic_call_expr(
                fortlang::ast::IntrinsicFunction::Abs,
                vec![arg],
                Span::dummy(),
            )
            .unwrap();
        let ty = sema.arena().expr(call).ty().unwrap();
        assert!(sema.types().is_integer_type(ty));

        let extra = sema
            .act_on_integer_constant("7", None, Span::dummy())
            .unwrap();
        let bad = sema.act_on_intrinsic_call_expr(
            fortlang::ast::IntrinsicFunction::Abs,
            vec![arg, extra],
            Span::dummy(),
        );
        assert!(bad.is_err());
        assert_eq!(sema.error_count(), 1);
    }

    #[test]
    fn test_json_dump_contains_nodes() {
        let mut sema = in_main_program();
        sema.act_on_var_expr("i", Span::dummy()).unwrap();
        sema.act_on_end_main_program(Some("demo"), None, Span::dummy());
        let unit = sema.finish();
        let json = unit.to_json().unwrap();
        assert!(json.contains("Var"));
    }
}
