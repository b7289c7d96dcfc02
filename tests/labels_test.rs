//! 文番号解決テスト
//!
//! 文番号の前方参照の遅延解決、重複番号と未定義番号の報告、
//! ASSIGN文とGOTO文の参照書き換えをテストする。

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use fortlang::ast::{ExprId, Span, StmtKind};
    use fortlang::sema::SemanticActions;

    fn in_main_program() -> SemanticActions {
        let mut sema = SemanticActions::new(0);
        sema.act_on_main_program("demo", None, Span::dummy());
        sema
    }

    fn label(sema: &mut SemanticActions, text: &str) -> ExprId {
        sema.act_on_integer_constant(text, None, Span::dummy())
            .unwrap()
    }

    #[test]
    fn test_program_statement_label_is_declared() {
        let mut sema = SemanticActions::new(0);
        let one = sema
            .act_on_integer_constant("1", None, Span::dummy())
            .unwrap();
        let program = sema.act_on_main_program("demo", Some(one), Span::dummy());

        // PROGRAM文の番号も単位内の参照から解決できる
        let destination = label(&mut sema, "1");
        let goto = sema.act_on_goto_stmt(destination, None, Span::dummy());
        let StmtKind::Goto { destination } = sema.arena().stmt(goto).kind() else {
            panic!("goto statement expected");
        };
        assert_eq!(destination.target(), Some(program));
        assert_eq!(sema.error_count(), 0);
    }

    #[test]
    fn test_backward_label_reference() {
        let mut sema = in_main_program();
        let ten = label(&mut sema, "10");
        let target = sema.act_on_continue_stmt(Some(ten), Span::dummy());

        let destination = label(&mut sema, "10");
        let goto = sema.act_on_goto_stmt(destination, None, Span::dummy());

        let StmtKind::Goto { destination } = sema.arena().stmt(goto).kind() else {
            panic!("goto statement expected");
        };
        assert_eq!(destination.target(), Some(target));
        assert_eq!(sema.error_count(), 0);
    }

    #[test]
    fn test_forward_label_reference_is_patched_in_place() {
        let mut sema = in_main_program();
        let destination = label(&mut sema, "20");
        let goto = sema.act_on_goto_stmt(destination, None, Span::dummy());

        // 番号付きの文が現れるまでは未解決のまま
        let StmtKind::Goto { destination } = sema.arena().stmt(goto).kind() else {
            panic!("goto statement expected");
        };
        assert!(!destination.is_resolved());

        let twenty = label(&mut sema, "20");
        let target = sema.act_on_continue_stmt(Some(twenty), Span::dummy());

        // 同じノードがその場で書き換えられている
        let StmtKind::Goto { destination } = sema.arena().stmt(goto).kind() else {
            panic!("goto statement expected");
        };
        assert_eq!(destination.target(), Some(target));
        assert_eq!(sema.error_count(), 0);
    }

    #[test]
    fn test_undefined_label_is_reported_at_unit_end() {
        let mut sema = in_main_program();
        let destination = label(&mut sema, "99");
        let goto = sema.act_on_goto_stmt(destination, None, Span::dummy());
        sema.act_on_end_main_program(Some("demo"), None, Span::dummy());
        assert_eq!(sema.error_count(), 1);

        // 参照は未解決のまま成果物に残る
        let unit = sema.finish();
        let StmtKind::Goto { destination } = unit.arena().stmt(goto).kind() else {
            panic!("goto statement expected");
        };
        assert!(!destination.is_resolved());
    }

    #[test]
    fn test_duplicate_label_keeps_first_statement() {
        let mut sema = in_main_program();
        let first_label = label(&mut sema, "10");
        let first = sema.act_on_continue_stmt(Some(first_label), Span::dummy());
        let second_label = label(&mut sema, "10");
        sema.act_on_continue_stmt(Some(second_label), Span::new(40, 48));
        assert_eq!(sema.error_count(), 1);

        // 参照は最初の文に解決される
        let destination = label(&mut sema, "10");
        let goto = sema.act_on_goto_stmt(destination, None, Span::dummy());
        let StmtKind::Goto { destination } = sema.arena().stmt(goto).kind() else {
            panic!("goto statement expected");
        };
        assert_eq!(destination.target(), Some(first));
    }

    #[test]
    fn test_assign_and_assigned_goto() {
        let mut sema = in_main_program();
        let address = label(&mut sema, "30");
        let target_var = sema.act_on_var_expr("i", Span::dummy()).unwrap();
        let assign = sema.act_on_assign_stmt(address, target_var, None, Span::dummy());

        let value_a = label(&mut sema, "30");
        let value_b = label(&mut sema, "40");
        let goto_target = sema.act_on_var_expr("i", Span::dummy()).unwrap();
        let goto = sema.act_on_assigned_goto_stmt(
            goto_target,
            vec![value_a, value_b],
            None,
            Span::dummy(),
        );

        let thirty = label(&mut sema, "30");
        let stmt30 = sema.act_on_continue_stmt(Some(thirty), Span::dummy());
        let forty = label(&mut sema, "40");
        let stmt40 = sema.act_on_continue_stmt(Some(forty), Span::dummy());

        let StmtKind::Assign { address, .. } = sema.arena().stmt(assign).kind() else {
            panic!("assign statement expected");
        };
        assert_eq!(address.target(), Some(stmt30));

        let StmtKind::AssignedGoto { allowed_values, .. } = sema.arena().stmt(goto).kind()
        else {
            panic!("assigned goto statement expected");
        };
        assert_eq!(allowed_values[0].target(), Some(stmt30));
        assert_eq!(allowed_values[1].target(), Some(stmt40));
        assert_eq!(sema.error_count(), 0);
    }

    #[test]
    fn test_assign_target_must_be_integer() {
        let mut sema = in_main_program();
        let address = label(&mut sema, "10");
        let target = sema.act_on_var_expr("x", Span::dummy()).unwrap();
        sema.act_on_assign_stmt(address, target, None, Span::dummy());
        assert_eq!(sema.error_count(), 1);
    }

    #[test]
    fn test_invalid_label_value() {
        let mut sema = in_main_program();
        let zero = label(&mut sema, "0");
        sema.act_on_continue_stmt(Some(zero), Span::dummy());
        assert_eq!(sema.error_count(), 1);
    }

    #[test]
    fn test_labels_are_scoped_to_the_program_unit() {
        let mut sema = in_main_program();
        let ten = label(&mut sema, "10");
        sema.act_on_continue_stmt(Some(ten), Span::dummy());
        sema.act_on_end_main_program(Some("demo"), None, Span::dummy());

        // 次の単位からは前の単位の文番号は見えない
        sema.act_on_subroutine("work", Span::dummy()).unwrap();
        let destination = label(&mut sema, "10");
        sema.act_on_goto_stmt(destination, None, Span::dummy());
        sema.act_on_end_subprogram(Some("work"), Span::dummy());
        assert_eq!(sema.error_count(), 1);
    }
}
