//! スコープ管理テスト
//!
//! 宣言コンテキストの開閉の規律と、名前の重複・隠蔽の扱いを
//! テストする。スコープの不均衡は診断ではなくパニックになる。

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use fortlang::ast::{DeclSpec, Span, TypeSpec};
    use fortlang::error::ErrorCollector;
    use fortlang::sema::{ContextKind, ScopeTree, SemanticActions};

    fn integer_spec() -> DeclSpec {
        let mut ds = DeclSpec::new();
        ds.set_type_spec(TypeSpec::Integer);
        ds
    }

    #[test]
    fn test_balanced_program_unit() {
        let mut sema = SemanticActions::new(0);
        sema.act_on_main_program("demo", None, Span::dummy());
        sema.act_on_end_main_program(Some("demo"), None, Span::dummy());
        let unit = sema.finish();
        // PROGRAMとEND PROGRAMの2文が残る
        assert_eq!(unit.arena().stmt_count(), 2);
    }

    #[test]
    #[should_panic(expected = "program unit left open")]
    fn test_finish_with_open_unit_panics() {
        let mut sema = SemanticActions::new(0);
        sema.act_on_main_program("demo", None, Span::dummy());
        let _ = sema.finish();
    }

    #[test]
    #[should_panic(expected = "translation unit")]
    fn test_pop_translation_unit_panics() {
        let mut scopes = ScopeTree::new();
        scopes.pop();
    }

    #[test]
    #[should_panic(expected = "not a child of the current context")]
    fn test_push_non_child_panics() {
        let mut scopes = ScopeTree::new();
        let first = scopes.create_context(ContextKind::MainProgram, Some("a".to_string()));
        scopes.push(first);
        let nested = scopes.create_context(ContextKind::Subroutine, Some("b".to_string()));
        scopes.pop();
        // nestedの親はfirstであり、翻訳単位の直下には積めない
        scopes.push(nested);
    }

    #[test]
    fn test_duplicate_declaration_keeps_first() {
        let collector = Rc::new(RefCell::new(ErrorCollector::new()));
        let mut sema = SemanticActions::with_client(Box::new(collector.clone()), 0);
        sema.act_on_main_program("demo", None, Span::dummy());

        let first = sema
            .act_on_entity_decl(&integer_spec(), "x", Span::new(10, 11))
            .unwrap();
        let second = sema.act_on_entity_decl(&integer_spec(), "x", Span::new(20, 21));
        assert!(second.is_err());
        // 最初の宣言がそのまま残り、解決も最初の宣言に落ちる
        assert_eq!(sema.scopes().resolve("x"), Some(first));
        // エラー1件と、最初の宣言位置を指す注記1件
        assert_eq!(sema.error_count(), 1);
        assert_eq!(collector.borrow().errors().len(), 2);
    }

    #[test]
    fn test_nested_context_shadows_enclosing_name() {
        let mut sema = SemanticActions::new(0);
        sema.act_on_main_program("demo", None, Span::dummy());
        let outer = sema
            .act_on_entity_decl(&integer_spec(), "x", Span::dummy())
            .unwrap();

        // 派生型の成分は外側の同名実体を重複なしに隠す
        let record = sema.act_on_derived_type("point", Span::dummy());
        let field = sema
            .act_on_field_decl(&integer_spec(), "x", Span::dummy())
            .unwrap();
        assert_eq!(sema.scopes().resolve("x"), Some(field));

        // 定義を閉じれば外側の実体がまた見える
        sema.act_on_end_derived_type(record);
        assert_eq!(sema.scopes().resolve("x"), Some(outer));
        assert_eq!(sema.error_count(), 0);

        sema.act_on_end_main_program(Some("demo"), None, Span::dummy());
    }

    #[test]
    fn test_inner_unit_shadows_without_error() {
        let mut sema = SemanticActions::new(0);
        sema.act_on_main_program("demo", None, Span::dummy());
        sema.act_on_end_main_program(Some("demo"), None, Span::dummy());

        // 別のプログラム単位では同じ名前を自由に使える
        let sub = sema.act_on_subroutine("work", Span::dummy()).unwrap();
        let arg = sema
            .act_on_subprogram_arg(sub, "x", Span::dummy())
            .unwrap();
        assert_eq!(sema.scopes().resolve("x"), Some(arg));
        sema.act_on_end_subprogram(Some("work"), Span::dummy());
        assert_eq!(sema.error_count(), 0);
    }

    #[test]
    fn test_resolution_does_not_search_host_scope() {
        let mut sema = SemanticActions::new(0);
        sema.act_on_main_program("demo", None, Span::dummy());
        sema.act_on_entity_decl(&integer_spec(), "n", Span::dummy())
            .unwrap();
        sema.act_on_end_main_program(Some("demo"), None, Span::dummy());

        let _sub = sema.act_on_subroutine("work", Span::dummy()).unwrap();
        // 主プログラムのnはここからは見えない
        assert_eq!(sema.scopes().resolve("n"), None);
        sema.act_on_end_subprogram(Some("work"), Span::dummy());
    }
}
