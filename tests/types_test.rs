//! 型一意化テスト
//!
//! 型テーブルの一意化と正規化のテストスイート。構造的に等しい型が
//! 常に同じハンドルになること、修飾の有無が正規型の同値性に影響
//! しないことを確認する。

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use fortlang::types::{attr, BuiltinSpec, Qualifiers, TypeAuthority};

    #[test]
    fn test_builtin_singletons() {
        let types = TypeAuthority::new();
        // 組み込み型は生成時にすべて作られ、以後同じハンドルを返す
        assert_eq!(types.integer_type(), types.get_builtin(BuiltinSpec::Integer));
        assert_eq!(types.real_type(), types.get_builtin(BuiltinSpec::Real));
        assert_ne!(types.integer_type(), types.real_type());
        assert_ne!(types.real_type(), types.double_precision_type());
    }

    #[test]
    fn test_character_length_uniquing() {
        let mut types = TypeAuthority::new();
        let c3_a = types.get_character(Some(3));
        let c3_b = types.get_character(Some(3));
        let c4 = types.get_character(Some(4));
        assert_eq!(c3_a, c3_b);
        assert_ne!(c3_a, c4);
        // 既定長は組み込みのCHARACTERそのもの
        assert_eq!(types.get_character(None), types.character_type());
    }

    #[test]
    fn test_pointer_uniquing() {
        let mut types = TypeAuthority::new();
        let int = types.integer_type();
        let real = types.real_type();
        let p_int = types.get_pointer(int, 0);
        assert_eq!(p_int, types.get_pointer(int, 0));
        assert_ne!(p_int, types.get_pointer(real, 0));
        assert_ne!(p_int, types.get_pointer(int, 1));
    }

    #[test]
    fn test_array_uniquing() {
        let mut types = TypeAuthority::new();
        let int = types.integer_type();
        let real = types.real_type();
        let a_int = types.get_array(int, vec![]);
        assert_eq!(a_int, types.get_array(int, vec![]));
        assert_ne!(a_int, types.get_array(real, vec![]));
        assert!(types.is_array_type(a_int));
        assert_eq!(types.element_type(a_int), Some(int));
    }

    #[test]
    fn test_qualified_type_has_unqualified_canonical() {
        let mut types = TypeAuthority::new();
        let int = types.integer_type();
        let mut quals = Qualifiers::empty();
        quals.add_attr(attr::PARAMETER);
        let qualified = types.get_qualified(int, quals, None);
        assert_ne!(qualified, int);
        assert!(!types.is_canonical(qualified));
        assert_eq!(types.canonical(qualified), int);
        // 同じ修飾の組は同じハンドルに畳まれる
        assert_eq!(types.get_qualified(int, quals, None), qualified);
    }

    #[test]
    fn test_qualified_types_do_not_nest() {
        let mut types = TypeAuthority::new();
        let int = types.integer_type();
        let mut save = Qualifiers::empty();
        save.add_attr(attr::SAVE);
        let mut target = Qualifiers::empty();
        target.add_attr(attr::TARGET);

        let once = types.get_qualified(int, save, None);
        let twice = types.get_qualified(once, target, None);
        // 二段目の修飾は一段目と統合され、正規型は変わらない
        assert_eq!(types.canonical(twice), int);
        let mut both = Qualifiers::empty();
        both.add_attr(attr::SAVE);
        both.add_attr(attr::TARGET);
        assert_eq!(twice, types.get_qualified(int, both, None));
    }

    #[test]
    fn test_kind_selector_distinguishes_types() {
        let mut types = TypeAuthority::new();
        let int = types.integer_type();
        let k4 = types.get_qualified(int, Qualifiers::empty(), Some(4));
        let k8 = types.get_qualified(int, Qualifiers::empty(), Some(8));
        assert_ne!(k4, k8);
        assert_eq!(types.canonical(k4), int);
        assert_eq!(types.canonical(k8), int);
        // KINDなし・修飾なしなら基底そのもの
        assert_eq!(types.get_qualified(int, Qualifiers::empty(), None), int);
    }

    #[test]
    fn test_classification_predicates_ignore_qualifiers() {
        let mut types = TypeAuthority::new();
        let int = types.integer_type();
        let k8 = types.get_qualified(int, Qualifiers::empty(), Some(8));
        assert!(types.is_integer_type(k8));
        assert!(types.is_numeric_type(k8));
        assert!(!types.is_real_type(k8));
        assert!(types.is_real_type(types.double_precision_type()));
        assert!(!types.is_logical_type(k8));
    }
}
