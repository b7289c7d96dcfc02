//! 統一的なエラーハンドリングモジュール
//!
//! このモジュールは、Fortlangフロントエンド全体で使用される統一的な
//! エラー型とエラー報告システムを提供します。利用者のソースコードに
//! 起因するエラーはすべてここに定義された値として報告され、解析は
//! 縮退モードで継続します。内部不変条件の破れはエラー値にはならず、
//! パニックとして扱われます。

use codespan_reporting::diagnostic::{Diagnostic, Label};
use thiserror::Error;

use crate::ast::Span;
use crate::diagnostics::Severity;

/// Fortlangフロントエンドの統一エラー型
#[derive(Error, Debug, Clone)]
pub enum FortError {
    /// 数値リテラルエラー
    #[error("数値リテラルエラー")]
    Literal(#[from] LiteralError),

    /// 意味解析エラー
    #[error("意味解析エラー")]
    Sema(#[from] SemaError),

    /// その他のエラー
    #[error("{0}")]
    Other(String),
}

/// 数値リテラルの解析エラー
#[derive(Error, Debug, Clone)]
pub enum LiteralError {
    #[error("空の数値リテラル")]
    Empty,

    #[error("基数{radix}で不正な桁: '{digit}'")]
    InvalidDigit { digit: char, radix: u32 },

    #[error("不正な実数リテラル: '{text}'")]
    InvalidReal { text: String },
}

/// 意味解析エラーの詳細
#[derive(Error, Debug, Clone)]
pub enum SemaError {
    #[error("{name} は既にこのスコープで宣言されています")]
    DuplicateDeclaration { name: String, span: Span },

    /// 重複宣言に付随する注記。
    #[error("{name} の最初の宣言はここです")]
    PreviousDeclaration { name: String, span: Span },

    #[error("未宣言の実体: {name}")]
    UndeclaredEntity { name: String, span: Span },

    #[error("不正な数値リテラル: {message}")]
    InvalidLiteral { message: String, span: Span },

    #[error("END文の名前が一致しません: {expected}を期待しましたが、{found}が見つかりました")]
    EndNameMismatch {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("文番号 {label} は既に使用されています")]
    DuplicateStatementLabel { label: u32, span: Span },

    #[error("文番号 {label} は定義されていません")]
    UndefinedStatementLabel { label: u32, span: Span },

    #[error("不正な文番号")]
    InvalidStatementLabel { span: Span },

    #[error("定数式が必要です")]
    NotConstant { span: Span },

    #[error("PARAMETER {name} の値が定数式ではありません")]
    ParameterNotConstant { name: String, span: Span },

    #[error("{name} は変数ではないのでPARAMETER属性を付けられません")]
    ParameterOnNonVariable { name: String, span: Span },

    #[error("PARAMETER {name} には既に値が設定されています")]
    DuplicateParameter { name: String, span: Span },

    #[error("型の不一致: {expected}を期待しましたが、{found}が見つかりました")]
    TypeMismatch {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("添字の数が一致しません: {expected}個を期待しましたが、{found}個が見つかりました")]
    SubscriptRankMismatch {
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("{name} は配列ではありません")]
    NotArray { name: String, span: Span },

    #[error("条件式は論理型でなければなりません")]
    ExpectedLogicalCondition { span: Span },

    #[error("成分 {name} は既にこの派生型で宣言されています")]
    DuplicateField { name: String, span: Span },

    #[error("IMPLICIT規則が文字 {letter} で重複しています")]
    ImplicitRuleConflict { letter: char, span: Span },

    #[error("IMPLICIT NONEのもとで {name} に型がありません")]
    NoImplicitType { name: String, span: Span },

    #[error("配列構成子の要素型が揃っていません")]
    NonHomogeneousArrayConstructor { span: Span },

    #[error("繰り返し数は正の定数でなければなりません")]
    RepeatCountNotPositive { span: Span },

    #[error("引数の数が一致しません: {name} は{expected}個を期待しますが、{found}個が渡されました")]
    ArgumentCountMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("演算子 {op} をこのオペランド型に適用できません")]
    InvalidOperandTypes { op: String, span: Span },
}

impl SemaError {
    /// エラーが指すソース位置。
    pub fn span(&self) -> Span {
        match self {
            SemaError::DuplicateDeclaration { span, .. }
            | SemaError::PreviousDeclaration { span, .. }
            | SemaError::UndeclaredEntity { span, .. }
            | SemaError::InvalidLiteral { span, .. }
            | SemaError::EndNameMismatch { span, .. }
            | SemaError::DuplicateStatementLabel { span, .. }
            | SemaError::UndefinedStatementLabel { span, .. }
            | SemaError::InvalidStatementLabel { span }
            | SemaError::NotConstant { span }
            | SemaError::ParameterNotConstant { span, .. }
            | SemaError::ParameterOnNonVariable { span, .. }
            | SemaError::DuplicateParameter { span, .. }
            | SemaError::TypeMismatch { span, .. }
            | SemaError::SubscriptRankMismatch { span, .. }
            | SemaError::NotArray { span, .. }
            | SemaError::ExpectedLogicalCondition { span }
            | SemaError::DuplicateField { span, .. }
            | SemaError::ImplicitRuleConflict { span, .. }
            | SemaError::NoImplicitType { span, .. }
            | SemaError::NonHomogeneousArrayConstructor { span }
            | SemaError::RepeatCountNotPositive { span }
            | SemaError::ArgumentCountMismatch { span, .. }
            | SemaError::InvalidOperandTypes { span, .. } => *span,
        }
    }
}

/// エラー情報とソースコードの位置情報を含むエラー
#[derive(Debug, Clone)]
pub struct DiagnosticError {
    pub severity: Severity,
    pub error: SemaError,
    pub file_id: usize,
}

impl DiagnosticError {
    pub fn new(severity: Severity, error: SemaError, file_id: usize) -> Self {
        Self {
            severity,
            error,
            file_id,
        }
    }

    /// codespan-reportingのDiagnosticに変換
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let span = self.error.span();
        let label = Label::primary(self.file_id, span.start..span.end);
        let label = match &self.error {
            SemaError::DuplicateDeclaration { .. } => label.with_message("重複した宣言"),
            SemaError::PreviousDeclaration { .. } => label.with_message("最初の宣言"),
            SemaError::UndeclaredEntity { .. } => {
                label.with_message("この実体は宣言されていません")
            }
            SemaError::EndNameMismatch { .. } => {
                label.with_message("プログラム単位の名前と一致しません")
            }
            SemaError::DuplicateStatementLabel { .. } => label.with_message("重複した文番号"),
            SemaError::UndefinedStatementLabel { .. } => {
                label.with_message("この文番号はどの文にも付いていません")
            }
            SemaError::NoImplicitType { .. } => {
                label.with_message("明示的な型宣言が必要です")
            }
            _ => label,
        };

        let diagnostic = match self.severity {
            Severity::Note => Diagnostic::note(),
            Severity::Warning => Diagnostic::warning(),
            Severity::Error | Severity::Fatal => Diagnostic::error(),
        };
        diagnostic
            .with_message(self.error.to_string())
            .with_labels(vec![label])
    }
}

/// 複数のエラーを蓄積するためのコレクター
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<DiagnosticError>,
    warnings: Vec<DiagnosticError>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// エラーまたは注記を追加
    pub fn add_error(&mut self, severity: Severity, error: SemaError, file_id: usize) {
        self.errors
            .push(DiagnosticError::new(severity, error, file_id));
    }

    /// 警告を追加
    pub fn add_warning(&mut self, error: SemaError, file_id: usize) {
        self.warnings
            .push(DiagnosticError::new(Severity::Warning, error, file_id));
    }

    /// エラーがあるかどうか
    pub fn has_errors(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.severity >= Severity::Error)
    }

    /// エラーの数（注記は数えない）
    pub fn error_count(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| e.severity >= Severity::Error)
            .count()
    }

    /// 警告の数
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// すべてのエラーを取得
    pub fn errors(&self) -> &[DiagnosticError] {
        &self.errors
    }

    /// すべての警告を取得
    pub fn warnings(&self) -> &[DiagnosticError] {
        &self.warnings
    }

    /// 最初のエラーを取得
    pub fn first_error(&self) -> Option<&DiagnosticError> {
        self.errors.first()
    }
}

/// Result型のエイリアス
pub type FortResult<T> = Result<T, FortError>;
