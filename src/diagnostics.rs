//! 診断の発行経路
//!
//! 意味解析は利用者のソースコードに起因するエラーをここで報告し、
//! そのまま解析を続ける。報告の届け先は[`DiagnosticClient`]として
//! 差し替え可能で、既定では[`ErrorCollector`]に蓄積される。

use serde::{Deserialize, Serialize};

use crate::ast::Span;
use crate::error::{ErrorCollector, SemaError};

/// 診断の深刻度。順序は深刻度の昇順。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// 直前のエラーに付随する注記
    Note,
    Warning,
    Error,
    /// 解析をこれ以上続けられないエラー
    Fatal,
}

/// 診断の届け先。
///
/// テストハーネスや言語サーバーは独自の実装を差し込める。
pub trait DiagnosticClient {
    fn handle(&mut self, severity: Severity, span: Span, error: &SemaError, file_id: usize);
}

impl DiagnosticClient for ErrorCollector {
    fn handle(&mut self, severity: Severity, _span: Span, error: &SemaError, file_id: usize) {
        if severity == Severity::Warning {
            self.add_warning(error.clone(), file_id);
        } else {
            self.add_error(severity, error.clone(), file_id);
        }
    }
}

/// テストハーネスが蓄積結果を外から観察するための共有クライアント。
impl DiagnosticClient for std::rc::Rc<std::cell::RefCell<ErrorCollector>> {
    fn handle(&mut self, severity: Severity, span: Span, error: &SemaError, file_id: usize) {
        self.borrow_mut().handle(severity, span, error, file_id);
    }
}

/// 診断の集約点。
///
/// エラー件数はクライアントの実装とは独立にここで数える。
pub struct DiagnosticEngine {
    client: Box<dyn DiagnosticClient>,
    file_id: usize,
    error_count: usize,
    warning_count: usize,
}

impl DiagnosticEngine {
    pub fn new(file_id: usize) -> Self {
        Self::with_client(Box::new(ErrorCollector::new()), file_id)
    }

    pub fn with_client(client: Box<dyn DiagnosticClient>, file_id: usize) -> Self {
        Self {
            client,
            file_id,
            error_count: 0,
            warning_count: 0,
        }
    }

    /// 診断を1件クライアントへ渡す。
    pub fn report(&mut self, severity: Severity, error: SemaError) {
        match severity {
            Severity::Error | Severity::Fatal => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
            Severity::Note => {}
        }
        self.client
            .handle(severity, error.span(), &error, self.file_id);
    }

    pub fn error(&mut self, error: SemaError) {
        self.report(Severity::Error, error);
    }

    pub fn note(&mut self, error: SemaError) {
        self.report(Severity::Note, error);
    }

    pub fn warn(&mut self, error: SemaError) {
        self.report(Severity::Warning, error);
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn file_id(&self) -> usize {
        self.file_id
    }

    /// 蓄積先のクライアントを取り出す。
    pub fn into_client(self) -> Box<dyn DiagnosticClient> {
        self.client
    }
}
