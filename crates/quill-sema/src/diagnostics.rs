// diagnostics.rs
//
// The diagnostic sink. Errors are collected, never thrown; analysis keeps
// going where it safely can, and the `recovered` flag lets an error path
// hand back partial results without re-reporting.

use quill_identity::{DefnId, Span};

use crate::errors::SemanticError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// One reported diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub error: SemanticError,
    pub span: Span,
    /// Definitions the message refers to (e.g. the earlier definition in
    /// a conflict).
    pub related: Vec<DefnId>,
}

/// Collects diagnostics for one compilation.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    /// Set when an error was noted and subsequently recovered from, so a
    /// failed subtree doesn't suppress unrelated reports.
    recovered: bool,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, error: SemanticError, span: Span) {
        self.report(Severity::Error, error, span, Vec::new());
    }

    pub fn error_with_related(&mut self, error: SemanticError, span: Span, related: Vec<DefnId>) {
        self.report(Severity::Error, error, span, related);
    }

    pub fn warn(&mut self, error: SemanticError, span: Span) {
        self.report(Severity::Warning, error, span, Vec::new());
    }

    fn report(&mut self, severity: Severity, error: SemanticError, span: Span, related: Vec<DefnId>) {
        if severity == Severity::Error {
            self.error_count += 1;
            self.recovered = false;
        }
        tracing::debug!(?severity, %error, "diagnostic");
        self.diagnostics.push(Diagnostic {
            severity,
            error,
            span,
            related,
        });
    }

    /// Note that the current analysis path handled the last error and
    /// later passes may proceed.
    pub fn recovered(&mut self) {
        self.recovered = true;
    }

    pub fn in_recovery(&self) -> bool {
        self.recovered
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_are_collected_not_thrown() {
        let mut sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        sink.error(
            SemanticError::UnresolvedName {
                name: "x".into(),
                span: (0, 1).into(),
            },
            Span::default(),
        );
        sink.warn(
            SemanticError::MemberHidden {
                name: "y".into(),
                span: (0, 1).into(),
            },
            Span::default(),
        );
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.diagnostics().len(), 2);
    }

    #[test]
    fn recovery_flag_resets_on_new_error() {
        let mut sink = DiagnosticSink::new();
        sink.error(
            SemanticError::UnresolvedName {
                name: "x".into(),
                span: (0, 1).into(),
            },
            Span::default(),
        );
        sink.recovered();
        assert!(sink.in_recovery());
        sink.error(
            SemanticError::UnresolvedName {
                name: "y".into(),
                span: (0, 1).into(),
            },
            Span::default(),
        );
        assert!(!sink.in_recovery());
    }
}
