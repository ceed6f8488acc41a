//! Diagnostics reported during script resolution.
//!
//! The interpreter never panics on malformed script text. Each stage
//! degrades (a broken condition evaluates false, a broken placeholder
//! is left verbatim) and records what it saw here. Callers decide
//! whether to surface, log, or ignore the reports.

use ariadne::{Color, Label, Report, ReportKind, Source};
use std::fmt;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The script asked for something that could not be done.
    Error,
    /// Suspicious input the interpreter recovered from.
    Warning,
}

/// A diagnostic message with source location.
///
/// Spans index into the script text the reporting stage was working on.
/// Earlier stages may rewrite the text, so spans from late stages are a
/// best-effort anchor rather than an exact offset into the author's file.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// How bad it is.
    pub severity: Severity,
    /// Byte range of the offending text.
    pub span: std::ops::Range<usize>,
    /// Human-readable description.
    pub message: String,
    /// Optional short label shown at the span.
    pub label: Option<String>,
}

impl Diagnostic {
    /// Build an error diagnostic.
    pub fn error(span: std::ops::Range<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            span,
            message: message.into(),
            label: None,
        }
    }

    /// Build a warning diagnostic.
    pub fn warning(span: std::ops::Range<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            span,
            message: message.into(),
            label: None,
        }
    }

    /// Attach a label (builder style).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// True for error-severity diagnostics.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{prefix}: {}", self.message)
    }
}

/// Count the error-severity diagnostics in a batch.
pub fn error_count(diagnostics: &[Diagnostic]) -> usize {
    diagnostics.iter().filter(|d| d.is_error()).count()
}

/// Render diagnostics using ariadne for pretty terminal output.
///
/// Spans are clamped to the source length, since stages that rewrite
/// the text can report offsets past the end of the original script.
pub fn render_diagnostics(source: &str, filename: &str, diagnostics: &[Diagnostic]) -> String {
    let mut output = Vec::new();

    for diag in diagnostics {
        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };
        let color = match diag.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };

        let end = diag.span.end.min(source.len());
        let start = diag.span.start.min(end);
        let span = (filename, start..end);
        let mut report = Report::build(kind, span.clone()).with_message(&diag.message);

        let label_text = diag.label.as_deref().unwrap_or(&diag.message);
        report = report.with_label(
            Label::new(span)
                .with_message(label_text)
                .with_color(color),
        );

        report
            .finish()
            .write((filename, Source::from(source)), &mut output)
            .ok();
    }

    String::from_utf8(output).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::error(0..5, "unknown condition: \"_hasGold\"");
        assert_eq!(d.to_string(), "error: unknown condition: \"_hasGold\"");
    }

    #[test]
    fn render_produces_output() {
        let source = "if{_hasGold == 1} You pay. fi{}";
        let diags = vec![
            Diagnostic::error(3..16, "unknown condition: \"_hasGold\"")
                .with_label("not registered"),
        ];
        let output = render_diagnostics(source, "intro.fab", &diags);
        assert!(!output.is_empty());
        assert!(output.contains("unknown condition"));
    }

    #[test]
    fn render_clamps_out_of_range_spans() {
        let output = render_diagnostics("ok", "s.fab", &[Diagnostic::warning(10..40, "late")]);
        assert!(output.contains("late"));
    }

    #[test]
    fn error_count_ignores_warnings() {
        let diags = vec![
            Diagnostic::warning(0..1, "w"),
            Diagnostic::error(0..1, "e"),
        ];
        assert_eq!(error_count(&diags), 1);
    }
}
