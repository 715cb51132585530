use std::fmt;

use clap::ValueEnum;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum EvalMode {
    #[default]
    Strict,
    ErrorValues,
}

impl EvalMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::ErrorValues => "error-values",
        }
    }
}

impl fmt::Display for EvalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpan {
    pub line: usize,
    pub column: usize,
}

impl SourceSpan {
    pub fn locate(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = source.get(..offset).unwrap_or(source);
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |index| index + 1);
        let column = before[line_start..].chars().count() + 1;
        Self { line, column }
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckErrorKind {
    Parse,
    RuleViolation,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", .span.as_ref().map(|span| format!(" at {span}")).unwrap_or_default())]
pub struct CheckError {
    kind: CheckErrorKind,
    message: String,
    span: Option<SourceSpan>,
}

impl CheckError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: CheckErrorKind::Parse,
            message: message.into(),
            span: None,
        }
    }

    pub fn rule_violation(message: impl Into<String>) -> Self {
        Self {
            kind: CheckErrorKind::RuleViolation,
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    pub fn kind(&self) -> CheckErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn span(&self) -> Option<&SourceSpan> {
        self.span.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::{CheckError, CheckErrorKind, EvalMode, SourceSpan};

    #[test]
    fn locates_offsets_by_line_and_column() {
        let source = "let x = 1 in\n  x +\n";
        assert_eq!(
            SourceSpan::locate(source, 0),
            SourceSpan { line: 1, column: 1 }
        );
        assert_eq!(
            SourceSpan::locate(source, 4),
            SourceSpan { line: 1, column: 5 }
        );
        assert_eq!(
            SourceSpan::locate(source, 15),
            SourceSpan { line: 2, column: 3 }
        );
        assert_eq!(
            SourceSpan::locate(source, source.len() + 10),
            SourceSpan { line: 3, column: 1 }
        );
    }

    #[test]
    fn displays_span_after_message() {
        let error = CheckError::parse("expected ')'").with_span(SourceSpan { line: 2, column: 7 });
        assert_eq!(error.kind(), CheckErrorKind::Parse);
        assert_eq!(error.to_string(), "expected ')' at 2:7");
        assert_eq!(
            CheckError::rule_violation("judgment is not derivable").to_string(),
            "judgment is not derivable"
        );
    }

    #[test]
    fn eval_mode_names_match_cli_values() {
        assert_eq!(EvalMode::default(), EvalMode::Strict);
        assert_eq!(EvalMode::ErrorValues.to_string(), "error-values");
    }
}
