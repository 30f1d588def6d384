use std::fmt;

use serde::{Deserialize, Serialize};

use super::document::Origin;

/// Severity of a renderer diagnostic. Ordered: anything at `Error` or above
/// fails a fail-fast conversion; `Hint` and `Warning` never fail a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Hint,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    /// Whether a diagnostic of this severity fails a fail-fast call.
    pub fn is_failure(self) -> bool {
        self >= Severity::Error
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Hint => "hint",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single message produced while rendering a document. Line and column
/// are 1-based; 0 means the position is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub origin: Origin,
    pub line: u32,
    pub column: u32,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        origin: Origin,
        line: u32,
        column: u32,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            origin,
            line,
            column,
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}, {}) {}: {}",
            self.origin, self.line, self.column, self.severity, self.message
        )
    }
}

/// What a caller-registered diagnostic handler decided about a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticVerdict {
    /// Swallow the diagnostic entirely; the enclosing call does not fail
    /// because of it.
    Ignore,
    /// Abort the enclosing call; the text becomes its sole retrievable
    /// error.
    Escalate(String),
}
