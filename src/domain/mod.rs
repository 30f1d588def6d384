pub mod diagnostics;
pub mod document;

pub use diagnostics::{Diagnostic, DiagnosticVerdict, Severity};
pub use document::{Origin, SourceDocument};
