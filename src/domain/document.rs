use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Display label identifying where a document came from: either a literal
/// tag such as `<string>` or a file path. Origins appear in diagnostics and
/// drive relative include resolution; they are never opened by the engine
/// itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin(String);

impl Origin {
    /// Origin for an in-memory document, conventionally wrapped in angle
    /// brackets (`<string>`).
    pub fn tag(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Origin for a document loaded from a path.
    pub fn path(path: impl AsRef<Path>) -> Self {
        Self(path.as_ref().to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Origin {
    fn from(label: &str) -> Self {
        Self(label.to_owned())
    }
}

/// A source document submitted for conversion. Created per call and owned
/// by the caller; the engine never retains it past the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub origin: Origin,
    pub text: String,
}

impl SourceDocument {
    pub fn new(origin: Origin, text: impl Into<String>) -> Self {
        Self {
            origin,
            text: text.into(),
        }
    }
}
