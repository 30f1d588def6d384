//! Error-template state. A "safe" conversion that fails renders a friendly
//! failure page from the installed template, or from the built-in one. The
//! template is itself markup: `$origin` and `$errors` are substituted
//! before it goes through the renderer, and installation validates it by
//! rendering it once with sample values.

use std::sync::RwLock;

use super::lock::{rw_read, rw_write};

/// Built-in failure page markup, used when no template is installed.
pub(crate) const DEFAULT_ERROR_TEMPLATE: &str = "\
# Conversion failed

The document `$origin` could not be converted.

## Diagnostics

$errors
";

/// Last-resort HTML emitted when even the error template cannot be
/// rendered. Kept self-contained so safe calls always return a page with a
/// title.
pub(crate) const FALLBACK_ERROR_HTML: &str = "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Conversion failed</title>\n</head>\n<body>\n<h1>Conversion failed</h1>\n</body>\n</html>\n";

#[derive(Default)]
pub(crate) struct TemplateState {
    template: RwLock<Option<String>>,
}

impl TemplateState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn install(&self, template: Option<String>) {
        *rw_write(&self.template, "error template") = template;
    }

    /// Failure-page markup for one failed conversion, built from the
    /// installed template or the default.
    pub(crate) fn error_source(&self, origin: &str, errors: &[String]) -> String {
        let template = rw_read(&self.template, "error template")
            .clone()
            .unwrap_or_else(|| DEFAULT_ERROR_TEMPLATE.to_owned());
        substitute(&template, origin, errors)
    }
}

/// Replace `$origin` and `$errors` in a template. Errors become one bullet
/// item each.
pub(crate) fn substitute(template: &str, origin: &str, errors: &[String]) -> String {
    let listing = errors
        .iter()
        .map(|error| format!("- {error}"))
        .collect::<Vec<_>>()
        .join("\n");
    template
        .replace("$origin", origin)
        .replace("$errors", &listing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitution_fills_both_placeholders() {
        let source = substitute(
            DEFAULT_ERROR_TEMPLATE,
            "broken.md",
            &["first problem".to_owned(), "second problem".to_owned()],
        );
        assert!(source.contains("`broken.md`"));
        assert!(source.contains("- first problem\n- second problem"));
        assert!(!source.contains("$origin"));
        assert!(!source.contains("$errors"));
    }

    #[test]
    fn installed_template_replaces_the_default() {
        let state = TemplateState::new();
        state.install(Some("# Oops\n\n$errors\n".to_owned()));
        let source = state.error_source("x.md", &["boom".to_owned()]);
        assert!(source.starts_with("# Oops"));
        assert!(source.contains("- boom"));
    }

    #[test]
    fn clearing_restores_the_default_template() {
        let state = TemplateState::new();
        state.install(Some("custom".to_owned()));
        state.install(None);
        let source = state.error_source("x.md", &[]);
        assert!(source.starts_with("# Conversion failed"));
    }
}
