//! Include-directive expansion. A line of the form
//! `<!-- include: path/to/file.md -->` is replaced by the contents of the
//! resolved file, expanded recursively. Resolution goes through the
//! caller's [`IncludeResolver`]; every failure becomes one error-grade
//! diagnostic and the directive expands to nothing, so sibling includes are
//! still attempted.

use std::fs;

use metrics::counter;
use tracing::debug;

use crate::domain::{Diagnostic, Origin, Severity};

use super::{DiagnosticSink, Escalation, IncludeResolver, lint};

const DIRECTIVE_OPEN: &str = "<!-- include:";
const DIRECTIVE_CLOSE: &str = "-->";

/// Expand every include directive in `text`, linting each included file
/// against its own origin as it is pulled in.
pub(super) fn expand(
    text: &str,
    origin: &Origin,
    depth_left: usize,
    includes: &dyn IncludeResolver,
    sink: &mut dyn DiagnosticSink,
) -> Result<String, Escalation> {
    let mut expanded = String::with_capacity(text.len());

    for (index, line) in text.lines().enumerate() {
        let line_no = (index + 1) as u32;

        let Some(target) = directive_target(line) else {
            expanded.push_str(line);
            expanded.push('\n');
            continue;
        };

        if depth_left == 0 {
            sink.emit(Diagnostic::new(
                origin.clone(),
                line_no,
                1,
                Severity::Fatal,
                format!("include depth limit exceeded at `{target}`"),
            ))?;
            continue;
        }

        let resolved = match includes.resolve(origin.as_str(), target) {
            Ok(resolved) => resolved,
            Err(failure) => {
                counter!("ricalco_includes_failed_total").increment(1);
                sink.emit(Diagnostic::new(
                    origin.clone(),
                    line_no,
                    1,
                    Severity::Error,
                    format!("cannot include `{target}`: {failure}"),
                ))?;
                continue;
            }
        };

        let contents = match fs::read_to_string(&resolved) {
            Ok(contents) => contents,
            Err(err) => {
                counter!("ricalco_includes_failed_total").increment(1);
                sink.emit(Diagnostic::new(
                    origin.clone(),
                    line_no,
                    1,
                    Severity::Error,
                    format!("cannot include `{target}` (resolved to `{resolved}`): {err}"),
                ))?;
                continue;
            }
        };

        counter!("ricalco_includes_resolved_total").increment(1);
        debug!(
            origin = %origin,
            target,
            resolved = %resolved,
            "Include directive resolved"
        );

        let included_origin = Origin::path(&resolved);
        lint::lint_source(&contents, &included_origin, sink)?;
        let nested = expand(&contents, &included_origin, depth_left - 1, includes, sink)?;
        expanded.push_str(&nested);
        if !nested.ends_with('\n') {
            expanded.push('\n');
        }
    }

    Ok(expanded)
}

fn directive_target(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let inner = trimmed
        .strip_prefix(DIRECTIVE_OPEN)?
        .strip_suffix(DIRECTIVE_CLOSE)?
        .trim();
    if inner.is_empty() { None } else { Some(inner) }
}
