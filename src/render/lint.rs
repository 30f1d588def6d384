//! Pre-parse diagnostic pass. The markdown parser itself accepts anything,
//! so the constructs a strict caller cares about are checked here, before
//! the text reaches it. Every finding is routed through the sink; the pass
//! never fails a render on its own.

use crate::domain::{Diagnostic, Origin, Severity};

use super::{DiagnosticSink, Escalation};

/// Scan one document (root or included file) for deterministic problems:
/// unterminated code fences, unterminated inline code spans and links with
/// an empty destination.
pub(super) fn lint_source(
    text: &str,
    origin: &Origin,
    sink: &mut dyn DiagnosticSink,
) -> Result<(), Escalation> {
    let mut open_fence: Option<(u32, &str)> = None;

    for (index, line) in text.lines().enumerate() {
        let line_no = (index + 1) as u32;
        let trimmed = line.trim_start();

        if let Some(marker) = fence_marker(trimmed) {
            match open_fence {
                Some((_, open_marker)) if trimmed.starts_with(open_marker) => {
                    open_fence = None;
                }
                Some(_) => {}
                None => open_fence = Some((line_no, marker)),
            }
            continue;
        }

        if open_fence.is_some() {
            continue;
        }

        if let Some(column) = unterminated_inline_code(line) {
            sink.emit(Diagnostic::new(
                origin.clone(),
                line_no,
                column,
                Severity::Error,
                "unterminated inline code span",
            ))?;
        }

        if let Some(column) = empty_link_destination(line) {
            sink.emit(Diagnostic::new(
                origin.clone(),
                line_no,
                column,
                Severity::Warning,
                "link has an empty destination",
            ))?;
        }
    }

    if let Some((line_no, _)) = open_fence {
        sink.emit(Diagnostic::new(
            origin.clone(),
            line_no,
            1,
            Severity::Error,
            "unterminated code fence",
        ))?;
    }

    Ok(())
}

/// Title text of the first ATX heading, if any. The pipeline turns a
/// missing heading into a hint on the root document and falls back to the
/// origin label for the page title.
pub(super) fn first_heading(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let trimmed = line.trim_start();
        let stripped = trimmed.trim_start_matches('#');
        if stripped.len() < trimmed.len() && stripped.starts_with(' ') {
            let title = stripped.trim().trim_end_matches('#').trim();
            if !title.is_empty() {
                return Some(title.to_owned());
            }
        }
        None
    })
}

fn fence_marker(trimmed: &str) -> Option<&'static str> {
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

/// Column (1-based) of the last unmatched backtick, or `None` when every
/// inline code span on the line is closed. Escaped backticks do not count.
fn unterminated_inline_code(line: &str) -> Option<u32> {
    let mut last_unmatched = None;
    let mut open = false;
    let mut escaped = false;

    for (offset, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '`' => {
                open = !open;
                if open {
                    last_unmatched = Some((offset + 1) as u32);
                }
            }
            _ => {}
        }
    }

    if open { last_unmatched } else { None }
}

/// Column of the first `](...)` whose destination is empty or whitespace.
fn empty_link_destination(line: &str) -> Option<u32> {
    let mut search_from = 0;
    while let Some(found) = line[search_from..].find("](") {
        let open = search_from + found + 2;
        let rest = &line[open..];
        if let Some(close) = rest.find(')') {
            if rest[..close].trim().is_empty() {
                return Some((open + 1) as u32);
            }
            search_from = open + close + 1;
        } else {
            break;
        }
    }
    None
}
