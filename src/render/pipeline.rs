//! Default comrak-based rendering pipeline: lint, include expansion,
//! markdown parsing, HTML generation, sanitisation and page assembly.

use comrak::{Arena, format_html, parse_document};
use tracing::debug;

use super::{
    DiagnosticSink, Escalation, RenderError, RenderIo, RenderOutput, RenderRequest, RenderService,
    include, lint, sanitize,
};
use crate::domain::{Diagnostic, Origin, Severity};

/// The built-in markup renderer. Stateless apart from the preconfigured
/// sanitizer; per-request options come from the request itself.
pub struct MarkupRenderService {
    sanitizer: ammonia::Builder<'static>,
}

impl MarkupRenderService {
    pub fn new() -> Self {
        Self {
            sanitizer: sanitize::build_sanitizer(),
        }
    }
}

impl Default for MarkupRenderService {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderService for MarkupRenderService {
    fn render(
        &self,
        request: &RenderRequest,
        io: &mut RenderIo<'_>,
    ) -> Result<RenderOutput, RenderError> {
        let origin = &request.document.origin;

        lint::lint_source(&request.document.text, origin, io.sink)?;

        let expanded = include::expand(
            &request.document.text,
            origin,
            request.options.max_include_depth,
            io.includes,
            io.sink,
        )?;

        let title = lint::first_heading(&expanded);
        if title.is_none() {
            emit_missing_heading_hint(origin, io.sink)?;
        }

        let body = markdown_stage(&expanded, request)?;
        let body = if request.options.sanitize {
            self.sanitizer.clean(&body).to_string()
        } else {
            body
        };

        debug!(
            origin = %origin,
            bytes_in = request.document.text.len(),
            bytes_out = body.len(),
            "Document rendered"
        );

        let html = if request.options.full_page {
            assemble_page(title.as_deref().unwrap_or_else(|| origin.as_str()), &body)
        } else {
            body
        };

        Ok(RenderOutput { html, title })
    }
}

fn emit_missing_heading_hint(
    origin: &Origin,
    sink: &mut dyn DiagnosticSink,
) -> Result<(), Escalation> {
    sink.emit(Diagnostic::new(
        origin.clone(),
        0,
        0,
        Severity::Hint,
        "document has no heading; the origin label becomes the page title",
    ))
}

fn markdown_stage(markdown: &str, request: &RenderRequest) -> Result<String, RenderError> {
    let options = request.options.comrak_options();
    let arena = Arena::new();
    let root = parse_document(&arena, markdown, &options);

    let mut html = String::new();
    format_html(root, &options, &mut html).map_err(|err| RenderError::Format {
        message: err.to_string(),
    })?;
    Ok(html)
}

fn assemble_page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_text(title),
        body
    )
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
