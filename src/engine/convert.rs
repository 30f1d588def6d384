//! The conversion facade: the four entry shapes (string/file × fail-fast
//! "unsafe" and always-succeeds "safe") plus error-template installation.
//! Everything here snapshots the engine configuration at its options-read
//! point; a single call is atomic with respect to configuration changes,
//! but configuration mutation is not linearizable with in-flight calls
//! (single-writer discipline, documented on [`crate::engine::Engine`]).

use std::fs;
use std::path::Path;

use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::Engine;
use super::lock::{rw_read, rw_write};
use super::policy::{PolicyState, ReportOutcome};
use super::template;
use crate::config::RenderOptions;
use crate::domain::{Diagnostic, Origin, SourceDocument};
use crate::render::{
    DiagnosticSink, Escalation, RenderError, RenderIo, RenderOutput, RenderRequest,
};

/// Why a fail-fast conversion returned nothing.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A diagnostic handler aborted the call; the message is exactly the
    /// handler-supplied text.
    #[error("{message}")]
    Escalated { message: String },
    /// The renderer recorded error-grade diagnostics.
    #[error("conversion produced {count} error(s); last: {last}")]
    Diagnostics { count: usize, last: String },
    #[error("cannot read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Render(RenderError),
}

/// Result of a "safe" conversion: a document is always present, failures
/// show up as a non-empty error list (mirrored into the per-channel stack
/// for reverse-index retrieval).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeConversion {
    pub html: String,
    pub errors: Vec<String>,
}

impl SafeConversion {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// The error template failed its self-validation; the previously installed
/// template (or the built-in default) stays active.
#[derive(Debug, Error)]
#[error("error template rejected with {} validation diagnostic(s)", diagnostics.len())]
pub struct TemplateRejected {
    pub diagnostics: Vec<String>,
}

/// Sink wired into every conversion: routes each diagnostic through the
/// policy registry and keeps the rendered text of recorded ones.
struct CollectingSink<'a> {
    policy: &'a PolicyState,
    recorded: Vec<String>,
}

impl DiagnosticSink for CollectingSink<'_> {
    fn emit(&mut self, diagnostic: Diagnostic) -> Result<(), Escalation> {
        match self.policy.report(&diagnostic) {
            ReportOutcome::Recorded => {
                counter!("ricalco_diagnostics_recorded_total").increment(1);
                self.recorded.push(diagnostic.to_string());
                Ok(())
            }
            ReportOutcome::Suppressed => Ok(()),
            ReportOutcome::Escalated(message) => Err(Escalation { message }),
        }
    }
}

/// Sink for renders whose diagnostics nobody acts on (error pages).
struct IgnoreSink;

impl DiagnosticSink for IgnoreSink {
    fn emit(&mut self, _diagnostic: Diagnostic) -> Result<(), Escalation> {
        Ok(())
    }
}

/// Sink for template self-validation: keeps failure-grade diagnostics
/// using the engine-default classification, bypassing user handlers so
/// validation stays deterministic.
#[derive(Default)]
struct ValidationSink {
    recorded: Vec<String>,
}

impl DiagnosticSink for ValidationSink {
    fn emit(&mut self, diagnostic: Diagnostic) -> Result<(), Escalation> {
        if diagnostic.severity.is_failure() {
            self.recorded.push(diagnostic.to_string());
        }
        Ok(())
    }
}

impl Engine {
    /// Convert an in-memory document, failing fast: any error-grade
    /// diagnostic (or escalation) yields `Err`, and the single most recent
    /// error text stays retrievable via [`Engine::last_string_error`].
    pub fn convert_string(
        &self,
        text: &str,
        origin: impl Into<Origin>,
        options_override: Option<&RenderOptions>,
    ) -> Result<String, ConvertError> {
        counter!("ricalco_convert_total", "mode" => "unsafe", "source" => "string").increment(1);
        let options = self.effective_options(options_override);
        let document = SourceDocument::new(origin.into(), text);
        let (result, recorded) = self.run_render(document, options);
        let outcome = finish_unsafe(result, recorded);
        self.store_last_error(&self.channels.string_last, "string", &outcome);
        outcome
    }

    /// Most recent error of a failed [`Engine::convert_string`] call.
    pub fn last_string_error(&self) -> Option<String> {
        rw_read(&self.channels.string_last, "last-error slot").clone()
    }

    /// Convert a file, failing fast like [`Engine::convert_string`].
    pub fn convert_file(
        &self,
        path: impl AsRef<Path>,
        options_override: Option<&RenderOptions>,
    ) -> Result<String, ConvertError> {
        counter!("ricalco_convert_total", "mode" => "unsafe", "source" => "file").increment(1);
        let path = path.as_ref();
        let outcome = match fs::read_to_string(path) {
            Ok(text) => {
                let options = self.effective_options(options_override);
                let document = SourceDocument::new(Origin::path(path), text);
                let (result, recorded) = self.run_render(document, options);
                finish_unsafe(result, recorded)
            }
            Err(source) => Err(ConvertError::Io {
                path: path.to_string_lossy().into_owned(),
                source,
            }),
        };
        self.store_last_error(&self.channels.file_last, "file", &outcome);
        outcome
    }

    /// Most recent error of a failed [`Engine::convert_file`] call.
    pub fn last_file_error(&self) -> Option<String> {
        rw_read(&self.channels.file_last, "last-error slot").clone()
    }

    /// Convert an in-memory document, always producing a page: on failure
    /// the result is an error page built from the installed template (or
    /// the built-in one) and the full ordered error list of this call.
    pub fn safe_convert_string(
        &self,
        origin: impl Into<Origin>,
        text: &str,
        options_override: Option<&RenderOptions>,
    ) -> SafeConversion {
        counter!("ricalco_convert_total", "mode" => "safe", "source" => "string").increment(1);
        self.channels.string_safe.begin();
        let origin = origin.into();
        let options = self.effective_options(options_override);
        let document = SourceDocument::new(origin.clone(), text);
        let (result, recorded) = self.run_render(document, options);
        let conversion = self.finish_safe(origin.as_str(), result, recorded);
        self.channels.string_safe.replace(&conversion.errors);
        conversion
    }

    /// Error of the most recent safe string conversion, `0` being the
    /// newest.
    pub fn safe_string_error(&self, reverse_index: usize) -> Option<String> {
        self.channels.string_safe.get(reverse_index)
    }

    /// Convert a file, always producing a page like
    /// [`Engine::safe_convert_string`]. A read failure counts as one error.
    pub fn safe_convert_file(
        &self,
        path: impl AsRef<Path>,
        options_override: Option<&RenderOptions>,
    ) -> SafeConversion {
        counter!("ricalco_convert_total", "mode" => "safe", "source" => "file").increment(1);
        self.channels.file_safe.begin();
        let path = path.as_ref();
        let origin = Origin::path(path);
        let conversion = match fs::read_to_string(path) {
            Ok(text) => {
                let options = self.effective_options(options_override);
                let document = SourceDocument::new(origin.clone(), text);
                let (result, recorded) = self.run_render(document, options);
                self.finish_safe(origin.as_str(), result, recorded)
            }
            Err(err) => {
                let errors = vec![format!("cannot read `{}`: {err}", origin)];
                SafeConversion {
                    html: self.render_error_page(origin.as_str(), &errors),
                    errors,
                }
            }
        };
        self.channels.file_safe.replace(&conversion.errors);
        conversion
    }

    /// Error of the most recent safe file conversion, `0` being the newest.
    pub fn safe_file_error(&self, reverse_index: usize) -> Option<String> {
        self.channels.file_safe.get(reverse_index)
    }

    /// Install a new error template after validating it through the
    /// renderer with sample placeholder values. Rejection leaves the
    /// previous template in effect.
    pub fn set_error_template(&self, text: &str) -> Result<(), TemplateRejected> {
        self.channels.template_stack.begin();

        let sample = template::substitute(text, "<template-check>", &["sample diagnostic".to_owned()]);
        let request = RenderRequest::new(
            SourceDocument::new(Origin::tag("<error-template>"), sample),
            RenderOptions::default(),
        );
        let mut sink = ValidationSink::default();
        let result = {
            let mut io = RenderIo {
                sink: &mut sink,
                includes: &self.resolver,
            };
            self.renderer.render(&request, &mut io)
        };

        let mut diagnostics = sink.recorded;
        if let Err(err) = result {
            diagnostics.push(err.to_string());
        }

        if diagnostics.is_empty() {
            self.template.install(Some(text.to_owned()));
            debug!(bytes = text.len(), "Error template installed");
            Ok(())
        } else {
            warn!(
                count = diagnostics.len(),
                "Error template rejected by self-validation"
            );
            self.channels.template_stack.replace(&diagnostics);
            Err(TemplateRejected { diagnostics })
        }
    }

    /// Remove the installed template, restoring the built-in failure page.
    pub fn clear_error_template(&self) {
        self.template.install(None);
    }

    /// Validation diagnostic of the most recent rejected template, `0`
    /// being the newest.
    pub fn error_template_error(&self, reverse_index: usize) -> Option<String> {
        self.channels.template_stack.get(reverse_index)
    }

    /// Install or clear the process-wide options override. Returns whether
    /// the effective configuration changed: true the first time a blob is
    /// installed and true when clearing a previously-set blob.
    pub fn set_global_options(&self, options: Option<RenderOptions>) -> bool {
        let mut guard = rw_write(&self.global_options, "global options");
        let changed = match (guard.as_ref(), options.as_ref()) {
            (None, None) => false,
            (Some(previous), Some(next)) => previous != next,
            _ => true,
        };
        *guard = options;
        debug!(changed, "Global options updated");
        changed
    }

    fn effective_options(&self, options_override: Option<&RenderOptions>) -> RenderOptions {
        if let Some(options) = options_override {
            return options.clone();
        }
        rw_read(&self.global_options, "global options")
            .clone()
            .unwrap_or_default()
    }

    fn run_render(
        &self,
        document: SourceDocument,
        options: RenderOptions,
    ) -> (Result<RenderOutput, RenderError>, Vec<String>) {
        let request = RenderRequest::new(document, options);
        let mut sink = CollectingSink {
            policy: &self.policy,
            recorded: Vec::new(),
        };
        let result = {
            let mut io = RenderIo {
                sink: &mut sink,
                includes: &self.resolver,
            };
            self.renderer.render(&request, &mut io)
        };
        (result, sink.recorded)
    }

    fn finish_safe(
        &self,
        origin: &str,
        result: Result<RenderOutput, RenderError>,
        mut errors: Vec<String>,
    ) -> SafeConversion {
        let html = match result {
            Ok(output) if errors.is_empty() => output.html,
            Ok(_) => self.render_error_page(origin, &errors),
            Err(RenderError::Aborted { message }) => {
                errors.push(message);
                self.render_error_page(origin, &errors)
            }
            Err(err) => {
                errors.push(err.to_string());
                self.render_error_page(origin, &errors)
            }
        };
        SafeConversion { html, errors }
    }

    /// Best-effort failure page. Diagnostics emitted while rendering it are
    /// discarded; if the page itself cannot be rendered, a built-in static
    /// page is returned instead.
    fn render_error_page(&self, origin: &str, errors: &[String]) -> String {
        let source = self.template.error_source(origin, errors);
        let request = RenderRequest::new(
            SourceDocument::new(Origin::tag("<error-page>"), source),
            RenderOptions::default(),
        );
        let mut sink = IgnoreSink;
        let result = {
            let mut io = RenderIo {
                sink: &mut sink,
                includes: &self.resolver,
            };
            self.renderer.render(&request, &mut io)
        };
        match result {
            Ok(output) => output.html,
            Err(err) => {
                warn!(error = %err, "Error page render failed; using fallback page");
                template::FALLBACK_ERROR_HTML.to_owned()
            }
        }
    }

    fn store_last_error(
        &self,
        slot: &std::sync::RwLock<Option<String>>,
        channel: &'static str,
        outcome: &Result<String, ConvertError>,
    ) {
        let entry = match outcome {
            Ok(_) => None,
            Err(ConvertError::Escalated { message }) => Some(message.clone()),
            Err(ConvertError::Diagnostics { last, .. }) => Some(last.clone()),
            Err(err) => Some(err.to_string()),
        };
        if let Some(message) = entry.as_deref() {
            debug!(channel, message, "Conversion failed");
        }
        *rw_write(slot, "last-error slot") = entry;
    }
}

fn finish_unsafe(
    result: Result<RenderOutput, RenderError>,
    recorded: Vec<String>,
) -> Result<String, ConvertError> {
    match result {
        Ok(output) => {
            if recorded.is_empty() {
                Ok(output.html)
            } else {
                let count = recorded.len();
                let last = recorded
                    .last()
                    .cloned()
                    .unwrap_or_default();
                Err(ConvertError::Diagnostics { count, last })
            }
        }
        Err(RenderError::Aborted { message }) => Err(ConvertError::Escalated { message }),
        Err(err) => Err(ConvertError::Render(err)),
    }
}
