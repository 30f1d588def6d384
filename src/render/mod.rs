//! Rendering pipeline: the markup-to-HTML collaborator the conversion
//! facade drives. The pipeline reports everything it notices through a
//! caller-supplied [`DiagnosticSink`] and satisfies include directives
//! through a caller-supplied [`IncludeResolver`]; it never decides on its
//! own whether a conversion failed.

mod include;
mod lint;
mod pipeline;
mod sanitize;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RenderOptions;
use crate::domain::{Diagnostic, SourceDocument};

pub use pipeline::MarkupRenderService;

/// Rendering request passed into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub document: SourceDocument,
    pub options: RenderOptions,
}

impl RenderRequest {
    pub fn new(document: SourceDocument, options: RenderOptions) -> Self {
        Self { document, options }
    }
}

/// Result of a successful (possibly diagnostic-laden) pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutput {
    /// The rendered HTML: the bare body, or a full document when
    /// `full_page` is set.
    pub html: String,
    /// Title extracted from the first heading, when one exists.
    pub title: Option<String>,
}

/// A caller-registered handler explicitly aborted the render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Escalation {
    pub message: String,
}

/// Structured errors surfaced by the rendering pipeline itself. Diagnostics
/// about the *document* flow through the sink instead; these variants cover
/// the pipeline being unable to produce output at all.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// A diagnostic handler escalated; the escalated text supersedes every
    /// other error for the enclosing call.
    #[error("{message}")]
    Aborted { message: String },
    #[error("HTML generation failed: {message}")]
    Format { message: String },
}

impl From<Escalation> for RenderError {
    fn from(escalation: Escalation) -> Self {
        RenderError::Aborted {
            message: escalation.message,
        }
    }
}

/// Where pipeline diagnostics go. Returning `Err` aborts the render
/// immediately; the pipeline propagates the escalation without emitting
/// anything further.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic) -> Result<(), Escalation>;
}

/// Maps an include target, relative to the including document's origin, to
/// a path the pipeline can read. Implemented by the engine's file
/// resolution registry.
pub trait IncludeResolver {
    fn resolve(&self, current_origin: &str, target: &str) -> Result<String, ResolveFailure>;
}

/// Why a resolver declined an include target.
#[derive(Debug, Clone, Error)]
pub enum ResolveFailure {
    #[error("native file handler declined `{target}`")]
    NativeDeclined { target: String },
    #[error("host file handler declined `{target}`")]
    HostDeclined { target: String },
    #[error("file resolution is disabled")]
    Disabled,
}

/// External collaborators the pipeline needs for one render.
pub struct RenderIo<'a> {
    pub sink: &'a mut dyn DiagnosticSink,
    pub includes: &'a dyn IncludeResolver,
}

/// The markup renderer seam. Implementations must be synchronous: a render
/// runs to completion (or escalation) on the calling thread.
pub trait RenderService: Send + Sync {
    fn render(
        &self,
        request: &RenderRequest,
        io: &mut RenderIo<'_>,
    ) -> Result<RenderOutput, RenderError>;
}
