//! Ricalco: an embeddable markup-to-HTML conversion engine.
//!
//! Host applications submit a document by value or by path and receive
//! rendered HTML, choosing between two error protocols:
//!
//! - **fail-fast** ([`convert_string`], [`convert_file`]): `Err` on the
//!   first error-grade diagnostic, with a single retrievable error text;
//! - **safe** ([`safe_convert_string`], [`safe_convert_file`]): always a
//!   page (the rendering, or a failure page built from a configurable
//!   error template) plus the full ordered diagnostic list of the call.
//!
//! Two cross-cutting concerns are overridable through layered callbacks:
//! diagnostic handling (host/native handler slots, native winning while
//! installed) and include-file resolution (native, then host, then a
//! relative join against the including file, with built-in `Nil` and
//! `Unrestricted` resolvers). See [`engine`] for the configuration
//! surface and its single-writer discipline.

pub mod config;
pub mod domain;
pub mod engine;
pub mod render;
pub mod telemetry;
pub mod version;

pub use config::{OptionsError, RenderOptions};
pub use domain::{Diagnostic, DiagnosticVerdict, Origin, Severity, SourceDocument};
pub use engine::{
    ConvertError, DiagnosticHandler, Engine, HostResolver, NativeFileCallback, ResolveBuffer,
    SafeConversion, TemplateRejected, convert_file, convert_string, engine, error_template_error,
    last_file_error, last_string_error, safe_convert_file, safe_convert_string, safe_file_error,
    safe_string_error, set_error_template, set_file_buffer_size, set_global_options,
    set_host_diagnostic_handler, set_host_file_resolver, set_native_diagnostic_handler,
    set_native_file_resolver,
};
pub use render::{RenderOutput, RenderRequest, RenderService, ResolveFailure};
pub use version::{version, version_parts};
