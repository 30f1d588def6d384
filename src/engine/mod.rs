//! The conversion engine: one configuration surface (diagnostic policy,
//! file resolver, global options, error template) plus the conversion
//! facade that drives the renderer with that configuration wired in.
//!
//! # Concurrency contract
//!
//! Conversions are synchronous and blocking; the engine spawns nothing.
//! Each conversion snapshots the configuration at its options-read point
//! and is atomic with respect to it, but configuration mutators
//! (`set_global_options`, `set_error_template`, the handler and resolver
//! setters) are **not linearizable with in-flight conversions**: treat
//! them as requiring a single writer with no conversion running. Handlers
//! are invoked synchronously on the converting thread and must not start a
//! new top-level conversion themselves.

mod convert;
mod lock;
mod policy;
mod resolver;
mod stack;
mod template;

use std::path::Path;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::config::RenderOptions;
use crate::render::{MarkupRenderService, RenderService};

pub use convert::{ConvertError, SafeConversion, TemplateRejected};
pub use policy::{DiagnosticHandler, PolicyState, ReportOutcome};
pub use resolver::{
    DEFAULT_RESOLVE_BUFFER_SIZE, HostFileCallback, HostResolver, NativeFileCallback,
    ResolveBuffer, ResolverState,
};
pub use stack::ErrorStack;

/// Per-channel error bookkeeping. Fail-fast channels keep one overwritten
/// slot; safe channels keep the full ordered stack of their latest call.
struct Channels {
    string_last: RwLock<Option<String>>,
    file_last: RwLock<Option<String>>,
    string_safe: ErrorStack,
    file_safe: ErrorStack,
    template_stack: ErrorStack,
}

impl Channels {
    fn new() -> Self {
        Self {
            string_last: RwLock::new(None),
            file_last: RwLock::new(None),
            string_safe: ErrorStack::new(),
            file_safe: ErrorStack::new(),
            template_stack: ErrorStack::new(),
        }
    }
}

/// An independent conversion engine. Most embedders use the process-wide
/// instance behind [`engine()`] and the module-level convenience functions;
/// tests and multi-tenant hosts can construct their own to isolate
/// configuration.
pub struct Engine {
    renderer: Box<dyn RenderService>,
    policy: PolicyState,
    resolver: ResolverState,
    global_options: RwLock<Option<RenderOptions>>,
    template: template::TemplateState,
    channels: Channels,
}

impl Engine {
    /// Engine with the built-in markup renderer.
    pub fn new() -> Self {
        Self::with_renderer(Box::new(MarkupRenderService::new()))
    }

    /// Engine with a caller-supplied renderer implementation.
    pub fn with_renderer(renderer: Box<dyn RenderService>) -> Self {
        Self {
            renderer,
            policy: PolicyState::new(),
            resolver: ResolverState::new(),
            global_options: RwLock::new(None),
            template: template::TemplateState::new(),
            channels: Channels::new(),
        }
    }

    /// Register or clear the host diagnostic handler.
    pub fn set_host_diagnostic_handler(&self, handler: Option<Arc<DiagnosticHandler>>) {
        self.policy.set_host_handler(handler);
    }

    /// Register or clear the native diagnostic handler. While installed it
    /// bypasses the host handler entirely.
    pub fn set_native_diagnostic_handler(&self, handler: Option<Arc<DiagnosticHandler>>) {
        self.policy.set_native_handler(handler);
    }

    /// Register or clear the host file resolver (a callback, or the
    /// built-in [`HostResolver::Nil`] / [`HostResolver::Unrestricted`]).
    pub fn set_host_file_resolver(&self, resolver: Option<HostResolver>) {
        self.resolver.set_host_resolver(resolver);
    }

    /// Register or clear the native file resolver. While installed it is
    /// consulted before the host resolver.
    pub fn set_native_file_resolver(&self, resolver: Option<Arc<NativeFileCallback>>) {
        self.resolver.set_native_resolver(resolver);
    }

    /// Change the native resolve-buffer size, returning the previous one.
    pub fn set_file_buffer_size(&self, size: usize) -> usize {
        self.resolver.set_buffer_size(size)
    }

    pub fn file_buffer_size(&self) -> usize {
        self.resolver.buffer_size()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

static ENGINE: Lazy<Engine> = Lazy::new(Engine::new);

/// The process-wide engine, initialised on first use.
pub fn engine() -> &'static Engine {
    &ENGINE
}

// Module-level convenience functions over the process-wide engine,
// mirroring the embedding surface one call per operation. They share the
// engine's single-writer discipline: do not mutate configuration while a
// conversion is in flight on another thread.

pub fn convert_string(
    text: &str,
    origin: &str,
    options_override: Option<&RenderOptions>,
) -> Result<String, ConvertError> {
    engine().convert_string(text, origin, options_override)
}

pub fn last_string_error() -> Option<String> {
    engine().last_string_error()
}

pub fn convert_file(
    path: impl AsRef<Path>,
    options_override: Option<&RenderOptions>,
) -> Result<String, ConvertError> {
    engine().convert_file(path, options_override)
}

pub fn last_file_error() -> Option<String> {
    engine().last_file_error()
}

pub fn safe_convert_string(
    origin: &str,
    text: &str,
    options_override: Option<&RenderOptions>,
) -> SafeConversion {
    engine().safe_convert_string(origin, text, options_override)
}

pub fn safe_string_error(reverse_index: usize) -> Option<String> {
    engine().safe_string_error(reverse_index)
}

pub fn safe_convert_file(
    path: impl AsRef<Path>,
    options_override: Option<&RenderOptions>,
) -> SafeConversion {
    engine().safe_convert_file(path, options_override)
}

pub fn safe_file_error(reverse_index: usize) -> Option<String> {
    engine().safe_file_error(reverse_index)
}

/// Install a new error template; returns the number of validation
/// diagnostics (0 means the template was accepted).
pub fn set_error_template(text: &str) -> usize {
    match engine().set_error_template(text) {
        Ok(()) => 0,
        Err(rejected) => rejected.diagnostics.len(),
    }
}

pub fn error_template_error(reverse_index: usize) -> Option<String> {
    engine().error_template_error(reverse_index)
}

pub fn set_global_options(options: Option<RenderOptions>) -> bool {
    engine().set_global_options(options)
}

pub fn set_host_diagnostic_handler(handler: Option<Arc<DiagnosticHandler>>) {
    engine().set_host_diagnostic_handler(handler)
}

pub fn set_native_diagnostic_handler(handler: Option<Arc<DiagnosticHandler>>) {
    engine().set_native_diagnostic_handler(handler)
}

pub fn set_host_file_resolver(resolver: Option<HostResolver>) {
    engine().set_host_file_resolver(resolver)
}

pub fn set_native_file_resolver(resolver: Option<Arc<NativeFileCallback>>) {
    engine().set_native_file_resolver(resolver)
}

pub fn set_file_buffer_size(size: usize) -> usize {
    engine().set_file_buffer_size(size)
}
