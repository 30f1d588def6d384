//! Diagnostic policy registry: which handler sees each diagnostic and what
//! becomes of it. Two independent handler slots exist (one for the
//! embedding host, one for native callers) plus the engine default. The
//! precedence is fixed: a native handler bypasses the host handler
//! entirely while installed; clearing a slot restores the next level.

use std::sync::{Arc, RwLock};

use tracing::debug;

use super::lock::{rw_read, rw_write};
use crate::domain::{Diagnostic, DiagnosticVerdict};

/// Caller-registered diagnostic handler. Called synchronously for every
/// diagnostic the renderer emits; must not start a new conversion.
pub type DiagnosticHandler = dyn Fn(&Diagnostic) -> DiagnosticVerdict + Send + Sync;

/// What the registry decided for one diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Engine default kept it: the rendered text joins the error stack and
    /// fails a fail-fast call when the severity is error-grade.
    Recorded,
    /// A handler swallowed it, or the engine default dropped a sub-error
    /// severity.
    Suppressed,
    /// A handler aborted the call with replacement text.
    Escalated(String),
}

#[derive(Default)]
pub struct PolicyState {
    host: RwLock<Option<Arc<DiagnosticHandler>>>,
    native: RwLock<Option<Arc<DiagnosticHandler>>>,
}

impl PolicyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_host_handler(&self, handler: Option<Arc<DiagnosticHandler>>) {
        *rw_write(&self.host, "diagnostic handlers") = handler;
    }

    pub fn set_native_handler(&self, handler: Option<Arc<DiagnosticHandler>>) {
        *rw_write(&self.native, "diagnostic handlers") = handler;
    }

    /// Route one diagnostic through the active policy.
    pub fn report(&self, diagnostic: &Diagnostic) -> ReportOutcome {
        let handler = {
            let native = rw_read(&self.native, "diagnostic handlers");
            match native.as_ref() {
                Some(handler) => Some(Arc::clone(handler)),
                None => rw_read(&self.host, "diagnostic handlers").as_ref().map(Arc::clone),
            }
        };

        match handler {
            Some(handler) => match handler(diagnostic) {
                DiagnosticVerdict::Ignore => ReportOutcome::Suppressed,
                DiagnosticVerdict::Escalate(message) => ReportOutcome::Escalated(message),
            },
            None => {
                if diagnostic.severity.is_failure() {
                    ReportOutcome::Recorded
                } else {
                    debug!(
                        origin = %diagnostic.origin,
                        severity = diagnostic.severity.label(),
                        message = %diagnostic.message,
                        "Sub-error diagnostic dropped by default policy"
                    );
                    ReportOutcome::Suppressed
                }
            }
        }
    }
}
