//! Diagnostic handler layering: host and native slots, native precedence,
//! escalation, and restoration of the default policy when slots clear.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serial_test::serial;

use ricalco::{Diagnostic, DiagnosticVerdict, Engine};

const EXCEPTION_MESSAGE: &str = "I was raised in a poor language";

const BAD: &str = "# Title\n\nbroken `span here\n";

fn ignore_all() -> Arc<ricalco::DiagnosticHandler> {
    Arc::new(|_: &Diagnostic| DiagnosticVerdict::Ignore)
}

fn escalate_fixed() -> Arc<ricalco::DiagnosticHandler> {
    Arc::new(|_: &Diagnostic| DiagnosticVerdict::Escalate(EXCEPTION_MESSAGE.to_owned()))
}

#[test]
fn host_handler_can_swallow_errors_and_clearing_restores_failure() {
    let engine = Engine::new();

    assert!(engine.convert_string(BAD, "<bad-string>", None).is_err());

    engine.set_host_diagnostic_handler(Some(ignore_all()));
    assert!(
        engine.convert_string(BAD, "<bad-string>", None).is_ok(),
        "ignored errors should let the conversion succeed"
    );

    engine.set_host_diagnostic_handler(None);
    assert!(engine.convert_string(BAD, "<bad-string>", None).is_err());
}

#[test]
fn native_escalation_supersedes_every_other_error() {
    let engine = Engine::new();

    engine.set_native_diagnostic_handler(Some(escalate_fixed()));
    let err = engine
        .convert_string(BAD, "<bad-string>", None)
        .expect_err("escalation fails the call");
    assert_eq!(err.to_string(), EXCEPTION_MESSAGE);
    assert_eq!(
        engine.last_string_error().as_deref(),
        Some(EXCEPTION_MESSAGE),
        "the escalated text is the sole retrievable error"
    );

    engine.set_native_diagnostic_handler(None);
    let err = engine
        .convert_string(BAD, "<bad-string>", None)
        .expect_err("default policy fails again");
    assert_ne!(err.to_string(), EXCEPTION_MESSAGE);
}

#[test]
fn native_handler_bypasses_the_host_handler_entirely() {
    let engine = Engine::new();
    let host_calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&host_calls);
    engine.set_host_diagnostic_handler(Some(Arc::new(move |_: &Diagnostic| {
        counter.fetch_add(1, Ordering::SeqCst);
        DiagnosticVerdict::Ignore
    })));
    engine.set_native_diagnostic_handler(Some(escalate_fixed()));

    assert!(engine.convert_string(BAD, "<bad-string>", None).is_err());
    assert_eq!(
        host_calls.load(Ordering::SeqCst),
        0,
        "host handler must not run while a native handler is installed"
    );

    // Dropping the native slot reactivates the host handler.
    engine.set_native_diagnostic_handler(None);
    assert!(engine.convert_string(BAD, "<bad-string>", None).is_ok());
    assert!(host_calls.load(Ordering::SeqCst) > 0);
}

#[test]
fn escalation_in_safe_mode_still_returns_a_page() {
    let engine = Engine::new();
    engine.set_native_diagnostic_handler(Some(escalate_fixed()));

    let conversion = engine.safe_convert_string("<bad-string>", BAD, None);
    assert_eq!(conversion.error_count(), 1);
    assert_eq!(conversion.errors[0], EXCEPTION_MESSAGE);
    assert!(conversion.html.contains("<title>"));
    assert_eq!(
        engine.safe_string_error(0).as_deref(),
        Some(EXCEPTION_MESSAGE)
    );
}

#[test]
fn escalation_short_circuits_further_diagnostics() {
    let engine = Engine::new();
    let seen = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&seen);
    engine.set_native_diagnostic_handler(Some(Arc::new(move |_: &Diagnostic| {
        counter.fetch_add(1, Ordering::SeqCst);
        DiagnosticVerdict::Escalate(EXCEPTION_MESSAGE.to_owned())
    })));

    // Two lintable problems, but the handler must only ever see the first.
    let two_problems = "# T\n\nbad `one\n\nsee [here]()\n";
    assert!(engine.convert_string(two_problems, "<bad-string>", None).is_err());
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
#[serial]
fn process_wide_handler_registration_round_trips() {
    ricalco::set_native_diagnostic_handler(Some(escalate_fixed()));
    let err = ricalco::convert_string(BAD, "<bad-string>", None)
        .expect_err("escalation through the global engine");
    assert_eq!(ricalco::last_string_error().as_deref(), Some(EXCEPTION_MESSAGE));
    assert_eq!(err.to_string(), EXCEPTION_MESSAGE);

    ricalco::set_native_diagnostic_handler(None);
    assert!(ricalco::convert_string(BAD, "<bad-string>", None).is_err());
    assert_ne!(
        ricalco::last_string_error().as_deref(),
        Some(EXCEPTION_MESSAGE)
    );
}
