//! Process-wide configuration state: the options override slot and the
//! self-validating error template.

use serial_test::serial;

use ricalco::{Engine, RenderOptions};

const VALID: &str = "# Plain Document\n\nSome text.\n";
const MALFORMED: &str = "# Broken\n\nbad `span\n";

// A template carrying its own recognizable heading plus both placeholders.
const CUSTOM_TEMPLATE: &str = "# Custom Failure Page\n\nWhile converting `$origin`:\n\n$errors\n";

// An unterminated fence makes this template fail its own validation.
const BROKEN_TEMPLATE: &str = "# Broken Template\n\n```\nnever closed\n";

#[test]
fn options_override_changes_output_and_clears_back_to_baseline() {
    let engine = Engine::new();
    let baseline = engine
        .convert_string(VALID, "<string>", None)
        .expect("baseline converts");

    let bare = RenderOptions {
        full_page: false,
        ..RenderOptions::default()
    };

    assert!(engine.set_global_options(Some(bare.clone())), "first set changes");
    let overridden = engine
        .convert_string(VALID, "<string>", None)
        .expect("override converts");
    assert_ne!(baseline, overridden);
    assert!(!overridden.contains("<title>"));

    assert!(
        !engine.set_global_options(Some(bare)),
        "re-installing the same blob is not a change"
    );

    assert!(engine.set_global_options(None), "clearing a set blob changes");
    let restored = engine
        .convert_string(VALID, "<string>", None)
        .expect("restored converts");
    assert_eq!(baseline, restored, "defaults restore byte-identical output");

    assert!(!engine.set_global_options(None), "re-clearing is not a change");
}

#[test]
fn per_call_override_beats_the_global_slot() {
    let engine = Engine::new();
    engine.set_global_options(Some(RenderOptions {
        full_page: false,
        ..RenderOptions::default()
    }));

    let html = engine
        .convert_string(VALID, "<string>", Some(&RenderOptions::default()))
        .expect("converts");
    assert!(html.contains("<title>"), "explicit options win over the global slot");
}

#[test]
fn installed_template_shapes_the_failure_page() {
    let engine = Engine::new();

    engine
        .set_error_template(CUSTOM_TEMPLATE)
        .expect("valid template installs");

    let conversion = engine.safe_convert_string("<filename>", MALFORMED, None);
    assert!(conversion.error_count() > 0);
    assert!(conversion.html.contains("<title>Custom Failure Page</title>"));
    assert!(
        conversion.html.contains("&lt;filename&gt;") || conversion.html.contains("<filename>"),
        "origin is substituted into the page: {}",
        conversion.html
    );
}

#[test]
fn rejected_template_leaves_the_previous_one_active() {
    let engine = Engine::new();
    engine
        .set_error_template(CUSTOM_TEMPLATE)
        .expect("valid template installs");

    let rejected = engine
        .set_error_template(BROKEN_TEMPLATE)
        .expect_err("broken template is rejected");
    assert!(!rejected.diagnostics.is_empty());

    // Diagnostics are retrievable through the template channel, bounded.
    let count = rejected.diagnostics.len();
    assert!(engine.error_template_error(0).is_some());
    assert_eq!(engine.error_template_error(count), None);

    // The previously installed template still renders failure pages.
    let conversion = engine.safe_convert_string("<filename>", MALFORMED, None);
    assert!(conversion.html.contains("<title>Custom Failure Page</title>"));
}

#[test]
fn clearing_the_template_restores_the_builtin_page() {
    let engine = Engine::new();
    engine
        .set_error_template(CUSTOM_TEMPLATE)
        .expect("valid template installs");
    engine.clear_error_template();

    let conversion = engine.safe_convert_string("<filename>", MALFORMED, None);
    assert!(conversion.html.contains("<title>Conversion failed</title>"));
}

#[test]
fn failure_page_lists_the_call_diagnostics() {
    let engine = Engine::new();
    let conversion = engine.safe_convert_string("<filename>", MALFORMED, None);
    assert!(
        conversion.html.contains("unterminated inline code span"),
        "page: {}",
        conversion.html
    );
}

#[test]
fn options_blob_round_trips_through_toml() {
    let blob = "full_page = false\nsmart = false\n";
    let options = RenderOptions::from_toml(blob).expect("blob parses");
    let engine = Engine::new();
    assert!(engine.set_global_options(Some(options.clone())));

    let reparsed = RenderOptions::from_toml(blob).expect("blob reparses");
    assert!(
        !engine.set_global_options(Some(reparsed)),
        "an identical blob is not a configuration change"
    );
}

#[test]
#[serial]
fn process_wide_template_and_options_functions() {
    let errors = ricalco::set_error_template(CUSTOM_TEMPLATE);
    assert_eq!(errors, 0);

    let errors = ricalco::set_error_template(BROKEN_TEMPLATE);
    assert!(errors > 0);
    assert!(ricalco::error_template_error(0).is_some());
    assert_eq!(ricalco::error_template_error(errors), None);

    assert!(ricalco::set_global_options(Some(RenderOptions {
        smart: false,
        ..RenderOptions::default()
    })));
    assert!(ricalco::set_global_options(None));

    // Leave the global engine as the other suites expect it.
    ricalco::engine().clear_error_template();
}
