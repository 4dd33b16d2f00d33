//! Tests for the diagnostics collection

use ollie_common::{Diagnostic, Diagnostics, OllieError, Severity};

#[test]
fn test_diagnostic_display_includes_code_and_help() {
    let diagnostic = Diagnostic::warning("unused global 'counter'")
        .with_code("W0101")
        .with_help("remove the declaration or reference it");

    assert_eq!(
        diagnostic.to_string(),
        "warning: unused global 'counter' [W0101]\n  help: remove the declaration or reference it"
    );
}

#[test]
fn test_severity_display_names() {
    assert_eq!(Severity::Error.to_string(), "error");
    assert_eq!(Severity::Warning.to_string(), "warning");
    assert_eq!(Severity::Info.to_string(), "info");
    assert_eq!(Severity::Hint.to_string(), "hint");
}

#[test]
fn test_collection_counts_by_severity() {
    let mut diagnostics = Diagnostics::new();
    assert!(diagnostics.is_empty());

    diagnostics.warning("block .L3 is empty");
    diagnostics.warning("block .L4 does not end in a terminator");
    assert!(!diagnostics.has_errors(), "warnings alone are not errors");
    assert_eq!(diagnostics.error_count(), 0);

    diagnostics.error("unknown LEA form");
    assert!(diagnostics.has_errors());
    assert_eq!(diagnostics.error_count(), 1);
    assert_eq!(diagnostics.errors().count(), 1);
    assert_eq!(diagnostics.messages.len(), 3);
}

#[test]
fn test_extend_merges_collections() {
    let mut first = Diagnostics::new();
    first.warning("one");
    let mut second = Diagnostics::new();
    second.error("two");

    first.extend(second);
    assert_eq!(first.messages.len(), 2);
    assert!(first.has_errors());
}

#[test]
fn test_errors_convert_into_diagnostics() {
    let error = OllieError::codegen_error("no LEA form at byte width");
    let diagnostic = Diagnostic::from(error);

    assert_eq!(diagnostic.severity, Severity::Error);
    assert!(
        diagnostic.message.contains("no LEA form at byte width"),
        "the diagnostic keeps the error text: {}",
        diagnostic.message
    );
}
