use super::*;
use crate::auditor::ResponseSummary;
use crate::message::kinds::{CATEGORY_CACHING, CATEGORY_GENERAL};
use pretty_assertions::assert_eq;

const URL: &str = "http://127.0.0.1:8080/hello";

fn response(status: u16) -> ResponseSummary {
    ResponseSummary {
        status,
        headers: vec![("Content-Type".into(), "text/plain".into())],
        body: bytes::Bytes::from_static(b"Hello world"),
        segments: 1,
    }
}

fn completed(status: u16, messages: Vec<DiagnosticMessage>) -> RunState {
    RunState::completed(URL, response(status), messages)
}

fn heuristic() -> DiagnosticMessage {
    DiagnosticMessage::new(Level::Warning, CATEGORY_CACHING, kinds::FRESHNESS_HEURISTIC)
}

fn ct_missing() -> DiagnosticMessage {
    DiagnosticMessage::new(Level::Warning, CATEGORY_GENERAL, kinds::CT_MISSING).with_var("bytes", 11)
}

fn date_missing() -> DiagnosticMessage {
    DiagnosticMessage::new(Level::Bad, CATEGORY_GENERAL, kinds::DATE_MISSING)
}

#[test]
fn clean_run_passes_with_tally() {
    let state = completed(
        200,
        vec![
            DiagnosticMessage::new(Level::Good, "connection", kinds::CL_CORRECT),
            DiagnosticMessage::new(Level::Info, CATEGORY_CACHING, kinds::FRESHNESS_NONE),
        ],
    );
    let verdict = AssertionPolicy::default()
        .evaluate(&state, &ExpectationSpec::new(200))
        .unwrap();

    assert_eq!(
        verdict,
        Verdict::Pass(Tally {
            good: 1,
            info: 1,
            ..Tally::default()
        })
    );
}

#[test]
fn heuristic_freshness_never_fails() {
    let state = completed(200, vec![heuristic()]);
    let verdict = AssertionPolicy::default()
        .evaluate(&state, &ExpectationSpec::new(200))
        .unwrap();

    match verdict {
        Verdict::Pass(tally) => assert_eq!(tally.allowed_warnings, 1),
        other => panic!("expected pass, got {other:?}"),
    }
}

#[test]
fn base_policy_cannot_drop_heuristic_freshness() {
    let policy = WarningPolicy::new().with_additional(["CT_MISSING"]);
    assert!(policy.base().contains(&kinds::FRESHNESS_HEURISTIC));
    assert!(policy.base().contains(&kinds::CT_MISSING));

    let config = PolicyConfig {
        extra_allowed_warnings: Vec::new(),
        ..PolicyConfig::default()
    };
    let from_config = WarningPolicy::from_config(&config);
    assert_eq!(
        from_config.base().iter().collect::<Vec<_>>(),
        vec![&kinds::FRESHNESS_HEURISTIC]
    );
}

#[test]
fn effective_set_is_union() {
    let caller = BTreeSet::from([kinds::MISSING_HDRS_304]);
    let effective = WarningPolicy::new().effective(&caller);
    assert_eq!(
        effective,
        BTreeSet::from([kinds::FRESHNESS_HEURISTIC, kinds::MISSING_HDRS_304])
    );
}

#[test]
fn unexpected_warning_and_error_are_counted() {
    let state = completed(200, vec![ct_missing(), date_missing(), heuristic()]);
    let verdict = AssertionPolicy::default()
        .evaluate(&state, &ExpectationSpec::new(200))
        .unwrap();

    let Verdict::Fail(failure) = verdict else {
        panic!("expected failure");
    };
    assert_eq!(
        failure,
        CheckFailure::UnexpectedDiagnostics {
            url: URL.to_string(),
            warnings: vec![kinds::CT_MISSING],
            errors: vec![kinds::DATE_MISSING],
        }
    );
    assert_eq!(
        failure.to_string(),
        format!("{URL}: Had 1 unexpected warnings and 1 errors; warnings: CT_MISSING; errors: DATE_MISSING")
    );
    let report = failure.to_json();
    assert_eq!(report["failure"], "unexpected_diagnostics");
    assert_eq!(report["warning_count"], 1);
    assert_eq!(report["error_count"], 1);
}

#[test]
fn caller_allowance_filters_warning() {
    let state = completed(200, vec![ct_missing()]);
    let spec = ExpectationSpec::new(200).allow(kinds::CT_MISSING);
    let verdict = AssertionPolicy::default().evaluate(&state, &spec).unwrap();
    assert!(verdict.is_pass());
}

#[test]
fn configured_allowance_filters_warning() {
    let config = PolicyConfig {
        extra_allowed_warnings: vec!["CT_MISSING".to_string()],
        ..PolicyConfig::default()
    };
    let state = completed(200, vec![ct_missing()]);
    let verdict = AssertionPolicy::from_config(&config)
        .evaluate(&state, &ExpectationSpec::default())
        .unwrap();
    assert!(verdict.is_pass());
}

#[test]
fn allowance_does_not_cover_bad_messages() {
    let state = completed(200, vec![date_missing()]);
    let spec = ExpectationSpec::new(200).allow(kinds::DATE_MISSING);
    let verdict = AssertionPolicy::default().evaluate(&state, &spec).unwrap();
    assert!(!verdict.is_pass());
}

#[test]
fn status_mismatch_fails() {
    let state = completed(404, Vec::new());
    let verdict = AssertionPolicy::default()
        .evaluate(&state, &ExpectationSpec::new(200))
        .unwrap();

    assert_eq!(
        verdict,
        Verdict::Fail(CheckFailure::StatusMismatch {
            url: URL.to_string(),
            expected: 200,
            actual: 404,
        })
    );
}

#[test]
fn incomplete_run_surfaces_structured_error() {
    let err = RunError::Connect {
        addr: "127.0.0.1:1".into(),
        details: "connection refused".into(),
    };
    let state = RunState::failed(URL, err.clone());
    let verdict = AssertionPolicy::default()
        .evaluate(&state, &ExpectationSpec::new(200))
        .unwrap();

    let Verdict::Fail(failure) = verdict else {
        panic!("expected failure");
    };
    assert!(failure.to_string().contains("connection refused"));
    assert_eq!(failure.to_json()["error_code"], err.code());
}

#[test]
fn incomplete_run_without_error_uses_generic_reason() {
    let state = RunState::incomplete(URL);
    let verdict = AssertionPolicy::default()
        .evaluate(&state, &ExpectationSpec::new(200))
        .unwrap();

    let Verdict::Fail(failure) = verdict else {
        panic!("expected failure");
    };
    assert_eq!(failure.to_string(), format!("{URL}: {INCOMPLETE_REASON}"));
    assert_eq!(failure.to_json()["reason"], INCOMPLETE_REASON);
}

#[test]
fn unrecognized_level_is_a_defect_not_a_failure() {
    let rogue = DiagnosticMessage::new(Level::from("critical"), CATEGORY_GENERAL, kinds::CT_MISSING);
    let state = completed(200, vec![rogue]);

    let defect = AssertionPolicy::default()
        .evaluate(&state, &ExpectationSpec::new(200))
        .unwrap_err();
    assert_eq!(defect.level, "critical");
    assert_eq!(defect.kind, "CT_MISSING");
}

#[test]
fn defect_wins_over_status_mismatch() {
    let rogue = DiagnosticMessage::new(Level::from("fatal"), CATEGORY_GENERAL, "X_ROGUE".into());
    let state = completed(500, vec![rogue]);
    assert!(AssertionPolicy::default()
        .evaluate(&state, &ExpectationSpec::new(200))
        .is_err());
}

#[test]
fn log_lines_include_detail_for_catalogued_kinds() {
    let lines = AssertionPolicy::default().log_lines(&ct_missing());
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        "general: The response doesn't have a Content-Type header. (CT_MISSING)"
    );
    assert!(lines[1].contains("11-byte body"));
}

#[test]
fn log_lines_skip_empty_detail() {
    let unknown = DiagnosticMessage::new(Level::Warning, CATEGORY_GENERAL, "X_NOT_CATALOGUED".into());
    let lines = AssertionPolicy::default().log_lines(&unknown);
    assert_eq!(lines, vec!["general: X_NOT_CATALOGUED (X_NOT_CATALOGUED)".to_string()]);
}
