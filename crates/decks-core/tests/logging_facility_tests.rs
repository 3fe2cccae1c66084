#![allow(clippy::unwrap_used, clippy::expect_used)]

use decks_core::errors::DecksError;
use decks_core::logging_facility::test_capture::init_test_capture;
use decks_core::{log_op_end, log_op_error, log_op_start};
use decks_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_DURATION_MS, FIELD_ERR_CODE,
};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name, deck_id = "d1");

    let events = capture.events_for(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_START));
    assert_eq!(events[0].fields.get("deck_id"), Some(&"d1".to_string()));
}

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42u64);

    let events = capture.events_for(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END));
    assert_eq!(events[0].fields.get(FIELD_DURATION_MS), Some(&"42".to_string()));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = DecksError::DeckNotFound {
        deck_id: "d1".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10u64);

    let events = capture.events_for(op_name);
    assert_eq!(events.len(), 1);

    let error_event = &events[0];
    assert_eq!(error_event.event.as_deref(), Some(EVENT_END_ERROR));
    assert_eq!(error_event.level, tracing::Level::ERROR);
    assert_eq!(
        error_event.fields.get(FIELD_ERR_CODE),
        Some(&"ERR_NOT_FOUND".to_string())
    );
}

#[test]
fn test_boundary_single_start_end() {
    let capture = init_test_capture();
    let op_name = "test_boundary_unique_4";

    log_op_start!(op_name);
    log_op_end!(op_name, duration_ms = 1u64, deck_count = 3u64);

    let starts = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_START)
    });
    let ends = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END)
    });

    assert_eq!(starts, 1);
    assert_eq!(ends, 1);
    capture.assert_event_exists(op_name, EVENT_END);
}

#[test]
fn test_component_is_module_path() {
    let capture = init_test_capture();
    let op_name = "test_component_unique_5";

    log_op_start!(op_name);

    let events = capture.events_for(op_name);
    assert_eq!(
        events[0].component.as_deref(),
        Some("logging_facility_tests")
    );
}
