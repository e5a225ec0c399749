use super::*;

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use time::macros::{datetime, offset};
use timetable::TimetableError;

use crate::state::lessons::lesson_store;

/// One class, one Monday 08:00 maths lesson.
fn school_timetable() -> Timetable {
    serde_json::from_value(json!({
        "r": {"DbiAccessorRes": {"tables": [
            {"id": "classes", "data_rows": [
                {"id": "-19", "short": "5d"},
            ]},
            {"id": "subjects", "data_rows": [
                {"id": "-74", "name": "Matematika"},
            ]},
            {"id": "lessons", "data_rows": [
                {"id": "*110", "subjectid": "-74", "classids": ["-19"]},
            ]},
            {"id": "cards", "data_rows": [
                {"id": "*1", "lessonid": "*110", "period": "1", "days": "10000"},
            ]},
            {"id": "periods", "data_rows": [
                {"id": "1", "starttime": "08:00"},
            ]},
        ]}}
    }))
    .expect("timetable fixture should deserialize")
}

// ============================================================================
// Applying payloads
// ============================================================================

#[test]
fn apply_json_replaces_the_feed() {
    let store = lesson_store();
    let payload = r#"[
        {"discipline":"Matematika","topic":"Algebra","teacher":"A","day":"2024-01-01T00:00:00Z"},
        {"discipline":"Istorija"}
    ]"#;

    let count = apply_json(&store, payload).expect("payload should apply");
    assert_eq!(count, 2);

    let LessonFeed::Loaded(lessons) = store.get() else {
        panic!("expected a loaded feed");
    };
    assert_eq!(lessons[0].discipline, "Matematika");
    assert_eq!(lessons[0].topic, "Algebra");
    assert_eq!(lessons[0].day, Some(datetime!(2024-01-01 00:00 UTC)));
    assert_eq!(lessons[0].assignments, None);
    assert_eq!(lessons[0].next_dates, None);
    assert_eq!(lessons[1].discipline, "Istorija");
}

#[test]
fn apply_json_rejects_malformed_payloads_without_touching_the_feed() {
    let store = lesson_store();
    apply_json(&store, r#"[{"discipline":"Matematika"}]"#).expect("payload should apply");

    let err = apply_json(&store, "{not json").expect_err("garbage should be rejected");
    assert!(matches!(err, FeedError::Payload(_)));

    let LessonFeed::Loaded(lessons) = store.get() else {
        panic!("expected the earlier feed to survive");
    };
    assert_eq!(lessons.len(), 1);
}

#[test]
fn clear_resets_to_unset() {
    let store = lesson_store();
    apply_json(&store, r#"[{"discipline":"Matematika"}]"#).expect("payload should apply");

    clear(&store);

    assert!(store.with(LessonFeed::is_unset));
}

#[test]
fn subscribers_see_each_replacement() {
    let store = lesson_store();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _subscription = store.subscribe(move |feed: &LessonFeed| sink.borrow_mut().push(feed.clone()));

    apply_json(&store, r#"[{"discipline":"Matematika"}]"#).expect("payload should apply");
    clear(&store);

    let feeds = seen.borrow();
    assert_eq!(feeds.len(), 3);
    assert!(feeds[0].is_unset());
    assert!(matches!(&feeds[1], LessonFeed::Loaded(lessons) if lessons.len() == 1));
    assert!(feeds[2].is_unset());
}

// ============================================================================
// The local derivation path
// ============================================================================

#[test]
fn apply_enriched_runs_the_derivation_and_loads_the_feed() {
    let store = lesson_store();
    let fetched = vec![LessonInfo {
        discipline: "Matematika".to_owned(),
        day: Some(datetime!(2024-09-02 00:00 +3)),
        ..LessonInfo::default()
    }];

    let count = apply_enriched(
        &store,
        fetched,
        &school_timetable(),
        &FeedOptions::default(),
        datetime!(2024-09-05 12:00 +3),
    )
    .expect("enrichment should apply");
    assert_eq!(count, 1);

    let LessonFeed::Loaded(lessons) = store.get() else {
        panic!("expected a loaded feed");
    };
    assert_eq!(lessons[0].day, Some(datetime!(2024-09-02 08:00 +3)));
    assert_eq!(lessons[0].next_dates, Some(vec![datetime!(2024-09-09 08:00 +3)]));
}

#[test]
fn apply_enriched_propagates_timetable_failures_without_touching_the_feed() {
    let store = lesson_store();
    let options = FeedOptions {
        class: "9z".to_owned(),
        ..FeedOptions::default()
    };

    let err = apply_enriched(
        &store,
        Vec::new(),
        &school_timetable(),
        &options,
        datetime!(2024-09-05 12:00 +3),
    )
    .expect_err("unknown class should fail");
    assert!(matches!(
        err,
        FeedError::Timetable(TimetableError::UnknownClass(_))
    ));
    assert!(store.with(LessonFeed::is_unset));
}

#[test]
fn apply_enriched_rejects_windows_past_the_date_range() {
    let store = lesson_store();
    let options = FeedOptions {
        lookahead_days: 4_000_000,
        ..FeedOptions::default()
    };

    let err = apply_enriched(
        &store,
        Vec::new(),
        &school_timetable(),
        &options,
        datetime!(2024-09-05 12:00 +3),
    )
    .expect_err("a window past the date range should fail");
    assert!(matches!(
        err,
        FeedError::Window {
            lookahead: 4_000_000,
            ..
        }
    ));
    assert!(store.with(LessonFeed::is_unset));
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn feed_options_default_to_the_school_setup() {
    let options = FeedOptions::default();
    assert_eq!(options.class, "5d");
    assert_eq!(options.utc_offset, offset!(+3));
    assert_eq!(options.lookahead_days, 7);
    assert_eq!(options.lookback_days, 30);
}

#[test]
fn feed_options_deserialize_with_defaults_for_missing_fields() {
    let options: FeedOptions = serde_json::from_str(r#"{"class":"6a","utc_offset":"+02:00"}"#)
        .expect("options should deserialize");
    assert_eq!(options.class, "6a");
    assert_eq!(options.utc_offset, offset!(+2));
    assert_eq!(options.lookahead_days, 7);
    assert_eq!(options.lookback_days, 30);
}

#[test]
fn feed_options_reject_offsets_that_do_not_parse() {
    let err = serde_json::from_str::<FeedOptions>(r#"{"utc_offset":"rytoj"}"#)
        .expect_err("nonsense offsets should be rejected");
    assert!(err.to_string().contains("bad UTC offset"));
}

#[test]
fn offset_text_accepts_signed_and_bare_forms() {
    assert_eq!(parse_offset("+03:00"), Some(offset!(+3)));
    assert_eq!(parse_offset("-05:30"), UtcOffset::from_hms(-5, -30, 0).ok());
    assert_eq!(parse_offset("+3"), Some(offset!(+3)));
    assert_eq!(parse_offset("02:00"), Some(offset!(+2)));
    assert_eq!(parse_offset(""), None);
    assert_eq!(parse_offset("rytoj"), None);
    assert_eq!(parse_offset("+99"), None);
}

#[test]
fn offset_text_rejects_signed_components() {
    assert_eq!(parse_offset("--128"), None);
    assert_eq!(parse_offset("-128"), None);
    assert_eq!(parse_offset("+-5"), None);
    assert_eq!(parse_offset("-+3"), None);
    assert_eq!(parse_offset("+03:-30"), None);

    let err = serde_json::from_str::<FeedOptions>(r#"{"utc_offset":"--128"}"#)
        .expect_err("double-signed offsets should be rejected");
    assert!(err.to_string().contains("bad UTC offset"));
}
