//! Applies fetched lesson payloads to the feed store.
//!
//! SYSTEM CONTEXT
//! ==============
//! The transport that fetched the bytes lives outside this crate; these
//! functions are the pure tail of that flow. [`apply_json`] takes a payload
//! already enriched upstream, [`apply_enriched`] runs the timetable
//! derivation locally over raw fetched lessons, and both end in one
//! wholesale `set` on the feed store.

#[cfg(test)]
#[path = "feed_test.rs"]
mod feed_test;

use lessons::{LessonInfo, sort_by_day};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use time::{OffsetDateTime, UtcOffset};
use timetable::{DateWindow, Timetable, class_dates, enrich};

use crate::state::lessons::LessonFeed;
use crate::store::Store;

/// Error returned by the feed-application operations.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The payload is not a JSON array of lessons.
    #[error("malformed lesson payload: {0}")]
    Payload(#[from] serde_json::Error),
    /// The timetable document could not be resolved for the configured class.
    #[error("resolving timetable dates: {0}")]
    Timetable(#[from] timetable::TimetableError),
    /// The configured day counts push the derivation window outside the
    /// representable date range.
    #[error("window of {lookahead} days ahead, {lookback} back is out of range")]
    Window { lookahead: i64, lookback: i64 },
}

/// Options for the timetable-backed feed refresh.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedOptions {
    /// Class short name as the published timetable spells it.
    pub class: String,
    /// The school's UTC offset; period start times are interpreted in it.
    #[serde(deserialize_with = "deserialize_offset_from_text")]
    pub utc_offset: UtcOffset,
    /// Days ahead of now the derivation window reaches.
    pub lookahead_days: i64,
    /// Days back from the window's end point it stretches.
    pub lookback_days: i64,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            class: "5d".to_owned(),
            utc_offset: time::macros::offset!(+3),
            lookahead_days: 7,
            lookback_days: 30,
        }
    }
}

/// Decodes a fetched lesson payload and replaces the feed with it,
/// returning the lesson count.
///
/// # Errors
///
/// Returns [`FeedError::Payload`] when the payload does not decode; the
/// store is untouched in that case.
pub fn apply_json(store: &Store<LessonFeed>, payload: &str) -> Result<usize, FeedError> {
    let lessons: Vec<LessonInfo> = serde_json::from_str(payload)?;
    let count = lessons.len();
    log::debug!("feed replaced with {count} lessons");
    store.set(LessonFeed::Loaded(lessons));
    Ok(count)
}

/// Runs the timetable derivation over freshly fetched lessons and replaces
/// the feed with the enriched list, returning the lesson count.
///
/// The fetched list is first ordered chronologically so same-day lessons
/// keep their fetch order through the slot matching.
///
/// # Errors
///
/// Returns [`FeedError::Window`] when the option day counts fall outside
/// the representable date range, and [`FeedError::Timetable`] when the
/// timetable cannot be resolved for the configured class; the store is
/// untouched in either case.
pub fn apply_enriched(
    store: &Store<LessonFeed>,
    mut lessons: Vec<LessonInfo>,
    timetable: &Timetable,
    options: &FeedOptions,
    now: OffsetDateTime,
) -> Result<usize, FeedError> {
    sort_by_day(&mut lessons);

    let window = DateWindow::around(now, options.lookahead_days, options.lookback_days)
        .ok_or_else(|| FeedError::Window {
            lookahead: options.lookahead_days,
            lookback: options.lookback_days,
        })?;
    let dates = class_dates(timetable, &options.class, window, options.utc_offset)?;
    enrich(&mut lessons, &dates, now);

    let count = lessons.len();
    log::debug!("feed replaced with {count} enriched lessons");
    store.set(LessonFeed::Loaded(lessons));
    Ok(count)
}

/// Empties the feed back to [`LessonFeed::Unset`].
pub fn clear(store: &Store<LessonFeed>) {
    log::debug!("feed cleared");
    store.set(LessonFeed::Unset);
}

fn deserialize_offset_from_text<'de, D>(deserializer: D) -> Result<UtcOffset, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_offset(&text).ok_or_else(|| {
        D::Error::custom(format!("bad UTC offset {text:?}, expected like \"+03:00\""))
    })
}

/// Accepts `"+03:00"`, `"-05:30"`, and bare-hour forms like `"+3"`.
/// One sign for the whole offset; the components must be bare digits.
fn parse_offset(text: &str) -> Option<UtcOffset> {
    let (sign, rest) = if let Some(rest) = text.strip_prefix('-') {
        (-1i8, rest)
    } else {
        (1i8, text.strip_prefix('+').unwrap_or(text))
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    if !hours.bytes().all(|byte| byte.is_ascii_digit())
        || !minutes.bytes().all(|byte| byte.is_ascii_digit())
    {
        return None;
    }
    let hours: i8 = hours.parse().ok()?;
    let minutes: i8 = minutes.parse().ok()?;
    UtcOffset::from_hms(sign * hours, sign * minutes, 0).ok()
}
