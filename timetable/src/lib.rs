//! Published-timetable model and lesson date derivation.
//!
//! This crate is transport-agnostic: it consumes an already-fetched copy of
//! the school's public timetable document and turns its weekly grid into
//! concrete dates, so the feed layer can stamp lessons with slot times and
//! upcoming occurrences.
//!
//! DESIGN
//! ======
//! The document is a bag of relational tables (`classes`, `lessons`, `cards`,
//! `periods`, `subjects`) with string ids and open-shaped rows; rows stay as
//! `serde_json` maps and are picked apart on demand. A card pairs a weekday
//! mask with a period reference, so one card stands for "this subject, every
//! week, this weekday, this start time". [`class_dates`] extrapolates each
//! card into every occurrence inside a requested window and [`enrich`] maps
//! those occurrences back onto fetched lesson records.

mod enrich;

pub use enrich::enrich;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Duration, OffsetDateTime, Time, UtcOffset, Weekday};

/// A single open-shaped table row.
pub type DataRow = serde_json::Map<String, Value>;

/// Human-readable table description carried alongside the id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    #[serde(default)]
    pub name: String,
}

/// One table's worth of rows from the timetable document.
///
/// Each table kind uses its own set of row keys and only a handful of them
/// matter here, so rows are kept open-shaped rather than typed per table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub def: TableDef,
    #[serde(default)]
    pub data_rows: Vec<DataRow>,
}

/// A parsed snapshot of the school's published timetable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Timetable {
    #[serde(rename = "r", default)]
    result: ResultEnvelope,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct ResultEnvelope {
    #[serde(rename = "DbiAccessorRes", default)]
    dbi_accessor_res: AccessorResult,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct AccessorResult {
    #[serde(default)]
    tables: Vec<Table>,
}

impl Timetable {
    /// All tables in the document, in document order.
    #[must_use]
    pub fn tables(&self) -> &[Table] {
        &self.result.dbi_accessor_res.tables
    }

    fn table(&self, id: &'static str) -> Result<&Table, TimetableError> {
        self.tables()
            .iter()
            .find(|table| table.id == id)
            .ok_or(TimetableError::MissingTable(id))
    }
}

/// Every derived date for one subject of a class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassDates {
    /// Subject name as the public timetable spells it.
    pub name: String,
    /// Occurrences inside the requested window, ascending.
    pub dates: Vec<OffsetDateTime>,
}

/// Derivation window: occurrences strictly after `from`, up to and
/// including `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateWindow {
    pub from: OffsetDateTime,
    pub to: OffsetDateTime,
}

impl DateWindow {
    /// The feed's window: `lookahead_days` ahead of `now`, stretched back
    /// `lookback_days` from that end point so recent lessons still resolve.
    ///
    /// `None` when a day count pushes past the representable date range.
    #[must_use]
    pub fn around(now: OffsetDateTime, lookahead_days: i64, lookback_days: i64) -> Option<Self> {
        let lookahead = Duration::DAY.checked_mul(i32::try_from(lookahead_days).ok()?)?;
        let lookback = Duration::DAY.checked_mul(i32::try_from(lookback_days).ok()?)?;
        let to = now.checked_add(lookahead)?;
        Some(Self {
            from: to.checked_sub(lookback)?,
            to,
        })
    }
}

/// Error returned by [`class_dates`] when the document cannot be resolved.
#[derive(Debug, thiserror::Error)]
pub enum TimetableError {
    /// The document has no table with the given id.
    #[error("timetable has no {0:?} table")]
    MissingTable(&'static str),
    /// No row in the `classes` table carries the requested short name.
    #[error("class {0:?} not found in the timetable")]
    UnknownClass(String),
    /// A row lacks a field the derivation needs.
    #[error("{table} row is missing {field:?}")]
    MalformedRow {
        table: &'static str,
        field: &'static str,
    },
    /// A row references an id no row in the target table carries.
    #[error("{table} row {id:?} is referenced but missing")]
    MissingRow { table: &'static str, id: String },
    /// A card's weekday mask is not one of the five known school days.
    #[error("unknown weekday mask {0:?}")]
    UnknownDayMask(String),
    /// A period's start time is not `HH:MM`.
    #[error("bad period start time {0:?}")]
    BadStartTime(String),
}

/// Derives every dated occurrence of each of `class`'s subjects inside
/// `window`.
///
/// The class is resolved by its public short name (for example `"5d"`).
/// Period start times carry no zone of their own and are interpreted in
/// `offset`, the school's local offset. Dates within one subject come back
/// ascending; a subject whose cards never land inside the window is still
/// listed, with no dates.
///
/// # Errors
///
/// Returns [`TimetableError::UnknownClass`] when no class row matches, and
/// the other [`TimetableError`] variants when the document is missing a
/// table, field, or referenced row the derivation needs.
pub fn class_dates(
    timetable: &Timetable,
    class: &str,
    window: DateWindow,
    offset: UtcOffset,
) -> Result<Vec<ClassDates>, TimetableError> {
    let classes = timetable.table("classes")?;
    let class_row = classes
        .data_rows
        .iter()
        .find(|row| row_str(row, "short") == Some(class))
        .ok_or_else(|| TimetableError::UnknownClass(class.to_owned()))?;
    let class_id = require_str(class_row, "classes", "id")?;

    let lessons = timetable.table("lessons")?;
    let subjects = rows_by_id(timetable.table("subjects")?);
    let cards = timetable.table("cards")?;
    let periods = rows_by_id(timetable.table("periods")?);

    let mut result = Vec::new();
    for lesson in &lessons.data_rows {
        if !row_lists_class(lesson, class_id) {
            continue;
        }
        let lesson_id = require_str(lesson, "lessons", "id")?;
        let subject_id = require_str(lesson, "lessons", "subjectid")?;
        let subject = subjects
            .get(subject_id)
            .ok_or_else(|| TimetableError::MissingRow {
                table: "subjects",
                id: subject_id.to_owned(),
            })?;

        let mut dates = Vec::new();
        for card in &cards.data_rows {
            if row_str(card, "lessonid") != Some(lesson_id) {
                continue;
            }
            let period_id = require_str(card, "cards", "period")?;
            let period = periods
                .get(period_id)
                .ok_or_else(|| TimetableError::MissingRow {
                    table: "periods",
                    id: period_id.to_owned(),
                })?;
            let start = parse_start_time(require_str(period, "periods", "starttime")?)?;
            let weekday = mask_weekday(require_str(card, "cards", "days")?)?;

            // Any datetime with the right weekday and slot time will do as
            // the seed; extrapolation normalizes it into the window.
            let seed = window
                .from
                .to_offset(offset)
                .date()
                .with_time(start)
                .assume_offset(offset);
            dates.extend(weekly_occurrences(roll_to_weekday(seed, weekday), window));
        }
        dates.sort_unstable();

        result.push(ClassDates {
            name: require_str(subject, "subjects", "name")?.to_owned(),
            dates,
        });
    }
    Ok(result)
}

/// Maps the public timetable's subject spelling to the e-diary's internal
/// discipline name. The two systems disagree on a handful of subjects;
/// anything unlisted passes through unchanged.
#[must_use]
pub fn internal_name(name: &str) -> &str {
    match name {
        "Tikyba" => "Dorinis ugdymas (tikyba)",
        "1UK(An)" => "Užsienio kalba (pirmoji, anglų)",
        "Klasės val." => "Vadovavimas klasei",
        "Lietuvių k." => "Lietuvių kalba ir literatūra",
        _ => name,
    }
}

fn row_str<'a>(row: &'a DataRow, key: &str) -> Option<&'a str> {
    row.get(key).and_then(Value::as_str)
}

fn require_str<'a>(
    row: &'a DataRow,
    table: &'static str,
    field: &'static str,
) -> Result<&'a str, TimetableError> {
    row_str(row, field).ok_or(TimetableError::MalformedRow { table, field })
}

fn row_lists_class(row: &DataRow, class_id: &str) -> bool {
    row.get("classids")
        .and_then(Value::as_array)
        .map_or(false, |ids| {
            ids.iter().any(|id| id.as_str() == Some(class_id))
        })
}

fn rows_by_id(table: &Table) -> HashMap<&str, &DataRow> {
    table
        .data_rows
        .iter()
        .filter_map(|row| row_str(row, "id").map(|id| (id, row)))
        .collect()
}

/// Cards mark their weekday with a five-digit mask, Monday first.
fn mask_weekday(mask: &str) -> Result<Weekday, TimetableError> {
    match mask {
        "10000" => Ok(Weekday::Monday),
        "01000" => Ok(Weekday::Tuesday),
        "00100" => Ok(Weekday::Wednesday),
        "00010" => Ok(Weekday::Thursday),
        "00001" => Ok(Weekday::Friday),
        other => Err(TimetableError::UnknownDayMask(other.to_owned())),
    }
}

/// Moves `start` forward (zero to six days) to the first `weekday`.
fn roll_to_weekday(start: OffsetDateTime, weekday: Weekday) -> OffsetDateTime {
    let ahead =
        (weekday.number_days_from_monday() + 7 - start.weekday().number_days_from_monday()) % 7;
    start + Duration::days(i64::from(ahead))
}

/// Steps `date` week by week through every occurrence strictly after
/// `window.from` and not after `window.to`.
fn weekly_occurrences(mut date: OffsetDateTime, window: DateWindow) -> Vec<OffsetDateTime> {
    while date > window.from {
        date -= Duration::WEEK;
    }
    while date <= window.from {
        date += Duration::WEEK;
    }

    let mut occurrences = Vec::new();
    while date <= window.to {
        occurrences.push(date);
        date += Duration::WEEK;
    }
    occurrences
}

fn parse_start_time(raw: &str) -> Result<Time, TimetableError> {
    let bad = || TimetableError::BadStartTime(raw.to_owned());
    let (hours, minutes) = raw.split_once(':').ok_or_else(bad)?;
    let hours = hours.parse().map_err(|_| bad())?;
    let minutes = minutes.parse().map_err(|_| bad())?;
    Time::from_hms(hours, minutes, 0).map_err(|_| bad())
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
