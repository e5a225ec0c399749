//! Shared lesson model for the e-diary viewer.
//!
//! This crate owns the lesson record shape used by both the data-fetching
//! side and the UI state layer, plus the codec for the e-diary's per-lesson
//! detail payload. Date-times travel as RFC 3339 text on the wire and every
//! empty or absent field is omitted, matching the upstream JSON exactly.

pub mod details;

pub use details::{DetailsError, LessonDetails, parse_lesson_command, parse_lesson_details};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A single scheduled class session's metadata.
///
/// Produced by the data-fetching side, enriched with upcoming dates by the
/// `timetable` crate, and held wholesale by the viewer's lesson feed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonInfo {
    /// Subject label as the e-diary names it.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub discipline: String,
    /// When the lesson took place. Absent until date resolution assigns one;
    /// the enrichment pass corrects it to the published timetable slot.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub day: Option<OffsetDateTime>,
    /// Teacher display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub teacher: String,
    /// Lesson topic as entered by the teacher.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub topic: String,
    /// Homework lines. `None` (not an empty list) when there are none.
    #[serde(default, skip_serializing_if = "skip_empty_list")]
    pub assignments: Option<Vec<String>>,
    /// Upcoming dates for this discipline, earliest first.
    #[serde(
        rename = "nextDates",
        default,
        with = "rfc3339_vec",
        skip_serializing_if = "skip_empty_list"
    )]
    pub next_dates: Option<Vec<OffsetDateTime>>,
}

impl LessonInfo {
    /// Copies teacher, topic, and assignments from a parsed detail payload
    /// onto this record, replacing whatever was there.
    pub fn apply_details(&mut self, details: LessonDetails) {
        self.teacher = details.teacher;
        self.topic = details.topic;
        self.assignments = details.assignments;
    }
}

/// Sorts lessons chronologically by `day`, lessons without a day first.
///
/// The sort is stable, so lessons sharing a day keep their relative order.
pub fn sort_by_day(lessons: &mut [LessonInfo]) {
    lessons.sort_by_key(|lesson| lesson.day);
}

/// An empty list is omitted from the wire exactly like an absent one.
fn skip_empty_list<T>(list: &Option<Vec<T>>) -> bool {
    list.as_ref().map_or(true, Vec::is_empty)
}

/// RFC 3339 serde for `Option<Vec<OffsetDateTime>>`; `time` only ships the
/// scalar and `Option` helpers.
mod rfc3339_vec {
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    pub fn serialize<S>(
        value: &Option<Vec<OffsetDateTime>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dates) => {
                let mut texts = Vec::with_capacity(dates.len());
                for date in dates {
                    texts.push(date.format(&Rfc3339).map_err(S::Error::custom)?);
                }
                serializer.collect_seq(texts)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<OffsetDateTime>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Vec<String>>::deserialize(deserializer)?
            .map(|texts| {
                texts
                    .iter()
                    .map(|text| OffsetDateTime::parse(text, &Rfc3339).map_err(D::Error::custom))
                    .collect()
            })
            .transpose()
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
