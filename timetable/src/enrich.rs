//! Enrichment pass mapping derived timetable dates onto fetched lessons.

#[cfg(test)]
#[path = "enrich_test.rs"]
mod enrich_test;

use std::collections::BTreeMap;

use lessons::LessonInfo;
use time::{Date, OffsetDateTime};

use crate::{ClassDates, internal_name};

/// Stamps each lesson with its discipline's upcoming dates and corrects its
/// `day` to the published slot time, then orders the whole list.
///
/// The e-diary reports lesson days at midnight, so when a discipline meets
/// twice on one calendar day the records are indistinguishable by time.
/// Lessons are therefore grouped by day and discipline and matched to the
/// timetable's same-day slots by position, falling back to the last slot
/// when the counts disagree. Disciplines absent from the timetable are left
/// untouched, as are lessons with no day at all.
///
/// The final order puts lessons with no upcoming date first, then ascends
/// by earliest upcoming date.
pub fn enrich(lessons: &mut [LessonInfo], dates: &[ClassDates], now: OffsetDateTime) {
    let mut dates_by_discipline = BTreeMap::<&str, Vec<OffsetDateTime>>::new();
    for class_dates in dates {
        dates_by_discipline
            .entry(internal_name(&class_dates.name))
            .or_default()
            .extend(class_dates.dates.iter().copied());
    }
    // Subjects the timetable lists more than once (split groups) merge into
    // one date list, which is no longer sorted.
    for merged in dates_by_discipline.values_mut() {
        merged.sort_unstable();
    }

    let mut groups = BTreeMap::<(Date, String), Vec<usize>>::new();
    for (index, lesson) in lessons.iter().enumerate() {
        let Some(day) = lesson.day else {
            log::debug!("lesson {:?} has no day, leaving as-is", lesson.discipline);
            continue;
        };
        groups
            .entry((day.date(), lesson.discipline.clone()))
            .or_default()
            .push(index);
    }

    for ((day, discipline), members) in &groups {
        let Some(discipline_dates) = dates_by_discipline.get(discipline.as_str()) else {
            log::warn!("no timetable dates for discipline {discipline:?}");
            continue;
        };

        let upcoming = discipline_dates
            .iter()
            .copied()
            .filter(|date| *date > now)
            .collect::<Vec<_>>();
        let upcoming = (!upcoming.is_empty()).then_some(upcoming);

        let same_day = discipline_dates
            .iter()
            .copied()
            .filter(|date| date.date() == *day)
            .collect::<Vec<_>>();

        for (position, index) in members.iter().enumerate() {
            let lesson = &mut lessons[*index];
            lesson.next_dates = upcoming.clone();
            if let Some(slot) = same_day.get(position).or_else(|| same_day.last()) {
                log::debug!("correcting {discipline:?} day {:?} -> {slot}", lesson.day);
                lesson.day = Some(*slot);
            }
        }
    }

    lessons.sort_by_key(|lesson| {
        lesson
            .next_dates
            .as_ref()
            .and_then(|dates| dates.first())
            .copied()
    });
}
