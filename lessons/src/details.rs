//! Codec for the e-diary's per-lesson detail payload.
//!
//! The upstream serves lesson details as a `<br />`-separated HTML fragment
//! with bold Lithuanian labels and no surrounding structure. The marks table
//! references each lesson through an inline `tomval_AjaxCmd` handler whose
//! third argument is the lesson id. Both formats are upstream constants;
//! the label strings must match byte for byte.

#[cfg(test)]
#[path = "details_test.rs"]
mod details_test;

use once_cell::sync::Lazy;
use regex::Regex;

static LESSON_COMMAND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"tomval_AjaxCmd\('(\w+)', '(\w+)', '(\w+)', this\); return false")
        .expect("valid lesson command regex")
});

const DETAILS_START: &str = "<b>Mokytoja(s)";
const TEACHER_PREFIX: &str = "<b>Mokytoja(s): </b>";
const TOPIC_PREFIX: &str = "<b>Tema: </b>";
const ASSIGNMENT_PREFIX: &str = "<b>Užduotys: </b>";
const LINE_BREAK: &str = "<br />";

/// Error returned by [`parse_lesson_details`].
#[derive(Debug, thiserror::Error)]
pub enum DetailsError {
    /// The payload contains no teacher label, so it is not a lesson detail
    /// fragment at all (commonly an error page or an empty response).
    #[error("lesson detail payload has no teacher header")]
    MissingHeader,
}

/// Teacher, topic, and assignments parsed from one detail payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LessonDetails {
    pub teacher: String,
    pub topic: String,
    /// `None` when the payload lists no non-blank assignment lines.
    pub assignments: Option<Vec<String>>,
}

/// Extracts the lesson id from a marks-table `onclick` handler value.
///
/// Returns `None` when the text is not a `tomval_AjaxCmd` invocation.
#[must_use]
pub fn parse_lesson_command(input: &str) -> Option<&str> {
    LESSON_COMMAND_RE
        .captures(input)
        .and_then(|caps| caps.get(3))
        .map(|id| id.as_str())
}

/// Parses a raw lesson detail payload into [`LessonDetails`].
///
/// Everything before the teacher label is discarded (the payload starts with
/// a close-button snippet). Lines carrying neither the teacher nor the topic
/// label are assignment lines; blank ones are dropped.
///
/// # Errors
///
/// Returns [`DetailsError::MissingHeader`] when the teacher label is absent.
pub fn parse_lesson_details(input: &str) -> Result<LessonDetails, DetailsError> {
    // The upstream escapes š inconsistently, so normalize it up front.
    let input = input.replace("&scaron;", "š").replace("&Scaron;", "Š");
    let start = input.find(DETAILS_START).ok_or(DetailsError::MissingHeader)?;

    let mut details = LessonDetails::default();
    let mut assignments = Vec::new();
    for element in input[start..].split(LINE_BREAK) {
        if element.trim().is_empty() {
            continue;
        }
        if let Some(rest) = element.strip_prefix(TEACHER_PREFIX) {
            details.teacher = decode_entities(rest);
            continue;
        }
        if let Some(rest) = element.strip_prefix(TOPIC_PREFIX) {
            details.topic = decode_entities(rest);
            continue;
        }
        let line = element.strip_prefix(ASSIGNMENT_PREFIX).unwrap_or(element);
        assignments.push(decode_entities(line));
    }

    assignments.retain(|line| !line.trim().is_empty());
    if !assignments.is_empty() {
        details.assignments = Some(assignments);
    }
    Ok(details)
}

/// Decodes the HTML entities the e-diary actually emits, plus numeric forms.
/// Unknown entities pass through untouched.
fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .and_then(|end| decode_entity(&rest[1..end]).map(|ch| (ch, end + 1)));
        match decoded {
            Some((ch, used)) => {
                out.push(ch);
                rest = &rest[used..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "scaron" => Some('š'),
        "Scaron" => Some('Š'),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}
