//! Lesson-feed state: the list every view renders from.
//!
//! DESIGN
//! ======
//! The feed is a single cell holding either "no data yet" or one complete
//! fetched list; there is no partially loaded state and no merging. The
//! data-fetching collaborator replaces the whole value when a fetch
//! completes, and views render whichever variant they are handed.

#[cfg(test)]
#[path = "lessons_test.rs"]
mod lessons_test;

use lessons::LessonInfo;

use crate::store::Store;

/// Contents of the lesson feed.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum LessonFeed {
    /// No fetch has completed yet.
    #[default]
    Unset,
    /// The most recently fetched lesson list, in display order.
    Loaded(Vec<LessonInfo>),
}

impl LessonFeed {
    /// The held lessons, if any have been loaded.
    #[must_use]
    pub fn lessons(&self) -> Option<&[LessonInfo]> {
        match self {
            Self::Unset => None,
            Self::Loaded(lessons) => Some(lessons),
        }
    }

    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}

/// A fresh feed store holding [`LessonFeed::Unset`].
#[must_use]
pub fn lesson_store() -> Store<LessonFeed> {
    Store::new(LessonFeed::Unset)
}
