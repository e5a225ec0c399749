//! UI-facing state containers.
//!
//! SYSTEM CONTEXT
//! ==============
//! `lessons` carries the feed every view renders from and `session` tracks
//! the logged-in student. Both live in [`crate::store::Store`] cells so
//! views subscribe to changes rather than poll.

pub mod lessons;
pub mod session;
