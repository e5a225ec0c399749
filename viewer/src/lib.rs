//! UI-facing state layer for the e-diary viewer.
//!
//! SYSTEM CONTEXT
//! ==============
//! Rendering code subscribes to [`store::Store`] cells and redraws from
//! whatever value arrives; the [`feed`] module is the single writer that
//! replaces the lesson list when a fetch completes. Transport (login,
//! scraping, downloading the timetable) lives outside this crate.

pub mod feed;
pub mod state;
pub mod store;
