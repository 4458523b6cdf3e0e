//! ICS parsing.
//!
//! Reads the calendar-data returned by the server into [`Event`]s,
//! normalizing every start instant into the configured timezone.
//!
//! [`Event`]: crate::event::Event

mod parse;

pub use parse::parse_events;
