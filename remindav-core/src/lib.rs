//! Core types for the remindav daemon.
//!
//! This crate provides everything the scheduling engine shares with the
//! gateway and sink implementations:
//! - `Event` and `Alarm` for calendar entries fetched from the server
//! - `Reminder` and the pure extraction pass that resolves alarms to
//!   absolute fire instants
//! - the `CalendarGateway` and `NotificationSink` traits
//! - ICS parsing with timezone normalization

pub mod error;
pub mod event;
pub mod gateway;
pub mod ics;
pub mod reminder;

// Re-export the model types at crate root for convenience
pub use error::{RemindError, RemindResult};
pub use event::{Alarm, Event};
pub use gateway::{Calendar, CalendarGateway, NotificationSink};
pub use reminder::{Reminder, extract_reminders};
