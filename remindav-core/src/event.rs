//! Provider-neutral calendar event types.
//!
//! The gateway converts server responses into these types; the scheduling
//! engine works exclusively with them. One sync cycle's result set owns
//! its events and is replaced wholesale by the next successful sync.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;

/// A calendar entry within the fetch window.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub uid: String,
    pub summary: String,
    /// Start instant, already normalized to the configured timezone.
    /// Date-only starts are midnight local time.
    pub start: DateTime<Tz>,
    /// Alarm definitions in document order.
    pub alarms: Vec<Alarm>,
}

/// A VALARM with a relative trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct Alarm {
    /// Signed offset from the event start; negative fires before the event.
    pub offset: Duration,
}

impl Alarm {
    pub fn new(offset: Duration) -> Self {
        Alarm { offset }
    }
}
