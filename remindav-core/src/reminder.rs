//! Reminders and the extraction pass that produces them.

use chrono::DateTime;
use chrono_tz::Tz;

use crate::event::Event;

/// A resolved notification obligation: one alarm instance at an absolute
/// fire instant.
///
/// Reminders are value-comparable; two queues are equal iff they hold the
/// same reminders in the same order. The sync cycle relies on this to skip
/// timer reprogramming when a poll returns an unchanged event set.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    /// When the notification is due.
    pub fire_at: DateTime<Tz>,
    /// UID of the owning event.
    pub uid: String,
    /// Summary of the owning event.
    pub summary: String,
    /// Start of the owning event, for display.
    pub event_start: DateTime<Tz>,
}

impl Reminder {
    /// Message body for the notification channel: bold header, then
    /// "summary: localized start time".
    ///
    /// The summary is HTML-escaped since the channel parses the body as
    /// HTML.
    pub fn notification_text(&self) -> String {
        format!(
            "<b>Reminder</b>\r\n{}: {}",
            escape_html(&self.summary),
            self.event_start.format("%d.%m.%Y %H:%M:%S")
        )
    }
}

/// Resolve every alarm of every event to an absolute fire instant, drop
/// the ones already due at `now`, and sort ascending by fire instant.
///
/// Pure: no I/O, inputs untouched, deterministic given `(events, now)`.
/// The sort is stable and keyed solely on the fire instant, so reminders
/// firing at the same instant keep their extraction order (event order,
/// then alarm order within an event).
pub fn extract_reminders(events: &[Event], now: DateTime<Tz>) -> Vec<Reminder> {
    let mut reminders: Vec<Reminder> = events
        .iter()
        .flat_map(|event| {
            event.alarms.iter().map(|alarm| Reminder {
                fire_at: event.start + alarm.offset,
                uid: event.uid.clone(),
                summary: event.summary.clone(),
                event_start: event.start,
            })
        })
        .filter(|reminder| reminder.fire_at >= now)
        .collect();

    reminders.sort_by_key(|reminder| reminder.fire_at);
    reminders
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
