//! ICS parsing using the icalendar crate's parser.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, read_calendar, unfold},
};
use tracing::debug;

use crate::error::{RemindError, RemindResult};
use crate::event::{Alarm, Event};

/// Parse ICS content into events, one per VEVENT component.
///
/// Start instants are normalized into `tz`; a date-only DTSTART becomes
/// midnight local time. VEVENTs that cannot be resolved to a start instant
/// are skipped, not fatal.
pub fn parse_events(content: &str, tz: Tz) -> RemindResult<Vec<Event>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| RemindError::IcsParse(e.to_string()))?;

    Ok(calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .filter_map(|vevent| parse_vevent(vevent, tz))
        .collect())
}

fn parse_vevent(vevent: &Component, tz: Tz) -> Option<Event> {
    let uid = vevent.find_prop("UID")?.val.to_string();
    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| "(No title)".to_string());

    let dtstart = DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?;
    let start = start_in_tz(dtstart, tz)?;

    // Alarms from VALARM components, document order
    let alarms: Vec<Alarm> = vevent
        .components
        .iter()
        .filter(|c| c.name == "VALARM")
        .filter_map(|alarm| {
            let trigger = alarm.find_prop("TRIGGER")?;

            // Absolute triggers (VALUE=DATE-TIME) carry no offset; skip them.
            let is_absolute = trigger.params.iter().any(|p| {
                p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE-TIME")
            });
            if is_absolute {
                debug!(uid = %uid, "skipping absolute VALARM trigger");
                return None;
            }

            parse_trigger_offset(trigger.val.as_ref()).map(Alarm::new)
        })
        .collect();

    Some(Event {
        uid,
        summary,
        start,
        alarms,
    })
}

/// Resolve a DTSTART into the configured timezone.
///
/// Date-only values become midnight local time, floating values are
/// localized, UTC and zoned values are converted.
fn start_in_tz(dpt: DatePerhapsTime, tz: Tz) -> Option<DateTime<Tz>> {
    match dpt {
        DatePerhapsTime::Date(date) => date
            .and_hms_opt(0, 0, 0)?
            .and_local_timezone(tz)
            .earliest(),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => Some(dt.with_timezone(&tz)),
            CalendarDateTime::Floating(naive) => naive.and_local_timezone(tz).earliest(),
            CalendarDateTime::WithTimezone { date_time, tzid } => {
                let event_tz: Tz = tzid.parse().ok()?;
                Some(
                    date_time
                        .and_local_timezone(event_tz)
                        .earliest()?
                        .with_timezone(&tz),
                )
            }
        },
    }
}

/// Parse a TRIGGER value into a signed offset from the event start
/// (`-PT15M` = 15 minutes before).
fn parse_trigger_offset(value: &str) -> Option<Duration> {
    let is_before = value.starts_with('-');
    let duration_str = value.trim_start_matches('-');

    let duration = iso8601::duration(duration_str).ok()?;
    let std_duration: std::time::Duration = duration.into();
    let offset = Duration::from_std(std_duration).ok()?;

    Some(if is_before { -offset } else { offset })
}
