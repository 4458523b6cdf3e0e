//! Interfaces to the two external collaborators: the calendar store and
//! the notification channel.
//!
//! The scheduling engine only ever talks to these traits, so tests can
//! drive it with scripted in-memory implementations.

use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;

use crate::error::RemindResult;
use crate::event::Event;

/// A calendar collection on the remote server.
#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    /// Collection identifier: the last path segment of `url`. This is what
    /// the subscription filter matches against.
    pub id: String,
    /// Display name reported by the server.
    pub name: String,
    /// Absolute collection URL.
    pub url: String,
}

/// Authenticated access to calendars and windowed event search.
#[async_trait]
pub trait CalendarGateway {
    /// Validate the credentials against the server. Must succeed before
    /// any other method is used.
    async fn login(&mut self) -> RemindResult<()>;

    /// All calendar collections of the logged-in principal.
    async fn list_calendars(&self) -> RemindResult<Vec<Calendar>>;

    /// Events starting within `[start, end]` across the given calendars.
    async fn search_events(
        &self,
        calendars: &[Calendar],
        start: DateTime<Tz>,
        end: DateTime<Tz>,
    ) -> RemindResult<Vec<Event>>;
}

/// Delivery of one formatted message to a fixed destination.
#[async_trait]
pub trait NotificationSink {
    async fn send(&self, text: &str) -> RemindResult<()>;
}
