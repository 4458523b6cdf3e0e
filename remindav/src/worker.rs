//! The scheduling engine.
//!
//! The worker owns the pending reminder queue, the resync cadence and the
//! single wake deadline for the next due reminder. It moves between three
//! states: idle (empty queue, no deadline), armed (deadline set for the
//! earliest reminder) and dispatching (draining due reminders). A resync
//! may re-arm or disarm the deadline at any point between handler runs;
//! it never interrupts a drain in progress.
//!
//! Everything runs on one task. The run loop sleeps until the earlier of
//! the two deadlines, runs that handler to completion, and loops, so the
//! queue and the deadlines are never touched concurrently and need no
//! locks.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{debug, error, info, warn};

use remindav_core::error::RemindResult;
use remindav_core::gateway::{Calendar, CalendarGateway, NotificationSink};
use remindav_core::reminder::{Reminder, extract_reminders};

use crate::config::Config;

pub struct Worker<G, N> {
    gateway: G,
    sink: N,
    tz: Tz,
    sync_interval: Duration,
    fetch_window: Duration,
    calendar_ids: Option<Vec<String>>,
    /// Calendar list, fetched once and cached for the process lifetime.
    calendars: Option<Vec<Calendar>>,
    /// Pending reminders, ascending by fire instant.
    reminders: Vec<Reminder>,
    /// Deadline of the armed wake timer, if any.
    wake_at: Option<DateTime<Tz>>,
    /// Deadline of the next sync cycle.
    next_sync_at: DateTime<Tz>,
}

impl<G, N> Worker<G, N>
where
    G: CalendarGateway,
    N: NotificationSink,
{
    pub fn new(config: &Config, gateway: G, sink: N) -> Self {
        if config.calendar_ids.is_none() {
            warn!("CALENDAR_IDS is not set; no calendars are subscribed");
        }

        let now = Utc::now().with_timezone(&config.timezone);
        Worker {
            gateway,
            sink,
            tz: config.timezone,
            sync_interval: config.sync_interval,
            fetch_window: config.fetch_window,
            calendar_ids: config.calendar_ids.clone(),
            calendars: None,
            reminders: Vec::new(),
            wake_at: None,
            // First sync is due immediately.
            next_sync_at: now,
        }
    }

    /// Run the daemon loop forever: sleep to the earlier deadline, run
    /// that handler, repeat.
    pub async fn run(mut self) {
        loop {
            match self.wake_at {
                // Due reminders win ties so a notification is never
                // delayed behind a simultaneous resync.
                Some(wake) if wake <= self.next_sync_at => {
                    sleep_until(wake, self.now()).await;
                    let now = self.now();
                    self.drain_due(now).await;
                }
                _ => {
                    sleep_until(self.next_sync_at, self.now()).await;
                    let now = self.now();
                    self.sync_cycle(now).await;
                }
            }
        }
    }

    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    /// One resync: refresh events, rebuild the reminder queue, reprogram
    /// the wake deadline if the queue changed by value. Errors degrade to
    /// "no change this round"; the previously known queue and deadline
    /// stay in place.
    async fn sync_cycle(&mut self, now: DateTime<Tz>) {
        // Scheduled before any fallible work so that no failure mode can
        // stall the cadence.
        self.next_sync_at = now + self.sync_interval;

        info!("syncing");
        if let Err(err) = self.try_sync(now).await {
            error!("sync cycle failed: {err}");
        }
    }

    async fn try_sync(&mut self, now: DateTime<Tz>) -> RemindResult<()> {
        if self.calendars.is_none() {
            let fetched = self.gateway.list_calendars().await?;
            info!(count = fetched.len(), "calendar list cached");
            self.calendars = Some(fetched);
        }

        let subscribed: Vec<Calendar> = self
            .calendars
            .iter()
            .flatten()
            .filter(|calendar| self.is_subscribed(calendar))
            .cloned()
            .collect();

        let events = self
            .gateway
            .search_events(&subscribed, now, now + self.fetch_window)
            .await?;

        let fresh = extract_reminders(&events, now);
        debug!(
            events = events.len(),
            reminders = fresh.len(),
            "extracted reminders"
        );

        // A value-equal queue keeps its timer; no cancel/rearm churn on
        // every poll.
        if fresh != self.reminders {
            self.reminders = fresh;
            self.reschedule();
        }

        Ok(())
    }

    fn is_subscribed(&self, calendar: &Calendar) -> bool {
        self.calendar_ids
            .as_ref()
            .is_some_and(|ids| ids.iter().any(|id| *id == calendar.id))
    }

    /// Reprogram the wake deadline from the queue head. This is the only
    /// place a deadline is armed; any previous deadline is replaced
    /// unconditionally.
    fn reschedule(&mut self) {
        self.wake_at = self.reminders.first().map(|r| r.fire_at);
        match self.wake_at {
            Some(at) => debug!(%at, "wake timer armed"),
            None => debug!("wake timer disarmed"),
        }
    }

    /// Dispatch every reminder due at `now`, then re-arm for the next
    /// one. A failed send is logged and the reminder still counts as
    /// dispatched; delivery is at-most-once.
    async fn drain_due(&mut self, now: DateTime<Tz>) {
        // The deadline that woke us is spent.
        self.wake_at = None;

        while self.reminders.first().is_some_and(|r| r.fire_at <= now) {
            let reminder = self.reminders.remove(0);
            info!(summary = %reminder.summary, "sending reminder");
            if let Err(err) = self.sink.send(&reminder.notification_text()).await {
                error!("failed to deliver reminder '{}': {err}", reminder.summary);
            }
        }

        self.reschedule();
    }
}

/// Sleep until `deadline`, returning immediately if it already passed.
async fn sleep_until(deadline: DateTime<Tz>, now: DateTime<Tz>) {
    let wait = (deadline - now).to_std().unwrap_or(std::time::Duration::ZERO);
    tokio::time::sleep(wait).await;
}
