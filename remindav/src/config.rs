//! Environment-sourced daemon configuration.

use anyhow::{Context, Result};
use chrono::Duration;
use chrono_tz::Tz;
use std::env;

const DEFAULT_SYNC_INTERVAL_IN_SEC: i64 = 1800;
const DEFAULT_FETCH_EVENT_WINDOW_IN_DAYS: i64 = 5;

/// Daemon configuration. All state is environment-sourced; there is no
/// on-disk configuration or persisted state.
pub struct Config {
    pub caldav_url: String,
    pub caldav_username: String,
    pub caldav_password: String,
    /// Subscribed calendar ids; `None` selects no calendars.
    pub calendar_ids: Option<Vec<String>>,
    /// Resync cadence.
    pub sync_interval: Duration,
    /// Forward search window for event queries.
    pub fetch_window: Duration,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    /// Zone for all instant arithmetic and display.
    pub timezone: Tz,
}

impl Config {
    /// Read configuration from environment variables. Missing required
    /// keys or unparsable values are startup-fatal.
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            caldav_url: require("CALDAV_URL")?,
            caldav_username: require("CALDAV_USERNAME")?,
            caldav_password: require("CALDAV_PASSWORD")?,
            calendar_ids: split_calendar_ids(env::var("CALENDAR_IDS").ok()),
            sync_interval: Duration::seconds(parse_or(
                "SYNC_INTERVAL_IN_SEC",
                DEFAULT_SYNC_INTERVAL_IN_SEC,
            )?),
            fetch_window: Duration::days(parse_or(
                "FETCH_EVENT_WINDOW_IN_DAYS",
                DEFAULT_FETCH_EVENT_WINDOW_IN_DAYS,
            )?),
            telegram_bot_token: require("TELEGRAM_BOT_TOKEN")?,
            telegram_chat_id: require("TELEGRAM_CHAT_ID")?,
            timezone: parse_timezone(env::var("TIMEZONE").ok().as_deref())?,
        })
    }
}

fn require(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("Cannot start: {key} not set"))
}

fn parse_or(key: &str, default: i64) -> Result<i64> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("Cannot start: invalid {key} '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// `;`-separated subscription filter; unset or empty selects nothing.
fn split_calendar_ids(raw: Option<String>) -> Option<Vec<String>> {
    let raw = raw?;
    let ids: Vec<String> = raw
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if ids.is_empty() { None } else { Some(ids) }
}

fn parse_timezone(raw: Option<&str>) -> Result<Tz> {
    match raw {
        Some(name) => name
            .parse()
            .map_err(|_| anyhow::anyhow!("Cannot start: invalid TIMEZONE '{name}'")),
        None => Ok(chrono_tz::UTC),
    }
}
