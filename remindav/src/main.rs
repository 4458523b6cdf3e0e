//! remindav: a CalDAV reminder daemon.
//!
//! Polls a CalDAV server for upcoming events with alarms and delivers one
//! Telegram message per alarm when it comes due. Stateless: the calendar
//! view is rebuilt from the server on every start.

mod config;
mod worker;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use remindav_caldav::CaldavGateway;
use remindav_core::gateway::CalendarGateway;
use remindav_notify::TelegramNotifier;

use crate::config::Config;
use crate::worker::Worker;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    let mut gateway = CaldavGateway::connect(
        &config.caldav_url,
        &config.caldav_username,
        &config.caldav_password,
        config.timezone,
    )?;
    gateway
        .login()
        .await
        .with_context(|| format!("Cannot start: login to {} failed", config.caldav_url))?;
    info!("logged in to {}", config.caldav_url);

    let sink = TelegramNotifier::new(
        config.telegram_bot_token.clone(),
        config.telegram_chat_id.clone(),
    );

    Worker::new(&config, gateway, sink).run().await;

    Ok(())
}
