//! Best-effort notification fan-out.
//!
//! Every enabled channel gets the same message. Channels are sent to
//! concurrently, each under its own timeout, and a failing channel is logged
//! and otherwise ignored.

mod notify_me;
mod pushbullet;
mod pushover;
mod telegram;

pub use notify_me::NotifyMeNotifier;
pub use pushbullet::PushbulletNotifier;
pub use pushover::PushoverNotifier;
pub use telegram::TelegramNotifier;

use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use futures::future::join_all;
use std::time::Duration;

/// A single notification channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name, for logs.
    fn name(&self) -> &'static str;

    /// Deliver `message` once.
    async fn send(&self, message: &str) -> Result<()>;
}

/// Which channels took a message and which did not.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: Vec<&'static str>,
    pub failed: Vec<&'static str>,
}

/// Sends one message to every configured channel.
pub struct Fanout {
    channels: Vec<Box<dyn Notifier>>,
    timeout: Duration,
}

impl Fanout {
    pub fn new(channels: Vec<Box<dyn Notifier>>, timeout: Duration) -> Self {
        Self { channels, timeout }
    }

    /// Build every enabled channel from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.notify_timeout();
        let title = format!("ipwatch: {}", config.site_name);
        let n = &config.notifications;
        let mut channels: Vec<Box<dyn Notifier>> = Vec::new();

        if let Some(t) = n.telegram.as_ref().filter(|t| t.enabled) {
            channels.push(Box::new(TelegramNotifier::new(
                t.bot_token.clone(),
                t.chat_id,
                timeout,
            )?));
        }
        if let Some(p) = n.pushover.as_ref().filter(|p| p.enabled) {
            channels.push(Box::new(PushoverNotifier::new(
                p.token.clone(),
                p.user_key.clone(),
                title.clone(),
                timeout,
            )?));
        }
        if let Some(p) = n.pushbullet.as_ref().filter(|p| p.enabled) {
            channels.push(Box::new(PushbulletNotifier::new(
                p.api_key.clone(),
                title.clone(),
                timeout,
            )?));
        }
        if let Some(m) = n.notify_me.as_ref().filter(|m| m.enabled) {
            channels.push(Box::new(NotifyMeNotifier::new(
                m.access_code.clone(),
                timeout,
            )?));
        }

        let fanout = Self::new(channels, timeout);
        if fanout.is_empty() {
            tracing::debug!("No notification channels enabled");
        } else {
            tracing::info!("Notifying via {}", fanout.channel_names().join(", "));
        }
        Ok(fanout)
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Send `message` to every channel and wait at most one timeout for all of them.
    pub async fn dispatch(&self, message: &str) -> DispatchReport {
        let sends = self.channels.iter().map(|channel| async move {
            let outcome = tokio::time::timeout(self.timeout, channel.send(message)).await;
            (channel.name(), outcome)
        });

        let mut report = DispatchReport::default();
        for (name, outcome) in join_all(sends).await {
            match outcome {
                Ok(Ok(())) => {
                    tracing::info!("Notification sent via {}", name);
                    report.delivered.push(name);
                }
                Ok(Err(e)) => {
                    tracing::warn!("{}", e);
                    report.failed.push(name);
                }
                Err(_) => {
                    tracing::warn!(
                        "Notification via {} timed out after {}s",
                        name,
                        self.timeout.as_secs_f32()
                    );
                    report.failed.push(name);
                }
            }
        }
        report
    }
}

/// Text announcing that `record` now points at `ip`.
pub fn change_message<Tz>(site: &str, record: &str, ip: &str, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "[{}] {} changed on {}. New IP == {}.",
        site,
        record,
        at.format("%B %d, %Y at %H:%M"),
        ip
    )
}
