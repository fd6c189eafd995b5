use crate::{
    poll_until_matched, ConsoleFeed, NotificationVerifier, Patterns, RemoteErrorPolicy, Result,
    Schedule, Verified,
};
use alert_request::NotificationChannel;
use std::time::Duration;

/// ConsoleVerifier matches the description of the alert's entry on the
/// first page of the console alerts feed. It makes a single attempt.
pub struct ConsoleVerifier<'a> {
    feed: &'a dyn ConsoleFeed,
    alert_name: String,
}

impl<'a> ConsoleVerifier<'a> {
    pub fn new(feed: &'a dyn ConsoleFeed, alert_name: &str) -> Self {
        Self {
            feed,
            alert_name: alert_name.to_string(),
        }
    }

    async fn check_once(&self, patterns: &Patterns) -> anyhow::Result<bool> {
        let entries = self.feed.entries(1, 10).await?;

        let Some(entry) = entries.iter().find(|e| e.alert_name == self.alert_name) else {
            tracing::debug!(entries = entries.len(), "alert isn't in the console feed");
            return Ok(false);
        };
        let description = self.feed.description(entry.live_feed_id).await?;

        Ok(patterns.matches_all(&description))
    }
}

#[async_trait::async_trait]
impl NotificationVerifier for ConsoleVerifier<'_> {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Console
    }

    #[tracing::instrument(
        skip_all,
        fields(channel = %NotificationChannel::Console, alert_name = %self.alert_name)
    )]
    async fn poll(&self, patterns: &Patterns) -> Result<Verified> {
        poll_until_matched(
            NotificationChannel::Console,
            &Schedule::new(1, Duration::ZERO),
            RemoteErrorPolicy::Absorb,
            move |_| self.check_once(patterns),
        )
        .await
    }
}
