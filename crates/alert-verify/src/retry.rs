use crate::{Error, Result, Verified};
use alert_request::NotificationChannel;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Schedule of a bounded polling loop. Attempts are spaced by `interval`, and
/// the first attempt is preceded by `initial_delay`. There is no sleep after
/// the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub max_attempts: u32,
    pub interval: Duration,
    pub initial_delay: Duration,
}

impl Schedule {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            initial_delay: Duration::ZERO,
        }
    }

    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }
}

/// Handling of errors raised while probing a remote machine or mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorPolicy {
    /// Log the error and count the attempt as "not yet received".
    Absorb,
    /// Fail verification with [`Error::TransportFailure`].
    Fail,
}

/// Run `check` until it reports a match or the schedule's attempts are
/// exhausted. `check` is called with the 1-based attempt number and returns
/// whether the notification was found.
pub async fn poll_until_matched<F, Fut>(
    channel: NotificationChannel,
    schedule: &Schedule,
    remote_errors: RemoteErrorPolicy,
    mut check: F,
) -> Result<Verified>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    if !schedule.initial_delay.is_zero() {
        tracing::debug!(%channel, delay = ?schedule.initial_delay, "waiting before first attempt");
        tokio::time::sleep(schedule.initial_delay).await;
    }

    for attempt in 1..=schedule.max_attempts {
        let matched = match check(attempt).await {
            Ok(matched) => matched,
            Err(source) if remote_errors == RemoteErrorPolicy::Absorb => {
                tracing::warn!(%channel, attempt, error = ?source, "check failed, will retry");
                false
            }
            Err(source) => {
                return Err(Error::TransportFailure {
                    channel,
                    attempt,
                    source,
                })
            }
        };

        if matched {
            tracing::info!(%channel, attempt, "notification received");
            return Ok(Verified {
                channel,
                attempts: attempt,
            });
        }
        tracing::debug!(
            %channel,
            attempt,
            max_attempts = schedule.max_attempts,
            "notification not yet received"
        );

        if attempt != schedule.max_attempts {
            tokio::time::sleep(schedule.interval).await;
        }
    }

    Err(Error::NotificationTimeout {
        channel,
        attempts: schedule.max_attempts,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    const INTERVAL: Duration = Duration::from_secs(30);

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_fails_once_without_trailing_sleep() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let err = poll_until_matched(
            NotificationChannel::Rss,
            &Schedule::new(5, INTERVAL),
            RemoteErrorPolicy::Fail,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, anyhow::Error>(false) }
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            Error::NotificationTimeout {
                channel: NotificationChannel::Rss,
                attempts: 5
            }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(start.elapsed(), INTERVAL * 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_stops_polling() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let verified = poll_until_matched(
            NotificationChannel::Email,
            &Schedule::new(5, INTERVAL),
            RemoteErrorPolicy::Fail,
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, anyhow::Error>(attempt == 2) }
            },
        )
        .await
        .unwrap();

        assert_eq!(verified.attempts, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(start.elapsed(), INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_delay() {
        let start = Instant::now();

        poll_until_matched(
            NotificationChannel::SaveToDisk,
            &Schedule::new(3, INTERVAL).with_initial_delay(INTERVAL),
            RemoteErrorPolicy::Absorb,
            |_| async { Ok::<_, anyhow::Error>(true) },
        )
        .await
        .unwrap();

        assert_eq!(start.elapsed(), INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    #[tracing_test::traced_test]
    async fn test_remote_error_policies() {
        let verified = poll_until_matched(
            NotificationChannel::EventViewer,
            &Schedule::new(3, INTERVAL),
            RemoteErrorPolicy::Absorb,
            |attempt| async move {
                if attempt == 1 {
                    anyhow::bail!("WinRM connection reset")
                }
                Ok::<_, anyhow::Error>(true)
            },
        )
        .await
        .unwrap();
        assert_eq!(verified.attempts, 2);
        assert!(logs_contain("check failed, will retry"));

        let err = poll_until_matched(
            NotificationChannel::Rss,
            &Schedule::new(3, INTERVAL),
            RemoteErrorPolicy::Fail,
            |_| async { Err::<bool, _>(anyhow::anyhow!("access denied")) },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            Error::TransportFailure {
                channel: NotificationChannel::Rss,
                attempt: 1,
                ..
            }
        ));
    }
}
