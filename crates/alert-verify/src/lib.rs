//! Verification that a triggered alert delivered its notification through
//! each of its configured channels.
//!
//! Each channel has a [`NotificationVerifier`] which inspects the place the
//! CommServe delivers to (a mailbox, feed or disk folder, event log, or a log
//! file) and matches the notification body against [`Patterns`]. Most
//! channels poll through a shared bounded retry driver (see [`Schedule`]),
//! while SNMP and SCOM wait once and then read a single window of their log.
use alert_request::NotificationChannel;

pub mod channels;
mod config;
mod patterns;
mod remote;
mod retry;

pub use config::{
    ChannelSettings, EmailSettings, EventViewerSettings, LogWindowSettings, VerifyConfig,
};
pub use patterns::Patterns;
pub use remote::{ConsoleFeed, ConsoleFeedEntry, EmailSearchFilter, Mailbox, RemoteMachine};
pub use retry::{poll_until_matched, RemoteErrorPolicy, Schedule};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{channel} notification wasn't received after {attempts} attempts")]
    NotificationTimeout {
        channel: NotificationChannel,
        attempts: u32,
    },
    #[error("{channel} verification failed on attempt {attempt}")]
    TransportFailure {
        channel: NotificationChannel,
        attempt: u32,
        #[source]
        source: anyhow::Error,
    },
    #[error("invalid notification pattern")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of a successful verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verified {
    pub channel: NotificationChannel,
    /// Number of attempts made, including the one which matched.
    pub attempts: u32,
}

/// NotificationVerifier checks that a notification was delivered on one channel.
#[async_trait::async_trait]
pub trait NotificationVerifier: Send + Sync {
    fn channel(&self) -> NotificationChannel;

    /// Wait for a notification matching every pattern. Fails with
    /// [`Error::NotificationTimeout`] if none arrives in time.
    async fn poll(&self, patterns: &Patterns) -> Result<Verified>;
}
