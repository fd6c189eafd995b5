use crate::{RemoteErrorPolicy, Schedule};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration of notification verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyConfig {
    /// Maximum number of attempts on polled channels. Must be at least one.
    #[serde(
        default = "default_max_attempts",
        deserialize_with = "deserialize_max_attempts"
    )]
    pub max_attempts: u32,
    /// Interval between attempts on polled channels.
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
    #[serde(default)]
    pub email: EmailSettings,
    #[serde(default = "ChannelSettings::failing")]
    pub rss: ChannelSettings,
    #[serde(default = "ChannelSettings::absorbing")]
    pub save_to_disk: ChannelSettings,
    #[serde(default)]
    pub event_viewer: EventViewerSettings,
    #[serde(default = "LogWindowSettings::snmp")]
    pub snmp: LogWindowSettings,
    #[serde(default = "LogWindowSettings::scom")]
    pub scom: LogWindowSettings,
}

fn default_max_attempts() -> u32 {
    5
}
fn deserialize_max_attempts<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match u32::deserialize(deserializer)? {
        0 => Err(serde::de::Error::custom("max_attempts must be at least 1")),
        n => Ok(n),
    }
}
fn default_interval() -> Duration {
    Duration::from_secs(30)
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval: default_interval(),
            email: EmailSettings::default(),
            rss: ChannelSettings::failing(),
            save_to_disk: ChannelSettings::absorbing(),
            event_viewer: EventViewerSettings::default(),
            snmp: LogWindowSettings::snmp(),
            scom: LogWindowSettings::scom(),
        }
    }
}

impl VerifyConfig {
    /// Schedule of polled channels.
    pub fn schedule(&self) -> Schedule {
        Schedule::new(self.max_attempts, self.interval)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelSettings {
    pub remote_errors: RemoteErrorPolicy,
}

impl ChannelSettings {
    fn failing() -> Self {
        Self {
            remote_errors: RemoteErrorPolicy::Fail,
        }
    }
    fn absorbing() -> Self {
        Self {
            remote_errors: RemoteErrorPolicy::Absorb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailSettings {
    /// Consider only unread messages.
    #[serde(default = "default_true")]
    pub unread_only: bool,
    #[serde(default = "default_absorb")]
    pub remote_errors: RemoteErrorPolicy,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            unread_only: true,
            remote_errors: RemoteErrorPolicy::Absorb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventViewerSettings {
    /// PowerShell command which prints the message of the latest event.
    #[serde(default = "default_event_command")]
    pub command: String,
    #[serde(default = "default_absorb")]
    pub remote_errors: RemoteErrorPolicy,
}

impl Default for EventViewerSettings {
    fn default() -> Self {
        Self {
            command: default_event_command(),
            remote_errors: RemoteErrorPolicy::Absorb,
        }
    }
}

fn default_event_command() -> String {
    "(Get-EventLog -LogName Application -Newest 1).Message".to_string()
}

/// Settings of channels which wait once, then search the trailing lines of
/// a log on the CommServe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogWindowSettings {
    #[serde(with = "humantime_serde")]
    pub wait: Duration,
    /// Number of trailing lines to search.
    pub lines: usize,
    pub remote_errors: RemoteErrorPolicy,
}

impl LogWindowSettings {
    fn snmp() -> Self {
        Self {
            wait: Duration::from_secs(60),
            lines: 20,
            remote_errors: RemoteErrorPolicy::Fail,
        }
    }
    fn scom() -> Self {
        Self {
            wait: Duration::from_secs(60),
            lines: 10,
            remote_errors: RemoteErrorPolicy::Absorb,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_absorb() -> RemoteErrorPolicy {
    RemoteErrorPolicy::Absorb
}
