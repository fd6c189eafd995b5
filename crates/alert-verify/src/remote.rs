//! Collaborators through which notifications are observed.
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// RemoteMachine accesses the CommServe host's filesystem and shell.
/// Paths use the host's (Windows) separators.
#[async_trait::async_trait]
pub trait RemoteMachine: Send + Sync {
    /// Most recently created file or folder within `folder`, or None if the
    /// folder doesn't exist or is empty.
    async fn latest_timestamped_entry(&self, folder: &str) -> anyhow::Result<Option<String>>;
    /// Paths of the files within `folder`.
    async fn list_files(&self, folder: &str) -> anyhow::Result<Vec<String>>;
    async fn read_file(&self, path: &str) -> anyhow::Result<String>;
    /// Run a PowerShell command, returning its output.
    async fn run_command(&self, command: &str) -> anyhow::Result<String>;
}

/// Mailbox is a connection to the mailbox which receives alert emails.
#[async_trait::async_trait]
pub trait Mailbox: Send + Sync {
    async fn connect(&mut self) -> anyhow::Result<()>;
    async fn disconnect(&mut self) -> anyhow::Result<()>;
    /// Ids of the messages which match the filter, oldest first.
    async fn search(&self, filter: &EmailSearchFilter) -> anyhow::Result<Vec<String>>;
    async fn message_body(&self, id: &str) -> anyhow::Result<String>;
}

/// Alert emails are searched for by the sending date of the mail server's
/// timezone (UTC+05:30).
const MAIL_SERVER_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Search criteria of alert emails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSearchFilter {
    pub subject: String,
    pub sender: String,
    pub sent_on: NaiveDate,
    pub unread_only: bool,
    pub folder: String,
}

impl EmailSearchFilter {
    /// Filter for notifications of the named alert. `type_name` is the alert
    /// type, or the rule name of a custom rule alert.
    pub fn for_alert(
        alert_name: &str,
        category: &str,
        type_name: &str,
        sender: &str,
        unread_only: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let offset =
            FixedOffset::east_opt(MAIL_SERVER_OFFSET_SECS).expect("offset is less than a day");

        Self {
            // The server pads subjects with three trailing spaces.
            subject: format!("Alert: {alert_name} Type: {category} - {type_name}   "),
            sender: sender.to_string(),
            sent_on: now.with_timezone(&offset).date_naive(),
            unread_only,
            folder: "INBOX".to_string(),
        }
    }
}

/// An entry of the console alerts feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleFeedEntry {
    pub alert_name: String,
    pub live_feed_id: u64,
}

/// ConsoleFeed reads the alerts shown on the CommCell console.
#[async_trait::async_trait]
pub trait ConsoleFeed: Send + Sync {
    async fn entries(&self, page_no: u32, page_count: u32) -> anyhow::Result<Vec<ConsoleFeedEntry>>;
    async fn description(&self, live_feed_id: u64) -> anyhow::Result<String>;
}
