use crate::{
    poll_until_matched, LogWindowSettings, NotificationVerifier, Patterns, RemoteErrorPolicy,
    RemoteMachine, Result, Schedule, Verified, VerifyConfig,
};
use alert_request::NotificationChannel;
use std::time::Duration;

/// The trailing `lines` lines of `body`, joined by spaces.
pub fn tail_window(body: &str, lines: usize) -> String {
    let all: Vec<&str> = body.split('\n').collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join(" ")
}

/// LogWindowVerifier waits once, then searches the trailing lines of a log
/// on the CommServe which records delivered notifications. SNMP traps are
/// recorded in `SentAlerts.log`, and SCOM notifications in `GalaxySCOM.csv`.
pub struct LogWindowVerifier<'a> {
    machine: &'a dyn RemoteMachine,
    channel: NotificationChannel,
    path: String,
    lines: usize,
    schedule: Schedule,
    remote_errors: RemoteErrorPolicy,
}

impl<'a> LogWindowVerifier<'a> {
    pub fn snmp(
        machine: &'a dyn RemoteMachine,
        install_directory: &str,
        config: &VerifyConfig,
    ) -> Self {
        Self::new(
            machine,
            NotificationChannel::Snmp,
            format!("{install_directory}\\Log Files\\SentAlerts.log"),
            &config.snmp,
        )
    }

    pub fn scom(
        machine: &'a dyn RemoteMachine,
        install_directory: &str,
        config: &VerifyConfig,
    ) -> Self {
        Self::new(
            machine,
            NotificationChannel::Scom,
            format!("{install_directory}\\Scom\\GalaxySCOM.csv"),
            &config.scom,
        )
    }

    fn new(
        machine: &'a dyn RemoteMachine,
        channel: NotificationChannel,
        path: String,
        settings: &LogWindowSettings,
    ) -> Self {
        Self {
            machine,
            channel,
            path,
            lines: settings.lines,
            schedule: Schedule::new(1, Duration::ZERO).with_initial_delay(settings.wait),
            remote_errors: settings.remote_errors,
        }
    }

    async fn check_once(&self, patterns: &Patterns) -> anyhow::Result<bool> {
        let body = self.machine.read_file(&self.path).await?;
        let window = tail_window(&body, self.lines);

        Ok(patterns.matches_all(&window))
    }
}

#[async_trait::async_trait]
impl NotificationVerifier for LogWindowVerifier<'_> {
    fn channel(&self) -> NotificationChannel {
        self.channel
    }

    #[tracing::instrument(skip_all, fields(channel = %self.channel, path = %self.path))]
    async fn poll(&self, patterns: &Patterns) -> Result<Verified> {
        poll_until_matched(
            self.channel,
            &self.schedule,
            self.remote_errors,
            move |_| self.check_once(patterns),
        )
        .await
    }
}
