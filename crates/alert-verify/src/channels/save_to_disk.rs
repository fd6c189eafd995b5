use crate::{
    poll_until_matched, NotificationVerifier, Patterns, RemoteErrorPolicy, RemoteMachine, Result,
    Schedule, Verified, VerifyConfig,
};
use alert_request::NotificationChannel;

/// SaveToDiskVerifier reads the newest notification saved under the alert's
/// folder of the CommServe's alerts directory. It waits one interval
/// before the first attempt.
pub struct SaveToDiskVerifier<'a> {
    machine: &'a dyn RemoteMachine,
    alert_folder: String,
    schedule: Schedule,
    remote_errors: RemoteErrorPolicy,
}

impl<'a> SaveToDiskVerifier<'a> {
    pub fn new(
        machine: &'a dyn RemoteMachine,
        install_directory: &str,
        alert_name: &str,
        config: &VerifyConfig,
    ) -> Self {
        let schedule = config.schedule();

        Self {
            machine,
            alert_folder: format!("{install_directory}\\alerts\\{alert_name}"),
            schedule: schedule.with_initial_delay(schedule.interval),
            remote_errors: config.save_to_disk.remote_errors,
        }
    }

    async fn check_once(&self, patterns: &Patterns) -> anyhow::Result<bool> {
        let Some(latest) = self.machine.latest_timestamped_entry(&self.alert_folder).await? else {
            return Ok(false);
        };
        let files = self.machine.list_files(&latest).await?;

        let Some(file) = files.first() else {
            return Ok(false);
        };
        let body = self.machine.read_file(file).await?;

        Ok(patterns.matches_all(&body))
    }
}

#[async_trait::async_trait]
impl NotificationVerifier for SaveToDiskVerifier<'_> {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::SaveToDisk
    }

    #[tracing::instrument(skip_all, fields(channel = %NotificationChannel::SaveToDisk))]
    async fn poll(&self, patterns: &Patterns) -> Result<Verified> {
        poll_until_matched(
            NotificationChannel::SaveToDisk,
            &self.schedule,
            self.remote_errors,
            move |_| self.check_once(patterns),
        )
        .await
    }
}
