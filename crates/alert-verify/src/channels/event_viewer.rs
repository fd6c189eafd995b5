use crate::{
    poll_until_matched, NotificationVerifier, Patterns, RemoteErrorPolicy, RemoteMachine, Result,
    Schedule, Verified, VerifyConfig,
};
use alert_request::NotificationChannel;

/// EventViewerVerifier matches the latest Windows event logged on the CommServe.
pub struct EventViewerVerifier<'a> {
    machine: &'a dyn RemoteMachine,
    command: String,
    schedule: Schedule,
    remote_errors: RemoteErrorPolicy,
}

impl<'a> EventViewerVerifier<'a> {
    pub fn new(machine: &'a dyn RemoteMachine, config: &VerifyConfig) -> Self {
        Self {
            machine,
            command: config.event_viewer.command.clone(),
            schedule: config.schedule(),
            remote_errors: config.event_viewer.remote_errors,
        }
    }

    async fn check_once(&self, patterns: &Patterns) -> anyhow::Result<bool> {
        let message = self.machine.run_command(&self.command).await?;

        if let Some(pattern) = patterns.first_mismatch(&message) {
            tracing::debug!(%pattern, "latest event doesn't match");
            return Ok(false);
        }
        Ok(true)
    }
}

#[async_trait::async_trait]
impl NotificationVerifier for EventViewerVerifier<'_> {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::EventViewer
    }

    #[tracing::instrument(skip_all, fields(channel = %NotificationChannel::EventViewer))]
    async fn poll(&self, patterns: &Patterns) -> Result<Verified> {
        poll_until_matched(
            NotificationChannel::EventViewer,
            &self.schedule,
            self.remote_errors,
            move |_| self.check_once(patterns),
        )
        .await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::channels::fixtures::{FakeMachine, Script};
    use crate::Error;

    #[tokio::test(start_paused = true)]
    async fn test_command_errors_are_absorbed_per_policy() {
        let script = || {
            Script::new(vec![
                Err("WinRM timeout".to_string()),
                Ok("Alert: other".to_string()),
                Ok("Alert: ev-alert Severity: Information".to_string()),
            ])
        };
        let patterns = Patterns::new(["Alert: ev-alert", "Severity"]).unwrap();

        let machine = FakeMachine {
            command: script(),
            ..Default::default()
        };
        let verified = EventViewerVerifier::new(&machine, &VerifyConfig::default())
            .poll(&patterns)
            .await
            .unwrap();
        assert_eq!(verified.attempts, 3);

        let mut config = VerifyConfig::default();
        config.event_viewer.remote_errors = RemoteErrorPolicy::Fail;
        let machine = FakeMachine {
            command: script(),
            ..Default::default()
        };
        let err = EventViewerVerifier::new(&machine, &config)
            .poll(&patterns)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TransportFailure { attempt: 1, .. }));
    }
}
