use crate::{
    poll_until_matched, NotificationVerifier, Patterns, RemoteErrorPolicy, RemoteMachine, Result,
    Schedule, Verified, VerifyConfig,
};
use alert_request::NotificationChannel;

/// RssVerifier reads the newest feed item written by the CommServe.
/// Each feed item is a timestamped folder which holds a single HTML file.
pub struct RssVerifier<'a> {
    machine: &'a dyn RemoteMachine,
    feed_folder: String,
    schedule: Schedule,
    remote_errors: RemoteErrorPolicy,
}

impl<'a> RssVerifier<'a> {
    pub fn new(
        machine: &'a dyn RemoteMachine,
        install_directory: &str,
        config: &VerifyConfig,
    ) -> Self {
        Self {
            machine,
            feed_folder: format!("{install_directory}\\rss\\alertDetail"),
            schedule: config.schedule(),
            remote_errors: config.rss.remote_errors,
        }
    }

    async fn check_once(&self, patterns: &Patterns) -> anyhow::Result<bool> {
        let Some(latest) = self.machine.latest_timestamped_entry(&self.feed_folder).await? else {
            return Ok(false);
        };
        let files = self.machine.list_files(&latest).await?;

        match files.as_slice() {
            [] => Ok(false),
            [file] => {
                let body = self.machine.read_file(file).await?;
                Ok(patterns.matches_all(&body))
            }
            _ => {
                tracing::warn!(
                    folder = %latest,
                    files = files.len(),
                    "feed item holds more than one file"
                );
                Ok(false)
            }
        }
    }
}

#[async_trait::async_trait]
impl NotificationVerifier for RssVerifier<'_> {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Rss
    }

    #[tracing::instrument(skip_all, fields(channel = %NotificationChannel::Rss))]
    async fn poll(&self, patterns: &Patterns) -> Result<Verified> {
        poll_until_matched(
            NotificationChannel::Rss,
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
    use std::collections::HashMap;

    const ITEM: &str = "C:\\CV\\rss\\alertDetail\\1700000000";

    #[tokio::test(start_paused = true)]
    async fn test_feed_appears_on_third_attempt() {
        let machine = FakeMachine {
            latest: Script::new(vec![
                Ok(None),
                Ok(Some("C:\\CV\\rss\\alertDetail\\empty".to_string())),
                Ok(Some(ITEM.to_string())),
            ]),
            files: HashMap::from([(ITEM.to_string(), vec![format!("{ITEM}\\feed.html")])]),
            contents: HashMap::from([(
                format!("{ITEM}\\feed.html"),
                "<td>Alert Name: a</td><td>Status: Completed</td>".to_string(),
            )]),
            ..Default::default()
        };
        let verifier = RssVerifier::new(&machine, "C:\\CV", &VerifyConfig::default());

        let verified = verifier
            .poll(&Patterns::new(["Alert Name: a", "Completed"]).unwrap())
            .await
            .unwrap();
        assert_eq!(verified.attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_multiple_files_are_not_yet_received() {
        let machine = FakeMachine {
            latest: Script::new(vec![Ok(Some(ITEM.to_string()))]),
            files: HashMap::from([(ITEM.to_string(), vec!["one".to_string(), "two".to_string()])]),
            ..Default::default()
        };
        let verifier = RssVerifier::new(&machine, "C:\\CV", &VerifyConfig::default());

        let err = verifier.poll(&Patterns::new(["a"]).unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::NotificationTimeout { attempts: 5, .. }));
        assert!(!machine.requests.lock().unwrap().iter().any(|r| r.starts_with("read")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_errors_fail() {
        let machine = FakeMachine {
            latest: Script::new(vec![Err("access is denied".to_string())]),
            ..Default::default()
        };
        let verifier = RssVerifier::new(&machine, "C:\\CV", &VerifyConfig::default());

        let err = verifier.poll(&Patterns::new(["a"]).unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::TransportFailure { attempt: 1, .. }));
    }
}
