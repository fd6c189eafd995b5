use crate::{
    poll_until_matched, EmailSearchFilter, Mailbox, NotificationVerifier, Patterns,
    RemoteErrorPolicy, Result, Schedule, Verified, VerifyConfig,
};
use alert_request::NotificationChannel;
use anyhow::Context;

/// EmailVerifier searches the mailbox for the alert's notification mail.
///
/// When only unread mail of a single criteria alert is considered, just the
/// most recent matching message is checked. Otherwise, every message
/// returned by the search is checked within a single attempt.
pub struct EmailVerifier<'a> {
    mailbox: &'a dyn Mailbox,
    filter: EmailSearchFilter,
    single_criteria: bool,
    schedule: Schedule,
    remote_errors: RemoteErrorPolicy,
}

impl<'a> EmailVerifier<'a> {
    pub fn new(
        mailbox: &'a dyn Mailbox,
        filter: EmailSearchFilter,
        single_criteria: bool,
        config: &VerifyConfig,
    ) -> Self {
        Self {
            mailbox,
            filter,
            single_criteria,
            schedule: config.schedule(),
            remote_errors: config.email.remote_errors,
        }
    }

    async fn check_once(&self, patterns: &Patterns, attempt: u32) -> anyhow::Result<bool> {
        let ids = self
            .mailbox
            .search(&self.filter)
            .await
            .context("searching the mailbox")?;

        tracing::debug!(
            attempt,
            found = ids.len(),
            subject = %self.filter.subject,
            "searched for alert mail"
        );

        let candidates = match ids.split_last() {
            None => return Ok(false),
            Some((latest, _)) if self.filter.unread_only && self.single_criteria => {
                std::slice::from_ref(latest)
            }
            Some(_) => ids.as_slice(),
        };

        for id in candidates {
            let body = self
                .mailbox
                .message_body(id)
                .await
                .with_context(|| format!("reading message {id}"))?;

            if patterns.matches_all(&body) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait::async_trait]
impl NotificationVerifier for EmailVerifier<'_> {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Email
    }

    #[tracing::instrument(skip_all, fields(channel = %NotificationChannel::Email))]
    async fn poll(&self, patterns: &Patterns) -> Result<Verified> {
        poll_until_matched(
            NotificationChannel::Email,
            &self.schedule,
            self.remote_errors,
            move |attempt| self.check_once(patterns, attempt),
        )
        .await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::channels::fixtures::Script;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeMailbox {
        search: Script<Vec<String>>,
        bodies: HashMap<String, String>,
        read: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Mailbox for FakeMailbox {
        async fn connect(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
        async fn disconnect(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
        async fn search(&self, _filter: &EmailSearchFilter) -> anyhow::Result<Vec<String>> {
            self.search.next()
        }
        async fn message_body(&self, id: &str) -> anyhow::Result<String> {
            self.read.lock().unwrap().push(id.to_string());
            Ok(self.bodies.get(id).cloned().unwrap_or_default())
        }
    }

    fn mailbox() -> FakeMailbox {
        FakeMailbox {
            search: Script::new(vec![Ok(vec!["1".to_string(), "2".to_string()])]),
            bodies: HashMap::from([
                ("1".to_string(), "Job ID: 41 Status: Completed".to_string()),
                ("2".to_string(), "Job ID: 42 Status: Failed".to_string()),
            ]),
            read: Mutex::new(Vec::new()),
        }
    }

    fn filter(unread_only: bool) -> EmailSearchFilter {
        EmailSearchFilter::for_alert(
            "a",
            "Job Management",
            "Data Protection",
            "cs",
            unread_only,
            Utc::now(),
        )
    }

    fn config() -> VerifyConfig {
        VerifyConfig {
            max_attempts: 2,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unread_single_criteria_checks_latest_only() {
        let mailbox = mailbox();
        let verifier = EmailVerifier::new(&mailbox, filter(true), true, &config());
        let patterns = Patterns::new(["Status: Completed"]).unwrap();

        let err = verifier.poll(&patterns).await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::NotificationTimeout { attempts: 2, .. }
        ));
        assert_eq!(*mailbox.read.lock().unwrap(), vec!["2", "2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_messages_scanned_within_one_attempt() {
        let mailbox = mailbox();
        let verifier = EmailVerifier::new(&mailbox, filter(false), true, &config());
        let patterns = Patterns::new(["Status: Completed"]).unwrap();

        let verified = verifier.poll(&patterns).await.unwrap();
        assert_eq!(verified.attempts, 1);
        assert_eq!(*mailbox.read.lock().unwrap(), vec!["1"]);
    }
}
