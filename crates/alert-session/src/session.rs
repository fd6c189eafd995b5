use crate::client::{AlertHandle, ImportedRule, RemoteClient};
use crate::config::Config;
use crate::transport::Transport;
use crate::{Error, Result};
use alert_request::{
    custom_rule, AlertRequest, AlertSpec, Builder, Classification, CustomAlertSpec, Database,
    NotificationChannel, NotificationTargets, QuerySource,
};
use alert_verify::channels::{
    ConsoleVerifier, EmailVerifier, EventViewerVerifier, LogWindowVerifier, RssVerifier,
    SaveToDiskVerifier,
};
use alert_verify::{
    EmailSearchFilter, Mailbox, NotificationVerifier, Patterns, RemoteMachine, Verified,
};
use std::sync::Arc;

/// State of an [`AlertSession`]. Sessions move forward through
/// `Unconfigured → Built → Created → Verified → Deleted`, and may verify
/// any number of times once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconfigured,
    Built,
    Created,
    Verified,
    Deleted,
}

/// A step of session cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStep {
    DeleteAlert,
    DisconnectMailbox,
    DeleteRule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    pub step: CleanupStep,
    pub error: String,
}

/// Outcome of [`AlertSession::cleanup`]. Every step is attempted, and
/// failed steps are recorded here rather than returned as errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, step: CleanupStep, error: impl Into<anyhow::Error>) {
        let error = format!("{:#}", error.into());
        tracing::error!(?step, %error, "cleanup step failed");

        self.failures.push(CleanupFailure { step, error });
    }
}

/// Built request, and what verification needs to know of it.
struct Pending {
    request: AlertRequest,
    classification: Classification,
    channels: Vec<NotificationChannel>,
    /// Alert type named by notification emails. For custom rule alerts
    /// this is the rule's name.
    email_type_name: String,
    single_criteria: bool,
}

/// AlertSession tracks one alert under test through its lifecycle: building
/// its creation request, creating it, verifying its notifications, and
/// cleaning up everything it created.
pub struct AlertSession {
    config: Config,
    targets: NotificationTargets,
    client: RemoteClient,
    db: Arc<dyn Database>,
    machine: Arc<dyn RemoteMachine>,
    mailbox: Option<Box<dyn Mailbox>>,
    rule: Option<ImportedRule>,
    pending: Option<Pending>,
    handle: Option<AlertHandle>,
    state: SessionState,
}

impl AlertSession {
    pub fn new(
        config: Config,
        transport: Arc<dyn Transport>,
        db: Arc<dyn Database>,
        machine: Arc<dyn RemoteMachine>,
    ) -> Self {
        Self {
            targets: config.targets(),
            config,
            client: RemoteClient::new(transport),
            db,
            machine,
            mailbox: None,
            rule: None,
            pending: None,
            handle: None,
            state: SessionState::Unconfigured,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn client(&self) -> &RemoteClient {
        &self.client
    }

    /// Handle of the created alert, if it's been created.
    pub fn handle(&self) -> Option<&AlertHandle> {
        self.handle.as_ref()
    }

    fn expect_state(&self, operation: &'static str, allowed: &[SessionState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Import the custom rule document `file` of the rule directory, using
    /// the configured query frequency. The rule is deleted on cleanup.
    #[tracing::instrument(skip(self))]
    pub async fn import_rule(&mut self, file: &str) -> Result<&ImportedRule> {
        self.expect_state("import a rule", &[SessionState::Unconfigured])?;

        let xml = custom_rule::read_alert_rule(&self.config.rule_directory, file).await?;
        let xml =
            custom_rule::set_custom_alert_frequency(&xml, self.config.query_frequency.as_secs());

        let name = match custom_rule::custom_query_name(&xml) {
            Some(name) => name.to_string(),
            None => {
                let stem = file.strip_suffix(".xml").unwrap_or(file);
                tracing::warn!(rule = stem, "rule document doesn't name its query");
                stem.to_string()
            }
        };
        let query_id = self.client.import_rule(&name, &xml).await?;

        Ok(self.rule.insert(ImportedRule { name, query_id }))
    }

    /// Build the creation request of a standard alert.
    pub async fn build_standard(&mut self, spec: &AlertSpec) -> Result<&AlertRequest> {
        self.expect_state(
            "build an alert",
            &[SessionState::Unconfigured, SessionState::Built],
        )?;

        let request = Builder::new(&*self.db, &self.targets)
            .assemble_standard_alert(spec)
            .await?;

        self.set_pending(Pending {
            request,
            classification: spec.classification.clone(),
            channels: spec.channels.clone(),
            email_type_name: spec.classification.type_name().to_string(),
            single_criteria: spec.criteria.is_single(),
        })
    }

    /// Build the creation request of a custom rule alert. Without a
    /// `source`, the alert uses the session's imported rule.
    pub async fn build_custom(
        &mut self,
        spec: &CustomAlertSpec,
        source: Option<QuerySource>,
    ) -> Result<&AlertRequest> {
        self.expect_state(
            "build an alert",
            &[SessionState::Unconfigured, SessionState::Built],
        )?;

        let source = match (source, &self.rule) {
            (Some(source), _) => source,
            (None, Some(rule)) => QuerySource::QueryId(rule.query_id.clone()),
            (None, None) => return Err(Error::MissingRule),
        };
        let request = Builder::new(&*self.db, &self.targets)
            .assemble_custom_alert(spec, &source)
            .await?;

        let email_type_name = match &self.rule {
            Some(rule) => rule.name.clone(),
            None => spec.classification.type_name().to_string(),
        };
        self.set_pending(Pending {
            request,
            classification: spec.classification.clone(),
            channels: spec.channels.clone(),
            email_type_name,
            single_criteria: true,
        })
    }

    fn set_pending(&mut self, pending: Pending) -> Result<&AlertRequest> {
        self.state = SessionState::Built;
        Ok(&self.pending.insert(pending).request)
    }

    /// Create the built alert on the CommServe.
    pub async fn create(&mut self) -> Result<&AlertHandle> {
        self.expect_state("create the alert", &[SessionState::Built])?;
        let Some(pending) = &self.pending else {
            return Err(Error::InvalidState {
                operation: "create the alert",
                state: self.state,
            });
        };

        let mut handle = self.client.create(&pending.request).await?;
        handle.rule = self.rule.clone();

        self.state = SessionState::Created;
        Ok(self.handle.insert(handle))
    }

    /// Connect to the mailbox which receives the alert's emails. The
    /// mailbox is disconnected on cleanup.
    pub async fn open_mailbox(&mut self, mut mailbox: Box<dyn Mailbox>) -> Result<()> {
        mailbox.connect().await.map_err(Error::Mailbox)?;
        self.mailbox = Some(mailbox);
        Ok(())
    }

    /// Search filter of the created alert's notification emails.
    pub async fn email_filter(&self) -> Result<EmailSearchFilter> {
        self.expect_state(
            "search for alert email",
            &[SessionState::Created, SessionState::Verified],
        )?;
        let (Some(pending), Some(handle)) = (&self.pending, &self.handle) else {
            return Err(Error::InvalidState {
                operation: "search for alert email",
                state: self.state,
            });
        };
        let sender = self.client.alert_sender().await?;

        Ok(EmailSearchFilter::for_alert(
            &handle.alert_name,
            pending.classification.category().name(),
            &pending.email_type_name,
            &sender,
            self.config.verify.email.unread_only,
            chrono::Utc::now(),
        ))
    }

    /// Verify that the created alert's notification was delivered through
    /// `channel`, with a body matching every one of `patterns`.
    #[tracing::instrument(skip(self, patterns), fields(alert_name = tracing::field::Empty))]
    pub async fn verify(
        &mut self,
        channel: NotificationChannel,
        patterns: &[&str],
    ) -> Result<Verified> {
        self.expect_state(
            "verify notifications",
            &[SessionState::Created, SessionState::Verified],
        )?;
        let (Some(pending), Some(handle)) = (&self.pending, &self.handle) else {
            return Err(Error::InvalidState {
                operation: "verify notifications",
                state: self.state,
            });
        };
        tracing::Span::current().record("alert_name", handle.alert_name.as_str());

        if !pending.channels.contains(&channel) {
            tracing::warn!(%channel, "channel isn't configured for the alert");
        }
        let patterns = Patterns::new(patterns)?;

        let config = &self.config.verify;
        let install = self.targets.install_directory.as_str();
        let machine = &*self.machine;

        let verified = {
            let verifier: Box<dyn NotificationVerifier + '_> = match channel {
                NotificationChannel::Email => {
                    let Some(mailbox) = self.mailbox.as_deref() else {
                        return Err(Error::MissingMailbox);
                    };
                    let filter = self.email_filter().await?;
                    Box::new(EmailVerifier::new(mailbox, filter, pending.single_criteria, config))
                }
                NotificationChannel::Rss => Box::new(RssVerifier::new(machine, install, config)),
                NotificationChannel::SaveToDisk => Box::new(SaveToDiskVerifier::new(
                    machine,
                    install,
                    &handle.alert_name,
                    config,
                )),
                NotificationChannel::EventViewer => {
                    Box::new(EventViewerVerifier::new(machine, config))
                }
                NotificationChannel::Snmp => {
                    Box::new(LogWindowVerifier::snmp(machine, install, config))
                }
                NotificationChannel::Scom => {
                    Box::new(LogWindowVerifier::scom(machine, install, config))
                }
                NotificationChannel::Console => {
                    Box::new(ConsoleVerifier::new(&self.client, &handle.alert_name))
                }
            };
            verifier.poll(&patterns).await?
        };

        tracing::info!(%channel, attempts = verified.attempts, "verified notification");
        self.state = SessionState::Verified;
        Ok(verified)
    }

    /// Delete the alert if it was created, disconnect the mailbox, and
    /// delete the imported rule. Every step is attempted, and failures are
    /// logged and reported rather than returned.
    #[tracing::instrument(skip(self))]
    pub async fn cleanup(&mut self) -> Result<CleanupReport> {
        if self.state == SessionState::Deleted {
            return Err(Error::AlreadyDeleted);
        }
        let mut report = CleanupReport::default();

        if let Some(handle) = &self.handle {
            if let Err(err) = self.client.delete(&handle.alert_name).await {
                report.record(CleanupStep::DeleteAlert, err);
            }
        }
        if let Some(mut mailbox) = self.mailbox.take() {
            if let Err(err) = mailbox.disconnect().await {
                report.record(CleanupStep::DisconnectMailbox, err);
            }
        }
        if let Some(rule) = self.rule.take() {
            if let Err(err) = self.client.delete_rule(&rule.name, &rule.query_id).await {
                report.record(CleanupStep::DeleteRule, err);
            }
        }

        tracing::info!(failures = report.failures.len(), "cleaned up alert session");
        self.state = SessionState::Deleted;
        Ok(report)
    }
}
