use crate::catalog::{Category, NotificationChannel, PARAMS_LIST_CRITERIA};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Classification of an alert: a category and one of its alert types.
/// Construction fails for combinations which aren't in the static catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ClassificationRepr", into = "ClassificationRepr")]
pub struct Classification {
    category: Category,
    type_name: String,
    type_id: u32,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassificationRepr {
    category: String,
    #[serde(rename = "type")]
    type_name: String,
}

impl Classification {
    pub fn new(category: Category, type_name: &str) -> Result<Self> {
        let Some(type_id) = category.type_id(type_name) else {
            return Err(Error::UnknownAlertType {
                category,
                type_name: type_name.to_string(),
            });
        };
        Ok(Self {
            category,
            type_name: type_name.to_string(),
            type_id,
        })
    }

    /// Parse a classification from the category and type display names.
    pub fn parse(category: &str, type_name: &str) -> Result<Self> {
        let Some(category) = Category::from_name(category) else {
            return Err(Error::UnknownCategory(category.to_string()));
        };
        Self::new(category, type_name)
    }

    pub fn category(&self) -> Category {
        self.category
    }
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
    pub fn type_id(&self) -> u32 {
        self.type_id
    }
}

impl TryFrom<ClassificationRepr> for Classification {
    type Error = Error;

    fn try_from(repr: ClassificationRepr) -> Result<Self> {
        Self::parse(&repr.category, &repr.type_name)
    }
}

impl From<Classification> for ClassificationRepr {
    fn from(c: Classification) -> Self {
        ClassificationRepr {
            category: c.category.name().to_string(),
            type_name: c.type_name,
        }
    }
}

/// Kind of an entity which an alert may be associated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Clients,
    ClientGroups,
    DiskLibraries,
    MediaAgents,
    StoragePolicies,
}

impl EntityKind {
    /// Attribute names for the entity's name and id, and its `_type_` code.
    pub fn attributes(&self) -> (&'static str, &'static str, u32) {
        match self {
            EntityKind::Clients => ("clientName", "clientId", 3),
            EntityKind::ClientGroups => ("clientGroupName", "clientGroupId", 28),
            EntityKind::DiskLibraries => ("libraryName", "libraryId", 9),
            EntityKind::MediaAgents => ("mediaAgentName", "mediaAgentId", 11),
            EntityKind::StoragePolicies => ("storagePolicyName", "storagePolicyId", 17),
        }
    }
}

/// An entity, with its resolved id, which the alert monitors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Entity {
    pub kind: EntityKind,
    pub name: String,
    pub id: u64,
}

/// Criteria which trigger the alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Criteria {
    Single(u32),
    Many(Vec<u32>),
}

impl Criteria {
    pub fn ids(&self) -> &[u32] {
        match self {
            Criteria::Single(id) => std::slice::from_ref(id),
            Criteria::Many(ids) => ids,
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, Criteria::Single(_))
    }
}

/// A filter on a named message token of the alert, such as a backup level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenRule {
    /// Token rule group name, without angle brackets (ex, "LEVEL").
    pub rule: String,
    pub value: String,
    #[serde(default)]
    pub operator: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationLevel {
    Primary = 1,
    Escalated = 2,
}

impl EscalationLevel {
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }
}

/// Reporting policy of a notification tier: whether to notify only if the
/// condition persists, whether to repeat notifications, and whether to notify
/// when the condition clears. Each present field toggles a bit of the
/// criteria's `reportingOptions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportingPolicy {
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub notify_if_persists: Option<Duration>,
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub repeat_notif: Option<Duration>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub notify_condition_clears: bool,
}

impl ReportingPolicy {
    pub fn delay_seconds(&self) -> u64 {
        self.notify_if_persists.map(|d| d.as_secs()).unwrap_or(0)
    }

    pub fn persist_seconds(&self) -> u64 {
        self.repeat_notif.map(|d| d.as_secs()).unwrap_or(0)
    }

    /// Reporting options bitmask of this policy at the given level.
    /// The primary tier always carries the base bit, and uses a different
    /// bit for notify-if-persists than the escalated tier.
    pub fn reporting_options(&self, level: EscalationLevel) -> u32 {
        let (base, persists) = match level {
            EscalationLevel::Primary => (1, 256),
            EscalationLevel::Escalated => (0, 8),
        };
        let mut options = base;
        if self.notify_if_persists.is_some() {
            options += persists;
        }
        if self.repeat_notif.is_some() {
            options += 2;
        }
        if self.notify_condition_clears {
            options += 4;
        }
        options
    }
}

pub type NotificationCriteriaPolicy = ReportingPolicy;
pub type EscalationPolicy = ReportingPolicy;

/// Optional settings of an alert. Unrecognized keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertOptions {
    /// Token rules which further filter the alert's messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub token_rules: Vec<TokenRule>,
    /// Application (IDA) types to which client associations are scoped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ida_types: Option<Vec<String>>,
    /// Send an individual notification for every matching job.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub send_individual_notifications: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_criteria: Option<NotificationCriteriaPolicy>,
    /// Presence of an escalation policy adds a second notification tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_criteria: Option<EscalationPolicy>,
    /// Users to include as To recipients.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_users: Vec<String>,
    /// User groups to include as To recipients.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_user_groups: Vec<String>,
    /// Mail addresses which receive escalated notifications.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub escalation_recipients: Vec<String>,
}

impl AlertOptions {
    pub fn escalates(&self) -> bool {
        self.escalation_criteria.is_some()
    }
}

/// Description of a standard alert to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertSpec {
    pub name: String,
    pub classification: Classification,
    pub channels: Vec<NotificationChannel>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    pub criteria: Criteria,
    #[serde(default)]
    pub options: AlertOptions,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc_recipients: Vec<String>,
    /// Auxiliary params, used only by criteria which accept them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params_list: Option<Vec<String>>,
}

impl AlertSpec {
    pub fn validate(&self) -> Result<()> {
        validate_common(&self.name, &self.channels)
    }

    /// Params list of the alert, if its criteria accepts one.
    pub fn effective_params_list(&self) -> Option<&[String]> {
        let params = self.params_list.as_deref()?;
        let accepted = self
            .criteria
            .ids()
            .iter()
            .all(|id| PARAMS_LIST_CRITERIA.contains(id));

        if self.criteria.is_single() && accepted {
            Some(params)
        } else {
            tracing::debug!(criteria = ?self.criteria, "criteria doesn't accept a params list");
            None
        }
    }
}

/// Source of the SQL query behind a custom rule alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuerySource {
    /// Id of a rule previously imported into the CommServe.
    QueryId(String),
    /// Inline, already escaped, custom query details document.
    Details(String),
}

/// Description of a custom rule alert, which fires on the results of a SQL
/// query imported as a named rule rather than a built-in criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomAlertSpec {
    pub name: String,
    pub classification: Classification,
    pub channels: Vec<NotificationChannel>,
    /// Associate the alert with the whole CommCell rather than no entity.
    #[serde(default)]
    pub associated_at_commcell_level: bool,
    #[serde(default)]
    pub options: AlertOptions,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc_recipients: Vec<String>,
}

impl CustomAlertSpec {
    pub fn validate(&self) -> Result<()> {
        validate_common(&self.name, &self.channels)?;

        let AlertOptions {
            token_rules,
            ida_types,
            escalation_recipients,
            ..
        } = &self.options;

        if !token_rules.is_empty() {
            return Err(Error::UnsupportedOption("token_rules"));
        }
        if ida_types.is_some() {
            return Err(Error::UnsupportedOption("ida_types"));
        }
        if !escalation_recipients.is_empty() {
            return Err(Error::UnsupportedOption("escalation_recipients"));
        }
        Ok(())
    }
}

fn validate_common(name: &str, channels: &[NotificationChannel]) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::EmptyName);
    }
    for (index, channel) in channels.iter().enumerate() {
        if channels[..index].contains(channel) {
            return Err(Error::DuplicateChannel(*channel));
        }
    }
    Ok(())
}
