//! Construction of CommServe alert configuration requests.
//!
//! An alert is configured by submitting a `CVGui_AlertCreateReq` XML document
//! through the server's execute-command endpoint. The document is composed of
//! fragments (entity associations, criteria, per-channel notification
//! messages, ...) which are built here from an [`AlertSpec`] or
//! [`CustomAlertSpec`]. A few fragments embed a second XML document as an
//! escaped attribute value, and values placed within those embedded
//! documents must be escaped twice.
//!
//! Building a request needs a handful of numeric ids that only the CommServe
//! database knows (token ids, per-client application ids, notification
//! templates, user ids). They're resolved through the [`Database`] trait
//! during a single build pass and are not cached.
pub mod catalog;
pub mod custom_rule;
mod details;
pub mod lookup;
mod spec;
pub mod xml;

pub use catalog::{Category, NotificationChannel};
pub use details::{AlertDetails, NonGalaxyList, NonGalaxyUser};
pub use lookup::{Database, QueryResult};
pub use spec::{
    AlertOptions, AlertSpec, Classification, Criteria, CustomAlertSpec, Entity, EntityKind,
    EscalationLevel, EscalationPolicy, NotificationCriteriaPolicy, QuerySource, ReportingPolicy,
    TokenRule,
};
pub use xml::{AlertRequest, Builder, NotificationTargets};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("alert category '{0}' was not found")]
    UnknownCategory(String),
    #[error("alert type '{type_name}' was not found in category {category}")]
    UnknownAlertType {
        category: Category,
        type_name: String,
    },
    #[error("alert name must not be empty")]
    EmptyName,
    #[error("notification channel {0} is listed more than once")]
    DuplicateChannel(NotificationChannel),
    #[error("{0} is not supported for custom rule alerts")]
    UnsupportedOption(&'static str),
    #[error("token rule group '{0}' matched more than one token id")]
    AmbiguousToken(String),
    #[error("failed to resolve {what}")]
    Lookup {
        what: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to read alert rule {path}")]
    ReadRule {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
