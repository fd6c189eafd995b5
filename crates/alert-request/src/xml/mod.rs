//! Builders of the fragments of a `CVGui_AlertCreateReq` document.
//!
//! Every builder returns a `String` fragment. Fragments are concatenated by
//! [`Builder`] in a fixed order, which differs between standard and custom
//! rule alerts.
use crate::lookup::Database;
use chrono::{DateTime, Utc};

mod assemble;
mod criteria;
mod entities;
mod notifications;
mod options;
mod token_rules;

pub use criteria::{build_criteria_fragment, criteria_entries, CriteriaEntry};
pub use entities::build_entity_association_fragment;
pub use notifications::{build_notification_fragment, render_notifications};
pub use options::{
    build_alert_options_fragment, build_cc_recipients_fragment, build_general_info_fragment,
    AlertKind, AlertOptionsInput,
};
pub use token_rules::{build_token_rule_fragment, render_token_rules, ResolvedTokenRule};

/// Escape a value for use within a double-quoted XML attribute.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape a value placed within an XML document which is itself embedded
/// (escaped) as an attribute value of the outer document.
pub fn escape_nested(value: &str) -> String {
    escape_attr(&escape_attr(value))
}

/// Locations of the CommServe which are embedded into notification messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTargets {
    /// Hostname of the CommServe, which serves RSS feeds.
    pub commserve_hostname: String,
    /// Installation directory of the CommServe software.
    pub install_directory: String,
}

/// A complete alert creation request, ready to be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRequest {
    pub alert_name: String,
    pub xml: String,
    pub criteria: Vec<u32>,
    /// Query id of the custom rule backing the alert, if any.
    pub query_id: Option<String>,
}

/// Builder assembles alert requests, resolving database ids as it goes.
pub struct Builder<'a, D: Database + ?Sized> {
    db: &'a D,
    targets: &'a NotificationTargets,
    created_time: DateTime<Utc>,
}

impl<'a, D: Database + ?Sized> Builder<'a, D> {
    pub fn new(db: &'a D, targets: &'a NotificationTargets) -> Self {
        Self {
            db,
            targets,
            created_time: Utc::now(),
        }
    }

    /// Use a fixed creation time rather than the current time.
    pub fn with_created_time(mut self, created_time: DateTime<Utc>) -> Self {
        self.created_time = created_time;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_escaping() {
        assert_eq!(
            escape_attr(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
        assert_eq!(escape_nested("FULL & <INCR>"), "FULL &amp;amp; &amp;lt;INCR&amp;gt;");
        assert_eq!(escape_nested("plain"), "plain");
    }
}
