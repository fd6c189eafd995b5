use super::escape_attr;
use crate::catalog::NotificationChannel;
use crate::lookup::{self, Database};
use crate::spec::{AlertOptions, Classification};
use chrono::{DateTime, Utc};

/// Kind of alert request being assembled. Custom rule alerts differ in a
/// few fixed fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Standard,
    Custom,
}

/// Status bit requesting an individual notification per matching job.
const STATUS_INDIVIDUAL_NOTIFICATIONS: u32 = 16;

/// Inputs of the `<alert>` element and the recipient lists which follow it.
pub struct AlertOptionsInput<'a> {
    pub name: &'a str,
    pub classification: &'a Classification,
    pub channels: &'a [NotificationChannel],
    pub options: &'a AlertOptions,
    pub created_time: DateTime<Utc>,
    pub kind: AlertKind,
}

/// Build the `<alert>` element, followed by To user and user group lists and,
/// for standard alerts, escalation recipients.
/// Users or groups which can't be resolved are logged and skipped.
pub async fn build_alert_options_fragment<D: Database + ?Sized>(
    db: &D,
    input: AlertOptionsInput<'_>,
) -> String {
    let AlertOptionsInput {
        name,
        classification,
        channels,
        options,
        created_time,
        kind,
    } = input;

    let notif_type: u32 = channels.iter().map(NotificationChannel::code).sum();
    let status = if options.send_individual_notifications {
        STATUS_INDIVIDUAL_NOTIFICATIONS
    } else {
        0
    };
    let category = classification.category();

    let mut out = format!(
        "<alert GUID=\"\" createdTime=\"{}.{:06}\" description=\"\" escNotifType=\"0\" \
         notifType=\"{notif_type}\" organizationId=\"0\" origCCId=\"0\" status=\"{status}\">\
         <alert id=\"0\" name=\"{}\" />\
         <alertCategory id=\"{}\" name=\"{}\" />\
         <alertType id=\"{}\" name=\"{}\" />\
         <creator id=\"1\" name=\"admin\" /></alert>",
        created_time.timestamp(),
        created_time.timestamp_subsec_micros(),
        escape_attr(name),
        category.id(),
        escape_attr(category.name()),
        classification.type_id(),
        escape_attr(classification.type_name()),
    );
    if kind == AlertKind::Custom {
        out.push_str("<appTypeFilters/>");
    }

    for user in &options.to_users {
        match lookup::user_id(db, user).await {
            Ok(id) => out.push_str(&format!(
                "<userList id1=\"{id}\" id2=\"1\" name=\"{}\" />",
                escape_attr(user)
            )),
            Err(error) => tracing::info!(%user, ?error, "couldn't resolve To user, skipping"),
        }
    }
    for group in &options.to_user_groups {
        match lookup::user_group_id(db, group).await {
            Ok(id) => out.push_str(&format!(
                "<userGroupList id1=\"{id}\" id2=\"1\" name=\"{}\" />",
                escape_attr(group)
            )),
            Err(error) => {
                tracing::info!(%group, ?error, "couldn't resolve To user group, skipping")
            }
        }
    }

    if kind == AlertKind::Standard {
        for recipient in &options.escalation_recipients {
            out.push_str(&format!(
                "<nonGalaxyUserList id1=\"0\" id2=\"2\" name=\"{}\" />",
                escape_attr(recipient)
            ));
        }
    }
    out
}

pub fn build_general_info_fragment(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Standard => {
            "<locale localeID=\"0\" localeName=\"\" />\
             <reportingParams delayTimeSeconds=\"0\" persistTimeSeconds=\"0\" reportingOptions=\"0\" />\
             <appTypeFilters />\
             <securityAssociations processHiddenPermission=\"0\" />\
             <alertProperties />"
        }
        AlertKind::Custom => "<locale localeID=\"0\"/>",
    }
}

/// Build the list of extra mail recipients which are copied on notifications.
pub fn build_cc_recipients_fragment(recipients: &[String]) -> String {
    recipients
        .iter()
        .map(|cc| {
            format!(
                "<nonGalaxyUserListCc id1=\"0\" id2=\"1\" name=\"{}\" />",
                escape_attr(cc)
            )
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lookup::test::FixtureDatabase;
    use chrono::TimeZone;

    fn created_time() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 42_000).unwrap()
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_standard_options_and_recipients() {
        let db = FixtureDatabase::default()
            .answer("login = 'alice'", &["id"], &[&["5"]])
            .answer("login = 'ghost'", &["id"], &[])
            .answer("name = 'admins'", &["id"], &[&["1"]]);

        let classification = Classification::parse("Job Management", "Data Protection").unwrap();
        let options = AlertOptions {
            send_individual_notifications: true,
            to_users: vec!["alice".to_string(), "ghost".to_string()],
            to_user_groups: vec!["admins".to_string()],
            escalation_recipients: vec!["oncall@example.com".to_string()],
            ..Default::default()
        };

        let out = build_alert_options_fragment(
            &db,
            AlertOptionsInput {
                name: "backup <succeeded>",
                classification: &classification,
                channels: &[NotificationChannel::Email, NotificationChannel::Rss],
                options: &options,
                created_time: created_time(),
                kind: AlertKind::Standard,
            },
        )
        .await;

        insta::assert_snapshot!(out.replace("><", ">\n<"), @r###"
        <alert GUID="" createdTime="1700000000.000042" description="" escNotifType="0" notifType="1025" organizationId="0" origCCId="0" status="16">
        <alert id="0" name="backup &lt;succeeded&gt;" />
        <alertCategory id="1" name="Job Management" />
        <alertType id="3" name="Data Protection" />
        <creator id="1" name="admin" />
        </alert>
        <userList id1="5" id2="1" name="alice" />
        <userGroupList id1="1" id2="1" name="admins" />
        <nonGalaxyUserList id1="0" id2="2" name="oncall@example.com" />
        "###);

        assert!(logs_contain("couldn't resolve To user, skipping"));
    }

    #[tokio::test]
    async fn test_custom_options_append_app_type_filters() {
        let db = FixtureDatabase::default();
        let classification = Classification::parse("Custom Rules", "all").unwrap();

        let out = build_alert_options_fragment(
            &db,
            AlertOptionsInput {
                name: "custom",
                classification: &classification,
                channels: &[NotificationChannel::Email],
                options: &AlertOptions::default(),
                created_time: created_time(),
                kind: AlertKind::Custom,
            },
        )
        .await;

        assert!(out.ends_with("</alert><appTypeFilters/>"));
        assert!(out.contains("status=\"0\""));
        assert!(out.contains("<alertCategory id=\"9\" name=\"Custom Rules\" />"));
    }

    #[test]
    fn test_cc_recipients() {
        assert_eq!(build_cc_recipients_fragment(&[]), "");
        assert_eq!(
            build_cc_recipients_fragment(&["a@x.com".to_string(), "b@x.com".to_string()]),
            "<nonGalaxyUserListCc id1=\"0\" id2=\"1\" name=\"a@x.com\" />\
             <nonGalaxyUserListCc id1=\"0\" id2=\"1\" name=\"b@x.com\" />"
        );
    }
}
