use super::{escape_attr, NotificationTargets};
use crate::catalog::NotificationChannel;
use crate::lookup::{self, Database};
use crate::spec::EscalationLevel;
use crate::{Error, Result};

/// Where a channel's message template is placed within `<notifMsgs>`.
enum Message<'a> {
    /// Plain `notifMessage`, with a fixed `notifMessageHtml`.
    Plain { html: &'a str },
    /// Rich `notifMessageHtml`.
    Html,
}

impl Message<'_> {
    fn of(channel: NotificationChannel) -> Self {
        match channel {
            NotificationChannel::Rss => Message::Plain { html: "" },
            NotificationChannel::EventViewer | NotificationChannel::Snmp => Message::Plain {
                html: "&lt;p&gt; &lt;/p&gt;",
            },
            _ => Message::Html,
        }
    }
}

fn render_message(
    channel: NotificationChannel,
    level: EscalationLevel,
    template: &str,
    targets: &NotificationTargets,
) -> String {
    let message = match Message::of(channel) {
        Message::Plain { html } => format!(
            "messageFormat=\"0\" notifMessage=\"{template}\" notifMessageHtml=\"{html}\""
        ),
        Message::Html => format!("messageFormat=\"1\" notifMessageHtml=\"{template}\""),
    };

    // Only the primary tier delivers to a disk location or feed.
    let (alert_location, base_location, selected_channel) = match (channel, level) {
        (NotificationChannel::SaveToDisk, EscalationLevel::Primary) => (
            format!("{}\\alerts", targets.install_directory),
            String::new(),
            "",
        ),
        (NotificationChannel::Rss, EscalationLevel::Primary) => (
            String::new(),
            format!("http://{}:81/rss", targets.commserve_hostname),
            "alerts.rss",
        ),
        _ => (String::new(), String::new(), ""),
    };

    format!(
        "<notifMsgs esclationLevel=\"{level}\" localeId=\"0\" {message} notifOptions=\"0\" \
         notifType=\"{code}\"><saveAlertToDisk alertLocation=\"{alert_location}\" \
         cvpassword=\"\" impersonateUser=\"0\" loginName=\"\" password=\"\" useNetworkShare=\"0\" />\
         <feeds baseLocation=\"{base_location}\" rssFeedLocation=\"\" \
         selectedChannel=\"{selected_channel}\" seperateIndex=\"0\" />\
         <entity _type_=\"0\" /></notifMsgs>",
        level = level.as_u32(),
        code = channel.code(),
        alert_location = escape_attr(&alert_location),
        base_location = escape_attr(&base_location),
    )
}

/// Render `<notifMsgs>` blocks from already escaped message templates.
pub fn render_notifications(
    templates: &[(NotificationChannel, String)],
    targets: &NotificationTargets,
    escalate: bool,
) -> String {
    let mut out = String::new();

    for (channel, template) in templates {
        out.push_str(&render_message(
            *channel,
            EscalationLevel::Primary,
            template,
            targets,
        ));
        if escalate {
            out.push_str(&render_message(
                *channel,
                EscalationLevel::Escalated,
                template,
                targets,
            ));
        }
    }
    out
}

/// Fetch the message template of each channel and render its notification
/// messages, with a second escalated message per channel if `escalate`.
pub async fn build_notification_fragment<D: Database + ?Sized>(
    db: &D,
    alert_type_id: u32,
    channels: &[NotificationChannel],
    targets: &NotificationTargets,
    escalate: bool,
) -> Result<String> {
    let mut templates = Vec::with_capacity(channels.len());

    for &channel in channels {
        let template = lookup::notification_template(db, alert_type_id, channel)
            .await
            .map_err(|source| Error::Lookup {
                what: format!("{channel} message template"),
                source,
            })?;
        templates.push((channel, escape_attr(&template)));
    }

    Ok(render_notifications(&templates, targets, escalate))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lookup::test::FixtureDatabase;

    fn targets() -> NotificationTargets {
        NotificationTargets {
            commserve_hostname: "cs.example".to_string(),
            install_directory: "C:\\Program Files\\Commvault".to_string(),
        }
    }

    #[test]
    fn test_channel_specific_bodies() {
        let out = render_notifications(
            &[
                (NotificationChannel::Rss, "rss".to_string()),
                (NotificationChannel::SaveToDisk, "disk".to_string()),
                (NotificationChannel::Snmp, "trap".to_string()),
                (NotificationChannel::Email, "mail".to_string()),
            ],
            &targets(),
            false,
        );

        insta::assert_snapshot!(out.replace("</notifMsgs><", "</notifMsgs>\n<"), @r###"
        <notifMsgs esclationLevel="1" localeId="0" messageFormat="0" notifMessage="rss" notifMessageHtml="" notifOptions="0" notifType="1024"><saveAlertToDisk alertLocation="" cvpassword="" impersonateUser="0" loginName="" password="" useNetworkShare="0" /><feeds baseLocation="http://cs.example:81/rss" rssFeedLocation="" selectedChannel="alerts.rss" seperateIndex="0" /><entity _type_="0" /></notifMsgs>
        <notifMsgs esclationLevel="1" localeId="0" messageFormat="1" notifMessageHtml="disk" notifOptions="0" notifType="512"><saveAlertToDisk alertLocation="C:\Program Files\Commvault\alerts" cvpassword="" impersonateUser="0" loginName="" password="" useNetworkShare="0" /><feeds baseLocation="" rssFeedLocation="" selectedChannel="" seperateIndex="0" /><entity _type_="0" /></notifMsgs>
        <notifMsgs esclationLevel="1" localeId="0" messageFormat="0" notifMessage="trap" notifMessageHtml="&lt;p&gt; &lt;/p&gt;" notifOptions="0" notifType="4"><saveAlertToDisk alertLocation="" cvpassword="" impersonateUser="0" loginName="" password="" useNetworkShare="0" /><feeds baseLocation="" rssFeedLocation="" selectedChannel="" seperateIndex="0" /><entity _type_="0" /></notifMsgs>
        <notifMsgs esclationLevel="1" localeId="0" messageFormat="1" notifMessageHtml="mail" notifOptions="0" notifType="1"><saveAlertToDisk alertLocation="" cvpassword="" impersonateUser="0" loginName="" password="" useNetworkShare="0" /><feeds baseLocation="" rssFeedLocation="" selectedChannel="" seperateIndex="0" /><entity _type_="0" /></notifMsgs>
        "###);
    }

    #[test]
    fn test_escalated_blocks_have_no_locations() {
        let out = render_notifications(
            &[(NotificationChannel::SaveToDisk, "disk".to_string())],
            &targets(),
            true,
        );

        let (primary, escalated) = out.split_once("</notifMsgs>").unwrap();
        assert!(primary.contains("esclationLevel=\"1\""));
        assert!(primary.contains("\\alerts\""));
        assert!(escalated.contains("esclationLevel=\"2\""));
        assert!(escalated.contains("alertLocation=\"\""));
        assert!(escalated.contains("baseLocation=\"\""));
    }

    #[tokio::test]
    async fn test_templates_are_escaped_once() {
        let db = FixtureDatabase::default().answer(
            "messageType=1 and messageFormatType = 1",
            &["defaultformatString"],
            &[&["<b>Job</b> it's done"]],
        );

        let out = build_notification_fragment(
            &db,
            3,
            &[NotificationChannel::Email],
            &targets(),
            false,
        )
        .await
        .unwrap();

        assert!(out.contains(
            "notifMessageHtml=\"&lt;b&gt;Job&lt;/b&gt; it&#x27;s done\""
        ));
    }
}
