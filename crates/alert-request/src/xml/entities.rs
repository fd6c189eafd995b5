use super::escape_nested;
use crate::lookup::{self, Database};
use crate::spec::{Entity, EntityKind};
use crate::{Error, Result};

const OPEN: &str = "<alertDetail alertSeverity=\"0\" alertTokenRuleGroupXml=\"{rule_group}\" \
checkForEventParams=\"0\" customQueryDetailsXml=\"\" escalationSeverity=\"0\" \
eventCriteriaXML=\"\" minJobCountForJobAnomaly=\"0\" periodicNotificationInterval=\"0\" \
recipient=\"\" senderDisplayName=\"\" senderEmailId=\"\" \
xmlEntityList=\"&lt;?xml version='1.0' encoding='UTF-8'?&gt;&lt;CVGui_CommCellTreeNode&gt;&lt;";

const CLOSE: &str = "/CVGui_CommCellTreeNode&gt;\">";

const FLAGS: &str = "&gt;&lt;flags exclude=&quot;0&quot; /&gt;&lt;/associations&gt;&lt;";

/// Build the opening `<alertDetail>` element, which carries the token rule
/// group document and the escaped list of associated entities.
///
/// Clients are associated once per IDA type when `ida_types` is given, each
/// association scoped by the application id of that IDA on the client.
pub async fn build_entity_association_fragment<D: Database + ?Sized>(
    db: &D,
    rule_group_xml: &str,
    entities: &[Entity],
    ida_types: Option<&[String]>,
) -> Result<String> {
    let mut out = OPEN.replace("{rule_group}", rule_group_xml);

    for Entity { kind, name, id } in entities {
        let (name_attr, id_attr, type_code) = kind.attributes();

        match (kind, ida_types) {
            (EntityKind::Clients, Some(ida_types)) => {
                for ida in ida_types {
                    let app_id = lookup::ida_app_id(db, ida, *id).await.map_err(|source| {
                        Error::Lookup {
                            what: format!("application '{ida}' of client '{name}'"),
                            source,
                        }
                    })?;

                    out.push_str(&format!(
                        "associations applicationId=&quot;{app_id}&quot; \
                         {name_attr}=&quot;{}&quot; {id_attr}=&quot;{id}&quot; \
                         _type_=&quot;{type_code}&quot; appName=&quot;{}&quot;{FLAGS}",
                        escape_nested(name),
                        escape_nested(ida),
                    ));
                }
            }
            _ => {
                out.push_str(&format!(
                    "associations {name_attr}=&quot;{}&quot; {id_attr}=&quot;{id}&quot; \
                     _type_=&quot;{type_code}&quot;{FLAGS}",
                    escape_nested(name),
                ));
            }
        }
    }
    out.push_str(CLOSE);

    Ok(out)
}
