use super::{
    build_alert_options_fragment, build_cc_recipients_fragment, build_criteria_fragment,
    build_entity_association_fragment, build_general_info_fragment, build_notification_fragment,
    build_token_rule_fragment, escape_nested, AlertKind, AlertOptionsInput, AlertRequest, Builder,
};
use crate::catalog::CUSTOM_ALERT_CRITERIA;
use crate::lookup::Database;
use crate::spec::{AlertSpec, Criteria, CustomAlertSpec, QuerySource};
use crate::Result;

const STANDARD_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<CVGui_AlertCreateReq ownerId=\"1\"><processinginstructioninfo>\
<user _type_=\"13\" userId=\"1\" userName=\"admin\" />\
<locale _type_=\"66\" localeId=\"0\" />\
<formatFlags continueOnError=\"0\" elementBased=\"0\" filterUnInitializedFields=\"0\" \
formatted=\"0\" ignoreUnknownTags=\"1\" skipIdToNameConversion=\"1\" skipNameToIdConversion=\"0\" />\
</processinginstructioninfo>";

const FOOTER: &str = "</alertDetail></CVGui_AlertCreateReq>";

const EMPTY_ENTITY_LIST: &str = "CVGui_CommCellTreeNode /&gt;\">";
const COMMCELL_ENTITY_LIST: &str = "CVGui_CommCellTreeNode&gt;&lt;associations \
_type_=&quot;125&quot; /&gt;&lt;/CVGui_CommCellTreeNode&gt;\">";

/// Header of a custom rule alert, which references its query and associates
/// with either no entity or the whole CommCell.
fn custom_header(source: &QuerySource, commcell_level: bool) -> String {
    let query_details = match source {
        QuerySource::QueryId(query_id) => format!(
            "customQueryDetailsXml=\"&lt;?xml version='1.0' encoding='UTF-8'?&gt;\
             &lt;CVGui_CustomQueryDetailsForAlert queryId=&quot;{}&quot; \
             additionalQueryInfo=&quot;&amp;lt;?xml version='1.0' encoding='UTF-8'?&gt;\
             &amp;lt;CVGui_QueryAdditionalInfo /&gt;&quot; /&gt;\" \
             escalationSeverity=\"3\" minJobCountForJobAnomaly=\"0\"",
            escape_nested(query_id)
        ),
        QuerySource::Details(details) => format!(
            "customQueryDetailsXml=\"{details}\" escalationSeverity=\"3\" eventCriteriaXML=\"\" \
             minJobCountForJobAnomaly=\"0\" periodicNotificationInterval=\"0\" recipient=\"\" \
             senderDisplayName=\"\" senderEmailId=\"\""
        ),
    };
    let entity_list = if commcell_level {
        COMMCELL_ENTITY_LIST
    } else {
        EMPTY_ENTITY_LIST
    };

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><CVGui_AlertCreateReq ownerId=\"1\">\
         <alertDetail alertSeverity=\"3\" checkForEventParams=\"0\" {query_details} \
         xmlEntityList=\"&lt;?xml version='1.0' encoding='UTF-8'?&gt;&lt;{entity_list}"
    )
}

impl<'a, D: Database + ?Sized> Builder<'a, D> {
    /// Assemble the creation request of a standard alert. Fragments are
    /// ordered: header, entity associations, alert options, criteria,
    /// notifications, general info, cc recipients, and footer.
    #[tracing::instrument(skip_all, fields(alert_name = %spec.name))]
    pub async fn assemble_standard_alert(&self, spec: &AlertSpec) -> Result<AlertRequest> {
        spec.validate()?;
        let options = &spec.options;

        let rule_group = build_token_rule_fragment(self.db, &options.token_rules).await?;
        let associations = build_entity_association_fragment(
            self.db,
            &rule_group,
            &spec.entities,
            options.ida_types.as_deref(),
        )
        .await?;
        let alert_options = build_alert_options_fragment(
            self.db,
            AlertOptionsInput {
                name: &spec.name,
                classification: &spec.classification,
                channels: &spec.channels,
                options,
                created_time: self.created_time,
                kind: AlertKind::Standard,
            },
        )
        .await;
        let criteria = build_criteria_fragment(options, &spec.criteria);
        let notifications = build_notification_fragment(
            self.db,
            spec.classification.type_id(),
            &spec.channels,
            self.targets,
            options.escalates(),
        )
        .await?;

        let parts: [&str; 8] = [
            STANDARD_HEADER,
            &associations,
            &alert_options,
            &criteria,
            &notifications,
            build_general_info_fragment(AlertKind::Standard),
            &build_cc_recipients_fragment(&spec.cc_recipients),
            FOOTER,
        ];
        let xml = parts.concat();

        tracing::debug!(len = xml.len(), "assembled standard alert request");

        Ok(AlertRequest {
            alert_name: spec.name.clone(),
            xml,
            criteria: spec.criteria.ids().to_vec(),
            query_id: None,
        })
    }

    /// Assemble the creation request of a custom rule alert. Fragments are
    /// ordered: header, criteria, general info, alert options,
    /// notifications, cc recipients, and footer.
    #[tracing::instrument(skip_all, fields(alert_name = %spec.name))]
    pub async fn assemble_custom_alert(
        &self,
        spec: &CustomAlertSpec,
        source: &QuerySource,
    ) -> Result<AlertRequest> {
        spec.validate()?;
        let options = &spec.options;

        let header = custom_header(source, spec.associated_at_commcell_level);
        let criteria =
            build_criteria_fragment(options, &Criteria::Single(CUSTOM_ALERT_CRITERIA));
        let alert_options = build_alert_options_fragment(
            self.db,
            AlertOptionsInput {
                name: &spec.name,
                classification: &spec.classification,
                channels: &spec.channels,
                options,
                created_time: self.created_time,
                kind: AlertKind::Custom,
            },
        )
        .await;
        let notifications = build_notification_fragment(
            self.db,
            spec.classification.type_id(),
            &spec.channels,
            self.targets,
            options.escalates(),
        )
        .await?;

        let parts: [&str; 7] = [
            &header,
            &criteria,
            build_general_info_fragment(AlertKind::Custom),
            &alert_options,
            &notifications,
            &build_cc_recipients_fragment(&spec.cc_recipients),
            FOOTER,
        ];
        let xml = parts.concat();

        tracing::debug!(len = xml.len(), "assembled custom alert request");

        let query_id = match source {
            QuerySource::QueryId(query_id) => Some(query_id.clone()),
            QuerySource::Details(_) => None,
        };
        Ok(AlertRequest {
            alert_name: spec.name.clone(),
            xml,
            criteria: vec![CUSTOM_ALERT_CRITERIA],
            query_id,
        })
    }
}
