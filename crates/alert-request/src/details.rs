use crate::spec::{AlertSpec, Criteria, EntityKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// AlertDetails is the JSON description of a standard alert, an alternative
/// to the XML creation request which the alerts endpoint accepts directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertDetails {
    pub alert_type: u32,
    pub notif_type: Vec<u32>,
    #[serde(rename = "notifTypeListOperationType")]
    pub notif_type_list_operation_type: u32,
    pub alert_severity: u32,
    #[serde(rename = "nonGalaxyUserOperationType")]
    pub non_galaxy_user_operation_type: u32,
    pub criteria: Criteria,
    #[serde(rename = "associationOperationType")]
    pub association_operation_type: u32,
    pub entities: BTreeMap<EntityKind, Vec<String>>,
    #[serde(rename = "userListOperationType")]
    pub user_list_operation_type: u32,
    pub users: Vec<String>,
    pub alert_name: String,
    #[serde(rename = "paramsList", skip_serializing_if = "Option::is_none")]
    pub params_list: Option<Vec<String>>,
    #[serde(rename = "nonGalaxyList", skip_serializing_if = "Option::is_none")]
    pub non_galaxy_list: Option<NonGalaxyList>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NonGalaxyList {
    #[serde(rename = "nonGalaxyUserList")]
    pub non_galaxy_user_list: Vec<NonGalaxyUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NonGalaxyUser {
    #[serde(rename = "nonGalaxyUser")]
    pub non_galaxy_user: String,
}

impl AlertDetails {
    /// Describe `spec`, notifying the given CommCell `users`. Extra mail
    /// recipients of the spec become non-Galaxy users.
    pub fn new(spec: &AlertSpec, users: &[String]) -> Self {
        let mut entities: BTreeMap<EntityKind, Vec<String>> = BTreeMap::new();
        for entity in &spec.entities {
            entities
                .entry(entity.kind)
                .or_default()
                .push(entity.name.clone());
        }

        let non_galaxy_list = (!spec.cc_recipients.is_empty()).then(|| NonGalaxyList {
            non_galaxy_user_list: spec
                .cc_recipients
                .iter()
                .map(|r| NonGalaxyUser {
                    non_galaxy_user: r.clone(),
                })
                .collect(),
        });

        Self {
            alert_type: spec.classification.type_id(),
            notif_type: spec.channels.iter().map(|c| c.code()).collect(),
            notif_type_list_operation_type: 0,
            alert_severity: 0,
            non_galaxy_user_operation_type: 0,
            criteria: spec.criteria.clone(),
            association_operation_type: 0,
            entities,
            user_list_operation_type: 0,
            users: users.to_vec(),
            alert_name: spec.name.clone(),
            params_list: spec.effective_params_list().map(<[String]>::to_vec),
            non_galaxy_list,
        }
    }
}
