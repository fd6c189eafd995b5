use crate::spec::{AlertOptions, Criteria, EscalationLevel};

/// One `<criteria>` element of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriteriaEntry {
    pub criteria_id: u32,
    pub level: EscalationLevel,
    pub delay_seconds: u64,
    pub persist_seconds: u64,
    pub reporting_options: u32,
}

impl CriteriaEntry {
    fn render(&self) -> String {
        format!(
            "<criteria criteriaId=\"{}\" criteriaSeverity=\"0\" delayTimeSeconds=\"{}\" \
             esclationLevel=\"{}\" persistTimeSeconds=\"{}\" reportId=\"0\" \
             reportingOptions=\"{}\" taskId=\"0\" value=\"\" />",
            self.criteria_id,
            self.delay_seconds,
            self.level.as_u32(),
            self.persist_seconds,
            self.reporting_options,
        )
    }
}

/// Criteria entries of the alert. Every criteria id has a primary entry,
/// followed by an escalated entry if the alert escalates.
pub fn criteria_entries(options: &AlertOptions, criteria: &Criteria) -> Vec<CriteriaEntry> {
    let mut entries = Vec::new();

    for &criteria_id in criteria.ids() {
        entries.push(match &options.notification_criteria {
            Some(policy) => CriteriaEntry {
                criteria_id,
                level: EscalationLevel::Primary,
                delay_seconds: policy.delay_seconds(),
                persist_seconds: policy.persist_seconds(),
                reporting_options: policy.reporting_options(EscalationLevel::Primary),
            },
            None => CriteriaEntry {
                criteria_id,
                level: EscalationLevel::Primary,
                delay_seconds: 0,
                persist_seconds: 0,
                reporting_options: 1,
            },
        });

        if let Some(policy) = &options.escalation_criteria {
            entries.push(CriteriaEntry {
                criteria_id,
                level: EscalationLevel::Escalated,
                delay_seconds: policy.delay_seconds(),
                persist_seconds: policy.persist_seconds(),
                reporting_options: policy.reporting_options(EscalationLevel::Escalated),
            });
        }
    }
    entries
}

pub fn build_criteria_fragment(options: &AlertOptions, criteria: &Criteria) -> String {
    criteria_entries(options, criteria)
        .iter()
        .map(CriteriaEntry::render)
        .collect()
}
