//! Helpers for custom alert rules: SQL query backed rules which are imported
//! into the CommServe from an XML document before an alert can use them.
use crate::xml::escape_attr;
use crate::{Error, Result};
use std::path::Path;

/// Default query frequency of an imported custom rule.
pub const DEFAULT_QUERY_FREQUENCY_SECS: u64 = 180;

lazy_static::lazy_static! {
    static ref FREQUENCY_RE: regex::Regex =
        regex::Regex::new(r"freq_subday_interval=&quot;\d+&quot;").unwrap();
    static ref QUERY_NAME_RE: regex::Regex =
        regex::Regex::new(r#"queryName="([^"]*)""#).unwrap();
}

/// Read the custom rule document `file` from the rule directory `dir`.
pub async fn read_alert_rule(dir: &Path, file: &str) -> Result<String> {
    let path = dir.join(file);
    tracing::info!(path = %path.display(), "reading alert rule");

    tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| Error::ReadRule { path, source })
}

/// Rewrite every query frequency of the custom rule document to `seconds`.
pub fn set_custom_alert_frequency(xml: &str, seconds: u64) -> String {
    FREQUENCY_RE
        .replace_all(xml, format!("freq_subday_interval=&quot;{seconds}&quot;"))
        .into_owned()
}

/// Name of the query defined by a custom rule document, if any.
pub fn custom_query_name(xml: &str) -> Option<&str> {
    QUERY_NAME_RE
        .captures(xml)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Request which deletes an imported custom rule.
pub fn delete_rule_request(rule_name: &str, query_id: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\" ?>\
         <App_QueryOperationRequest queryOp=\"2\"><processinginstructioninfo>\
         <user _type_=\"13\" userId=\"1\" userName=\"admin\"/>\
         <locale _type_=\"66\" localeId=\"0\"/>\
         <formatFlags continueOnError=\"0\" elementBased=\"0\" filterUnInitializedFields=\"0\" \
         formatted=\"0\" ignoreUnknownTags=\"1\" skipIdToNameConversion=\"1\" \
         skipNameToIdConversion=\"0\"/></processinginstructioninfo>\
         <queryEntity queryId=\"{}\" queryName=\"{}\"/></App_QueryOperationRequest>",
        escape_attr(query_id),
        escape_attr(rule_name),
    )
}
