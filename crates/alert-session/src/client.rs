use crate::transport::{Endpoint, Method, Transport};
use crate::{Error, Result};
use alert_request::{custom_rule, AlertDetails, AlertRequest};
use alert_verify::{ConsoleFeed, ConsoleFeedEntry};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

/// A custom rule imported into the CommServe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedRule {
    pub name: String,
    pub query_id: String,
}

/// A created alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertHandle {
    pub alert_id: u64,
    pub alert_name: String,
    /// Request the alert was created from, if it was created from XML.
    pub raw_xml: Option<String>,
    pub criteria: Vec<u32>,
    pub rule: Option<ImportedRule>,
}

/// RemoteClient manages alerts and custom rules through the CommServe API.
#[derive(Clone)]
pub struct RemoteClient {
    transport: Arc<dyn Transport>,
}

#[derive(Deserialize)]
struct ErrorResp {
    #[serde(rename = "errorCode", default)]
    error_code: i64,
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
}

impl ErrorResp {
    /// Message of the application error this envelope reports, if any.
    /// An envelope without a message or a nonzero code reports nothing.
    fn failure(self) -> Option<String> {
        match self.error_message.filter(|m| !m.trim().is_empty()) {
            Some(message) => Some(message),
            None if self.error_code != 0 => Some(format!("error code {}", self.error_code)),
            None => None,
        }
    }
}

#[derive(Deserialize)]
struct CreateResponse {
    #[serde(rename = "alertId", default)]
    alert_id: Option<serde_json::Value>,
    #[serde(rename = "errorResp", default)]
    error_resp: Option<ErrorResp>,
}

#[derive(Deserialize)]
struct ImportResponse {
    #[serde(rename = "queryId", default)]
    query_id: Option<serde_json::Value>,
    #[serde(default)]
    response: Option<ErrorCode>,
    #[serde(rename = "errorResp", default)]
    error_resp: Option<ErrorResp>,
}

#[derive(Deserialize)]
struct ErrorCode {
    #[serde(rename = "errorCode", default)]
    error_code: i64,
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct AlertList {
    #[serde(rename = "alertList", default)]
    alert_list: Vec<AlertListEntry>,
}

#[derive(Deserialize)]
struct AlertListEntry {
    alert: AlertRef,
}

#[derive(Deserialize)]
struct AlertRef {
    name: String,
    id: u64,
}

#[derive(Deserialize)]
struct EmailServer {
    #[serde(rename = "senderInfo")]
    sender_info: SenderInfo,
}

#[derive(Deserialize)]
struct SenderInfo {
    #[serde(rename = "senderName")]
    sender_name: String,
}

#[derive(Deserialize)]
struct ConsoleFeeds {
    #[serde(rename = "feedsList", default)]
    feeds_list: Vec<ConsoleFeedItem>,
}

#[derive(Deserialize)]
struct ConsoleFeedItem {
    #[serde(rename = "alertName")]
    alert_name: String,
    #[serde(rename = "liveFeedId")]
    live_feed_id: u64,
}

#[derive(Deserialize)]
struct ConsoleAlertDetail {
    description: String,
}

/// Ids are returned as either numbers or strings. Zero or empty ids are absent.
fn parse_id(value: Option<&serde_json::Value>) -> Option<String> {
    let id = match value? {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    (!id.is_empty() && id != "0").then_some(id)
}

impl RemoteClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Execute a request and decode its JSON response body.
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: Endpoint,
        body: Option<&str>,
    ) -> Result<T> {
        let response = self
            .transport
            .execute(method, &endpoint, body)
            .await
            .map_err(|source| Error::Transport {
                endpoint: endpoint.path(),
                source,
            })?;

        if !response.ok {
            return Err(Error::Transport {
                endpoint: endpoint.path(),
                source: anyhow::anyhow!("{}", response.body),
            });
        }
        if response.body.trim().is_empty() {
            return Err(Error::EmptyResponse(endpoint.path()));
        }
        serde_json::from_str(&response.body).map_err(|source| Error::MalformedResponse {
            endpoint: endpoint.path(),
            source,
        })
    }

    /// Id of the named alert, matched ignoring case.
    pub async fn find_alert(&self, name: &str) -> Result<Option<u64>> {
        let AlertList { alert_list } = self.call(Method::Get, Endpoint::Alerts, None).await?;

        Ok(alert_list
            .into_iter()
            .find(|entry| entry.alert.name.eq_ignore_ascii_case(name))
            .map(|entry| entry.alert.id))
    }

    pub async fn has_alert(&self, name: &str) -> Result<bool> {
        Ok(self.find_alert(name).await?.is_some())
    }

    /// Name of the sender of alert emails.
    pub async fn alert_sender(&self) -> Result<String> {
        let EmailServer { sender_info } =
            self.call(Method::Get, Endpoint::EmailServer, None).await?;
        Ok(sender_info.sender_name)
    }

    /// Create an alert from an assembled request. Fails with
    /// [`Error::AlreadyExists`], without submitting the request, if an alert
    /// of the same name exists.
    #[tracing::instrument(skip_all, fields(alert_name = %request.alert_name))]
    pub async fn create(&self, request: &AlertRequest) -> Result<AlertHandle> {
        let alert_id = self
            .submit_creation(&request.alert_name, Endpoint::ExecuteQCommand, &request.xml)
            .await?;

        Ok(AlertHandle {
            alert_id,
            alert_name: request.alert_name.clone(),
            raw_xml: Some(request.xml.clone()),
            criteria: request.criteria.clone(),
            rule: None,
        })
    }

    /// Create an alert from its JSON description.
    #[tracing::instrument(skip_all, fields(alert_name = %details.alert_name))]
    pub async fn create_from_details(&self, details: &AlertDetails) -> Result<AlertHandle> {
        let body = serde_json::to_string(details).map_err(Error::EncodeRequest)?;
        let alert_id = self
            .submit_creation(&details.alert_name, Endpoint::Alerts, &body)
            .await?;

        Ok(AlertHandle {
            alert_id,
            alert_name: details.alert_name.clone(),
            raw_xml: None,
            criteria: details.criteria.ids().to_vec(),
            rule: None,
        })
    }

    async fn submit_creation(
        &self,
        alert_name: &str,
        endpoint: Endpoint,
        body: &str,
    ) -> Result<u64> {
        if self.has_alert(alert_name).await? {
            return Err(Error::AlreadyExists(alert_name.to_string()));
        }
        tracing::info!("creating alert");

        let CreateResponse {
            alert_id,
            error_resp,
        } = self.call(Method::Post, endpoint, Some(body)).await?;

        // An application error fails creation even when an id is returned.
        if let Some(message) = error_resp.and_then(ErrorResp::failure) {
            return Err(Error::CreationFailed(message));
        }
        match parse_id(alert_id.as_ref()).and_then(|id| id.parse::<u64>().ok()) {
            Some(id) => {
                tracing::info!(alert_id = id, "created alert");
                Ok(id)
            }
            None => Err(Error::CreationFailed("no alert id was returned".to_string())),
        }
    }

    /// Import a custom rule document, returning the query id of the rule.
    #[tracing::instrument(skip(self, xml))]
    pub async fn import_rule(&self, name: &str, xml: &str) -> Result<String> {
        let ImportResponse {
            query_id,
            response,
            error_resp,
        } = self
            .call(Method::Post, Endpoint::ExecuteQCommand, Some(xml))
            .await?;

        if let Some(message) = error_resp.and_then(ErrorResp::failure) {
            return Err(Error::Rejected {
                operation: "import alert rule",
                message,
            });
        }
        let error_code = response.as_ref().map(|r| r.error_code);
        match (parse_id(query_id.as_ref()), error_code) {
            (Some(query_id), Some(0)) => {
                tracing::info!(%query_id, "imported custom rule");
                Ok(query_id)
            }
            _ => Err(Error::Rejected {
                operation: "import alert rule",
                message: response
                    .and_then(|r| r.error_message)
                    .unwrap_or_else(|| format!("error code {error_code:?}")),
            }),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_rule(&self, name: &str, query_id: &str) -> Result<()> {
        let request = custom_rule::delete_rule_request(name, query_id);
        let response: ErrorCode = self
            .call(Method::Post, Endpoint::ExecuteQCommand, Some(&request))
            .await?;

        check_error_code("delete alert rule", response)
    }

    /// Delete the named alert.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<()> {
        let Some(id) = self.find_alert(name).await? else {
            return Err(Error::NotFound(name.to_string()));
        };
        let response: ErrorCode = self.call(Method::Delete, Endpoint::Alert(id), None).await?;

        check_error_code("delete alert", response)?;
        tracing::info!(alert_id = id, "deleted alert");
        Ok(())
    }
}

fn check_error_code(operation: &'static str, response: ErrorCode) -> Result<()> {
    if response.error_code == 0 {
        return Ok(());
    }
    Err(Error::Rejected {
        operation,
        message: response
            .error_message
            .unwrap_or_else(|| format!("error code {}", response.error_code)),
    })
}

#[async_trait::async_trait]
impl ConsoleFeed for RemoteClient {
    async fn entries(
        &self,
        page_no: u32,
        page_count: u32,
    ) -> anyhow::Result<Vec<ConsoleFeedEntry>> {
        let ConsoleFeeds { feeds_list } = self
            .call(
                Method::Get,
                Endpoint::ConsoleAlerts {
                    page_no,
                    page_count,
                },
                None,
            )
            .await?;

        Ok(feeds_list
            .into_iter()
            .map(|item| ConsoleFeedEntry {
                alert_name: item.alert_name,
                live_feed_id: item.live_feed_id,
            })
            .collect())
    }

    async fn description(&self, live_feed_id: u64) -> anyhow::Result<String> {
        let ConsoleAlertDetail { description } = self
            .call(Method::Get, Endpoint::ConsoleAlert(live_feed_id), None)
            .await?;
        Ok(description)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transport::Response;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport which replays canned responses and records requests.
    #[derive(Default)]
    struct Replay {
        responses: Mutex<VecDeque<Response>>,
        requests: Mutex<Vec<(Method, String)>>,
        bodies: Mutex<Vec<String>>,
    }

    impl Replay {
        fn new(responses: &[(bool, &str)]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(
                    responses
                        .iter()
                        .map(|(ok, body)| Response {
                            ok: *ok,
                            body: body.to_string(),
                        })
                        .collect(),
                ),
                requests: Mutex::default(),
                bodies: Mutex::default(),
            })
        }
    }

    #[async_trait::async_trait]
    impl Transport for Replay {
        async fn execute(
            &self,
            method: Method,
            endpoint: &Endpoint,
            body: Option<&str>,
        ) -> anyhow::Result<Response> {
            self.requests.lock().unwrap().push((method, endpoint.path()));
            if let Some(body) = body {
                self.bodies.lock().unwrap().push(body.to_string());
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("no response for {endpoint}"))
        }
    }

    const NO_ALERTS: &str = r#"{"alertList": []}"#;
    const ONE_ALERT: &str = r#"{"alertList": [{"alert": {"name": "Backup-Alert", "id": 12}}]}"#;

    fn request() -> AlertRequest {
        AlertRequest {
            alert_name: "backup-alert".to_string(),
            xml: "<CVGui_AlertCreateReq/>".to_string(),
            criteria: vec![1],
            query_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_existing_alert_before_submitting() {
        let transport = Replay::new(&[(true, ONE_ALERT)]);
        let client = RemoteClient::new(transport.clone());

        let err = client.create(&request()).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(name) if name == "backup-alert"));
        assert_eq!(
            *transport.requests.lock().unwrap(),
            vec![(Method::Get, "AlertRule".to_string())]
        );
    }

    #[tokio::test]
    async fn test_create_response_handling() {
        let client = RemoteClient::new(Replay::new(&[
            (true, NO_ALERTS),
            (true, r#"{"alertId": 31}"#),
        ]));
        let handle = client.create(&request()).await.unwrap();
        assert_eq!(handle.alert_id, 31);
        assert_eq!(handle.criteria, vec![1]);

        let client = RemoteClient::new(Replay::new(&[
            (true, NO_ALERTS),
            (false, "503 unavailable"),
        ]));
        assert!(matches!(
            client.create(&request()).await.unwrap_err(),
            Error::Transport { .. }
        ));

        let client = RemoteClient::new(Replay::new(&[(true, NO_ALERTS), (true, "")]));
        assert!(matches!(
            client.create(&request()).await.unwrap_err(),
            Error::EmptyResponse(_)
        ));

        let client = RemoteClient::new(Replay::new(&[
            (true, NO_ALERTS),
            (
                true,
                r#"{"alertId": 0, "errorResp": {"errorMessage": "invalid criteria"}}"#,
            ),
        ]));
        let err = client.create(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "alert creation failed: invalid criteria");
    }

    #[tokio::test]
    async fn test_error_envelope_fails_despite_returned_id() {
        let client = RemoteClient::new(Replay::new(&[
            (true, NO_ALERTS),
            (
                true,
                r#"{"alertId": 31, "errorResp": {"errorCode": 2, "errorMessage": "alert name too long"}}"#,
            ),
        ]));
        let err = client.create(&request()).await.unwrap_err();
        assert!(
            matches!(&err, Error::CreationFailed(message) if message == "alert name too long"),
            "{err:?}"
        );

        // A nonzero code without a message is an error too.
        let client = RemoteClient::new(Replay::new(&[
            (true, NO_ALERTS),
            (true, r#"{"alertId": 31, "errorResp": {"errorCode": 9}}"#),
        ]));
        let err = client.create(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "alert creation failed: error code 9");

        // An empty envelope doesn't fail creation.
        let client = RemoteClient::new(Replay::new(&[
            (true, NO_ALERTS),
            (true, r#"{"alertId": 31, "errorResp": {"errorCode": 0}}"#),
        ]));
        assert_eq!(client.create(&request()).await.unwrap().alert_id, 31);

        let client = RemoteClient::new(Replay::new(&[(
            true,
            r#"{"queryId": "88", "response": {"errorCode": 0}, "errorResp": {"errorCode": 7, "errorMessage": "query is invalid"}}"#,
        )]));
        let err = client.import_rule("rule", "<xml/>").await.unwrap_err();
        assert!(
            matches!(&err, Error::Rejected { message, .. } if message == "query is invalid"),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn test_create_from_details_posts_json() {
        let details = AlertDetails {
            alert_type: 3,
            notif_type: vec![1],
            notif_type_list_operation_type: 0,
            alert_severity: 0,
            non_galaxy_user_operation_type: 0,
            criteria: alert_request::Criteria::Many(vec![65, 66]),
            association_operation_type: 0,
            entities: Default::default(),
            user_list_operation_type: 0,
            users: vec!["admin".to_string()],
            alert_name: "json-alert".to_string(),
            params_list: None,
            non_galaxy_list: None,
        };
        let transport = Replay::new(&[(true, NO_ALERTS), (true, r#"{"alertId": 44}"#)]);
        let client = RemoteClient::new(transport.clone());

        let handle = client.create_from_details(&details).await.unwrap();
        assert_eq!(handle.alert_id, 44);
        assert_eq!(handle.criteria, vec![65, 66]);
        assert_eq!(handle.raw_xml, None);
        assert_eq!(
            transport.requests.lock().unwrap()[1],
            (Method::Post, "AlertRule".to_string())
        );

        let sent: serde_json::Value =
            serde_json::from_str(&transport.bodies.lock().unwrap()[0]).unwrap();
        assert_eq!(sent["alert_name"], "json-alert");
        assert_eq!(sent["criteria"], serde_json::json!([65, 66]));
    }

    #[tokio::test]
    async fn test_rules_and_deletion() {
        let client = RemoteClient::new(Replay::new(&[
            (true, r#"{"queryId": "88", "response": {"errorCode": 0}}"#),
            (
                true,
                r#"{"queryId": "", "response": {"errorCode": 5}, "errorResp": {"errorMessage": "bad rule"}}"#,
            ),
            (true, r#"{"errorCode": 0}"#),
            (true, ONE_ALERT),
            (true, r#"{"errorCode": 0}"#),
            (true, NO_ALERTS),
        ]));

        assert_eq!(client.import_rule("rule", "<xml/>").await.unwrap(), "88");
        assert!(matches!(
            client.import_rule("rule", "<xml/>").await.unwrap_err(),
            Error::Rejected { message, .. } if message == "bad rule"
        ));
        client.delete_rule("rule", "88").await.unwrap();
        client.delete("BACKUP-ALERT").await.unwrap();
        assert!(matches!(
            client.delete("backup-alert").await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_console_feed_and_sender() {
        let client = RemoteClient::new(Replay::new(&[
            (true, r#"{"feedsList": [{"alertName": "a", "liveFeedId": 4}]}"#),
            (true, r#"{"description": "Detected Criteria: Job Failed"}"#),
            (true, r#"{"senderInfo": {"senderName": "CommServe"}}"#),
        ]));

        let entries = client.entries(1, 10).await.unwrap();
        assert_eq!(
            entries,
            vec![ConsoleFeedEntry {
                alert_name: "a".to_string(),
                live_feed_id: 4
            }]
        );
        assert_eq!(
            client.description(4).await.unwrap(),
            "Detected Criteria: Job Failed"
        );
        assert_eq!(client.alert_sender().await.unwrap(), "CommServe");
    }
}
