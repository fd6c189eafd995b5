/// HTTP method of a CommServe API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// Endpoints of the CommServe API used to manage alerts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Executes an XML request such as `CVGui_AlertCreateReq`.
    ExecuteQCommand,
    /// Alert rules: listed with GET, created from JSON with POST.
    Alerts,
    Alert(u64),
    EmailServer,
    ConsoleAlerts { page_no: u32, page_count: u32 },
    ConsoleAlert(u64),
}

impl Endpoint {
    /// Path of the endpoint, relative to the API's base URL.
    pub fn path(&self) -> String {
        match self {
            Endpoint::ExecuteQCommand => "ExecuteQCommand".to_string(),
            Endpoint::Alerts => "AlertRule".to_string(),
            Endpoint::Alert(id) => format!("AlertRule/{id}"),
            Endpoint::EmailServer => "EmailServer".to_string(),
            Endpoint::ConsoleAlerts {
                page_no,
                page_count,
            } => format!("Alert?pageNo={page_no}&pageCount={page_count}"),
            Endpoint::ConsoleAlert(id) => format!("Alert/{id}"),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// Response to a CommServe API request. `ok` is false for non-success
/// HTTP statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub ok: bool,
    pub body: String,
}

/// Transport executes authenticated requests against the CommServe API.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        method: Method,
        endpoint: &Endpoint,
        body: Option<&str>,
    ) -> anyhow::Result<Response>;
}
