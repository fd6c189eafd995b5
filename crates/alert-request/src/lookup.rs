//! Lookups of CommServe database ids needed while building alert requests.
use crate::catalog::NotificationChannel;
use anyhow::Context;

/// Tabular result of a CommServe database query. Cells are rendered as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl QueryResult {
    /// Index of the named column.
    pub fn column(&self, name: &str) -> anyhow::Result<usize> {
        self.columns
            .iter()
            .position(|column| column == name)
            .with_context(|| format!("query result is missing column '{name}'"))
    }

    /// Values of the named column, in row order.
    pub fn values(&self, name: &str) -> anyhow::Result<Vec<&str>> {
        let index = self.column(name)?;
        self.rows
            .iter()
            .map(|row| {
                row.get(index)
                    .map(String::as_str)
                    .with_context(|| format!("query row is missing column '{name}'"))
            })
            .collect()
    }
}

/// Database executes read-only SQL queries on the CommServe database.
#[async_trait::async_trait]
pub trait Database: Send + Sync {
    async fn query(&self, sql: &str) -> anyhow::Result<QueryResult>;
}

/// Quote a string literal for interpolation within single quotes.
fn quote_literal(value: &str) -> String {
    value.replace('\'', "''")
}

fn parse_id(value: &str, what: &str) -> anyhow::Result<u64> {
    value
        .trim()
        .parse()
        .with_context(|| format!("{what} '{value}' is not numeric"))
}

/// Resolve the token id of the named token rule group. Returns `None` if the
/// name is ambiguous and matches more than one token.
pub async fn token_id<D: Database + ?Sized>(
    db: &D,
    rule_group: &str,
) -> anyhow::Result<Option<u64>> {
    let sql = format!(
        "select MessageID from evlocalemsgs where localeid=0 and message ='<{}>';",
        quote_literal(rule_group)
    );
    let result = db.query(&sql).await?;
    let ids = result.values("MessageID")?;

    match ids.as_slice() {
        [] => anyhow::bail!("no token exists for rule group '{rule_group}'"),
        [id] => Ok(Some(parse_id(id, "MessageID")?)),
        _ => {
            tracing::error!(
                %rule_group,
                rows = ids.len(),
                "token lookup returned more than one row"
            );
            Ok(None)
        }
    }
}

/// Token type and input format of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTypeFormat {
    pub token_type: i64,
    pub token_format: i64,
}

pub async fn token_type_format<D: Database + ?Sized>(
    db: &D,
    token_id: u64,
) -> anyhow::Result<TokenTypeFormat> {
    let sql = format!("select * from NTmessageTokensForAlert where tokenID={token_id};");
    let result = db.query(&sql).await?;

    let token_type = result.column("tokenType")?;
    let token_format = result.column("tokenInputFormat")?;
    let Some(row) = result.rows.first() else {
        anyhow::bail!("token {token_id} has no type or format");
    };
    let cell = |index: usize| -> anyhow::Result<i64> {
        let value = row.get(index).context("query row is too short")?;
        value
            .trim()
            .parse()
            .with_context(|| format!("token attribute '{value}' is not numeric"))
    };

    Ok(TokenTypeFormat {
        token_type: cell(token_type)?,
        token_format: cell(token_format)?,
    })
}

/// Resolve the application id of an IDA (agent) installed on a client.
pub async fn ida_app_id<D: Database + ?Sized>(
    db: &D,
    app_name: &str,
    client_id: u64,
) -> anyhow::Result<u64> {
    let sql = format!(
        "select type from APP_iDAType where name='{}' and type in \
         (select appTypeId from APP_IDAName where clientId = {client_id});",
        quote_literal(app_name)
    );
    let result = db.query(&sql).await?;

    match result.values("type")?.first() {
        Some(id) => parse_id(id, "application type"),
        None => anyhow::bail!("client {client_id} has no '{app_name}' application"),
    }
}

/// Fetch the default notification message template of an alert type and
/// channel. Channels which support HTML use the HTML template.
pub async fn notification_template<D: Database + ?Sized>(
    db: &D,
    alert_type_id: u32,
    channel: NotificationChannel,
) -> anyhow::Result<String> {
    let format_type = if channel.supports_html() { 1 } else { 0 };
    let sql = format!(
        "select * from NTnotificationTemplate where ntalerttypeid={alert_type_id} \
         and locale=0 and messageType={} and messageFormatType = {format_type};",
        channel.code()
    );
    let result = db.query(&sql).await?;

    match result.values("defaultformatString")?.first() {
        Some(template) => Ok(template.to_string()),
        None => anyhow::bail!(
            "no notification template for alert type {alert_type_id} and channel {channel}"
        ),
    }
}

pub async fn user_id<D: Database + ?Sized>(db: &D, login: &str) -> anyhow::Result<u64> {
    let sql = format!(
        "select id from UMUsers where login = '{}';",
        quote_literal(login)
    );
    match db.query(&sql).await?.values("id")?.first() {
        Some(id) => parse_id(id, "user id"),
        None => anyhow::bail!("user '{login}' does not exist"),
    }
}

pub async fn user_group_id<D: Database + ?Sized>(db: &D, name: &str) -> anyhow::Result<u64> {
    let sql = format!(
        "select id from UMGroups where name = '{}';",
        quote_literal(name)
    );
    match db.query(&sql).await?.values("id")?.first() {
        Some(id) => parse_id(id, "user group id"),
        None => anyhow::bail!("user group '{name}' does not exist"),
    }
}
