use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use querymcp_core::domain::invocation::Payload;
use serde_json::Value;

use super::{json_type_name, Handler, HandlerError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlDialect {
    Druid,
    MySql,
    PostgreSql,
    MsSql,
}

impl SqlDialect {
    pub const ALL: [SqlDialect; 4] = [Self::Druid, Self::MySql, Self::PostgreSql, Self::MsSql];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Druid => "druid",
            Self::MySql => "mysql",
            Self::PostgreSql => "postgresql",
            Self::MsSql => "mssql",
        }
    }

    /// Lower bound of the trailing three-month window.
    fn window_start(&self) -> &'static str {
        match self {
            Self::Druid => "CURRENT_TIMESTAMP - INTERVAL '3' MONTH",
            Self::MySql => "NOW() - INTERVAL 3 MONTH",
            Self::PostgreSql => "NOW() - INTERVAL '3 months'",
            Self::MsSql => "DATEADD(MONTH, -3, GETDATE())",
        }
    }

    pub fn margin_by_region_sql(&self) -> String {
        format!(
            "SELECT region, AVG(margin) FROM product_data WHERE __time >= {} GROUP BY region;",
            self.window_start()
        )
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SqlDialect {
    type Err = HandlerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "druid" => Ok(Self::Druid),
            "mysql" => Ok(Self::MySql),
            "postgresql" => Ok(Self::PostgreSql),
            "mssql" => Ok(Self::MsSql),
            other => Err(HandlerError::UnsupportedDialect(other.to_string())),
        }
    }
}

/// `query_agent`: renders the margin-by-region report for the requested dialect.
#[derive(Clone, Debug, Default)]
pub struct QueryBuilderHandler;

#[async_trait]
impl Handler for QueryBuilderHandler {
    fn description(&self) -> &'static str {
        "generate dialect-specific SQL for average margin by region over the last three months"
    }

    async fn invoke(&self, payload: &Payload) -> Result<Payload, HandlerError> {
        let dialect = requested_dialect(payload)?;

        let mut result = Payload::new();
        result.insert("sql".to_string(), Value::String(dialect.margin_by_region_sql()));
        Ok(result)
    }
}

/// Only an absent `dialect` key selects druid; `null` is not a dialect name.
fn requested_dialect(payload: &Payload) -> Result<SqlDialect, HandlerError> {
    match payload.get("dialect") {
        None => Ok(SqlDialect::Druid),
        Some(Value::String(name)) => name.parse(),
        Some(other) => Err(HandlerError::InvalidField {
            field: "dialect",
            reason: format!("expected a string, got {}", json_type_name(other)),
        }),
    }
}
