use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8899";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CURRENCY: &str = "INR";
const DEFAULT_AUDIT_PATH: &str = "audit/activity.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayMode {
    Disabled,
    Test,
    Live,
}

impl GatewayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayMode::Disabled => "disabled",
            GatewayMode::Test => "test",
            GatewayMode::Live => "live",
        }
    }

    /// Reads `/gateway/mode`; absent means `disabled`.
    pub fn from_config_json(config_json: &Value) -> Result<Self> {
        let Some(raw) = config_json.pointer("/gateway/mode") else {
            return Ok(GatewayMode::Disabled);
        };
        let s = raw
            .as_str()
            .context("CONFIG_INVALID /gateway/mode must be a string")?;
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "off" => Ok(GatewayMode::Disabled),
            "test" => Ok(GatewayMode::Test),
            "live" => Ok(GatewayMode::Live),
            other => bail!(
                "CONFIG_INVALID /gateway/mode: unrecognised '{}'; expected disabled | test | live",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSink {
    /// Hash-chained JSONL file at `audit.path`.
    Jsonl,
    /// `activity_log` table.
    Db,
}

/// Typed view over the non-secret parts of the effective config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeskSettings {
    pub server_addr: String,
    pub cors_origins: Vec<String>,
    pub database_max_connections: u32,
    pub gateway_mode: GatewayMode,
    pub gateway_currency: String,
    pub audit_sink: AuditSink,
    pub audit_path: String,
    pub audit_hash_chain: bool,
    /// When true, check-out is refused while the booking has a balance.
    pub require_settled_balance: bool,
}

impl Default for DeskSettings {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            gateway_mode: GatewayMode::Disabled,
            gateway_currency: DEFAULT_CURRENCY.to_string(),
            audit_sink: AuditSink::Jsonl,
            audit_path: DEFAULT_AUDIT_PATH.to_string(),
            audit_hash_chain: true,
            require_settled_balance: true,
        }
    }
}

impl DeskSettings {
    pub fn from_config_json(v: &Value) -> Result<Self> {
        let d = Self::default();

        let cors_origins = match v.pointer("/server/cors_origins") {
            None => d.cors_origins,
            Some(Value::Array(items)) => items
                .iter()
                .map(|i| {
                    i.as_str()
                        .map(str::to_string)
                        .context("CONFIG_INVALID /server/cors_origins entries must be strings")
                })
                .collect::<Result<Vec<_>>>()?,
            Some(_) => bail!("CONFIG_INVALID /server/cors_origins must be a list"),
        };

        let database_max_connections = match v.pointer("/database/max_connections") {
            None => d.database_max_connections,
            Some(n) => n
                .as_u64()
                .filter(|n| *n > 0)
                .and_then(|n| u32::try_from(n).ok())
                .context("CONFIG_INVALID /database/max_connections must be a positive integer")?,
        };

        let audit_sink = match str_at(v, "/audit/sink")?.as_deref() {
            None | Some("jsonl") => AuditSink::Jsonl,
            Some("db") => AuditSink::Db,
            Some(other) => bail!(
                "CONFIG_INVALID /audit/sink: unrecognised '{}'; expected jsonl | db",
                other
            ),
        };

        let gateway_currency = str_at(v, "/gateway/currency")?
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or(d.gateway_currency);
        if gateway_currency.len() != 3 || !gateway_currency.chars().all(|c| c.is_ascii_alphabetic())
        {
            bail!(
                "CONFIG_INVALID /gateway/currency: '{}' is not a 3-letter code",
                gateway_currency
            );
        }

        Ok(Self {
            server_addr: str_at(v, "/server/addr")?.unwrap_or(d.server_addr),
            cors_origins,
            database_max_connections,
            gateway_mode: GatewayMode::from_config_json(v)?,
            gateway_currency,
            audit_sink,
            audit_path: str_at(v, "/audit/path")?.unwrap_or(d.audit_path),
            audit_hash_chain: bool_at(v, "/audit/hash_chain")?.unwrap_or(d.audit_hash_chain),
            require_settled_balance: bool_at(v, "/checkout/require_settled_balance")?
                .unwrap_or(d.require_settled_balance),
        })
    }
}

fn str_at(v: &Value, ptr: &str) -> Result<Option<String>> {
    match v.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(_) => bail!("CONFIG_INVALID {} must be a string", ptr),
    }
}

fn bool_at(v: &Value, ptr: &str) -> Result<Option<bool>> {
    match v.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => bail!("CONFIG_INVALID {} must be true or false", ptr),
    }
}
