//! Runtime secret resolution.
//!
//! YAML stores env var NAMES only (`database.url_env: DESK_DATABASE_URL`).
//! Binaries call [`resolve_secrets`] once at startup and hand the result to
//! constructors. Error messages name the env var, never its value, and the
//! `Debug` impl redacts everything.
//!
//! | gateway.mode | required                                    |
//! |--------------|---------------------------------------------|
//! | disabled     | database url                                |
//! | test / live  | database url, gateway key id + key secret   |
//!
//! API tokens are optional in every mode; without them the daemon refuses
//! every mutating request.

use anyhow::{bail, Result};
use serde_json::Value;

use crate::settings::GatewayMode;

pub const DEFAULT_DATABASE_URL_ENV: &str = "DESK_DATABASE_URL";
const DEFAULT_GATEWAY_KEY_ID_ENV: &str = "DESK_GATEWAY_KEY_ID";
const DEFAULT_GATEWAY_KEY_SECRET_ENV: &str = "DESK_GATEWAY_KEY_SECRET";
const DEFAULT_API_TOKENS_ENV: &str = "DESK_API_TOKENS";

#[derive(Clone)]
pub struct ResolvedSecrets {
    pub database_url: String,
    /// `None` when the gateway is disabled.
    pub gateway_key_id: Option<String>,
    pub gateway_key_secret: Option<String>,
    /// Raw token table, `token=user_id:role;token=user_id:role`.
    pub api_tokens: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("database_url", &"<REDACTED>")
            .field(
                "gateway_key_id",
                &self.gateway_key_id.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "gateway_key_secret",
                &self.gateway_key_secret.as_ref().map(|_| "<REDACTED>"),
            )
            .field("api_tokens", &self.api_tokens.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

struct SecretEnvNames {
    database_url_var: String,
    gateway_key_id_var: String,
    gateway_key_secret_var: String,
    api_tokens_var: String,
}

fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_env_names(config_json: &Value) -> SecretEnvNames {
    SecretEnvNames {
        database_url_var: read_str_at(config_json, "/database/url_env")
            .unwrap_or_else(|| DEFAULT_DATABASE_URL_ENV.to_string()),
        gateway_key_id_var: read_str_at(config_json, "/gateway/keys_env/key_id")
            .unwrap_or_else(|| DEFAULT_GATEWAY_KEY_ID_ENV.to_string()),
        gateway_key_secret_var: read_str_at(config_json, "/gateway/keys_env/key_secret")
            .unwrap_or_else(|| DEFAULT_GATEWAY_KEY_SECRET_ENV.to_string()),
        api_tokens_var: read_str_at(config_json, "/auth/tokens_env")
            .unwrap_or_else(|| DEFAULT_API_TOKENS_ENV.to_string()),
    }
}

/// Resolve secrets from the process environment.
pub fn resolve_secrets(config_json: &Value) -> Result<ResolvedSecrets> {
    resolve_secrets_with(config_json, |name| std::env::var(name).ok())
}

/// Resolve secrets through `lookup`. Blank values count as missing.
pub fn resolve_secrets_with<F>(config_json: &Value, lookup: F) -> Result<ResolvedSecrets>
where
    F: Fn(&str) -> Option<String>,
{
    let names = parse_env_names(config_json);
    let mode = GatewayMode::from_config_json(config_json)?;
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let Some(database_url) = get(&names.database_url_var) else {
        bail!(
            "SECRETS_MISSING: required env var '{}' (database url) is not set or empty",
            names.database_url_var
        );
    };

    let (gateway_key_id, gateway_key_secret) = match mode {
        GatewayMode::Disabled => (None, None),
        GatewayMode::Test | GatewayMode::Live => {
            let Some(id) = get(&names.gateway_key_id_var) else {
                bail!(
                    "SECRETS_MISSING gateway={}: required env var '{}' (gateway key id) \
                     is not set or empty",
                    mode.as_str(),
                    names.gateway_key_id_var
                );
            };
            let Some(secret) = get(&names.gateway_key_secret_var) else {
                bail!(
                    "SECRETS_MISSING gateway={}: required env var '{}' (gateway key secret) \
                     is not set or empty",
                    mode.as_str(),
                    names.gateway_key_secret_var
                );
            };
            (Some(id), Some(secret))
        }
    };

    Ok(ResolvedSecrets {
        database_url,
        gateway_key_id,
        gateway_key_secret,
        api_tokens: get(&names.api_tokens_var),
    })
}
