//! Bearer-token authentication.
//!
//! Tokens come from one env var (named in config under `auth.tokens_env`)
//! holding `token=user_id:role` pairs separated by `;`. Session management
//! and token issuance live elsewhere; this only maps a presented token to
//! the [`Actor`] the engine attributes work to.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use desk_schemas::Actor;

#[derive(Clone, Default)]
pub struct Authenticator {
    tokens: HashMap<String, Actor>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

impl Authenticator {
    /// Parse a token table. `None` or blank yields an authenticator that
    /// refuses everything.
    pub fn from_table(raw: Option<&str>) -> Result<Self> {
        let mut tokens = HashMap::new();
        let Some(raw) = raw else {
            return Ok(Self { tokens });
        };

        for (i, entry) in raw.split(';').enumerate() {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            // Never echo the entry: it contains the token.
            let (token, who) = entry
                .split_once('=')
                .with_context(|| format!("AUTH_TABLE_INVALID entry {}: expected token=user_id:role", i + 1))?;
            let (user_id, role) = who
                .split_once(':')
                .with_context(|| format!("AUTH_TABLE_INVALID entry {}: expected user_id:role", i + 1))?;
            let user_id: i64 = user_id
                .trim()
                .parse()
                .with_context(|| format!("AUTH_TABLE_INVALID entry {}: user_id is not an integer", i + 1))?;
            let token = token.trim();
            let role = role.trim();
            if token.len() < 16 {
                bail!("AUTH_TABLE_INVALID entry {}: token shorter than 16 characters", i + 1);
            }
            if role.is_empty() {
                bail!("AUTH_TABLE_INVALID entry {}: role is empty", i + 1);
            }
            if tokens
                .insert(token.to_string(), Actor::new(user_id, role))
                .is_some()
            {
                bail!("AUTH_TABLE_INVALID entry {}: duplicate token", i + 1);
            }
        }
        Ok(Self { tokens })
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Actor for `Authorization: Bearer <token>`, if the token is known.
    pub fn authenticate(&self, headers: &HeaderMap) -> Option<Actor> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))?
            .trim();
        self.tokens.get(token).cloned()
    }
}
