//! desk-daemon entry point.
//!
//! Loads config and secrets, wires the payment engine to its collaborators,
//! attaches middleware, and starts the HTTP server. Route handlers live in
//! `routes.rs`; shared state in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use axum::http::{HeaderValue, Method};
use desk_audit::{ActivityLog, JsonlActivityLog};
use desk_config::{
    report_unused_keys, resolve_secrets, AuditSink, ConfigConsumer, DeskSettings, GatewayMode,
    UnusedKeyPolicy,
};
use desk_daemon::{auth::Authenticator, routes, state};
use desk_gateway::{DisabledGateway, HmacGateway, PaymentGateway};
use desk_payments::{BalancePolicy, DbActivityLog, PaymentEngine};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

const ENV_CONFIG_PATHS: &str = "DESK_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/desk.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let paths = config_paths_from_env();
    let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    let loaded = desk_config::load_layered_yaml(&path_refs)
        .with_context(|| format!("load config from {paths:?}"))?;
    info!(config_hash = %loaded.config_hash, "config loaded");

    let unused = report_unused_keys(
        ConfigConsumer::Daemon,
        &loaded.config_json,
        UnusedKeyPolicy::Warn,
    )?;
    for ptr in &unused.unused_leaf_pointers {
        warn!(pointer = %ptr, "config key is not consumed by the daemon");
    }

    let settings = DeskSettings::from_config_json(&loaded.config_json)?;
    let secrets = resolve_secrets(&loaded.config_json)?;

    let pool = desk_db::connect(&secrets.database_url, settings.database_max_connections).await?;
    let db = desk_db::status(&pool).await?;
    if !db.has_bookings_table {
        // Migrations are an explicit operator step (`desk-cli db migrate`).
        bail!("database schema missing; run `desk-cli db migrate` first");
    }

    let activity: Arc<dyn ActivityLog> = match settings.audit_sink {
        AuditSink::Jsonl => Arc::new(
            JsonlActivityLog::open(&settings.audit_path, settings.audit_hash_chain)
                .with_context(|| format!("open activity log {}", settings.audit_path))?,
        ),
        AuditSink::Db => Arc::new(DbActivityLog::new(pool.clone())),
    };

    let gateway: Arc<dyn PaymentGateway> = match settings.gateway_mode {
        GatewayMode::Disabled => Arc::new(DisabledGateway),
        GatewayMode::Test | GatewayMode::Live => {
            let key_id = secrets
                .gateway_key_id
                .as_deref()
                .context("gateway key id missing")?;
            let key_secret = secrets
                .gateway_key_secret
                .as_deref()
                .context("gateway key secret missing")?;
            Arc::new(HmacGateway::new(key_id, key_secret)?)
        }
    };

    let auth = Authenticator::from_table(secrets.api_tokens.as_deref())?;
    if auth.is_empty() {
        warn!("no API tokens configured; every payment and booking request will be refused");
    }

    let engine = PaymentEngine::new(pool, activity, gateway, settings.gateway_currency.clone());
    let policy = BalancePolicy::from_require_settled(settings.require_settled_balance);
    info!(
        gateway = engine.gateway_name(),
        gateway_mode = settings.gateway_mode.as_str(),
        audit_sink = ?settings.audit_sink,
        ?policy,
        "payment engine ready"
    );

    let shared = Arc::new(state::AppState::new(engine, auth, policy));

    state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(1));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_for(&settings.cors_origins));

    let addr = match bind_addr_from_env() {
        Some(a) => a,
        None => settings
            .server_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid server.addr '{}'", settings.server_addr))?,
    };
    info!("desk-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// `DESK_CONFIG` is a comma-separated list of YAML layers, base first.
fn config_paths_from_env() -> Vec<String> {
    let raw = std::env::var(ENV_CONFIG_PATHS).unwrap_or_default();
    let paths: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if paths.is_empty() {
        vec![DEFAULT_CONFIG_PATH.to_string()]
    } else {
        paths
    }
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("DESK_DAEMON_ADDR").ok()?.parse().ok()
}

fn cors_for(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "ctrl-c handler failed; shutting down");
    }
    info!("shutdown requested");
}
