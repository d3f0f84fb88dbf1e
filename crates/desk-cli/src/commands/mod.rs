//! Engine wiring and `key=value` printers for the CLI subcommands.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use desk_audit::{verify_hash_chain, ActivityLog, JsonlActivityLog, VerifyResult as ChainResult};
use desk_config::{
    report_unused_keys, resolve_secrets, AuditSink, ConfigConsumer, DeskSettings, GatewayMode,
    UnusedKeyPolicy,
};
use desk_db::PaymentRow;
use desk_gateway::{DisabledGateway, HmacGateway, PaymentGateway};
use desk_payments::{
    BalancePolicy, BalanceView, DbActivityLog, LedgerAction, LedgerReport, PaymentEngine,
    PaymentResult, VerifyResult,
};
use desk_schemas::Actor;
use tracing::{info, warn};

pub struct WiredEngine {
    pub engine: PaymentEngine,
    pub balance_policy: BalancePolicy,
}

/// Build a [`PaymentEngine`] from layered config, the same way the daemon
/// does: secrets from env, activity sink and gateway from config.
pub async fn wire_engine(config_paths: &[String]) -> Result<WiredEngine> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = desk_config::load_layered_yaml(&path_refs)?;

    let unused = report_unused_keys(ConfigConsumer::Cli, &loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !unused.is_clean() {
        warn!(keys = ?unused.unused_leaf_pointers, "config keys not consumed by the CLI");
    }

    let settings = DeskSettings::from_config_json(&loaded.config_json)?;
    let secrets = resolve_secrets(&loaded.config_json)?;
    let pool = desk_db::connect(&secrets.database_url, settings.database_max_connections).await?;

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

    info!(config_hash = %loaded.config_hash, gateway = gateway.name(), "engine wired");

    Ok(WiredEngine {
        engine: PaymentEngine::new(pool, activity, gateway, settings.gateway_currency.clone()),
        balance_policy: BalancePolicy::from_require_settled(settings.require_settled_balance),
    })
}

pub fn operator(user_id: i64, role: &str) -> Result<Actor> {
    if user_id <= 0 {
        bail!("--user-id must be a positive integer");
    }
    let role = role.trim();
    if role.is_empty() {
        bail!("--role must not be empty");
    }
    Ok(Actor::new(user_id, role))
}

pub fn verify_audit_file(path: &str) -> Result<()> {
    match verify_hash_chain(path)? {
        ChainResult::Valid { lines } => {
            println!("audit_chain=valid lines={lines} path={path}");
            Ok(())
        }
        ChainResult::Broken { line, reason } => {
            println!("audit_chain=broken line={line} path={path}");
            bail!("AUDIT_CHAIN_BROKEN line={line}: {reason}")
        }
    }
}

pub fn print_balance(v: &BalanceView) {
    println!("booking_id={}", v.booking_id);
    println!("room_number={}", v.room_number);
    println!("status={}", v.status.as_str());
    println!("total_amount={}", v.total_amount);
    println!("paid_amount={}", v.paid_amount);
    println!("remaining_amount={}", v.remaining_amount);
    println!("payment_status={}", v.payment_status.as_str());
}

pub fn print_ledger(booking_id: i64, r: &LedgerReport) {
    let action = match r.action {
        LedgerAction::Clean => "clean",
        LedgerAction::Drift => "drift",
    };
    println!("booking_id={booking_id}");
    println!("ledger={action}");
    for reason in &r.reasons {
        println!("reason={reason:?}");
    }
    for diff in &r.diffs {
        // Diffs serialize from plain enums and Money; cannot fail.
        if let Ok(s) = serde_json::to_string(diff) {
            println!("diff={s}");
        }
    }
}

pub fn print_payment(r: &PaymentResult) {
    println!("payment_id={}", r.payment_id);
    println!("booking_id={}", r.booking_id);
    println!("amount={}", r.amount);
    println!("payment_method={}", r.payment_method.as_str());
    println!("record_status={}", r.record_status.as_str());
    if let Some(order) = &r.gateway_order_id {
        println!("gateway_order_id={order}");
    }
    println!("paid_amount={}", r.paid_amount);
    println!("remaining_amount={}", r.remaining_amount);
    println!("payment_status={}", r.payment_status.as_str());
}

pub fn print_verify(r: &VerifyResult) {
    println!("payment_id={}", r.payment_id);
    println!("booking_id={}", r.booking_id);
    println!("amount={}", r.amount);
    println!("already_verified={}", r.already_verified);
    println!("paid_amount={}", r.paid_amount);
    println!("remaining_amount={}", r.remaining_amount);
    println!("payment_status={}", r.payment_status.as_str());
    if let Some(excess) = r.overpaid_by {
        println!("overpaid_by={excess}");
    }
}

pub fn print_payments(rows: &[PaymentRow]) {
    println!("payments={}", rows.len());
    for p in rows {
        println!(
            "payment_id={} amount={} method={} status={} order={} created_at_utc={}",
            p.payment_id,
            p.amount,
            p.method.as_str(),
            p.status.as_str(),
            p.gateway_order_id.as_deref().unwrap_or("-"),
            p.created_at_utc.to_rfc3339(),
        );
    }
}
