//! Shared runtime state for desk-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The payment engine
//! owns the pool and collaborators; this module only bundles them with the
//! event bus and request-level policy.

use std::time::Duration;

use desk_payments::{BalancePolicy, PaymentEngine};
use desk_schemas::Money;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::auth::Authenticator;

// ---------------------------------------------------------------------------
// BusMsg: SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat {
        ts_millis: i64,
    },
    PaymentApplied {
        booking_id: i64,
        payment_id: i64,
        amount: Money,
        payment_method: String,
        record_status: String,
        payment_status: String,
        remaining_amount: Money,
    },
    PaymentVerified {
        booking_id: i64,
        payment_id: i64,
        amount: Money,
        payment_status: String,
        remaining_amount: Money,
    },
    BookingStatus {
        booking_id: i64,
        from: String,
        to: String,
        room_number: String,
    },
    LogLine {
        level: String,
        msg: String,
    },
}

impl BusMsg {
    pub fn event_name(&self) -> &'static str {
        match self {
            BusMsg::Heartbeat { .. } => "heartbeat",
            BusMsg::PaymentApplied { .. } => "payment_applied",
            BusMsg::PaymentVerified { .. } => "payment_verified",
            BusMsg::BookingStatus { .. } => "booking_status",
            BusMsg::LogLine { .. } => "log",
        }
    }
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health / status responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
    pub engine: PaymentEngine,
    pub auth: Authenticator,
    /// Applied to every check-out request.
    pub balance_policy: BalancePolicy,
}

impl AppState {
    pub fn new(engine: PaymentEngine, auth: Authenticator, balance_policy: BalancePolicy) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);
        Self {
            bus,
            build: BuildInfo {
                service: "desk-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            engine,
            auth,
            balance_policy,
        }
    }

    /// Send on the bus. No subscribers is not an error.
    pub fn publish(&self, msg: BusMsg) {
        let _ = self.bus.send(msg);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Monotonically increasing uptime since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}
