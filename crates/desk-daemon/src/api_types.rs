//! Request and response types for the desk-daemon HTTP endpoints.
//!
//! Every `/v1/payments` and `/v1/bookings` response uses [`ApiResponse`].
//! No business logic lives here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// `{success, message, data?, error_kind?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error_kind: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error_kind: Some(kind.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// /v1/health  /v1/status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub db_ok: bool,
    /// False when reachable but unmigrated.
    pub db_schema_ready: bool,
    pub gateway: &'static str,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /v1/payments`. `amount` stays raw JSON: clients send both
/// `"1500.00"` and `1500`, and both are checked by one parser.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyPaymentRequest {
    pub booking_id: i64,
    #[serde(default)]
    pub amount: Value,
    pub payment_method: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of `POST /v1/payments/verify`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentRequest {
    pub gateway_payment_id: String,
    pub gateway_order_id: String,
    pub signature: String,
}

/// Body of `POST /v1/bookings/:id/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingStatusRequest {
    pub status: String,
}
