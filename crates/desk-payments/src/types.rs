use desk_schemas::{BookingStatus, Money, PaymentMethod, PaymentRecordStatus, PaymentStatus, RoomStatus};
use serde::Serialize;

/// Outcome of [`crate::PaymentEngine::apply_payment`].
///
/// For gateway payments `paid`/`remaining` are the booking's current values:
/// the pending row credits nothing until it is verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentResult {
    pub payment_id: i64,
    pub booking_id: i64,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub record_status: PaymentRecordStatus,
    pub paid_amount: Money,
    pub remaining_amount: Money,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_order_id: Option<String>,
}

/// Outcome of [`crate::PaymentEngine::verify_gateway_payment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyResult {
    pub payment_id: i64,
    pub booking_id: i64,
    pub amount: Money,
    pub paid_amount: Money,
    pub remaining_amount: Money,
    pub payment_status: PaymentStatus,
    /// True when the payment was already completed and nothing changed.
    pub already_verified: bool,
    /// Amount credited beyond the outstanding balance, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overpaid_by: Option<Money>,
}

/// Balance snapshot of one booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceView {
    pub booking_id: i64,
    pub room_number: String,
    pub status: BookingStatus,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub remaining_amount: Money,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingTransition {
    pub booking_id: i64,
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub room_number: String,
    /// `None` when the transition does not touch the room.
    pub room_status: Option<RoomStatus>,
    pub remaining_amount: Money,
}

/// Whether check-out requires a settled balance. Decided by the caller
/// (front-desk configuration), not by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalancePolicy {
    RequireSettled,
    AllowOutstanding,
}

impl BalancePolicy {
    pub fn from_require_settled(require: bool) -> Self {
        if require {
            BalancePolicy::RequireSettled
        } else {
            BalancePolicy::AllowOutstanding
        }
    }
}
