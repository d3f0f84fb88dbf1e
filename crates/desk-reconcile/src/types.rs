use desk_schemas::{Money, PaymentStatus, RoomStatus};
use serde::Serialize;

/// Balance fields of one booking as read under its row lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BookingBalance {
    pub total: Money,
    pub paid: Money,
    pub remaining: Money,
    pub payment_status: PaymentStatus,
}

impl BookingBalance {
    /// Balance with `remaining` and `payment_status` derived from `total` / `paid`.
    pub fn from_totals(total: Money, paid: Money) -> Self {
        let remaining = total
            .checked_sub(paid)
            .unwrap_or(Money::ZERO)
            .clamp_non_negative();
        Self {
            total,
            paid,
            remaining,
            payment_status: crate::derive_payment_status(total, paid),
        }
    }
}

/// New balance to persist after crediting a payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub paid: Money,
    pub remaining: Money,
    pub payment_status: PaymentStatus,
    /// Set when the credit would have driven `remaining` below zero.
    pub anomaly: Option<SettlementAnomaly>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SettlementAnomaly {
    /// Credit exceeded the outstanding balance by `excess`; paid was capped
    /// at total and remaining clamped to zero.
    Overpaid { excess: Money },
}

/// Why a payment could not be credited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettleRefusal {
    NonPositiveAmount { amount: Money },
    AlreadySettled,
    ExceedsRemaining { amount: Money, remaining: Money },
    /// The stored status is ahead of what the new balance implies.
    StatusRegression { from: PaymentStatus, to: PaymentStatus },
    Overflow,
}

impl std::fmt::Display for SettleRefusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettleRefusal::NonPositiveAmount { amount } => {
                write!(f, "amount must be greater than zero (got {amount})")
            }
            SettleRefusal::AlreadySettled => write!(f, "booking is already fully paid"),
            SettleRefusal::ExceedsRemaining { amount, remaining } => write!(
                f,
                "payment exceeds remaining balance (amount {amount}, remaining {remaining})"
            ),
            SettleRefusal::StatusRegression { from, to } => write!(
                f,
                "payment status cannot move from {} to {}",
                from.as_str(),
                to.as_str()
            ),
            SettleRefusal::Overflow => write!(f, "amount is out of range for this booking"),
        }
    }
}

impl std::error::Error for SettleRefusal {}

/// Room status change implied by a booking lifecycle transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoomStatusUpdate {
    pub room_number: String,
    pub status: RoomStatus,
}

// ---------------------------------------------------------------------------
// Ledger audit
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerAction {
    Clean,
    Drift,
}

/// Stable ordering enforced by [`crate::audit_ledger`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerReason {
    RunningTotalMismatch,
    RemainingInconsistent,
    PaidExceedsTotal,
    StatusInconsistent,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerDiff {
    PaidVsPayments {
        running_total: Money,
        payments_sum: Money,
    },
    Remaining {
        stored: Money,
        expected: Money,
    },
    PaidExceedsTotal {
        paid: Money,
        total: Money,
    },
    Status {
        stored: PaymentStatus,
        derived: PaymentStatus,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerReport {
    pub action: LedgerAction,
    pub reasons: Vec<LedgerReason>,
    pub diffs: Vec<LedgerDiff>,
}

impl LedgerReport {
    pub fn clean() -> Self {
        Self {
            action: LedgerAction::Clean,
            reasons: Vec::new(),
            diffs: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.action == LedgerAction::Clean
    }
}
