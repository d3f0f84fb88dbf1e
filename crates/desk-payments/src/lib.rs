//! desk-payments
//!
//! The payment reconciliation engine: applies tendered payments to bookings,
//! settles gateway payments on signature verification, answers balance
//! queries and moves bookings through check-in/check-out.
//!
//! Settlement math lives in `desk-reconcile`; this crate adds the
//! transaction boundary, the row locks and the error taxonomy.

mod activity;
mod engine;
mod error;
mod types;

pub use activity::DbActivityLog;
pub use engine::{
    parse_amount, PaymentEngine, ACTION_BOOKING_STATUS, ACTION_PAYMENT_APPLIED,
    ACTION_PAYMENT_OVERPAID, ACTION_PAYMENT_VERIFICATION_FAILED, ACTION_PAYMENT_VERIFIED,
};
pub use error::{ErrorKind, PaymentError};
pub use types::{BalancePolicy, BalanceView, BookingTransition, PaymentResult, VerifyResult};

pub use desk_reconcile::{LedgerAction, LedgerReason, LedgerReport};
