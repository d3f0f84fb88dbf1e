//! desk-reconcile
//!
//! Booking balance reconciliation.
//!
//! Decisions encoded here:
//! - A payment may never exceed the booking's remaining balance.
//! - The persisted running `paid_amount` is the source of truth; summing
//!   completed payments is an audit check ([`audit_ledger`]), not a read path.
//! - Remaining balance never persists below zero. A verified gateway payment
//!   that arrives after the balance was already settled is clamped and
//!   reported as an anomaly instead of being lost.
//! - `payment_status` only moves forward.
//!
//! Deterministic, pure logic. No IO. No datastore calls.

mod ledger;
mod room;
mod settle;
mod types;

pub use ledger::audit_ledger;
pub use room::derive_room_status;
pub use settle::{derive_payment_status, settle, settle_verified};
pub use types::*;
