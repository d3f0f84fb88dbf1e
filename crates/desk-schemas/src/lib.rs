//! desk-schemas
//!
//! Shared vocabulary for the front-desk workspace: the fixed-point [`Money`]
//! type, the closed enums stored in the datastore, and the authenticated
//! [`Actor`] handed from the HTTP layer to the payment engine.
//!
//! No IO lives here. Every enum round-trips through `as_str` / `parse` using
//! the exact lowercase strings persisted in Postgres CHECK constraints.

mod money;
mod status;

pub use money::{Money, MoneyParseError, MINOR_UNITS_PER_MAJOR};
pub use status::{
    BookingStatus, ParseEnumError, PaymentMethod, PaymentRecordStatus, PaymentStatus, RoomStatus,
};

use serde::{Deserialize, Serialize};

/// Validated identity of the staff member driving a request.
///
/// Produced by the authentication collaborator; the engine trusts it as-is
/// and only uses it for attribution (payment rows, activity log).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    pub role: String,
}

impl Actor {
    pub fn new(user_id: i64, role: impl Into<String>) -> Self {
        Self {
            user_id,
            role: role.into(),
        }
    }
}
