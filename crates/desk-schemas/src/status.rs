use std::fmt;

use serde::{Deserialize, Serialize};

/// A stored or submitted string did not match any variant of a closed enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

fn invalid(kind: &'static str, value: &str) -> ParseEnumError {
    ParseEnumError {
        kind,
        value: value.to_string(),
    }
}

// ---------------------------------------------------------------------------
// PaymentMethod
// ---------------------------------------------------------------------------

/// How a payment was tendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    /// Online payment processor; settles asynchronously after verification.
    Gateway,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Gateway => "gateway",
        }
    }

    /// Case-insensitive. `online` is accepted as an alias of `gateway`.
    pub fn parse(s: &str) -> Result<Self, ParseEnumError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "gateway" | "online" => Ok(PaymentMethod::Gateway),
            _ => Err(invalid("payment_method", s)),
        }
    }

    /// Gateway payments are recorded `pending` and only credit the booking
    /// once the processor's signature has been verified.
    pub fn settles_immediately(&self) -> bool {
        !matches!(self, PaymentMethod::Gateway)
    }
}

// ---------------------------------------------------------------------------
// PaymentStatus (booking aggregate)
// ---------------------------------------------------------------------------

/// Payment state of a booking, derived from its paid/remaining amounts.
///
/// `Unpaid -> Partial -> Completed`, monotonic. A refund or reversal path
/// would need a new variant and its own transition rule in
/// [`PaymentStatus::can_advance_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Completed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Completed => "completed",
        }
    }

    /// Legacy rows spell the terminal state `fully_paid`; it reads as `Completed`.
    pub fn parse(s: &str) -> Result<Self, ParseEnumError> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "partial" => Ok(PaymentStatus::Partial),
            "completed" | "fully_paid" => Ok(PaymentStatus::Completed),
            _ => Err(invalid("payment_status", s)),
        }
    }

    /// Forward-only: staying put or moving towards `Completed`.
    pub fn can_advance_to(&self, next: PaymentStatus) -> bool {
        next >= *self
    }
}

// ---------------------------------------------------------------------------
// PaymentRecordStatus (single payment row)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentRecordStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentRecordStatus::Pending => "pending",
            PaymentRecordStatus::Completed => "completed",
            PaymentRecordStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ParseEnumError> {
        match s {
            "pending" => Ok(PaymentRecordStatus::Pending),
            "completed" => Ok(PaymentRecordStatus::Completed),
            "failed" => Ok(PaymentRecordStatus::Failed),
            _ => Err(invalid("payment record status", s)),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentRecordStatus::Pending)
    }
}

// ---------------------------------------------------------------------------
// BookingStatus (stay lifecycle)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::CheckedIn => "checked_in",
            BookingStatus::CheckedOut => "checked_out",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ParseEnumError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "checked_in" => Ok(BookingStatus::CheckedIn),
            "checked_out" => Ok(BookingStatus::CheckedOut),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(invalid("booking status", s)),
        }
    }

    /// Active bookings hold their room.
    pub fn is_active(&self) -> bool {
        !matches!(self, BookingStatus::CheckedOut | BookingStatus::Cancelled)
    }

    /// Allowed lifecycle edges:
    /// - `pending   -> confirmed | cancelled`
    /// - `confirmed -> checked_in | cancelled`
    /// - `checked_in -> checked_out`
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::CheckedIn)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
                | (BookingStatus::CheckedIn, BookingStatus::CheckedOut)
        )
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Available,
    Booked,
    Occupied,
    Cleaning,
    Maintenance,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Booked => "booked",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Cleaning => "cleaning",
            RoomStatus::Maintenance => "maintenance",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ParseEnumError> {
        match s {
            "available" => Ok(RoomStatus::Available),
            "booked" => Ok(RoomStatus::Booked),
            "occupied" => Ok(RoomStatus::Occupied),
            "cleaning" => Ok(RoomStatus::Cleaning),
            "maintenance" => Ok(RoomStatus::Maintenance),
            _ => Err(invalid("room status", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_method_aliases_and_rejects() {
        assert_eq!(PaymentMethod::parse("CASH").unwrap(), PaymentMethod::Cash);
        assert_eq!(PaymentMethod::parse("online").unwrap(), PaymentMethod::Gateway);
        let err = PaymentMethod::parse("cheque").unwrap_err();
        assert_eq!(err.to_string(), "invalid payment_method: 'cheque'");
    }

    #[test]
    fn legacy_fully_paid_reads_as_completed() {
        assert_eq!(
            PaymentStatus::parse("fully_paid").unwrap(),
            PaymentStatus::Completed
        );
        assert_eq!(PaymentStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn payment_status_is_monotonic() {
        assert!(PaymentStatus::Unpaid.can_advance_to(PaymentStatus::Partial));
        assert!(PaymentStatus::Partial.can_advance_to(PaymentStatus::Completed));
        assert!(PaymentStatus::Partial.can_advance_to(PaymentStatus::Partial));
        assert!(!PaymentStatus::Completed.can_advance_to(PaymentStatus::Partial));
        assert!(!PaymentStatus::Partial.can_advance_to(PaymentStatus::Unpaid));
    }

    #[test]
    fn booking_lifecycle_edges() {
        use BookingStatus::*;
        assert!(Confirmed.can_transition_to(CheckedIn));
        assert!(CheckedIn.can_transition_to(CheckedOut));
        assert!(!CheckedOut.can_transition_to(CheckedIn));
        assert!(!CheckedIn.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(CheckedIn));
        assert!(!Cancelled.is_active());
        assert!(CheckedIn.is_active());
    }

    #[test]
    fn stored_strings_round_trip() {
        for s in [
            RoomStatus::Available,
            RoomStatus::Booked,
            RoomStatus::Occupied,
            RoomStatus::Cleaning,
            RoomStatus::Maintenance,
        ] {
            assert_eq!(RoomStatus::parse(s.as_str()).unwrap(), s);
        }
        for s in [
            PaymentRecordStatus::Pending,
            PaymentRecordStatus::Completed,
            PaymentRecordStatus::Failed,
        ] {
            assert_eq!(PaymentRecordStatus::parse(s.as_str()).unwrap(), s);
        }
    }
}
