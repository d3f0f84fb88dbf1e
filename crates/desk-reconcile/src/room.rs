use desk_schemas::{BookingStatus, RoomStatus};

use crate::RoomStatusUpdate;

/// Room status implied by a booking entering `status`.
///
/// Payments never call this; only check-in/out and cancellation do.
/// `Pending` bookings have not reserved the room yet, so no update.
pub fn derive_room_status(room_number: &str, status: BookingStatus) -> Option<RoomStatusUpdate> {
    let room_status = match status {
        BookingStatus::Pending => return None,
        BookingStatus::Confirmed => RoomStatus::Booked,
        BookingStatus::CheckedIn => RoomStatus::Occupied,
        BookingStatus::CheckedOut => RoomStatus::Cleaning,
        BookingStatus::Cancelled => RoomStatus::Available,
    };
    Some(RoomStatusUpdate {
        room_number: room_number.to_string(),
        status: room_status,
    })
}
