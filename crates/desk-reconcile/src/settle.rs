use desk_schemas::{Money, PaymentStatus};

use crate::{BookingBalance, SettleRefusal, Settlement, SettlementAnomaly};

/// Payment status implied by a booking's totals.
///
/// - nothing paid on a non-zero total => `Unpaid`
/// - nothing left to pay              => `Completed`
/// - otherwise                        => `Partial`
pub fn derive_payment_status(total: Money, paid: Money) -> PaymentStatus {
    let remaining = total.checked_sub(paid).unwrap_or(Money::ZERO);
    if !remaining.is_positive() {
        PaymentStatus::Completed
    } else if paid.is_positive() {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Unpaid
    }
}

/// Credit a tendered payment against a booking.
///
/// Refuses non-positive amounts, any amount once the booking is settled, and
/// any amount above the remaining balance. On success the returned
/// [`Settlement`] holds the values to persist in the same transaction as the
/// payment row.
pub fn settle(balance: &BookingBalance, amount: Money) -> Result<Settlement, SettleRefusal> {
    if !amount.is_positive() {
        return Err(SettleRefusal::NonPositiveAmount { amount });
    }
    if !balance.remaining.is_positive() {
        return Err(SettleRefusal::AlreadySettled);
    }
    if amount > balance.remaining {
        return Err(SettleRefusal::ExceedsRemaining {
            amount,
            remaining: balance.remaining,
        });
    }
    credit(balance, amount)
}

/// Credit a payment the processor has already captured.
///
/// Unlike [`settle`] this cannot refuse an amount above the remaining
/// balance: the money has moved. The excess is clamped and reported as
/// [`SettlementAnomaly::Overpaid`].
pub fn settle_verified(
    balance: &BookingBalance,
    amount: Money,
) -> Result<Settlement, SettleRefusal> {
    if !amount.is_positive() {
        return Err(SettleRefusal::NonPositiveAmount { amount });
    }
    credit(balance, amount)
}

fn credit(balance: &BookingBalance, amount: Money) -> Result<Settlement, SettleRefusal> {
    let new_paid = balance
        .paid
        .checked_add(amount)
        .ok_or(SettleRefusal::Overflow)?;
    let new_remaining = balance
        .total
        .checked_sub(new_paid)
        .ok_or(SettleRefusal::Overflow)?;

    let (paid, remaining, anomaly) = if new_remaining.is_negative() {
        let excess = Money::ZERO
            .checked_sub(new_remaining)
            .ok_or(SettleRefusal::Overflow)?;
        (
            balance.total,
            Money::ZERO,
            Some(SettlementAnomaly::Overpaid { excess }),
        )
    } else {
        (new_paid, new_remaining, None)
    };

    let payment_status = derive_payment_status(balance.total, paid);
    if !balance.payment_status.can_advance_to(payment_status) {
        return Err(SettleRefusal::StatusRegression {
            from: balance.payment_status,
            to: payment_status,
        });
    }

    Ok(Settlement {
        paid,
        remaining,
        payment_status,
        anomaly,
    })
}
