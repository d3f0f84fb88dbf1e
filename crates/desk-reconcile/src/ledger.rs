use desk_schemas::Money;

use crate::{
    derive_payment_status, BookingBalance, LedgerAction, LedgerDiff, LedgerReason, LedgerReport,
};

fn push_reason_once(reasons: &mut Vec<LedgerReason>, r: LedgerReason) {
    if !reasons.contains(&r) {
        reasons.push(r);
    }
}

/// Cross-check a booking's running totals against its completed payments.
///
/// - running `paid` != sum of completed payments => `RunningTotalMismatch`
/// - stored `remaining` != `total - paid`         => `RemainingInconsistent`
/// - `paid` > `total`                             => `PaidExceedsTotal`
/// - stored status != status derived from totals  => `StatusInconsistent`
///
/// A verified gateway overpayment leaves the payments sum above the capped
/// running total. That shows up here as a mismatch; the activity log carries
/// the matching `payment_overpaid` entry.
pub fn audit_ledger(balance: &BookingBalance, completed_payments: &[Money]) -> LedgerReport {
    let mut reasons: Vec<LedgerReason> = Vec::new();
    let mut diffs: Vec<LedgerDiff> = Vec::new();

    // 1) Running total vs payments. Saturate: an overflowing sum is itself drift.
    let payments_sum = completed_payments
        .iter()
        .try_fold(Money::ZERO, |acc, p| acc.checked_add(*p))
        .unwrap_or(Money::from_minor(i64::MAX));
    if payments_sum != balance.paid {
        diffs.push(LedgerDiff::PaidVsPayments {
            running_total: balance.paid,
            payments_sum,
        });
        push_reason_once(&mut reasons, LedgerReason::RunningTotalMismatch);
    }

    // 2) remaining = total - paid
    match balance.total.checked_sub(balance.paid) {
        Some(expected) if expected == balance.remaining => {}
        Some(expected) => {
            diffs.push(LedgerDiff::Remaining {
                stored: balance.remaining,
                expected,
            });
            push_reason_once(&mut reasons, LedgerReason::RemainingInconsistent);
        }
        None => push_reason_once(&mut reasons, LedgerReason::RemainingInconsistent),
    }

    // 3) paid <= total
    if balance.paid > balance.total {
        diffs.push(LedgerDiff::PaidExceedsTotal {
            paid: balance.paid,
            total: balance.total,
        });
        push_reason_once(&mut reasons, LedgerReason::PaidExceedsTotal);
    }

    // 4) status
    let derived = derive_payment_status(balance.total, balance.paid);
    if derived != balance.payment_status {
        diffs.push(LedgerDiff::Status {
            stored: balance.payment_status,
            derived,
        });
        push_reason_once(&mut reasons, LedgerReason::StatusInconsistent);
    }

    reasons.sort();
    diffs.sort();

    if reasons.is_empty() {
        LedgerReport::clean()
    } else {
        LedgerReport {
            action: LedgerAction::Drift,
            reasons,
            diffs,
        }
    }
}
