//! Proportional allocation of a payment across an invoice's DPP and PPN
//! components. The DPP portion is rounded to cents; the tax portion takes
//! the exact remainder so every payment reconciles.

use crate::domain::{PaymentAllocation, PaymentComponent};
use crate::error::{BackofficeError, Result};
use rust_decimal::{Decimal, RoundingStrategy};

/// The split of one payment across the invoice components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationBreakdown {
    pub dpp: Decimal,
    pub ppn: Decimal,
}

impl AllocationBreakdown {
    pub fn into_allocations(self) -> Vec<PaymentAllocation> {
        vec![
            PaymentAllocation {
                component: PaymentComponent::Dpp,
                amount: self.dpp,
            },
            PaymentAllocation {
                component: PaymentComponent::Ppn,
                amount: self.ppn,
            },
        ]
    }
}

/// Split `amount` across the outstanding DPP and PPN balances in proportion
/// to what remains of each.
///
/// Invariants on the returned breakdown: both portions are non-negative,
/// neither exceeds its outstanding balance, and they sum to `amount`
/// exactly. A payment equal to the outstanding total settles both
/// components to zero.
pub fn allocate_payment(
    outstanding_dpp: Decimal,
    outstanding_ppn: Decimal,
    amount: Decimal,
) -> Result<AllocationBreakdown> {
    if amount <= Decimal::ZERO {
        return Err(BackofficeError::Validation(
            "payment amount must be positive".to_string(),
        ));
    }

    let outstanding_total = outstanding_dpp + outstanding_ppn;
    if outstanding_total <= Decimal::ZERO {
        return Err(BackofficeError::Validation(
            "invoice is already settled".to_string(),
        ));
    }
    if amount > outstanding_total {
        return Err(BackofficeError::Validation(format!(
            "payment {amount} exceeds outstanding balance {outstanding_total}"
        )));
    }

    // Full settlement closes both components exactly, no ratio involved.
    if amount == outstanding_total {
        return Ok(AllocationBreakdown {
            dpp: outstanding_dpp,
            ppn: outstanding_ppn,
        });
    }

    let mut dpp = (amount * outstanding_dpp / outstanding_total)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if dpp > outstanding_dpp {
        dpp = outstanding_dpp;
    }

    // The tax side absorbs the rounding remainder.
    let mut ppn = amount - dpp;
    if ppn > outstanding_ppn {
        dpp += ppn - outstanding_ppn;
        ppn = outstanding_ppn;
    }
    if ppn < Decimal::ZERO {
        dpp += ppn;
        ppn = Decimal::ZERO;
    }

    Ok(AllocationBreakdown { dpp, ppn })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn splits_proportionally() {
        // 11% VAT invoice, half paid.
        let breakdown = allocate_payment(d("1000000"), d("110000"), d("555000")).unwrap();
        assert_eq!(breakdown.dpp, d("500000"));
        assert_eq!(breakdown.ppn, d("55000"));
    }

    #[test]
    fn portions_always_sum_to_amount() {
        let breakdown = allocate_payment(d("100"), d("11"), d("37")).unwrap();
        assert_eq!(breakdown.dpp + breakdown.ppn, d("37"));
        assert!(breakdown.dpp >= Decimal::ZERO && breakdown.ppn >= Decimal::ZERO);
    }

    #[test]
    fn tax_side_takes_rounding_remainder() {
        // 10 / 1 split paid with 3.33: DPP rounds to 3.03, PPN gets 0.30.
        let breakdown = allocate_payment(d("10"), d("1"), d("3.33")).unwrap();
        assert_eq!(breakdown.dpp, d("3.03"));
        assert_eq!(breakdown.ppn, d("0.30"));
    }

    #[test]
    fn full_settlement_is_exact() {
        let breakdown = allocate_payment(d("999.99"), d("110.01"), d("1110")).unwrap();
        assert_eq!(breakdown.dpp, d("999.99"));
        assert_eq!(breakdown.ppn, d("110.01"));
    }

    #[test]
    fn zero_tax_invoice_allocates_everything_to_dpp() {
        let breakdown = allocate_payment(d("500"), Decimal::ZERO, d("200")).unwrap();
        assert_eq!(breakdown.dpp, d("200"));
        assert_eq!(breakdown.ppn, Decimal::ZERO);
    }

    #[test]
    fn component_never_exceeds_its_outstanding_balance() {
        // Tiny DPP remainder: most of the payment must land on PPN.
        let breakdown = allocate_payment(d("0.01"), d("100"), d("90")).unwrap();
        assert!(breakdown.dpp <= d("0.01"));
        assert!(breakdown.ppn <= d("100"));
        assert_eq!(breakdown.dpp + breakdown.ppn, d("90"));
    }

    #[test]
    fn rejects_non_positive_amounts() {
        assert!(allocate_payment(d("100"), d("11"), Decimal::ZERO).is_err());
        assert!(allocate_payment(d("100"), d("11"), d("-5")).is_err());
    }

    #[test]
    fn rejects_overpayment() {
        assert!(allocate_payment(d("100"), d("11"), d("111.01")).is_err());
    }

    #[test]
    fn rejects_settled_invoice() {
        assert!(allocate_payment(Decimal::ZERO, Decimal::ZERO, d("1")).is_err());
    }
}
