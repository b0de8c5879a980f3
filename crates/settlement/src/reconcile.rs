//! The settlement algorithm and its tolerance policy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use waveline_core::{AccountId, DomainError, DomainResult, SettlementReason, round2};

/// Adaptive rounding slack accepted when deciding whether a balance is
/// settled.
///
/// Large balances accept a whole unit of slack, small balances require
/// cent-level precision. This is a business rule, not a numerical
/// necessity; it lives here as one named policy instead of magic numbers
/// at call sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TolerancePolicy {
    /// Balances strictly above this use the coarse tolerance.
    pub large_balance_threshold: Decimal,
    /// Slack for large balances.
    pub coarse: Decimal,
    /// Slack for everything else.
    pub fine: Decimal,
}

impl Default for TolerancePolicy {
    fn default() -> Self {
        Self {
            large_balance_threshold: Decimal::new(1000, 0),
            coarse: Decimal::ONE,
            // One cent.
            fine: Decimal::new(1, 2),
        }
    }
}

impl TolerancePolicy {
    /// Tolerance applicable to a given outstanding balance.
    pub fn tolerance_for(&self, remaining_debt: Decimal) -> Decimal {
        if remaining_debt > self.large_balance_threshold {
            self.coarse
        } else {
            self.fine
        }
    }
}

/// One line of a split-payment batch, applied atomically with its
/// siblings. Ephemeral: not persisted as its own entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLine {
    pub account_id: AccountId,
    pub amount: Decimal,
}

/// Result of an accepted settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    /// Paid total after applying the batch, clamped to never exceed the
    /// entity's total amount.
    pub new_total_paid: Decimal,
    /// Outstanding balance after applying the batch (0 unless the caller
    /// accepted residual debt through an override).
    pub remaining_debt: Decimal,
}

/// Validates and aggregates split payments against outstanding balances.
#[derive(Debug, Clone, Default)]
pub struct PaymentReconciler {
    policy: TolerancePolicy,
}

impl PaymentReconciler {
    pub fn new(policy: TolerancePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &TolerancePolicy {
        &self.policy
    }

    /// Decide whether `payments` clears the balance `total_amount -
    /// prior_paid`.
    ///
    /// The boundary is inclusive: a residual gap equal to the tolerance is
    /// accepted as settled. Callers must have verified each payment line
    /// against a distinct, active, currency-compatible account before
    /// calling; the reconciler only does arithmetic.
    pub fn evaluate_settlement(
        &self,
        prior_paid: Decimal,
        total_amount: Decimal,
        payments: &[PaymentLine],
        has_debt: bool,
    ) -> DomainResult<SettlementOutcome> {
        let additional = round2(payments.iter().map(|p| p.amount).sum());
        let remaining_before = round2((total_amount - prior_paid).max(Decimal::ZERO));
        let tolerance = self.policy.tolerance_for(remaining_before);

        // Nothing left to clear: accept, still crediting whatever was
        // tendered (clamped below).
        if !has_debt || remaining_before <= tolerance {
            return Ok(self.accept(prior_paid, total_amount, additional));
        }

        if additional <= Decimal::ZERO {
            return Err(DomainError::settlement(
                SettlementReason::PaymentsRequired,
                remaining_before,
            ));
        }

        let remaining_after = round2((remaining_before - additional).max(Decimal::ZERO));

        if additional < remaining_before - tolerance {
            return Err(DomainError::settlement(
                SettlementReason::InsufficientPayment,
                remaining_after,
            ));
        }

        if remaining_after > tolerance {
            return Err(DomainError::settlement(
                SettlementReason::IncompleteClearance,
                remaining_after,
            ));
        }

        Ok(self.accept(prior_paid, total_amount, additional))
    }

    fn accept(
        &self,
        prior_paid: Decimal,
        total_amount: Decimal,
        additional: Decimal,
    ) -> SettlementOutcome {
        // Excess is clamped away before persistence: paid never exceeds
        // the total amount.
        let new_total_paid = round2((prior_paid + additional).min(total_amount));
        SettlementOutcome {
            new_total_paid,
            remaining_debt: round2((total_amount - new_total_paid).max(Decimal::ZERO)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn line(amount: Decimal) -> PaymentLine {
        PaymentLine {
            account_id: AccountId::new(),
            amount,
        }
    }

    fn reconciler() -> PaymentReconciler {
        PaymentReconciler::default()
    }

    fn reason_of(err: DomainError) -> SettlementReason {
        match err {
            DomainError::SettlementRejected { reason, .. } => reason,
            other => panic!("expected settlement rejection, got {other:?}"),
        }
    }

    #[test]
    fn no_debt_accepts_empty_batch() {
        let outcome = reconciler()
            .evaluate_settlement(dec!(100), dec!(100), &[], false)
            .unwrap();
        assert_eq!(outcome.new_total_paid, dec!(100));
        assert_eq!(outcome.remaining_debt, dec!(0));
    }

    #[test]
    fn empty_batch_with_debt_requires_payments() {
        let err = reconciler()
            .evaluate_settlement(dec!(0), dec!(100), &[], true)
            .unwrap_err();
        assert_eq!(reason_of(err), SettlementReason::PaymentsRequired);
    }

    #[test]
    fn exact_payment_clears_debt() {
        let outcome = reconciler()
            .evaluate_settlement(dec!(0), dec!(100), &[line(dec!(100))], true)
            .unwrap();
        assert_eq!(outcome.new_total_paid, dec!(100));
        assert_eq!(outcome.remaining_debt, dec!(0));
    }

    #[test]
    fn split_batch_sums_before_comparison() {
        let outcome = reconciler()
            .evaluate_settlement(
                dec!(0),
                dec!(100),
                &[line(dec!(60)), line(dec!(40))],
                true,
            )
            .unwrap();
        assert_eq!(outcome.new_total_paid, dec!(100));
    }

    #[test]
    fn overpayment_is_clamped_to_total() {
        let outcome = reconciler()
            .evaluate_settlement(dec!(0), dec!(100), &[line(dec!(150))], true)
            .unwrap();
        assert_eq!(outcome.new_total_paid, dec!(100));
        assert_eq!(outcome.remaining_debt, dec!(0));
    }

    #[test]
    fn large_balance_boundary_is_inclusive() {
        // Gap of exactly 1 on a 1,000,000 balance == coarse tolerance:
        // accepted as settled.
        let outcome = reconciler()
            .evaluate_settlement(dec!(0), dec!(1000000), &[line(dec!(999999))], true)
            .unwrap();
        assert_eq!(outcome.new_total_paid, dec!(999999));
        assert_eq!(outcome.remaining_debt, dec!(1));

        let outcome = reconciler()
            .evaluate_settlement(dec!(0), dec!(1000000), &[line(dec!(999999.5))], true)
            .unwrap();
        assert_eq!(outcome.new_total_paid, dec!(999999.50));
    }

    #[test]
    fn large_balance_rejects_below_tolerance() {
        let err = reconciler()
            .evaluate_settlement(dec!(0), dec!(1000000), &[line(dec!(999998.5))], true)
            .unwrap_err();
        assert_eq!(reason_of(err), SettlementReason::InsufficientPayment);
    }

    #[test]
    fn small_balance_requires_cent_precision() {
        // 99.99 against 100: gap 0.01 == fine tolerance, accepted.
        let outcome = reconciler()
            .evaluate_settlement(dec!(0), dec!(100), &[line(dec!(99.99))], true)
            .unwrap();
        assert_eq!(outcome.new_total_paid, dec!(99.99));
        assert_eq!(outcome.remaining_debt, dec!(0.01));

        // 99.98: gap 0.02, rejected.
        let err = reconciler()
            .evaluate_settlement(dec!(0), dec!(100), &[line(dec!(99.98))], true)
            .unwrap_err();
        assert_eq!(reason_of(err), SettlementReason::InsufficientPayment);
    }

    #[test]
    fn debt_flag_false_accepts_and_still_clamps() {
        let outcome = reconciler()
            .evaluate_settlement(dec!(90), dec!(100), &[line(dec!(50))], false)
            .unwrap();
        assert_eq!(outcome.new_total_paid, dec!(100));
    }

    #[test]
    fn prior_paid_reduces_required_amount() {
        let outcome = reconciler()
            .evaluate_settlement(dec!(60), dec!(100), &[line(dec!(40))], true)
            .unwrap();
        assert_eq!(outcome.new_total_paid, dec!(100));
        assert_eq!(outcome.remaining_debt, dec!(0));
    }

    #[test]
    fn rejection_carries_remaining_debt() {
        let err = reconciler()
            .evaluate_settlement(dec!(0), dec!(100), &[line(dec!(40))], true)
            .unwrap_err();
        match err {
            DomainError::SettlementRejected {
                reason,
                remaining_debt,
            } => {
                assert_eq!(reason, SettlementReason::InsufficientPayment);
                assert_eq!(remaining_debt, dec!(60));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn custom_policy_is_honored() {
        let strict = PaymentReconciler::new(TolerancePolicy {
            large_balance_threshold: dec!(1000000),
            coarse: dec!(1),
            fine: dec!(0),
        });
        // With fine tolerance zero, a 0.01 gap is no longer settled.
        let err = strict
            .evaluate_settlement(dec!(0), dec!(100), &[line(dec!(99.99))], true)
            .unwrap_err();
        assert_eq!(reason_of(err), SettlementReason::InsufficientPayment);
    }

    proptest! {
        #[test]
        fn new_total_paid_is_monotone_and_clamped(
            total_cents in 1i64..100_000_000,
            prior_cents in 0i64..100_000_000,
            pay_cents in 0i64..100_000_000,
            extra_cents in 0i64..1_000_000,
        ) {
            let total = Decimal::new(total_cents, 2);
            let prior = Decimal::new(prior_cents.min(total_cents), 2);
            let pay = Decimal::new(pay_cents, 2);
            let more = Decimal::new(pay_cents + extra_cents, 2);
            let rec = reconciler();
            let has_debt = prior < total;

            let a = rec.evaluate_settlement(prior, total, &[line(pay)], has_debt);
            let b = rec.evaluate_settlement(prior, total, &[line(more)], has_debt);

            if let (Ok(a), Ok(b)) = (a, b) {
                prop_assert!(b.new_total_paid >= a.new_total_paid);
                prop_assert!(a.new_total_paid <= total);
                prop_assert!(b.new_total_paid <= total);
            }
        }
    }
}
