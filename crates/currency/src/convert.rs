//! Conversion engine over a rate-table snapshot.

use rust_decimal::Decimal;
use tracing::warn;

use waveline_core::{CurrencyCode, Money};

use crate::rates::RateTable;

/// Converter borrowing an immutable rate snapshot.
///
/// Missing rates fail OPEN: the input amount comes back unchanged so a
/// gap in the secondary-currency configuration degrades to "no conversion"
/// instead of blocking the caller. Every fail-open return is logged at
/// warning level, because an unconverted amount silently equates two
/// different currencies in any aggregate built on top of it.
#[derive(Debug, Clone, Copy)]
pub struct CurrencyConverter<'a> {
    table: &'a RateTable,
}

impl<'a> CurrencyConverter<'a> {
    pub fn new(table: &'a RateTable) -> Self {
        Self { table }
    }

    /// Convert `amount` from one currency to another.
    ///
    /// - same currency: identity
    /// - CFA -> X: divide by `rate_to_cfa(X)`
    /// - X -> CFA: multiply by `rate_to_cfa(X)`
    /// - X -> Y: two hops through CFA
    pub fn convert(&self, amount: Decimal, from: &CurrencyCode, to: &CurrencyCode) -> Decimal {
        if from == to {
            return amount;
        }

        let (Some(from_rate), Some(to_rate)) =
            (self.table.rate_to_cfa(from), self.table.rate_to_cfa(to))
        else {
            warn!(
                from = %from,
                to = %to,
                "missing rate; returning amount unconverted"
            );
            return amount;
        };

        // X -> CFA -> Y in one expression; either leg may be the identity.
        amount * from_rate / to_rate
    }

    /// Convert a tagged amount into `target`, keeping the tag honest.
    pub fn convert_money(&self, money: &Money, target: &CurrencyCode) -> Money {
        Money::new(
            self.convert(money.amount, &money.currency, target),
            target.clone(),
        )
    }

    /// Difference `left - right` expressed in `target`.
    ///
    /// Margin/debt/profit figures always convert both operands into the
    /// same target before subtracting; subtracting across currencies is
    /// never meaningful.
    pub fn difference_in(&self, left: &Money, right: &Money, target: &CurrencyCode) -> Money {
        let l = self.convert(left.amount, &left.currency, target);
        let r = self.convert(right.amount, &right.currency, target);
        Money::new(l - r, target.clone())
    }
}
