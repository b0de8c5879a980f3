//! Money and currency value objects.
//!
//! Amounts are `rust_decimal::Decimal` throughout — never binary floating
//! point — so debt comparisons do not need ad hoc epsilon dances beyond the
//! explicit business tolerance applied by the settlement layer.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Round to 2 decimal places, half away from zero.
///
/// All persisted monetary figures and all settlement comparisons go
/// through this before being compared or stored.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Currency code: the reference code `CFA` plus an open set of secondary
/// codes (e.g. `MAD`, `EUR`) configured with a rate against CFA.
///
/// Entities store only the code they were recorded in; conversion is always
/// derived at read time from the rate table, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// The reference (pivot) code all secondary rates are expressed against.
    pub const REFERENCE: &'static str = "CFA";

    /// Parse a code: non-empty, ASCII alphabetic, normalized to uppercase.
    pub fn new(code: impl AsRef<str>) -> DomainResult<Self> {
        let code = code.as_ref().trim();
        if code.is_empty() {
            return Err(DomainError::validation("currency", "code must not be empty"));
        }
        if !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::validation(
                "currency",
                format!("code `{code}` must be ASCII alphabetic"),
            ));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// The reference currency.
    pub fn cfa() -> Self {
        Self(Self::REFERENCE.to_string())
    }

    pub fn is_reference(&self) -> bool {
        self.0 == Self::REFERENCE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ValueObject for CurrencyCode {}

/// A monetary amount tagged with the currency it was recorded in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: CurrencyCode,
}

impl Money {
    pub fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Rounded to 2 decimal places (see [`round2`]).
    pub fn rounded(&self) -> Self {
        Self {
            amount: round2(self.amount),
            currency: self.currency.clone(),
        }
    }

    /// Add an amount in the same currency.
    ///
    /// Amounts in different currencies never mix implicitly; convert both
    /// operands to a common target first.
    pub fn checked_add(&self, other: &Money) -> DomainResult<Money> {
        if self.currency != other.currency {
            return Err(DomainError::validation(
                "currency",
                format!(
                    "cannot add {} to {} without converting",
                    other.currency, self.currency
                ),
            ));
        }
        Ok(Money::new(self.amount + other.amount, self.currency.clone()))
    }
}

impl ValueObject for Money {}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", round2(self.amount), self.currency)
    }
}
