//! Secondary-currency rate table snapshot.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use waveline_core::{CurrencyCode, DomainError, DomainResult};

/// One configured secondary currency: 1 unit of `code` = `rate_to_cfa` CFA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateEntry {
    pub code: CurrencyCode,
    pub rate_to_cfa: Decimal,
}

/// Immutable snapshot of the secondary-currency table.
///
/// CFA is the implicit reference with rate 1 and is never stored. Entities
/// never cache rates; lookups happen at conversion time against whatever
/// snapshot the caller injected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    rates: HashMap<CurrencyCode, Decimal>,
}

impl RateTable {
    /// Build a snapshot from configured entries.
    ///
    /// Rejects non-positive rates and any explicit CFA entry that is not 1
    /// (the reference rate is not configurable).
    pub fn from_rates(entries: impl IntoIterator<Item = RateEntry>) -> DomainResult<Self> {
        let mut rates = HashMap::new();
        for entry in entries {
            if entry.code.is_reference() {
                if entry.rate_to_cfa != Decimal::ONE {
                    return Err(DomainError::validation(
                        "rate_to_cfa",
                        "the CFA reference rate is fixed at 1",
                    ));
                }
                continue;
            }
            if entry.rate_to_cfa <= Decimal::ZERO {
                return Err(DomainError::validation(
                    "rate_to_cfa",
                    format!("rate for {} must be positive", entry.code),
                ));
            }
            rates.insert(entry.code, entry.rate_to_cfa);
        }
        Ok(Self { rates })
    }

    /// Rate of `code` against CFA, if configured. CFA itself is always 1.
    pub fn rate_to_cfa(&self, code: &CurrencyCode) -> Option<Decimal> {
        if code.is_reference() {
            return Some(Decimal::ONE);
        }
        self.rates.get(code).copied()
    }

    pub fn is_configured(&self, code: &CurrencyCode) -> bool {
        self.rate_to_cfa(code).is_some()
    }

    pub fn codes(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.rates.keys()
    }
}
