//! Cost records, validation, and per-currency aggregation.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use waveline_core::{Account, AccountId, CostId, CurrencyCode, DomainError, DomainResult, Money};
use waveline_currency::CurrencyConverter;

/// Category of an operating expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostKind {
    Transport,
    Customs,
    Handling,
    Storage,
    Other,
}

/// One operating expense, funded from an account. Creation is restricted
/// to authorized roles by the capability check outside the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cost {
    /// Present when updating an existing record (closure upserts by id).
    pub id: Option<CostId>,
    pub kind: CostKind,
    pub label: String,
    pub amount: Money,
    pub account_id: AccountId,
    pub notes: Option<String>,
}

impl Cost {
    /// A valid cost has a label, a positive amount, and a resolvable
    /// active funding account in the same currency.
    pub fn validate(&self, account: Option<&Account>) -> DomainResult<()> {
        if self.label.trim().is_empty() {
            return Err(DomainError::validation("label", "label must not be empty"));
        }
        if !self.amount.is_positive() {
            return Err(DomainError::validation(
                "amount",
                "amount must be positive",
            ));
        }
        let account = account.ok_or_else(|| {
            DomainError::not_found(format!("account {}", self.account_id))
        })?;
        if !account.is_active {
            return Err(DomainError::validation(
                "account_id",
                format!("account {} is inactive", account.id),
            ));
        }
        if account.currency != self.amount.currency {
            return Err(DomainError::validation(
                "account_id",
                format!(
                    "account currency {} does not match cost currency {}",
                    account.currency, self.amount.currency
                ),
            ));
        }
        Ok(())
    }
}

/// Per-currency totals of a cost collection.
///
/// No implicit conversion: each currency keeps its own bucket. A caller
/// wanting one number calls [`CostSummary::total_in`], which converts each
/// bucket explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostSummary {
    pub by_currency: HashMap<CurrencyCode, Decimal>,
}

impl CostSummary {
    pub fn total_in(&self, target: &CurrencyCode, converter: &CurrencyConverter<'_>) -> Decimal {
        self.by_currency
            .iter()
            .map(|(code, amount)| converter.convert(*amount, code, target))
            .sum()
    }
}

/// Costs recorded against one Convoy/Trip or Wave.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostLedger {
    costs: Vec<Cost>,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn costs(&self) -> &[Cost] {
        &self.costs
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    /// Record a cost after validating it against its funding account.
    ///
    /// Upserts by id when the cost carries one (the closure flow re-submits
    /// edited batches), otherwise assigns a fresh id and inserts.
    pub fn record(&mut self, mut cost: Cost, account: Option<&Account>) -> DomainResult<&Cost> {
        cost.validate(account)?;

        let idx = match cost.id {
            Some(id) => match self.costs.iter().position(|c| c.id == Some(id)) {
                Some(i) => {
                    self.costs[i] = cost;
                    i
                }
                None => {
                    self.costs.push(cost);
                    self.costs.len() - 1
                }
            },
            None => {
                cost.id = Some(CostId::new());
                self.costs.push(cost);
                self.costs.len() - 1
            }
        };
        Ok(&self.costs[idx])
    }

    /// True when at least one recorded cost passes validation against the
    /// current account state. This is the cost leg of the closure
    /// precondition.
    pub fn has_valid_cost(&self, resolve_account: impl Fn(AccountId) -> Option<Account>) -> bool {
        self.costs
            .iter()
            .any(|c| c.validate(resolve_account(c.account_id).as_ref()).is_ok())
    }

    /// Sum per currency, no implicit conversion.
    pub fn aggregate(&self) -> CostSummary {
        let mut by_currency: HashMap<CurrencyCode, Decimal> = HashMap::new();
        for cost in &self.costs {
            *by_currency
                .entry(cost.amount.currency.clone())
                .or_default() += cost.amount.amount;
        }
        CostSummary { by_currency }
    }
}
