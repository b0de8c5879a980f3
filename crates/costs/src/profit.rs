//! Profitability: revenue minus costs in one reporting currency.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use waveline_core::{CurrencyCode, Money, round2};
use waveline_currency::CurrencyConverter;

use crate::ledger::CostLedger;

/// Profitability of a Convoy/Trip or Wave, expressed in a chosen
/// reporting currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitReport {
    pub currency: CurrencyCode,
    pub revenue: Decimal,
    pub costs: Decimal,
    pub margin: Decimal,
}

/// Aggregate child revenue and the cost ledger into `reporting`, then
/// subtract. Both operands go through the converter first; amounts in
/// different currencies are never subtracted directly.
pub fn profitability(
    revenues: &[Money],
    ledger: &CostLedger,
    reporting: &CurrencyCode,
    converter: &CurrencyConverter<'_>,
) -> ProfitReport {
    let revenue: Decimal = revenues
        .iter()
        .map(|m| converter.convert(m.amount, &m.currency, reporting))
        .sum();
    let costs = ledger.aggregate().total_in(reporting, converter);

    ProfitReport {
        currency: reporting.clone(),
        revenue: round2(revenue),
        costs: round2(costs),
        margin: round2(revenue - costs),
    }
}
