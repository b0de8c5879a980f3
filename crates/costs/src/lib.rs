//! Ad-hoc operating costs recorded against a Convoy/Trip or Wave.
//!
//! Costs feed two things: the closure precondition (a journey cannot close
//! without at least one valid, funded cost) and profitability reporting
//! (revenue minus costs, both explicitly converted into one reporting
//! currency).

pub mod ledger;
pub mod profit;

pub use ledger::{Cost, CostKind, CostLedger, CostSummary};
pub use profit::{ProfitReport, profitability};
