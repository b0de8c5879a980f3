//! Payment/debt reconciliation.
//!
//! Validates a split-payment batch against an entity's outstanding balance
//! and decides whether a pickup/delivery action may proceed. Pure
//! computation: account-state checks (active, currency-compatible,
//! distinct) are the caller's job before submission.

pub mod reconcile;

pub use reconcile::{PaymentLine, PaymentReconciler, SettlementOutcome, TolerancePolicy};
