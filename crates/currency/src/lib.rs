//! Multi-currency conversion against the CFA reference.
//!
//! All rates are expressed as "1 unit of X = `rate_to_cfa` CFA". The
//! converter pivots every conversion through CFA, so there is exactly one
//! path between any two currencies and no third path can diverge.
//!
//! The rate table is an immutable snapshot taken by the caller (from the
//! settings store) before invoking conversion; refresh policy is the
//! caller's concern, not this crate's.

pub mod convert;
pub mod rates;

pub use convert::CurrencyConverter;
pub use rates::{RateEntry, RateTable};
