//! `waveline-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the money/currency value objects, and the error
//! taxonomy shared by every back-office module.

pub mod account;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use account::Account;
pub use entity::Entity;
pub use error::{DomainError, DomainResult, SettlementReason};
pub use id::{AccountId, ConvoyId, CostId, OrderId, ParcelId, WaveId};
pub use money::{CurrencyCode, Money, round2};
pub use value_object::ValueObject;
