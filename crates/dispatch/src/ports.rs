//! Collaborator seams.
//!
//! The core treats every external dependency as a synchronous interface;
//! any asynchrony (HTTP to the REST backend, settings fetches) lives
//! behind these traits in the excluded I/O layer.

use waveline_core::{Account, AccountId, DomainResult};
use waveline_costs::Cost;
use waveline_currency::RateTable;
use waveline_settlement::PaymentLine;
use waveline_shipments::{Convoy, Order, Parcel, Wave};

/// Settings store for the secondary-currency table. Callers take a fresh
/// snapshot before a conversion-heavy operation; staleness between
/// snapshots is their concern.
pub trait RateSource {
    fn rates(&self) -> DomainResult<RateTable>;
}

/// Lookup of funding/receiving accounts for payment and cost validation.
pub trait AccountDirectory {
    fn find_account(&self, id: AccountId) -> Option<Account>;
}

/// The persistence backend (REST, in tests an in-memory fake).
///
/// The backend applies optimistic concurrency: if an entity's status
/// changed since it was read, it rejects with
/// [`waveline_core::DomainError::ConcurrentModification`], which the
/// dispatcher passes through untouched so the caller can refetch and
/// retry.
pub trait ShipmentBackend {
    /// Persist an order's new status/paid total plus the payment batch.
    fn submit_order(&mut self, order: &Order, payments: &[PaymentLine]) -> DomainResult<()>;

    /// Persist a parcel's new status/paid total plus the payment batch.
    fn submit_parcel(&mut self, parcel: &Parcel, payments: &[PaymentLine]) -> DomainResult<()>;

    /// Persist a convoy closure together with its cost batch.
    fn submit_convoy_closure(&mut self, convoy: &Convoy, costs: &[Cost]) -> DomainResult<()>;

    /// Persist a wave closure.
    fn submit_wave_closure(&mut self, wave: &Wave) -> DomainResult<()>;
}
