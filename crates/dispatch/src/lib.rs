//! Orchestration of back-office actions over collaborator ports.
//!
//! A UI action ("confirm pickup", "close convoy") gathers its inputs,
//! and the dispatcher runs the full gate: payment-line validation against
//! accounts, the reconciler, the lifecycle check, then the backend
//! mutation. The backend is the system of record; it owns optimistic
//! concurrency and its `ConcurrentModification` rejections are surfaced
//! verbatim. Retrying an action against an entity already in the target
//! status is a no-op success.

pub mod ops;
pub mod ports;

pub use ops::{DeliveryRequest, Dispatcher, PickupRequest};
pub use ports::{AccountDirectory, RateSource, ShipmentBackend};
