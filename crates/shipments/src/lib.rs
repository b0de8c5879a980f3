//! Shipment entities and their status lifecycles.
//!
//! Four machines share one engine: each status enum implements
//! [`Lifecycle`] and supplies its transition table, so the table is the
//! single source of truth and exhaustive matches replace runtime
//! "unknown status" branches. Business rules for closure and delivery
//! gating live next to the entity they protect, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod convoy;
pub mod lifecycle;
pub mod order;
pub mod parcel;
pub mod shipment;
pub mod wave;

pub use convoy::{Convoy, ConvoyStatus};
pub use lifecycle::Lifecycle;
pub use order::{Order, OrderStatus};
pub use parcel::{Parcel, ParcelStatus};
pub use shipment::{ChildRef, ChildState, PickupDetails};
pub use wave::{Wave, WaveStatus};
