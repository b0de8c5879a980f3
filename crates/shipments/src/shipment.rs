//! Types shared by both shipment units (Business orders, Express parcels)
//! and by the closure preconditions that inspect them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::order::OrderStatus;
use crate::parcel::ParcelStatus;

/// Receiver metadata captured at pickup/delivery time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupDetails {
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_id_number: String,
    pub note: Option<String>,
    pub picked_up_at: DateTime<Utc>,
}

/// Coarse child state as seen by a parent's closure precondition.
///
/// Orders and parcels have different lifecycles, but a Convoy/Trip only
/// cares whether each child is still moving, settled into a terminal
/// state, or somewhere in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildState {
    InTransit,
    Delivered,
    Cancelled,
    /// Any other non-terminal status.
    Pending,
}

impl ChildState {
    pub fn is_settled(self) -> bool {
        matches!(self, ChildState::Delivered | ChildState::Cancelled)
    }
}

impl From<OrderStatus> for ChildState {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::InTransit => ChildState::InTransit,
            OrderStatus::Delivered => ChildState::Delivered,
            OrderStatus::Cancelled => ChildState::Cancelled,
            OrderStatus::Pending
            | OrderStatus::Confirmed
            | OrderStatus::Arrived
            | OrderStatus::ReadyForPickup => ChildState::Pending,
        }
    }
}

impl From<ParcelStatus> for ChildState {
    fn from(status: ParcelStatus) -> Self {
        match status {
            ParcelStatus::InTransit => ChildState::InTransit,
            ParcelStatus::Delivered => ChildState::Delivered,
            ParcelStatus::Cancelled => ChildState::Cancelled,
            ParcelStatus::Registered
            | ParcelStatus::ReadyForDeparture
            | ParcelStatus::Loaded
            | ParcelStatus::Arrived
            | ParcelStatus::ReadyForPickup => ChildState::Pending,
        }
    }
}

/// Child reference handed to a parent's closure check: enough to decide
/// and to report blockers by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRef {
    pub id: Uuid,
    pub state: ChildState,
}

impl ChildRef {
    pub fn new(id: impl Into<Uuid>, state: impl Into<ChildState>) -> Self {
        Self {
            id: id.into(),
            state: state.into(),
        }
    }
}
