//! Express parcels: a single shipped item fulfilled via a Trip.
//!
//! The Express flow is the strict sibling of the Business order flow: the
//! pickup action has no debt override, so a parcel simply cannot reach
//! `delivered` until its balance is settled.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use waveline_core::{ConvoyId, CurrencyCode, DomainError, DomainResult, Entity, ParcelId, WaveId, round2};

use crate::convoy::Convoy;
use crate::lifecycle::Lifecycle;
use crate::shipment::PickupDetails;

/// Express-parcel status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    Registered,
    ReadyForDeparture,
    Loaded,
    InTransit,
    Arrived,
    ReadyForPickup,
    Delivered,
    Cancelled,
}

impl Lifecycle for ParcelStatus {
    const ENTITY: &'static str = "parcel";

    fn successors(self) -> &'static [Self] {
        match self {
            ParcelStatus::Registered => {
                &[ParcelStatus::ReadyForDeparture, ParcelStatus::Cancelled]
            }
            ParcelStatus::ReadyForDeparture => &[ParcelStatus::Loaded],
            ParcelStatus::Loaded => &[ParcelStatus::InTransit],
            ParcelStatus::InTransit => &[ParcelStatus::Arrived],
            ParcelStatus::Arrived => &[ParcelStatus::ReadyForPickup],
            ParcelStatus::ReadyForPickup => &[ParcelStatus::Delivered],
            ParcelStatus::Delivered | ParcelStatus::Cancelled => &[],
        }
    }

    fn wire_name(self) -> &'static str {
        match self {
            ParcelStatus::Registered => "registered",
            ParcelStatus::ReadyForDeparture => "ready_for_departure",
            ParcelStatus::Loaded => "loaded",
            ParcelStatus::InTransit => "in_transit",
            ParcelStatus::Arrived => "arrived",
            ParcelStatus::ReadyForPickup => "ready_for_pickup",
            ParcelStatus::Delivered => "delivered",
            ParcelStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// An Express-module shipped item, belonging to exactly one Trip and its
/// Wave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    pub id: ParcelId,
    pub trip_id: ConvoyId,
    pub wave_id: WaveId,
    pub status: ParcelStatus,
    pub currency: CurrencyCode,
    /// Computed upstream (weight x rate); stored, not derived here.
    pub total_amount: Decimal,
    pub total_paid: Decimal,
    pub pickup: Option<PickupDetails>,
}

impl Entity for Parcel {
    type Id = ParcelId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Parcel {
    pub fn has_debt(&self) -> bool {
        self.total_paid < self.total_amount
    }

    pub fn remaining_debt(&self) -> Decimal {
        round2((self.total_amount - self.total_paid).max(Decimal::ZERO))
    }

    /// Parcels may be edited or deleted only while still registered.
    pub fn is_editable(&self) -> bool {
        matches!(self.status, ParcelStatus::Registered)
    }

    pub fn ensure_editable(&self) -> DomainResult<()> {
        if self.is_editable() {
            Ok(())
        } else {
            Err(DomainError::validation(
                "status",
                format!("parcel is {} and can no longer be edited", self.status),
            ))
        }
    }

    /// The denormalized `wave_id` must agree with the parent trip's wave.
    pub fn ensure_consistent_parent(&self, trip: &Convoy) -> DomainResult<()> {
        if self.trip_id != trip.id {
            return Err(DomainError::validation(
                "trip_id",
                "parcel does not belong to this trip",
            ));
        }
        if self.wave_id != trip.wave_id {
            return Err(DomainError::validation(
                "wave_id",
                "parcel wave does not match its trip's wave",
            ));
        }
        Ok(())
    }

    pub fn ensure_transition(&self, to: ParcelStatus) -> DomainResult<()> {
        self.status.ensure_transition(to)
    }

    pub fn transition(&mut self, to: ParcelStatus) -> DomainResult<()> {
        self.ensure_transition(to)?;
        self.status = to;
        Ok(())
    }

    /// Deliver (the pickup action) with the settled paid total and
    /// receiver metadata. No override exists on this path; callers reach
    /// here only with an accepted settlement.
    pub fn mark_delivered(
        &mut self,
        new_total_paid: Decimal,
        details: PickupDetails,
    ) -> DomainResult<()> {
        self.ensure_transition(ParcelStatus::Delivered)?;
        self.status = ParcelStatus::Delivered;
        self.total_paid = round2(new_total_paid.min(self.total_amount));
        self.pickup = Some(details);
        Ok(())
    }
}
