//! Business orders: a sale of purchased products fulfilled via a Convoy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use waveline_core::{ConvoyId, CurrencyCode, DomainError, DomainResult, Entity, OrderId, WaveId, round2};

use crate::convoy::Convoy;
use crate::lifecycle::Lifecycle;
use crate::shipment::PickupDetails;

/// Business-order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    InTransit,
    Arrived,
    ReadyForPickup,
    Delivered,
    Cancelled,
}

impl Lifecycle for OrderStatus {
    const ENTITY: &'static str = "order";

    fn successors(self) -> &'static [Self] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::InTransit, OrderStatus::Cancelled],
            OrderStatus::InTransit => &[OrderStatus::Arrived],
            OrderStatus::Arrived => &[OrderStatus::ReadyForPickup],
            OrderStatus::ReadyForPickup => &[OrderStatus::Delivered],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    fn wire_name(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::Arrived => "arrived",
            OrderStatus::ReadyForPickup => "ready_for_pickup",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A Business-module sale, belonging to exactly one Convoy and (denormalized
/// for query convenience) that Convoy's Wave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub convoy_id: ConvoyId,
    pub wave_id: WaveId,
    pub status: OrderStatus,
    pub currency: CurrencyCode,
    /// Computed upstream from line items; stored, not derived here.
    pub total_amount: Decimal,
    pub total_paid: Decimal,
    pub pickup: Option<PickupDetails>,
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Order {
    /// Derived: true while the paid total has not reached the amount due.
    pub fn has_debt(&self) -> bool {
        self.total_paid < self.total_amount
    }

    pub fn remaining_debt(&self) -> Decimal {
        round2((self.total_amount - self.total_paid).max(Decimal::ZERO))
    }

    /// Orders may be edited or deleted only before they start moving.
    pub fn is_editable(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    pub fn ensure_editable(&self) -> DomainResult<()> {
        if self.is_editable() {
            Ok(())
        } else {
            Err(DomainError::validation(
                "status",
                format!("order is {} and can no longer be edited", self.status),
            ))
        }
    }

    /// The denormalized `wave_id` exists for query convenience only and
    /// must agree with the parent convoy's wave.
    pub fn ensure_consistent_parent(&self, convoy: &Convoy) -> DomainResult<()> {
        if self.convoy_id != convoy.id {
            return Err(DomainError::validation(
                "convoy_id",
                "order does not belong to this convoy",
            ));
        }
        if self.wave_id != convoy.wave_id {
            return Err(DomainError::validation(
                "wave_id",
                "order wave does not match its convoy's wave",
            ));
        }
        Ok(())
    }

    pub fn ensure_transition(&self, to: OrderStatus) -> DomainResult<()> {
        self.status.ensure_transition(to)
    }

    /// Apply a checked transition.
    pub fn transition(&mut self, to: OrderStatus) -> DomainResult<()> {
        self.ensure_transition(to)?;
        self.status = to;
        Ok(())
    }

    /// Deliver with the settled paid total and receiver metadata.
    ///
    /// `new_total_paid` comes from an accepted settlement — or, when the
    /// caller overrode the debt gate, from crediting the tendered batch
    /// unconditionally. Either way it is clamped to the amount due.
    pub fn mark_delivered(
        &mut self,
        new_total_paid: Decimal,
        details: PickupDetails,
    ) -> DomainResult<()> {
        self.ensure_transition(OrderStatus::Delivered)?;
        self.status = OrderStatus::Delivered;
        self.total_paid = round2(new_total_paid.min(self.total_amount));
        self.pickup = Some(details);
        Ok(())
    }

    /// The single post-delivery move left to an order delivered with
    /// residual debt (override path): settle the remainder in full.
    pub fn confirm_remaining_payment(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::Delivered {
            return Err(DomainError::invalid_transition(
                OrderStatus::ENTITY,
                self.status.wire_name(),
                "confirm_remaining_payment",
            ));
        }
        if !self.has_debt() {
            return Err(DomainError::validation(
                "total_paid",
                "order has no remaining debt to confirm",
            ));
        }
        self.total_paid = self.total_amount;
        Ok(())
    }
}
