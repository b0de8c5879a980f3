//! Convoys/Trips: one journey within a Wave, carrying orders or parcels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use waveline_core::{ConvoyId, DomainError, DomainResult, Entity, WaveId};

use crate::lifecycle::Lifecycle;
use crate::shipment::{ChildRef, ChildState};

/// Convoy/Trip status lifecycle. The Business module's upstream
/// pending/confirmed phase is expressed through the convoy's Orders, not
/// as extra convoy states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvoyStatus {
    Planned,
    InTransit,
    Arrived,
    Closed,
}

impl Lifecycle for ConvoyStatus {
    const ENTITY: &'static str = "convoy";

    fn successors(self) -> &'static [Self] {
        match self {
            ConvoyStatus::Planned => &[ConvoyStatus::InTransit],
            ConvoyStatus::InTransit => &[ConvoyStatus::Arrived],
            ConvoyStatus::Arrived => &[ConvoyStatus::Closed],
            ConvoyStatus::Closed => &[],
        }
    }

    fn wire_name(self) -> &'static str {
        match self {
            ConvoyStatus::Planned => "planned",
            ConvoyStatus::InTransit => "in_transit",
            ConvoyStatus::Arrived => "arrived",
            ConvoyStatus::Closed => "closed",
        }
    }
}

impl core::fmt::Display for ConvoyStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A single journey. Belongs to exactly one Wave; the Wave outlives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Convoy {
    pub id: ConvoyId,
    pub wave_id: WaveId,
    pub status: ConvoyStatus,
    pub end_date: Option<DateTime<Utc>>,
}

impl Entity for Convoy {
    type Id = ConvoyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Convoy {
    pub fn ensure_transition(&self, to: ConvoyStatus) -> DomainResult<()> {
        self.status.ensure_transition(to)
    }

    pub fn transition(&mut self, to: ConvoyStatus) -> DomainResult<()> {
        self.ensure_transition(to)?;
        self.status = to;
        Ok(())
    }

    /// Closure precondition: at least one child, none still in transit,
    /// every child settled (delivered or cancelled), and at least one
    /// valid cost recorded against the journey.
    ///
    /// Blocking children are listed by id so the caller can present them.
    pub fn ensure_closable(&self, children: &[ChildRef], has_valid_cost: bool) -> DomainResult<()> {
        self.ensure_transition(ConvoyStatus::Closed)?;

        if children.is_empty() {
            return Err(DomainError::precondition(
                "convoy has no shipments to close over",
                Vec::new(),
            ));
        }

        let in_transit: Vec<Uuid> = children
            .iter()
            .filter(|c| c.state == ChildState::InTransit)
            .map(|c| c.id)
            .collect();
        if !in_transit.is_empty() {
            return Err(DomainError::precondition(
                "shipments still in transit",
                in_transit,
            ));
        }

        let unsettled: Vec<Uuid> = children
            .iter()
            .filter(|c| !c.state.is_settled())
            .map(|c| c.id)
            .collect();
        if !unsettled.is_empty() {
            return Err(DomainError::precondition(
                "shipments not yet delivered or cancelled",
                unsettled,
            ));
        }

        if !has_valid_cost {
            return Err(DomainError::precondition(
                "no valid cost recorded against the convoy",
                Vec::new(),
            ));
        }

        Ok(())
    }

    /// Close after a successful [`Convoy::ensure_closable`], stamping the
    /// end date.
    pub fn close(
        &mut self,
        children: &[ChildRef],
        has_valid_cost: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_closable(children, has_valid_cost)?;
        self.status = ConvoyStatus::Closed;
        self.end_date = Some(now);
        Ok(())
    }
}
