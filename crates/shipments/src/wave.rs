//! Waves: top-level grouping of journeys within a time window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use waveline_core::{DomainError, DomainResult, Entity, WaveId};

use crate::convoy::Convoy;
use crate::lifecycle::Lifecycle;

/// Wave status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveStatus {
    Draft,
    Open,
    Closed,
}

impl Lifecycle for WaveStatus {
    const ENTITY: &'static str = "wave";

    fn successors(self) -> &'static [Self] {
        match self {
            WaveStatus::Draft => &[WaveStatus::Open],
            WaveStatus::Open => &[WaveStatus::Closed],
            WaveStatus::Closed => &[],
        }
    }

    fn wire_name(self) -> &'static str {
        match self {
            WaveStatus::Draft => "draft",
            WaveStatus::Open => "open",
            WaveStatus::Closed => "closed",
        }
    }
}

impl core::fmt::Display for WaveStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Top-level grouping of Convoys/Trips. Owns its convoys: a Convoy cannot
/// outlive its Wave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    pub id: WaveId,
    pub status: WaveStatus,
    pub start_date: DateTime<Utc>,
    /// Set automatically at closure.
    pub end_date: Option<DateTime<Utc>>,
}

impl Entity for Wave {
    type Id = WaveId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Wave {
    pub fn ensure_transition(&self, to: WaveStatus) -> DomainResult<()> {
        self.status.ensure_transition(to)
    }

    pub fn transition(&mut self, to: WaveStatus) -> DomainResult<()> {
        self.ensure_transition(to)?;
        self.status = to;
        Ok(())
    }

    /// Closure precondition (strict variant): at least one convoy, all of
    /// them closed.
    pub fn ensure_closable(&self, convoys: &[Convoy]) -> DomainResult<()> {
        self.ensure_transition(WaveStatus::Closed)?;

        if convoys.is_empty() {
            return Err(DomainError::precondition(
                "wave has no convoys to close over",
                Vec::new(),
            ));
        }

        let open: Vec<Uuid> = convoys
            .iter()
            .filter(|c| c.status != crate::convoy::ConvoyStatus::Closed)
            .map(|c| (*c.id.as_uuid()))
            .collect();
        if !open.is_empty() {
            return Err(DomainError::precondition("convoys not yet closed", open));
        }

        Ok(())
    }

    /// Close after a successful [`Wave::ensure_closable`], stamping the
    /// end date.
    pub fn close(&mut self, convoys: &[Convoy], now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_closable(convoys)?;
        self.status = WaveStatus::Closed;
        self.end_date = Some(now);
        Ok(())
    }
}
