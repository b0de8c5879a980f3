//! Domain error model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Why a split-payment batch was refused by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementReason {
    /// Outstanding debt exists and the batch is empty or non-positive.
    PaymentsRequired,
    /// The batch does not reach the outstanding balance (minus tolerance).
    InsufficientPayment,
    /// The batch leaves a residual above tolerance after application.
    IncompleteClearance,
}

impl core::fmt::Display for SettlementReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            SettlementReason::PaymentsRequired => "payments_required",
            SettlementReason::InsufficientPayment => "insufficient_payment",
            SettlementReason::IncompleteClearance => "incomplete_clearance",
        };
        f.write_str(s)
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic business failures (validation,
/// illegal transitions, blocked closures). Infrastructure concerns belong
/// elsewhere; the one exception is [`DomainError::ConcurrentModification`],
/// which the backend collaborator reports and the core surfaces verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A field failed validation (e.g. empty label, non-positive amount).
    #[error("validation failed on `{field}`: {message}")]
    Validation { field: String, message: String },

    /// A status edge is not part of the entity's lifecycle. Not retryable
    /// without changing the request.
    #[error("illegal {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// A closure precondition failed. Recoverable by resolving the
    /// blocking children, listed by id.
    #[error("precondition not met: {reason}")]
    PreconditionNotMet {
        reason: String,
        blocking_children: Vec<Uuid>,
    },

    /// The reconciler refused a payment batch. Recoverable by adjusting
    /// the proposed amounts; `remaining_debt` is the gap left to clear.
    #[error("settlement rejected: {reason} (remaining debt {remaining_debt})")]
    SettlementRejected {
        reason: SettlementReason,
        remaining_debt: Decimal,
    },

    /// The backend detected a stale read (status changed since fetch).
    /// Recoverable by refetching and retrying.
    #[error("concurrent modification of {entity} {id}")]
    ConcurrentModification { entity: &'static str, id: Uuid },

    /// A referenced resource (account, rate table entry) could not be
    /// resolved at the domain level.
    #[error("not found: {0}")]
    NotFound(String),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_transition(
        entity: &'static str,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::InvalidTransition {
            entity,
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn precondition(reason: impl Into<String>, blocking_children: Vec<Uuid>) -> Self {
        Self::PreconditionNotMet {
            reason: reason.into(),
            blocking_children,
        }
    }

    pub fn settlement(reason: SettlementReason, remaining_debt: Decimal) -> Self {
        Self::SettlementRejected {
            reason,
            remaining_debt,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
