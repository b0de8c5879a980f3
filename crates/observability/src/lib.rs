//! Tracing/logging setup shared by every waveline binary.
//!
//! The core's one deliberate soft failure — the currency converter
//! returning an amount unconverted when a rate is missing — is only
//! visible through warn-level logs, so initializing this early matters.

/// Initialize process-wide observability (tracing/logging).
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;
