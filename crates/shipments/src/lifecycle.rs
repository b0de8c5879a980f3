//! The parameterized status lifecycle engine.

use waveline_core::{DomainError, DomainResult};

/// A status enum with a declared transition table.
///
/// Implementors list the legal successor statuses per state; everything
/// else — legality checks, terminality, the structured
/// [`DomainError::InvalidTransition`] — derives from the table.
pub trait Lifecycle: Copy + Eq + core::fmt::Debug + 'static {
    /// Entity kind name used in error reporting (`"order"`, `"wave"`...).
    const ENTITY: &'static str;

    /// Legal direct successors of this status.
    fn successors(self) -> &'static [Self];

    /// Wire name of the status (`snake_case`, matching serde).
    fn wire_name(self) -> &'static str;

    /// A status with no successors is terminal.
    fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    fn can_transition(self, to: Self) -> bool {
        self.successors().contains(&to)
    }

    /// Check a single edge, with the offending edge in the error.
    fn ensure_transition(self, to: Self) -> DomainResult<()> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(DomainError::invalid_transition(
                Self::ENTITY,
                self.wire_name(),
                to.wire_name(),
            ))
        }
    }
}
