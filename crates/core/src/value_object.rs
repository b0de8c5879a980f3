//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared entirely by their attribute
/// values: `Money { 100, CFA }` equals any other `Money { 100, CFA }`,
/// whereas two Orders with the same fields but different ids are distinct
/// entities. To "modify" a value object, construct a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
