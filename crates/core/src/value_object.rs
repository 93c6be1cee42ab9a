//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. Two grant flag
/// records with the same five booleans are interchangeable no matter which
/// user or screen they were read for.
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// struct Flags {
///     view: bool,
///     edit: bool,
/// }
///
/// impl ValueObject for Flags {}
///
/// assert_eq!(Flags { view: true, edit: false }, Flags { view: true, edit: false });
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
