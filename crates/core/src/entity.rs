//! Entity trait: things identified by a stable key rather than by their values.

/// Entity marker + minimal interface.
///
/// Screens are entities: a screen keeps its identity even when its label or
/// supported actions change between registry deployments.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
