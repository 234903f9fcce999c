//! Entity trait: records that keep their identity across reads.

/// A persisted record with a stable, unique identifier.
///
/// Stores key their records by `Entity::id`, and list results are ordered by it.
pub trait Entity {
    type Id: Copy + Ord + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
