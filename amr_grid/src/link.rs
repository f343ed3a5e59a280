use crate::BoxBounds;

/// A single neighbouring block, as the partitioning framework describes it
/// to a block under construction: its identity, level and box. Same-level
/// neighbours share `level`; finer neighbours (the ones that can `COVER` a
/// ghost cell) have a strictly larger `level`.
#[derive(Clone, Debug)]
pub struct NeighborLink {
    pub gid: i32,
    pub level: i32,
    pub bounds: BoxBounds,
}

/// What the block-partitioning/link framework supplies for one block: its
/// `gid`, `core` and ghosted `bounds`, refinement level and ratio, and the
/// list of neighbours needed to build its `MaskedBox` and initial
/// cross-boundary edges.
#[derive(Clone, Debug)]
pub struct PartitionLink {
    pub gid: i32,
    pub level: i32,
    pub refinement_ratio: i32,
    pub core: BoxBounds,
    pub bounds: BoxBounds,
    pub neighbors: Vec<NeighborLink>,
}

impl PartitionLink {
    /// Same-level neighbours only.
    pub fn same_level_neighbors(&self) -> impl Iterator<Item = &NeighborLink> {
        self.neighbors.iter().filter(move |n| n.level == self.level)
    }

    /// Finer-level neighbours only (candidates to `COVER` a ghost cell).
    pub fn finer_neighbors(&self) -> impl Iterator<Item = &NeighborLink> {
        self.neighbors.iter().filter(move |n| n.level > self.level)
    }

    pub fn neighbor(&self, gid: i32) -> Option<&NeighborLink> {
        self.neighbors.iter().find(|n| n.gid == gid)
    }

    /// All remote gids this block is linked to, the set a
    /// `MaskConsistencyError` checks a ghost cell's covering gid against.
    pub fn neighbor_gids(&self) -> impl Iterator<Item = i32> + '_ {
        self.neighbors.iter().map(|n| n.gid)
    }
}
