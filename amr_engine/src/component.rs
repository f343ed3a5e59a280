//! A tentative connected component inside one block: its current believed
//! global root, and the bookkeeping the round coordinator needs to decide
//! who still needs to hear from it. Grounded on `ConnectedComponent` in
//! `examples/original_source/examples/amr-connected-components/include/fab-cc-block.h`,
//! minus the deprecated dual `set`/`vector` edge representation (spec.md §9)
//! and the dead `debug` parameter of `init_current_neighbors` (also §9).
use fxhash::FxHashSet;

use amr_core::{AmrEdge, AmrVertexId, Value};

/// A local connected component, tracked through the round protocol.
#[derive(Clone, Debug)]
pub struct Component<V: Value> {
    /// The deepest vertex of this block's local sub-forest for this
    /// component. Immutable for the component's whole lifetime — it is the
    /// component's identity, also its gid's entry in the forest.
    pub original_deepest: AmrVertexId,
    /// The current best-known root of the global component this one has
    /// merged into, updated every round from the disjoint-set forest.
    pub global_deepest: AmrVertexId,
    pub global_value: V,
    /// Remote gids this component currently believes it must still hear
    /// from or has heard from, derived from `outgoing_edges`.
    pub current_neighbors: FxHashSet<i32>,
    /// Subset of `current_neighbors` this component has already sent its
    /// state to this round.
    pub processed_neighbors: FxHashSet<i32>,
    /// Cross-boundary edges rooted in this component's local sub-forest,
    /// bucketed implicitly by remote gid (via [`Self::edges_to`]) rather
    /// than in a second physically-bucketed map — the "only the
    /// per-neighbour-gid bucketed form" spec.md §9 calls for.
    pub outgoing_edges: Vec<AmrEdge>,
}

impl<V: Value> Component<V> {
    /// A fresh component rooted at `deepest`, with no known neighbours yet
    /// — call [`Self::recompute_current_neighbors`] once `outgoing_edges`
    /// is populated.
    pub fn new(deepest: AmrVertexId, value: V) -> Self {
        Component {
            original_deepest: deepest,
            global_deepest: deepest,
            global_value: value,
            current_neighbors: FxHashSet::default(),
            processed_neighbors: FxHashSet::default(),
            outgoing_edges: Vec::new(),
        }
    }

    fn local_gid(&self) -> i32 {
        self.original_deepest.gid
    }

    /// Recomputes `current_neighbors` from `outgoing_edges` — called once
    /// after the component's initial edges are assigned, and again after
    /// the round coordinator trims stale edges.
    pub fn recompute_current_neighbors(&mut self) {
        self.current_neighbors = self
            .outgoing_edges
            .iter()
            .filter_map(|e| e.remote_of(self.local_gid()).map(|v| v.gid))
            .collect();
    }

    /// The subset of `outgoing_edges` terminating in `gid` — what gets
    /// transmitted in one "send" step to that neighbour.
    pub fn edges_to(&self, gid: i32) -> Vec<AmrEdge> {
        self.outgoing_edges
            .iter()
            .copied()
            .filter(|e| e.remote_of(self.local_gid()).map(|v| v.gid) == Some(gid))
            .collect()
    }

    /// Whether this component still owes a message to `gid`.
    pub fn must_send_to(&self, gid: i32) -> bool {
        self.current_neighbors.contains(&gid) && !self.processed_neighbors.contains(&gid)
    }

    /// A component is done when it has processed every neighbour it
    /// currently believes it has.
    pub fn is_done(&self) -> bool {
        debug_assert!(
            self.processed_neighbors.is_subset(&self.current_neighbors),
            "processed_neighbors must stay a subset of current_neighbors"
        );
        self.current_neighbors.len() == self.processed_neighbors.len()
    }

    /// gids this component still owes a message to this round.
    pub fn pending_neighbors(&self) -> Vec<i32> {
        self.current_neighbors
            .difference(&self.processed_neighbors)
            .copied()
            .collect()
    }
}
