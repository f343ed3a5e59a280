//! Union-find over [`AmrVertexId`], the cross-block bookkeeping a round
//! coordinator uses to track which local components have already merged.
use fxhash::FxHashMap;

use amr_core::{AmrVertexId, DeepOrder, Value};

/// Standard union-find keyed by [`AmrVertexId`], with path compression.
/// `union`'s representative choice is the *deeper* of the two roots under a
/// fixed [`DeepOrder`] — never by subtree size, which is tracked only as an
/// informational hint.
pub struct DisjointSets<V: Value> {
    order: DeepOrder,
    parent: FxHashMap<AmrVertexId, AmrVertexId>,
    value: FxHashMap<AmrVertexId, V>,
    size: FxHashMap<AmrVertexId, usize>,
}

impl<V: Value> DisjointSets<V> {
    /// An empty forest under the given deepness order.
    pub fn new(order: DeepOrder) -> Self {
        DisjointSets {
            order,
            parent: FxHashMap::default(),
            value: FxHashMap::default(),
            size: FxHashMap::default(),
        }
    }

    pub fn order(&self) -> DeepOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn contains(&self, v: AmrVertexId) -> bool {
        self.parent.contains_key(&v)
    }

    /// Inserts `v` as its own representative with value `val`, if not
    /// already present. A no-op if `v` is already in the forest.
    pub fn make_set(&mut self, v: AmrVertexId, val: V) {
        if self.parent.contains_key(&v) {
            return;
        }
        self.parent.insert(v, v);
        self.value.insert(v, val);
        self.size.insert(v, 1);
    }

    /// The representative of `v`'s class, with two-pass path compression.
    /// `v` must already have been inserted via [`Self::make_set`].
    pub fn find(&mut self, v: AmrVertexId) -> AmrVertexId {
        let mut root = v;
        loop {
            let p = *self
                .parent
                .get(&root)
                .expect("find on a vertex not yet inserted into this DisjointSets");
            if p == root {
                break;
            }
            root = p;
        }
        let mut cur = v;
        while cur != root {
            let next = self.parent[&cur];
            self.parent.insert(cur, root);
            cur = next;
        }
        root
    }

    /// The representative of `v`'s class together with its value.
    pub fn find_value(&mut self, v: AmrVertexId) -> (AmrVertexId, V) {
        let root = self.find(v);
        (root, self.value[&root])
    }

    /// Unions the classes containing `a` and `b`, returning the resulting
    /// representative: whichever root is deeper under the fixed order.
    pub fn union(&mut self, a: AmrVertexId, b: AmrVertexId) -> AmrVertexId {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return ra;
        }
        let va = self.value[&ra];
        let vb = self.value[&rb];
        let (winner, loser) = if self.order.deeper(&(va, ra), &(vb, rb)) {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent.insert(loser, winner);
        let merged_size = self.size[&winner] + self.size[&loser];
        self.size.insert(winner, merged_size);
        winner
    }

    /// All vertices currently tracked, each paired with its class
    /// representative (after path compression).
    pub fn entries(&mut self) -> Vec<(AmrVertexId, AmrVertexId)> {
        let verts: Vec<AmrVertexId> = self.parent.keys().copied().collect();
        verts.into_iter().map(|v| (v, self.find(v))).collect()
    }

    /// Every tracked vertex with its raw (uncompressed) parent link, value
    /// and size — the exact shape [`crate::serialization`] round-trips.
    pub fn raw_entries(&self) -> Vec<(AmrVertexId, AmrVertexId, V, usize)> {
        let mut verts: Vec<AmrVertexId> = self.parent.keys().copied().collect();
        verts.sort();
        verts
            .into_iter()
            .map(|v| (v, self.parent[&v], self.value[&v], self.size[&v]))
            .collect()
    }

    /// Rebuilds a forest from [`Self::raw_entries`]' output, preserving the
    /// exact parent/value/size state (not just the equivalence classes).
    pub fn from_raw(order: DeepOrder, entries: Vec<(AmrVertexId, AmrVertexId, V, usize)>) -> Self {
        let mut ds = DisjointSets::new(order);
        for (v, parent, value, size) in entries {
            ds.parent.insert(v, parent);
            ds.value.insert(v, value);
            ds.size.insert(v, size);
        }
        ds
    }
}
