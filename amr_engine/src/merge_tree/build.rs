use smallvec::SmallVec;

use amr_core::{AmrVertexId, DeepOrder, Value, ValueVertex};

use super::{MergeTree, NodeRef};

/// The local adjacency structure `compute_merge_tree` sweeps over: every
/// vertex to include, and for each vertex, its topological neighbours.
/// Implemented by [`crate::MaskedBox`] over its `ACTIVE` cells.
pub trait Topology {
    /// Every vertex this topology covers, in unspecified order — the build
    /// sorts them itself by deepness.
    fn vertices(&self) -> Vec<AmrVertexId>;

    /// The vertices adjacent to `v` within this topology.
    fn link(&self, v: AmrVertexId) -> SmallVec<[AmrVertexId; 8]>;
}

impl<V: Value> MergeTree<V> {
    /// Builds a merge tree from a topology, a scalar field `f` and a
    /// collapsibility predicate.
    ///
    /// Vertices are swept in ascending deepness order; each one either
    /// collapses as a "plain" vertex into the single already-processed root
    /// it touches (when `collapsible(u)` holds and exactly one such root
    /// exists), or becomes a node of its own with every touched root linked
    /// beneath it. When `preserve` is set, the deepest collapsed vertex at
    /// each resulting root is pulled out into a new node above it.
    pub fn compute<T, F, C>(
        order: DeepOrder,
        topology: &T,
        f: F,
        collapsible: C,
        preserve: bool,
    ) -> MergeTree<V>
    where
        T: Topology,
        F: Fn(AmrVertexId) -> V,
        C: Fn(AmrVertexId) -> bool,
    {
        let mut tree = MergeTree::new(order);

        let mut vertices: Vec<ValueVertex<V>> = topology
            .vertices()
            .into_iter()
            .map(|v| (f(v), v))
            .collect();
        vertices.sort_by(|a, b| order.cmp_vv(a, b));

        for (val, u) in vertices {
            let mut roots: SmallVec<[NodeRef; 8]> = SmallVec::new();
            for v in topology.link(u) {
                if let Some(node_ref) = tree.node_of(v) {
                    let root = tree.find_root(node_ref);
                    if !roots.contains(&root) {
                        roots.push(root);
                    }
                }
            }

            if roots.len() == 1 && collapsible(u) {
                let r = roots[0];
                tree.node_mut(r).vertices.push((val, u));
                tree.vertex_to_node.insert(u, r);
            } else {
                let u_ref = tree.add_node(u, val);
                tree.vertex_to_node.insert(u, u_ref);
                for r in roots {
                    tree.link(u_ref, r);
                }
            }
        }

        tree.finish_build(preserve);
        tree
    }

    fn finish_build(&mut self, preserve: bool) {
        // Drop map entries left over from collapsed plain vertices: only a
        // node's own vertex should resolve to it once construction is done.
        self.vertex_to_node
            .retain(|&v, &mut r| self.nodes[r].as_ref().map_or(false, |n| n.vertex == v));

        self.recompute_roots();
        self.reset_aux();

        if preserve {
            self.pull_out_roots();
        }
    }

    /// For every current forest root whose collapsed `vertices` list is
    /// non-empty, extracts the deepest entry into a new node placed above
    /// the old root, which becomes its sole child. A box's active region
    /// can have more than one connected component, so every root is pulled
    /// out here, not just one of them.
    fn pull_out_roots(&mut self) {
        let old_roots = std::mem::take(&mut self.roots);
        let mut new_roots = Vec::with_capacity(old_roots.len());
        for r in old_roots {
            let deepest_idx = {
                let vertices = &self.node(r).vertices;
                if vertices.is_empty() {
                    new_roots.push(r);
                    continue;
                }
                let mut best = 0;
                for i in 1..vertices.len() {
                    if self.order.cmp_vv(&vertices[i], &vertices[best]) == std::cmp::Ordering::Greater {
                        best = i;
                    }
                }
                best
            };
            let (val, vertex) = self.node_mut(r).vertices.remove(deepest_idx);
            let new_root = self.add_node(vertex, val);
            self.vertex_to_node.insert(vertex, new_root);
            self.link(new_root, r);
            new_roots.push(new_root);
        }
        self.roots = new_roots;
    }
}
