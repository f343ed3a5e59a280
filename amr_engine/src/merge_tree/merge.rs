use smallvec::SmallVec;

use amr_core::{AmrVertexId, DeepOrder, Value, ValueVertex};

use super::{MergeTree, NodeRef};

impl<V: Value> MergeTree<V> {
    /// Combines several already-built trees into one, over a global edge
    /// relation that may connect vertices across trees a local build never
    /// saw. Every node any input tree carries survives as a node in the
    /// result (merge never re-collapses a vertex that was already judged
    /// critical); only the parent/child shape is recomputed, by resweeping
    /// every node ascending by deepness and linking it to whichever
    /// already-placed nodes `edges` reaches.
    ///
    /// A vertex appearing as a node in more than one input tree (the two
    /// block trees sharing a boundary vertex) is placed once, on first
    /// encounter; its later occurrences just fold their collapsed vertices
    /// into the node already placed, without consulting `edges` again.
    pub fn merge<E>(order: DeepOrder, trees: &[MergeTree<V>], edges: E) -> MergeTree<V>
    where
        E: Fn(AmrVertexId) -> SmallVec<[AmrVertexId; 8]>,
    {
        let mut items: Vec<(ValueVertex<V>, Vec<ValueVertex<V>>)> = Vec::new();
        for tree in trees {
            for slot in &tree.nodes {
                if let Some(node) = slot {
                    items.push((node.value_vertex(), node.vertices.clone()));
                }
            }
        }
        items.sort_by(|a, b| order.cmp_vv(&a.0, &b.0));

        let mut out = MergeTree::new(order);
        for ((val, u), collapsed) in items {
            if let Some(existing) = out.node_of(u) {
                out.node_mut(existing).vertices.extend(collapsed);
                continue;
            }

            let mut roots: SmallVec<[NodeRef; 8]> = SmallVec::new();
            for v in edges(u) {
                if let Some(node_ref) = out.node_of(v) {
                    let root = out.find_root(node_ref);
                    if !roots.contains(&root) {
                        roots.push(root);
                    }
                }
            }

            let u_ref = out.add_node(u, val);
            out.node_mut(u_ref).vertices = collapsed;
            out.vertex_to_node.insert(u, u_ref);
            for r in roots {
                out.link(u_ref, r);
            }
        }

        out.recompute_roots();
        out.reset_aux();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vid(gid: i32, offset: u64) -> AmrVertexId {
        AmrVertexId::new(gid, offset)
    }

    fn singleton_tree(order: DeepOrder, v: AmrVertexId, val: f64) -> MergeTree<f64> {
        let mut t = MergeTree::new(order);
        t.add_node(v, val);
        t.recompute_roots();
        t
    }

    #[test]
    fn two_disjoint_trees_joined_by_a_shared_edge_merge_into_one_root() {
        let order = DeepOrder::new(false);
        let a = singleton_tree(order, vid(0, 0), 3.0);
        let b = singleton_tree(order, vid(1, 0), 9.0);

        let merged = MergeTree::merge(order, &[a, b], |v| {
            let mut out = SmallVec::new();
            if v == vid(0, 0) {
                out.push(vid(1, 0));
            } else if v == vid(1, 0) {
                out.push(vid(0, 0));
            }
            out
        });

        assert_eq!(merged.roots().len(), 1);
        let root = merged.node(merged.roots()[0]);
        assert_eq!(root.vertex, vid(1, 0));
        assert_eq!(root.children.len(), 1);
        assert_eq!(merged.node(root.children[0]).vertex, vid(0, 0));
    }

    #[test]
    fn unconnected_trees_stay_separate_roots() {
        let order = DeepOrder::new(false);
        let a = singleton_tree(order, vid(0, 0), 3.0);
        let b = singleton_tree(order, vid(1, 0), 9.0);

        let merged = MergeTree::merge(order, &[a, b], |_| SmallVec::new());

        assert_eq!(merged.roots().len(), 2);
    }

    #[test]
    fn shared_vertex_across_two_trees_is_placed_once() {
        let order = DeepOrder::new(false);
        let mut a = MergeTree::new(order);
        let shared = a.add_node(vid(0, 0), 5.0);
        a.node_mut(shared).vertices.push((1.0, vid(0, 1)));
        a.recompute_roots();

        let mut b = MergeTree::new(order);
        b.add_node(vid(0, 0), 5.0);
        b.recompute_roots();

        let merged = MergeTree::merge(order, &[a, b], |_| SmallVec::new());

        assert_eq!(merged.roots().len(), 1);
        let root = merged.node(merged.roots()[0]);
        assert_eq!(root.vertex, vid(0, 0));
        assert_eq!(root.vertices.len(), 1);
    }
}
