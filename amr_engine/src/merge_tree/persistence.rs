use amr_core::{AmrVertexId, Value, ValueVertex};

use super::{MergeTree, NodeRef};

/// One merge event: the shallower of two branches (`birth`) dies into the
/// deeper one (`death`) at a saddle node (`saddle`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PersistencePair {
    pub birth: AmrVertexId,
    pub saddle: AmrVertexId,
    pub death: AmrVertexId,
}

impl<V: Value> MergeTree<V> {
    /// Every merge event the forest records: for each node with more than
    /// one child, every child but the one whose own deepest descendant is
    /// the deepest overall pairs that descendant against the deepest
    /// descendant of the node's deepest child. Each root additionally
    /// yields the trivial self-pair `(leaf(r), r, leaf(r))`.
    ///
    /// A tree with `n` leaves across `r` roots yields `n - r` non-trivial
    /// pairs plus one trivial pair per root (`n` total): the root of each
    /// tree is never merged off by anything above it, so its own pair
    /// degenerates to birth == death.
    pub fn traverse_persistence(&self) -> Vec<PersistencePair> {
        let mut pairs = Vec::new();
        for &r in &self.roots {
            let deepest = self.deepest_descendant(r, &mut pairs);
            pairs.push(PersistencePair {
                birth: deepest.1,
                saddle: self.node(r).vertex,
                death: deepest.1,
            });
        }
        pairs
    }

    fn deepest_descendant(&self, n: NodeRef, pairs: &mut Vec<PersistencePair>) -> ValueVertex<V> {
        let node = self.node(n);
        if node.children.is_empty() {
            return node.value_vertex();
        }

        let leaves: Vec<ValueVertex<V>> = node
            .children
            .iter()
            .map(|&c| self.deepest_descendant(c, pairs))
            .collect();

        let mut deepest = 0;
        for i in 1..leaves.len() {
            if self.order.deeper(&leaves[i], &leaves[deepest]) {
                deepest = i;
            }
        }

        for (i, leaf) in leaves.iter().enumerate() {
            if i != deepest {
                pairs.push(PersistencePair {
                    birth: leaf.1,
                    saddle: node.vertex,
                    death: leaves[deepest].1,
                });
            }
        }

        leaves[deepest]
    }
}
