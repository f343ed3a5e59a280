use smallvec::SmallVec;

use amr_core::{AmrVertexId, Value, ValueVertex};

use super::{MergeTree, NodeRef};

impl<V: Value> MergeTree<V> {
    /// Contracts every maximal chain of single-child, non-`special` nodes
    /// down to the descendant where the chain ends (a branch point, a leaf,
    /// a special node, or a forest root), folding the chain's own vertices
    /// into that descendant's `vertices` list — filtered through `preserve`
    /// (the `preserve_plain_vertices` configuration predicate, not the
    /// build-time root pull-out flag).
    pub fn remove_degree2(
        &mut self,
        special: impl Fn(AmrVertexId) -> bool,
        preserve: impl Fn(AmrVertexId) -> bool,
    ) {
        let mut stack: Vec<NodeRef> = self.roots.clone();
        while let Some(n) = stack.pop() {
            let children: SmallVec<[NodeRef; 4]> = self.node(n).children.clone();
            for i in 0..children.len() {
                let child = children[i];
                if self.node(child).children.len() == 1 && !special(self.node(child).vertex) {
                    let mut descendant = self.node(child).children[0];
                    while self.node(descendant).children.len() == 1
                        && !special(self.node(descendant).vertex)
                    {
                        descendant = self.node(descendant).children[0];
                    }

                    // Chain nodes strictly between n and descendant,
                    // inclusive of `child` itself.
                    let mut chain = Vec::new();
                    let mut cur = self.node(descendant).parent.unwrap();
                    while cur != n {
                        chain.push(cur);
                        cur = self.node(cur).parent.unwrap();
                    }

                    for &c in &chain {
                        if preserve(self.node(c).vertex) {
                            let vv = self.node(c).value_vertex();
                            self.node_mut(descendant).vertices.push(vv);
                        }
                        let extra: Vec<ValueVertex<V>> = self
                            .node(c)
                            .vertices
                            .iter()
                            .copied()
                            .filter(|&(_, v)| preserve(v))
                            .collect();
                        self.node_mut(descendant).vertices.extend(extra);
                    }
                    for &c in &chain {
                        self.drop_node(c);
                    }

                    self.node_mut(descendant).parent = Some(n);
                    self.node_mut(n).children[i] = descendant;
                    stack.push(descendant);
                } else {
                    stack.push(child);
                }
            }
        }
    }

    /// Walks the tree bottom-up once, moving any plain vertex in a node's
    /// `vertices` list to its parent's list when the fixed deepness order
    /// says it belongs there instead — a corrective pass that degree-2
    /// contraction and `merge` can otherwise leave necessary, since both
    /// reassign parentage without re-checking every collapsed vertex's
    /// ordering against its node's new neighbours.
    pub fn redistribute_vertices(&mut self) {
        let roots = self.roots.clone();
        for r in roots {
            self.redistribute_subtree(r);
        }
    }

    fn redistribute_subtree(&mut self, n: NodeRef) {
        let children: SmallVec<[NodeRef; 4]> = self.node(n).children.clone();
        for c in children {
            self.redistribute_subtree(c);
        }

        let mut vertices = std::mem::take(&mut self.node_mut(n).vertices);
        vertices.sort_by(|a, b| self.order.cmp_vv(a, b));
        vertices.dedup();

        let parent = self.node(n).parent;
        for vv in vertices {
            match parent {
                Some(p) => {
                    let parent_vv = self.node(p).value_vertex();
                    if self.order.deeper(&parent_vv, &vv) {
                        // vv is shallower than its own node's parent: it
                        // belongs under the parent, not here.
                        self.node_mut(p).vertices.push(vv);
                    } else {
                        self.node_mut(n).vertices.push(vv);
                    }
                }
                None => self.node_mut(n).vertices.push(vv),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use amr_core::DeepOrder;

    use super::*;

    fn vid(offset: u64) -> AmrVertexId {
        AmrVertexId::new(0, offset)
    }

    #[test]
    fn contracts_a_plain_chain_into_its_descendant() {
        let order = DeepOrder::new(false);
        let mut tree: MergeTree<f64> = MergeTree::new(order);
        let root = tree.add_node(vid(0), 0.0);
        let mid1 = tree.add_node(vid(1), 1.0);
        let mid2 = tree.add_node(vid(2), 2.0);
        let leaf = tree.add_node(vid(3), 3.0);
        tree.link(root, mid1);
        tree.link(mid1, mid2);
        tree.link(mid2, leaf);
        tree.recompute_roots();

        tree.remove_degree2(|_| false, |_| true);

        assert_eq!(tree.node(root).children.len(), 1);
        assert_eq!(tree.node(root).children[0], leaf);
        assert_eq!(tree.node(leaf).parent, Some(root));
        let collapsed: Vec<u64> = tree
            .node(leaf)
            .vertices
            .iter()
            .map(|(_, v)| v.offset)
            .collect();
        assert_eq!(collapsed, vec![1, 2]);
        assert!(tree.node_of(vid(1)).is_none());
        assert!(tree.node_of(vid(2)).is_none());
    }

    #[test]
    fn special_vertex_stops_the_contraction() {
        let order = DeepOrder::new(false);
        let mut tree: MergeTree<f64> = MergeTree::new(order);
        let root = tree.add_node(vid(0), 0.0);
        let mid1 = tree.add_node(vid(1), 1.0);
        let mid2 = tree.add_node(vid(2), 2.0);
        let leaf = tree.add_node(vid(3), 3.0);
        tree.link(root, mid1);
        tree.link(mid1, mid2);
        tree.link(mid2, leaf);
        tree.recompute_roots();

        tree.remove_degree2(|v| v == vid(1), |_| true);

        // mid1 is special, so the chain only contracts mid2 into leaf.
        assert_eq!(tree.node(root).children.len(), 1);
        assert_eq!(tree.node(root).children[0], mid1);
        assert_eq!(tree.node(mid1).children.len(), 1);
        assert_eq!(tree.node(mid1).children[0], leaf);
        assert!(tree.node_of(vid(2)).is_none());
    }

    #[test]
    fn redistribute_moves_shallower_vertex_up() {
        let order = DeepOrder::new(false);
        let mut tree: MergeTree<f64> = MergeTree::new(order);
        let root = tree.add_node(vid(0), 0.0);
        let child = tree.add_node(vid(1), 10.0);
        tree.link(root, child);
        tree.recompute_roots();
        // a plain vertex shallower than root ended up in child's list.
        tree.node_mut(child).vertices.push((-1.0, vid(2)));

        tree.redistribute_vertices();

        assert!(tree.node(child).vertices.is_empty());
        let moved: Vec<u64> = tree.node(root).vertices.iter().map(|(_, v)| v.offset).collect();
        assert_eq!(moved, vec![2]);
    }
}
