use smallvec::SmallVec;

use amr_core::{AmrVertexId, Value};

use super::{MergeTree, NodeRef};

impl<V: Value> MergeTree<V> {
    /// Prunes every subtree that contains no vertex satisfying `special`, in
    /// place. A root whose whole subtree holds nothing special is dropped
    /// from the forest entirely: an isolated non-special root, or a
    /// two-node root-child chain where neither node is special, are both
    /// just the smallest instances of "contains nothing special."
    ///
    /// A branch survives purely on whether it contains a special vertex —
    /// no branch is kept merely for being the deepest at its saddle.
    pub fn sparsify(&mut self, special: impl Fn(AmrVertexId) -> bool) {
        let roots = self.roots.clone();
        let mut kept_roots = Vec::with_capacity(roots.len());
        for r in roots {
            if self.contains_special(r, &special) {
                kept_roots.push(r);
            } else {
                self.prune_subtree(r);
            }
        }
        self.roots = kept_roots;
        self.reset_aux();
    }

    /// Same pruning rule, but returns a fresh, independently owned tree
    /// rather than mutating `self`. Implemented as clone-then-prune.
    pub fn sparsified(&self, special: impl Fn(AmrVertexId) -> bool) -> MergeTree<V>
    where
        V: Clone,
    {
        let mut out = self.clone();
        out.sparsify(special);
        out
    }

    /// Post-order: prunes every child branch with nothing special in it,
    /// and reports whether `n`'s own (possibly now-reduced) subtree still
    /// holds something special.
    fn contains_special(&mut self, n: NodeRef, special: &impl Fn(AmrVertexId) -> bool) -> bool {
        let children: SmallVec<[NodeRef; 4]> = self.node(n).children.clone();
        let mut any = self.node(n).any_special(special);
        let mut kept: SmallVec<[NodeRef; 4]> = SmallVec::new();
        for c in children {
            if self.contains_special(c, special) {
                any = true;
                kept.push(c);
            } else {
                self.prune_subtree(c);
            }
        }
        self.node_mut(n).children = kept;
        any
    }
}
