//! The in-memory merge tree: a forest of critical-point nodes built over a
//! local vertex topology, and the algorithms that operate on it (build,
//! sparsify, degree-2 contraction, merge, persistence traversal).
//!
//! Node ownership is strictly tree-shaped: every [`Node`] lives in exactly
//! one [`MergeTree`]'s arena, addressed by a plain [`NodeRef`] index. A
//! child-to-parent edge is a relation, never an ownership link, and no
//! reference ever crosses a tree boundary — cross-block relationships are
//! expressed by looking up `AmrVertexId` values in a [`crate::DisjointSets`]
//! instead.
use fxhash::FxHashMap;
use smallvec::SmallVec;

use amr_core::{AmrVertexId, DeepOrder, Value, ValueVertex};

mod build;
mod degree2;
mod merge;
mod persistence;
mod sparsify;

pub use build::Topology;
pub use persistence::PersistencePair;

/// An index into a [`MergeTree`]'s node arena.
pub type NodeRef = usize;

/// A critical node of the merge tree: a local maximum, a saddle where
/// branches merge, or (transiently, mid-build) a root pulled out of its
/// children's collapsed vertices.
#[derive(Clone, Debug)]
pub struct Node<V: Value> {
    pub vertex: AmrVertexId,
    pub value: V,
    pub parent: Option<NodeRef>,
    pub children: SmallVec<[NodeRef; 4]>,
    /// Non-critical ("plain") vertices collapsed into this node during
    /// construction, contraction or redistribution.
    pub vertices: Vec<ValueVertex<V>>,
    /// Scratch slot: a compressed parent pointer during construction, reset
    /// to `None` once the tree is finished. Sparsify/persistence compute
    /// their own deepest-leaf/keep state by recursion rather than reusing
    /// this field a second time (see DESIGN.md).
    aux: Option<NodeRef>,
}

impl<V: Value> Node<V> {
    fn new(vertex: AmrVertexId, value: V) -> Self {
        Node {
            vertex,
            value,
            parent: None,
            children: SmallVec::new(),
            vertices: Vec::new(),
            aux: None,
        }
    }

    pub fn value_vertex(&self) -> ValueVertex<V> {
        (self.value, self.vertex)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn any_special(&self, special: &impl Fn(AmrVertexId) -> bool) -> bool {
        special(self.vertex) || self.vertices.iter().any(|&(_, v)| special(v))
    }
}

/// A forest of merge-tree nodes: one tree per maximal connected component of
/// the vertex set it was built over.
#[derive(Clone)]
pub struct MergeTree<V: Value> {
    order: DeepOrder,
    nodes: Vec<Option<Node<V>>>,
    vertex_to_node: FxHashMap<AmrVertexId, NodeRef>,
    roots: Vec<NodeRef>,
}

impl<V: Value> MergeTree<V> {
    /// An empty tree under the given deepness order.
    pub fn new(order: DeepOrder) -> Self {
        MergeTree {
            order,
            nodes: Vec::new(),
            vertex_to_node: FxHashMap::default(),
            roots: Vec::new(),
        }
    }

    pub fn order(&self) -> DeepOrder {
        self.order
    }

    pub fn roots(&self) -> &[NodeRef] {
        &self.roots
    }

    pub fn node(&self, r: NodeRef) -> &Node<V> {
        self.nodes[r].as_ref().expect("dangling NodeRef")
    }

    pub fn node_mut(&mut self, r: NodeRef) -> &mut Node<V> {
        self.nodes[r].as_mut().expect("dangling NodeRef")
    }

    /// Number of live nodes (tombstoned slots from pruning don't count).
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The node a vertex currently resolves to: either the real node it is
    /// (`vertex_to_node[v].vertex == v`), or — only mid-build, before
    /// `finish_build` prunes stale entries — a node it was collapsed into.
    pub fn node_of(&self, v: AmrVertexId) -> Option<NodeRef> {
        self.vertex_to_node.get(&v).copied()
    }

    fn add_node(&mut self, vertex: AmrVertexId, value: V) -> NodeRef {
        let r = self.nodes.len();
        self.nodes.push(Some(Node::new(vertex, value)));
        r
    }

    fn link(&mut self, parent: NodeRef, child: NodeRef) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(child).aux = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Union-find-style root lookup over the construction-time `aux` chain,
    /// with path compression. Meaningful only while a tree is mid-build or
    /// mid-merge; a finished tree's `parent` links are authoritative and
    /// `aux` is reset to `None`.
    fn find_root(&mut self, start: NodeRef) -> NodeRef {
        let mut root = start;
        loop {
            match self.node(root).aux {
                Some(next) if next != root => root = next,
                _ => break,
            }
        }
        let mut cur = start;
        while cur != root {
            let next = self.node(cur).aux.unwrap();
            self.node_mut(cur).aux = Some(root);
            cur = next;
        }
        root
    }

    /// Removes a single node from the arena, clearing its map entry if it
    /// was the one resolving its own vertex. Does not touch its children —
    /// callers that remove whole subtrees use [`Self::prune_subtree`].
    fn drop_node(&mut self, r: NodeRef) -> Node<V> {
        let node = self.nodes[r].take().expect("dangling NodeRef");
        if self.vertex_to_node.get(&node.vertex) == Some(&r) {
            self.vertex_to_node.remove(&node.vertex);
        }
        node
    }

    /// Removes `r` and every one of its descendants from the tree.
    fn prune_subtree(&mut self, r: NodeRef) {
        let children = self.node(r).children.clone();
        for c in children {
            self.prune_subtree(c);
        }
        self.drop_node(r);
    }

    fn recompute_roots(&mut self) {
        self.roots = (0..self.nodes.len())
            .filter(|&r| {
                self.nodes[r]
                    .as_ref()
                    .map_or(false, |n| n.parent.is_none())
            })
            .collect();
    }

    fn reset_aux(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            node.aux = None;
        }
    }

    /// The forest root above a given node, via `parent` links. Only
    /// meaningful on a finished tree (mid-build, use `find_root` over
    /// `aux`).
    pub fn root_of_node(&self, mut r: NodeRef) -> NodeRef {
        while let Some(p) = self.node(r).parent {
            r = p;
        }
        r
    }

    /// The root node covering `v`'s connected component, or `None` if `v`
    /// isn't present in this tree.
    pub fn root_of(&self, v: AmrVertexId) -> Option<NodeRef> {
        self.node_of(v).map(|r| self.root_of_node(r))
    }
}
