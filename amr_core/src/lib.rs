//! Fundamental, allocation-free types shared by every other crate in this
//! workspace: the vertex addressing scheme used across block boundaries and
//! the `negate`-aware deepness ordering that every comparison in the merge
//! tree / connected-component engine is built on.
//!
//! Kept deliberately tiny and dependency-light, the same role `core_goko`
//! plays for the covertree: a handful of types that both the engine and the
//! external grid/link layer need to agree on.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A vertex address inside the union of AMR boxes: `(gid, offset)` where
/// `gid` identifies the owning block and `offset` is a linear index into that
/// block's box. Ordered lexicographically on `(gid, offset)`, which is the
/// tie-break used wherever two vertices compare equal in value.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct AmrVertexId {
    pub gid: i32,
    pub offset: u64,
}

impl AmrVertexId {
    pub const fn new(gid: i32, offset: u64) -> Self {
        AmrVertexId { gid, offset }
    }
}

impl From<(i32, u64)> for AmrVertexId {
    fn from((gid, offset): (i32, u64)) -> Self {
        AmrVertexId::new(gid, offset)
    }
}

impl fmt::Display for AmrVertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.gid, self.offset)
    }
}

impl fmt::Debug for AmrVertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmrVertexId")
            .field("gid", &self.gid)
            .field("offset", &self.offset)
            .finish()
    }
}

/// An unordered pair of vertices crossing a block boundary: `a.gid != b.gid`.
/// Construction canonicalizes the order (smaller [`AmrVertexId`] first) so
/// that the same physical adjacency, seen from either endpoint's owning
/// block, produces an identical value — the property the round
/// coordinator's "is this edge still confirmed by the sender" check relies
/// on.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AmrEdge {
    a: AmrVertexId,
    b: AmrVertexId,
}

impl AmrEdge {
    /// Builds the edge between `a` and `b`. Panics if both endpoints are
    /// owned by the same block — an `AmrEdge` is cross-block by definition.
    pub fn new(a: AmrVertexId, b: AmrVertexId) -> Self {
        assert_ne!(a.gid, b.gid, "AmrEdge endpoints must cross a block boundary");
        if a <= b {
            AmrEdge { a, b }
        } else {
            AmrEdge { a: b, b: a }
        }
    }

    pub fn endpoints(&self) -> (AmrVertexId, AmrVertexId) {
        (self.a, self.b)
    }

    /// This edge's endpoint owned by `gid`, if either side matches.
    pub fn endpoint_in(&self, gid: i32) -> Option<AmrVertexId> {
        if self.a.gid == gid {
            Some(self.a)
        } else if self.b.gid == gid {
            Some(self.b)
        } else {
            None
        }
    }

    /// The endpoint *not* owned by `gid`, if `gid` matches one side.
    pub fn remote_of(&self, gid: i32) -> Option<AmrVertexId> {
        if self.a.gid == gid {
            Some(self.b)
        } else if self.b.gid == gid {
            Some(self.a)
        } else {
            None
        }
    }
}

impl fmt::Debug for AmrEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AmrEdge({:?}, {:?})", self.a, self.b)
    }
}

/// Bound required of the scalar field type. Implemented for `f32` and `f64`;
/// the engine is generic over which width is compiled in — a single static
/// choice, no runtime polymorphism.
pub trait Value:
    Copy + Default + PartialOrd + fmt::Debug + Send + Sync + Serialize + for<'de> Deserialize<'de> + 'static
{
    fn to_f64(self) -> f64;
}

impl Value for f32 {
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Value for f64 {
    fn to_f64(self) -> f64 {
        self
    }
}

/// A `(value, vertex)` pair, the unit every deepness comparison is performed
/// on. `vertex` breaks ties between equal values.
pub type ValueVertex<V> = (V, AmrVertexId);

/// The single comparison rule the whole engine is built on: "deeper" means
/// larger unless `negate` is set, in which case it means smaller. Ties are
/// broken on `AmrVertexId` order. A *single* `DeepOrder` is fixed per run and
/// threaded through every algorithm that needs to compare vertices —
/// `MergeTree`, `DisjointSets`, and the round coordinator all share one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DeepOrder {
    negate: bool,
}

impl DeepOrder {
    pub fn new(negate: bool) -> Self {
        DeepOrder { negate }
    }

    pub fn negate(&self) -> bool {
        self.negate
    }

    /// Orders two bare values, without vertex tie-breaking.
    pub fn cmp_value<V: Value>(&self, a: V, b: V) -> Ordering {
        let ord = a
            .to_f64()
            .partial_cmp(&b.to_f64())
            .unwrap_or(Ordering::Equal);
        if self.negate {
            ord.reverse()
        } else {
            ord
        }
    }

    /// True if `a` is strictly deeper than `b`.
    pub fn value_deeper<V: Value>(&self, a: V, b: V) -> bool {
        self.cmp_value(a, b) == Ordering::Greater
    }

    /// Total order over `(value, vertex)` pairs: value first, vertex id as
    /// tie-break. This is the order `compute_merge_tree`'s initial vertex
    /// sort, `DisjointSets::union`'s representative choice, and
    /// `Component::global_value` monotonicity all rely on.
    pub fn cmp_vv<V: Value>(&self, a: &ValueVertex<V>, b: &ValueVertex<V>) -> Ordering {
        match self.cmp_value(a.0, b.0) {
            Ordering::Equal => a.1.cmp(&b.1),
            other => other,
        }
    }

    /// True if `a` is strictly deeper than `b` under `cmp_vv`.
    pub fn deeper<V: Value>(&self, a: &ValueVertex<V>, b: &ValueVertex<V>) -> bool {
        self.cmp_vv(a, b) == Ordering::Greater
    }

    /// Returns whichever of `a`, `b` is deeper (picking `a` on ties, which
    /// cannot actually happen since vertex ids are unique and total).
    pub fn deepest_of<V: Value>(&self, a: ValueVertex<V>, b: ValueVertex<V>) -> ValueVertex<V> {
        if self.deeper(&b, &a) {
            b
        } else {
            a
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_ordering_is_lexicographic() {
        let a = AmrVertexId::new(0, 5);
        let b = AmrVertexId::new(0, 6);
        let c = AmrVertexId::new(1, 0);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn deep_order_max_mode() {
        let order = DeepOrder::new(false);
        let a: ValueVertex<f64> = (1.0, AmrVertexId::new(0, 0));
        let b: ValueVertex<f64> = (2.0, AmrVertexId::new(0, 1));
        assert!(order.deeper(&b, &a));
        assert!(!order.deeper(&a, &b));
        assert_eq!(order.deepest_of(a, b), b);
    }

    #[test]
    fn deep_order_negate_mode() {
        let order = DeepOrder::new(true);
        let a: ValueVertex<f64> = (1.0, AmrVertexId::new(0, 0));
        let b: ValueVertex<f64> = (2.0, AmrVertexId::new(0, 1));
        // negated: smaller value is deeper
        assert!(order.deeper(&a, &b));
        assert_eq!(order.deepest_of(a, b), a);
    }

    #[test]
    fn deep_order_tie_break_on_vertex() {
        let order = DeepOrder::new(false);
        let a: ValueVertex<f64> = (1.0, AmrVertexId::new(0, 0));
        let b: ValueVertex<f64> = (1.0, AmrVertexId::new(0, 1));
        assert!(order.deeper(&b, &a));
    }

    #[test]
    fn edge_construction_is_order_independent() {
        let u = AmrVertexId::new(0, 3);
        let v = AmrVertexId::new(1, 7);
        assert_eq!(AmrEdge::new(u, v), AmrEdge::new(v, u));
    }

    #[test]
    fn edge_endpoint_lookup() {
        let u = AmrVertexId::new(0, 3);
        let v = AmrVertexId::new(1, 7);
        let e = AmrEdge::new(u, v);
        assert_eq!(e.endpoint_in(0), Some(u));
        assert_eq!(e.endpoint_in(1), Some(v));
        assert_eq!(e.endpoint_in(2), None);
        assert_eq!(e.remote_of(0), Some(v));
        assert_eq!(e.remote_of(1), Some(u));
    }

    #[test]
    #[should_panic]
    fn edge_rejects_same_gid_endpoints() {
        AmrEdge::new(AmrVertexId::new(0, 0), AmrVertexId::new(0, 1));
    }
}
