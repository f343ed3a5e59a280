//! The block wire format (spec.md §6): a length-prefixed, little-endian
//! encoding of the round counter, the disjoint-set forest, and the
//! component vector — each component carrying its own per-neighbour-gid
//! outgoing edge bucket. This is deliberately narrower than the full
//! `Block`: the mask and link geometry (`MaskedBox`, `MergeTree`) are not
//! part of this format and are expected to be rebuilt fresh from the grid
//! reader and link framework on restart, the same way a checkpoint/restart
//! of the source AMR solver never round-trips the fab data itself, only the
//! algorithm's own scratch state.
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use fxhash::FxHashSet;

use amr_core::{AmrEdge, AmrVertexId, DeepOrder, Value};

use crate::component::Component;
use crate::disjoint_sets::DisjointSets;
use crate::errors::{AmrError, AmrResult};

/// Current layout version. Bump this whenever a record shape below changes;
/// [`load`] rejects any other value with [`AmrError::SerializationVersionMismatch`].
pub const LAYOUT_VERSION: u32 = 1;

/// A scalar type this format can write and read at its own compile-time
/// width (spec.md §6: "reals use IEEE 754 of the compile-time width," never
/// widened to `f64` regardless of `V`).
pub trait WireReal: Value {
    fn write_wire<W: Write>(&self, w: &mut W) -> io::Result<()>;
    fn read_wire<R: Read>(r: &mut R) -> io::Result<Self>;
}

impl WireReal for f32 {
    fn write_wire<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_f32::<LittleEndian>(*self)
    }
    fn read_wire<R: Read>(r: &mut R) -> io::Result<Self> {
        r.read_f32::<LittleEndian>()
    }
}

impl WireReal for f64 {
    fn write_wire<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_f64::<LittleEndian>(*self)
    }
    fn read_wire<R: Read>(r: &mut R) -> io::Result<Self> {
        r.read_f64::<LittleEndian>()
    }
}

fn write_vertex<W: Write>(w: &mut W, v: AmrVertexId) -> io::Result<()> {
    w.write_i32::<LittleEndian>(v.gid)?;
    w.write_u64::<LittleEndian>(v.offset)
}

fn read_vertex<R: Read>(r: &mut R) -> io::Result<AmrVertexId> {
    let gid = r.read_i32::<LittleEndian>()?;
    let offset = r.read_u64::<LittleEndian>()?;
    Ok(AmrVertexId::new(gid, offset))
}

fn write_edge<W: Write>(w: &mut W, e: &AmrEdge) -> io::Result<()> {
    let (a, b) = e.endpoints();
    write_vertex(w, a)?;
    write_vertex(w, b)
}

fn read_edge<R: Read>(r: &mut R) -> io::Result<AmrEdge> {
    let a = read_vertex(r)?;
    let b = read_vertex(r)?;
    Ok(AmrEdge::new(a, b))
}

fn write_gid_set<W: Write>(w: &mut W, gids: &FxHashSet<i32>) -> io::Result<()> {
    let mut sorted: Vec<i32> = gids.iter().copied().collect();
    sorted.sort_unstable();
    w.write_u32::<LittleEndian>(sorted.len() as u32)?;
    for gid in sorted {
        w.write_i32::<LittleEndian>(gid)?;
    }
    Ok(())
}

fn read_gid_set<R: Read>(r: &mut R) -> io::Result<FxHashSet<i32>> {
    let count = r.read_u32::<LittleEndian>()?;
    let mut out = FxHashSet::default();
    for _ in 0..count {
        out.insert(r.read_i32::<LittleEndian>()?);
    }
    Ok(out)
}

fn write_component<W: Write, V: WireReal>(w: &mut W, c: &Component<V>) -> io::Result<()> {
    write_vertex(w, c.original_deepest)?;
    write_vertex(w, c.global_deepest)?;
    c.global_value.write_wire(w)?;
    write_gid_set(w, &c.current_neighbors)?;
    write_gid_set(w, &c.processed_neighbors)?;
    w.write_u32::<LittleEndian>(c.outgoing_edges.len() as u32)?;
    for e in &c.outgoing_edges {
        write_edge(w, e)?;
    }
    Ok(())
}

fn read_component<R: Read, V: WireReal>(r: &mut R) -> io::Result<Component<V>> {
    let original_deepest = read_vertex(r)?;
    let global_deepest = read_vertex(r)?;
    let global_value = V::read_wire(r)?;
    let current_neighbors = read_gid_set(r)?;
    let processed_neighbors = read_gid_set(r)?;
    let edge_count = r.read_u32::<LittleEndian>()?;
    let mut outgoing_edges = Vec::with_capacity(edge_count as usize);
    for _ in 0..edge_count {
        outgoing_edges.push(read_edge(r)?);
    }
    let mut c = Component::new(original_deepest, global_value);
    c.global_deepest = global_deepest;
    c.current_neighbors = current_neighbors;
    c.processed_neighbors = processed_neighbors;
    c.outgoing_edges = outgoing_edges;
    Ok(c)
}

fn write_disjoint_sets<W: Write, V: WireReal>(w: &mut W, ds: &DisjointSets<V>) -> io::Result<()> {
    w.write_u8(ds.order().negate() as u8)?;
    let entries = ds.raw_entries();
    w.write_u32::<LittleEndian>(entries.len() as u32)?;
    for (v, parent, value, size) in entries {
        write_vertex(w, v)?;
        write_vertex(w, parent)?;
        value.write_wire(w)?;
        w.write_u64::<LittleEndian>(size as u64)?;
    }
    Ok(())
}

fn read_disjoint_sets<R: Read, V: WireReal>(r: &mut R) -> io::Result<DisjointSets<V>> {
    let negate = r.read_u8()? != 0;
    let count = r.read_u32::<LittleEndian>()?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let v = read_vertex(r)?;
        let parent = read_vertex(r)?;
        let value = V::read_wire(r)?;
        let size = r.read_u64::<LittleEndian>()? as usize;
        entries.push((v, parent, value, size));
    }
    Ok(DisjointSets::from_raw(DeepOrder::new(negate), entries))
}

/// Writes the round counter, done flag, disjoint-set forest and component
/// vector in one pass. `w` is typically a `Vec<u8>` or a file.
pub fn save<W: Write, V: WireReal>(
    w: &mut W,
    round: u32,
    done: bool,
    disjoint_sets: &DisjointSets<V>,
    components: &[Component<V>],
) -> io::Result<()> {
    w.write_u32::<LittleEndian>(LAYOUT_VERSION)?;
    w.write_u32::<LittleEndian>(round)?;
    w.write_u8(done as u8)?;
    write_disjoint_sets(w, disjoint_sets)?;
    w.write_u32::<LittleEndian>(components.len() as u32)?;
    for c in components {
        write_component(w, c)?;
    }
    Ok(())
}

/// The fields [`save`]/[`load`] round-trip, handed back to the caller to
/// splice into a reconstructed `Block`.
pub struct Loaded<V: Value> {
    pub round: u32,
    pub done: bool,
    pub disjoint_sets: DisjointSets<V>,
    pub components: Vec<Component<V>>,
}

/// Reads a stream written by [`save`]. Fails with
/// [`AmrError::SerializationVersionMismatch`] if the stream's layout version
/// doesn't match [`LAYOUT_VERSION`].
pub fn load<R: Read, V: WireReal>(r: &mut R) -> AmrResult<Loaded<V>> {
    let version = r.read_u32::<LittleEndian>()?;
    if version != LAYOUT_VERSION {
        return Err(AmrError::SerializationVersionMismatch {
            found: version,
            expected: LAYOUT_VERSION,
        });
    }
    let round = r.read_u32::<LittleEndian>()?;
    let done = r.read_u8()? != 0;
    let disjoint_sets = read_disjoint_sets(r)?;
    let comp_count = r.read_u32::<LittleEndian>()?;
    let mut components = Vec::with_capacity(comp_count as usize);
    for _ in 0..comp_count {
        components.push(read_component(r)?);
    }
    Ok(Loaded {
        round,
        done,
        disjoint_sets,
        components,
    })
}
