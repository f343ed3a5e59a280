use crate::{BoxBounds, GridResult};
use amr_core::Value;

/// The AMR grid I/O layer: given a discrete bounding box and an output
/// buffer, the reader fills the buffer with scalar values laid out in the
/// block's native axis order. Collective read mode is mandatory.
///
/// A real backend reads a simulation checkpoint (e.g. a BoxLib/AMReX plot
/// file); this crate only states the contract `amr_engine`'s `Block`
/// construction needs from it.
pub trait GridReader<V: Value> {
    /// Fills `out` with the scalar field values for `gid`'s `bounds`, in
    /// row-major order matching `bounds.linear_offset`. `out.len()` must
    /// equal `bounds.len()`.
    fn read_box(&self, gid: i32, bounds: &BoxBounds, out: &mut [V]) -> GridResult<()>;

    /// Collective variant: every rank requests its own set of boxes and the
    /// call returns once all ranks have their data. A single-process
    /// implementation may just loop over `read_box`; a real parallel
    /// implementation typically issues one collective I/O call for every
    /// request in the batch.
    fn read_boxes(&self, requests: &[(i32, BoxBounds)]) -> GridResult<Vec<Vec<V>>> {
        requests
            .iter()
            .map(|(gid, bounds)| {
                let mut out = vec![V::default(); bounds.len() as usize];
                self.read_box(*gid, bounds, &mut out)?;
                Ok(out)
            })
            .collect()
    }
}
