//! A discrete, axis-aligned bounding box: the shape the grid reader and link
//! framework exchange. Dimension is a runtime value (a box simply has as
//! many entries in `low`/`high` as the simulation has axes) rather than a
//! compile-time constant, since the engine's algorithms never need to know
//! it — only linear offsets into a box matter to `MaskedBox` and beyond.

/// Inclusive-inclusive discrete box: `low[i]..=high[i]` on every axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoxBounds {
    low: Vec<i64>,
    high: Vec<i64>,
}

impl BoxBounds {
    /// Builds a box from inclusive low/high corners. Panics if the two
    /// corners don't have the same dimension or if any axis is inverted.
    pub fn new(low: Vec<i64>, high: Vec<i64>) -> Self {
        assert_eq!(low.len(), high.len(), "box corners must share a dimension");
        for (l, h) in low.iter().zip(high.iter()) {
            assert!(l <= h, "box low corner must not exceed high corner");
        }
        BoxBounds { low, high }
    }

    pub fn dim(&self) -> usize {
        self.low.len()
    }

    pub fn low(&self) -> &[i64] {
        &self.low
    }

    pub fn high(&self) -> &[i64] {
        &self.high
    }

    /// The number of grid points along each axis.
    pub fn shape(&self) -> Vec<u64> {
        self.low
            .iter()
            .zip(self.high.iter())
            .map(|(l, h)| (h - l + 1) as u64)
            .collect()
    }

    /// Total number of vertices covered by this box.
    pub fn len(&self) -> u64 {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, idx: &[i64]) -> bool {
        idx.len() == self.dim()
            && idx
                .iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(x, (l, h))| l <= x && x <= h)
    }

    /// Row-major linear offset of `idx` inside this box, or `None` if `idx`
    /// falls outside it. This is the native axis order the grid reader lays
    /// its output buffer out in.
    pub fn linear_offset(&self, idx: &[i64]) -> Option<u64> {
        if !self.contains(idx) {
            return None;
        }
        let shape = self.shape();
        let mut offset: u64 = 0;
        for axis in 0..self.dim() {
            let local = (idx[axis] - self.low[axis]) as u64;
            offset = offset * shape[axis] + local;
        }
        Some(offset)
    }

    /// Inverse of `linear_offset`: the grid-index coordinates of a linear
    /// offset inside this box.
    pub fn coords_of(&self, mut offset: u64) -> Option<Vec<i64>> {
        if offset >= self.len() {
            return None;
        }
        let shape = self.shape();
        let mut coords = vec![0i64; self.dim()];
        for axis in (0..self.dim()).rev() {
            let s = shape[axis];
            let local = offset % s;
            offset /= s;
            coords[axis] = self.low[axis] + local as i64;
        }
        Some(coords)
    }

    /// All linear offsets whose coordinates lie on the boundary of `core`
    /// within `self` — used to enumerate core-boundary cells for initial
    /// edge construction.
    pub fn boundary_offsets_of(&self, core: &BoxBounds) -> Vec<u64> {
        assert_eq!(self.dim(), core.dim());
        let mut out = Vec::new();
        for offset in 0..self.len() {
            let coords = self.coords_of(offset).unwrap();
            if !core.contains(&coords) {
                continue;
            }
            let on_boundary = (0..self.dim()).any(|axis| {
                coords[axis] == core.low()[axis] || coords[axis] == core.high()[axis]
            });
            if on_boundary {
                out.push(offset);
            }
        }
        out
    }

    /// True if the finer-level cell range a coarse index `coarse_idx`
    /// expands to under `ratio` (one coarse cell covers a `ratio^dim` block
    /// of finer cells) intersects this box. Used to classify a coarse
    /// ghost-ring cell as `COVERED` by a finer neighbour.
    pub fn overlaps_scaled(&self, coarse_idx: &[i64], ratio: i64) -> bool {
        assert_eq!(self.dim(), coarse_idx.len());
        assert!(ratio >= 1);
        (0..self.dim()).all(|axis| {
            let lo = coarse_idx[axis] * ratio;
            let hi = lo + ratio - 1;
            lo <= self.high[axis] && hi >= self.low[axis]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_offset_round_trips() {
        let b = BoxBounds::new(vec![0, 0], vec![3, 3]);
        for offset in 0..b.len() {
            let coords = b.coords_of(offset).unwrap();
            assert_eq!(b.linear_offset(&coords), Some(offset));
        }
    }

    #[test]
    fn contains_respects_bounds() {
        let b = BoxBounds::new(vec![1, 1], vec![2, 2]);
        assert!(b.contains(&[1, 1]));
        assert!(b.contains(&[2, 2]));
        assert!(!b.contains(&[0, 1]));
        assert!(!b.contains(&[3, 2]));
    }

    #[test]
    fn boundary_offsets_of_full_core() {
        let bounds = BoxBounds::new(vec![0, 0], vec![3, 3]);
        let core = bounds.clone();
        let boundary = bounds.boundary_offsets_of(&core);
        // a 4x4 box has 12 boundary cells, 4 interior
        assert_eq!(boundary.len(), 12);
    }

    #[test]
    fn overlaps_scaled_detects_fine_cell_footprint() {
        // coarse cell (1, 1) with ratio 2 covers fine cells [2,3] x [2,3].
        let fine_box = BoxBounds::new(vec![2, 2], vec![3, 3]);
        assert!(fine_box.overlaps_scaled(&[1, 1], 2));
        assert!(!fine_box.overlaps_scaled(&[0, 0], 2));
    }
}
