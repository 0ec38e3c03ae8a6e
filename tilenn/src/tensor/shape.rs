use crate::tensor::layout::{BLOCK_WIDTH, DataLayout};
use crate::util::next_multiple;
use std::fmt::{Display, Formatter, Write};

/// Logical extents of a tensor plus its memory layout.
///
/// Dims are always logical: a `BlockedNHWC` shape lists `(N, H, W, C)` with
/// the true channel count. `alignment` pads the innermost stored axis up to a
/// multiple of itself (a value of 0 or 1 means no padding).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TensorShape {
    dims: Vec<usize>,
    layout: DataLayout,
    alignment: usize,
}

impl TensorShape {
    pub fn new<D: Into<Vec<usize>>>(dims: D, layout: DataLayout) -> Self {
        let dims = dims.into();
        if let Some(rank) = layout.rank() {
            assert_eq!(dims.len(), rank, "Layout {layout} requires rank {rank}, got dims {dims:?}");
        }
        TensorShape {
            dims,
            layout,
            alignment: 0,
        }
    }

    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn layout(&self) -> DataLayout {
        self.layout
    }

    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn dim(&self, axis: usize) -> usize {
        self.dims[axis]
    }

    /// Product of the logical extents.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Extra elements appended to the innermost logical axis.
    pub fn padding(&self) -> usize {
        match (self.layout, self.dims.last()) {
            (DataLayout::BlockedNHWC, _) | (_, None) => 0,
            (_, Some(&last)) if self.alignment > 1 => next_multiple(last, self.alignment) - last,
            _ => 0,
        }
    }

    /// Extents as laid out in memory, innermost axis last.
    pub fn storage_dims(&self) -> Vec<usize> {
        match self.layout {
            DataLayout::BlockedNHWC => {
                let (n, h, w, c) = (self.dims[0], self.dims[1], self.dims[2], self.dims[3]);
                vec![n, c.div_ceil(BLOCK_WIDTH), h, w, BLOCK_WIDTH]
            }
            _ => {
                let mut dims = self.dims.clone();
                let pad = self.padding();
                if let Some(last) = dims.last_mut() {
                    *last += pad;
                }
                dims
            }
        }
    }

    /// Number of elements the backing buffer must hold, padding included.
    pub fn storage_size(&self) -> usize {
        self.storage_dims().iter().product()
    }

    /// `(rows, cols)` for layouts with spatial axes.
    pub fn spatial(&self) -> Option<(usize, usize)> {
        self.layout
            .spatial_axes()
            .map(|(r, c)| (self.dims[r], self.dims[c]))
    }

    pub fn channels(&self) -> Option<usize> {
        self.layout.channel_axis().map(|axis| self.dims[axis])
    }

    /// Same layout and alignment, spatial axes replaced.
    pub fn with_spatial(&self, rows: usize, cols: usize) -> Option<Self> {
        let (r, c) = self.layout.spatial_axes()?;
        let mut out = self.clone();
        out.dims[r] = rows;
        out.dims[c] = cols;
        Some(out)
    }

    /// Splits into `(rows, cols)` where a row is the innermost logical axis.
    pub fn as_rows(&self) -> (usize, usize) {
        match self.dims.split_last() {
            None => (1, 1),
            Some((&cols, outer)) => (outer.iter().product(), cols),
        }
    }
}

impl Display for TensorShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_char('(')?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            Display::fmt(d, f)?;
        }
        f.write_char(')')
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_plain_storage() {
        let s = TensorShape::new([2, 3, 4, 5], DataLayout::NCHW);
        assert_eq!(s.num_elements(), 120);
        assert_eq!(s.storage_size(), 120);
        assert_eq!(s.spatial(), Some((4, 5)));
        assert_eq!(s.channels(), Some(3));
        assert_eq!("(2, 3, 4, 5)", s.to_string());
    }

    #[test]
    fn test_aligned_storage() {
        let s = TensorShape::new([2, 10], DataLayout::NC).with_alignment(8);
        assert_eq!(s.padding(), 6);
        assert_eq!(s.storage_dims(), vec![2, 16]);
        assert_eq!(s.storage_size(), 32);
        assert!(s.storage_size() >= s.num_elements());
    }

    #[test]
    fn test_blocked_storage() {
        let s = TensorShape::new([1, 4, 4, 11], DataLayout::BlockedNHWC);
        assert_eq!(s.storage_dims(), vec![1, 2, 4, 4, 8]);
        assert_eq!(s.storage_size(), 256);
        assert_eq!(s.spatial(), Some((4, 4)));
        assert_eq!(s.channels(), Some(11));
        assert_eq!(s.padding(), 0);
    }

    #[test]
    fn test_with_spatial() {
        let s = TensorShape::new([1, 6, 6, 3], DataLayout::NHWC).with_alignment(4);
        let out = s.with_spatial(3, 3).unwrap();
        assert_eq!(out.dims(), &[1, 3, 3, 3]);
        assert_eq!(out.alignment(), 4);
        assert!(TensorShape::new([2, 3], DataLayout::NC).with_spatial(1, 1).is_none());
    }

    #[test]
    fn test_as_rows() {
        assert_eq!(TensorShape::new([4, 7], DataLayout::NC).as_rows(), (4, 7));
        assert_eq!(TensorShape::new([2, 3, 5], DataLayout::X).as_rows(), (6, 5));
    }

    #[test]
    #[should_panic]
    fn test_rank_mismatch() {
        TensorShape::new([1, 2, 3], DataLayout::NCHW);
    }
}
