use std::ops::{Index, IndexMut};

/// Row-major strides for `dims`.
pub fn contiguous_strides<const N: usize>(dims: [usize; N]) -> [usize; N] {
    let mut strides = [0; N];
    let mut acc = 1;
    for axis in (0..N).rev() {
        strides[axis] = acc;
        acc *= dims[axis];
    }
    strides
}

/// Minimum slice length addressable through `dims` and `strides`.
fn required_len<const N: usize>(dims: [usize; N], strides: [usize; N]) -> usize {
    if dims.iter().any(|&d| d == 0) {
        return 0;
    }
    1 + (0..N).map(|i| (dims[i] - 1) * strides[i]).sum::<usize>()
}

#[inline]
fn offset_of<const N: usize>(dims: &[usize; N], strides: &[usize; N], idx: [usize; N]) -> usize {
    let mut offset = 0;
    for axis in 0..N {
        assert!(
            idx[axis] < dims[axis],
            "Index {idx:?} out of bounds for dims {dims:?} (axis {axis})"
        );
        offset += idx[axis] * strides[axis];
    }
    offset
}

/// Read-only N-dimensional view over a flat buffer.
///
/// All offset arithmetic lives here so kernels index with `[a, b, c, d]`
/// tuples and every access is bounds checked against the view dims.
#[derive(Copy, Clone, Debug)]
pub struct StridedView<'a, T, const N: usize> {
    data: &'a [T],
    dims: [usize; N],
    strides: [usize; N],
}

impl<'a, T, const N: usize> StridedView<'a, T, N> {
    pub fn from_slice(data: &'a [T], dims: [usize; N]) -> Self {
        Self::with_strides(data, dims, contiguous_strides(dims))
    }

    pub fn with_strides(data: &'a [T], dims: [usize; N], strides: [usize; N]) -> Self {
        let required = required_len(dims, strides);
        assert!(
            data.len() >= required,
            "Mismatched data length {} and dimension {:?} (needs {})",
            data.len(),
            dims,
            required
        );
        StridedView { data, dims, strides }
    }

    #[inline]
    pub fn dims(&self) -> [usize; N] {
        self.dims
    }

    #[inline]
    pub fn offset(&self, idx: [usize; N]) -> usize {
        offset_of(&self.dims, &self.strides, idx)
    }

    pub fn get(&self, idx: [usize; N]) -> Option<&'a T> {
        if (0..N).all(|axis| idx[axis] < self.dims[axis]) {
            Some(&self.data[self.offset(idx)])
        } else {
            None
        }
    }

    /// Contiguous run of the innermost axis starting at `idx`.
    pub fn vector_at(&self, idx: [usize; N]) -> &'a [T] {
        assert_eq!(self.strides[N - 1], 1, "Innermost axis is not contiguous");
        let start = self.offset(idx);
        &self.data[start..start + (self.dims[N - 1] - idx[N - 1])]
    }
}

impl<'a, T, const N: usize> Index<[usize; N]> for StridedView<'a, T, N> {
    type Output = T;
    #[inline]
    fn index(&self, index: [usize; N]) -> &Self::Output {
        &self.data[self.offset(index)]
    }
}

/// Mutable counterpart of [`StridedView`].
#[derive(Debug)]
pub struct StridedViewMut<'a, T, const N: usize> {
    data: &'a mut [T],
    dims: [usize; N],
    strides: [usize; N],
}

impl<'a, T, const N: usize> StridedViewMut<'a, T, N> {
    pub fn from_slice(data: &'a mut [T], dims: [usize; N]) -> Self {
        Self::with_strides(data, dims, contiguous_strides(dims))
    }

    pub fn with_strides(data: &'a mut [T], dims: [usize; N], strides: [usize; N]) -> Self {
        let required = required_len(dims, strides);
        assert!(
            data.len() >= required,
            "Mismatched data length {} and dimension {:?} (needs {})",
            data.len(),
            dims,
            required
        );
        StridedViewMut { data, dims, strides }
    }

    #[inline]
    pub fn dims(&self) -> [usize; N] {
        self.dims
    }

    #[inline]
    pub fn offset(&self, idx: [usize; N]) -> usize {
        offset_of(&self.dims, &self.strides, idx)
    }

    pub fn vector_at_mut(&mut self, idx: [usize; N]) -> &mut [T] {
        assert_eq!(self.strides[N - 1], 1, "Innermost axis is not contiguous");
        let start = self.offset(idx);
        let len = self.dims[N - 1] - idx[N - 1];
        &mut self.data[start..start + len]
    }
}

impl<'a, T, const N: usize> Index<[usize; N]> for StridedViewMut<'a, T, N> {
    type Output = T;
    #[inline]
    fn index(&self, index: [usize; N]) -> &Self::Output {
        &self.data[self.offset(index)]
    }
}

impl<'a, T, const N: usize> IndexMut<[usize; N]> for StridedViewMut<'a, T, N> {
    #[inline]
    fn index_mut(&mut self, index: [usize; N]) -> &mut Self::Output {
        let offset = self.offset(index);
        &mut self.data[offset]
    }
}
