use crate::ops::{PoolKind, PoolParams};
use crate::tensor::{BLOCK_WIDTH, StridedView, StridedViewMut};

/// Number of window positions along one axis: `(input - pool) / stride + 1`,
/// or 0 when the window does not fit.
#[inline]
pub fn output_extent(input: usize, pool: usize, stride: usize) -> usize {
    assert!(stride > 0, "Pooling stride must be positive");
    match input.checked_sub(pool) {
        Some(span) if pool > 0 => span / stride + 1,
        _ => 0,
    }
}

struct Window {
    kind: PoolKind,
    acc: [f32; BLOCK_WIDTH],
    count: usize,
}

impl Window {
    #[inline]
    fn new(kind: PoolKind) -> Self {
        let init = match kind {
            PoolKind::Max => f32::NEG_INFINITY,
            PoolKind::Average => 0.0,
        };
        Window {
            kind,
            acc: [init; BLOCK_WIDTH],
            count: 0,
        }
    }

    #[inline]
    fn push(&mut self, lanes: &[f32]) {
        for (acc, &x) in self.acc.iter_mut().zip(lanes) {
            match self.kind {
                PoolKind::Max => *acc = acc.max(x),
                PoolKind::Average => *acc += x,
            }
        }
        self.count += 1;
    }

    #[inline]
    fn commit(&self, out: &mut [f32]) {
        match self.kind {
            PoolKind::Max => out.copy_from_slice(&self.acc[..out.len()]),
            PoolKind::Average => {
                let scale = 1.0 / self.count as f32;
                for (o, &a) in out.iter_mut().zip(&self.acc) {
                    *o = a * scale;
                }
            }
        }
    }
}

/// Pools a channel-blocked tensor stored as `(N, G, H, W, 8)`.
///
/// `dims` are the logical `(N, H, W, C)` extents of the input. The output is
/// stored blocked as well, with spatial extents given by
/// [`PoolParams::output_dims`]. Padding lanes are pooled like any other lane.
pub fn pool_blocked(kind: PoolKind, params: &PoolParams, input: &[f32], output: &mut [f32], dims: [usize; 4]) {
    let [n, rows, cols, channels] = dims;
    let groups = channels.div_ceil(BLOCK_WIDTH);
    let (out_rows, out_cols) = params.output_dims(rows, cols);
    let input = StridedView::from_slice(input, [n, groups, rows, cols, BLOCK_WIDTH]);
    let mut output = StridedViewMut::from_slice(output, [n, groups, out_rows, out_cols, BLOCK_WIDTH]);
    for img in 0..n {
        for grp in 0..groups {
            for out_row in 0..out_rows {
                let row = out_row * params.stride_rows;
                for out_col in 0..out_cols {
                    let col = out_col * params.stride_cols;
                    let mut window = Window::new(kind);
                    for i in 0..params.pool_rows {
                        for j in 0..params.pool_cols {
                            window.push(input.vector_at([img, grp, row + i, col + j, 0]));
                        }
                    }
                    window.commit(output.vector_at_mut([img, grp, out_row, out_col, 0]));
                }
            }
        }
    }
}

/// Pools an `NCHW` tensor whose rows are padded by `input_pad` (input) and
/// `output_pad` (output) trailing columns.
pub fn pool_nchw(
    kind: PoolKind,
    params: &PoolParams,
    input: &[f32],
    input_pad: usize,
    output: &mut [f32],
    output_pad: usize,
    dims: [usize; 4],
) {
    let [n, channels, rows, cols] = dims;
    let (out_rows, out_cols) = params.output_dims(rows, cols);
    let in_stride = cols + input_pad;
    let out_stride = out_cols + output_pad;
    let input = StridedView::with_strides(
        input,
        [n, channels, rows, cols],
        [channels * rows * in_stride, rows * in_stride, in_stride, 1],
    );
    let mut output = StridedViewMut::with_strides(
        output,
        [n, channels, out_rows, out_cols],
        [channels * out_rows * out_stride, out_rows * out_stride, out_stride, 1],
    );
    let scale = 1.0 / (params.pool_rows * params.pool_cols) as f32;
    for img in 0..n {
        for chan in 0..channels {
            for out_row in 0..out_rows {
                let row = out_row * params.stride_rows;
                for out_col in 0..out_cols {
                    let col = out_col * params.stride_cols;
                    let mut acc = match kind {
                        PoolKind::Max => f32::NEG_INFINITY,
                        PoolKind::Average => 0.0,
                    };
                    for i in 0..params.pool_rows {
                        for j in 0..params.pool_cols {
                            let x = input[[img, chan, row + i, col + j]];
                            match kind {
                                PoolKind::Max => acc = acc.max(x),
                                PoolKind::Average => acc += x,
                            }
                        }
                    }
                    if kind == PoolKind::Average {
                        acc *= scale;
                    }
                    output[[img, chan, out_row, out_col]] = acc;
                }
            }
        }
    }
}
