use crate::activation::ActivationFn;
use crate::backend::cpu::math;
use crate::backend::cpu::pooling::pool_blocked;
use crate::backend::{Backend, check_dtype, check_shape, pooled_shape};
use crate::codec;
use crate::dtype::DataType;
use crate::error::{Error, Result};
use crate::ops::{PoolKind, PoolParams};
use crate::tensor::{DataLayout, DataLayoutSet, Tensor};
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};

const LANES: usize = 4;

/// Applies `f` four lanes at a time, then to the trailing `len % 4` elements.
#[inline]
fn map_lanes(data: &mut [f32], f: impl Fn(f32) -> f32) {
    let mut chunks = data.chunks_exact_mut(LANES);
    for chunk in &mut chunks {
        let lanes: [f32; LANES] = [f(chunk[0]), f(chunk[1]), f(chunk[2]), f(chunk[3])];
        chunk.copy_from_slice(&lanes);
    }
    for x in chunks.into_remainder() {
        *x = f(*x);
    }
}

fn relu_lanes(data: &mut [f32]) {
    map_lanes(data, |x| if x > 0.0 { x } else { 0.0 })
}

fn lrelu_lanes(data: &mut [f32], alpha: f32) {
    map_lanes(data, |x| if x < 0.0 { alpha * x } else { x })
}

/// `2 * sigmoid(2x) - 1` in three passes over the lanes.
fn tanh_lanes(data: &mut [f32]) {
    map_lanes(data, |x| x * 2.0);
    map_lanes(data, math::sigmoid);
    map_lanes(data, |x| x * 2.0 - 1.0);
}

/// Backend for tensors stored as packed half precision pairs.
///
/// Kernels unpack into a reusable full precision scratch buffer, compute, and
/// pack the result into the output words. Softmax has no packed kernel.
pub struct PackedBackend {
    scratch: RefCell<Vec<f32>>,
    pool_scratch: RefCell<Vec<f32>>,
}

impl PackedBackend {
    pub fn new() -> Self {
        PackedBackend {
            scratch: RefCell::new(Vec::new()),
            pool_scratch: RefCell::new(Vec::new()),
        }
    }
}

impl Default for PackedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for PackedBackend {
    const NAME: &'static str = "packed-simd";
    const DATA_TYPE: DataType = DataType::PackedFloat16;
    const POOLING_LAYOUTS: DataLayoutSet = DataLayoutSet::single(DataLayout::BlockedNHWC);

    fn activation(&self, func: ActivationFn, input: &Tensor, output: &mut Tensor) -> Result<()> {
        check_shape("activation", input.shape(), output.shape())?;
        let src = input.as_packed()?;
        let dst = output.as_packed_mut()?;
        tracing::trace!("{} {func:?}: {} elements", Self::NAME, src.len());

        let mut scratch = self.scratch.borrow_mut();
        scratch.resize(src.len(), 0.0);
        let mut values = codec::unpack_into(src, &mut scratch)?;
        match func {
            ActivationFn::ReLU => relu_lanes(&mut values),
            ActivationFn::LReLU { alpha } => lrelu_lanes(&mut values, alpha),
            ActivationFn::ELU { alpha } => map_lanes(&mut values, |x| math::elu(x, alpha)),
            ActivationFn::SELU => map_lanes(&mut values, math::selu),
            ActivationFn::Tanh => tanh_lanes(&mut values),
            ActivationFn::Sigmoid => map_lanes(&mut values, math::sigmoid),
            ActivationFn::Softmax => return self.softmax(input, output),
        }
        codec::pack(&values, dst)?;
        Ok(())
    }

    fn softmax(&self, _input: &Tensor, _output: &mut Tensor) -> Result<()> {
        Err(Error::Unsupported {
            op: "softmax",
            backend: Self::NAME,
        })
    }

    fn pool(&self, kind: PoolKind, params: &PoolParams, input: &Tensor, output: &mut Tensor) -> Result<()> {
        check_dtype(input, Self::DATA_TYPE)?;
        check_dtype(output, Self::DATA_TYPE)?;
        if input.layout() != DataLayout::BlockedNHWC {
            return Err(Error::UnsupportedLayout {
                op: "pool".to_owned(),
                layout: input.layout(),
                supported: Self::POOLING_LAYOUTS,
            });
        }
        params.validate("pool")?;
        let expected = pooled_shape("pool", params, input.shape())?;
        check_shape("pool", &expected, output.shape())?;
        let shape = input.shape();
        let dims = [shape.dim(0), shape.dim(1), shape.dim(2), shape.dim(3)];
        tracing::trace!("{} {kind:?} pool {params:?} over {}", Self::NAME, shape);

        let src = input.as_packed()?;
        let mut scratch = self.scratch.borrow_mut();
        scratch.resize(src.len(), 0.0);
        let values = codec::unpack_into(src, &mut scratch)?;
        let mut pooled = self.pool_scratch.borrow_mut();
        pooled.resize(expected.storage_size(), 0.0);
        pool_blocked(kind, params, &values, &mut pooled, dims);
        codec::pack(&pooled, output.as_packed_mut()?)?;
        Ok(())
    }
}

impl Debug for PackedBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PackedBackend {{ scratch_len: {} }}", self.scratch.borrow().len())
    }
}
