use crate::activation::ActivationFn;
use crate::dtype::DataType;
use crate::error::{Error, Result};
use crate::ops::{PoolKind, PoolParams};
use crate::tensor::{DataLayoutSet, Tensor, TensorShape};
use std::fmt::Debug;

mod cpu;
mod packed;

pub use cpu::*;
pub use packed::PackedBackend;

/// Kernel dispatch over workspace tensors.
///
/// Each backend handles a single storage [`DataType`]; operators check their
/// tensors against [`Backend::DATA_TYPE`] during validation and backends
/// re-check before touching raw storage.
pub trait Backend: 'static + Debug {
    const NAME: &'static str;
    const DATA_TYPE: DataType;
    /// Layouts the pooling kernels can address.
    const POOLING_LAYOUTS: DataLayoutSet;

    /// Applies an elementwise activation. `output` must have the shape of `input`.
    fn activation(&self, func: ActivationFn, input: &Tensor, output: &mut Tensor) -> Result<()>;

    /// Row-wise softmax over the innermost logical axis.
    fn softmax(&self, input: &Tensor, output: &mut Tensor) -> Result<()>;

    fn pool(&self, kind: PoolKind, params: &PoolParams, input: &Tensor, output: &mut Tensor) -> Result<()>;
}

pub(crate) fn check_dtype(tensor: &Tensor, expected: DataType) -> Result<()> {
    if tensor.data_type() != expected {
        return Err(Error::DTypeMismatch {
            tensor: tensor.name().to_owned(),
            expected,
            actual: tensor.data_type(),
        });
    }
    Ok(())
}

pub(crate) fn check_shape(op: &str, expected: &TensorShape, actual: &TensorShape) -> Result<()> {
    if expected != actual {
        return Err(Error::ShapeMismatch {
            op: op.to_owned(),
            lhs: expected.clone(),
            rhs: actual.clone(),
        });
    }
    Ok(())
}

/// Shape a pooling kernel writes for `input`, alignment inherited.
pub(crate) fn pooled_shape(op: &str, params: &PoolParams, input: &TensorShape) -> Result<TensorShape> {
    let no_spatial = || Error::InvalidParameter {
        op: op.to_owned(),
        detail: format!("layout {} has no spatial axes", input.layout()),
    };
    let (rows, cols) = input.spatial().ok_or_else(no_spatial)?;
    let (out_rows, out_cols) = params.output_dims(rows, cols);
    input.with_spatial(out_rows, out_cols).ok_or_else(no_spatial)
}
