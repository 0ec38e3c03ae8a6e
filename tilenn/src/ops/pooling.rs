use crate::backend::Backend;
use crate::backend::pooling::output_extent;
use crate::error::{Error, Result};
use crate::ops::{OpBase, OpType, Operator};
use crate::tensor::{DataLayoutSet, Tensor, TensorShape};
use crate::workspace::Workspace;
use std::marker::PhantomData;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PoolKind {
    Max,
    Average,
}

impl PoolKind {
    pub const fn op_type(self) -> OpType {
        match self {
            PoolKind::Max => OpType::MaxPooling,
            PoolKind::Average => OpType::AveragePooling,
        }
    }
}

/// Window extents and strides along the (rows, cols) axes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolParams {
    pub pool_rows: usize,
    pub pool_cols: usize,
    pub stride_rows: usize,
    pub stride_cols: usize,
}

impl PoolParams {
    pub const fn square(pool: usize, stride: usize) -> Self {
        PoolParams {
            pool_rows: pool,
            pool_cols: pool,
            stride_rows: stride,
            stride_cols: stride,
        }
    }

    /// Output `(rows, cols)` for an input of `rows x cols`. Panics on a zero stride.
    pub fn output_dims(&self, rows: usize, cols: usize) -> (usize, usize) {
        (
            output_extent(rows, self.pool_rows, self.stride_rows),
            output_extent(cols, self.pool_cols, self.stride_cols),
        )
    }

    pub fn validate(&self, op: &str) -> Result<()> {
        let invalid = |detail: String| Error::InvalidParameter {
            op: op.to_owned(),
            detail,
        };
        if self.pool_rows == 0 || self.pool_cols == 0 {
            return Err(invalid(format!("pool size {}x{} must be at least 1", self.pool_rows, self.pool_cols)));
        }
        if self.stride_rows == 0 || self.stride_cols == 0 {
            return Err(invalid(format!(
                "stride {}x{} must be at least 1",
                self.stride_rows, self.stride_cols
            )));
        }
        Ok(())
    }
}

/// Max or average pooling over the spatial axes of a 4-D tensor.
#[derive(Debug)]
pub struct PoolingOp<B: Backend> {
    base: OpBase,
    kind: PoolKind,
    params: PoolParams,
    _backend: PhantomData<B>,
}

impl<B: Backend> PoolingOp<B> {
    pub fn new<S: Into<String>>(name: S, kind: PoolKind, params: PoolParams) -> Self {
        PoolingOp {
            base: OpBase::new(name, kind.op_type(), 1),
            kind,
            params,
            _backend: PhantomData,
        }
    }

    pub fn max<S: Into<String>>(name: S, pool: usize, stride: usize) -> Self {
        Self::new(name, PoolKind::Max, PoolParams::square(pool, stride))
    }

    pub fn average<S: Into<String>>(name: S, pool: usize, stride: usize) -> Self {
        Self::new(name, PoolKind::Average, PoolParams::square(pool, stride))
    }

    #[inline]
    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    #[inline]
    pub fn params(&self) -> &PoolParams {
        &self.params
    }
}

impl<B: Backend> Operator<B> for PoolingOp<B> {
    fn base(&self) -> &OpBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OpBase {
        &mut self.base
    }

    fn input_layouts(&self) -> DataLayoutSet {
        B::POOLING_LAYOUTS
    }

    fn output_layouts(&self) -> DataLayoutSet {
        B::POOLING_LAYOUTS
    }

    fn validate_params(&self, ws: &Workspace) -> Result<()> {
        self.params.validate(self.base.name())?;
        let input = ws.get_tensor(self.base.input(0)?)?;
        let Some((rows, cols)) = input.shape().spatial() else {
            return Ok(());
        };
        if rows < self.params.pool_rows || cols < self.params.pool_cols {
            return Err(Error::InvalidParameter {
                op: self.base.name().to_owned(),
                detail: format!(
                    "pool {}x{} exceeds input {rows}x{cols}",
                    self.params.pool_rows, self.params.pool_cols
                ),
            });
        }
        Ok(())
    }

    fn infer_output_shape(&self, ws: &Workspace) -> Result<TensorShape> {
        self.params.validate(self.base.name())?;
        let input = ws.get_tensor(self.base.input(0)?)?;
        crate::backend::pooled_shape(self.base.name(), &self.params, input.shape())
    }

    fn run(&self, backend: &B, input: &Tensor, output: &mut Tensor) -> Result<()> {
        backend.pool(self.kind, &self.params, input, output)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::backend::CpuBackend;
    use crate::dtype::DataType;
    use crate::ops::OpState;
    use crate::tensor::DataLayout;

    fn workspace_with(shape: TensorShape) -> (Workspace, crate::workspace::TensorId) {
        let mut ws = Workspace::new();
        let id = ws
            .add_tensor(Tensor::zeroed("input", shape, DataType::Float32))
            .unwrap();
        (ws, id)
    }

    #[test]
    fn test_shape_inference_per_layout() {
        let cases = [
            (TensorShape::new([1, 3, 8, 6], DataLayout::NCHW), vec![1, 3, 4, 3]),
            (TensorShape::new([2, 7, 5, 11], DataLayout::BlockedNHWC), vec![2, 3, 2, 11]),
        ];
        for (shape, expected) in cases {
            let (ws, input) = workspace_with(shape);
            let mut op = PoolingOp::<CpuBackend>::max("pool", 2, 2);
            op.base_mut().bind_input(0, input).unwrap();
            let out = op.infer_shape(&ws).unwrap();
            assert_eq!(out.dims(), expected.as_slice());
            assert_eq!(op.base().state(), OpState::ShapeKnown);
            // idempotent
            assert_eq!(op.infer_shape(&ws).unwrap(), out);
        }
    }

    #[test]
    fn test_rectangular_window() {
        let (ws, input) = workspace_with(TensorShape::new([1, 1, 9, 7], DataLayout::NCHW));
        let params = PoolParams {
            pool_rows: 3,
            pool_cols: 2,
            stride_rows: 3,
            stride_cols: 1,
        };
        let mut op = PoolingOp::<CpuBackend>::new("pool", PoolKind::Average, params);
        op.base_mut().bind_input(0, input).unwrap();
        assert_eq!(op.infer_shape(&ws).unwrap().dims(), &[1, 1, 3, 6]);
        assert_eq!(Operator::<CpuBackend>::op_type(&op), OpType::AveragePooling);
    }

    #[test]
    fn test_validation_errors() {
        let (ws, input) = workspace_with(TensorShape::new([1, 1, 4, 4], DataLayout::NCHW));

        let mut missing = PoolingOp::<CpuBackend>::max("pool", 2, 2);
        assert!(matches!(missing.infer_shape(&ws), Err(Error::MissingInput { index: 0, .. })));

        let mut too_big = PoolingOp::<CpuBackend>::max("pool", 5, 1);
        too_big.base_mut().bind_input(0, input).unwrap();
        assert!(matches!(too_big.validate(&ws), Err(Error::InvalidParameter { .. })));

        let mut zero_stride = PoolingOp::<CpuBackend>::max("pool", 2, 0);
        zero_stride.base_mut().bind_input(0, input).unwrap();
        assert!(matches!(zero_stride.infer_shape(&ws), Err(Error::InvalidParameter { .. })));

        let mut arity = PoolingOp::<CpuBackend>::max("pool", 2, 2);
        assert!(matches!(
            arity.base_mut().bind_input(1, input),
            Err(Error::InvalidArity { expected: 1, actual: 2, .. })
        ));
    }

    #[test]
    fn test_rejects_unsupported_layout() {
        let (ws, input) = workspace_with(TensorShape::new([1, 4, 4, 3], DataLayout::NHWC));
        let mut op = PoolingOp::<CpuBackend>::max("pool", 2, 2);
        op.base_mut().bind_input(0, input).unwrap();
        assert!(matches!(op.validate(&ws), Err(Error::UnsupportedLayout { .. })));
    }

    #[test]
    fn test_materialize_and_run() {
        let mut ws = Workspace::new();
        let data = (1..=16).map(|v| v as f32).collect();
        let input = ws
            .add_tensor(Tensor::from_vec("input", TensorShape::new([1, 1, 4, 4], DataLayout::NCHW), data).unwrap())
            .unwrap();
        let mut op = PoolingOp::<CpuBackend>::max("pool", 2, 2);
        op.base_mut().bind_input(0, input).unwrap();
        let out = op.create_output_tensors(&mut ws).unwrap();
        assert_eq!(op.create_output_tensors(&mut ws).unwrap(), out);
        op.execute(&CpuBackend::new(), &mut ws).unwrap();
        assert_eq!(ws.get_tensor(out).unwrap().as_f32().unwrap(), &[6.0, 8.0, 14.0, 16.0]);
    }
}
