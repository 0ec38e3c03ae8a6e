use super::lookup::{self, SigmoidTable};
use super::math;
use super::pooling::{pool_blocked, pool_nchw};
use crate::activation::ActivationFn;
use crate::backend::{Backend, check_dtype, check_shape, pooled_shape};
use crate::config::{BackendConfig, SigmoidImpl};
use crate::dtype::DataType;
use crate::error::{Error, Result};
use crate::ops::{PoolKind, PoolParams};
use crate::tensor::{DataLayout, DataLayoutSet, Tensor};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Reference backend over full precision tensors.
pub struct CpuBackend {
    config: BackendConfig,
    table: Arc<SigmoidTable>,
}

impl CpuBackend {
    pub fn new() -> Self {
        CpuBackend {
            config: BackendConfig::default(),
            table: lookup::global(),
        }
    }

    pub fn with_config(config: BackendConfig) -> Result<Self> {
        config.validate()?;
        Ok(CpuBackend {
            config,
            table: lookup::global(),
        })
    }

    /// Uses `table` for the lookup sigmoid variants instead of the process-wide one.
    pub fn with_sigmoid_table(mut self, table: Arc<SigmoidTable>) -> Self {
        self.table = table;
        self
    }

    #[inline]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn sigmoid(&self, x: f32) -> f32 {
        match self.config.sigmoid {
            SigmoidImpl::Exact => math::sigmoid(x),
            SigmoidImpl::LookupCentered => self.table.lookup_centered(x),
            SigmoidImpl::LookupNoncentered => self.table.lookup_noncentered(x),
        }
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for CpuBackend {
    const NAME: &'static str = "cpu";
    const DATA_TYPE: DataType = DataType::Float32;
    const POOLING_LAYOUTS: DataLayoutSet = DataLayoutSet::single(DataLayout::NCHW).with(DataLayout::BlockedNHWC);

    fn activation(&self, func: ActivationFn, input: &Tensor, output: &mut Tensor) -> Result<()> {
        check_shape("activation", input.shape(), output.shape())?;
        tracing::trace!("{} {func:?}: {} -> {}", Self::NAME, input.name(), output.name());
        let src = input.as_f32()?;
        let dst = output.as_f32_mut()?;
        match func {
            ActivationFn::ReLU => math::map_into(src, dst, math::relu),
            ActivationFn::LReLU { alpha } => math::map_into(src, dst, |x| math::leaky_relu(x, alpha)),
            ActivationFn::ELU { alpha } => math::map_into(src, dst, |x| math::elu(x, alpha)),
            ActivationFn::SELU => math::map_into(src, dst, math::selu),
            ActivationFn::Tanh => math::map_into(src, dst, f32::tanh),
            ActivationFn::Sigmoid => math::map_into(src, dst, |x| self.sigmoid(x)),
            ActivationFn::Softmax => return self.softmax(input, output),
        }
        Ok(())
    }

    fn softmax(&self, input: &Tensor, output: &mut Tensor) -> Result<()> {
        check_shape("softmax", input.shape(), output.shape())?;
        let shape = input.shape();
        if shape.layout() == DataLayout::BlockedNHWC {
            return Err(Error::UnsupportedLayout {
                op: "softmax".to_owned(),
                layout: shape.layout(),
                supported: DataLayoutSet::ALL.without(DataLayout::BlockedNHWC),
            });
        }
        let (rows, cols) = shape.as_rows();
        let pad = shape.padding();
        tracing::trace!("{} softmax {rows}x{cols} (+{pad}): {} -> {}", Self::NAME, input.name(), output.name());
        math::softmax_rows(
            input.as_f32()?,
            output.as_f32_mut()?,
            rows,
            cols,
            pad,
            self.config.softmax_epsilon,
        );
        Ok(())
    }

    fn pool(&self, kind: PoolKind, params: &PoolParams, input: &Tensor, output: &mut Tensor) -> Result<()> {
        check_dtype(input, Self::DATA_TYPE)?;
        check_dtype(output, Self::DATA_TYPE)?;
        params.validate("pool")?;
        let expected = pooled_shape("pool", params, input.shape())?;
        check_shape("pool", &expected, output.shape())?;
        let layout = input.layout();
        let dims: [usize; 4] = [input.shape().dim(0), input.shape().dim(1), input.shape().dim(2), input.shape().dim(3)];
        tracing::trace!("{} {kind:?} pool {params:?} over {layout} {}", Self::NAME, input.shape());
        match layout {
            DataLayout::NCHW => {
                let input_pad = input.shape().padding();
                let output_pad = output.shape().padding();
                pool_nchw(kind, params, input.as_f32()?, input_pad, output.as_f32_mut()?, output_pad, dims);
            }
            DataLayout::BlockedNHWC => pool_blocked(kind, params, input.as_f32()?, output.as_f32_mut()?, dims),
            _ => {
                return Err(Error::UnsupportedLayout {
                    op: "pool".to_owned(),
                    layout,
                    supported: Self::POOLING_LAYOUTS,
                });
            }
        }
        Ok(())
    }
}

impl Debug for CpuBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "CpuBackend {{ sigmoid: {:?}, softmax_epsilon: {} }}", self.config.sigmoid, self.config.softmax_epsilon)
    }
}
