use crate::backend::Backend;
use crate::error::Result;
use crate::ops::OpType;
use crate::tensor::Tensor;

/// Slope used by the leaky variants when none is given.
pub const DEFAULT_ALPHA: f32 = 0.1;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivationFn {
    #[default]
    ReLU,
    LReLU {
        alpha: f32,
    },
    ELU {
        alpha: f32,
    },
    SELU,
    Tanh,
    Sigmoid,
    Softmax,
}

impl ActivationFn {
    pub const fn lrelu() -> Self {
        ActivationFn::LReLU { alpha: DEFAULT_ALPHA }
    }

    pub const fn elu() -> Self {
        ActivationFn::ELU { alpha: DEFAULT_ALPHA }
    }

    pub const fn op_type(&self) -> OpType {
        match self {
            ActivationFn::ReLU => OpType::ReLU,
            ActivationFn::LReLU { .. } => OpType::LReLU,
            ActivationFn::ELU { .. } => OpType::ELU,
            ActivationFn::SELU => OpType::SELU,
            ActivationFn::Tanh => OpType::Tanh,
            ActivationFn::Sigmoid => OpType::Sigmoid,
            ActivationFn::Softmax => OpType::Softmax,
        }
    }

    pub fn compute<B: Backend>(&self, backend: &B, input: &Tensor, output: &mut Tensor) -> Result<()> {
        match self {
            ActivationFn::Softmax => backend.softmax(input, output),
            &func => backend.activation(func, input, output),
        }
    }
}
