use super::{OpBase, Operator, PoolingOp, SoftmaxOp, UnaryOp};
use crate::backend::Backend;
use crate::error::Result;
use crate::tensor::{DataLayoutSet, Tensor, TensorShape};
use crate::workspace::Workspace;
use std::fmt::{Debug, Formatter};

/// The closed set of operators a network can hold.
pub enum ConcreteOp<B: Backend> {
    Pooling(PoolingOp<B>),
    Unary(UnaryOp<B>),
    Softmax(SoftmaxOp<B>),
}

impl<B: Backend> ConcreteOp<B> {
    fn inner(&self) -> &dyn Operator<B> {
        match self {
            ConcreteOp::Pooling(inner) => inner,
            ConcreteOp::Unary(inner) => inner,
            ConcreteOp::Softmax(inner) => inner,
        }
    }
    fn inner_mut(&mut self) -> &mut dyn Operator<B> {
        match self {
            ConcreteOp::Pooling(inner) => inner,
            ConcreteOp::Unary(inner) => inner,
            ConcreteOp::Softmax(inner) => inner,
        }
    }
}

impl<B: Backend> Operator<B> for ConcreteOp<B> {
    #[inline]
    fn base(&self) -> &OpBase {
        self.inner().base()
    }

    #[inline]
    fn base_mut(&mut self) -> &mut OpBase {
        self.inner_mut().base_mut()
    }

    fn input_layouts(&self) -> DataLayoutSet {
        self.inner().input_layouts()
    }

    fn output_layouts(&self) -> DataLayoutSet {
        self.inner().output_layouts()
    }

    fn validate_params(&self, ws: &Workspace) -> Result<()> {
        self.inner().validate_params(ws)
    }

    fn infer_output_shape(&self, ws: &Workspace) -> Result<TensorShape> {
        self.inner().infer_output_shape(ws)
    }

    fn run(&self, backend: &B, input: &Tensor, output: &mut Tensor) -> Result<()> {
        self.inner().run(backend, input, output)
    }
}

impl<B: Backend> From<PoolingOp<B>> for ConcreteOp<B> {
    fn from(value: PoolingOp<B>) -> Self {
        ConcreteOp::Pooling(value)
    }
}

impl<B: Backend> From<UnaryOp<B>> for ConcreteOp<B> {
    fn from(value: UnaryOp<B>) -> Self {
        ConcreteOp::Unary(value)
    }
}

impl<B: Backend> From<SoftmaxOp<B>> for ConcreteOp<B> {
    fn from(value: SoftmaxOp<B>) -> Self {
        ConcreteOp::Softmax(value)
    }
}

impl<B: Backend> Debug for ConcreteOp<B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self.inner(), f)
    }
}
