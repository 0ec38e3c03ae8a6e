use crate::activation::ActivationFn;
use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::ops::{OpBase, Operator};
use crate::tensor::{DataLayoutSet, Tensor};
use crate::workspace::Workspace;
use std::marker::PhantomData;

/// Elementwise activation. The output takes the shape and layout of the input.
#[derive(Debug)]
pub struct UnaryOp<B: Backend> {
    base: OpBase,
    func: ActivationFn,
    _backend: PhantomData<B>,
}

impl<B: Backend> UnaryOp<B> {
    pub fn new<S: Into<String>>(name: S, func: ActivationFn) -> Self {
        UnaryOp {
            base: OpBase::new(name, func.op_type(), 1),
            func,
            _backend: PhantomData,
        }
    }

    #[inline]
    pub fn func(&self) -> ActivationFn {
        self.func
    }
}

impl<B: Backend> Operator<B> for UnaryOp<B> {
    fn base(&self) -> &OpBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OpBase {
        &mut self.base
    }

    fn input_layouts(&self) -> DataLayoutSet {
        DataLayoutSet::ALL
    }

    fn output_layouts(&self) -> DataLayoutSet {
        DataLayoutSet::ALL
    }

    fn validate_params(&self, _ws: &Workspace) -> Result<()> {
        if self.func == ActivationFn::Softmax {
            return Err(Error::InvalidParameter {
                op: self.base.name().to_owned(),
                detail: "softmax is a row operation, use SoftmaxOp".to_owned(),
            });
        }
        Ok(())
    }

    fn run(&self, backend: &B, input: &Tensor, output: &mut Tensor) -> Result<()> {
        self.func.compute(backend, input, output)
    }
}
