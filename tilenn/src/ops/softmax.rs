use crate::backend::Backend;
use crate::error::Result;
use crate::ops::{OpBase, OpType, Operator};
use crate::tensor::{DataLayout, DataLayoutSet, Tensor};
use std::marker::PhantomData;

const SOFTMAX_LAYOUTS: DataLayoutSet = DataLayoutSet::single(DataLayout::NC).with(DataLayout::X);

/// Row-wise softmax over the innermost axis of an `NC` or `X` tensor.
#[derive(Debug)]
pub struct SoftmaxOp<B: Backend> {
    base: OpBase,
    _backend: PhantomData<B>,
}

impl<B: Backend> SoftmaxOp<B> {
    pub fn new<S: Into<String>>(name: S) -> Self {
        SoftmaxOp {
            base: OpBase::new(name, OpType::Softmax, 1),
            _backend: PhantomData,
        }
    }
}

impl<B: Backend> Operator<B> for SoftmaxOp<B> {
    fn base(&self) -> &OpBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OpBase {
        &mut self.base
    }

    fn input_layouts(&self) -> DataLayoutSet {
        SOFTMAX_LAYOUTS
    }

    fn output_layouts(&self) -> DataLayoutSet {
        SOFTMAX_LAYOUTS
    }

    fn run(&self, backend: &B, input: &Tensor, output: &mut Tensor) -> Result<()> {
        backend.softmax(input, output)
    }
}
