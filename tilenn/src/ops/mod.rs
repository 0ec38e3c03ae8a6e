mod concrete;
mod pooling;
mod softmax;
mod unary;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::tensor::{DataLayoutSet, Tensor, TensorShape};
use crate::workspace::{TensorId, Workspace};
use std::fmt::{Debug, Display, Formatter};

pub use concrete::ConcreteOp;
pub use pooling::{PoolKind, PoolParams, PoolingOp};
pub use softmax::SoftmaxOp;
pub use unary::UnaryOp;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpType {
    MaxPooling,
    AveragePooling,
    ReLU,
    LReLU,
    ELU,
    SELU,
    Tanh,
    Sigmoid,
    Softmax,
}

impl OpType {
    pub const fn as_str(self) -> &'static str {
        match self {
            OpType::MaxPooling => "MaxPooling",
            OpType::AveragePooling => "AveragePooling",
            OpType::ReLU => "ReLU",
            OpType::LReLU => "LReLU",
            OpType::ELU => "ELU",
            OpType::SELU => "SELU",
            OpType::Tanh => "Tanh",
            OpType::Sigmoid => "Sigmoid",
            OpType::Softmax => "Softmax",
        }
    }
}

impl Display for OpType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of an operator's output.
///
/// Binding an input always drops back to `Unbound`; the output handle, if
/// any, is kept so the next materialization reuses or replaces it in place.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum OpState {
    Unbound,
    ShapeKnown,
    Materialized,
}

/// Data shared by every operator: identity, input bindings and output slot.
#[derive(Clone, Debug)]
pub struct OpBase {
    name: String,
    op_type: OpType,
    inputs: Vec<Option<TensorId>>,
    output: Option<TensorId>,
    output_shape: Option<TensorShape>,
    state: OpState,
}

impl OpBase {
    pub fn new<S: Into<String>>(name: S, op_type: OpType, num_inputs: usize) -> Self {
        OpBase {
            name: name.into(),
            op_type,
            inputs: vec![None; num_inputs],
            output: None,
            output_shape: None,
            state: OpState::Unbound,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn op_type(&self) -> OpType {
        self.op_type
    }

    #[inline]
    pub fn state(&self) -> OpState {
        self.state
    }

    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Output handle once the operator has been materialized at least once.
    #[inline]
    pub fn output(&self) -> Option<TensorId> {
        self.output
    }

    #[inline]
    pub fn output_shape(&self) -> Option<&TensorShape> {
        self.output_shape.as_ref()
    }

    pub fn input(&self, index: usize) -> Result<TensorId> {
        self.inputs
            .get(index)
            .copied()
            .flatten()
            .ok_or_else(|| Error::MissingInput {
                op: self.name.clone(),
                index,
            })
    }

    pub fn bind_input(&mut self, index: usize, tensor: TensorId) -> Result<()> {
        let expected = self.inputs.len();
        let slot = self.inputs.get_mut(index).ok_or_else(|| Error::InvalidArity {
            op: self.name.clone(),
            expected,
            actual: index + 1,
        })?;
        *slot = Some(tensor);
        self.output_shape = None;
        self.state = OpState::Unbound;
        Ok(())
    }
}

/// One line of a network summary: `name (Kind)\t\t(dims)`.
#[derive(Clone, Debug, PartialEq)]
pub struct OpSummary {
    pub name: String,
    pub op_type: OpType,
    pub output_shape: Option<TensorShape>,
}

impl Display for OpSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})\t\t", self.name, self.op_type)?;
        match &self.output_shape {
            Some(shape) => Display::fmt(shape, f),
            None => f.write_str("(unknown)"),
        }
    }
}

/// A graph node computing one output tensor from bound input tensors.
///
/// Implementors provide the layout sets, any parameter checks, the output
/// shape when it differs from the first input, and the kernel call. The
/// provided methods drive the `Unbound -> ShapeKnown -> Materialized` cycle.
pub trait Operator<B: Backend>: Debug {
    fn base(&self) -> &OpBase;
    fn base_mut(&mut self) -> &mut OpBase;

    /// Layouts accepted on every input.
    fn input_layouts(&self) -> DataLayoutSet;
    /// Layouts the output may be produced in.
    fn output_layouts(&self) -> DataLayoutSet;

    /// Operator-specific checks run after the generic ones in [`Operator::validate`].
    fn validate_params(&self, _ws: &Workspace) -> Result<()> {
        Ok(())
    }

    /// Output shape for the currently bound inputs; the first input's shape by default.
    fn infer_output_shape(&self, ws: &Workspace) -> Result<TensorShape> {
        let input = ws.get_tensor(self.base().input(0)?)?;
        Ok(input.shape().clone())
    }

    /// Runs the kernel. Only called on a materialized operator.
    fn run(&self, backend: &B, input: &Tensor, output: &mut Tensor) -> Result<()>;

    fn name(&self) -> &str {
        self.base().name()
    }

    fn op_type(&self) -> OpType {
        self.base().op_type()
    }

    fn validate(&self, ws: &Workspace) -> Result<()> {
        let result = validate_inputs::<B, Self>(self, ws).and_then(|_| self.validate_params(ws));
        if let Err(err) = &result {
            tracing::debug!("validation of '{}' failed: {err}", self.name());
        }
        result
    }

    /// Validates and infers the output shape, entering `ShapeKnown`.
    ///
    /// Repeating the call with unchanged inputs yields the same shape and
    /// does not leave `Materialized`.
    fn infer_shape(&mut self, ws: &Workspace) -> Result<TensorShape> {
        self.validate(ws)?;
        let shape = self.infer_output_shape(ws)?;
        let produced = self.output_layouts();
        if !produced.contains(shape.layout()) {
            return Err(Error::UnsupportedLayout {
                op: self.name().to_owned(),
                layout: shape.layout(),
                supported: produced,
            });
        }
        let base = self.base_mut();
        let unchanged = base.output_shape.as_ref() == Some(&shape);
        if !(unchanged && base.state == OpState::Materialized) {
            base.state = OpState::ShapeKnown;
        }
        base.output_shape = Some(shape.clone());
        Ok(shape)
    }

    /// Creates the output tensor, or reuses the existing one.
    ///
    /// An existing output of the inferred shape is returned untouched; one
    /// of a stale shape is replaced under the same handle.
    fn create_output_tensors(&mut self, ws: &mut Workspace) -> Result<TensorId> {
        let shape = self.infer_shape(ws)?;
        let existing = match self.base().output {
            Some(id) => Some((id, ws.get_tensor(id)?.shape() == &shape)),
            None => None,
        };
        let id = match existing {
            Some((id, true)) => {
                tracing::debug!("'{}' reuses output {id}", self.name());
                id
            }
            Some((id, false)) => {
                ws.replace_tensor(id, Tensor::zeroed(self.name(), shape, B::DATA_TYPE))?;
                id
            }
            None => {
                let id = ws.add_tensor(Tensor::zeroed(self.name(), shape, B::DATA_TYPE))?;
                tracing::debug!("'{}' materialized output {id}", self.name());
                id
            }
        };
        let base = self.base_mut();
        base.output = Some(id);
        base.state = OpState::Materialized;
        Ok(id)
    }

    /// Runs the kernel over the workspace tensors.
    fn execute(&self, backend: &B, ws: &mut Workspace) -> Result<()> {
        let base = self.base();
        let output = match (base.state, base.output) {
            (OpState::Materialized, Some(id)) => id,
            _ => return Err(Error::NotMaterialized(base.name.clone())),
        };
        let expected = self.infer_output_shape(ws)?;
        let (input, output) = ws.io(base.input(0)?, output)?;
        if output.shape() != &expected {
            return Err(Error::ShapeMismatch {
                op: base.name.clone(),
                lhs: expected,
                rhs: output.shape().clone(),
            });
        }
        self.run(backend, input, output)
    }

    /// Describes the operator without touching the workspace.
    fn summary(&self) -> OpSummary {
        let base = self.base();
        OpSummary {
            name: base.name.clone(),
            op_type: base.op_type,
            output_shape: base.output_shape.clone(),
        }
    }
}

fn validate_inputs<B: Backend, O: Operator<B> + ?Sized>(op: &O, ws: &Workspace) -> Result<()> {
    let accepted = op.input_layouts();
    for index in 0..op.base().num_inputs() {
        let tensor = ws.get_tensor(op.base().input(index)?)?;
        if !accepted.contains(tensor.layout()) {
            return Err(Error::UnsupportedLayout {
                op: op.name().to_owned(),
                layout: tensor.layout(),
                supported: accepted,
            });
        }
        if tensor.data_type() != B::DATA_TYPE {
            return Err(Error::DTypeMismatch {
                tensor: tensor.name().to_owned(),
                expected: B::DATA_TYPE,
                actual: tensor.data_type(),
            });
        }
    }
    Ok(())
}
