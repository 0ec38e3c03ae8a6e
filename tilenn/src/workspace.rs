use crate::error::{Error, Result};
use crate::tensor::Tensor;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Handle of a tensor registered in a [`Workspace`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TensorId(usize);

impl TensorId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for TensorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Registry owning every tensor of a graph, keyed by name.
///
/// Tensors are never removed; an operator whose output shape changes swaps
/// the tensor behind its existing handle with [`Workspace::replace_tensor`].
#[derive(Debug, Default)]
pub struct Workspace {
    tensors: Vec<Tensor>,
    names: HashMap<String, TensorId>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn add_tensor(&mut self, tensor: Tensor) -> Result<TensorId> {
        if self.names.contains_key(tensor.name()) {
            return Err(Error::DuplicateTensor(tensor.name().to_owned()));
        }
        let id = TensorId(self.tensors.len());
        tracing::debug!(
            "registered tensor '{}' as {id}: {} {} {}",
            tensor.name(),
            tensor.data_type(),
            tensor.layout(),
            tensor.shape()
        );
        self.names.insert(tensor.name().to_owned(), id);
        self.tensors.push(tensor);
        Ok(id)
    }

    pub fn get_tensor(&self, id: TensorId) -> Result<&Tensor> {
        self.tensors
            .get(id.0)
            .ok_or_else(|| Error::UnknownTensor(id.to_string()))
    }

    pub fn get_tensor_mut(&mut self, id: TensorId) -> Result<&mut Tensor> {
        self.tensors
            .get_mut(id.0)
            .ok_or_else(|| Error::UnknownTensor(id.to_string()))
    }

    pub fn tensor_by_name(&self, name: &str) -> Option<TensorId> {
        self.names.get(name).copied()
    }

    /// Drops the tensor at `id` and installs `tensor` under the same handle.
    ///
    /// The replacement must keep the name of the tensor it replaces.
    pub fn replace_tensor(&mut self, id: TensorId, tensor: Tensor) -> Result<()> {
        let slot = self
            .tensors
            .get_mut(id.0)
            .ok_or_else(|| Error::UnknownTensor(id.to_string()))?;
        if slot.name() != tensor.name() {
            return Err(Error::InvalidParameter {
                op: slot.name().to_owned(),
                detail: format!("replacement tensor is named '{}'", tensor.name()),
            });
        }
        tracing::debug!("replacing tensor '{}' ({id}): {} -> {}", tensor.name(), slot.shape(), tensor.shape());
        *slot = tensor;
        Ok(())
    }

    /// Borrows `input` shared and `output` exclusively at the same time.
    pub fn io(&mut self, input: TensorId, output: TensorId) -> Result<(&Tensor, &mut Tensor)> {
        let len = self.tensors.len();
        for id in [input, output] {
            if id.0 >= len {
                return Err(Error::UnknownTensor(id.to_string()));
            }
        }
        if input == output {
            return Err(Error::InvalidParameter {
                op: self.tensors[input.0].name().to_owned(),
                detail: "operator output aliases its input".to_owned(),
            });
        }
        if input.0 < output.0 {
            let (head, tail) = self.tensors.split_at_mut(output.0);
            Ok((&head[input.0], &mut tail[0]))
        } else {
            let (head, tail) = self.tensors.split_at_mut(input.0);
            Ok((&tail[0], &mut head[output.0]))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (TensorId, &Tensor)> {
        self.tensors.iter().enumerate().map(|(i, t)| (TensorId(i), t))
    }
}
