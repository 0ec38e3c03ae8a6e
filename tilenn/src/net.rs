use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::ops::{ConcreteOp, OpSummary, Operator};
use crate::profiling::{ProfileSpan, Profiler};
use crate::workspace::{TensorId, Workspace};
use std::fmt::{Debug, Display, Formatter};

/// Index of an operator within its [`Network`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct OpId(usize);

impl OpId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Operators executed in insertion order on one backend.
///
/// Operators exchange data only through workspace tensors: connecting two
/// operators binds the producer's output handle as the consumer's input.
pub struct Network<B: Backend> {
    backend: B,
    ops: Vec<ConcreteOp<B>>,
}

impl<B: Backend> Network<B> {
    pub fn new(backend: B) -> Self {
        Network {
            backend,
            ops: Vec::new(),
        }
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn add_operator<O: Into<ConcreteOp<B>>>(&mut self, op: O) -> OpId {
        let id = OpId(self.ops.len());
        self.ops.push(op.into());
        id
    }

    pub fn op(&self, id: OpId) -> Result<&ConcreteOp<B>> {
        self.ops
            .get(id.0)
            .ok_or_else(|| Error::InvalidParameter {
                op: format!("op #{}", id.0),
                detail: "no such operator".to_owned(),
            })
    }

    fn op_mut(&mut self, id: OpId) -> Result<&mut ConcreteOp<B>> {
        self.ops
            .get_mut(id.0)
            .ok_or_else(|| Error::InvalidParameter {
                op: format!("op #{}", id.0),
                detail: "no such operator".to_owned(),
            })
    }

    pub fn bind_input(&mut self, op: OpId, index: usize, tensor: TensorId) -> Result<()> {
        self.op_mut(op)?.base_mut().bind_input(index, tensor)
    }

    /// Feeds the output of `from` into input `index` of `to`.
    ///
    /// `from` must already be materialized.
    pub fn connect(&mut self, from: OpId, to: OpId, index: usize) -> Result<()> {
        let producer = self.op(from)?;
        let output = producer
            .base()
            .output()
            .ok_or_else(|| Error::NotMaterialized(producer.name().to_owned()))?;
        self.bind_input(to, index, output)
    }

    /// Infers the shape of `op` and creates or reuses its output tensor.
    pub fn materialize(&mut self, op: OpId, ws: &mut Workspace) -> Result<TensorId> {
        self.op_mut(op)?.create_output_tensors(ws)
    }

    pub fn output(&self, op: OpId) -> Option<TensorId> {
        self.ops.get(op.0).and_then(|op| op.base().output())
    }

    /// Runs every operator in insertion order, bracketing each with `profiler`.
    pub fn run(&self, ws: &mut Workspace, profiler: &dyn Profiler) -> Result<()> {
        for (layer, op) in self.ops.iter().enumerate() {
            let _span = ProfileSpan::new(profiler, op.name(), layer);
            op.execute(&self.backend, ws)?;
        }
        Ok(())
    }

    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            ops: self.ops.iter().map(|op| op.summary()).collect(),
        }
    }
}

impl<B: Backend> Debug for Network<B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("backend", &self.backend)
            .field("ops", &self.ops)
            .finish()
    }
}

/// Per-operator summary lines of a [`Network`].
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkSummary {
    pub ops: Vec<OpSummary>,
}

impl Display for NetworkSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=========================================")?;
        writeln!(f, "Layer (Type)\t\tOutput shape")?;
        writeln!(f, "=========================================")?;
        for op in &self.ops {
            writeln!(f, "{op}")?;
            writeln!(f, "_________________________________________")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::activation::ActivationFn;
    use crate::backend::CpuBackend;
    use crate::dtype::DataType;
    use crate::ops::{PoolingOp, UnaryOp};
    use crate::profiling::{NoopProfiler, ProfileLog};
    use crate::tensor::{DataLayout, Tensor, TensorShape};

    #[test]
    fn test_connect_requires_materialized_producer() {
        let mut net = Network::new(CpuBackend::new());
        let a = net.add_operator(UnaryOp::new("a", ActivationFn::ReLU));
        let b = net.add_operator(UnaryOp::new("b", ActivationFn::Tanh));
        assert!(matches!(net.connect(a, b, 0), Err(Error::NotMaterialized(name)) if name == "a"));
    }

    #[test]
    fn test_run_unmaterialized_fails() {
        let mut ws = Workspace::new();
        let input = ws
            .add_tensor(Tensor::zeroed("in", TensorShape::new([4], DataLayout::X), DataType::Float32))
            .unwrap();
        let mut net = Network::new(CpuBackend::new());
        let op = net.add_operator(UnaryOp::new("relu", ActivationFn::ReLU));
        net.bind_input(op, 0, input).unwrap();
        let log = ProfileLog::new();
        assert!(matches!(net.run(&mut ws, &log), Err(Error::NotMaterialized(_))));
        // the span still closed
        assert_eq!(log.open_entries(), 0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_summary_lines() {
        let mut ws = Workspace::new();
        let input = ws
            .add_tensor(Tensor::zeroed(
                "in",
                TensorShape::new([1, 2, 4, 4], DataLayout::NCHW),
                DataType::Float32,
            ))
            .unwrap();
        let mut net = Network::new(CpuBackend::new());
        let pool = net.add_operator(PoolingOp::max("pool0", 2, 2));
        let act = net.add_operator(UnaryOp::new("act0", ActivationFn::Sigmoid));
        net.bind_input(pool, 0, input).unwrap();
        net.materialize(pool, &mut ws).unwrap();
        net.connect(pool, act, 0).unwrap();

        let summary = net.summary();
        assert_eq!(summary.ops[0].to_string(), "pool0 (MaxPooling)\t\t(1, 2, 2, 2)");
        assert_eq!(summary.ops[1].to_string(), "act0 (Sigmoid)\t\t(unknown)");
        net.run(&mut ws, &NoopProfiler).unwrap_err();
        net.materialize(act, &mut ws).unwrap();
        net.run(&mut ws, &NoopProfiler).unwrap();
        assert!(net.summary().to_string().contains("act0 (Sigmoid)\t\t(1, 2, 2, 2)"));
    }
}
