use approx::assert_abs_diff_eq;
use tilenn::activation::ActivationFn;
use tilenn::backend::{Backend, CpuBackend, PackedBackend};
use tilenn::codec::F16_RELATIVE_ERROR;
use tilenn::dtype::DataType;
use tilenn::net::Network;
use tilenn::ops::{Operator, PoolingOp, SoftmaxOp, UnaryOp};
use tilenn::profiling::{CSV_HEADER, NoopProfiler, ProfileLog};
use tilenn::tensor::{DataLayout, Tensor, TensorShape};
use tilenn::workspace::Workspace;
use tilenn::Error;

fn ramp(name: &str, shape: TensorShape) -> Tensor {
    let data = (0..shape.storage_size()).map(|i| i as f32 * 0.25 - 3.0).collect();
    Tensor::from_vec(name, shape, data).unwrap()
}

#[test]
fn pool_activation_chain() {
    let mut ws = Workspace::new();
    let input = ws
        .add_tensor(ramp("input", TensorShape::new([1, 2, 4, 4], DataLayout::NCHW)))
        .unwrap();
    let mut net = Network::new(CpuBackend::new());
    let pool = net.add_operator(PoolingOp::max("pool", 2, 2));
    let relu = net.add_operator(UnaryOp::new("relu", ActivationFn::ReLU));
    net.bind_input(pool, 0, input).unwrap();
    net.materialize(pool, &mut ws).unwrap();
    net.connect(pool, relu, 0).unwrap();
    let out = net.materialize(relu, &mut ws).unwrap();
    net.run(&mut ws, &NoopProfiler).unwrap();

    let out = ws.get_tensor(out).unwrap();
    assert_eq!(out.shape().dims(), &[1, 2, 2, 2]);
    // window maxima sit at flat indices 5, 7, 13, 15 and 21, 23, 29, 31
    let expected = [0.0, 0.0, 0.25, 0.75, 2.25, 2.75, 4.25, 4.75];
    assert_eq!(out.as_f32().unwrap(), &expected);
}

#[test]
fn softmax_after_activation() {
    let mut ws = Workspace::new();
    let input = ws
        .add_tensor(ramp("logits", TensorShape::new([3, 5], DataLayout::NC)))
        .unwrap();
    let mut net = Network::new(CpuBackend::new());
    let act = net.add_operator(UnaryOp::new("elu", ActivationFn::ELU { alpha: 1.0 }));
    let softmax = net.add_operator(SoftmaxOp::new("softmax"));
    net.bind_input(act, 0, input).unwrap();
    net.materialize(act, &mut ws).unwrap();
    net.connect(act, softmax, 0).unwrap();
    let out = net.materialize(softmax, &mut ws).unwrap();
    net.run(&mut ws, &NoopProfiler).unwrap();

    let values = ws.get_tensor(out).unwrap().as_f32().unwrap();
    for row in values.chunks(5) {
        assert_abs_diff_eq!(row.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        assert!(row.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn materialize_reuses_output() {
    let mut ws = Workspace::new();
    let input = ws
        .add_tensor(ramp("input", TensorShape::new([8], DataLayout::X)))
        .unwrap();
    let mut net = Network::new(CpuBackend::new());
    let op = net.add_operator(UnaryOp::new("tanh", ActivationFn::Tanh));
    net.bind_input(op, 0, input).unwrap();
    let first = net.materialize(op, &mut ws).unwrap();
    let second = net.materialize(op, &mut ws).unwrap();
    assert_eq!(first, second);
    assert_eq!(ws.len(), 2);
}

#[test]
fn rebinding_replaces_output_in_place() {
    let mut ws = Workspace::new();
    let small = ws
        .add_tensor(ramp("small", TensorShape::new([1, 1, 4, 4], DataLayout::NCHW)))
        .unwrap();
    let large = ws
        .add_tensor(ramp("large", TensorShape::new([1, 1, 8, 8], DataLayout::NCHW)))
        .unwrap();
    let mut net = Network::new(CpuBackend::new());
    let pool = net.add_operator(PoolingOp::average("pool", 2, 2));
    net.bind_input(pool, 0, small).unwrap();
    let out = net.materialize(pool, &mut ws).unwrap();
    assert_eq!(ws.get_tensor(out).unwrap().shape().dims(), &[1, 1, 2, 2]);

    net.bind_input(pool, 0, large).unwrap();
    // the stale output is rejected until the operator is materialized again
    assert!(matches!(net.run(&mut ws, &NoopProfiler), Err(Error::NotMaterialized(_))));
    assert_eq!(net.materialize(pool, &mut ws).unwrap(), out);
    assert_eq!(ws.get_tensor(out).unwrap().shape().dims(), &[1, 1, 4, 4]);
    assert_eq!(ws.len(), 3);
    net.run(&mut ws, &NoopProfiler).unwrap();
}

fn pool_then_sigmoid<B: Backend>(backend: B, input: Tensor) -> Vec<f32> {
    let mut ws = Workspace::new();
    let input = ws.add_tensor(input).unwrap();
    let mut net = Network::new(backend);
    let pool = net.add_operator(PoolingOp::max("pool", 2, 2));
    let act = net.add_operator(UnaryOp::new("act", ActivationFn::Sigmoid));
    net.bind_input(pool, 0, input).unwrap();
    net.materialize(pool, &mut ws).unwrap();
    net.connect(pool, act, 0).unwrap();
    let out = net.materialize(act, &mut ws).unwrap();
    net.run(&mut ws, &NoopProfiler).unwrap();
    ws.get_tensor(out).unwrap().to_f32_vec()
}

#[test]
fn packed_network_matches_cpu() {
    // quarter steps are exact in half precision, so only outputs are rounded
    let reference = ramp("input", TensorShape::new([1, 4, 4, 8], DataLayout::BlockedNHWC));
    let expected = pool_then_sigmoid(CpuBackend::new(), reference.clone());
    let actual = pool_then_sigmoid(PackedBackend::new(), reference.converted(DataType::PackedFloat16));
    assert_eq!(expected.len(), actual.len());
    for (e, a) in expected.iter().zip(&actual) {
        assert_abs_diff_eq!(e, a, epsilon = F16_RELATIVE_ERROR + 1e-6);
    }
}

#[test]
fn packed_softmax_is_unsupported() {
    let mut ws = Workspace::new();
    let input = ws
        .add_tensor(ramp("logits", TensorShape::new([2, 4], DataLayout::NC)).converted(DataType::PackedFloat16))
        .unwrap();
    let mut net = Network::new(PackedBackend::new());
    let softmax = net.add_operator(SoftmaxOp::new("softmax"));
    net.bind_input(softmax, 0, input).unwrap();
    net.materialize(softmax, &mut ws).unwrap();
    assert!(matches!(
        net.run(&mut ws, &NoopProfiler),
        Err(Error::Unsupported { op: "softmax", .. })
    ));
}

#[test]
fn dtype_mismatch_is_rejected() {
    let mut ws = Workspace::new();
    let input = ws
        .add_tensor(ramp("input", TensorShape::new([4], DataLayout::X)))
        .unwrap();
    let mut net = Network::new(PackedBackend::new());
    let op = net.add_operator(UnaryOp::new("relu", ActivationFn::ReLU));
    net.bind_input(op, 0, input).unwrap();
    assert!(matches!(net.materialize(op, &mut ws), Err(Error::DTypeMismatch { .. })));
}

#[test]
fn pool_larger_than_input_is_rejected() {
    let mut ws = Workspace::new();
    let input = ws
        .add_tensor(ramp("input", TensorShape::new([1, 1, 3, 3], DataLayout::NCHW)))
        .unwrap();
    let mut net = Network::new(CpuBackend::new());
    let pool = net.add_operator(PoolingOp::max("pool", 4, 1));
    net.bind_input(pool, 0, input).unwrap();
    assert!(matches!(net.materialize(pool, &mut ws), Err(Error::InvalidParameter { .. })));
    assert!(net.op(pool).unwrap().base().output().is_none());
}

#[test]
fn profiling_log_per_op() {
    let mut ws = Workspace::new();
    let input = ws
        .add_tensor(ramp("input", TensorShape::new([2, 6], DataLayout::NC)))
        .unwrap();
    let mut net = Network::new(CpuBackend::new());
    let act = net.add_operator(UnaryOp::new("lrelu", ActivationFn::LReLU { alpha: 0.2 }));
    let softmax = net.add_operator(SoftmaxOp::new("softmax"));
    net.bind_input(act, 0, input).unwrap();
    net.materialize(act, &mut ws).unwrap();
    net.connect(act, softmax, 0).unwrap();
    net.materialize(softmax, &mut ws).unwrap();

    let log = ProfileLog::new();
    net.run(&mut ws, &log).unwrap();
    net.run(&mut ws, &log).unwrap();
    assert_eq!(log.len(), 4);
    assert_eq!(log.open_entries(), 0);
    let entries = log.entries();
    assert_eq!((entries[0].label.as_str(), entries[0].layer, entries[0].invocation), ("softmax", 1, 1));
    assert_eq!((entries[3].label.as_str(), entries[3].layer, entries[3].invocation), ("lrelu", 0, 0));

    let mut csv = Vec::new();
    log.write_csv(&mut csv).unwrap();
    let csv = String::from_utf8(csv).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER));
    assert!(lines.next().unwrap().starts_with("1,softmax,1,"));
    assert_eq!(lines.count(), 3);
}

#[test]
fn summary_lists_every_op() {
    let mut ws = Workspace::new();
    let input = ws
        .add_tensor(ramp("input", TensorShape::new([1, 3, 6, 6], DataLayout::NCHW)))
        .unwrap();
    let mut net = Network::new(CpuBackend::new());
    let pool = net.add_operator(PoolingOp::average("pool", 3, 3));
    let act = net.add_operator(UnaryOp::new("selu", ActivationFn::SELU));
    net.bind_input(pool, 0, input).unwrap();
    net.materialize(pool, &mut ws).unwrap();
    net.connect(pool, act, 0).unwrap();
    net.materialize(act, &mut ws).unwrap();

    let text = net.summary().to_string();
    assert!(text.contains("pool (AveragePooling)\t\t(1, 3, 2, 2)"));
    assert!(text.contains("selu (SELU)\t\t(1, 3, 2, 2)"));
    assert_eq!(net.op(act).unwrap().name(), "selu");
}
