use crate::tensor::{DataLayout, Tensor, TensorShape};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

pub const SIZE_LG: usize = 128;
pub const SIZE_MD: usize = 64;
pub const SIZE_SM: usize = 16;
const SEED: u64 = 0x8371943;

/// Normally distributed `f32` tensor with a fixed seed.
pub fn random_tensor(name: &str, shape: TensorShape) -> Tensor {
    let mut rng = StdRng::seed_from_u64(SEED);
    Tensor::from_distribution(name, shape, &mut rng, StandardNormal)
}

/// `1 x size x size x 32` feature map in the blocked layout.
pub fn feature_map(size: usize) -> Tensor {
    random_tensor("features", TensorShape::new([1, size, size, 32], DataLayout::BlockedNHWC))
}

/// `batch x classes` logits.
pub fn logits(batch: usize, classes: usize) -> Tensor {
    random_tensor("logits", TensorShape::new([batch, classes], DataLayout::NC))
}
