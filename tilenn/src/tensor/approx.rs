use crate::tensor::Tensor;
use approx::{AbsDiffEq, RelativeEq};
use std::iter::zip;

impl AbsDiffEq for Tensor {
    type Epsilon = f32;

    fn default_epsilon() -> Self::Epsilon {
        f32::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Tensor, epsilon: Self::Epsilon) -> bool {
        self.shape() == other.shape()
            && zip(self.to_f32_vec(), other.to_f32_vec()).all(|(a, b)| f32::abs_diff_eq(&a, &b, epsilon))
    }
}

impl RelativeEq for Tensor {
    fn default_max_relative() -> Self::Epsilon {
        f32::default_max_relative()
    }

    fn relative_eq(&self, other: &Tensor, epsilon: Self::Epsilon, max_relative: Self::Epsilon) -> bool {
        self.shape() == other.shape()
            && zip(self.to_f32_vec(), other.to_f32_vec())
                .all(|(a, b)| f32::relative_eq(&a, &b, epsilon, max_relative))
    }
}
