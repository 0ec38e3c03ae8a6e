#[cfg(feature = "approx")]
mod approx;
mod debug;
mod layout;
mod shape;
#[allow(clippy::module_inception)]
mod tensor;
mod view;

pub use layout::{BLOCK_WIDTH, DataLayout, DataLayoutSet};
pub use shape::TensorShape;
pub use tensor::{Tensor, TensorData};
pub use view::{StridedView, StridedViewMut, contiguous_strides};
