mod backend;
pub mod lookup;
pub mod math;
pub mod pooling;

pub use backend::CpuBackend;
