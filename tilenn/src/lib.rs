//! Layout-aware neural network kernels and a small operator graph.
//!
//! Tensors live in a [`workspace::Workspace`] and are addressed by handle.
//! Operators infer their output shape from their bound inputs, materialize
//! an output tensor once, and dispatch to a [`backend::Backend`] kernel on
//! every run. Two backends are provided: [`backend::CpuBackend`] over `f32`
//! storage and [`backend::PackedBackend`] over packed half precision pairs.

pub mod activation;
pub mod backend;
pub mod codec;
pub mod config;
pub mod dtype;
pub mod error;
pub mod net;
pub mod ops;
pub mod profiling;
pub mod tensor;
pub mod util;
pub mod workspace;

pub use error::{Error, Result};
