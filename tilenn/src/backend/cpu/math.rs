use num_traits::{Float, NumCast};
use std::iter::zip;

pub const SELU_ALPHA: f64 = 1.6732632423543772;
pub const SELU_LAMBDA: f64 = 1.0507009873554805;

#[inline]
fn cast<T: Float>(v: f64) -> T {
    <T as NumCast>::from(v).unwrap_or_else(T::nan)
}

#[inline]
pub fn relu<T: Float>(x: T) -> T {
    if x < T::zero() { T::zero() } else { x }
}

#[inline]
pub fn leaky_relu<T: Float>(x: T, alpha: T) -> T {
    if x < T::zero() { alpha * x } else { x }
}

#[inline]
pub fn elu<T: Float>(x: T, alpha: T) -> T {
    if x > T::zero() { x } else { alpha * x.exp_m1() }
}

#[inline]
pub fn selu<T: Float>(x: T) -> T {
    cast::<T>(SELU_LAMBDA) * elu(x, cast(SELU_ALPHA))
}

#[inline]
pub fn sigmoid<T: Float>(x: T) -> T {
    T::one() / (T::one() + (-x).exp())
}

/// `tanh(x) = 2 * sigmoid(2x) - 1`, the form the packed path evaluates.
#[inline]
pub fn tanh_via_sigmoid<T: Float>(x: T) -> T {
    let two = T::one() + T::one();
    two * sigmoid(two * x) - T::one()
}

/// Writes `f(x)` for every element of `input` into `output`.
#[inline]
pub fn map_into<T: Copy>(input: &[T], output: &mut [T], f: impl Fn(T) -> T) {
    assert_eq!(input.len(), output.len(), "Mismatched input and output length");
    for (o, &x) in zip(output, input) {
        *o = f(x);
    }
}

/// Row-wise softmax over `rows` rows of `cols` values, each row followed by
/// `pad` unused columns that are left untouched in `output`.
///
/// Each row is shifted by its maximum before exponentiation and scaled by
/// `1 / (sum + epsilon)`.
pub fn softmax_rows<T: Float>(input: &[T], output: &mut [T], rows: usize, cols: usize, pad: usize, epsilon: T) {
    let stride = cols + pad;
    let required = if rows == 0 { 0 } else { (rows - 1) * stride + cols };
    assert!(input.len() >= required, "Input too short for {rows}x{cols} (+{pad})");
    assert!(output.len() >= required, "Output too short for {rows}x{cols} (+{pad})");
    if cols == 0 {
        return;
    }
    for row in 0..rows {
        let start = row * stride;
        let in_row = &input[start..start + cols];
        let out_row = &mut output[start..start + cols];
        let max = in_row.iter().fold(T::neg_infinity(), |m, &x| m.max(x));
        let mut sum = T::zero();
        for (o, &x) in zip(out_row.iter_mut(), in_row) {
            let e = (x - max).exp();
            sum = sum + e;
            *o = e;
        }
        let scale = T::one() / (sum + epsilon);
        for o in out_row.iter_mut() {
            *o = *o * scale;
        }
    }
}
