use crate::tensor::Tensor;
use std::fmt::{Debug, Formatter, Write};

fn fmt_separated<I, T>(
    iter: &mut I,
    f: &mut Formatter,
    sep: &str,
    fmt: &mut impl FnMut(T, &mut Formatter) -> std::fmt::Result,
    limit: usize,
) -> std::fmt::Result
where
    I: Iterator<Item = T>,
{
    let mut remaining = limit;
    let mut first = true;
    while remaining > 0 {
        let Some(el) = iter.next() else { break };
        if first {
            first = false;
        } else {
            f.write_str(sep)?;
        }
        fmt(el, f)?;
        remaining -= 1;
    }
    Ok(())
}

fn fmt_separated_max<I, T>(
    mut iter: I,
    len: usize,
    max: usize,
    f: &mut Formatter,
    sep: &str,
    fmt: &mut impl FnMut(T, &mut Formatter) -> std::fmt::Result,
) -> std::fmt::Result
where
    I: Iterator<Item = T>,
{
    if len > max {
        let limit = max / 2;
        let to_skip = len - (limit * 2);
        fmt_separated(&mut iter, f, sep, fmt, limit)?;
        f.write_str(sep)?;
        write!(f, "...({to_skip} hidden)")?;
        f.write_str(sep)?;
        iter.nth(to_skip - 1);
        fmt_separated(&mut iter, f, sep, fmt, limit)
    } else {
        fmt_separated(&mut iter, f, sep, fmt, len)
    }
}

const DEBUG_LIMIT_DIM_OUTER: usize = 5;
const DEBUG_LIMIT_DIM_INNER: usize = 10;

/// Prints `data` nested by `dims` (storage order, padding included).
fn fmt_tensor_data(data: &[f32], dims: &[usize], f: &mut Formatter, depth: usize) -> std::fmt::Result {
    f.write_char('[')?;
    if !data.is_empty() {
        match dims {
            [] | [_] => {
                fmt_separated_max(data.iter(), data.len(), DEBUG_LIMIT_DIM_INNER, f, ", ", &mut |el, f| {
                    Debug::fmt(el, f)
                })?
            }
            [first, inner @ ..] => {
                let stride: usize = inner.iter().product();
                let indent = "   ".repeat(depth);
                let sep = format!(",\n{indent}   ");
                write!(f, "\n{indent}   ")?;
                fmt_separated_max(data.chunks(stride.max(1)), *first, DEBUG_LIMIT_DIM_OUTER, f, sep.as_str(), &mut |el, f| {
                    fmt_tensor_data(el, inner, f, depth + 1)
                })?;
                write!(f, "\n{indent}")?;
            }
        }
    }
    f.write_char(']')
}

impl Debug for Tensor {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let shape = self.shape();
        let data = self.to_f32_vec();
        fmt_tensor_data(&data, &shape.storage_dims(), f, 0)?;
        write!(
            f,
            " name={} dtype={} layout={} dims={} len={}",
            self.name(),
            self.data_type(),
            shape.layout(),
            shape,
            data.len()
        )
    }
}
