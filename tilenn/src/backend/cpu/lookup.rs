use super::math::sigmoid;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Inputs beyond `±SIGMOID_TABLE_RANGE` clamp to the table ends.
pub const SIGMOID_TABLE_RANGE: f32 = 16.0;
pub const SIGMOID_TABLE_SIZE: usize = 2049;

static GLOBAL_TABLE: Lazy<Arc<SigmoidTable>> = Lazy::new(|| {
    tracing::debug!(
        "initializing sigmoid lookup tables: range={SIGMOID_TABLE_RANGE} size={SIGMOID_TABLE_SIZE}"
    );
    Arc::new(SigmoidTable::new(SIGMOID_TABLE_RANGE, SIGMOID_TABLE_SIZE))
});

/// The process-wide table, built on first use and read-only afterwards.
pub fn global() -> Arc<SigmoidTable> {
    Arc::clone(&GLOBAL_TABLE)
}

/// Piecewise-linear sigmoid approximations.
///
/// `full` samples `[-range, range]`; `half` samples only `[0, range]` and
/// recovers negative inputs through `sigmoid(-x) = 1 - sigmoid(x)`, giving
/// twice the resolution for the same table size.
#[derive(Clone, Debug)]
pub struct SigmoidTable {
    range: f32,
    full: Box<[f32]>,
    half: Box<[f32]>,
}

impl SigmoidTable {
    pub fn new(range: f32, size: usize) -> Self {
        assert!(range > 0.0 && range.is_finite(), "Invalid table range {range}");
        assert!(size >= 2, "Table needs at least 2 samples, got {size}");
        let last = (size - 1) as f32;
        let full = (0..size)
            .map(|i| sigmoid(-range + 2.0 * range * i as f32 / last))
            .collect();
        let half = (0..size)
            .map(|i| sigmoid(range * i as f32 / last))
            .collect();
        SigmoidTable { range, full, half }
    }

    #[inline]
    pub fn range(&self) -> f32 {
        self.range
    }

    /// Sample spacing of the non-centered table (the centered one is twice as fine).
    pub fn resolution(&self) -> f32 {
        2.0 * self.range / (self.full.len() - 1) as f32
    }

    /// Worst-case absolute error of the non-centered lookup.
    ///
    /// Linear interpolation errs by at most `h² max|σ''| / 8` and
    /// `max|σ''| < 0.1`, plus the tail clamped past `range`.
    pub fn error_bound(&self) -> f32 {
        let h = self.resolution();
        h * h * 0.1 / 8.0 + sigmoid(-self.range) + f32::EPSILON
    }

    pub fn lookup_noncentered(&self, x: f32) -> f32 {
        interpolate(&self.full, (x + self.range) / (2.0 * self.range))
    }

    pub fn lookup_centered(&self, x: f32) -> f32 {
        let y = interpolate(&self.half, x.abs() / self.range);
        if x < 0.0 { 1.0 - y } else { y }
    }
}

/// Linear interpolation of `table` at fraction `t` of its span, clamped to the ends.
#[inline]
fn interpolate(table: &[f32], t: f32) -> f32 {
    let last = table.len() - 1;
    if t.is_nan() {
        return f32::NAN;
    }
    let pos = t.clamp(0.0, 1.0) * last as f32;
    let i = pos as usize;
    if i >= last {
        return table[last];
    }
    let frac = pos - i as f32;
    table[i] + (table[i + 1] - table[i]) * frac
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lookup_error_bounded() {
        let table = global();
        let bound = table.error_bound();
        assert!(bound < 1e-5, "bound {bound}");
        let mut x = -20.0f32;
        while x <= 20.0 {
            let exact = sigmoid(x);
            assert!((table.lookup_noncentered(x) - exact).abs() <= bound, "noncentered at {x}");
            assert!((table.lookup_centered(x) - exact).abs() <= bound, "centered at {x}");
            x += 0.037;
        }
    }

    #[test]
    fn test_endpoints() {
        let table = SigmoidTable::new(4.0, 9);
        assert_eq!(table.lookup_centered(0.0), 0.5);
        assert_eq!(table.lookup_noncentered(0.0), 0.5);
        assert_eq!(table.lookup_noncentered(100.0), sigmoid(4.0));
        assert_eq!(table.lookup_noncentered(-100.0), sigmoid(-4.0));
        assert!(table.lookup_centered(f32::NAN).is_nan());
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&global(), &global()));
    }
}
