//! Non-linear delay model (NLDM) lookup tables.

use serde::{Deserialize, Serialize};

/// A two-dimensional lookup table indexed by input slew and output load.
///
/// Axis values and table entries are SI (seconds, farads). Lookups inside the
/// axes interpolate bilinearly; lookups outside extrapolate linearly from the
/// nearest edge interval so the result keeps growing with load, which the
/// target-load bisection relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NldmTable {
    /// Input slew axis values, ascending.
    pub input_slew_axis: Vec<f64>,
    /// Output load axis values, ascending.
    pub output_load_axis: Vec<f64>,
    /// Table values, `values[slew_idx][load_idx]`.
    pub values: Vec<Vec<f64>>,
}

impl NldmTable {
    /// Creates a table from explicit axes and values.
    pub fn new(input_slew_axis: Vec<f64>, output_load_axis: Vec<f64>, values: Vec<Vec<f64>>) -> Self {
        Self {
            input_slew_axis,
            output_load_axis,
            values,
        }
    }

    /// Creates a constant table.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![0.0], vec![0.0], vec![vec![value]])
    }

    /// Samples `f(slew, load)` on the given axes.
    pub fn from_fn(
        input_slew_axis: Vec<f64>,
        output_load_axis: Vec<f64>,
        f: impl Fn(f64, f64) -> f64,
    ) -> Self {
        let values = input_slew_axis
            .iter()
            .map(|&s| output_load_axis.iter().map(|&c| f(s, c)).collect())
            .collect();
        Self::new(input_slew_axis, output_load_axis, values)
    }

    /// Returns `true` if axis lengths and the value matrix agree.
    pub fn is_well_formed(&self) -> bool {
        !self.input_slew_axis.is_empty()
            && !self.output_load_axis.is_empty()
            && self.values.len() == self.input_slew_axis.len()
            && self
                .values
                .iter()
                .all(|row| row.len() == self.output_load_axis.len())
            && is_ascending(&self.input_slew_axis)
            && is_ascending(&self.output_load_axis)
    }

    /// Looks up a value with bilinear interpolation and linear extrapolation.
    pub fn lookup(&self, input_slew: f64, output_load: f64) -> f64 {
        if self.values.is_empty() || self.values[0].is_empty() {
            return 0.0;
        }
        let (si, sf) = interp_index(&self.input_slew_axis, input_slew);
        let (li, lf) = interp_index(&self.output_load_axis, output_load);

        let at = |s: usize, l: usize| {
            self.values
                .get(s)
                .and_then(|row| row.get(l))
                .copied()
                .unwrap_or(self.values[si][li])
        };
        let v00 = at(si, li);
        let v01 = at(si, li + 1);
        let v10 = at(si + 1, li);
        let v11 = at(si + 1, li + 1);

        let v0 = v00 + (v01 - v00) * lf;
        let v1 = v10 + (v11 - v10) * lf;
        v0 + (v1 - v0) * sf
    }
}

fn is_ascending(axis: &[f64]) -> bool {
    axis.windows(2).all(|w| w[0] < w[1])
}

/// Finds the interval index and fraction for `value`. The fraction falls
/// outside `[0, 1]` when extrapolating past either end of the axis.
fn interp_index(axis: &[f64], value: f64) -> (usize, f64) {
    if axis.len() <= 1 {
        return (0, 0.0);
    }
    let last = axis.len() - 2;
    let idx = axis[1..axis.len() - 1]
        .iter()
        .position(|&a| value < a)
        .unwrap_or(last);
    let (lo, hi) = (axis[idx], axis[idx + 1]);
    (idx, (value - lo) / (hi - lo))
}
