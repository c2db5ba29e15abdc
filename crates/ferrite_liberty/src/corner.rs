//! Analysis corners.

use serde::{Deserialize, Serialize};

/// A process/voltage/temperature corner together with its wire RC.
///
/// Library tables are characterized once; each corner scales cell delays and
/// output slews, and supplies the per-meter wire resistance and capacitance
/// used for estimated parasitics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corner {
    /// Corner name.
    pub name: String,
    /// Position in the design's corner list.
    pub index: usize,
    /// Multiplier applied to cell delays.
    pub delay_scale: f64,
    /// Multiplier applied to output slews.
    pub slew_scale: f64,
    /// Wire resistance in ohms per meter.
    pub wire_res_per_m: f64,
    /// Wire capacitance in farads per meter.
    pub wire_cap_per_m: f64,
}

impl Corner {
    /// A corner with unit scales and no wire RC.
    pub fn new(name: &str, index: usize) -> Self {
        Self {
            name: name.to_string(),
            index,
            delay_scale: 1.0,
            slew_scale: 1.0,
            wire_res_per_m: 0.0,
            wire_cap_per_m: 0.0,
        }
    }

    /// The single default corner used when none are configured.
    pub fn nominal() -> Self {
        Self::new("nominal", 0)
    }

    /// Sets the delay and slew scales.
    pub fn with_scales(mut self, delay_scale: f64, slew_scale: f64) -> Self {
        self.delay_scale = delay_scale;
        self.slew_scale = slew_scale;
        self
    }

    /// Sets the wire resistance (ohm/m) and capacitance (F/m).
    pub fn with_wire_rc(mut self, res_per_m: f64, cap_per_m: f64) -> Self {
        self.wire_res_per_m = res_per_m;
        self.wire_cap_per_m = cap_per_m;
        self
    }
}
