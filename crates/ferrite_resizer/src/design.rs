//! The design under repair and its external collaborators.

use ferrite_common::units::{FEMTO, MICRON};
use ferrite_config::CornerConfig;
use ferrite_liberty::{Corner, Library};
use ferrite_netlist::{Legalizer, Netlist};
use ferrite_timing::{EstimatedTiming, TimingEngine};

/// A netlist bound to its library, analysis corners, timing engine, and
/// optional legalizer.
pub struct Design {
    /// The netlist being edited.
    pub netlist: Netlist,
    /// The cell library.
    pub library: Library,
    /// Analysis corners, never empty.
    pub corners: Vec<Corner>,
    /// Timing engine queried for loads, slews, and slacks.
    pub sta: Box<dyn TimingEngine>,
    /// Legalizer used when parasitics come from routing.
    pub legalizer: Option<Box<dyn Legalizer>>,
}

impl Design {
    /// Binds `netlist` to `library` with one nominal corner and the
    /// built-in estimated timing engine.
    pub fn new(netlist: Netlist, library: Library) -> Self {
        Self {
            netlist,
            library,
            corners: vec![Corner::nominal()],
            sta: Box::new(EstimatedTiming::new()),
            legalizer: None,
        }
    }

    /// Replaces the corner list. An empty list keeps the nominal corner.
    pub fn with_corners(mut self, corners: Vec<Corner>) -> Self {
        if !corners.is_empty() {
            self.corners = corners
                .into_iter()
                .enumerate()
                .map(|(index, corner)| Corner { index, ..corner })
                .collect();
        }
        self
    }

    /// Replaces the timing engine.
    pub fn with_timing(mut self, sta: Box<dyn TimingEngine>) -> Self {
        self.sta = sta;
        self
    }

    /// Installs a legalizer.
    pub fn with_legalizer(mut self, legalizer: Box<dyn Legalizer>) -> Self {
        self.legalizer = Some(legalizer);
        self
    }

    /// The corner at `index`, or the first corner if out of range.
    pub fn corner(&self, index: usize) -> &Corner {
        self.corners.get(index).unwrap_or(&self.corners[0])
    }
}

/// Converts configured corners (ohm/um, fF/um) to SI corners.
pub fn corners_from_config(configs: &[CornerConfig]) -> Vec<Corner> {
    configs
        .iter()
        .enumerate()
        .map(|(index, c)| {
            Corner::new(&c.name, index)
                .with_scales(c.delay_scale, c.slew_scale)
                .with_wire_rc(c.wire_res_per_um / MICRON, c.wire_cap_ff_per_um * FEMTO / MICRON)
        })
        .collect()
}
