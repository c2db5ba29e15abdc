//! The resizer session context.
//!
//! A [`Resizer`] owns everything that outlives a single command: settings,
//! the parasitics tracker, characterization caches, edit counters, the
//! journal, and the diagnostics emitted so far. The [`Design`] it works on
//! is passed to every operation.

use crate::design::Design;
use crate::journal::{EditHistory, Journal};
use ferrite_common::units::dbu_to_meters;
use ferrite_config::{FerriteConfig, ResizerSettings};
use ferrite_diagnostics::DiagnosticSink;
use ferrite_liberty::{EquivCells, LibCell, LibCellId, Library};
use ferrite_netlist::{InstId, Netlist};
use ferrite_timing::ParasiticsTracker;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Edit counts accumulated over a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EditCounters {
    /// Instances resized.
    pub resized: usize,
    /// Buffers inserted.
    pub inserted_buffers: usize,
    /// Instances cloned.
    pub cloned_gates: usize,
    /// Pin swaps performed.
    pub swapped_pins: usize,
    /// Buffers removed.
    pub removed_buffers: usize,
}

/// Session state for gate sizing and buffering.
pub struct Resizer {
    pub(crate) settings: ResizerSettings,
    pub(crate) tracker: ParasiticsTracker,
    pub(crate) diagnostics: DiagnosticSink,
    pub(crate) equiv_cells: Option<EquivCells>,
    pub(crate) buffer_cells: Vec<LibCellId>,
    pub(crate) target_loads: Option<HashMap<LibCellId, f64>>,
    pub(crate) tgt_slews: [f64; 2],
    pub(crate) tgt_slew_corner: Option<usize>,
    pub(crate) input_slews: HashMap<String, [f64; 2]>,
    pub(crate) counters: EditCounters,
    pub(crate) unique_net_index: usize,
    pub(crate) unique_inst_index: usize,
    pub(crate) design_area: f64,
    pub(crate) max_area: f64,
    pub(crate) buffer_moved_into_core: bool,
    pub(crate) resized_multi_output: HashSet<InstId>,
    pub(crate) journal: Option<Journal>,
    pub(crate) history: EditHistory,
}

impl Resizer {
    /// Starts a session on `design`.
    pub fn new(settings: ResizerSettings, design: &Design) -> Self {
        let mut resizer = Self {
            settings,
            tracker: ParasiticsTracker::new(),
            diagnostics: DiagnosticSink::new(),
            equiv_cells: None,
            buffer_cells: Vec::new(),
            target_loads: None,
            tgt_slews: [0.0; 2],
            tgt_slew_corner: None,
            input_slews: HashMap::new(),
            counters: EditCounters::default(),
            unique_net_index: 1,
            unique_inst_index: 1,
            design_area: design_area(&design.netlist, &design.library),
            max_area: 0.0,
            buffer_moved_into_core: false,
            resized_multi_output: HashSet::new(),
            journal: None,
            history: EditHistory::default(),
        };
        if let Some(util) = resizer.settings.max_utilization {
            resizer.set_max_utilization(design, util);
        }
        resizer
    }

    /// Starts a session with the `[resizer]` section of `config`.
    pub fn from_config(config: &FerriteConfig, design: &Design) -> Self {
        Self::new(config.resizer.clone(), design)
    }

    /// Session settings.
    pub fn settings(&self) -> &ResizerSettings {
        &self.settings
    }

    /// Edit counts so far.
    pub fn counters(&self) -> EditCounters {
        self.counters
    }

    /// Diagnostics emitted so far.
    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.diagnostics
    }

    /// The parasitics invalidation tracker.
    pub fn tracker(&self) -> &ParasiticsTracker {
        &self.tracker
    }

    /// Instances sized, buffered, cloned, or pin-swapped during the session.
    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub(crate) fn is_dont_use(&self, cell: &LibCell) -> bool {
        cell.dont_use || self.settings.is_dont_use(&cell.name)
    }
}

/// Area of a cell's physical master in square meters, 0 without a master.
pub(crate) fn cell_area(netlist: &Netlist, cell: &LibCell) -> f64 {
    cell.master.map_or(0.0, |m| {
        dbu_to_meters(m.width, netlist.dbu_per_micron) * dbu_to_meters(m.height, netlist.dbu_per_micron)
    })
}

/// Sum of master areas of all instances, in square meters.
pub fn design_area(netlist: &Netlist, library: &Library) -> f64 {
    netlist
        .instances()
        .map(|inst| cell_area(netlist, library.cell(inst.cell)))
        .sum()
}
