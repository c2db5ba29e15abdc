//! Target slew and target load characterization.
//!
//! The target slew is what a typical buffer produces when driving ten
//! copies of itself. A cell's target load is the load at which its output
//! slew equals the target slew, averaged over its arcs and edges. Both are
//! computed once per session and dropped when don't-use flags change.

use crate::design::Design;
use crate::error::ResizerError;
use crate::session::Resizer;
use ferrite_liberty::{Corner, GateTableModel, LibCell, LibCellId, Library, RiseFall};
use std::collections::HashMap;

const TARGET_LOAD_MAX_ITERATIONS: usize = 200;
const TARGET_LOAD_TOLERANCE: f64 = 0.01;
const TARGET_LOAD_INITIAL_HIGH: f64 = 1e-12;

impl Resizer {
    /// Builds equivalent cells, the buffer list, target slews, and target
    /// loads if they are not cached yet.
    pub fn resize_preamble(&mut self, design: &mut Design) -> Result<(), ResizerError> {
        design.sta.ensure_levelized(&design.netlist);
        self.ensure_equiv_cells(&design.library);
        self.find_buffers(&design.library)?;
        self.find_target_loads(design)
    }

    pub(crate) fn ensure_equiv_cells(&mut self, library: &Library) {
        if self.equiv_cells.is_none() {
            self.equiv_cells = Some(library.make_equiv_cells());
        }
    }

    /// Collects usable buffers, weakest drive first. Clock buffers are
    /// skipped when the settings exclude them.
    pub fn find_buffers(&mut self, library: &Library) -> Result<(), ResizerError> {
        if !self.buffer_cells.is_empty() {
            return Ok(());
        }
        let mut buffers: Vec<LibCellId> = library
            .buffer_cells()
            .into_iter()
            .filter(|&id| {
                let cell = library.cell(id);
                !(self.settings.exclude_clock_buffers && cell.is_clock_cell)
                    && !self.is_dont_use(cell)
                    && cell.master.is_some()
            })
            .collect();
        if buffers.is_empty() {
            return Err(ResizerError::NoBuffers);
        }
        buffers.sort_by(|&a, &b| {
            let (ca, cb) = (library.cell(a), library.cell(b));
            cb.drive_resistance()
                .total_cmp(&ca.drive_resistance())
                .then_with(|| ca.name.cmp(&cb.name))
        });
        tracing::debug!(count = buffers.len(), "found buffers");
        self.buffer_cells = buffers;
        Ok(())
    }

    /// Usable buffers, weakest drive first. Empty until
    /// [`Self::find_buffers`] runs.
    pub fn buffer_cells(&self) -> &[LibCellId] {
        &self.buffer_cells
    }

    /// The weakest usable buffer.
    pub fn buffer_lowest_drive(&self) -> Option<LibCellId> {
        self.buffer_cells.first().copied()
    }

    /// Computes target slews and the target load of every usable cell.
    pub fn find_target_loads(&mut self, design: &Design) -> Result<(), ResizerError> {
        if self.target_loads.is_some() {
            return Ok(());
        }
        self.find_buffers(&design.library)?;
        self.find_buffer_target_slews(design);
        let corner = self.target_corner(design).clone();
        let mut loads = HashMap::new();
        for id in design.library.cell_ids() {
            let cell = design.library.cell(id);
            if self.is_dont_use(cell) {
                continue;
            }
            loads.insert(id, find_target_load(cell, self.tgt_slews, &corner)?);
        }
        self.target_loads = Some(loads);
        Ok(())
    }

    /// Cached target load of `cell`.
    pub fn target_load(&self, cell: LibCellId) -> Option<f64> {
        self.target_loads.as_ref()?.get(&cell).copied()
    }

    pub(crate) fn target_load_or_err(
        &self,
        library: &Library,
        cell: LibCellId,
    ) -> Result<f64, ResizerError> {
        self.target_load(cell)
            .ok_or_else(|| ResizerError::MissingTargetLoad(library.cell(cell).name.clone()))
    }

    /// Target slews indexed by [`RiseFall::index`].
    pub fn target_slews(&self) -> [f64; 2] {
        self.tgt_slews
    }

    /// Index of the corner with the slowest target slew.
    pub fn target_slew_corner(&self) -> Option<usize> {
        self.tgt_slew_corner
    }

    /// The corner used for sizing decisions.
    pub fn target_corner<'a>(&self, design: &'a Design) -> &'a Corner {
        design.corner(self.tgt_slew_corner.unwrap_or(0))
    }

    /// Averages buffer output slews per corner; the corner with the largest
    /// rise slew supplies the target slews.
    pub fn find_buffer_target_slews(&mut self, design: &Design) {
        let mut best: Option<(usize, [f64; 2])> = None;
        for corner in &design.corners {
            let slews = self.buffer_target_slews(&design.library, corner);
            if best.map_or(true, |(_, b)| slews[0] > b[0]) {
                best = Some((corner.index, slews));
            }
        }
        if let Some((index, slews)) = best {
            self.tgt_slews = slews;
            self.tgt_slew_corner = Some(index);
            tracing::debug!(
                corner = index,
                rise = slews[0],
                fall = slews[1],
                "target slews"
            );
        }
    }

    fn buffer_target_slews(&self, library: &Library, corner: &Corner) -> [f64; 2] {
        let mut sums = [0.0; 2];
        let mut counts = [0usize; 2];
        for &buffer in &self.buffer_cells {
            let cell = library.cell(buffer);
            let Some((input, output)) = cell.buffer_ports() else {
                continue;
            };
            let load = input.capacitance * self.settings.target_slew_load_cap_factor;
            for arc in cell.arcs_between(&input.name, &output.name) {
                if arc.role.is_timing_check() {
                    continue;
                }
                let Some(model) = arc.delay_model() else {
                    continue;
                };
                for &(_, out_rf) in arc.sense.edges() {
                    let Some((_, first)) = model.gate_delay(out_rf, 0.0, load, corner) else {
                        continue;
                    };
                    if let Some((_, slew)) = model.gate_delay(out_rf, first, load, corner) {
                        sums[out_rf.index()] += slew;
                        counts[out_rf.index()] += 1;
                    }
                }
            }
        }
        let mut slews = [0.0; 2];
        for rf in RiseFall::ALL {
            let i = rf.index();
            if counts[i] > 0 {
                slews[i] = sums[i] / counts[i] as f64;
            }
        }
        slews
    }

    /// Marks `cell` don't-use and drops the caches that depend on it.
    pub fn set_dont_use(&mut self, library: &mut Library, cell: LibCellId, dont_use: bool) {
        if let Some(lib_cell) = library.cells.get_mut(cell.as_raw() as usize) {
            lib_cell.dont_use = dont_use;
        }
        self.buffer_cells.clear();
        self.target_loads = None;
    }
}

/// Target load of `cell`: the mean over target-load arcs and their edges of
/// the load at which the output slew reaches the target slew.
pub fn find_target_load(
    cell: &LibCell,
    tgt_slews: [f64; 2],
    corner: &Corner,
) -> Result<f64, ResizerError> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for arc in &cell.arcs {
        if !arc.role.drives_target_load() {
            continue;
        }
        let Some(model) = arc.delay_model() else {
            continue;
        };
        for &(in_rf, out_rf) in arc.sense.edges() {
            let in_slew = tgt_slews[in_rf.index()];
            let target = tgt_slews[out_rf.index()];
            if let Some(load) = arc_target_load(model, out_rf, in_slew, target, corner, &cell.name)? {
                sum += load;
                count += 1;
            }
        }
    }
    Ok(if count > 0 { sum / count as f64 } else { 0.0 })
}

fn arc_target_load(
    model: &GateTableModel,
    out_rf: RiseFall,
    in_slew: f64,
    target: f64,
    corner: &Corner,
    cell_name: &str,
) -> Result<Option<f64>, ResizerError> {
    let slew_diff = |load: f64| {
        model
            .gate_delay(out_rf, in_slew, load, corner)
            .map(|(_, slew)| slew - target)
    };
    let Some(diff_lo) = slew_diff(0.0) else {
        return Ok(None);
    };
    if diff_lo > 0.0 {
        return Ok(Some(0.0));
    }
    let (mut lo, mut hi) = (0.0_f64, TARGET_LOAD_INITIAL_HIGH);
    let mut iterations = 0;
    while (hi - lo).abs() > lo.max(hi) * TARGET_LOAD_TOLERANCE {
        iterations += 1;
        if iterations > TARGET_LOAD_MAX_ITERATIONS {
            return Err(ResizerError::NonConvergence {
                what: "target load",
                cell: cell_name.to_string(),
            });
        }
        let diff_hi = slew_diff(hi).unwrap_or(0.0);
        if diff_hi < 0.0 {
            lo = hi;
            hi *= 2.0;
        } else {
            let mid = (lo + hi) / 2.0;
            if slew_diff(mid).unwrap_or(0.0) < 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
    }
    Ok(Some(lo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_common::units::PICO;
    use ferrite_liberty::{demo_library, LibPort, NldmTable, TimingArcSet, TimingModel};

    fn slew_at(cell: &LibCell, load: f64, in_slew: f64) -> f64 {
        let model = cell.arcs[0].delay_model().unwrap();
        model
            .gate_delay(RiseFall::Rise, in_slew, load, &Corner::nominal())
            .unwrap()
            .1
    }

    #[test]
    fn target_load_hits_target_slew() {
        let lib = demo_library().unwrap();
        let cell = lib.cell(lib.find_cell("INV_X2").unwrap());
        let tgt = [40.0 * PICO, 40.0 * PICO];
        let load = find_target_load(cell, tgt, &Corner::nominal()).unwrap();
        assert!(load > 0.0);
        let slew = slew_at(cell, load, tgt[0]);
        // Lower bound of a 1% bracket: the slew is just under the target.
        assert!(slew <= tgt[0] * 1.0001);
        assert!(slew_at(cell, load * 1.02, tgt[0]) >= tgt[0] * 0.9999);
    }

    #[test]
    fn stronger_drive_has_larger_target_load() {
        let lib = demo_library().unwrap();
        let tgt = [40.0 * PICO, 40.0 * PICO];
        let corner = Corner::nominal();
        let load = |name: &str| find_target_load(lib.cell(lib.find_cell(name).unwrap()), tgt, &corner).unwrap();
        assert!(load("BUF_X1") < load("BUF_X2"));
        assert!(load("BUF_X2") < load("BUF_X4"));
        assert!(load("NAND2_X1") < load("NAND2_X4"));
    }

    #[test]
    fn already_too_slow_is_zero() {
        let lib = demo_library().unwrap();
        let cell = lib.cell(lib.find_cell("BUF_X1").unwrap());
        let tgt = [1.0 * PICO, 1.0 * PICO];
        assert_eq!(find_target_load(cell, tgt, &Corner::nominal()).unwrap(), 0.0);
    }

    #[test]
    fn flat_slew_does_not_converge() {
        let mut cell = LibCell::new("FLAT");
        cell.add_port(LibPort::input("A", 1e-15));
        cell.add_port(LibPort::output("Z", "A", 1000.0));
        let model = GateTableModel::symmetric(NldmTable::constant(1e-11), NldmTable::constant(1e-11));
        cell.add_arc(TimingArcSet::combinational("A", "Z").with_model(TimingModel::Gate(model)));
        let err = find_target_load(&cell, [50.0 * PICO; 2], &Corner::nominal()).unwrap_err();
        assert!(matches!(err, ResizerError::NonConvergence { .. }));
    }

    #[test]
    fn cells_without_arcs_have_zero_target() {
        let lib = demo_library().unwrap();
        let tie = lib.cell(lib.find_cell("TIELO").unwrap());
        assert_eq!(find_target_load(tie, [30.0 * PICO; 2], &Corner::nominal()).unwrap(), 0.0);
    }
}
