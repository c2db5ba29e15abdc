//! Gate sizing toward the target load.
//!
//! A driver is resized to the equivalent cell whose target load is closest
//! to the load it actually drives. Buffers and inverters may trade a little
//! distance for a faster cell.

use crate::codes;
use crate::design::Design;
use crate::error::ResizerError;
use crate::session::Resizer;
use ferrite_diagnostics::Diagnostic;
use ferrite_liberty::{CellKind, Corner, LibCellId, Library};
use ferrite_netlist::{InstId, PinId};

/// Slack granted to the distance and delay comparisons when sizing buffers
/// and inverters.
const BUF_INV_MARGIN: f64 = 1.1;

impl Resizer {
    /// Resizes the instance driving `drvr_pin` toward its target load.
    ///
    /// Returns `true` if the cell changed. Top-level ports, don't-touch
    /// instances, non-core cells, and unloaded drivers are left alone.
    /// Instances with several loaded outputs are resized once per output
    /// but only count the first time; later visits may only upsize.
    pub fn resize_to_target_slew(
        &mut self,
        design: &mut Design,
        drvr_pin: PinId,
    ) -> Result<bool, ResizerError> {
        let Some(inst) = design.netlist.pin_instance(drvr_pin) else {
            return Ok(false);
        };
        let Some(instance) = design.netlist.instance(inst) else {
            return Ok(false);
        };
        let cell = instance.cell;
        if instance.dont_touch || !design.library.cell(cell).is_logic_std_cell() {
            return Ok(false);
        }
        self.resize_preamble(design)?;

        let revisiting = if self.loaded_output_count(design, inst) > 1 {
            !self.resized_multi_output.insert(inst)
        } else {
            false
        };

        self.update_parasitics(design);
        let corner = self.target_corner(design).clone();
        let load = design
            .sta
            .load_cap(&design.netlist, &design.library, drvr_pin, &corner);
        if load <= 0.0 {
            return Ok(false);
        }
        let target = self.find_target_cell(&design.library, cell, load, revisiting, &corner)?;
        if target == cell {
            return Ok(false);
        }
        let replaced = self.replace_cell(design, inst, target, true)?;
        if replaced && !revisiting {
            self.counters.resized += 1;
            return Ok(true);
        }
        Ok(false)
    }

    fn loaded_output_count(&self, design: &Design, inst: InstId) -> usize {
        design
            .netlist
            .instance_pins(inst)
            .iter()
            .filter(|&&p| design.netlist.is_driver(p) && design.netlist.pin_net(p).is_some())
            .count()
    }

    /// Resizes every instance output that drives a net, reporting the count.
    pub fn resize_all(&mut self, design: &mut Design) -> Result<usize, ResizerError> {
        self.resize_preamble(design)?;
        let drivers: Vec<PinId> = design
            .netlist
            .instances()
            .flat_map(|inst| inst.pins.iter().copied())
            .filter(|&p| design.netlist.is_driver(p) && design.netlist.pin_net(p).is_some())
            .collect();
        let mut count = 0;
        for drvr in drivers {
            if self.resize_to_target_slew(design, drvr)? {
                count += 1;
            }
        }
        self.update_parasitics(design);
        self.diagnostics.emit(Diagnostic::info(
            codes::RESIZED,
            format!("Resized {count} instances."),
        ));
        Ok(count)
    }

    /// Cells `cell` may be swapped with: its equivalents, restricted to the
    /// same footprint when required and to the same user function class
    /// when `cell` declares one. Don't-use cells other than `cell` are
    /// excluded.
    pub fn swappable_cells(&mut self, library: &Library, cell: LibCellId) -> Vec<LibCellId> {
        self.ensure_equiv_cells(library);
        let Some(equiv) = self.equiv_cells.as_ref() else {
            return Vec::new();
        };
        let source = library.cell(cell);
        equiv
            .equivalents(cell)
            .iter()
            .copied()
            .filter(|&id| {
                let candidate = library.cell(id);
                if self.settings.match_cell_footprint && candidate.footprint != source.footprint {
                    return false;
                }
                if source.user_function_class.is_some()
                    && candidate.user_function_class != source.user_function_class
                {
                    return false;
                }
                id == cell || !self.is_dont_use(candidate)
            })
            .collect()
    }

    fn find_target_cell(
        &mut self,
        library: &Library,
        cell: LibCellId,
        load: f64,
        revisiting: bool,
        corner: &Corner,
    ) -> Result<LibCellId, ResizerError> {
        let candidates = self.swappable_cells(library, cell);
        if candidates.is_empty() {
            return Ok(cell);
        }
        let is_buf_inv = library.cell(cell).is_buf_inv();
        let mut best = cell;
        let mut best_load = match self.target_load(cell) {
            Some(tl) => tl,
            None => crate::characterize::find_target_load(library.cell(cell), self.tgt_slews, corner)?,
        };
        let mut best_dist = (best_load - load).abs();
        let mut best_delay = if is_buf_inv {
            self.buffer_delay(library, cell, load, corner)
        } else {
            0.0
        };
        for target in candidates {
            if target == cell || self.is_dont_use(library.cell(target)) {
                continue;
            }
            let target_load = self.target_load_or_err(library, target)?;
            let dist = (target_load - load).abs();
            if is_buf_inv {
                let delay = self.buffer_delay(library, target, load, corner);
                if (delay < best_delay && dist < best_dist * BUF_INV_MARGIN)
                    || (dist < best_dist && delay < best_delay * BUF_INV_MARGIN)
                {
                    best = target;
                    best_load = target_load;
                    best_dist = dist;
                    best_delay = delay;
                }
            } else if dist < best_dist && (!revisiting || target_load > best_load) {
                best = target;
                best_load = target_load;
                best_dist = dist;
            }
        }
        Ok(best)
    }

    /// The swappable cell whose maximum output load is closest to half that
    /// of `cell`. Only single-output combinational cells qualify.
    pub fn half_driving_power_cell(
        &mut self,
        library: &Library,
        cell: LibCellId,
    ) -> Option<LibCellId> {
        let candidates = self.swappable_cells(library, cell);
        self.closest_driver(library, cell, &candidates, 0.5)
    }

    fn closest_driver(
        &self,
        library: &Library,
        cell: LibCellId,
        candidates: &[LibCellId],
        scale: f64,
    ) -> Option<LibCellId> {
        let source = library.cell(cell);
        let combinational = matches!(
            source.kind,
            CellKind::Buffer | CellKind::Inverter | CellKind::Combinational
        );
        if !combinational || source.outputs().count() != 1 || candidates.is_empty() {
            return None;
        }
        let limit = scale * max_load(library, cell);
        let mut closest = None;
        let mut best_diff = f64::INFINITY;
        for &candidate in candidates {
            if self.is_dont_use(library.cell(candidate)) {
                continue;
            }
            let diff = (max_load(library, candidate) - limit).abs();
            if diff == 0.0 {
                return Some(candidate);
            }
            if diff < best_diff {
                best_diff = diff;
                closest = Some(candidate);
            }
        }
        closest
    }
}

fn max_load(library: &Library, cell: LibCellId) -> f64 {
    library
        .cell(cell)
        .outputs()
        .next()
        .and_then(|p| p.max_capacitance)
        .unwrap_or(0.0)
}
