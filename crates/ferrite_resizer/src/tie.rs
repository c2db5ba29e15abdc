//! Tie cell fanout repair.
//!
//! Each load of a tie-high or tie-low net gets its own tie instance placed
//! beside it, so constant nets never need routing across the die.

use crate::codes;
use crate::design::Design;
use crate::error::ResizerError;
use crate::session::Resizer;
use ferrite_common::{Dbu, Point};
use ferrite_diagnostics::Diagnostic;
use ferrite_liberty::LibCellId;
use ferrite_netlist::{InstId, Netlist, PinId};

impl Resizer {
    /// Duplicates every instance of `tie_cell` per load of its `tie_port`
    /// net, placing each copy `separation` meters outside the load's nearest
    /// cell edge. Returns the number of tie instances inserted.
    pub fn repair_tie_fanout(
        &mut self,
        design: &mut Design,
        tie_cell: LibCellId,
        tie_port: &str,
        separation: f64,
    ) -> Result<usize, ResizerError> {
        let cell = design.library.cell(tie_cell);
        if cell.port(tie_port).is_none() {
            return Err(ResizerError::UnknownPort {
                cell: cell.name.clone(),
                port: tie_port.to_string(),
            });
        }
        let cell_name = cell.name.clone();
        let separation_dbu = self.meters_to_dbu(&design.netlist, separation)?;
        let ties: Vec<InstId> = design
            .netlist
            .instances()
            .filter(|i| i.cell == tie_cell && !i.dont_touch)
            .map(|i| i.id)
            .collect();

        let mut tie_count = 0;
        for tie in ties {
            let Some(drvr_pin) = design.netlist.find_pin(tie, tie_port) else {
                continue;
            };
            let Some(net) = design.netlist.pin_net(drvr_pin) else {
                continue;
            };
            if self.dont_touch_net(&design.netlist, net) {
                continue;
            }
            let loads: Vec<PinId> = design
                .netlist
                .net_pins(net)
                .iter()
                .copied()
                .filter(|&p| p != drvr_pin)
                .collect();
            for load in loads {
                let location = tie_location(&design.netlist, load, separation_dbu);
                let base = match design.netlist.pin_instance(load) {
                    Some(inst) => design.netlist.instance_name(inst),
                    None => design.netlist.pin_name(load),
                };
                let name = self.make_unique_inst_name(&design.netlist, &base, true);
                let copy = self.make_instance(design, tie_cell, &name, location)?;
                let load_net = self.make_unique_net(design)?;
                let copy_pin = design
                    .netlist
                    .find_pin(copy, tie_port)
                    .ok_or_else(|| ResizerError::UnknownPin(format!("{name}/{tie_port}")))?;
                self.connect_pin(design, copy_pin, load_net)?;
                self.connect_pin(design, load, load_net)?;
                tie_count += 1;
            }

            self.delete_net(design, net)?;
            let has_other_fanout = design.netlist.instance_pins(tie).iter().any(|&pin| {
                pin != drvr_pin
                    && design
                        .netlist
                        .pin_net(pin)
                        .and_then(|n| design.netlist.net(n))
                        .is_some_and(|n| !n.signal_type.is_supply())
            });
            if !has_other_fanout {
                self.delete_instance(design, tie)?;
            }
        }

        self.update_parasitics(design);
        if tie_count > 0 {
            self.diagnostics.emit(Diagnostic::info(
                codes::TIE_CELLS,
                format!("Inserted {tie_count} tie {cell_name} instances."),
            ));
        }
        Ok(tie_count)
    }
}

/// Location for a tie driving `load`: the load pin moved `separation` away
/// from the load cell toward its strictly nearest bounding-box edge. Top
/// ports and pins equidistant from several edges keep the pin location.
pub fn tie_location(netlist: &Netlist, load: PinId, separation: Dbu) -> Point {
    let Some(loc) = netlist.pin_location(load) else {
        return Point::default();
    };
    let Some(inst) = netlist.pin_instance(load).and_then(|i| netlist.instance(i)) else {
        return loc;
    };
    let bbox = inst.bbox();
    let left = (loc.x - bbox.xl).abs();
    let right = (loc.x - bbox.xh).abs();
    let bottom = (loc.y - bbox.yl).abs();
    let top = (loc.y - bbox.yh).abs();
    let mut tie = loc;
    if left < right && left < bottom && left < top {
        tie.x -= separation;
    }
    if right < left && right < bottom && right < top {
        tie.x += separation;
    }
    if bottom < left && bottom < right && bottom < top {
        tie.y -= separation;
    }
    if top < left && top < right && top < bottom {
        tie.y += separation;
    }
    tie
}
