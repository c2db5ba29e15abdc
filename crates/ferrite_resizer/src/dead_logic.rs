//! Dead logic elimination.

use crate::codes;
use crate::design::Design;
use crate::error::ResizerError;
use crate::session::Resizer;
use ferrite_diagnostics::Diagnostic;
use ferrite_netlist::{InstId, NetId, Netlist};
use std::collections::HashSet;

impl Resizer {
    /// Deletes every instance that does not feed a top-level port or a
    /// protected instance, directly or through other logic.
    ///
    /// Protected instances are non-logic cells (macros, pads), don't-touch
    /// instances, and instances on don't-touch nets. With `clean_nets`, nets
    /// left with no driver and no load are deleted too. Returns the number
    /// of instances and nets removed.
    pub fn eliminate_dead_logic(
        &mut self,
        design: &mut Design,
        clean_nets: bool,
    ) -> Result<(usize, usize), ResizerError> {
        let kept = live_instances(design);
        let dead: Vec<InstId> = design
            .netlist
            .instances()
            .map(|i| i.id)
            .filter(|id| !kept.contains(id))
            .collect();
        for &inst in &dead {
            self.delete_instance(design, inst)?;
        }

        let mut removed_nets = 0;
        if clean_nets {
            let empty: Vec<NetId> = design
                .netlist
                .nets()
                .filter(|n| !n.dont_touch)
                .filter(|n| n.pins.iter().all(|&p| !design.netlist.is_driver(p) && !design.netlist.is_load(p)))
                .map(|n| n.id)
                .collect();
            for net in empty {
                self.delete_net(design, net)?;
                removed_nets += 1;
            }
        }
        self.update_parasitics(design);
        self.diagnostics.emit(Diagnostic::info(
            codes::DEAD_LOGIC,
            format!(
                "Removed {} unused instances and {removed_nets} unused nets.",
                dead.len()
            ),
        ));
        Ok((dead.len(), removed_nets))
    }
}

fn live_instances(design: &Design) -> HashSet<InstId> {
    let netlist = &design.netlist;
    let mut kept = HashSet::new();
    let mut queue = Vec::new();
    let mut keep = |inst: InstId, kept: &mut HashSet<InstId>| {
        if kept.insert(inst) {
            queue.push(inst);
        }
    };

    for port in netlist.top_ports() {
        if let Some(net) = port.net {
            for drvr in driver_instances(netlist, net) {
                keep(drvr, &mut kept);
            }
        }
    }
    for inst in netlist.instances() {
        let protected = !design.library.cell(inst.cell).is_logic_std_cell()
            || inst.dont_touch
            || inst.pins.iter().any(|&p| {
                netlist
                    .pin_net(p)
                    .and_then(|n| netlist.net(n))
                    .is_some_and(|n| n.dont_touch)
            });
        if protected {
            keep(inst.id, &mut kept);
        }
    }

    while let Some(inst) = queue.pop() {
        for &pin in netlist.instance_pins(inst) {
            if let Some(net) = netlist.pin_net(pin) {
                for drvr in driver_instances(netlist, net) {
                    if kept.insert(drvr) {
                        queue.push(drvr);
                    }
                }
            }
        }
    }
    kept
}

fn driver_instances(netlist: &Netlist, net: NetId) -> Vec<InstId> {
    netlist
        .net_drivers(net)
        .into_iter()
        .filter_map(|p| netlist.pin_instance(p))
        .collect()
}
