//! Instance cloning and clock inverter repair.

use crate::codes;
use crate::design::Design;
use crate::error::ResizerError;
use crate::session::Resizer;
use ferrite_common::Point;
use ferrite_diagnostics::Diagnostic;
use ferrite_netlist::{InstId, NetId, NetlistError, PinId, SignalType};
use std::collections::{BTreeSet, HashSet, VecDeque};

impl Resizer {
    /// Creates a copy of `original` at `location` with no connections.
    pub fn clone_instance(
        &mut self,
        design: &mut Design,
        original: InstId,
        name: &str,
        location: Point,
    ) -> Result<InstId, ResizerError> {
        let cell = design
            .netlist
            .instance(original)
            .ok_or(NetlistError::UnknownInstance(original))?
            .cell;
        let clone = self.make_instance(design, cell, name, location)?;
        self.journal_clone(original, clone);
        self.counters.cloned_gates += 1;
        Ok(clone)
    }

    /// Inverters reachable from clock nets through buffers and inverters,
    /// in discovery order.
    pub fn find_clk_inverters(&self, design: &Design) -> Vec<InstId> {
        let netlist = &design.netlist;
        let mut queue: VecDeque<NetId> = netlist
            .nets()
            .filter(|n| n.signal_type == SignalType::Clock)
            .map(|n| n.id)
            .collect();
        let mut seen_nets: HashSet<NetId> = queue.iter().copied().collect();
        let mut seen_insts = BTreeSet::new();
        let mut inverters = Vec::new();
        while let Some(net) = queue.pop_front() {
            for load in netlist.net_loads(net) {
                let Some(inst) = netlist.pin_instance(load) else {
                    continue;
                };
                let Some(instance) = netlist.instance(inst) else {
                    continue;
                };
                let cell = design.library.cell(instance.cell);
                if !cell.is_buf_inv() || !seen_insts.insert(inst) {
                    continue;
                }
                if cell.is_inverter() {
                    inverters.push(inst);
                }
                for &pin in netlist.instance_pins(inst) {
                    if netlist.is_driver(pin) {
                        if let Some(out) = netlist.pin_net(pin) {
                            if seen_nets.insert(out) {
                                queue.push_back(out);
                            }
                        }
                    }
                }
            }
        }
        inverters
    }

    /// Clones every clock-tree inverter once per load, placing each clone at
    /// its load. Returns the number of clones made.
    pub fn repair_clk_inverters(&mut self, design: &mut Design) -> Result<usize, ResizerError> {
        design.sta.ensure_levelized(&design.netlist);
        let start = self.counters.cloned_gates;
        for inv in self.find_clk_inverters(design) {
            if !self.dont_touch_instance(&design.netlist, inv) {
                self.clone_clk_inverter(design, inv)?;
            }
        }
        self.update_parasitics(design);
        let count = self.counters.cloned_gates - start;
        if count > 0 {
            self.diagnostics.emit(Diagnostic::info(
                codes::CLONED_INVERTERS,
                format!("Cloned {count} clock inverters."),
            ));
        }
        Ok(count)
    }

    fn clone_clk_inverter(&mut self, design: &mut Design, inv: InstId) -> Result<(), ResizerError> {
        let Some(instance) = design.netlist.instance(inv) else {
            return Ok(());
        };
        let inv_name = instance.name.clone();
        let Some((in_port, out_port)) = design
            .library
            .cell(instance.cell)
            .buffer_ports()
            .map(|(i, o)| (i.name.clone(), o.name.clone()))
        else {
            return Ok(());
        };
        let (Some(in_pin), Some(out_pin)) = (
            design.netlist.find_pin(inv, &in_port),
            design.netlist.find_pin(inv, &out_port),
        ) else {
            return Ok(());
        };
        let (Some(in_net), Some(out_net)) = (design.netlist.pin_net(in_pin), design.netlist.pin_net(out_pin))
        else {
            return Ok(());
        };
        let sig_type = design
            .netlist
            .net(in_net)
            .map_or(SignalType::Signal, |n| n.signal_type);

        let loads: Vec<PinId> = design
            .netlist
            .net_pins(out_net)
            .iter()
            .copied()
            .filter(|&p| p != out_pin && !design.netlist.is_top_port(p))
            .collect();
        for load in loads {
            let name = self.make_unique_inst_name(&design.netlist, &inv_name, true);
            let location = design.netlist.pin_location(load).unwrap_or_default();
            let clone = self.clone_instance(design, inv, &name, location)?;
            let clone_out = self.make_unique_net(design)?;
            design.netlist.set_net_signal_type(clone_out, sig_type)?;
            let clone_in_pin = self.find_clone_pin(design, clone, &in_port)?;
            let clone_out_pin = self.find_clone_pin(design, clone, &out_port)?;
            self.connect_pin(design, clone_in_pin, in_net)?;
            self.connect_pin(design, clone_out_pin, clone_out)?;
            self.connect_pin(design, load, clone_out)?;
        }

        if !design.netlist.net_has_port(out_net) {
            self.disconnect_pin(design, in_pin)?;
            self.disconnect_pin(design, out_pin)?;
            self.delete_net(design, out_net)?;
            self.delete_instance(design, inv)?;
        }
        Ok(())
    }

    fn find_clone_pin(&self, design: &Design, inst: InstId, port: &str) -> Result<PinId, ResizerError> {
        design
            .netlist
            .find_pin(inst, port)
            .ok_or_else(|| ResizerError::UnknownPin(format!("{}/{port}", design.netlist.instance_name(inst))))
    }
}
