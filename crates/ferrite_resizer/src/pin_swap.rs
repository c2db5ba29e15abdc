//! Commutative input pin swapping.
//!
//! A late signal arriving on a slow input of a symmetric gate can be moved
//! to a faster equivalent input. Only ports the library proves
//! interchangeable are considered, so the gate function is preserved.

use crate::design::Design;
use crate::error::ResizerError;
use crate::session::Resizer;
use ferrite_liberty::{Corner, LibCellId, Library};
use ferrite_netlist::{InstId, NetlistError, PinId};
use std::collections::HashMap;

impl Resizer {
    /// Picks the input among `equiv_ports` with the lowest delay to
    /// `drvr_port`, provided it beats the delay through `input_port`.
    pub fn find_swap_pin_candidate(
        &self,
        library: &Library,
        cell: LibCellId,
        input_port: &str,
        drvr_port: &str,
        equiv_ports: &[String],
        load_cap: f64,
        corner: &Corner,
    ) -> Option<String> {
        let lib_cell = library.cell(cell);
        let mut base_delay = f64::NEG_INFINITY;
        let mut port_delays: HashMap<&str, f64> = HashMap::new();
        for arc in lib_cell.arcs_to(drvr_port) {
            if arc.role.is_timing_check() {
                continue;
            }
            let Some(model) = arc.delay_model() else {
                continue;
            };
            for &(in_rf, out_rf) in arc.sense.edges() {
                let in_slew = match self.input_slews.get(&arc.from) {
                    Some(slews) => slews[in_rf.index()],
                    None => self.tgt_slews[in_rf.index()],
                };
                let Some((delay, _)) = model.gate_delay(out_rf, in_slew, load_cap, corner) else {
                    continue;
                };
                if arc.from == input_port {
                    base_delay = base_delay.max(delay);
                } else {
                    let worst = port_delays.entry(arc.from.as_str()).or_insert(delay);
                    *worst = worst.max(delay);
                }
            }
        }

        let mut best = None;
        for port in equiv_ports {
            // An equivalent port may have no path to the driver.
            let Some(&delay) = port_delays.get(port.as_str()) else {
                continue;
            };
            let is_input = lib_cell
                .port(port)
                .is_some_and(|p| p.direction.is_any_input());
            if is_input && port != input_port && port != drvr_port && delay < base_delay {
                best = Some(port.clone());
                base_delay = delay;
            }
        }
        best
    }

    /// Exchanges the flat and hierarchical nets of two pins of `inst`.
    ///
    /// Nothing changes unless both pins are connected.
    pub fn swap_pins(
        &mut self,
        design: &mut Design,
        inst: InstId,
        port1: &str,
        port2: &str,
        journal: bool,
    ) -> Result<(), ResizerError> {
        let pin1 = self.find_inst_pin(design, inst, port1)?;
        let pin2 = self.find_inst_pin(design, inst, port2)?;
        let netlist = &design.netlist;
        let (Some(net1), Some(net2)) = (netlist.pin_net(pin1), netlist.pin_net(pin2)) else {
            return Ok(());
        };
        let (mod1, mod2) = (netlist.pin_mod_net(pin1), netlist.pin_mod_net(pin2));
        if journal {
            self.journal_swap_pins(inst, port1, port2);
        }

        let netlist = &mut design.netlist;
        netlist.disconnect(pin1)?;
        netlist.disconnect_mod(pin1)?;
        netlist.disconnect(pin2)?;
        netlist.disconnect_mod(pin2)?;
        netlist.connect(pin1, net2)?;
        netlist.connect(pin2, net1)?;
        if let Some(mod_net) = mod2 {
            netlist.connect_mod(pin1, mod_net)?;
        }
        if let Some(mod_net) = mod1 {
            netlist.connect_mod(pin2, mod_net)?;
        }
        self.tracker.invalidate_for_pin(&design.netlist, pin1, Some(net2));
        self.tracker.invalidate_for_pin(&design.netlist, pin2, Some(net1));
        self.counters.swapped_pins += 1;
        tracing::debug!(
            inst = %design.netlist.instance_name(inst),
            port1,
            port2,
            "swapped pins"
        );
        Ok(())
    }

    fn find_inst_pin(&self, design: &Design, inst: InstId, port: &str) -> Result<PinId, ResizerError> {
        design.netlist.instance(inst).ok_or(NetlistError::UnknownInstance(inst))?;
        design
            .netlist
            .find_pin(inst, port)
            .ok_or_else(|| ResizerError::UnknownPin(format!("{}/{port}", design.netlist.instance_name(inst))))
    }

    /// Moves the signal on `input_pin` to the fastest equivalent input of
    /// the same gate when that reduces the delay to `drvr_pin`. Returns
    /// `true` if pins were swapped.
    pub fn repair_pin_swap(
        &mut self,
        design: &mut Design,
        input_pin: PinId,
        drvr_pin: PinId,
    ) -> Result<bool, ResizerError> {
        let netlist = &design.netlist;
        let Some(inst) = netlist.pin_instance(input_pin) else {
            return Ok(false);
        };
        if netlist.pin_instance(drvr_pin) != Some(inst) || self.dont_touch_instance(netlist, inst) {
            return Ok(false);
        }
        let (Some(input), Some(drvr), Some(instance)) =
            (netlist.pin(input_pin), netlist.pin(drvr_pin), netlist.instance(inst))
        else {
            return Ok(false);
        };
        let (input_port, drvr_port, cell) = (input.port.clone(), drvr.port.clone(), instance.cell);
        let equiv_ports = design.library.equiv_input_ports(cell, &input_port);
        if equiv_ports.is_empty() {
            return Ok(false);
        }

        self.resize_preamble(design)?;
        let corner = self.target_corner(design).clone();
        let load_cap = design
            .sta
            .load_cap(&design.netlist, &design.library, drvr_pin, &corner);
        self.annotate_input_slews(design, inst);
        let candidate = self.find_swap_pin_candidate(
            &design.library,
            cell,
            &input_port,
            &drvr_port,
            &equiv_ports,
            load_cap,
            &corner,
        );
        self.reset_input_slews();
        match candidate {
            Some(swap_port) => {
                self.swap_pins(design, inst, &input_port, &swap_port, true)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_common::units::PICO;
    use ferrite_config::ResizerSettings;
    use ferrite_liberty::demo_library;

    fn resizer_with_slews(slews: &[(&str, f64)]) -> (Library, Resizer) {
        let lib = demo_library().unwrap();
        let d = Design::new(ferrite_netlist::Netlist::new("top", 1000), demo_library().unwrap());
        let mut rsz = Resizer::new(ResizerSettings::default(), &d);
        for &(port, slew) in slews {
            rsz.input_slews.insert(port.to_string(), [slew, slew]);
        }
        (lib, rsz)
    }

    #[test]
    fn slow_input_moves_to_fast_one() {
        let (lib, rsz) = resizer_with_slews(&[("A1", 300.0 * PICO), ("A2", 10.0 * PICO)]);
        let nand = lib.find_cell("NAND2_X1").unwrap();
        let equiv = lib.equiv_input_ports(nand, "A1");
        assert_eq!(equiv, vec!["A2".to_string()]);
        let candidate =
            rsz.find_swap_pin_candidate(&lib, nand, "A1", "ZN", &equiv, 2e-15, &Corner::nominal());
        assert_eq!(candidate.as_deref(), Some("A2"));
    }

    #[test]
    fn no_candidate_without_gain() {
        let (lib, rsz) = resizer_with_slews(&[("A1", 10.0 * PICO), ("A2", 300.0 * PICO)]);
        let nand = lib.find_cell("NAND2_X1").unwrap();
        let equiv = lib.equiv_input_ports(nand, "A1");
        let candidate =
            rsz.find_swap_pin_candidate(&lib, nand, "A1", "ZN", &equiv, 2e-15, &Corner::nominal());
        assert_eq!(candidate, None);
    }

    #[test]
    fn aoi_only_swaps_within_the_and_term() {
        let lib = demo_library().unwrap();
        let aoi = lib.find_cell("AOI21_X1").unwrap();
        assert_eq!(lib.equiv_input_ports(aoi, "A1"), vec!["A2".to_string()]);
        assert!(lib.equiv_input_ports(aoi, "B").is_empty());
    }
}
