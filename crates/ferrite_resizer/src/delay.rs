//! Delay and slew queries on library cells.
//!
//! Every query evaluates the gate table models of the arcs into one output
//! port and keeps the worst case per output edge. Input slews come from
//! [`Resizer::annotate_input_slews`] when present, otherwise from the
//! session's target slews. Nothing here edits the design.

use crate::design::Design;
use crate::session::Resizer;
use ferrite_liberty::{Corner, LibCell, LibCellId, Library, RiseFall};
use ferrite_netlist::InstId;

/// Worst delay and output slew per output edge.
///
/// Edges with no evaluable arc hold `-inf`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDelays {
    /// Delay indexed by [`RiseFall::index`].
    pub delay: [f64; 2],
    /// Output slew indexed by [`RiseFall::index`].
    pub slew: [f64; 2],
}

impl GateDelays {
    fn unset() -> Self {
        Self {
            delay: [f64::NEG_INFINITY; 2],
            slew: [f64::NEG_INFINITY; 2],
        }
    }

    /// Larger of the rise and fall delays.
    pub fn worst_delay(&self) -> f64 {
        self.delay[0].max(self.delay[1])
    }

    /// Larger of the rise and fall slews.
    pub fn worst_slew(&self) -> f64 {
        self.slew[0].max(self.slew[1])
    }
}

/// Worst delays into `out_port` with input slews supplied per input port
/// and input edge.
pub fn gate_delays_with_slews(
    cell: &LibCell,
    out_port: &str,
    in_slew: &dyn Fn(&str, RiseFall) -> f64,
    load_cap: f64,
    corner: &Corner,
) -> GateDelays {
    let mut result = GateDelays::unset();
    for arc in cell.arcs_to(out_port) {
        if arc.role.is_timing_check() {
            continue;
        }
        let Some(model) = arc.delay_model() else {
            continue;
        };
        for &(in_rf, out_rf) in arc.sense.edges() {
            let slew = in_slew(&arc.from, in_rf);
            if let Some((d, s)) = model.gate_delay(out_rf, slew, load_cap, corner) {
                let i = out_rf.index();
                result.delay[i] = result.delay[i].max(d);
                result.slew[i] = result.slew[i].max(s);
            }
        }
    }
    result
}

impl Resizer {
    /// Worst delays of `cell` into `out_port` driving `load_cap`.
    pub fn gate_delays(
        &self,
        library: &Library,
        cell: LibCellId,
        out_port: &str,
        load_cap: f64,
        corner: &Corner,
    ) -> GateDelays {
        let in_slew = |port: &str, rf: RiseFall| match self.input_slews.get(port) {
            Some(slews) => slews[rf.index()],
            None => self.tgt_slews[rf.index()],
        };
        gate_delays_with_slews(library.cell(cell), out_port, &in_slew, load_cap, corner)
    }

    /// Worst delay of `cell` into `out_port`.
    pub fn gate_delay(
        &self,
        library: &Library,
        cell: LibCellId,
        out_port: &str,
        load_cap: f64,
        corner: &Corner,
    ) -> f64 {
        self.gate_delays(library, cell, out_port, load_cap, corner)
            .worst_delay()
    }

    /// Rise/fall delays and slews through a buffer or inverter. All `-inf`
    /// for other cells.
    pub fn buffer_delays(
        &self,
        library: &Library,
        cell: LibCellId,
        load_cap: f64,
        corner: &Corner,
    ) -> GateDelays {
        match library.cell(cell).buffer_ports() {
            Some((_, output)) => self.gate_delays(library, cell, &output.name, load_cap, corner),
            None => GateDelays::unset(),
        }
    }

    /// Worst delay through a buffer or inverter.
    pub fn buffer_delay(
        &self,
        library: &Library,
        cell: LibCellId,
        load_cap: f64,
        corner: &Corner,
    ) -> f64 {
        self.buffer_delays(library, cell, load_cap, corner)
            .worst_delay()
    }

    /// Worst output slew of a buffer or inverter.
    pub fn buffer_slew(
        &self,
        library: &Library,
        cell: LibCellId,
        load_cap: f64,
        corner: &Corner,
    ) -> f64 {
        self.buffer_delays(library, cell, load_cap, corner)
            .worst_slew()
    }

    /// Records the timing engine's slews at the input pins of `inst` so
    /// delay queries on its cell use them instead of the target slews.
    pub fn annotate_input_slews(&mut self, design: &Design, inst: InstId) {
        self.input_slews.clear();
        let corner = self.target_corner(design).clone();
        for &pin in design.netlist.instance_pins(inst) {
            let Some(p) = design.netlist.pin(pin) else {
                continue;
            };
            if !p.direction.is_any_input() {
                continue;
            }
            let rise = design.sta.vertex_slew(pin, RiseFall::Rise, &corner);
            let fall = design.sta.vertex_slew(pin, RiseFall::Fall, &corner);
            if let (Some(rise), Some(fall)) = (rise, fall) {
                self.input_slews.insert(p.port.clone(), [rise, fall]);
            }
        }
    }

    /// Drops slews recorded by [`Self::annotate_input_slews`].
    pub fn reset_input_slews(&mut self) {
        self.input_slews.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_common::units::{FEMTO, PICO};
    use ferrite_liberty::demo_library;

    #[test]
    fn buffer_delay_grows_with_load() {
        let lib = demo_library().unwrap();
        let buf = lib.cell(lib.find_cell("BUF_X1").unwrap());
        let corner = Corner::nominal();
        let zero = |_: &str, _: RiseFall| 0.0;
        let light = gate_delays_with_slews(buf, "Z", &zero, 1.0 * FEMTO, &corner);
        let heavy = gate_delays_with_slews(buf, "Z", &zero, 10.0 * FEMTO, &corner);
        assert!(heavy.worst_delay() > light.worst_delay());
        // t0 + 0.69 * R * C for the demo drive model.
        let expected = 20.0 * PICO + 0.69 * 6000.0 * 1.0 * FEMTO;
        assert!((light.delay[0] - expected).abs() < 1e-15);
    }

    #[test]
    fn missing_port_is_unset() {
        let lib = demo_library().unwrap();
        let tie = lib.cell(lib.find_cell("TIEHI").unwrap());
        let zero = |_: &str, _: RiseFall| 0.0;
        let delays = gate_delays_with_slews(tie, "Z", &zero, 0.0, &Corner::nominal());
        assert_eq!(delays.worst_delay(), f64::NEG_INFINITY);
    }

    #[test]
    fn corner_scales_delay() {
        let lib = demo_library().unwrap();
        let inv = lib.cell(lib.find_cell("INV_X1").unwrap());
        let zero = |_: &str, _: RiseFall| 0.0;
        let nominal = gate_delays_with_slews(inv, "ZN", &zero, 2.0 * FEMTO, &Corner::nominal());
        let slow = gate_delays_with_slews(
            inv,
            "ZN",
            &zero,
            2.0 * FEMTO,
            &Corner::new("slow", 1).with_scales(1.5, 1.0),
        );
        assert!((slow.worst_delay() - 1.5 * nominal.worst_delay()).abs() < 1e-18);
        assert!((slow.worst_slew() - nominal.worst_slew()).abs() < 1e-18);
    }
}
