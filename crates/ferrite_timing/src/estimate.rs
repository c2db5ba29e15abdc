//! A self-contained timing engine with estimated wire parasitics.
//!
//! Wire capacitance is the corner's capacitance per meter times the net's
//! half-perimeter wire length, cached per net and refreshed only for nets
//! passed to [`TimingEngine::update_parasitics`]. Slews and slacks are not
//! propagated; they come from annotations.

use crate::engine::TimingEngine;
use ferrite_common::units::dbu_to_meters;
use ferrite_liberty::{Corner, Library, RiseFall};
use ferrite_netlist::{NetId, Netlist, PinId, SignalType};
use std::collections::{BTreeSet, HashMap};

/// HPWL-based timing engine.
#[derive(Debug, Default, Clone)]
pub struct EstimatedTiming {
    wire_length: HashMap<NetId, f64>,
    slews: HashMap<(PinId, RiseFall), f64>,
    slacks: HashMap<PinId, f64>,
    parasitics_updates: usize,
    requireds_runs: usize,
    levelize_runs: usize,
}

impl EstimatedTiming {
    /// Creates an engine with no cached parasitics or annotations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotates the slew at `pin` for one edge.
    pub fn set_vertex_slew(&mut self, pin: PinId, rf: RiseFall, slew: f64) {
        self.slews.insert((pin, rf), slew);
    }

    /// Annotates the slack at `pin`.
    pub fn set_vertex_slack(&mut self, pin: PinId, slack: f64) {
        self.slacks.insert(pin, slack);
    }

    /// Estimated wire length of `net` in meters.
    pub fn wire_length(&self, netlist: &Netlist, net: NetId) -> f64 {
        match self.wire_length.get(&net) {
            Some(&len) => len,
            None => hpwl_meters(netlist, net),
        }
    }

    /// Number of nets whose parasitics were re-derived so far.
    pub fn parasitics_updates(&self) -> usize {
        self.parasitics_updates
    }

    /// Number of required-time recomputations so far.
    pub fn requireds_runs(&self) -> usize {
        self.requireds_runs
    }

    /// Number of levelization requests so far.
    pub fn levelize_runs(&self) -> usize {
        self.levelize_runs
    }
}

fn hpwl_meters(netlist: &Netlist, net: NetId) -> f64 {
    netlist.net_bbox(net).map_or(0.0, |bbox| {
        dbu_to_meters(bbox.half_perimeter(), netlist.dbu_per_micron)
    })
}

/// Capacitance presented by a load pin: the library port capacitance for
/// instance pins, the external load for top-level ports.
pub fn pin_cap(netlist: &Netlist, library: &Library, pin: PinId) -> f64 {
    let Some(p) = netlist.pin(pin) else {
        return 0.0;
    };
    match p.owner.and_then(|inst| netlist.instance(inst)) {
        Some(inst) => library
            .cell(inst.cell)
            .port(&p.port)
            .map_or(0.0, |port| port.capacitance),
        None => p.external_cap,
    }
}

impl TimingEngine for EstimatedTiming {
    fn update_parasitics(&mut self, netlist: &Netlist, nets: &BTreeSet<NetId>) {
        for &net in nets {
            if netlist.net(net).is_some() {
                self.wire_length.insert(net, hpwl_meters(netlist, net));
            } else {
                self.wire_length.remove(&net);
            }
        }
        self.parasitics_updates += nets.len();
        tracing::debug!(nets = nets.len(), "updated estimated parasitics");
    }

    fn remove_parasitics(&mut self, net: NetId) {
        self.wire_length.remove(&net);
    }

    fn load_cap(&self, netlist: &Netlist, library: &Library, drvr: PinId, corner: &Corner) -> f64 {
        let Some(net) = netlist.pin_net(drvr) else {
            return 0.0;
        };
        let pins: f64 = netlist
            .net_pins(net)
            .iter()
            .filter(|&&p| p != drvr && netlist.is_load(p))
            .map(|&p| pin_cap(netlist, library, p))
            .sum();
        corner.wire_cap_per_m * self.wire_length(netlist, net) + pins
    }

    fn vertex_slew(&self, pin: PinId, rf: RiseFall, _corner: &Corner) -> Option<f64> {
        self.slews.get(&(pin, rf)).copied()
    }

    fn vertex_slack(&self, pin: PinId) -> Option<f64> {
        self.slacks.get(&pin).copied()
    }

    fn ensure_levelized(&mut self, _netlist: &Netlist) {
        self.levelize_runs += 1;
    }

    fn find_requireds(&mut self, _netlist: &Netlist) {
        self.requireds_runs += 1;
    }

    fn is_clock(&self, netlist: &Netlist, pin: PinId) -> bool {
        netlist
            .pin_net(pin)
            .and_then(|n| netlist.net(n))
            .is_some_and(|n| n.signal_type == SignalType::Clock)
    }

    fn is_constant(&self, netlist: &Netlist, library: &Library, pin: PinId) -> bool {
        let Some(net) = netlist.pin_net(pin).and_then(|n| netlist.net(n)) else {
            return false;
        };
        if net.signal_type.is_supply() {
            return true;
        }
        netlist.net_drivers(net.id).iter().any(|&d| {
            netlist
                .pin_instance(d)
                .and_then(|i| netlist.instance(i))
                .is_some_and(|i| library.cell(i.cell).is_tie())
        })
    }
}
