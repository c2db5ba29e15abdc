//! Core netlist data structures and queries.
//!
//! The [`Netlist`] stores instances, flat nets, pins (instance pins and
//! top-level ports), and hierarchical module nets in arenas indexed by their
//! IDs. Deleted objects leave a tombstone so IDs stay stable for the lifetime
//! of the netlist, which is what lets the ECO log revive them on undo.

use crate::eco::EcoState;
use crate::error::NetlistError;
use crate::ids::{InstId, ModNetId, NetId, PinId};
use crate::observer::NetlistEvent;
use ferrite_common::{ContentHash, Dbu, Point, Rect};
use ferrite_liberty::{LibCellId, PortDirection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Placement state of an instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStatus {
    /// Not placed yet.
    #[default]
    Unplaced,
    /// Placed; may be moved by optimization.
    Placed,
    /// Fixed; must not be moved or removed.
    Fixed,
}

/// Signal type of a net.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    /// Ordinary signal.
    #[default]
    Signal,
    /// Clock network.
    Clock,
    /// Power supply.
    Power,
    /// Ground supply.
    Ground,
}

impl SignalType {
    /// Power or ground.
    pub fn is_supply(self) -> bool {
        matches!(self, Self::Power | Self::Ground)
    }
}

/// A placed or unplaced cell instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Unique ID.
    pub id: InstId,
    /// Instance name, unique within the netlist.
    pub name: String,
    /// Bound library cell.
    pub cell: LibCellId,
    /// Lower-left origin.
    pub location: Point,
    /// Master width.
    pub width: Dbu,
    /// Master height.
    pub height: Dbu,
    /// Placement state.
    pub placement: PlacementStatus,
    /// Optimization must not modify this instance.
    pub dont_touch: bool,
    /// Pins in library port order.
    pub pins: Vec<PinId>,
}

impl Instance {
    /// Bounding box of the placed master.
    pub fn bbox(&self) -> Rect {
        Rect::from_origin(self.location, self.width, self.height)
    }
}

/// A flat net.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Net {
    /// Unique ID.
    pub id: NetId,
    /// Net name, unique within the netlist.
    pub name: String,
    /// Connected pins in connection order.
    pub pins: Vec<PinId>,
    /// Optimization must not modify this net.
    pub dont_touch: bool,
    /// Signal type.
    #[serde(default)]
    pub signal_type: SignalType,
    /// Pre-routed special net; never buffered.
    #[serde(default)]
    pub special: bool,
}

/// An instance pin or a top-level port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    /// Unique ID.
    pub id: PinId,
    /// Library port name, or the port name for top-level ports.
    pub port: String,
    /// Owning instance; `None` for top-level ports.
    pub owner: Option<InstId>,
    /// Direction. For top-level ports this is the direction seen from
    /// outside the design, so an input port drives its net.
    pub direction: PortDirection,
    /// Connected flat net.
    pub net: Option<NetId>,
    /// Connected hierarchical net.
    #[serde(default)]
    pub mod_net: Option<ModNetId>,
    /// Offset from the instance origin, or the absolute location of a
    /// top-level port.
    #[serde(default)]
    pub offset: Option<Point>,
    /// External load on a top-level output port, in farads.
    #[serde(default)]
    pub external_cap: f64,
}

/// A hierarchical (module-level) net.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModNet {
    /// Unique ID.
    pub id: ModNetId,
    /// Hierarchical name.
    pub name: String,
    /// Connected pins.
    pub pins: Vec<PinId>,
}

/// The design netlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Netlist {
    /// Top module name.
    pub top: String,
    /// Database units per micron.
    pub dbu_per_micron: i64,
    /// Core area that standard cells must stay inside.
    #[serde(default)]
    pub core: Option<Rect>,
    pub(crate) instances: Vec<Option<Instance>>,
    pub(crate) nets: Vec<Option<Net>>,
    pub(crate) pins: Vec<Option<Pin>>,
    #[serde(default)]
    pub(crate) mod_nets: Vec<Option<ModNet>>,
    /// Auxiliary index: instance name to ID (rebuilt on deserialization).
    #[serde(skip)]
    pub(crate) inst_by_name: HashMap<String, InstId>,
    /// Auxiliary index: net name to ID (rebuilt on deserialization).
    #[serde(skip)]
    pub(crate) net_by_name: HashMap<String, NetId>,
    /// Auxiliary index: top-level port name to pin (rebuilt on deserialization).
    #[serde(skip)]
    pub(crate) port_by_name: HashMap<String, PinId>,
    /// Auxiliary index: hierarchical net name to ID (rebuilt on deserialization).
    #[serde(skip)]
    pub(crate) mod_net_by_name: HashMap<String, ModNetId>,
    #[serde(skip)]
    pub(crate) eco: EcoState,
    #[serde(skip)]
    pub(crate) observing: bool,
    #[serde(skip)]
    pub(crate) events: Vec<NetlistEvent>,
}

impl Netlist {
    /// Creates an empty netlist.
    pub fn new(top: &str, dbu_per_micron: i64) -> Self {
        Self {
            top: top.to_string(),
            dbu_per_micron,
            core: None,
            instances: Vec::new(),
            nets: Vec::new(),
            pins: Vec::new(),
            mod_nets: Vec::new(),
            inst_by_name: HashMap::new(),
            net_by_name: HashMap::new(),
            port_by_name: HashMap::new(),
            mod_net_by_name: HashMap::new(),
            eco: EcoState::default(),
            observing: false,
            events: Vec::new(),
        }
    }

    /// Sets the core area.
    pub fn with_core(mut self, core: Rect) -> Self {
        self.core = Some(core);
        self
    }

    /// Returns the instance with the given ID, if it exists.
    pub fn instance(&self, id: InstId) -> Option<&Instance> {
        self.instances.get(id.index()).and_then(Option::as_ref)
    }

    /// Returns the net with the given ID, if it exists.
    pub fn net(&self, id: NetId) -> Option<&Net> {
        self.nets.get(id.index()).and_then(Option::as_ref)
    }

    /// Returns the pin with the given ID, if it exists.
    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.get(id.index()).and_then(Option::as_ref)
    }

    /// Returns the hierarchical net with the given ID, if it exists.
    pub fn mod_net(&self, id: ModNetId) -> Option<&ModNet> {
        self.mod_nets.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn instance_ref(&self, id: InstId) -> Result<&Instance, NetlistError> {
        self.instance(id).ok_or(NetlistError::UnknownInstance(id))
    }

    pub(crate) fn instance_mut(&mut self, id: InstId) -> Result<&mut Instance, NetlistError> {
        self.instances
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(NetlistError::UnknownInstance(id))
    }

    pub(crate) fn net_ref(&self, id: NetId) -> Result<&Net, NetlistError> {
        self.net(id).ok_or(NetlistError::UnknownNet(id))
    }

    pub(crate) fn net_mut(&mut self, id: NetId) -> Result<&mut Net, NetlistError> {
        self.nets
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(NetlistError::UnknownNet(id))
    }

    pub(crate) fn pin_ref(&self, id: PinId) -> Result<&Pin, NetlistError> {
        self.pin(id).ok_or(NetlistError::UnknownPin(id))
    }

    pub(crate) fn pin_mut(&mut self, id: PinId) -> Result<&mut Pin, NetlistError> {
        self.pins
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(NetlistError::UnknownPin(id))
    }

    pub(crate) fn mod_net_mut(&mut self, id: ModNetId) -> Result<&mut ModNet, NetlistError> {
        self.mod_nets
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(NetlistError::UnknownModNet(id))
    }

    /// Live instances in ID order.
    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.instances.iter().flatten()
    }

    /// Live nets in ID order.
    pub fn nets(&self) -> impl Iterator<Item = &Net> {
        self.nets.iter().flatten()
    }

    /// Live hierarchical nets in ID order.
    pub fn mod_nets(&self) -> impl Iterator<Item = &ModNet> {
        self.mod_nets.iter().flatten()
    }

    /// Top-level port pins in ID order.
    pub fn top_ports(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter().flatten().filter(|p| p.owner.is_none())
    }

    /// Looks up an instance by name.
    pub fn find_instance(&self, name: &str) -> Option<InstId> {
        self.inst_by_name.get(name).copied()
    }

    /// Looks up a net by name.
    pub fn find_net(&self, name: &str) -> Option<NetId> {
        self.net_by_name.get(name).copied()
    }

    /// Looks up a top-level port by name.
    pub fn find_top_port(&self, name: &str) -> Option<PinId> {
        self.port_by_name.get(name).copied()
    }

    /// Looks up a hierarchical net by name.
    pub fn find_mod_net(&self, name: &str) -> Option<ModNetId> {
        self.mod_net_by_name.get(name).copied()
    }

    /// Looks up the pin of `inst` bound to library port `port`.
    pub fn find_pin(&self, inst: InstId, port: &str) -> Option<PinId> {
        self.instance(inst)?
            .pins
            .iter()
            .copied()
            .find(|&p| self.pin(p).is_some_and(|pin| pin.port == port))
    }

    /// Resolves `inst/port` or a bare top-level port name.
    pub fn find_pin_by_path(&self, path: &str) -> Option<PinId> {
        match path.rsplit_once('/') {
            Some((inst, port)) => self.find_pin(self.find_instance(inst)?, port),
            None => self.find_top_port(path),
        }
    }

    /// Number of live instances.
    pub fn instance_count(&self) -> usize {
        self.instances().count()
    }

    /// Number of live nets.
    pub fn net_count(&self) -> usize {
        self.nets().count()
    }

    /// The flat net connected to `pin`.
    pub fn pin_net(&self, pin: PinId) -> Option<NetId> {
        self.pin(pin)?.net
    }

    /// The hierarchical net connected to `pin`.
    pub fn pin_mod_net(&self, pin: PinId) -> Option<ModNetId> {
        self.pin(pin)?.mod_net
    }

    /// The instance owning `pin`; `None` for top-level ports.
    pub fn pin_instance(&self, pin: PinId) -> Option<InstId> {
        self.pin(pin)?.owner
    }

    /// Pins connected to `net`; empty if the net does not exist.
    pub fn net_pins(&self, net: NetId) -> &[PinId] {
        self.net(net).map_or(&[], |n| n.pins.as_slice())
    }

    /// Pins of `inst`; empty if the instance does not exist.
    pub fn instance_pins(&self, inst: InstId) -> &[PinId] {
        self.instance(inst).map_or(&[], |i| i.pins.as_slice())
    }

    /// Returns `true` if `pin` is a top-level port.
    pub fn is_top_port(&self, pin: PinId) -> bool {
        self.pin(pin).is_some_and(|p| p.owner.is_none())
    }

    /// Returns `true` if `net` connects to a top-level port.
    pub fn net_has_port(&self, net: NetId) -> bool {
        self.net_pins(net).iter().any(|&p| self.is_top_port(p))
    }

    /// Returns `true` if `pin` drives its net: an instance output or a
    /// top-level input port.
    pub fn is_driver(&self, pin: PinId) -> bool {
        self.pin(pin).is_some_and(|p| match p.owner {
            Some(_) => p.direction.is_any_output(),
            None => p.direction.is_any_input(),
        })
    }

    /// Returns `true` if `pin` is a load on its net: an instance input or a
    /// top-level output port.
    pub fn is_load(&self, pin: PinId) -> bool {
        self.pin(pin).is_some_and(|p| match p.owner {
            Some(_) => p.direction.is_any_input(),
            None => p.direction.is_any_output(),
        })
    }

    /// Driver pins of `net`.
    pub fn net_drivers(&self, net: NetId) -> Vec<PinId> {
        self.net_pins(net)
            .iter()
            .copied()
            .filter(|&p| self.is_driver(p))
            .collect()
    }

    /// Load pins of `net`.
    pub fn net_loads(&self, net: NetId) -> Vec<PinId> {
        self.net_pins(net)
            .iter()
            .copied()
            .filter(|&p| self.is_load(p))
            .collect()
    }

    /// Location of a pin: the instance origin plus the port offset (or the
    /// instance center when the port has no offset), or the port location for
    /// top-level ports.
    pub fn pin_location(&self, pin: PinId) -> Option<Point> {
        let p = self.pin(pin)?;
        match p.owner {
            Some(inst) => {
                let inst = self.instance(inst)?;
                Some(match p.offset {
                    Some(off) => Point::new(inst.location.x + off.x, inst.location.y + off.y),
                    None => inst.bbox().center(),
                })
            }
            None => Some(p.offset.unwrap_or_default()),
        }
    }

    /// Hierarchical display name: `inst/port` or the port name.
    pub fn pin_name(&self, pin: PinId) -> String {
        match self.pin(pin) {
            Some(p) => match p.owner.and_then(|i| self.instance(i)) {
                Some(inst) => format!("{}/{}", inst.name, p.port),
                None => p.port.clone(),
            },
            None => format!("<pin {pin}>"),
        }
    }

    /// Name of an instance, or a placeholder for a dead ID.
    pub fn instance_name(&self, inst: InstId) -> String {
        self.instance(inst)
            .map_or_else(|| format!("<inst {inst}>"), |i| i.name.clone())
    }

    /// Name of a net, or a placeholder for a dead ID.
    pub fn net_name(&self, net: NetId) -> String {
        self.net(net)
            .map_or_else(|| format!("<net {net}>"), |n| n.name.clone())
    }

    /// Bounding box of all pins on `net`.
    pub fn net_bbox(&self, net: NetId) -> Option<Rect> {
        Rect::bounding(self.net_pins(net).iter().filter_map(|&p| self.pin_location(p)))
    }

    /// Fingerprint of connectivity and cell bindings.
    ///
    /// Covers instance names and cells, and for every flat and hierarchical
    /// net the set of pins it connects. Net names and IDs are excluded, so a
    /// netlist whose nets were recreated with the same connectivity hashes
    /// the same.
    pub fn structural_fingerprint(&self) -> ContentHash {
        let mut records: Vec<String> = self
            .instances()
            .map(|i| format!("I {} {}", i.name, i.cell))
            .collect();
        for net in self.nets() {
            let mut pins: Vec<String> = net.pins.iter().map(|&p| self.pin_name(p)).collect();
            pins.sort();
            records.push(format!("N {}", pins.join(" ")));
        }
        for mod_net in self.mod_nets() {
            let mut pins: Vec<String> = mod_net.pins.iter().map(|&p| self.pin_name(p)).collect();
            pins.sort();
            records.push(format!("M {}", pins.join(" ")));
        }
        for port in self.top_ports() {
            records.push(format!("P {} {:?}", port.port, port.direction));
        }
        records.sort();
        ContentHash::from_records(records)
    }

    /// Rebuilds auxiliary name indices after deserialization.
    pub fn rebuild_indices(&mut self) {
        self.inst_by_name = self
            .instances
            .iter()
            .flatten()
            .map(|i| (i.name.clone(), i.id))
            .collect();
        self.net_by_name = self
            .nets
            .iter()
            .flatten()
            .map(|n| (n.name.clone(), n.id))
            .collect();
        self.port_by_name = self
            .pins
            .iter()
            .flatten()
            .filter(|p| p.owner.is_none())
            .map(|p| (p.port.clone(), p.id))
            .collect();
        self.mod_net_by_name = self
            .mod_nets
            .iter()
            .flatten()
            .map(|m| (m.name.clone(), m.id))
            .collect();
    }

    /// Checks that IDs match their slots and pin/net cross references agree.
    pub fn validate(&self) -> Result<(), NetlistError> {
        let bad = |msg: String| Err(NetlistError::Inconsistent(msg));
        for (i, inst) in self.instances.iter().enumerate() {
            if let Some(inst) = inst {
                if inst.id.index() != i {
                    return bad(format!("instance '{}' stored in slot {i}", inst.name));
                }
                for &p in &inst.pins {
                    if self.pin(p).and_then(|p| p.owner) != Some(inst.id) {
                        return bad(format!("instance '{}' lists foreign pin {p}", inst.name));
                    }
                }
            }
        }
        for (i, net) in self.nets.iter().enumerate() {
            if let Some(net) = net {
                if net.id.index() != i {
                    return bad(format!("net '{}' stored in slot {i}", net.name));
                }
                for &p in &net.pins {
                    if self.pin_net(p) != Some(net.id) {
                        return bad(format!("net '{}' lists pin {p} connected elsewhere", net.name));
                    }
                }
            }
        }
        for (i, pin) in self.pins.iter().enumerate() {
            if let Some(pin) = pin {
                if pin.id.index() != i {
                    return bad(format!("pin '{}' stored in slot {i}", pin.port));
                }
                if let Some(net) = pin.net {
                    if !self.net_pins(net).contains(&pin.id) {
                        return bad(format!("pin {} missing from net {net}", self.pin_name(pin.id)));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_liberty::demo_library;

    fn small() -> (Netlist, InstId, NetId) {
        let lib = demo_library().unwrap();
        let mut nl = Netlist::new("top", 1000).with_core(Rect::new(0, 0, 100_000, 100_000));
        let inp = nl
            .create_top_port("in", PortDirection::Input, Point::new(0, 5000))
            .unwrap();
        let buf = nl
            .create_instance(&lib, lib.find_cell("BUF_X1").unwrap(), "b1")
            .unwrap();
        nl.set_location(buf, Point::new(2000, 4000)).unwrap();
        let n = nl.create_net("n_in").unwrap();
        nl.connect(inp, n).unwrap();
        nl.connect(nl.find_pin(buf, "A").unwrap(), n).unwrap();
        (nl, buf, n)
    }

    #[test]
    fn lookups_by_name_and_path() {
        let (nl, buf, n) = small();
        assert_eq!(nl.find_instance("b1"), Some(buf));
        assert_eq!(nl.find_net("n_in"), Some(n));
        let a = nl.find_pin_by_path("b1/A").unwrap();
        assert_eq!(nl.pin_name(a), "b1/A");
        assert_eq!(nl.find_pin_by_path("in"), nl.find_top_port("in"));
        assert!(nl.find_pin_by_path("b1/Q").is_none());
    }

    #[test]
    fn drivers_and_loads() {
        let (nl, _, n) = small();
        let port = nl.find_top_port("in").unwrap();
        assert_eq!(nl.net_drivers(n), vec![port]);
        assert_eq!(nl.net_loads(n), vec![nl.find_pin_by_path("b1/A").unwrap()]);
        assert!(nl.net_has_port(n));
    }

    #[test]
    fn pin_locations_use_offsets() {
        let (nl, _, _) = small();
        let a = nl.find_pin_by_path("b1/A").unwrap();
        assert_eq!(nl.pin_location(a), Some(Point::new(2000, 4700)));
        let z = nl.find_pin_by_path("b1/Z").unwrap();
        assert_eq!(nl.pin_location(z), Some(Point::new(2570, 4700)));
        let port = nl.find_top_port("in").unwrap();
        assert_eq!(nl.pin_location(port), Some(Point::new(0, 5000)));
    }

    #[test]
    fn fingerprint_ignores_net_names() {
        let (mut a, _, n) = small();
        let (b, _, _) = small();
        assert_eq!(a.structural_fingerprint(), b.structural_fingerprint());
        a.rename_net(n, "renamed").unwrap();
        assert_eq!(a.structural_fingerprint(), b.structural_fingerprint());
        let z = a.find_pin_by_path("b1/Z").unwrap();
        a.connect(z, n).unwrap();
        assert_ne!(a.structural_fingerprint(), b.structural_fingerprint());
    }

    #[test]
    fn serde_roundtrip_rebuilds_indices() {
        let (nl, buf, _) = small();
        let json = serde_json::to_string(&nl).unwrap();
        let mut back: Netlist = serde_json::from_str(&json).unwrap();
        back.rebuild_indices();
        assert_eq!(back.find_instance("b1"), Some(buf));
        assert!(back.validate().is_ok());
        assert_eq!(back.structural_fingerprint(), nl.structural_fingerprint());
    }
}
