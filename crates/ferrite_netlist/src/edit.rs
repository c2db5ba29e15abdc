//! Netlist mutation primitives.
//!
//! Every structural edit records an [`EcoOp`] while an ECO is recording and
//! emits a [`NetlistEvent`] while observation is enabled. Setup-only setters
//! (signal type, special flag, external port load) are not recorded.

use crate::data::{Instance, ModNet, Net, Netlist, Pin, PlacementStatus, SignalType};
use crate::eco::EcoOp;
use crate::error::NetlistError;
use crate::ids::{InstId, ModNetId, NetId, PinId};
use crate::observer::NetlistEvent;
use ferrite_common::Point;
use ferrite_liberty::{LibCellId, Library, PortDirection};

impl Netlist {
    /// Creates an unplaced instance of `cell` with one pin per library port.
    pub fn create_instance(
        &mut self,
        library: &Library,
        cell: LibCellId,
        name: &str,
    ) -> Result<InstId, NetlistError> {
        if self.inst_by_name.contains_key(name) {
            return Err(NetlistError::DuplicateName {
                kind: "instance",
                name: name.to_string(),
            });
        }
        let lib_cell = library.cell(cell);
        let id = InstId::from_raw(self.instances.len() as u32);
        let mut pins = Vec::with_capacity(lib_cell.ports.len());
        for port in &lib_cell.ports {
            let pin_id = PinId::from_raw(self.pins.len() as u32);
            self.pins.push(Some(Pin {
                id: pin_id,
                port: port.name.clone(),
                owner: Some(id),
                direction: port.direction,
                net: None,
                mod_net: None,
                offset: port.offset,
                external_cap: 0.0,
            }));
            pins.push(pin_id);
        }
        let (width, height) = lib_cell.master.map_or((0, 0), |m| (m.width, m.height));
        self.instances.push(Some(Instance {
            id,
            name: name.to_string(),
            cell,
            location: Point::default(),
            width,
            height,
            placement: PlacementStatus::Unplaced,
            dont_touch: false,
            pins,
        }));
        self.inst_by_name.insert(name.to_string(), id);
        self.record(EcoOp::CreateInst { inst: id });
        self.emit(NetlistEvent::InstanceCreated { inst: id });
        Ok(id)
    }

    /// Disconnects every pin of `inst` and deletes it.
    pub fn delete_instance(&mut self, inst: InstId) -> Result<(), NetlistError> {
        let pins = self.instance_ref(inst)?.pins.clone();
        for &pin in &pins {
            self.disconnect(pin)?;
            self.disconnect_mod(pin)?;
        }
        let snapshot = self.instances[inst.index()]
            .take()
            .ok_or(NetlistError::UnknownInstance(inst))?;
        let pin_snapshots: Vec<Pin> = pins
            .iter()
            .filter_map(|p| self.pins.get_mut(p.index()).and_then(Option::take))
            .collect();
        self.inst_by_name.remove(&snapshot.name);
        self.record(EcoOp::DeleteInst {
            instance: snapshot,
            pins: pin_snapshots,
        });
        self.emit(NetlistEvent::InstanceDeleted { inst });
        Ok(())
    }

    /// Creates an empty signal net.
    pub fn create_net(&mut self, name: &str) -> Result<NetId, NetlistError> {
        if self.net_by_name.contains_key(name) {
            return Err(NetlistError::DuplicateName {
                kind: "net",
                name: name.to_string(),
            });
        }
        let id = NetId::from_raw(self.nets.len() as u32);
        self.nets.push(Some(Net {
            id,
            name: name.to_string(),
            pins: Vec::new(),
            dont_touch: false,
            signal_type: SignalType::Signal,
            special: false,
        }));
        self.net_by_name.insert(name.to_string(), id);
        self.record(EcoOp::CreateNet { net: id });
        self.emit(NetlistEvent::NetCreated { net: id });
        Ok(id)
    }

    /// Disconnects every pin from `net` and deletes it.
    pub fn delete_net(&mut self, net: NetId) -> Result<(), NetlistError> {
        let pins = self.net_ref(net)?.pins.clone();
        for pin in pins {
            self.disconnect(pin)?;
        }
        let snapshot = self.nets[net.index()]
            .take()
            .ok_or(NetlistError::UnknownNet(net))?;
        self.net_by_name.remove(&snapshot.name);
        self.record(EcoOp::DeleteNet { net: snapshot });
        self.emit(NetlistEvent::NetDeleted { net });
        Ok(())
    }

    /// Creates a top-level port at `location`.
    pub fn create_top_port(
        &mut self,
        name: &str,
        direction: PortDirection,
        location: Point,
    ) -> Result<PinId, NetlistError> {
        if self.port_by_name.contains_key(name) {
            return Err(NetlistError::DuplicateName {
                kind: "port",
                name: name.to_string(),
            });
        }
        let id = PinId::from_raw(self.pins.len() as u32);
        self.pins.push(Some(Pin {
            id,
            port: name.to_string(),
            owner: None,
            direction,
            net: None,
            mod_net: None,
            offset: Some(location),
            external_cap: 0.0,
        }));
        self.port_by_name.insert(name.to_string(), id);
        self.record(EcoOp::CreatePort { pin: id });
        Ok(id)
    }

    /// Connects `pin` to `net`, first disconnecting it from any other net.
    pub fn connect(&mut self, pin: PinId, net: NetId) -> Result<(), NetlistError> {
        match self.pin_ref(pin)?.net {
            Some(current) if current == net => return Ok(()),
            Some(_) => self.disconnect(pin)?,
            None => {}
        }
        self.net_mut(net)?.pins.push(pin);
        self.pin_mut(pin)?.net = Some(net);
        self.record(EcoOp::Connect { pin, net });
        self.emit(NetlistEvent::Connected { pin, net });
        Ok(())
    }

    /// Disconnects `pin` from its flat net. No-op when unconnected.
    pub fn disconnect(&mut self, pin: PinId) -> Result<(), NetlistError> {
        let Some(net) = self.pin_ref(pin)?.net else {
            return Ok(());
        };
        let pins = &mut self.net_mut(net)?.pins;
        let index = pins.iter().position(|&p| p == pin).unwrap_or(pins.len());
        if index < pins.len() {
            pins.remove(index);
        }
        self.pin_mut(pin)?.net = None;
        self.record(EcoOp::Disconnect { pin, net, index });
        self.emit(NetlistEvent::Disconnected { pin, net });
        Ok(())
    }

    pub(crate) fn reconnect_at(
        &mut self,
        pin: PinId,
        net: NetId,
        index: usize,
    ) -> Result<(), NetlistError> {
        if self.pin_ref(pin)?.net.is_some() {
            self.disconnect(pin)?;
        }
        let pins = &mut self.net_mut(net)?.pins;
        let index = index.min(pins.len());
        pins.insert(index, pin);
        self.pin_mut(pin)?.net = Some(net);
        self.emit(NetlistEvent::Connected { pin, net });
        Ok(())
    }

    /// Creates a hierarchical net.
    pub fn create_mod_net(&mut self, name: &str) -> Result<ModNetId, NetlistError> {
        if self.mod_net_by_name.contains_key(name) {
            return Err(NetlistError::DuplicateName {
                kind: "hierarchical net",
                name: name.to_string(),
            });
        }
        let id = ModNetId::from_raw(self.mod_nets.len() as u32);
        self.mod_nets.push(Some(ModNet {
            id,
            name: name.to_string(),
            pins: Vec::new(),
        }));
        self.mod_net_by_name.insert(name.to_string(), id);
        self.record(EcoOp::CreateModNet { mod_net: id });
        Ok(id)
    }

    /// Disconnects every pin from `mod_net` and deletes it.
    pub fn delete_mod_net(&mut self, mod_net: ModNetId) -> Result<(), NetlistError> {
        let pins = self
            .mod_net(mod_net)
            .ok_or(NetlistError::UnknownModNet(mod_net))?
            .pins
            .clone();
        for pin in pins {
            self.disconnect_mod(pin)?;
        }
        let snapshot = self.mod_nets[mod_net.index()]
            .take()
            .ok_or(NetlistError::UnknownModNet(mod_net))?;
        self.mod_net_by_name.remove(&snapshot.name);
        self.record(EcoOp::DeleteModNet { mod_net: snapshot });
        Ok(())
    }

    /// Renames a hierarchical net.
    pub fn rename_mod_net(&mut self, mod_net: ModNetId, name: &str) -> Result<(), NetlistError> {
        if self.mod_net_by_name.get(name).is_some_and(|&m| m != mod_net) {
            return Err(NetlistError::DuplicateName {
                kind: "hierarchical net",
                name: name.to_string(),
            });
        }
        let entry = self.mod_net_mut(mod_net)?;
        let old = std::mem::replace(&mut entry.name, name.to_string());
        self.mod_net_by_name.remove(&old);
        self.mod_net_by_name.insert(name.to_string(), mod_net);
        self.record(EcoOp::RenameModNet { mod_net, old });
        Ok(())
    }

    /// Connects `pin` to a hierarchical net, replacing any previous one.
    pub fn connect_mod(&mut self, pin: PinId, mod_net: ModNetId) -> Result<(), NetlistError> {
        match self.pin_ref(pin)?.mod_net {
            Some(current) if current == mod_net => return Ok(()),
            Some(_) => self.disconnect_mod(pin)?,
            None => {}
        }
        self.mod_net_mut(mod_net)?.pins.push(pin);
        self.pin_mut(pin)?.mod_net = Some(mod_net);
        self.record(EcoOp::ConnectMod { pin, mod_net });
        Ok(())
    }

    /// Disconnects `pin` from its hierarchical net. No-op when unconnected.
    pub fn disconnect_mod(&mut self, pin: PinId) -> Result<(), NetlistError> {
        let Some(mod_net) = self.pin_ref(pin)?.mod_net else {
            return Ok(());
        };
        self.mod_net_mut(mod_net)?.pins.retain(|&p| p != pin);
        self.pin_mut(pin)?.mod_net = None;
        self.record(EcoOp::DisconnectMod { pin, mod_net });
        Ok(())
    }

    /// Rebinds `inst` to `cell`, keeping its pins matched by port name.
    ///
    /// Fails without modifying anything if `cell` lacks one of the
    /// instance's ports.
    pub fn swap_master(
        &mut self,
        library: &Library,
        inst: InstId,
        cell: LibCellId,
    ) -> Result<(), NetlistError> {
        let instance = self.instance_ref(inst)?;
        let lib_cell = library.cell(cell);
        let mut rebound = Vec::with_capacity(instance.pins.len());
        for &pin in &instance.pins {
            let port_name = &self.pin_ref(pin)?.port;
            let port = lib_cell
                .port(port_name)
                .ok_or_else(|| NetlistError::PortMismatch {
                    inst: instance.name.clone(),
                    cell: lib_cell.name.clone(),
                    port: port_name.clone(),
                })?;
            rebound.push((pin, port.direction, port.offset));
        }
        let (width, height) = lib_cell
            .master
            .map_or((instance.width, instance.height), |m| (m.width, m.height));

        let mut old_pins = Vec::with_capacity(rebound.len());
        for (pin, direction, offset) in rebound {
            let p = self.pin_mut(pin)?;
            old_pins.push((pin, p.direction, p.offset));
            p.direction = direction;
            p.offset = offset;
        }
        let instance = self.instance_mut(inst)?;
        let op = EcoOp::SwapMaster {
            inst,
            cell: instance.cell,
            width: instance.width,
            height: instance.height,
            pins: old_pins,
        };
        instance.cell = cell;
        instance.width = width;
        instance.height = height;
        self.record(op);
        self.emit(NetlistEvent::MasterSwapped { inst });
        Ok(())
    }

    /// Moves `inst` so its origin is at `location`.
    pub fn set_location(&mut self, inst: InstId, location: Point) -> Result<(), NetlistError> {
        let instance = self.instance_mut(inst)?;
        let old = std::mem::replace(&mut instance.location, location);
        self.record(EcoOp::Move { inst, old });
        Ok(())
    }

    /// Sets the placement status of `inst`.
    pub fn set_placement(
        &mut self,
        inst: InstId,
        status: PlacementStatus,
    ) -> Result<(), NetlistError> {
        let instance = self.instance_mut(inst)?;
        let old = std::mem::replace(&mut instance.placement, status);
        self.record(EcoOp::Placement { inst, old });
        Ok(())
    }

    /// Sets the don't-touch flag of `inst`.
    pub fn set_inst_dont_touch(&mut self, inst: InstId, value: bool) -> Result<(), NetlistError> {
        let instance = self.instance_mut(inst)?;
        let old = std::mem::replace(&mut instance.dont_touch, value);
        self.record(EcoOp::InstDontTouch { inst, old });
        Ok(())
    }

    /// Sets the don't-touch flag of `net`.
    pub fn set_net_dont_touch(&mut self, net: NetId, value: bool) -> Result<(), NetlistError> {
        let entry = self.net_mut(net)?;
        let old = std::mem::replace(&mut entry.dont_touch, value);
        self.record(EcoOp::NetDontTouch { net, old });
        Ok(())
    }

    /// Renames a flat net.
    pub fn rename_net(&mut self, net: NetId, name: &str) -> Result<(), NetlistError> {
        if self.net_by_name.get(name).is_some_and(|&n| n != net) {
            return Err(NetlistError::DuplicateName {
                kind: "net",
                name: name.to_string(),
            });
        }
        let entry = self.net_mut(net)?;
        let old = std::mem::replace(&mut entry.name, name.to_string());
        self.net_by_name.remove(&old);
        self.net_by_name.insert(name.to_string(), net);
        self.record(EcoOp::RenameNet { net, old });
        Ok(())
    }

    /// Swaps the names of two flat nets.
    pub fn swap_net_names(&mut self, a: NetId, b: NetId) -> Result<(), NetlistError> {
        if a == b {
            return Ok(());
        }
        let name_a = self.net_ref(a)?.name.clone();
        let name_b = self.net_ref(b)?.name.clone();
        let scratch = format!("{name_a}\u{0}swap");
        self.rename_net(a, &scratch)?;
        self.rename_net(b, &name_a)?;
        self.rename_net(a, &name_b)
    }

    /// Moves every pin of `removed` onto `survivor`. `removed` is left empty.
    pub fn merge_nets(&mut self, survivor: NetId, removed: NetId) -> Result<(), NetlistError> {
        self.net_ref(survivor)?;
        let pins = self.net_ref(removed)?.pins.clone();
        for pin in pins {
            self.connect(pin, survivor)?;
        }
        Ok(())
    }

    /// Sets the signal type of `net`. Not recorded.
    pub fn set_net_signal_type(
        &mut self,
        net: NetId,
        signal_type: SignalType,
    ) -> Result<(), NetlistError> {
        self.net_mut(net)?.signal_type = signal_type;
        Ok(())
    }

    /// Marks `net` as a pre-routed special net. Not recorded.
    pub fn set_net_special(&mut self, net: NetId, special: bool) -> Result<(), NetlistError> {
        self.net_mut(net)?.special = special;
        Ok(())
    }

    /// Sets the external load on a top-level port. Not recorded.
    pub fn set_port_external_cap(&mut self, pin: PinId, cap: f64) -> Result<(), NetlistError> {
        self.pin_mut(pin)?.external_cap = cap;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_liberty::demo_library;

    fn setup() -> (Library, Netlist) {
        (demo_library().unwrap(), Netlist::new("top", 1000))
    }

    #[test]
    fn create_instance_makes_pins_per_port() {
        let (lib, mut nl) = setup();
        let nand = nl
            .create_instance(&lib, lib.find_cell("NAND2_X1").unwrap(), "u1")
            .unwrap();
        let ports: Vec<&str> = nl
            .instance_pins(nand)
            .iter()
            .map(|&p| nl.pin(p).unwrap().port.as_str())
            .collect();
        assert_eq!(ports, vec!["A1", "A2", "ZN"]);
        assert!(nl.create_instance(&lib, lib.find_cell("INV_X1").unwrap(), "u1").is_err());
    }

    #[test]
    fn connect_moves_between_nets() {
        let (lib, mut nl) = setup();
        let b = nl
            .create_instance(&lib, lib.find_cell("BUF_X1").unwrap(), "b")
            .unwrap();
        let a = nl.find_pin(b, "A").unwrap();
        let n1 = nl.create_net("n1").unwrap();
        let n2 = nl.create_net("n2").unwrap();
        nl.connect(a, n1).unwrap();
        nl.connect(a, n2).unwrap();
        assert!(nl.net_pins(n1).is_empty());
        assert_eq!(nl.net_pins(n2), &[a]);
        nl.disconnect(a).unwrap();
        nl.disconnect(a).unwrap();
        assert_eq!(nl.pin_net(a), None);
        assert!(nl.validate().is_ok());
    }

    #[test]
    fn delete_instance_disconnects() {
        let (lib, mut nl) = setup();
        let b = nl
            .create_instance(&lib, lib.find_cell("BUF_X1").unwrap(), "b")
            .unwrap();
        let n = nl.create_net("n").unwrap();
        nl.connect(nl.find_pin(b, "Z").unwrap(), n).unwrap();
        nl.delete_instance(b).unwrap();
        assert!(nl.instance(b).is_none());
        assert!(nl.net_pins(n).is_empty());
        assert_eq!(nl.find_instance("b"), None);
        assert!(nl.validate().is_ok());
    }

    #[test]
    fn swap_master_checks_ports() {
        let (lib, mut nl) = setup();
        let b = nl
            .create_instance(&lib, lib.find_cell("BUF_X1").unwrap(), "b")
            .unwrap();
        let x4 = lib.find_cell("BUF_X4").unwrap();
        nl.swap_master(&lib, b, x4).unwrap();
        assert_eq!(nl.instance(b).unwrap().cell, x4);
        assert_eq!(nl.instance(b).unwrap().width, 1140);

        let inv = lib.find_cell("INV_X1").unwrap();
        let err = nl.swap_master(&lib, b, inv).unwrap_err();
        assert!(matches!(err, NetlistError::PortMismatch { .. }));
        assert_eq!(nl.instance(b).unwrap().cell, x4);
    }

    #[test]
    fn swap_net_names_keeps_index() {
        let (_, mut nl) = setup();
        let a = nl.create_net("a").unwrap();
        let b = nl.create_net("b").unwrap();
        nl.swap_net_names(a, b).unwrap();
        assert_eq!(nl.find_net("a"), Some(b));
        assert_eq!(nl.find_net("b"), Some(a));
        assert!(nl.rename_net(a, "a").is_err());
    }

    #[test]
    fn merge_moves_pins() {
        let (lib, mut nl) = setup();
        let b = nl
            .create_instance(&lib, lib.find_cell("BUF_X1").unwrap(), "b")
            .unwrap();
        let keep = nl.create_net("keep").unwrap();
        let gone = nl.create_net("gone").unwrap();
        nl.connect(nl.find_pin(b, "A").unwrap(), keep).unwrap();
        nl.connect(nl.find_pin(b, "Z").unwrap(), gone).unwrap();
        nl.merge_nets(keep, gone).unwrap();
        assert_eq!(nl.net_pins(keep).len(), 2);
        assert!(nl.net_pins(gone).is_empty());
    }

    #[test]
    fn mod_nets_track_pins() {
        let (lib, mut nl) = setup();
        let b = nl
            .create_instance(&lib, lib.find_cell("BUF_X1").unwrap(), "b")
            .unwrap();
        let a = nl.find_pin(b, "A").unwrap();
        let m = nl.create_mod_net("sub/n").unwrap();
        nl.connect_mod(a, m).unwrap();
        assert_eq!(nl.pin_mod_net(a), Some(m));
        nl.rename_mod_net(m, "sub/n2").unwrap();
        assert_eq!(nl.find_mod_net("sub/n2"), Some(m));
        nl.delete_mod_net(m).unwrap();
        assert_eq!(nl.pin_mod_net(a), None);
    }
}
