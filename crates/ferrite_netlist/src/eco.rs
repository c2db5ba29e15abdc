//! Engineering-change-order (ECO) log with structural undo.
//!
//! While an ECO is open, every edit primitive appends an [`EcoOp`] carrying
//! enough pre-state to reverse it. [`Netlist::undo_eco_to`] pops operations
//! back to a recorded position and reverses them in LIFO order. Deleted
//! objects are revived in their original slots, so IDs held by callers stay
//! valid across an undo.
//!
//! Undo is lenient: an operation whose objects no longer exist (or whose
//! name has since been taken) is skipped and counted in the [`UndoReport`].

use crate::data::{Instance, ModNet, Net, Netlist, Pin, PlacementStatus};
use crate::error::NetlistError;
use crate::ids::{InstId, ModNetId, NetId, PinId};
use crate::observer::NetlistEvent;
use ferrite_common::Point;
use ferrite_liberty::{LibCellId, PortDirection};
use std::collections::HashSet;

/// One reversible netlist edit.
#[derive(Debug, Clone, PartialEq)]
pub enum EcoOp {
    /// An instance (and its pins) was created.
    CreateInst {
        /// The new instance.
        inst: InstId,
    },
    /// An instance was deleted after its pins were disconnected.
    DeleteInst {
        /// Instance as it was at deletion.
        instance: Instance,
        /// Its pins, already disconnected.
        pins: Vec<Pin>,
    },
    /// A flat net was created.
    CreateNet {
        /// The new net.
        net: NetId,
    },
    /// A flat net was deleted after its pins were disconnected.
    DeleteNet {
        /// Net as it was at deletion.
        net: Net,
    },
    /// A top-level port was created.
    CreatePort {
        /// The port pin.
        pin: PinId,
    },
    /// A pin was connected to a flat net.
    Connect {
        /// The pin.
        pin: PinId,
        /// The net.
        net: NetId,
    },
    /// A pin was disconnected from a flat net.
    Disconnect {
        /// The pin.
        pin: PinId,
        /// The net it left.
        net: NetId,
        /// Its position in the net's pin list.
        index: usize,
    },
    /// A pin was connected to a hierarchical net.
    ConnectMod {
        /// The pin.
        pin: PinId,
        /// The hierarchical net.
        mod_net: ModNetId,
    },
    /// A pin was disconnected from a hierarchical net.
    DisconnectMod {
        /// The pin.
        pin: PinId,
        /// The hierarchical net it left.
        mod_net: ModNetId,
    },
    /// A hierarchical net was created.
    CreateModNet {
        /// The new hierarchical net.
        mod_net: ModNetId,
    },
    /// A hierarchical net was deleted.
    DeleteModNet {
        /// Hierarchical net as it was at deletion.
        mod_net: ModNet,
    },
    /// A hierarchical net was renamed.
    RenameModNet {
        /// The hierarchical net.
        mod_net: ModNetId,
        /// Its previous name.
        old: String,
    },
    /// An instance was rebound to another library cell.
    SwapMaster {
        /// The instance.
        inst: InstId,
        /// Previous cell.
        cell: LibCellId,
        /// Previous width.
        width: i64,
        /// Previous height.
        height: i64,
        /// Previous pin direction and offset per pin.
        pins: Vec<(PinId, PortDirection, Option<Point>)>,
    },
    /// An instance was moved.
    Move {
        /// The instance.
        inst: InstId,
        /// Previous origin.
        old: Point,
    },
    /// An instance's placement status changed.
    Placement {
        /// The instance.
        inst: InstId,
        /// Previous status.
        old: PlacementStatus,
    },
    /// An instance's don't-touch flag changed.
    InstDontTouch {
        /// The instance.
        inst: InstId,
        /// Previous value.
        old: bool,
    },
    /// A net's don't-touch flag changed.
    NetDontTouch {
        /// The net.
        net: NetId,
        /// Previous value.
        old: bool,
    },
    /// A flat net was renamed.
    RenameNet {
        /// The net.
        net: NetId,
        /// Its previous name.
        old: String,
    },
}

/// Outcome of an undo request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UndoReport {
    /// Operations reversed.
    pub undone: usize,
    /// Operations skipped because their objects were gone.
    pub skipped: usize,
}

/// An instance and a net captured just before a removal that bypasses the
/// ECO log, so both can be put back under their original IDs.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalSnapshot {
    instance: Instance,
    pins: Vec<Pin>,
    net: Net,
    /// Instance pins on other nets: pin, net, position in the net.
    positions: Vec<(PinId, NetId, usize)>,
}

impl RemovalSnapshot {
    /// The captured instance.
    pub fn instance(&self) -> InstId {
        self.instance.id
    }

    /// The captured net.
    pub fn net(&self) -> NetId {
        self.net.id
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct EcoState {
    active: bool,
    suspended: u32,
    ops: Vec<EcoOp>,
}

impl EcoState {
    fn recording(&self) -> bool {
        self.active && self.suspended == 0
    }
}

impl Netlist {
    pub(crate) fn record(&mut self, op: EcoOp) {
        if self.eco.recording() {
            self.eco.ops.push(op);
        }
    }

    /// Opens an ECO. Fails if one is already open.
    pub fn begin_eco(&mut self) -> Result<(), NetlistError> {
        if self.eco.active {
            return Err(NetlistError::EcoAlreadyActive);
        }
        self.eco = EcoState {
            active: true,
            suspended: 0,
            ops: Vec::new(),
        };
        Ok(())
    }

    /// Commits the open ECO, discarding its log. Returns the number of
    /// operations it held.
    pub fn end_eco(&mut self) -> Result<usize, NetlistError> {
        if !self.eco.active {
            return Err(NetlistError::NoActiveEco);
        }
        let count = self.eco.ops.len();
        self.eco = EcoState::default();
        Ok(count)
    }

    /// Reverses every operation of the open ECO and closes it.
    pub fn undo_eco(&mut self) -> Result<UndoReport, NetlistError> {
        let report = self.undo_eco_to(0)?;
        self.end_eco()?;
        Ok(report)
    }

    /// Returns `true` while an ECO is open.
    pub fn eco_active(&self) -> bool {
        self.eco.active
    }

    /// Returns `true` if the open ECO has recorded nothing (or none is open).
    pub fn eco_empty(&self) -> bool {
        self.eco.ops.is_empty()
    }

    /// Current length of the ECO log; a later [`Self::undo_eco_to`] with this
    /// value reverses everything recorded after this point.
    pub fn eco_position(&self) -> usize {
        self.eco.ops.len()
    }

    /// Pauses recording. Calls nest; each must be paired with
    /// [`Self::resume_eco`].
    pub fn suspend_eco(&mut self) {
        self.eco.suspended += 1;
    }

    /// Resumes recording paused by [`Self::suspend_eco`].
    pub fn resume_eco(&mut self) {
        self.eco.suspended = self.eco.suspended.saturating_sub(1);
    }

    /// Captures `inst` and `net` before they are deleted with recording
    /// suspended.
    pub fn snapshot_removal(&self, inst: InstId, net: NetId) -> Result<RemovalSnapshot, NetlistError> {
        let instance = self.instance_ref(inst)?.clone();
        let net = self.net_ref(net)?.clone();
        let pins = instance
            .pins
            .iter()
            .map(|&p| self.pin_ref(p).cloned())
            .collect::<Result<Vec<Pin>, _>>()?;
        let positions = pins
            .iter()
            .filter_map(|p| {
                let on = p.net.filter(|&n| n != net.id)?;
                let index = self.net_pins(on).iter().position(|&q| q == p.id)?;
                Some((p.id, on, index))
            })
            .collect();
        Ok(RemovalSnapshot {
            instance,
            pins,
            net,
            positions,
        })
    }

    /// Puts back the instance and net of `snapshot` under their original IDs
    /// and names, with the net's pins in their recorded order and the
    /// instance's other pins back on their nets. Not recorded.
    ///
    /// Returns `Ok(false)` without editing when an ID or name has been
    /// reused, or a pin or net it connects to no longer exists.
    pub fn restore_removal(&mut self, snapshot: &RemovalSnapshot) -> Result<bool, NetlistError> {
        let own: HashSet<PinId> = snapshot.pins.iter().map(|p| p.id).collect();
        let inst_free = self
            .instances
            .get(snapshot.instance.id.index())
            .is_some_and(Option::is_none)
            && !self.inst_by_name.contains_key(&snapshot.instance.name)
            && own
                .iter()
                .all(|p| self.pins.get(p.index()).is_some_and(Option::is_none));
        let net_free = self
            .nets
            .get(snapshot.net.id.index())
            .is_some_and(Option::is_none)
            && !self.net_by_name.contains_key(&snapshot.net.name);
        let loads_alive = snapshot
            .net
            .pins
            .iter()
            .filter(|p| !own.contains(p))
            .all(|&p| self.pin(p).is_some());
        let nets_alive = snapshot
            .positions
            .iter()
            .all(|&(_, net, _)| self.net(net).is_some());
        if !(inst_free && net_free && loads_alive && nets_alive) {
            return Ok(false);
        }

        let net_id = snapshot.net.id;
        self.revive_net(Net {
            pins: Vec::new(),
            ..snapshot.net.clone()
        });
        let detached = snapshot
            .pins
            .iter()
            .map(|p| Pin {
                net: None,
                mod_net: None,
                ..p.clone()
            })
            .collect();
        self.revive_instance(snapshot.instance.clone(), detached);
        for (index, &pin) in snapshot.net.pins.iter().enumerate() {
            self.reconnect_at(pin, net_id, index)?;
        }
        for &(pin, net, index) in &snapshot.positions {
            self.reconnect_at(pin, net, index)?;
        }
        for pin in &snapshot.pins {
            if let Some(mod_net) = pin.mod_net.filter(|&m| self.mod_net(m).is_some()) {
                self.connect_mod(pin.id, mod_net)?;
            }
        }
        Ok(true)
    }

    /// Reverses operations recorded after `position`, newest first.
    pub fn undo_eco_to(&mut self, position: usize) -> Result<UndoReport, NetlistError> {
        if !self.eco.active {
            return Err(NetlistError::NoActiveEco);
        }
        let mut report = UndoReport::default();
        self.suspend_eco();
        while self.eco.ops.len() > position {
            let Some(op) = self.eco.ops.pop() else { break };
            if self.reverse(op) {
                report.undone += 1;
            } else {
                report.skipped += 1;
            }
        }
        self.resume_eco();
        if report.skipped > 0 {
            tracing::warn!(skipped = report.skipped, "ECO undo skipped stale operations");
        }
        Ok(report)
    }

    fn reverse(&mut self, op: EcoOp) -> bool {
        match op {
            EcoOp::CreateInst { inst } => self.delete_instance(inst).is_ok(),
            EcoOp::DeleteInst { instance, pins } => self.revive_instance(instance, pins),
            EcoOp::CreateNet { net } => self.delete_net(net).is_ok(),
            EcoOp::DeleteNet { net } => self.revive_net(net),
            EcoOp::CreatePort { pin } => self.remove_port(pin),
            EcoOp::Connect { pin, net } => {
                if self.pin_net(pin) == Some(net) {
                    self.disconnect(pin).is_ok()
                } else {
                    false
                }
            }
            EcoOp::Disconnect { pin, net, index } => self.reconnect_at(pin, net, index).is_ok(),
            EcoOp::ConnectMod { pin, mod_net } => {
                if self.pin_mod_net(pin) == Some(mod_net) {
                    self.disconnect_mod(pin).is_ok()
                } else {
                    false
                }
            }
            EcoOp::DisconnectMod { pin, mod_net } => self.connect_mod(pin, mod_net).is_ok(),
            EcoOp::CreateModNet { mod_net } => self.delete_mod_net(mod_net).is_ok(),
            EcoOp::DeleteModNet { mod_net } => self.revive_mod_net(mod_net),
            EcoOp::RenameModNet { mod_net, old } => self.rename_mod_net(mod_net, &old).is_ok(),
            EcoOp::SwapMaster {
                inst,
                cell,
                width,
                height,
                pins,
            } => self.restore_master(inst, cell, width, height, pins),
            EcoOp::Move { inst, old } => self.set_location(inst, old).is_ok(),
            EcoOp::Placement { inst, old } => self.set_placement(inst, old).is_ok(),
            EcoOp::InstDontTouch { inst, old } => self.set_inst_dont_touch(inst, old).is_ok(),
            EcoOp::NetDontTouch { net, old } => self.set_net_dont_touch(net, old).is_ok(),
            EcoOp::RenameNet { net, old } => self.rename_net(net, &old).is_ok(),
        }
    }

    fn revive_instance(&mut self, instance: Instance, pins: Vec<Pin>) -> bool {
        let slot_free = self
            .instances
            .get(instance.id.index())
            .is_some_and(Option::is_none);
        let pins_free = pins
            .iter()
            .all(|p| self.pins.get(p.id.index()).is_some_and(Option::is_none));
        if !slot_free || !pins_free || self.inst_by_name.contains_key(&instance.name) {
            return false;
        }
        let id = instance.id;
        for pin in pins {
            let index = pin.id.index();
            self.pins[index] = Some(pin);
        }
        self.inst_by_name.insert(instance.name.clone(), id);
        self.instances[id.index()] = Some(instance);
        self.emit(NetlistEvent::InstanceCreated { inst: id });
        true
    }

    fn revive_net(&mut self, net: Net) -> bool {
        let slot_free = self.nets.get(net.id.index()).is_some_and(Option::is_none);
        if !slot_free || self.net_by_name.contains_key(&net.name) {
            return false;
        }
        let id = net.id;
        self.net_by_name.insert(net.name.clone(), id);
        self.nets[id.index()] = Some(net);
        self.emit(NetlistEvent::NetCreated { net: id });
        true
    }

    fn revive_mod_net(&mut self, mod_net: ModNet) -> bool {
        let slot_free = self
            .mod_nets
            .get(mod_net.id.index())
            .is_some_and(Option::is_none);
        if !slot_free || self.mod_net_by_name.contains_key(&mod_net.name) {
            return false;
        }
        let id = mod_net.id;
        self.mod_net_by_name.insert(mod_net.name.clone(), id);
        self.mod_nets[id.index()] = Some(mod_net);
        true
    }

    fn remove_port(&mut self, pin: PinId) -> bool {
        if !self.is_top_port(pin) || self.disconnect(pin).is_err() || self.disconnect_mod(pin).is_err() {
            return false;
        }
        match self.pins[pin.index()].take() {
            Some(port) => {
                self.port_by_name.remove(&port.port);
                true
            }
            None => false,
        }
    }

    fn restore_master(
        &mut self,
        inst: InstId,
        cell: LibCellId,
        width: i64,
        height: i64,
        pins: Vec<(PinId, PortDirection, Option<Point>)>,
    ) -> bool {
        let Ok(instance) = self.instance_mut(inst) else {
            return false;
        };
        instance.cell = cell;
        instance.width = width;
        instance.height = height;
        for (pin, direction, offset) in pins {
            if let Ok(p) = self.pin_mut(pin) {
                p.direction = direction;
                p.offset = offset;
            }
        }
        self.emit(NetlistEvent::MasterSwapped { inst });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_liberty::{demo_library, Library};

    fn chain(lib: &Library) -> Netlist {
        let mut nl = Netlist::new("top", 1000);
        let buf = lib.find_cell("BUF_X1").unwrap();
        let b1 = nl.create_instance(lib, buf, "b1").unwrap();
        let b2 = nl.create_instance(lib, buf, "b2").unwrap();
        let n = nl.create_net("n").unwrap();
        nl.connect(nl.find_pin(b1, "Z").unwrap(), n).unwrap();
        nl.connect(nl.find_pin(b2, "A").unwrap(), n).unwrap();
        nl
    }

    #[test]
    fn begin_twice_is_rejected() {
        let mut nl = Netlist::new("top", 1000);
        nl.begin_eco().unwrap();
        assert!(matches!(nl.begin_eco(), Err(NetlistError::EcoAlreadyActive)));
        assert_eq!(nl.end_eco().unwrap(), 0);
        assert!(matches!(nl.end_eco(), Err(NetlistError::NoActiveEco)));
    }

    #[test]
    fn undo_restores_structure_and_ids() {
        let lib = demo_library().unwrap();
        let mut nl = chain(&lib);
        let before = nl.structural_fingerprint();
        let b1 = nl.find_instance("b1").unwrap();
        let n = nl.find_net("n").unwrap();

        nl.begin_eco().unwrap();
        nl.delete_instance(b1).unwrap();
        nl.delete_net(n).unwrap();
        let x4 = lib.find_cell("BUF_X4").unwrap();
        let b2 = nl.find_instance("b2").unwrap();
        nl.swap_master(&lib, b2, x4).unwrap();
        nl.create_net("extra").unwrap();
        assert!(!nl.eco_empty());

        let report = nl.undo_eco().unwrap();
        assert_eq!(report.skipped, 0);
        assert!(!nl.eco_active());
        assert_eq!(nl.structural_fingerprint(), before);
        assert_eq!(nl.find_instance("b1"), Some(b1));
        assert_eq!(nl.find_net("n"), Some(n));
        assert_eq!(nl.find_net("extra"), None);
        assert!(nl.validate().is_ok());
    }

    #[test]
    fn undo_to_position_is_partial() {
        let lib = demo_library().unwrap();
        let mut nl = chain(&lib);
        nl.begin_eco().unwrap();
        let a = nl.create_net("a").unwrap();
        let mark = nl.eco_position();
        nl.create_net("b").unwrap();
        nl.undo_eco_to(mark).unwrap();
        assert_eq!(nl.find_net("a"), Some(a));
        assert_eq!(nl.find_net("b"), None);
        assert_eq!(nl.eco_position(), mark);
    }

    #[test]
    fn suspended_edits_are_not_recorded() {
        let lib = demo_library().unwrap();
        let mut nl = chain(&lib);
        nl.begin_eco().unwrap();
        nl.suspend_eco();
        nl.create_net("hidden").unwrap();
        nl.resume_eco();
        assert!(nl.eco_empty());
        nl.undo_eco().unwrap();
        assert!(nl.find_net("hidden").is_some());
    }

    #[test]
    fn removal_snapshot_revives_original_ids() {
        let lib = demo_library().unwrap();
        let mut nl = chain(&lib);
        let b1 = nl.find_instance("b1").unwrap();
        let n = nl.find_net("n").unwrap();
        let m = nl.create_net("m").unwrap();
        let a = nl.find_pin(b1, "A").unwrap();
        let z = nl.find_pin(b1, "Z").unwrap();
        let b2_a = nl.find_pin_by_path("b2/A").unwrap();
        nl.connect(a, m).unwrap();
        let before = nl.structural_fingerprint();

        nl.begin_eco().unwrap();
        nl.swap_master(&lib, b1, lib.find_cell("BUF_X4").unwrap()).unwrap();
        let snapshot = nl.snapshot_removal(b1, n).unwrap();
        assert_eq!((snapshot.instance(), snapshot.net()), (b1, n));
        nl.suspend_eco();
        nl.merge_nets(m, n).unwrap();
        nl.delete_instance(b1).unwrap();
        nl.delete_net(n).unwrap();
        nl.resume_eco();

        assert!(nl.restore_removal(&snapshot).unwrap());
        assert_eq!(nl.find_instance("b1"), Some(b1));
        assert_eq!(nl.net_pins(n), &[z, b2_a]);
        assert_eq!(nl.pin_net(a), Some(m));
        assert!(!nl.restore_removal(&snapshot).unwrap());

        // The earlier master swap applies to the revived instance again.
        let report = nl.undo_eco().unwrap();
        assert_eq!(report.skipped, 0);
        assert_eq!(nl.instance(b1).unwrap().cell, lib.find_cell("BUF_X1").unwrap());
        assert_eq!(nl.structural_fingerprint(), before);
        assert!(nl.validate().is_ok());
    }

    #[test]
    fn removal_snapshot_needs_its_loads() {
        let lib = demo_library().unwrap();
        let mut nl = chain(&lib);
        let b1 = nl.find_instance("b1").unwrap();
        let b2 = nl.find_instance("b2").unwrap();
        let n = nl.find_net("n").unwrap();
        let snapshot = nl.snapshot_removal(b1, n).unwrap();
        nl.delete_instance(b1).unwrap();
        nl.delete_net(n).unwrap();
        nl.delete_instance(b2).unwrap();
        assert!(!nl.restore_removal(&snapshot).unwrap());
        assert_eq!(nl.find_instance("b1"), None);
    }

    #[test]
    fn stale_operations_are_skipped() {
        let lib = demo_library().unwrap();
        let mut nl = chain(&lib);
        nl.begin_eco().unwrap();
        let b1 = nl.find_instance("b1").unwrap();
        nl.set_inst_dont_touch(b1, true).unwrap();
        nl.suspend_eco();
        nl.delete_instance(b1).unwrap();
        nl.resume_eco();
        let report = nl.undo_eco_to(0).unwrap();
        assert_eq!(report, UndoReport { undone: 0, skipped: 1 });
    }
}
