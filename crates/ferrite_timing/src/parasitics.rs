//! Parasitics invalidation tracking.
//!
//! Edits mark the nets whose RC must be re-derived; the set is handed to the
//! timing engine in one batch before the next delay query.

use ferrite_netlist::{NetId, Netlist, NetlistEvent, NetlistObserver, PinId};
use std::collections::BTreeSet;

/// Ordered set of nets whose parasitics are stale.
#[derive(Debug, Clone, Default)]
pub struct ParasiticsTracker {
    invalid: BTreeSet<NetId>,
}

impl ParasiticsTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `net` stale.
    pub fn invalidate(&mut self, net: NetId) {
        self.invalid.insert(net);
    }

    /// Marks the net on `pin` stale. Does nothing when `net` is `None` or
    /// the pin is a three-state output.
    pub fn invalidate_for_pin(&mut self, netlist: &Netlist, pin: PinId, net: Option<NetId>) {
        let Some(net) = net else { return };
        if netlist.pin(pin).is_some_and(|p| p.direction.is_tristate()) {
            return;
        }
        self.invalid.insert(net);
    }

    /// Forgets a deleted net.
    pub fn clear(&mut self, net: NetId) {
        self.invalid.remove(&net);
    }

    /// Returns `true` if `net` is marked stale.
    pub fn is_invalid(&self, net: NetId) -> bool {
        self.invalid.contains(&net)
    }

    /// Returns `true` if no net is stale.
    pub fn is_empty(&self) -> bool {
        self.invalid.is_empty()
    }

    /// Number of stale nets.
    pub fn len(&self) -> usize {
        self.invalid.len()
    }

    /// Stale nets in ID order.
    pub fn invalid_nets(&self) -> impl Iterator<Item = NetId> + '_ {
        self.invalid.iter().copied()
    }

    /// Drains the stale set.
    pub fn take_invalid(&mut self) -> BTreeSet<NetId> {
        std::mem::take(&mut self.invalid)
    }
}

impl NetlistObserver for ParasiticsTracker {
    fn notify(&mut self, netlist: &Netlist, event: &NetlistEvent) {
        match *event {
            NetlistEvent::Connected { pin, net } | NetlistEvent::Disconnected { pin, net } => {
                self.invalidate_for_pin(netlist, pin, Some(net));
            }
            NetlistEvent::MasterSwapped { inst } => {
                for &pin in netlist.instance_pins(inst) {
                    self.invalidate_for_pin(netlist, pin, netlist.pin_net(pin));
                }
            }
            NetlistEvent::NetDeleted { net } => self.clear(net),
            NetlistEvent::InstanceCreated { .. }
            | NetlistEvent::InstanceDeleted { .. }
            | NetlistEvent::NetCreated { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_liberty::{demo_library, LibCell, LibPort, PortDirection};
    use ferrite_netlist::ObserverScope;

    #[test]
    fn none_and_tristate_are_ignored() {
        let mut lib = demo_library().unwrap();
        let mut tbuf = LibCell::new("TBUF_X1").with_master(760, 1400);
        tbuf.add_port(LibPort::input("A", 1e-15));
        tbuf.add_port(LibPort::output("Z", "A", 3000.0).with_direction(PortDirection::Tristate));
        let tbuf = lib.add_cell(tbuf).unwrap();

        let mut nl = Netlist::new("top", 1000);
        let t = nl.create_instance(&lib, tbuf, "t").unwrap();
        let z = nl.find_pin(t, "Z").unwrap();
        let a = nl.find_pin(t, "A").unwrap();
        let n = nl.create_net("n").unwrap();

        let mut tracker = ParasiticsTracker::new();
        tracker.invalidate_for_pin(&nl, a, None);
        tracker.invalidate_for_pin(&nl, z, Some(n));
        assert!(tracker.is_empty());
        tracker.invalidate_for_pin(&nl, a, Some(n));
        assert!(tracker.is_invalid(n));
    }

    #[test]
    fn observes_structural_undo() {
        let lib = demo_library().unwrap();
        let mut nl = Netlist::new("top", 1000);
        let b = nl
            .create_instance(&lib, lib.find_cell("BUF_X1").unwrap(), "b")
            .unwrap();
        let keep = nl.create_net("keep").unwrap();
        nl.begin_eco().unwrap();
        let n = nl.create_net("n").unwrap();
        nl.connect(nl.find_pin(b, "A").unwrap(), n).unwrap();
        nl.connect(nl.find_pin(b, "Z").unwrap(), keep).unwrap();

        let mut tracker = ParasiticsTracker::new();
        tracker.invalidate(n);
        {
            let mut scope = ObserverScope::new(&mut nl, &mut tracker);
            scope.undo_eco().unwrap();
        }
        // `n` was deleted by the undo, `keep` lost its driver.
        assert!(!tracker.is_invalid(n));
        assert!(tracker.is_invalid(keep));
        assert_eq!(tracker.take_invalid().len(), 1);
        assert!(tracker.is_empty());
    }
}
