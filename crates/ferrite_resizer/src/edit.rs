//! Netlist edit primitives.
//!
//! Every edit made on behalf of an optimization goes through here so that
//! design area, unique naming, legalization, and parasitics invalidation
//! stay consistent. The journal is fed by the callers.

use crate::codes;
use crate::design::Design;
use crate::error::ResizerError;
use crate::session::{cell_area, Resizer};
use ferrite_common::units::meters_to_dbu;
use ferrite_common::{Dbu, Point};
use ferrite_diagnostics::Diagnostic;
use ferrite_liberty::LibCellId;
use ferrite_netlist::{InstId, NetId, Netlist, NetlistError, PinId, PlacementStatus};

impl Resizer {
    /// Rebinds `inst` to `cell`, keeping its pins by port name.
    ///
    /// Returns `false` without editing when `cell` has no physical master or
    /// is already the instance's cell.
    pub fn replace_cell(
        &mut self,
        design: &mut Design,
        inst: InstId,
        cell: LibCellId,
        journal: bool,
    ) -> Result<bool, ResizerError> {
        if design.library.cell(cell).master.is_none() {
            return Ok(false);
        }
        let old = design
            .netlist
            .instance(inst)
            .ok_or(NetlistError::UnknownInstance(inst))?
            .cell;
        if old == cell {
            return Ok(false);
        }
        // Fails before touching anything when a port is missing.
        design.netlist.swap_master(&design.library, inst, cell)?;
        self.design_area += cell_area(&design.netlist, design.library.cell(cell))
            - cell_area(&design.netlist, design.library.cell(old));
        if journal {
            self.journal_resize(inst, old);
        }
        self.legalize_if_routing(design, inst)?;
        self.invalidate_instance_nets(&design.netlist, inst);
        tracing::debug!(
            inst = %design.netlist.instance_name(inst),
            from = %design.library.cell(old).name,
            to = %design.library.cell(cell).name,
            "replaced cell"
        );
        Ok(true)
    }

    /// Creates a placed instance of `cell` at `location`, clamped into the
    /// core area.
    pub fn make_instance(
        &mut self,
        design: &mut Design,
        cell: LibCellId,
        name: &str,
        location: Point,
    ) -> Result<InstId, ResizerError> {
        let inst = design.netlist.create_instance(&design.library, cell, name)?;
        self.set_location(design, inst, location)?;
        design.netlist.set_placement(inst, PlacementStatus::Placed)?;
        self.legalize_if_routing(design, inst)?;
        self.design_area += cell_area(&design.netlist, design.library.cell(cell));
        Ok(inst)
    }

    /// Creates a buffer instance and journals it.
    pub fn make_buffer(
        &mut self,
        design: &mut Design,
        cell: LibCellId,
        name: &str,
        location: Point,
    ) -> Result<InstId, ResizerError> {
        let inst = self.make_instance(design, cell, name, location)?;
        self.journal_make_buffer(inst);
        self.counters.inserted_buffers += 1;
        Ok(inst)
    }

    fn set_location(
        &mut self,
        design: &mut Design,
        inst: InstId,
        location: Point,
    ) -> Result<(), ResizerError> {
        let mut location = location;
        if let (Some(core), Some(instance)) = (design.netlist.core, design.netlist.instance(inst)) {
            let clamped = core.clamp_origin(location, instance.width, instance.height);
            if clamped != location {
                self.buffer_moved_into_core = true;
                location = clamped;
            }
        }
        design.netlist.set_location(inst, location)?;
        Ok(())
    }

    /// Emits a single warning if any new instance was moved inside the core
    /// since the last call.
    pub fn warn_buffer_moved_into_core(&mut self) {
        if std::mem::take(&mut self.buffer_moved_into_core) {
            self.diagnostics.emit(Diagnostic::warning(
                codes::BUFFER_MOVED_INTO_CORE,
                "some buffers were moved inside the core.",
            ));
        }
    }

    fn legalize_if_routing(&mut self, design: &mut Design, inst: InstId) -> Result<(), ResizerError> {
        if self.settings.parasitics_source.is_routing() {
            if let Some(legalizer) = design.legalizer.as_mut() {
                legalizer.legal_cell_pos(&mut design.netlist, inst)?;
            }
        }
        Ok(())
    }

    /// Deletes `inst`, invalidating the nets it was on.
    pub fn delete_instance(&mut self, design: &mut Design, inst: InstId) -> Result<(), ResizerError> {
        let Some(instance) = design.netlist.instance(inst) else {
            return Ok(());
        };
        self.design_area -= cell_area(&design.netlist, design.library.cell(instance.cell));
        self.invalidate_instance_nets(&design.netlist, inst);
        design.netlist.delete_instance(inst)?;
        Ok(())
    }

    /// Creates a net with the given name.
    pub fn make_net(&mut self, design: &mut Design, name: &str) -> Result<NetId, ResizerError> {
        Ok(design.netlist.create_net(name)?)
    }

    /// Creates a net named `net<N>` with a fresh index.
    pub fn make_unique_net(&mut self, design: &mut Design) -> Result<NetId, ResizerError> {
        let name = unique_net_name(&design.netlist, &mut self.unique_net_index);
        Ok(design.netlist.create_net(&name)?)
    }

    /// A free instance name: `<base><N>`, or `<base>_<N>` with `underscore`.
    pub fn make_unique_inst_name(&mut self, netlist: &Netlist, base: &str, underscore: bool) -> String {
        loop {
            let name = if underscore {
                format!("{base}_{}", self.unique_inst_index)
            } else {
                format!("{base}{}", self.unique_inst_index)
            };
            self.unique_inst_index += 1;
            if netlist.find_instance(&name).is_none() {
                return name;
            }
        }
    }

    /// Deletes `net`, dropping its parasitics and its invalidation entry.
    pub fn delete_net(&mut self, design: &mut Design, net: NetId) -> Result<(), ResizerError> {
        design.sta.remove_parasitics(net);
        self.tracker.clear(net);
        design.netlist.delete_net(net)?;
        Ok(())
    }

    /// Connects `pin` to `net`, invalidating both its old and new net.
    pub fn connect_pin(&mut self, design: &mut Design, pin: PinId, net: NetId) -> Result<(), ResizerError> {
        let old = design.netlist.pin_net(pin);
        self.tracker.invalidate_for_pin(&design.netlist, pin, old);
        design.netlist.connect(pin, net)?;
        self.tracker.invalidate_for_pin(&design.netlist, pin, Some(net));
        Ok(())
    }

    /// Disconnects `pin`; no-op when it is not connected.
    pub fn disconnect_pin(&mut self, design: &mut Design, pin: PinId) -> Result<(), ResizerError> {
        let old = design.netlist.pin_net(pin);
        self.tracker.invalidate_for_pin(&design.netlist, pin, old);
        design.netlist.disconnect(pin)?;
        Ok(())
    }

    pub(crate) fn invalidate_instance_nets(&mut self, netlist: &Netlist, inst: InstId) {
        for &pin in netlist.instance_pins(inst) {
            self.tracker.invalidate_for_pin(netlist, pin, netlist.pin_net(pin));
        }
    }

    /// Hands the stale nets to the timing engine.
    pub fn update_parasitics(&mut self, design: &mut Design) {
        let nets = self.tracker.take_invalid();
        if !nets.is_empty() {
            design.sta.update_parasitics(&design.netlist, &nets);
        }
    }

    /// Returns `true` if `inst` must not be edited.
    pub fn dont_touch_instance(&self, netlist: &Netlist, inst: InstId) -> bool {
        netlist.instance(inst).is_some_and(|i| i.dont_touch)
    }

    /// Returns `true` if `net` must not be edited.
    pub fn dont_touch_net(&self, netlist: &Netlist, net: NetId) -> bool {
        netlist.net(net).is_some_and(|n| n.dont_touch)
    }

    /// Sets the don't-touch flag of `inst`.
    pub fn set_dont_touch_instance(
        &mut self,
        design: &mut Design,
        inst: InstId,
        dont_touch: bool,
    ) -> Result<(), ResizerError> {
        design.netlist.set_inst_dont_touch(inst, dont_touch)?;
        Ok(())
    }

    /// Sets the don't-touch flag of `net`.
    pub fn set_dont_touch_net(
        &mut self,
        design: &mut Design,
        net: NetId,
        dont_touch: bool,
    ) -> Result<(), ResizerError> {
        design.netlist.set_net_dont_touch(net, dont_touch)?;
        Ok(())
    }

    /// Total master area of the design in square meters.
    pub fn design_area(&self) -> f64 {
        self.design_area
    }

    /// Caps the design area at `util` times the core area.
    pub fn set_max_utilization(&mut self, design: &Design, util: f64) {
        self.max_area = design.netlist.core.map_or(0.0, |core| {
            let dbu = design.netlist.dbu_per_micron;
            ferrite_common::units::dbu_to_meters(core.width(), dbu)
                * ferrite_common::units::dbu_to_meters(core.height(), dbu)
                * util
        });
    }

    /// Returns `true` once the design area reaches the utilization cap.
    pub fn over_max_area(&self) -> bool {
        self.max_area != 0.0 && self.design_area >= self.max_area
    }

    /// Converts a non-negative distance in meters to database units.
    pub fn meters_to_dbu(&self, netlist: &Netlist, dist: f64) -> Result<Dbu, ResizerError> {
        if dist < 0.0 {
            return Err(ResizerError::NegativeDistance(dist));
        }
        Ok(meters_to_dbu(dist, netlist.dbu_per_micron))
    }
}

/// Returns `true` if `net` exists and connects to a top-level port.
pub fn has_port(netlist: &Netlist, net: Option<NetId>) -> bool {
    net.is_some_and(|n| netlist.net_has_port(n))
}

pub(crate) fn unique_net_name(netlist: &Netlist, index: &mut usize) -> String {
    loop {
        let name = format!("net{index}");
        *index += 1;
        if netlist.find_net(&name).is_none() {
            return name;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_common::Rect;
    use ferrite_config::ResizerSettings;
    use ferrite_liberty::demo_library;

    fn design() -> Design {
        let netlist = Netlist::new("top", 1000).with_core(Rect::new(0, 0, 14_000, 14_000));
        Design::new(netlist, demo_library().unwrap())
    }

    #[test]
    fn unique_names_skip_taken() {
        let mut d = design();
        let mut rsz = Resizer::new(ResizerSettings::default(), &d);
        d.netlist.create_net("net1").unwrap();
        let n = rsz.make_unique_net(&mut d).unwrap();
        assert_eq!(d.netlist.net_name(n), "net2");
        let buf = d.library.find_cell("BUF_X1").unwrap();
        d.netlist.create_instance(&d.library, buf, "u_1").unwrap();
        assert_eq!(rsz.make_unique_inst_name(&d.netlist, "u", true), "u_2");
        assert_eq!(rsz.make_unique_inst_name(&d.netlist, "input", false), "input3");
    }

    #[test]
    fn new_instances_are_clamped_and_counted() {
        let mut d = design();
        let mut rsz = Resizer::new(ResizerSettings::default(), &d);
        let buf = d.library.find_cell("BUF_X1").unwrap();
        let b = rsz
            .make_buffer(&mut d, buf, "b", Point::new(-500, 20_000))
            .unwrap();
        let inst = d.netlist.instance(b).unwrap();
        assert_eq!(inst.placement, PlacementStatus::Placed);
        assert!(Rect::new(0, 0, 14_000, 14_000).contains(inst.location));
        assert_eq!(rsz.counters().inserted_buffers, 1);
        assert!(rsz.design_area() > 0.0);
        rsz.warn_buffer_moved_into_core();
        rsz.warn_buffer_moved_into_core();
        assert_eq!(rsz.diagnostics().warning_count(), 1);
        assert!(rsz.diagnostics().contains_code("W077"));
    }

    #[test]
    fn replace_without_master_is_refused() {
        let mut d = design();
        let mut bare = ferrite_liberty::LibCell::new("BUF_NOMASTER");
        bare.add_port(ferrite_liberty::LibPort::input("A", 1e-15));
        bare.add_port(ferrite_liberty::LibPort::output("Z", "A", 4000.0));
        let bare = d.library.add_cell(bare).unwrap();
        let mut rsz = Resizer::new(ResizerSettings::default(), &d);
        let buf = d.library.find_cell("BUF_X1").unwrap();
        let b = rsz.make_instance(&mut d, buf, "b", Point::new(0, 0)).unwrap();
        assert!(!rsz.replace_cell(&mut d, b, bare, true).unwrap());
        assert_eq!(d.netlist.instance(b).unwrap().cell, buf);
    }

    #[test]
    fn failed_replace_leaves_session_untouched() {
        let mut d = design();
        let mut rsz = Resizer::new(ResizerSettings::default(), &d);
        let inv = d.library.find_cell("INV_X1").unwrap();
        let buf = d.library.find_cell("BUF_X1").unwrap();
        let u1 = rsz.make_instance(&mut d, inv, "u1", Point::new(0, 0)).unwrap();
        let area = rsz.design_area();

        rsz.journal_begin(&mut d).unwrap();
        let err = rsz.replace_cell(&mut d, u1, buf, true).unwrap_err();
        assert!(matches!(err, ResizerError::Netlist(NetlistError::PortMismatch { .. })));
        assert_eq!(rsz.design_area(), area);
        assert!(rsz.journal_entries().is_empty());
        assert!(rsz.history().sized.is_empty());
        assert!(d.netlist.eco_empty());
        assert_eq!(d.netlist.instance(u1).unwrap().cell, inv);
        rsz.journal_end(&mut d).unwrap();
    }

    #[test]
    fn utilization_cap() {
        let mut d = design();
        let mut rsz = Resizer::new(ResizerSettings::default(), &d);
        assert!(!rsz.over_max_area());
        // 14um x 14um core, capped at a tiny fraction.
        rsz.set_max_utilization(&d, 0.001);
        let buf = d.library.find_cell("BUF_X4").unwrap();
        rsz.make_instance(&mut d, buf, "b", Point::new(0, 0)).unwrap();
        assert!(rsz.over_max_area());
    }

    #[test]
    fn negative_distance_is_an_error() {
        let d = design();
        let rsz = Resizer::new(ResizerSettings::default(), &d);
        assert!(matches!(
            rsz.meters_to_dbu(&d.netlist, -1e-6),
            Err(ResizerError::NegativeDistance(_))
        ));
        assert_eq!(rsz.meters_to_dbu(&d.netlist, 2e-6).unwrap(), 2000);
    }
}
