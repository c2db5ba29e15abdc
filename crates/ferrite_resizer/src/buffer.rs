//! Buffer removal and port buffering.

use crate::codes;
use crate::design::Design;
use crate::edit::has_port;
use crate::error::ResizerError;
use crate::session::Resizer;
use ferrite_diagnostics::Diagnostic;
use ferrite_liberty::LibCellId;
use ferrite_netlist::{InstId, NetId, NetlistError, PinId, PlacementStatus};

/// Pins and nets of a buffer instance.
struct BufferPins {
    in_pin: PinId,
    out_pin: PinId,
    in_net: Option<NetId>,
    out_net: Option<NetId>,
}

impl Resizer {
    fn buffer_pins(&self, design: &Design, inst: InstId) -> Option<BufferPins> {
        let instance = design.netlist.instance(inst)?;
        let cell = design.library.cell(instance.cell);
        if !cell.is_buffer() {
            return None;
        }
        let (input, output) = cell.buffer_ports()?;
        let in_pin = design.netlist.find_pin(inst, &input.name)?;
        let out_pin = design.netlist.find_pin(inst, &output.name)?;
        Some(BufferPins {
            in_pin,
            out_pin,
            in_net: design.netlist.pin_net(in_pin),
            out_net: design.netlist.pin_net(out_pin),
        })
    }

    /// Returns `true` if `inst` is a buffer whose input and output nets
    /// both connect to top-level ports.
    pub fn buffer_between_ports(&self, design: &Design, inst: InstId) -> bool {
        self.buffer_pins(design, inst).is_some_and(|b| {
            has_port(&design.netlist, b.in_net) && has_port(&design.netlist, b.out_net)
        })
    }

    /// Removes buffer `inst`, merging its output net into its input net, or
    /// the reverse when only the output net has a port.
    ///
    /// Port-to-port buffers are never removed. With `honor_dont_touch_fixed`
    /// a don't-touch or fixed buffer, or one on a don't-touch net, is left
    /// alone; without it those flags are cleared first. With `record` and a
    /// transaction open, the removal is journaled for replay.
    pub fn remove_buffer(
        &mut self,
        design: &mut Design,
        inst: InstId,
        honor_dont_touch_fixed: bool,
        record: bool,
    ) -> Result<bool, ResizerError> {
        let Some(BufferPins {
            in_pin,
            out_pin,
            in_net: Some(in_net),
            out_net: Some(out_net),
        }) = self.buffer_pins(design, inst)
        else {
            return Ok(false);
        };
        let in_has_port = design.netlist.net_has_port(in_net);
        let out_has_port = design.netlist.net_has_port(out_net);
        if in_has_port && out_has_port {
            return Ok(false);
        }
        let instance = design
            .netlist
            .instance(inst)
            .ok_or(NetlistError::UnknownInstance(inst))?;
        let (dont_touch, fixed) = (instance.dont_touch, instance.placement == PlacementStatus::Fixed);
        if dont_touch || fixed {
            if honor_dont_touch_fixed {
                return Ok(false);
            }
            if dont_touch {
                design.netlist.set_inst_dont_touch(inst, false)?;
            }
            if fixed {
                design.netlist.set_placement(inst, PlacementStatus::Placed)?;
            }
        }
        if self.dont_touch_net(&design.netlist, in_net) || self.dont_touch_net(&design.netlist, out_net) {
            if honor_dont_touch_fixed {
                return Ok(false);
            }
            design.netlist.set_net_dont_touch(in_net, false)?;
            design.netlist.set_net_dont_touch(out_net, false)?;
        }
        let (survivor, removed) = if out_has_port {
            (out_net, in_net)
        } else {
            (in_net, out_net)
        };

        let journaled = record
            && self.journal_remove_buffer(&design.netlist, inst, in_pin, out_pin, in_net, out_net, removed);
        if journaled {
            design.netlist.suspend_eco();
        }
        let result = self.splice_out_buffer(design, inst, in_pin, out_pin, survivor, removed);
        if journaled {
            design.netlist.resume_eco();
        }
        result?;
        self.counters.removed_buffers += 1;
        tracing::debug!(
            buffer = %design.netlist.instance_name(inst),
            survivor = %design.netlist.net_name(survivor),
            "removed buffer"
        );
        Ok(true)
    }

    fn splice_out_buffer(
        &mut self,
        design: &mut Design,
        inst: InstId,
        in_pin: PinId,
        out_pin: PinId,
        survivor: NetId,
        removed: NetId,
    ) -> Result<(), ResizerError> {
        self.disconnect_pin(design, in_pin)?;
        self.disconnect_pin(design, out_pin)?;
        design.netlist.merge_nets(survivor, removed)?;
        self.delete_instance(design, inst)?;
        self.delete_net(design, removed)?;
        self.tracker.invalidate(survivor);
        Ok(())
    }

    /// Removes buffers. An empty `insts` removes every removable buffer in
    /// the design and honors don't-touch and fixed flags; an explicit list
    /// overrides them and warns about each buffer that stays.
    pub fn remove_buffers(&mut self, design: &mut Design, insts: &[InstId]) -> Result<usize, ResizerError> {
        let mut count = 0;
        if insts.is_empty() {
            let buffers: Vec<InstId> = design
                .netlist
                .instances()
                .filter(|i| design.library.cell(i.cell).is_buffer())
                .map(|i| i.id)
                .collect();
            for inst in buffers {
                if self.remove_buffer(design, inst, true, true)? {
                    count += 1;
                }
            }
        } else {
            for &inst in insts {
                if self.remove_buffer(design, inst, false, true)? {
                    count += 1;
                } else {
                    let name = design.netlist.instance_name(inst);
                    self.diagnostics.emit(
                        Diagnostic::warning(
                            codes::BUFFER_NOT_REMOVED,
                            format!(
                                "Instance {name} cannot be removed because it is not a buffer, \
                                 functions as a feedthrough port buffer, or is constrained"
                            ),
                        )
                        .with_object(name),
                    );
                }
            }
        }
        self.update_parasitics(design);
        self.diagnostics.emit(Diagnostic::info(
            codes::REMOVED_BUFFERS,
            format!("Removed {count} buffers."),
        ));
        Ok(count)
    }

    /// Inserts the weakest buffer after every eligible top-level input port.
    pub fn buffer_inputs(&mut self, design: &mut Design) -> Result<usize, ResizerError> {
        self.find_buffers(&design.library)?;
        let buffer_cell = self.buffer_lowest_drive().ok_or(ResizerError::NoBuffers)?;
        self.buffer_moved_into_core = false;
        let ports: Vec<PinId> = design
            .netlist
            .top_ports()
            .filter(|p| p.direction.is_any_input())
            .map(|p| p.id)
            .collect();
        let mut count = 0;
        for port in ports {
            let Some(net) = design.netlist.pin_net(port) else {
                continue;
            };
            let Some(n) = design.netlist.net(net) else {
                continue;
            };
            if n.dont_touch
                || n.special
                || design.sta.is_constant(&design.netlist, &design.library, port)
                || design.sta.is_clock(&design.netlist, port)
            {
                continue;
            }
            if self.buffer_input(design, port, net, buffer_cell)? {
                count += 1;
            }
        }
        self.update_parasitics(design);
        self.warn_buffer_moved_into_core();
        if count > 0 {
            self.diagnostics.emit(Diagnostic::info(
                codes::INPUT_BUFFERS,
                format!("Inserted {count} input buffers."),
            ));
        }
        Ok(count)
    }

    fn buffer_input(
        &mut self,
        design: &mut Design,
        port: PinId,
        input_net: NetId,
        buffer_cell: LibCellId,
    ) -> Result<bool, ResizerError> {
        let fanout: Vec<PinId> = design
            .netlist
            .net_pins(input_net)
            .iter()
            .copied()
            .filter(|&p| p != port)
            .collect();
        let mut has_non_buffer = false;
        for &pin in &fanout {
            match design.netlist.pin_instance(pin).and_then(|i| design.netlist.instance(i)) {
                Some(inst) if inst.dont_touch => {
                    let net_name = design.netlist.net_name(input_net);
                    self.diagnostics.emit(
                        Diagnostic::warning(
                            codes::DONT_TOUCH_FANOUT,
                            format!(
                                "Input {net_name} can't be buffered due to dont-touch fanout {}",
                                design.netlist.pin_name(pin)
                            ),
                        )
                        .with_object(net_name),
                    );
                    return Ok(false);
                }
                Some(inst) => has_non_buffer |= !design.library.cell(inst.cell).is_buffer(),
                None => has_non_buffer = true,
            }
        }
        if !has_non_buffer {
            return Ok(false);
        }

        let name = self.make_unique_inst_name(&design.netlist, "input", false);
        let buffer_out = self.make_unique_net(design)?;
        let location = design.netlist.pin_location(port).unwrap_or_default();
        let buffer = self.make_buffer(design, buffer_cell, &name, location)?;
        let (in_pin, out_pin) = self.new_buffer_pins(design, buffer)?;

        let out_name = design.netlist.net_name(buffer_out);
        let mut renamed = false;
        for &pin in &fanout {
            if let Some(mod_net) = design.netlist.pin_mod_net(pin) {
                if !renamed {
                    design.netlist.rename_mod_net(mod_net, &out_name)?;
                    renamed = true;
                }
            }
            design.netlist.connect(pin, buffer_out)?;
        }
        design.netlist.connect(in_pin, input_net)?;
        design.netlist.connect(out_pin, buffer_out)?;
        if design.netlist.pin_mod_net(port).is_some() {
            design.netlist.disconnect_mod(port)?;
        }
        self.tracker.invalidate(input_net);
        self.tracker.invalidate(buffer_out);
        Ok(true)
    }

    /// Inserts the weakest buffer before every eligible top-level output
    /// port.
    pub fn buffer_outputs(&mut self, design: &mut Design) -> Result<usize, ResizerError> {
        self.find_buffers(&design.library)?;
        let buffer_cell = self.buffer_lowest_drive().ok_or(ResizerError::NoBuffers)?;
        self.buffer_moved_into_core = false;
        let ports: Vec<PinId> = design
            .netlist
            .top_ports()
            .filter(|p| p.direction.is_any_output())
            .map(|p| p.id)
            .collect();
        let mut count = 0;
        for port in ports {
            let Some(net) = design.netlist.pin_net(port) else {
                continue;
            };
            let Some(n) = design.netlist.net(net) else {
                continue;
            };
            if n.dont_touch
                || n.special
                || self.has_tristate_or_dont_touch_driver(design, net)
                || design.sta.is_constant(&design.netlist, &design.library, port)
            {
                continue;
            }
            self.buffer_output(design, port, net, buffer_cell)?;
            count += 1;
        }
        self.update_parasitics(design);
        self.warn_buffer_moved_into_core();
        if count > 0 {
            self.diagnostics.emit(Diagnostic::info(
                codes::OUTPUT_BUFFERS,
                format!("Inserted {count} output buffers."),
            ));
        }
        Ok(count)
    }

    fn has_tristate_or_dont_touch_driver(&self, design: &Design, net: NetId) -> bool {
        for drvr in design.netlist.net_drivers(net) {
            let Some(pin) = design.netlist.pin(drvr) else {
                continue;
            };
            if pin.direction.is_tristate() {
                return true;
            }
            let dont_touch = pin
                .owner
                .and_then(|i| design.netlist.instance(i))
                .is_some_and(|i| i.dont_touch);
            if dont_touch {
                let net_name = design.netlist.net_name(net);
                self.diagnostics.emit(
                    Diagnostic::warning(
                        codes::DONT_TOUCH_DRIVER,
                        format!(
                            "Output {net_name} can't be buffered due to dont-touch driver {}",
                            design.netlist.pin_name(drvr)
                        ),
                    )
                    .with_object(net_name),
                );
                return true;
            }
        }
        false
    }

    fn buffer_output(
        &mut self,
        design: &mut Design,
        port: PinId,
        output_net: NetId,
        buffer_cell: LibCellId,
    ) -> Result<(), ResizerError> {
        let hier_net = design.netlist.pin_mod_net(port);
        design.netlist.disconnect(port)?;
        let name = self.make_unique_inst_name(&design.netlist, "output", false);
        let buffer_out = self.make_unique_net(design)?;
        let location = design.netlist.pin_location(port).unwrap_or_default();
        let buffer = self.make_buffer(design, buffer_cell, &name, location)?;
        let (in_pin, out_pin) = self.new_buffer_pins(design, buffer)?;

        design.netlist.connect(in_pin, output_net)?;
        if let Some(mod_net) = hier_net {
            design.netlist.disconnect_mod(port)?;
            design.netlist.connect_mod(in_pin, mod_net)?;
        }
        design.netlist.connect(out_pin, buffer_out)?;
        design.netlist.connect(port, buffer_out)?;
        // The port keeps its net name.
        design.netlist.swap_net_names(buffer_out, output_net)?;
        if let Some(mod_net) = hier_net {
            let flat_name = design.netlist.net_name(output_net);
            design.netlist.rename_mod_net(mod_net, &flat_name)?;
        }
        self.tracker.invalidate(output_net);
        self.tracker.invalidate(buffer_out);
        Ok(())
    }

    fn new_buffer_pins(&self, design: &Design, buffer: InstId) -> Result<(PinId, PinId), ResizerError> {
        self.buffer_pins(design, buffer)
            .map(|b| (b.in_pin, b.out_pin))
            .ok_or_else(|| ResizerError::UnknownInstance(design.netlist.instance_name(buffer)))
    }
}
