//! Detailed-placement legalization hook.

use crate::data::{Netlist, PlacementStatus};
use crate::error::NetlistError;
use crate::ids::InstId;
use ferrite_common::{Dbu, Point};

/// Moves a single instance to a legal site.
pub trait Legalizer {
    /// Legalizes the placement of `inst`.
    fn legal_cell_pos(&mut self, netlist: &mut Netlist, inst: InstId) -> Result<(), NetlistError>;
}

/// Snaps instances onto a uniform row/site grid inside the core.
///
/// Overlaps are not resolved; this only guarantees site alignment and core
/// containment.
#[derive(Debug, Clone, Copy)]
pub struct RowLegalizer {
    /// Site width in DBU.
    pub site_width: Dbu,
    /// Row height in DBU.
    pub row_height: Dbu,
}

impl RowLegalizer {
    /// Creates a legalizer for the given grid.
    pub fn new(site_width: Dbu, row_height: Dbu) -> Self {
        Self {
            site_width: site_width.max(1),
            row_height: row_height.max(1),
        }
    }
}

fn snap(value: Dbu, base: Dbu, pitch: Dbu) -> Dbu {
    base + ((value - base) as f64 / pitch as f64).round() as Dbu * pitch
}

impl Legalizer for RowLegalizer {
    fn legal_cell_pos(&mut self, netlist: &mut Netlist, inst: InstId) -> Result<(), NetlistError> {
        let instance = netlist.instance_ref(inst)?;
        if instance.placement == PlacementStatus::Fixed {
            return Ok(());
        }
        let (width, height) = (instance.width, instance.height);
        let mut origin = instance.location;
        let base = match netlist.core {
            Some(core) => {
                origin = core.clamp_origin(origin, width, height);
                Point::new(core.xl, core.yl)
            }
            None => Point::default(),
        };
        let mut snapped = Point::new(
            snap(origin.x, base.x, self.site_width),
            snap(origin.y, base.y, self.row_height),
        );
        if let Some(core) = netlist.core {
            while snapped.x + width > core.xh && snapped.x > core.xl {
                snapped.x -= self.site_width;
            }
            while snapped.y + height > core.yh && snapped.y > core.yl {
                snapped.y -= self.row_height;
            }
        }
        if snapped != instance.location {
            netlist.set_location(inst, snapped)?;
        }
        if instance_unplaced(netlist, inst) {
            netlist.set_placement(inst, PlacementStatus::Placed)?;
        }
        Ok(())
    }
}

fn instance_unplaced(netlist: &Netlist, inst: InstId) -> bool {
    netlist
        .instance(inst)
        .is_some_and(|i| i.placement == PlacementStatus::Unplaced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_common::Rect;
    use ferrite_liberty::demo_library;

    #[test]
    fn snaps_into_core_rows() {
        let lib = demo_library().unwrap();
        let mut nl = Netlist::new("top", 1000).with_core(Rect::new(1000, 1000, 21000, 15000));
        let b = nl
            .create_instance(&lib, lib.find_cell("BUF_X1").unwrap(), "b")
            .unwrap();
        nl.set_location(b, Point::new(1234, 2200)).unwrap();
        RowLegalizer::new(190, 1400).legal_cell_pos(&mut nl, b).unwrap();
        let inst = nl.instance(b).unwrap();
        assert_eq!(inst.location, Point::new(1190, 2400));
        assert_eq!(inst.placement, PlacementStatus::Placed);

        nl.set_location(b, Point::new(50_000, -500)).unwrap();
        RowLegalizer::new(190, 1400).legal_cell_pos(&mut nl, b).unwrap();
        let inst = nl.instance(b).unwrap();
        assert!(inst.location.x + inst.width <= 21000);
        assert_eq!(inst.location.y, 1000);
    }
}
